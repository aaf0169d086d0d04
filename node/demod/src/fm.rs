//! FM/NBFM/WBFM demodulation (spec §4.6).

use rt_dsp::discriminator::{Discriminator, FmParams};
use rt_dsp::fir::FirDecimator;
use rt_dsp::IqSample;

use crate::decimate;

pub struct FmDemodulator {
    disc: Discriminator,
    post: Vec<FirDecimator<f32>>,
}

impl FmDemodulator {
    pub fn new(params: FmParams, channel_rate: u32, audio_rate: u32) -> Self {
        Self { disc: Discriminator::new(channel_rate, params), post: decimate::build_cascade(channel_rate, audio_rate) }
    }

    pub fn process(&mut self, samples: &[IqSample]) -> Vec<f32> {
        let mut out = self.disc.process(samples);
        for stage in self.post.iter_mut() {
            out = stage.process(&out);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wbfm_discriminator_then_decimates_to_audio_rate() {
        let mut demod = FmDemodulator::new(FmParams::WBFM, 192_000, 16_000);
        let samples: Vec<IqSample> = (0..192)
            .map(|n| {
                let theta = 2.0 * std::f32::consts::PI * 10_000.0 * n as f32 / 192_000.0;
                IqSample::new(theta.cos(), theta.sin())
            })
            .collect();
        let out = demod.process(&samples);
        assert_eq!(out.len(), 192 / 12);
    }
}
