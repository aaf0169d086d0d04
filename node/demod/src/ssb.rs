//! USB/LSB demodulation (spec §4.6). The ±2 kHz sideband translation is
//! applied upstream by the channelizer's mixer (spec §4.5 step 1, per-mode
//! `channel_offset`); this stage only runs the AGC and takes the real part.

use rt_dsp::agc::Agc;
use rt_dsp::fir::FirDecimator;
use rt_dsp::IqSample;

use crate::decimate;

const ATTACK: f32 = 10.0;
const DECAY: f32 = 0.01;
const REFERENCE: f32 = 0.25;
const MAX_GAIN: f32 = 200.0;

pub struct SsbDemodulator {
    agc: Agc,
    post: Vec<FirDecimator<f32>>,
}

impl SsbDemodulator {
    pub fn new(channel_rate: u32, audio_rate: u32) -> Self {
        Self { agc: Agc::new(REFERENCE, ATTACK, DECAY, MAX_GAIN), post: decimate::build_cascade(channel_rate, audio_rate) }
    }

    pub fn process(&mut self, samples: &[IqSample]) -> Vec<f32> {
        let mut out = self.agc.process_complex_real_part(samples);
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
    fn produces_one_audio_sample_per_input_sample_at_matching_rates() {
        let mut demod = SsbDemodulator::new(16_000, 16_000);
        let samples = vec![IqSample::new(0.3, 0.1); 100];
        let out = demod.process(&samples);
        assert_eq!(out.len(), 100);
    }
}
