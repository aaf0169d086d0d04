//! CW demodulation (spec §4.6). The +600 Hz beat-note translation is applied
//! upstream by the channelizer's mixer (spec §4.5 step 1); this stage only
//! runs the AGC and takes the real part.

use rt_dsp::agc::Agc;
use rt_dsp::fir::FirDecimator;
use rt_dsp::IqSample;

use crate::decimate;

const ATTACK: f32 = 100.0;
const DECAY: f32 = 0.04;
const REFERENCE: f32 = 0.05;
const MAX_GAIN: f32 = 200.0;

pub struct CwDemodulator {
    agc: Agc,
    post: Vec<FirDecimator<f32>>,
}

impl CwDemodulator {
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
    fn beat_note_tone_demodulates_without_panicking() {
        let mut demod = CwDemodulator::new(16_000, 16_000);
        let samples: Vec<IqSample> = (0..200)
            .map(|n| {
                let theta = 2.0 * std::f32::consts::PI * 600.0 * n as f32 / 16_000.0;
                IqSample::new(theta.cos() * 0.2, theta.sin() * 0.2)
            })
            .collect();
        let out = demod.process(&samples);
        assert_eq!(out.len(), 200);
        assert!(out.iter().all(|v| v.is_finite()));
    }
}
