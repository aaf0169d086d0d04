//! Noise-floor signal level detector (spec component L), grounded on
//! `original_source/src/svxlink/trx/SigLevDetNoise.cpp`: band-limited
//! noise power, in 25 ms blocks, mapped through `offset - slope*log10(power)`.
//! The original band-passes (or high-passes, below 16 kHz) the audio first;
//! this takes already-filtered audio and leaves the filter choice to the
//! caller (spec §1 Non-goals: filter coefficients aren't specified).

use crate::power::PowerWindow;

const BLOCK_TIME_MS: u32 = 25;

pub struct NoiseDetector {
    power: PowerWindow,
    slope: f32,
    offset: f32,
    bogus_thresh: f32,
    last_block_power: f64,
}

impl NoiseDetector {
    pub fn new(sample_rate: u32) -> Self {
        let block_len = (BLOCK_TIME_MS * sample_rate / 1000).max(1) as usize;
        Self { power: PowerWindow::new(block_len), slope: 10.0, offset: 0.0, bogus_thresh: f32::MAX, last_block_power: 0.0 }
    }

    pub fn with_slope(mut self, slope: f32) -> Self {
        self.slope = slope;
        self
    }

    pub fn with_offset(mut self, offset: f32) -> Self {
        self.offset = offset;
        self
    }

    pub fn with_bogus_thresh(mut self, thresh: f32) -> Self {
        self.bogus_thresh = thresh;
        self
    }

    pub fn set_integration_time_ms(&mut self, time_ms: u32) {
        let blocks = (time_ms.max(BLOCK_TIME_MS) / BLOCK_TIME_MS).max(1) as usize;
        self.power.set_integration_blocks(blocks);
    }

    pub fn process(&mut self, samples: &[f32]) {
        for &s in samples {
            if let Some(p) = self.power.push((s as f64) * (s as f64)) {
                self.last_block_power = p;
            }
        }
    }

    pub fn last_siglev(&self) -> f32 {
        let siglev = self.offset - self.slope * (self.last_block_power.max(1e-12).log10() as f32);
        if siglev > self.bogus_thresh {
            0.0
        } else {
            siglev
        }
    }

    pub fn siglev_integrated(&self) -> f32 {
        let Some(min_power) = self.power.min() else { return 0.0 };
        let siglev = self.offset - self.slope * (min_power.max(1e-12).log10() as f32 + 0.25);
        if siglev > self.bogus_thresh {
            0.0
        } else {
            siglev
        }
    }

    pub fn reset(&mut self) {
        self.power.reset();
        self.last_block_power = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn louder_noise_yields_lower_siglev() {
        let mut quiet = NoiseDetector::new(16_000);
        let mut loud = NoiseDetector::new(16_000);
        for _ in 0..400 {
            quiet.process(&[0.01]);
            loud.process(&[0.5]);
        }
        assert!(loud.last_siglev() < quiet.last_siglev());
    }

    #[test]
    fn bogus_threshold_clamps_to_zero() {
        let mut det = NoiseDetector::new(16_000).with_bogus_thresh(10.0);
        for _ in 0..400 {
            det.process(&[0.0001]);
        }
        assert_eq!(det.last_siglev(), 0.0);
    }
}
