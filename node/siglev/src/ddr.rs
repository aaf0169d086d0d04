//! Passthrough signal level detector fed from a DDR's pre-demod IQ tap
//! (spec component L), grounded on
//! `original_source/src/svxlink/trx/SigLevDetDdr.cpp`: 10 ms blocks of mean
//! IQ power mapped through `offset + slope*10*log10(power)`. Intended to be
//! wired to [`rt_ddr::Ddr::take_pre_demod`].

use std::collections::VecDeque;

use rt_dsp::IqSample as Complex32;

const BLOCK_TIME_MS: u32 = 10;

pub struct DdrSiglevDetector {
    block_len: usize,
    pwr_sum: f64,
    count: usize,
    slope: f32,
    offset: f32,
    last_siglev: f32,
    history: VecDeque<f32>,
    integration_blocks: usize,
}

impl DdrSiglevDetector {
    pub fn new(sample_rate: u32) -> Self {
        let block_len = (BLOCK_TIME_MS * sample_rate / 1000).max(1) as usize;
        Self {
            block_len,
            pwr_sum: 0.0,
            count: 0,
            slope: 1.0,
            offset: 0.0,
            last_siglev: 0.0,
            history: VecDeque::new(),
            integration_blocks: 1,
        }
    }

    pub fn with_slope(mut self, slope: f32) -> Self {
        self.slope = slope;
        self
    }

    pub fn with_offset(mut self, offset: f32) -> Self {
        self.offset = offset;
        self
    }

    pub fn set_integration_blocks(&mut self, blocks: usize) {
        self.integration_blocks = blocks.max(1);
        while self.history.len() > self.integration_blocks {
            self.history.pop_front();
        }
    }

    pub fn process(&mut self, samples: &[Complex32]) {
        for s in samples {
            self.pwr_sum += (s.re * s.re + s.im * s.im) as f64;
            self.count += 1;
            if self.count >= self.block_len {
                let mean_power = (self.pwr_sum / self.block_len as f64).max(1e-12);
                self.last_siglev = self.offset + self.slope * 10.0 * mean_power.log10() as f32;
                self.history.push_back(self.last_siglev);
                while self.history.len() > self.integration_blocks {
                    self.history.pop_front();
                }
                self.pwr_sum = 0.0;
                self.count = 0;
            }
        }
    }

    pub fn last_siglev(&self) -> f32 {
        self.last_siglev
    }

    pub fn siglev_integrated(&self) -> f32 {
        if self.history.is_empty() {
            return 0.0;
        }
        self.history.iter().sum::<f32>() / self.history.len() as f32
    }

    pub fn reset(&mut self) {
        self.pwr_sum = 0.0;
        self.count = 0;
        self.last_siglev = 0.0;
        self.history.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stronger_iq_power_yields_higher_siglev() {
        let mut weak = DdrSiglevDetector::new(16_000);
        let mut strong = DdrSiglevDetector::new(16_000);
        for _ in 0..200 {
            weak.process(&[Complex32::new(0.01, 0.0)]);
            strong.process(&[Complex32::new(0.5, 0.0)]);
        }
        assert!(strong.last_siglev() > weak.last_siglev());
    }
}
