//! Inband-tone signal level detector (spec component L), grounded on
//! `original_source/src/svxlink/trx/SigLevDetTone.cpp`: a remote site
//! modulates one of ten 100 Hz-spaced tones (5500-6400 Hz) onto the link
//! audio to report its own locally measured signal strength; a bank of ten
//! Goertzel bins picks the loudest one and an SNR gate decides whether a
//! tone is really present.

use std::collections::VecDeque;

use crate::goertzel::{Goertzel, HammingWindow};

const BLOCK_SIZE: usize = 100;
const BASE_HZ: f32 = 5500.0;
const STEP_HZ: f32 = 100.0;
const MIN_ENERGY: f32 = 0.1;
const MIN_SNR_DB: f32 = 8.0;

pub struct ToneDetector {
    hwin: HammingWindow,
    dets: Vec<Goertzel>,
    siglev_map: [i32; 10],
    block_idx: usize,
    last_siglev: i32,
    history: VecDeque<i32>,
    integration_blocks: usize,
}

impl ToneDetector {
    pub fn new(sample_rate: u32) -> Self {
        let dets = (0..10).map(|i| Goertzel::new(BASE_HZ + i as f32 * STEP_HZ, sample_rate)).collect();
        let mut siglev_map = [0i32; 10];
        for (i, v) in siglev_map.iter_mut().enumerate() {
            *v = 100 - i as i32 * 10;
        }
        Self {
            hwin: HammingWindow::new(BLOCK_SIZE),
            dets,
            siglev_map,
            block_idx: 0,
            last_siglev: 0,
            history: VecDeque::new(),
            integration_blocks: 1,
        }
    }

    /// Override the 10 reported levels, one per tone bin, lowest frequency
    /// first (spec: `TONE_SIGLEV_MAP` config, ten comma-separated values).
    pub fn with_siglev_map(mut self, map: [i32; 10]) -> Self {
        self.siglev_map = map;
        self
    }

    pub fn set_integration_blocks(&mut self, blocks: usize) {
        self.integration_blocks = blocks.max(1);
        while self.history.len() > self.integration_blocks {
            self.history.pop_front();
        }
    }

    pub fn process(&mut self, samples: &[f32]) {
        for &s in samples {
            let windowed = self.hwin.calc(s);
            for d in self.dets.iter_mut() {
                d.calc(windowed);
            }
            self.block_idx += 1;
            if self.block_idx != BLOCK_SIZE {
                continue;
            }
            self.block_idx = 0;
            self.hwin.reset();

            let mut max = 0.0f32;
            let mut max_idx = 0usize;
            let mut sum = 0.0f32;
            for (i, d) in self.dets.iter_mut().enumerate() {
                let mag = d.magnitude_squared();
                d.reset();
                if mag >= max {
                    max = mag;
                    max_idx = i;
                }
                sum += mag;
            }
            let mean = (sum - max) / (self.dets.len() - 1) as f32;

            self.last_siglev = 0;
            if max > MIN_ENERGY {
                let snr_db = 5.0 * (max / mean).log10();
                if snr_db > MIN_SNR_DB {
                    self.last_siglev = self.siglev_map[max_idx];
                }
            }
            self.history.push_back(self.last_siglev);
            while self.history.len() > self.integration_blocks {
                self.history.pop_front();
            }
        }
    }

    pub fn last_siglev(&self) -> f32 {
        self.last_siglev as f32
    }

    pub fn siglev_integrated(&self) -> f32 {
        if self.history.is_empty() {
            return 0.0;
        }
        self.history.iter().sum::<i32>() as f32 / self.history.len() as f32
    }

    pub fn reset(&mut self) {
        for d in self.dets.iter_mut() {
            d.reset();
        }
        self.hwin.reset();
        self.block_idx = 0;
        self.last_siglev = 0;
        self.history.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tone_block(freq: f32, sample_rate: u32, n: usize) -> Vec<f32> {
        (0..n).map(|i| (2.0 * std::f32::consts::PI * freq * i as f32 / sample_rate as f32).sin()).collect()
    }

    #[test]
    fn a_loud_bin_tone_is_detected_and_mapped() {
        let sample_rate = 16_000;
        let mut det = ToneDetector::new(sample_rate);
        let samples = tone_block(5500.0 + 3.0 * STEP_HZ, sample_rate, BLOCK_SIZE * 3);
        det.process(&samples);
        assert_eq!(det.last_siglev(), 100.0 - 3.0 * 10.0);
    }

    #[test]
    fn silence_reports_zero() {
        let mut det = ToneDetector::new(16_000);
        det.process(&vec![0.0f32; BLOCK_SIZE * 2]);
        assert_eq!(det.last_siglev(), 0.0);
    }
}
