//! Simulated signal level detector for bench testing (spec component L),
//! grounded on `original_source/src/svxlink/trx/SigLevDetSim.cpp`: a
//! siglev value that random-walks and/or toggles between a configured
//! min/max at configured sample intervals, with no real input dependence.

use std::collections::VecDeque;

use rand::Rng;

pub struct SimDetector {
    block_len: usize,
    block_idx: usize,
    last_siglev: f32,
    siglev_min: f32,
    siglev_max: f32,
    rand_interval: u32,
    rand_counter: u32,
    toggle_interval: u32,
    toggle_counter: u32,
    history: VecDeque<f32>,
    integration_blocks: usize,
}

const BLOCK_LENGTH_MS: u32 = 20;

impl SimDetector {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            block_len: (BLOCK_LENGTH_MS * sample_rate / 1000).max(1) as usize,
            block_idx: 0,
            last_siglev: 0.0,
            siglev_min: 0.0,
            siglev_max: 100.0,
            rand_interval: 0,
            rand_counter: 0,
            toggle_interval: 0,
            toggle_counter: 0,
            history: VecDeque::new(),
            integration_blocks: 1,
        }
    }

    pub fn with_range(mut self, min: f32, max: f32, default: f32) -> Self {
        self.siglev_min = min;
        self.siglev_max = max;
        self.last_siglev = default;
        self
    }

    /// `interval_samples` of 0 disables random-walk stepping.
    pub fn with_rand_interval_samples(mut self, interval_samples: u32) -> Self {
        self.rand_interval = interval_samples;
        self
    }

    /// `interval_samples` of 0 disables min/max toggling.
    pub fn with_toggle_interval_samples(mut self, interval_samples: u32) -> Self {
        self.toggle_interval = interval_samples;
        self
    }

    pub fn set_integration_blocks(&mut self, blocks: usize) {
        self.integration_blocks = blocks.max(1);
        while self.history.len() > self.integration_blocks {
            self.history.pop_front();
        }
    }

    /// Advance the simulation by `n_samples` (there is no real audio input;
    /// the caller drives this at its own sample clock).
    pub fn advance(&mut self, n_samples: usize) {
        let mut rng = rand::thread_rng();
        for _ in 0..n_samples {
            if self.rand_interval > 0 {
                self.rand_counter += 1;
                if self.rand_counter >= self.rand_interval {
                    self.rand_counter = 0;
                    if rng.gen_bool(0.5) && self.last_siglev < self.siglev_max {
                        self.last_siglev += 1.0;
                    } else if self.last_siglev > self.siglev_min {
                        self.last_siglev -= 1.0;
                    }
                }
            }

            if self.toggle_interval > 0 {
                self.toggle_counter += 1;
                if self.toggle_counter >= self.toggle_interval {
                    self.toggle_counter = 0;
                    self.last_siglev = if self.last_siglev == self.siglev_min { self.siglev_max } else { self.siglev_min };
                }
            }

            self.block_idx += 1;
            if self.block_idx == self.block_len {
                self.block_idx = 0;
                self.history.push_back(self.last_siglev);
                while self.history.len() > self.integration_blocks {
                    self.history.pop_front();
                }
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
        self.block_idx = 0;
        self.rand_counter = 0;
        self.toggle_counter = 0;
        self.history.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggling_alternates_between_min_and_max() {
        let mut det = SimDetector::new(16_000).with_range(0.0, 100.0, 0.0).with_toggle_interval_samples(1);
        det.advance(1);
        assert_eq!(det.last_siglev(), 100.0);
        det.advance(1);
        assert_eq!(det.last_siglev(), 0.0);
    }

    #[test]
    fn no_configured_dynamics_holds_default() {
        let mut det = SimDetector::new(16_000).with_range(0.0, 100.0, 42.0);
        det.advance(1_000);
        assert_eq!(det.last_siglev(), 42.0);
    }
}
