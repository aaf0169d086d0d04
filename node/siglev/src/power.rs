//! A rolling window of per-block mean power, shared by [`crate::noise`] and
//! [`crate::ddr`]: accumulate squared-magnitude samples into fixed-length
//! blocks, then keep the last `integration_blocks` block powers around for
//! `lastSiglev`/`siglevIntegrated`-style readouts. Grounded on the
//! `ss`/`ss_values`/`ss_idx` bookkeeping in `SigLevDetNoise.cpp` and the
//! `pwr_sum`/`siglev_values` bookkeeping in `SigLevDetDdr.cpp`.

use std::collections::VecDeque;

pub struct PowerWindow {
    block_len: usize,
    acc: f64,
    count: usize,
    window: VecDeque<f64>,
    integration_blocks: usize,
}

impl PowerWindow {
    pub fn new(block_len: usize) -> Self {
        Self { block_len: block_len.max(1), acc: 0.0, count: 0, window: VecDeque::new(), integration_blocks: 1 }
    }

    pub fn set_integration_blocks(&mut self, blocks: usize) {
        self.integration_blocks = blocks.max(1);
        while self.window.len() > self.integration_blocks {
            self.window.pop_front();
        }
    }

    /// Feed one already-squared sample magnitude; returns the completed
    /// block's mean power once `block_len` samples have accumulated.
    pub fn push(&mut self, power: f64) -> Option<f64> {
        self.acc += power;
        self.count += 1;
        if self.count < self.block_len {
            return None;
        }
        let block_power = self.acc / self.block_len as f64;
        self.window.push_back(block_power);
        while self.window.len() > self.integration_blocks {
            self.window.pop_front();
        }
        self.acc = 0.0;
        self.count = 0;
        Some(block_power)
    }

    pub fn min(&self) -> Option<f64> {
        self.window.iter().copied().fold(None, |acc, x| Some(acc.map_or(x, |m: f64| m.min(x))))
    }

    pub fn mean(&self) -> Option<f64> {
        if self.window.is_empty() {
            return None;
        }
        Some(self.window.iter().sum::<f64>() / self.window.len() as f64)
    }

    pub fn reset(&mut self) {
        self.acc = 0.0;
        self.count = 0;
        self.window.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completes_a_block_and_windows_it() {
        let mut w = PowerWindow::new(4);
        w.set_integration_blocks(2);
        assert!(w.push(1.0).is_none());
        assert!(w.push(1.0).is_none());
        assert!(w.push(1.0).is_none());
        assert_eq!(w.push(1.0), Some(1.0));
        assert_eq!(w.mean(), Some(1.0));

        for _ in 0..4 {
            w.push(9.0);
        }
        // window now holds [1.0, 9.0], oldest dropped once a third block would push it out
        assert_eq!(w.min(), Some(1.0));
        for _ in 0..4 {
            w.push(9.0);
        }
        assert_eq!(w.min(), Some(9.0));
    }
}
