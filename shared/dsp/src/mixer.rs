//! Translate step of the DDR pipeline (spec §4.5 step 1): multiply the IQ
//! stream by `exp(-j*2*pi*df*n/fs)` using a repeating lookup table so we
//! never call `sin`/`cos` per sample in steady state.

use crate::{gcd, IqSample};

pub struct ExpLut {
    table: Vec<IqSample>,
    idx: usize,
}

impl ExpLut {
    /// `delta_hz` may be negative (represented as a signed offset); `fs` is
    /// the sample rate the mixer runs at. The table repeats exactly every
    /// `fs / gcd(fs, |delta_hz|)` samples (spec §4.5).
    pub fn new(delta_hz: i64, fs: u32) -> Self {
        let mag = delta_hz.unsigned_abs() as u32;
        let period = if mag == 0 { 1 } else { fs / gcd(fs, mag) };
        let sign = if delta_hz < 0 { -1.0f64 } else { 1.0f64 };
        let table = (0..period)
            .map(|n| {
                let theta = sign * -2.0 * std::f64::consts::PI * (mag as f64) * (n as f64) / (fs as f64);
                IqSample::new(theta.cos() as f32, theta.sin() as f32)
            })
            .collect();
        Self { table, idx: 0 }
    }

    /// Multiply `samples` in place by the repeating mixer tone.
    pub fn apply(&mut self, samples: &mut [IqSample]) {
        let len = self.table.len();
        for s in samples.iter_mut() {
            *s *= self.table[self.idx];
            self.idx += 1;
            if self.idx == len {
                self.idx = 0;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_offset_is_identity() {
        let mut lut = ExpLut::new(0, 960_000);
        let mut samples = vec![IqSample::new(0.5, -0.25), IqSample::new(1.0, 0.0)];
        let before = samples.clone();
        lut.apply(&mut samples);
        for (a, b) in samples.iter().zip(before.iter()) {
            assert!((a - b).norm() < 1e-6);
        }
    }

    #[test]
    fn table_period_matches_gcd_rule() {
        let lut = ExpLut::new(1000, 960_000);
        assert_eq!(lut.table.len() as u32, 960_000 / gcd(960_000, 1000));
    }

    #[test]
    fn unit_magnitude_preserved() {
        let mut lut = ExpLut::new(12_345, 2_400_000);
        let mut samples = vec![IqSample::new(0.7, 0.3); 8];
        lut.apply(&mut samples);
        for s in &samples {
            assert!((s.norm() - IqSample::new(0.7, 0.3).norm()).abs() < 1e-5);
        }
    }
}
