//! Component J step 2 (decimate): a single FIR decimator stage. DDR
//! channelizers cascade several of these (spec §4.5) to reach the channel's
//! target bandwidth class. Grounded on the `Decimator` template in
//! `Ddr.cpp`'s anonymous namespace (decimation factor, coefficient vector,
//! circular delay line), generalized to run over either complex IQ samples
//! or real (post-discriminator) samples via one generic.
use std::ops::{Add, Mul};

/// A sample type a [`FirDecimator`] can run over: real `f32` for
/// post-discriminator decimation, `num_complex::Complex32` for IQ.
pub trait DspSample: Copy + Default + Add<Output = Self> + Mul<f32, Output = Self> {}
impl<T> DspSample for T where T: Copy + Default + Add<Output = T> + Mul<f32, Output = T> {}

pub struct FirDecimator<S: DspSample> {
    dec_fact: usize,
    coeffs: Vec<f32>,
    delay: Vec<S>,
    pos: usize,
}

impl<S: DspSample> FirDecimator<S> {
    pub fn new(dec_fact: usize, coeffs: Vec<f32>) -> Self {
        assert!(dec_fact >= 1);
        let taps = coeffs.len();
        Self { dec_fact, coeffs, delay: vec![S::default(); taps.max(1)], pos: 0 }
    }

    pub fn dec_fact(&self) -> usize {
        self.dec_fact
    }

    /// `input.len()` must be a multiple of `dec_fact` (spec §4.5).
    pub fn process(&mut self, input: &[S]) -> Vec<S> {
        assert_eq!(input.len() % self.dec_fact, 0, "input block must be a multiple of the decimation factor");
        let mut out = Vec::with_capacity(input.len() / self.dec_fact);
        let taps = self.delay.len();

        for chunk in input.chunks(self.dec_fact) {
            for &s in chunk {
                self.delay[self.pos] = s;
                self.pos = (self.pos + 1) % taps;
            }
            let mut acc = S::default();
            // self.pos is the index of the oldest-to-be-overwritten slot,
            // i.e. one past the most recent sample; walk backwards from there.
            let mut idx = (self.pos + taps - 1) % taps;
            for &c in &self.coeffs {
                acc = acc + self.delay[idx] * c;
                idx = (idx + taps - 1) % taps;
            }
            out.push(acc);
        }
        out
    }
}

/// Design a windowed-sinc lowpass FIR suited to decimating by `dec_fact`
/// (Hamming window, `taps` coefficients, unity DC gain). Spec §1 Non-goals
/// explicitly leaves vendor coefficient tables unspecified ("an implementer
/// chooses equivalent filters meeting the stated passband and stop-band
/// goals"), so this one function is reused for every bandwidth class's
/// channel/decimation stages (spec §4.5) rather than transcribing tables.
pub fn design_lowpass(dec_fact: usize, taps: usize) -> Vec<f32> {
    assert!(dec_fact >= 1);
    design_lowpass_norm(0.45 / dec_fact as f64, taps)
}

/// Design a windowed-sinc lowpass FIR with cutoff `fc` expressed in cycles
/// per sample (i.e. `bandwidth_hz / sample_rate_hz`), for callers that need
/// an explicit passband rather than one derived from a decimation factor —
/// e.g. a DDR channel's nominal 3 dB bandwidth (spec §4.5's class table).
pub fn design_lowpass_norm(fc: f64, taps: usize) -> Vec<f32> {
    assert!(taps % 2 == 1, "use an odd tap count for a linear-phase FIR");
    assert!(fc > 0.0 && fc < 0.5, "cutoff must be within the Nyquist range");

    let m = (taps - 1) as f64;
    let mut coeffs = Vec::with_capacity(taps);
    for n in 0..taps {
        let k = n as f64 - m / 2.0;
        let sinc = if k.abs() < 1e-9 {
            2.0 * fc
        } else {
            (2.0 * std::f64::consts::PI * fc * k).sin() / (std::f64::consts::PI * k)
        };
        let window = 0.54 - 0.46 * (2.0 * std::f64::consts::PI * n as f64 / m).cos();
        coeffs.push((sinc * window) as f32);
    }
    let sum: f32 = coeffs.iter().sum();
    for c in coeffs.iter_mut() {
        *c /= sum;
    }
    coeffs
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_complex::Complex32;

    #[test]
    fn design_lowpass_is_symmetric_and_unity_dc_gain() {
        let coeffs = design_lowpass(4, 31);
        let sum: f32 = coeffs.iter().sum();
        assert!((sum - 1.0).abs() < 1e-4);
        for i in 0..coeffs.len() {
            assert!((coeffs[i] - coeffs[coeffs.len() - 1 - i]).abs() < 1e-6);
        }
    }

    #[test]
    fn decimate_by_2_halves_length() {
        let mut dec = FirDecimator::<f32>::new(2, vec![0.25, 0.5, 0.25]);
        let input = vec![1.0f32; 8];
        let out = dec.process(&input);
        assert_eq!(out.len(), 4);
    }

    #[test]
    fn dc_passes_through_normalized_filter() {
        // Unity-gain moving average: DC input should converge to DC output.
        let taps = 8;
        let coeffs = vec![1.0f32 / taps as f32; taps];
        let mut dec = FirDecimator::<f32>::new(1, coeffs);
        let input = vec![1.0f32; 64];
        let out = dec.process(&input);
        assert!((out.last().unwrap() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn complex_samples_supported() {
        let mut dec = FirDecimator::<Complex32>::new(4, vec![1.0, 1.0, 1.0, 1.0]);
        let input = vec![Complex32::new(1.0, 0.0); 8];
        let out = dec.process(&input);
        assert_eq!(out.len(), 2);
    }
}
