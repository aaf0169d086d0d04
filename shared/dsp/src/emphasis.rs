//! Component M pre/de-emphasis shelving filter, supplemented from
//! `original_source/src/svxlink/trx/Emphasis.h`. A single-pole filter with a
//! 300Hz corner whose de-emphasis transfer function is `(b0+b1*z^-1)/(1+a1*z^-1)`;
//! pre-emphasis runs the exact inverse (`(a0+a1*z^-1)/(b0+b1*z^-1)`, normalized
//! so the leading coefficient is 1) so pre- then de-emphasis is an identity.
//! Coefficients are derived from a bilinear transform of a 1/(1+sRC) RC
//! network at `f1=300Hz` with the zero moved to `z=0.9` for invertibility;
//! only 16kHz and 8kHz internal rates are supported, matching the two
//! original coefficient sets.

use crate::INTERNAL_AUDIO_RATE;

struct Coeffs {
    b0: f64,
    b1: f64,
    a1: f64,
}

const COEFFS_16K: Coeffs = Coeffs { b0: 0.058555891443177958, b1: 0.052700302299058421, a1: -0.888743806257763613 };
const COEFFS_8K: Coeffs = Coeffs { b0: 0.110940380645014949, b1: 0.099846342580711719, a1: -0.789213276774273331 };

const OUTPUT_GAIN_DB: f32 = 12.0;

fn coeffs() -> Coeffs {
    match INTERNAL_AUDIO_RATE {
        16_000 => COEFFS_16K,
        8_000 => COEFFS_8K,
        other => panic!("emphasis filters only support 8kHz/16kHz internal rates, got {other}"),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Pre,
    De,
}

/// A direct-form-I single-pole shelving filter, run in either direction.
pub struct Emphasis {
    b0: f64,
    b1: f64,
    a1: f64,
    gain: f64,
    x1: f64,
    y1: f64,
}

impl Emphasis {
    pub fn new(dir: Direction) -> Self {
        let c = coeffs();
        match dir {
            Direction::De => Self { b0: c.b0, b1: c.b1, a1: c.a1, gain: 10f64.powf((OUTPUT_GAIN_DB as f64) / 20.0), x1: 0.0, y1: 0.0 },
            Direction::Pre => {
                // Invert: swap numerator/denominator, then normalize so the
                // new b0 is 1 (filter library convention carried over from
                // the original), with the output gain's sign flipped.
                let (nb0, nb1, na1) = (1.0, c.a1 / c.b0, c.b1 / c.b0);
                Self { b0: nb0, b1: na1, a1: nb1, gain: 10f64.powf((-OUTPUT_GAIN_DB as f64) / 20.0), x1: 0.0, y1: 0.0 }
            }
        }
    }

    pub fn process_sample(&mut self, x: f32) -> f32 {
        let x = x as f64;
        let y0 = self.b0 * x + self.b1 * self.x1 - self.a1 * self.y1;
        self.x1 = x;
        self.y1 = y0;
        (y0 * self.gain) as f32
    }

    pub fn process(&mut self, samples: &mut [f32]) {
        for s in samples.iter_mut() {
            *s = self.process_sample(*s);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pre_then_de_emphasis_approximately_cancels() {
        let mut pre = Emphasis::new(Direction::Pre);
        let mut de = Emphasis::new(Direction::De);
        let input: Vec<f32> = (0..200).map(|n| ((n as f32) * 0.05).sin() * 0.3).collect();
        let mut round_tripped = Vec::with_capacity(input.len());
        for &s in &input {
            round_tripped.push(de.process_sample(pre.process_sample(s)));
        }
        // Both filters are linear and inverse by construction; after the
        // initial-condition transient settles the round trip should track
        // the input closely.
        let settled_err: f32 = input[50..]
            .iter()
            .zip(round_tripped[50..].iter())
            .map(|(a, b)| (a - b).abs())
            .sum::<f32>()
            / (input.len() - 50) as f32;
        assert!(settled_err < 0.05, "round-trip error too large: {settled_err}");
    }

    #[test]
    fn silence_stays_silent() {
        let mut de = Emphasis::new(Direction::De);
        let mut samples = vec![0.0f32; 32];
        de.process(&mut samples);
        for s in samples {
            assert_eq!(s, 0.0);
        }
    }
}
