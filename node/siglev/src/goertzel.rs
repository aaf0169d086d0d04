//! Single-bin Goertzel DFT and a Hamming analysis window, shared by the
//! [`crate::tone`] and [`crate::afsk`] detectors. Grounded on the
//! `MyGoertzel`/`HammingWindow` local classes in
//! `original_source/src/svxlink/trx/SigLevDetTone.cpp`.

/// A single-frequency Goertzel detector run over one analysis block, then
/// [`reset`](Self::reset) before the next.
pub struct Goertzel {
    q1: f32,
    q2: f32,
    coeff: f32,
}

impl Goertzel {
    pub fn new(freq_hz: f32, sample_rate: u32) -> Self {
        let coeff = 2.0 * (2.0 * std::f32::consts::PI * freq_hz / sample_rate as f32).cos();
        Self { q1: 0.0, q2: 0.0, coeff }
    }

    pub fn reset(&mut self) {
        self.q1 = 0.0;
        self.q2 = 0.0;
    }

    pub fn calc(&mut self, sample: f32) {
        let q0 = self.coeff * self.q1 - self.q2 + sample;
        self.q2 = self.q1;
        self.q1 = q0;
    }

    /// Relative magnitude squared of the bin over the samples fed since the
    /// last [`reset`](Self::reset).
    pub fn magnitude_squared(&self) -> f32 {
        self.q1 * self.q1 + self.q2 * self.q2 - self.q1 * self.q2 * self.coeff
    }
}

pub struct HammingWindow {
    window: Vec<f32>,
    pos: usize,
}

impl HammingWindow {
    pub fn new(size: usize) -> Self {
        let window = (0..size)
            .map(|i| 0.54 - 0.46 * (2.0 * std::f32::consts::PI * i as f32 / size as f32).cos())
            .collect();
        Self { window, pos: 0 }
    }

    pub fn reset(&mut self) {
        self.pos = 0;
    }

    pub fn calc(&mut self, sample: f32) -> f32 {
        let windowed = sample * self.window[self.pos];
        self.pos = if self.pos < self.window.len() - 1 { self.pos + 1 } else { 0 };
        windowed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn goertzel_responds_to_its_own_tone() {
        let sample_rate = 16_000;
        let freq = 1200.0;
        let mut on_freq = Goertzel::new(freq, sample_rate);
        let mut off_freq = Goertzel::new(freq + 2000.0, sample_rate);
        for n in 0..200 {
            let s = (2.0 * std::f32::consts::PI * freq * n as f32 / sample_rate as f32).sin();
            on_freq.calc(s);
            off_freq.calc(s);
        }
        assert!(on_freq.magnitude_squared() > off_freq.magnitude_squared() * 10.0);
    }
}
