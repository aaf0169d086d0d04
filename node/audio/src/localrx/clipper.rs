//! Hard clipper (component M), grounded on `AsyncAudioClipper`'s use in
//! `LocalRxBase.cpp` (`clipper->setClipLevel(0.98)`): clamps sample
//! amplitude to a configured level to protect downstream stages (codec,
//! sound card) from overshoot after gain stages or limiting upstream.

#[derive(Debug, Clone, Copy)]
pub struct Clipper {
    level: f32,
}

impl Clipper {
    pub fn new(level: f32) -> Self {
        Self {
            level: level.abs(),
        }
    }

    pub fn process(&self, samples: &mut [f32]) {
        for s in samples {
            *s = s.clamp(-self.level, self.level);
        }
    }
}

impl Default for Clipper {
    fn default() -> Self {
        Self::new(0.98)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamps_to_configured_level() {
        let clipper = Clipper::new(0.98);
        let mut block = vec![1.5f32, -1.5, 0.1];
        clipper.process(&mut block);
        assert_eq!(block, vec![0.98, -0.98, 0.1]);
    }
}
