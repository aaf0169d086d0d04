//! Constant-level "detector" (spec component L), grounded on
//! `original_source/src/svxlink/trx/SigLevDetConst.h`: reports a fixed
//! configured value, used where a link leg has no real signal level
//! measurement to offer.

pub struct ConstDetector {
    siglev: f32,
}

impl ConstDetector {
    pub fn new(siglev: f32) -> Self {
        Self { siglev }
    }

    pub fn last_siglev(&self) -> f32 {
        self.siglev
    }

    pub fn siglev_integrated(&self) -> f32 {
        self.siglev
    }

    pub fn reset(&mut self) {}
}
