//! Squelch gate with hangtime (component M), grounded on
//! `original_source/src/svxlink/trx/LocalRxBase.cpp`'s `onSquelchOpen`:
//! a siglev-driven open/close decision plus a configurable hangtime that
//! keeps the gate open for a little while after the underlying detector
//! reports close, so a fading signal doesn't chop the tail of a
//! transmission. The actual open/close *decision* (CTCSS/tone/carrier
//! squelch detection) is the detection algorithm the crate's Non-goal
//! excludes; this module only gates audio on the caller's verdict.

/// Runs per-block: call [`Self::update`] with the detector's current
/// open/closed verdict and the current siglev, then read [`Self::is_open`]
/// to decide whether to pass audio downstream.
pub struct SquelchGate {
    hangtime_ms: u32,
    extended_hangtime_ms: u32,
    extended_hangtime_siglev_thresh: Option<f32>,
    sample_rate: u32,
    is_open: bool,
    hang_samples_left: u32,
}

impl SquelchGate {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            hangtime_ms: 0,
            extended_hangtime_ms: 0,
            extended_hangtime_siglev_thresh: None,
            sample_rate,
            is_open: false,
            hang_samples_left: 0,
        }
    }

    pub fn with_hangtime_ms(mut self, ms: u32) -> Self {
        self.hangtime_ms = ms;
        self
    }

    /// A longer hangtime used when siglev at close time was below
    /// `thresh` (a weak signal is more likely to be a real but fading
    /// transmission than noise briefly tripping the squelch).
    pub fn with_extended_hangtime(mut self, ms: u32, thresh: f32) -> Self {
        self.extended_hangtime_ms = ms;
        self.extended_hangtime_siglev_thresh = Some(thresh);
        self
    }

    fn hangtime_for_siglev(&self, siglev: f32) -> u32 {
        match self.extended_hangtime_siglev_thresh {
            Some(thresh) if siglev < thresh => self.extended_hangtime_ms.max(self.hangtime_ms),
            _ => self.hangtime_ms,
        }
    }

    /// Feed the detector's raw open/closed verdict plus the current
    /// siglev (used only to pick the hangtime on a closing transition).
    /// Returns `true` if the gate's open state changed this call.
    pub fn update(&mut self, detector_open: bool, siglev: f32) -> bool {
        if detector_open {
            let was_open = self.is_open;
            self.is_open = true;
            self.hang_samples_left = 0;
            return !was_open;
        }

        if self.is_open && self.hang_samples_left == 0 {
            let ms = self.hangtime_for_siglev(siglev);
            self.hang_samples_left = ms * self.sample_rate / 1000;
        }

        if self.hang_samples_left > 0 {
            false
        } else if self.is_open {
            self.is_open = false;
            true
        } else {
            false
        }
    }

    /// Advance the hang timer by `n_samples` of audio that was just
    /// processed while the gate was held open on hangtime alone.
    pub fn advance(&mut self, n_samples: u32) {
        self.hang_samples_left = self.hang_samples_left.saturating_sub(n_samples);
    }

    pub fn is_open(&self) -> bool {
        self.is_open
    }

    pub fn reset(&mut self) {
        self.is_open = false;
        self.hang_samples_left = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opens_immediately_and_closes_after_hangtime_expires() {
        let mut gate = SquelchGate::new(16_000).with_hangtime_ms(10);
        assert!(gate.update(true, 50.0));
        assert!(gate.is_open());

        assert!(!gate.update(false, 50.0));
        assert!(gate.is_open(), "should stay open through hangtime");
        gate.advance(160);

        assert!(gate.update(false, 50.0));
        assert!(!gate.is_open());
    }

    #[test]
    fn weak_signal_gets_extended_hangtime() {
        let mut gate = SquelchGate::new(16_000)
            .with_hangtime_ms(10)
            .with_extended_hangtime(100, 30.0);
        gate.update(true, 10.0);
        gate.update(false, 10.0);
        gate.advance(160);
        assert!(!gate.update(false, 10.0), "base hangtime alone should not yet close it");
        assert!(gate.is_open());
    }
}
