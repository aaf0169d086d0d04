//! Audio valve (component M), grounded on `AsyncAudioValve`'s use in
//! `LocalRxBase.cpp` (`sql_valve`, `mute_valve`): a gate that either
//! passes a block through unchanged or replaces it with silence,
//! distinct from [`super::squelch::SquelchGate`] which only decides
//! *when* to flip the valve.

#[derive(Debug, Clone, Copy)]
pub struct AudioValve {
    open: bool,
}

impl Default for AudioValve {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioValve {
    pub fn new() -> Self {
        Self { open: false }
    }

    pub fn set_open(&mut self, open: bool) {
        self.open = open;
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Pass `samples` through unchanged if open, or overwrite with
    /// silence if closed.
    pub fn process(&self, samples: &mut [f32]) {
        if !self.open {
            samples.fill(0.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closed_valve_silences_the_block() {
        let valve = AudioValve::new();
        let mut block = vec![1.0f32, -1.0, 0.5];
        valve.process(&mut block);
        assert_eq!(block, vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn open_valve_passes_audio_unchanged() {
        let mut valve = AudioValve::new();
        valve.set_open(true);
        let mut block = vec![1.0f32, -1.0, 0.5];
        valve.process(&mut block);
        assert_eq!(block, vec![1.0, -1.0, 0.5]);
    }
}
