//! `LocalRxPipe`: the component M audio chain wiring together
//! de-emphasis, the squelch gate/valve, and the clipper over a DDR/
//! demodulator's 16 kHz PCM output, grounded on the pipeline order built
//! in `LocalRxBase::initialize` (deemphasis -> squelch valve -> clipper
//! -> splatter filter). The splatter low-pass after clipping and the
//! optional compressor/limiter ahead of it are left to a caller that
//! wants them (spec's DSP primitives already cover the filter shapes in
//! `rt_dsp`); this type only fixes the order the Non-goal-exempt stages
//! run in.

use tracing::debug;

use rt_dsp::emphasis::{Direction, Emphasis};

use super::clipper::Clipper;
use super::decode_event::{DecodeEvent, DecodeEventSink};
use super::squelch::SquelchGate;
use super::valve::AudioValve;

pub struct LocalRxPipe {
    sample_rate: u32,
    deemphasis: Option<Emphasis>,
    squelch: SquelchGate,
    valve: AudioValve,
    clipper: Clipper,
}

impl LocalRxPipe {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            deemphasis: None,
            squelch: SquelchGate::new(sample_rate),
            valve: AudioValve::new(),
            clipper: Clipper::default(),
        }
    }

    pub fn with_deemphasis(mut self, enabled: bool) -> Self {
        self.deemphasis = enabled.then(|| Emphasis::new(Direction::De));
        self
    }

    pub fn with_squelch_hangtime_ms(mut self, ms: u32) -> Self {
        self.squelch = SquelchGate::new(self.sample_rate).with_hangtime_ms(ms);
        self
    }

    pub fn with_clip_level(mut self, level: f32) -> Self {
        self.clipper = Clipper::new(level);
        self
    }

    pub fn is_open(&self) -> bool {
        self.squelch.is_open()
    }

    /// Run one block of 16 kHz PCM through the chain in place. `detector_open`
    /// and `siglev` come from whatever squelch detector the caller runs
    /// (out of scope here); `decode_events`, if any fired this block, are
    /// handed to `sink` untouched.
    pub fn process(
        &mut self,
        samples: &mut [f32],
        detector_open: bool,
        siglev: f32,
        decode_events: &[DecodeEvent],
        sink: &mut dyn DecodeEventSink,
    ) {
        if let Some(deemph) = &mut self.deemphasis {
            deemph.process(samples);
        }

        let was_open = self.squelch.is_open();
        self.squelch.update(detector_open, siglev);
        self.squelch.advance(samples.len() as u32);
        if self.squelch.is_open() != was_open {
            debug!(open = self.squelch.is_open(), siglev, "squelch state changed");
        }
        self.valve.set_open(self.squelch.is_open());
        self.valve.process(samples);

        self.clipper.process(samples);

        for event in decode_events {
            sink.on_decode_event(event.clone());
        }
    }

    pub fn reset(&mut self) {
        self.squelch.reset();
        self.valve.set_open(false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::localrx::decode_event::RecordingSink;

    #[test]
    fn closed_squelch_silences_output_but_still_forwards_decode_events() {
        let mut pipe = LocalRxPipe::new(16_000);
        let mut block = vec![0.5f32; 8];
        let mut sink = RecordingSink::default();
        let events = [DecodeEvent::Tone { freq_hz: 1750.0 }];
        pipe.process(&mut block, false, 0.0, &events, &mut sink);
        assert_eq!(block, vec![0.0; 8]);
        assert_eq!(sink.events.len(), 1);
    }

    #[test]
    fn open_squelch_passes_audio_through_clipper() {
        let mut pipe = LocalRxPipe::new(16_000).with_clip_level(0.9);
        let mut block = vec![1.5f32, -1.5, 0.2];
        let mut sink = RecordingSink::default();
        pipe.process(&mut block, true, 50.0, &[], &mut sink);
        assert_eq!(block, vec![0.9, -0.9, 0.2]);
        assert!(pipe.is_open());
    }
}
