//! Contract-only DTMF/tone/Sel5 decode events (component M). The actual
//! detection algorithms (Goertzel-bank DTMF decoding, 1750Hz/CTCSS tone
//! detection, five-tone Sel5 sequence matching) are named out of scope:
//! only the event shapes a caller's detector emits into the local Rx
//! pipe, matching the wire's `Dtmf`/`Tone`/`Sel5` message fields
//! one-for-one so a node can forward a local detection straight onto
//! the wire with no translation.

/// What a (caller-supplied, out-of-scope) decoder reports upstream.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodeEvent {
    /// A DTMF digit transitioned to active (`true`) or released (`false`).
    Dtmf { digit: u8, active: bool },
    /// A configured tone detector (spec `AddToneDetector`) fired.
    Tone { freq_hz: f32 },
    /// A selective-calling digit sequence completed.
    Sel5 { digits: String },
}

/// Anything that can observe decode events as they occur; a DTMF/tone/
/// Sel5 detector this crate does not implement is expected to drive one
/// of these, e.g. to relay detections onto the wire as
/// `rt_wire::message::Message::Dtmf`/`Tone`/`Sel5`.
pub trait DecodeEventSink {
    fn on_decode_event(&mut self, event: DecodeEvent);
}

/// A sink that just remembers the events it was given, useful for tests
/// and for a node binary that hasn't wired a real relay yet.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub events: Vec<DecodeEvent>,
}

impl DecodeEventSink for RecordingSink {
    fn on_decode_event(&mut self, event: DecodeEvent) {
        self.events.push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_sink_accumulates_events_in_order() {
        let mut sink = RecordingSink::default();
        sink.on_decode_event(DecodeEvent::Dtmf { digit: b'5', active: true });
        sink.on_decode_event(DecodeEvent::Tone { freq_hz: 1750.0 });
        sink.on_decode_event(DecodeEvent::Sel5 { digits: "12345".to_string() });
        assert_eq!(sink.events.len(), 3);
        assert_eq!(sink.events[0], DecodeEvent::Dtmf { digit: b'5', active: true });
    }
}
