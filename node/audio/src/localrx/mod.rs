//! Component M: the local Rx audio pipe that sits between a DDR/
//! demodulator's PCM output and an audio sink, grounded on
//! `original_source/src/svxlink/trx/LocalRxBase.cpp`.

pub mod clipper;
pub mod decode_event;
pub mod pipe;
pub mod squelch;
pub mod valve;

pub use clipper::Clipper;
pub use decode_event::{DecodeEvent, DecodeEventSink, RecordingSink};
pub use pipe::LocalRxPipe;
pub use squelch::SquelchGate;
pub use valve::AudioValve;
