//! Component H (audio codec plug-ins) and component M (local Rx audio
//! pipe): the two "last mile" pieces between a NetTrx session's wire
//! bytes and PCM a sound device or DDR/demodulator can use.

pub mod codec;
pub mod localrx;

pub use codec::{AdpcmCodec, AudioCodec, CodecError, RawCodec, UlawCodec};
pub use localrx::{AudioValve, Clipper, DecodeEvent, DecodeEventSink, LocalRxPipe, SquelchGate};
