//! Component J: the Digital Drop Receiver channelizer (spec §4.5) —
//! translate, multistage FIR decimation to a bandwidth class, pre-demod IQ
//! publish, and demodulation, each channel running on its own worker
//! thread registered against a shared [`rt_sdr::TunerHandle`].

pub mod bandwidth;
pub mod channel;
pub mod errors;

pub use bandwidth::BandwidthClass;
pub use channel::Ddr;
pub use errors::{DdrError, DdrResult};
