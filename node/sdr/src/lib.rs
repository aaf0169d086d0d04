pub mod iq;
pub mod placement;
pub mod rtl_tcp;
pub mod tuner;

pub use iq::{IqSample, IqSource, SdrError, SdrResult};
pub use rtl_tcp::RtlTcpSource;
pub use tuner::{TunerCommand, TunerHandle};
