//! IQ sample types and the tuner source abstraction (component I).

use async_trait::async_trait;
use num_complex::Complex32;
use thiserror::Error;

pub type IqSample = Complex32;

#[derive(Error, Debug)]
pub enum SdrError {
    #[error("transport I/O error")]
    Io(#[from] std::io::Error),

    #[error("unsupported sample rate {0} Hz (spec §3 supports 960000 or 2400000)")]
    UnsupportedSampleRate(u32),

    #[error("tuner protocol error: {0}")]
    Protocol(String),
}

pub type SdrResult<T> = Result<T, SdrError>;

/// A wideband IQ source (spec §3/§4.5 component I). `RtlTcpSource` is the
/// only implementation shipped here; a USB-attached dongle would implement
/// the same trait against `librtlsdr` bindings instead.
#[async_trait]
pub trait IqSource: Send {
    /// Pull the next block of samples at the tuner's native rate.
    async fn recv(&mut self) -> SdrResult<Vec<IqSample>>;

    async fn set_center_freq(&mut self, hz: u32) -> SdrResult<()>;

    fn sample_rate(&self) -> u32;
}
