use thiserror::Error;

/// DDR-level error taxonomy (spec §7): all fatal-to-this-channel, not
/// fatal-to-the-process — a caller that gets one drops the channel and, if
/// desired, requests another.
#[derive(Error, Debug)]
pub enum DdrError {
    #[error("tuner actor is gone")]
    TunerGone,

    #[error("unsupported tuner sample rate {0} Hz (spec §3 supports 960000 or 2400000)")]
    UnsupportedTunerRate(u32),

    #[error("failed to spawn DDR worker thread: {0}")]
    ThreadSpawn(String),
}

pub type DdrResult<T> = Result<T, DdrError>;
