use thiserror::Error;

/// Wire-level error kinds, matching the taxonomy a caller needs to decide
/// propagation policy on (local-to-session vs fatal).
#[derive(Error, Debug)]
pub enum WireError {
    #[error("protocol format error: {0}")]
    ProtocolFormat(String),

    #[error("receive buffer overflow: payload of {size} bytes exceeds capacity {cap}")]
    BufferOverflowRecv { size: usize, cap: usize },

    #[error("send buffer overflow on write")]
    BufferOverflowSend,

    #[error("transport I/O error")]
    TransportIo(#[from] std::io::Error),

    #[error("unknown message type {0}")]
    UnknownType(u32),
}

pub type WireResult<T> = Result<T, WireError>;
