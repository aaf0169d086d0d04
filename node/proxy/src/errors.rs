use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProxyError {
    #[error("protocol error: {0}")]
    ProtocolFormat(String),

    #[error("protocol version mismatch: expected major {expected}, got {got}")]
    ProtocolVersionMismatch { expected: u16, got: u16 },

    #[error("authentication failed")]
    AuthenticationFailed,

    #[error("peer timed out")]
    PeerTimeout,

    #[error(transparent)]
    Wire(#[from] rt_wire::WireError),
}

pub type ProxyResult<T> = Result<T, ProxyError>;
