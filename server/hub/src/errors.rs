use thiserror::Error;

/// Hub-level error taxonomy (spec §7). Transport/protocol variants are
/// local to one session; `ConfigurationInvalid` is fatal at startup.
#[derive(Error, Debug)]
pub enum HubError {
    #[error("protocol error: {0}")]
    ProtocolFormat(String),

    #[error("authentication failed")]
    AuthenticationFailed,

    #[error("peer timed out")]
    PeerTimeout,

    #[error(transparent)]
    Wire(#[from] rt_wire::WireError),

    #[error("configuration invalid: {0}")]
    ConfigurationInvalid(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type HubResult<T> = Result<T, HubError>;
