pub mod client_fsm;
pub mod config;
pub mod errors;
pub mod remote_rx;
pub mod remote_tx;

pub use config::Config;
pub use errors::{ProxyError, ProxyResult};
