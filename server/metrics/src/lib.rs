pub mod config;
pub mod hub;
pub mod http;
pub mod labels;
pub mod node;

pub use config::MetricsConfig;
pub use http::MetricsServer;
pub use labels::{BoundedLabel, LabelPolicy};
