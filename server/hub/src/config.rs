use clap::Parser;

use crate::errors::HubError;

/// Configuration surface consumed by the hub (spec §6).
#[derive(Parser, Debug, Clone)]
#[command(name = "rt-hub", about = "NetTrx hub: session routing and master election")]
pub struct Config {
    #[arg(long, env = "LISTEN_PORT", default_value_t = rt_wire::DEFAULT_PORT)]
    pub listen_port: u16,

    /// Empty disables the AuthChallenge/AuthResponse handshake step.
    #[arg(long, env = "AUTH_KEY", default_value = "")]
    pub auth_key: String,

    /// Squelch-hold watchdog timeout in ms (ms, min 1000, default 60000).
    #[arg(long, env = "SQL_TIMEOUT", default_value_t = 60_000)]
    pub sql_timeout_ms: u64,

    /// Reserved: mirrors `SQL_TIMEOUT`'s validation range but has no
    /// distinct hub behavior wired to it yet (see DESIGN.md).
    #[arg(long, env = "SQL_RESET_TIMEOUT", default_value_t = 60_000)]
    pub sql_reset_timeout_ms: u64,

    /// Heartbeat sweep interval in ms (5000-50000, default 10000).
    #[arg(long, env = "HEARTBEAT_TIMEOUT", default_value_t = 10_000)]
    pub heartbeat_timeout_ms: u64,

    #[arg(long, env = "METRICS_LISTEN", default_value = "0.0.0.0:9100")]
    pub metrics_listen: String,
}

impl Config {
    pub fn validate(&self) -> Result<(), HubError> {
        if self.sql_timeout_ms < 1_000 {
            return Err(HubError::ConfigurationInvalid(format!(
                "SQL_TIMEOUT must be >= 1000ms, got {}",
                self.sql_timeout_ms
            )));
        }
        if self.sql_reset_timeout_ms < 1_000 {
            return Err(HubError::ConfigurationInvalid(format!(
                "SQL_RESET_TIMEOUT must be >= 1000ms, got {}",
                self.sql_reset_timeout_ms
            )));
        }
        if !(5_000..=50_000).contains(&self.heartbeat_timeout_ms) {
            return Err(HubError::ConfigurationInvalid(format!(
                "HEARTBEAT_TIMEOUT must be within 5000-50000ms, got {}",
                self.heartbeat_timeout_ms
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Config {
        Config {
            listen_port: 5210,
            auth_key: String::new(),
            sql_timeout_ms: 60_000,
            sql_reset_timeout_ms: 60_000,
            heartbeat_timeout_ms: 10_000,
            metrics_listen: "0.0.0.0:9100".into(),
        }
    }

    #[test]
    fn defaults_are_valid() {
        assert!(base().validate().is_ok());
    }

    #[test]
    fn heartbeat_out_of_range_is_rejected() {
        let mut cfg = base();
        cfg.heartbeat_timeout_ms = 100;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn sql_timeout_below_floor_is_rejected() {
        let mut cfg = base();
        cfg.sql_timeout_ms = 500;
        assert!(cfg.validate().is_err());
    }
}
