use clap::Parser;

/// Configuration surface consumed by a Remote Rx/Tx proxy (spec §6).
///
/// The `<CODEC>_ENC_*` / `<CODEC>_DEC_*` keys are not named fields here —
/// clap has no way to model a dynamic prefix — so they're pulled out of the
/// process environment by [`Config::codec_options`] instead.
#[derive(Parser, Debug, Clone)]
#[command(name = "rt-trx-proxy", about = "NetTrx remote transceiver client")]
pub struct Config {
    #[arg(long, env = "HOST")]
    pub host: String,

    #[arg(long, env = "TCP_PORT", default_value_t = rt_wire::DEFAULT_PORT)]
    pub tcp_port: u16,

    #[arg(long, env = "AUTH_KEY", default_value = "")]
    pub auth_key: String,

    #[arg(long, env = "CODEC", default_value = "raw")]
    pub codec: String,

    #[arg(long, env = "LOG_DISCONNECTS_ONCE", default_value_t = false)]
    pub log_disconnects_once: bool,

    #[arg(long, env = "METRICS_LISTEN", default_value = "0.0.0.0:9101")]
    pub metrics_listen: String,
}

impl Config {
    /// Collect `<CODEC>_ENC_*` or `<CODEC>_DEC_*` environment variables into
    /// opaque (key, value) options for the codec plug-in, key stripped of
    /// its prefix and lower-cased.
    pub fn codec_options(&self, direction: &str) -> Vec<(String, String)> {
        let prefix = format!("{}_{}_", self.codec.to_uppercase(), direction.to_uppercase());
        std::env::vars()
            .filter_map(|(k, v)| {
                k.strip_prefix(&prefix).map(|rest| (rest.to_lowercase(), v))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codec_options_strips_prefix_and_lowercases() {
        std::env::set_var("RAW_ENC_BITRATE", "8000");
        let cfg = Config {
            host: "h".into(),
            tcp_port: 1,
            auth_key: String::new(),
            codec: "raw".into(),
            log_disconnects_once: false,
            metrics_listen: "x".into(),
        };
        let opts = cfg.codec_options("enc");
        assert!(opts.contains(&("bitrate".to_string(), "8000".to_string())));
        std::env::remove_var("RAW_ENC_BITRATE");
    }
}
