use clap::Parser;

use rt_demod::DemodMode;

/// Configuration surface for `rt-node`: the SDR source, the single DDR
/// channel this process runs, and the hub it proxies to (spec §6 plus
/// the `rtl_tcp` source parameters of component I).
#[derive(Parser, Debug, Clone)]
#[command(name = "rt-node", about = "Remote transceiver: SDR + DDR + demod + siglev + audio + trx-proxy")]
pub struct Config {
    #[arg(long, env = "HUB_HOST")]
    pub hub_host: String,

    #[arg(long, env = "HUB_PORT", default_value_t = rt_wire::DEFAULT_PORT)]
    pub hub_port: u16,

    #[arg(long, env = "AUTH_KEY", default_value = "")]
    pub auth_key: String,

    #[arg(long, env = "CODEC", default_value = "raw")]
    pub codec: String,

    #[arg(long, env = "LOG_DISCONNECTS_ONCE", default_value_t = false)]
    pub log_disconnects_once: bool,

    #[arg(long, env = "SDR_HOST")]
    pub sdr_host: String,

    #[arg(long, env = "SDR_PORT", default_value_t = 1234)]
    pub sdr_port: u16,

    #[arg(long, env = "SDR_SAMPLE_RATE", default_value_t = 960_000)]
    pub sdr_sample_rate: u32,

    #[arg(long, env = "RX_FQ")]
    pub rx_fq_hz: u32,

    #[arg(long, env = "RX_MODULATION", value_parser = parse_modulation, default_value = "fm")]
    pub rx_modulation: DemodMode,

    #[arg(long, env = "METRICS_LISTEN", default_value = "0.0.0.0:9102")]
    pub metrics_listen: String,
}

fn parse_modulation(s: &str) -> Result<DemodMode, String> {
    match s.to_ascii_uppercase().as_str() {
        "FM" => Ok(DemodMode::Fm),
        "NBFM" => Ok(DemodMode::NbFm),
        "WBFM" => Ok(DemodMode::WbFm),
        "AM" => Ok(DemodMode::Am),
        "NBAM" => Ok(DemodMode::NbAm),
        "USB" => Ok(DemodMode::Usb),
        "LSB" => Ok(DemodMode::Lsb),
        "CW" => Ok(DemodMode::Cw),
        other => Err(format!("unknown modulation {other:?}")),
    }
}

/// Map the wire's `Modulation` (carried by `SetRxModulation`) onto the
/// demodulator's own mode enum.
pub fn demod_mode_from_wire(m: rt_wire::Modulation) -> DemodMode {
    match m {
        rt_wire::Modulation::Fm => DemodMode::Fm,
        rt_wire::Modulation::NbFm => DemodMode::NbFm,
        rt_wire::Modulation::WbFm => DemodMode::WbFm,
        rt_wire::Modulation::Am => DemodMode::Am,
        rt_wire::Modulation::NbAm => DemodMode::NbAm,
        rt_wire::Modulation::Usb => DemodMode::Usb,
        rt_wire::Modulation::Lsb => DemodMode::Lsb,
        rt_wire::Modulation::Cw => DemodMode::Cw,
    }
}

/// The inverse of [`demod_mode_from_wire`], used to (re-)announce this
/// node's own DDR modulation to the hub on READY (spec §4.4 Remote Rx,
/// §4.2 client step 2).
pub fn demod_mode_to_wire(m: DemodMode) -> rt_wire::Modulation {
    match m {
        DemodMode::Fm => rt_wire::Modulation::Fm,
        DemodMode::NbFm => rt_wire::Modulation::NbFm,
        DemodMode::WbFm => rt_wire::Modulation::WbFm,
        DemodMode::Am => rt_wire::Modulation::Am,
        DemodMode::NbAm => rt_wire::Modulation::NbAm,
        DemodMode::Usb => rt_wire::Modulation::Usb,
        DemodMode::Lsb => rt_wire::Modulation::Lsb,
        DemodMode::Cw => rt_wire::Modulation::Cw,
    }
}

impl Config {
    /// Collect `<CODEC>_ENC_*` environment variables into opaque (key,
    /// value) options for the codec plug-in, following the same
    /// convention as the trx-proxy binary (spec §6.1).
    pub fn codec_options(&self) -> Vec<(String, String)> {
        let prefix = format!("{}_ENC_", self.codec.to_uppercase());
        std::env::vars().filter_map(|(k, v)| k.strip_prefix(&prefix).map(|rest| (rest.to_lowercase(), v))).collect()
    }
}
