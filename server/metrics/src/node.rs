use metrics::{counter, gauge};

/// Metric names under `{ns}_ddr_*`/`{ns}_node_*` for the remote-transceiver
/// process (SPEC_FULL §A.4): DDR throughput, AGC gain, and signal level.
#[derive(Clone, Copy)]
pub struct NodeMetrics {
    ns: &'static str,
}

impl NodeMetrics {
    pub fn new(namespace: &'static str) -> Self {
        Self { ns: namespace }
    }

    #[inline]
    pub fn ddr_samples_processed(&self, n: u64) {
        counter!(format!("{}_ddr_samples_processed_total", self.ns)).increment(n);
    }

    #[inline]
    pub fn ddr_underruns(&self) {
        counter!(format!("{}_ddr_underruns_total", self.ns)).increment(1);
    }

    #[inline]
    pub fn agc_gain_db(&self, gain_db: f64) {
        gauge!(format!("{}_node_agc_gain_db", self.ns)).set(gain_db);
    }

    #[inline]
    pub fn siglev(&self, siglev: f64) {
        gauge!(format!("{}_node_siglev", self.ns)).set(siglev);
    }

    #[inline]
    pub fn squelch_open(&self, is_open: bool) {
        gauge!(format!("{}_node_squelch_open", self.ns)).set(if is_open { 1.0 } else { 0.0 });
    }

    #[inline]
    pub fn transmitting(&self, is_transmitting: bool) {
        gauge!(format!("{}_node_transmitting", self.ns)).set(if is_transmitting { 1.0 } else { 0.0 });
    }

    #[inline]
    pub fn tuner_reconnects(&self) {
        counter!(format!("{}_node_tuner_reconnects_total", self.ns)).increment(1);
    }

    #[inline]
    pub fn proxy_reconnects(&self) {
        counter!(format!("{}_node_proxy_reconnects_total", self.ns)).increment(1);
    }
}
