use metrics::{counter, gauge};

use crate::labels::LabelPolicy;

/// Metric names under `{ns}_hub_*` (SPEC_FULL §A.4).
pub struct HubMetrics {
    ns: &'static str,
    policy: LabelPolicy,
}

impl HubMetrics {
    pub fn new(namespace: &'static str, policy: LabelPolicy) -> Self {
        Self { ns: namespace, policy }
    }

    #[inline]
    pub fn conn_accepted(&self) {
        counter!(format!("{}_hub_connections_total", self.ns)).increment(1);
    }

    #[inline]
    pub fn conn_closed(&self, reason: &'static str) {
        counter!(format!("{}_hub_connections_closed_total", self.ns), "reason" => LabelPolicy::reason(reason).as_str().to_string())
            .increment(1);
    }

    #[inline]
    pub fn auth_success(&self) {
        counter!(format!("{}_hub_auth_success_total", self.ns)).increment(1);
    }

    #[inline]
    pub fn auth_failed(&self) {
        counter!(format!("{}_hub_auth_failed_total", self.ns)).increment(1);
    }

    #[inline]
    pub fn peers_connected(&self, n: usize) {
        gauge!(format!("{}_hub_peers_connected", self.ns)).set(n as f64);
    }

    /// A peer took over (or gave up) master; `is_master` is the new state.
    #[inline]
    pub fn master_transition(&self, is_master: bool) {
        counter!(
            format!("{}_hub_master_transitions_total", self.ns),
            "to" => if is_master { "master" } else { "slave" }
        )
        .increment(1);
    }

    /// Audio, squelch-hold, or heartbeat watchdog fired for a peer.
    #[inline]
    pub fn watchdog_timeout(&self, kind: &'static str) {
        counter!(format!("{}_hub_watchdog_timeouts_total", self.ns), "kind" => kind).increment(1);
    }

    #[inline]
    pub fn msg_rx(&self, kind: &'static str) {
        counter!(format!("{}_hub_messages_rx_total", self.ns), "kind" => kind).increment(1);
    }

    #[inline]
    pub fn msg_tx(&self, kind: &'static str) {
        counter!(format!("{}_hub_messages_tx_total", self.ns), "kind" => kind).increment(1);
    }

    #[inline]
    pub fn drop_reason(&self, reason: &'static str) {
        counter!(format!("{}_hub_drops_total", self.ns), "reason" => self.policy.reason(reason).as_str().to_string()).increment(1);
    }

    #[inline]
    pub fn per_peer_audio_rx(&self, peer_id_hash: u32) {
        counter!(
            format!("{}_hub_audio_rx_by_peer_total", self.ns),
            "peer" => self.policy.peer_bucket(peer_id_hash).as_str().to_string()
        )
        .increment(1);
    }
}
