//! Component D: the hub router. A single task owns all peer/master state
//! and processes events serially from an mpsc channel — the idiomatic-Rust
//! equivalent of spec §5's "single-threaded cooperative event loop, no
//! mutexes needed" (see DESIGN.md for the actor-model redesign decision).

use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use rt_metrics::hub::HubMetrics;
use rt_wire::{CodecSelect, Message, TxCtrlMode};

pub type PeerId = SocketAddr;

const AUDIO_WATCHDOG: Duration = Duration::from_millis(1_000);
const ROUTER_CHANNEL_DEPTH: usize = 1_024;

#[derive(Clone, Copy, Debug)]
pub struct RouterConfig {
    pub squelch_hold: Duration,
    pub heartbeat_interval: Duration,
}

/// Events the hub router consumes; sessions are the only producers.
pub enum RouterEvent {
    Connected { peer: PeerId, tx: mpsc::Sender<Message> },
    Disconnected { peer: PeerId },
    Message { peer: PeerId, msg: Message },
}

struct PeerState {
    tx: mpsc::Sender<Message>,
    last_msg: Instant,
    rx_codec: Option<CodecSelect>,
    tx_codec: Option<CodecSelect>,
    /// Set once the squelch-hold watchdog fires against this peer as
    /// master; barred from becoming master again until it reconnects
    /// (spec §4.3).
    blocked: bool,
}

pub struct HubActor {
    peers: HashMap<PeerId, PeerState>,
    master: Option<PeerId>,
    audio_deadline: Option<Instant>,
    squelch_deadline: Option<Instant>,
    cfg: RouterConfig,
    metrics: HubMetrics,
}

/// Spawn the router task and return the channel sessions send events on.
pub fn spawn(cfg: RouterConfig, metrics: HubMetrics) -> mpsc::Sender<RouterEvent> {
    let (tx, rx) = mpsc::channel(ROUTER_CHANNEL_DEPTH);
    let actor = HubActor {
        peers: HashMap::new(),
        master: None,
        audio_deadline: None,
        squelch_deadline: None,
        cfg,
        metrics,
    };
    tokio::spawn(actor.run(rx));
    tx
}

impl HubActor {
    async fn run(mut self, mut events: mpsc::Receiver<RouterEvent>) {
        let mut heartbeat_tick = tokio::time::interval(self.cfg.heartbeat_interval);
        loop {
            tokio::select! {
                maybe_evt = events.recv() => {
                    match maybe_evt {
                        Some(evt) => self.handle_event(evt),
                        None => break,
                    }
                }
                _ = wait_until(self.audio_deadline) => {
                    self.metrics.watchdog_timeout("audio");
                    self.reset_all();
                }
                _ = wait_until(self.squelch_deadline) => {
                    self.on_squelch_watchdog();
                }
                _ = heartbeat_tick.tick() => {
                    self.heartbeat_sweep();
                }
            }
        }
    }

    fn handle_event(&mut self, evt: RouterEvent) {
        match evt {
            RouterEvent::Connected { peer, tx } => {
                self.peers.insert(
                    peer,
                    PeerState { tx, last_msg: Instant::now(), rx_codec: None, tx_codec: None, blocked: false },
                );
                self.metrics.conn_accepted();
                self.metrics.peers_connected(self.peers.len());
                info!(%peer, "peer connected");
            }
            RouterEvent::Disconnected { peer } => {
                info!(%peer, "peer disconnected");
                self.disconnect_peer(peer);
            }
            RouterEvent::Message { peer, msg } => {
                match self.peers.get_mut(&peer) {
                    Some(st) => st.last_msg = Instant::now(),
                    None => {
                        warn!(%peer, "message from unregistered peer, dropping");
                        return;
                    }
                }
                self.metrics.msg_rx(msg_kind(&msg));
                self.dispatch(peer, msg);
            }
        }
    }

    fn dispatch(&mut self, peer: PeerId, msg: Message) {
        match msg {
            Message::Audio { payload } => self.handle_audio(peer, payload),
            Message::Flush => {
                if self.master == Some(peer) {
                    self.reset_all();
                } else {
                    self.metrics.drop_reason("flush_not_master");
                }
            }
            Message::SetTxCtrlMode(mode) => self.handle_set_tx_ctrl_mode(peer, mode),
            Message::Heartbeat => {
                if let Some(st) = self.peers.get(&peer) {
                    let _ = st.tx.try_send(Message::Heartbeat);
                }
            }
            Message::Reset => self.relay_except(peer, Message::Reset),
            Message::Squelch { is_open, siglev, rx_id } => {
                self.relay_except(peer, Message::Squelch { is_open, siglev, rx_id })
            }
            Message::SetMuteState(m) => self.relay_except(peer, Message::SetMuteState(m)),
            Message::AddToneDetector { .. } | Message::SendDtmf { .. } | Message::EnableCtcss { .. } => {
                debug!(%peer, "ignoring tone/DTMF/CTCSS message, meaningless at hub");
            }
            Message::RxAudioCodecSelect(cs) => {
                if let Some(st) = self.peers.get_mut(&peer) {
                    st.rx_codec = Some(cs);
                }
            }
            Message::TxAudioCodecSelect(cs) => {
                if let Some(st) = self.peers.get_mut(&peer) {
                    st.tx_codec = Some(cs);
                }
            }
            other => {
                debug!(%peer, type_id = other.type_id(), "unhandled message type at hub, dropping");
                self.metrics.drop_reason("unhandled_type");
            }
        }
    }

    fn handle_audio(&mut self, peer: PeerId, payload: Vec<u8>) {
        match self.master {
            None => {
                if self.set_master(peer) {
                    self.relay_except(peer, Message::Squelch { is_open: true, siglev: 1.0, rx_id: 1 });
                    self.arm_audio_watchdog();
                    self.metrics.per_peer_audio_rx(peer_hash(&peer));
                    self.relay_except(peer, Message::Audio { payload });
                } else {
                    self.metrics.drop_reason("master_blocked");
                }
            }
            Some(m) if m == peer => {
                self.arm_audio_watchdog();
                self.metrics.per_peer_audio_rx(peer_hash(&peer));
                self.relay_except(peer, Message::Audio { payload });
            }
            Some(_) => self.metrics.drop_reason("audio_not_master"),
        }
    }

    fn handle_set_tx_ctrl_mode(&mut self, peer: PeerId, mode: TxCtrlMode) {
        match mode {
            TxCtrlMode::On => {
                if self.set_master(peer) {
                    self.broadcast_all(Message::TransmitterStateChange { is_transmitting: true });
                    self.broadcast_all(Message::Squelch { is_open: true, siglev: 1.0, rx_id: 1 });
                    self.arm_audio_watchdog();
                } else {
                    self.metrics.drop_reason("tx_ctrl_on_not_master");
                }
            }
            TxCtrlMode::Auto => {
                self.reset_master_if(peer);
                self.broadcast_all(Message::TransmitterStateChange { is_transmitting: false });
                self.broadcast_all(Message::SetTxCtrlMode(TxCtrlMode::Auto));
            }
            TxCtrlMode::Off => debug!(%peer, "SetTxCtrlMode(OFF) has no defined hub action"),
        }
    }

    /// `setMaster(S)`: succeeds only if no current master and `S` isn't
    /// barred (spec §4.3). Starts the squelch-hold watchdog on success.
    fn set_master(&mut self, peer: PeerId) -> bool {
        if self.master.is_some() {
            return false;
        }
        if self.peers.get(&peer).map(|p| p.blocked).unwrap_or(true) {
            return false;
        }
        self.master = Some(peer);
        self.squelch_deadline = Some(Instant::now() + self.cfg.squelch_hold);
        self.metrics.master_transition(true);
        true
    }

    /// `resetMaster(S)`: clears master iff it currently equals `S`.
    fn reset_master_if(&mut self, peer: PeerId) {
        if self.master == Some(peer) {
            self.master = None;
            self.squelch_deadline = None;
            self.metrics.master_transition(false);
        }
    }

    /// Releases the floor unconditionally: broadcasts the close sequence
    /// (spec §4.7) exactly once and clears watchdogs/master.
    fn reset_all(&mut self) {
        if self.master.take().is_some() {
            self.audio_deadline = None;
            self.squelch_deadline = None;
            self.broadcast_all(Message::Squelch { is_open: false, siglev: 0.0, rx_id: 0 });
            self.broadcast_all(Message::AllSamplesFlushed);
            self.metrics.master_transition(false);
        }
    }

    fn on_squelch_watchdog(&mut self) {
        if let Some(peer) = self.master {
            if let Some(st) = self.peers.get_mut(&peer) {
                st.blocked = true;
            }
            self.metrics.watchdog_timeout("squelch_hold");
        }
        self.reset_all();
    }

    fn heartbeat_sweep(&mut self) {
        let now = Instant::now();
        let threshold = self.cfg.heartbeat_interval * 2;
        let mut expired = Vec::new();
        for (id, st) in self.peers.iter() {
            if now.duration_since(st.last_msg) > threshold {
                expired.push(*id);
            } else {
                let _ = st.tx.try_send(Message::Heartbeat);
            }
        }
        for id in expired {
            self.metrics.watchdog_timeout("heartbeat");
            self.disconnect_peer(id);
        }
    }

    fn arm_audio_watchdog(&mut self) {
        self.audio_deadline = Some(Instant::now() + AUDIO_WATCHDOG);
    }

    fn disconnect_peer(&mut self, peer: PeerId) {
        if self.peers.remove(&peer).is_none() {
            return;
        }
        self.metrics.conn_closed("peer_gone");
        self.metrics.peers_connected(self.peers.len());
        if self.master == Some(peer) {
            self.reset_all();
        }
    }

    /// Broadcast to a snapshot of the peer map, excluding `from` (spec
    /// §4.3: "iterate a snapshot... not the live map"). A failed write
    /// disconnects that peer without aborting the rest of the broadcast.
    fn relay_except(&mut self, from: PeerId, msg: Message) {
        let snapshot: Vec<(PeerId, mpsc::Sender<Message>)> =
            self.peers.iter().filter(|(id, _)| **id != from).map(|(id, st)| (*id, st.tx.clone())).collect();
        self.metrics.msg_tx(msg_kind(&msg));
        let mut failed = Vec::new();
        for (id, tx) in snapshot {
            if tx.try_send(msg.clone()).is_err() {
                failed.push(id);
            }
        }
        for id in failed {
            self.disconnect_peer(id);
        }
    }

    fn broadcast_all(&mut self, msg: Message) {
        let snapshot: Vec<(PeerId, mpsc::Sender<Message>)> =
            self.peers.iter().map(|(id, st)| (*id, st.tx.clone())).collect();
        self.metrics.msg_tx(msg_kind(&msg));
        let mut failed = Vec::new();
        for (id, tx) in snapshot {
            if tx.try_send(msg.clone()).is_err() {
                failed.push(id);
            }
        }
        for id in failed {
            self.disconnect_peer(id);
        }
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(d) => tokio::time::sleep_until(d).await,
        None => std::future::pending().await,
    }
}

fn peer_hash(peer: &PeerId) -> u32 {
    const OFF: u32 = 0x811C_9DC5;
    const PRIME: u32 = 0x0100_0193;
    let mut h = OFF;
    for b in peer.to_string().into_bytes() {
        h ^= b as u32;
        h = h.wrapping_mul(PRIME);
    }
    h
}

fn msg_kind(msg: &Message) -> &'static str {
    match msg {
        Message::ProtoVer { .. } => "proto_ver",
        Message::Heartbeat => "heartbeat",
        Message::AuthChallenge { .. } => "auth_challenge",
        Message::AuthResponse { .. } => "auth_response",
        Message::AuthOk => "auth_ok",
        Message::RxAudioCodecSelect(_) => "rx_audio_codec_select",
        Message::TxAudioCodecSelect(_) => "tx_audio_codec_select",
        Message::Audio { .. } => "audio",
        Message::SetMuteState(_) => "set_mute_state",
        Message::AddToneDetector { .. } => "add_tone_detector",
        Message::Reset => "reset",
        Message::SetRxFq { .. } => "set_rx_fq",
        Message::SetRxModulation(_) => "set_rx_modulation",
        Message::Squelch { .. } => "squelch",
        Message::Dtmf { .. } => "dtmf",
        Message::Tone { .. } => "tone",
        Message::Sel5 { .. } => "sel5",
        Message::SiglevUpdate { .. } => "siglev_update",
        Message::SetTxCtrlMode(_) => "set_tx_ctrl_mode",
        Message::EnableCtcss { .. } => "enable_ctcss",
        Message::SendDtmf { .. } => "send_dtmf",
        Message::Flush => "flush",
        Message::TransmittedSignalStrength { .. } => "transmitted_signal_strength",
        Message::SetTxFq { .. } => "set_tx_fq",
        Message::SetTxModulation(_) => "set_tx_modulation",
        Message::TxTimeout => "tx_timeout",
        Message::TransmitterStateChange { .. } => "transmitter_state_change",
        Message::AllSamplesFlushed => "all_samples_flushed",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration as StdDuration;

    fn test_cfg() -> RouterConfig {
        RouterConfig { squelch_hold: StdDuration::from_millis(60_000), heartbeat_interval: StdDuration::from_millis(10_000) }
    }

    async fn spawn_peer(router: &mpsc::Sender<RouterEvent>, addr: &str) -> (PeerId, mpsc::Receiver<Message>) {
        let peer: PeerId = addr.parse().unwrap();
        let (tx, rx) = mpsc::channel(64);
        router.send(RouterEvent::Connected { peer, tx }).await.unwrap();
        (peer, rx)
    }

    #[tokio::test]
    async fn first_audio_becomes_master_and_opens_squelch_downstream() {
        let router = spawn(test_cfg(), HubMetrics::new("rt_test", Default::default()));
        let (a, _rx_a) = spawn_peer(&router, "127.0.0.1:1").await;
        let (_b, mut rx_b) = spawn_peer(&router, "127.0.0.1:2").await;

        router.send(RouterEvent::Message { peer: a, msg: Message::Audio { payload: vec![1, 2, 3] } }).await.unwrap();

        let squelch = rx_b.recv().await.unwrap();
        assert!(matches!(squelch, Message::Squelch { is_open: true, .. }));
        let audio = rx_b.recv().await.unwrap();
        assert!(matches!(audio, Message::Audio { .. }));
    }

    #[tokio::test]
    async fn audio_from_non_master_is_dropped() {
        let router = spawn(test_cfg(), HubMetrics::new("rt_test", Default::default()));
        let (a, _rx_a) = spawn_peer(&router, "127.0.0.1:3").await;
        let (b, mut rx_b) = spawn_peer(&router, "127.0.0.1:4").await;

        router.send(RouterEvent::Message { peer: a, msg: Message::Audio { payload: vec![9] } }).await.unwrap();
        // Drain the squelch+audio relay intended for b from a's audio.
        let _ = rx_b.recv().await;
        let _ = rx_b.recv().await;

        router.send(RouterEvent::Message { peer: b, msg: Message::Audio { payload: vec![1] } }).await.unwrap();
        // b's audio should never reach a, and a never registered a listener
        // for incoming audio besides the initial registration, so there's
        // nothing further to observe on rx_b either.
        assert!(tokio::time::timeout(StdDuration::from_millis(50), rx_b.recv()).await.is_err());
    }

    #[tokio::test]
    async fn flush_from_master_closes_floor() {
        let router = spawn(test_cfg(), HubMetrics::new("rt_test", Default::default()));
        let (a, _rx_a) = spawn_peer(&router, "127.0.0.1:5").await;
        let (_b, mut rx_b) = spawn_peer(&router, "127.0.0.1:6").await;

        router.send(RouterEvent::Message { peer: a, msg: Message::Audio { payload: vec![1] } }).await.unwrap();
        let _ = rx_b.recv().await; // squelch open
        let _ = rx_b.recv().await; // audio

        router.send(RouterEvent::Message { peer: a, msg: Message::Flush }).await.unwrap();
        let squelch_close = rx_b.recv().await.unwrap();
        assert!(matches!(squelch_close, Message::Squelch { is_open: false, .. }));
        let flushed = rx_b.recv().await.unwrap();
        assert!(matches!(flushed, Message::AllSamplesFlushed));
    }

    #[tokio::test]
    async fn set_tx_ctrl_on_from_non_master_is_ignored() {
        let router = spawn(test_cfg(), HubMetrics::new("rt_test", Default::default()));
        let (a, mut rx_a) = spawn_peer(&router, "127.0.0.1:7").await;
        let (b, mut rx_b) = spawn_peer(&router, "127.0.0.1:8").await;

        router.send(RouterEvent::Message { peer: a, msg: Message::SetTxCtrlMode(TxCtrlMode::On) }).await.unwrap();
        let _ = rx_b.recv().await; // TransmitterStateChange(true)
        let _ = rx_b.recv().await; // Squelch(open=true)

        // b (not master) sends SetTxCtrlMode(ON, spec §8 scenario 3: "hub ignores").
        router.send(RouterEvent::Message { peer: b, msg: Message::SetTxCtrlMode(TxCtrlMode::On) }).await.unwrap();
        assert!(tokio::time::timeout(StdDuration::from_millis(50), rx_a.recv()).await.is_err());
        assert!(tokio::time::timeout(StdDuration::from_millis(50), rx_b.recv()).await.is_err());
    }

    #[tokio::test]
    async fn set_tx_ctrl_on_from_blocked_peer_is_ignored() {
        // Short squelch-hold so the watchdog fires during the test (spec §8
        // scenario 4: a stuck-PTT peer is barred from becoming master again
        // until it reconnects).
        let cfg = RouterConfig { squelch_hold: StdDuration::from_millis(20), ..test_cfg() };
        let router = spawn(cfg, HubMetrics::new("rt_test", Default::default()));
        let (a, mut rx_a) = spawn_peer(&router, "127.0.0.1:9").await;
        let (_b, mut rx_b) = spawn_peer(&router, "127.0.0.1:10").await;

        router.send(RouterEvent::Message { peer: a, msg: Message::SetTxCtrlMode(TxCtrlMode::On) }).await.unwrap();
        let _ = rx_b.recv().await; // TransmitterStateChange(true)
        let _ = rx_b.recv().await; // Squelch(open=true)

        // a never sends Flush; the squelch-hold watchdog forces resetAll and
        // marks a blocked.
        let squelch_close = rx_b.recv().await.unwrap();
        assert!(matches!(squelch_close, Message::Squelch { is_open: false, .. }));
        let flushed = rx_b.recv().await.unwrap();
        assert!(matches!(flushed, Message::AllSamplesFlushed));

        router.send(RouterEvent::Message { peer: a, msg: Message::SetTxCtrlMode(TxCtrlMode::On) }).await.unwrap();
        assert!(tokio::time::timeout(StdDuration::from_millis(50), rx_a.recv()).await.is_err());
        assert!(tokio::time::timeout(StdDuration::from_millis(50), rx_b.recv()).await.is_err());
    }
}
