//! Component C (client half) and E: the reconnecting session state machine
//! described in spec §4.2 step 2-3 and the timers of §4.3/§5 (10 s heartbeat,
//! 15 s inbound idle timeout, fixed 20 s reconnect backoff — not exponential).
//! Grounded on the teacher's `client/src/main.rs` reconnect loop, trimmed of
//! its QUIC/audio-device specifics and rebuilt over a plain `TcpStream`.

use std::time::Duration;

use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::time::sleep;
use tracing::{info, warn};

use rt_auth::AuthKey;
use rt_metrics::node::NodeMetrics;
use rt_wire::{Message, MessageReader};

use crate::errors::{ProxyError, ProxyResult};

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(10);
const IDLE_TIMEOUT: Duration = Duration::from_secs(15);
const RECONNECT_BACKOFF: Duration = Duration::from_secs(20);
const OUTBOUND_CHANNEL_DEPTH: usize = 256;
const INBOUND_CHANNEL_DEPTH: usize = 256;

#[derive(Clone)]
pub struct ClientConfig {
    pub host: String,
    pub port: u16,
    pub auth_key: AuthKey,
    pub log_disconnects_once: bool,
}

/// Events a Remote Rx/Tx proxy reacts to (spec §4.2/§4.4).
pub enum ClientEvent {
    /// READY was entered (possibly after a reconnect) — any proxy state that
    /// must be re-announced (codec select, mute state, frequency, modulation)
    /// should be (re-)sent now.
    Ready,
    Message(Message),
    Disconnected,
}

/// Spawn the reconnecting client loop. Returns a sender for outbound
/// application messages and a receiver for inbound events.
pub fn spawn(cfg: ClientConfig, metrics: NodeMetrics) -> (mpsc::Sender<Message>, mpsc::Receiver<ClientEvent>) {
    let (out_tx, out_rx) = mpsc::channel(OUTBOUND_CHANNEL_DEPTH);
    let (evt_tx, evt_rx) = mpsc::channel(INBOUND_CHANNEL_DEPTH);
    tokio::spawn(run(cfg, metrics, out_rx, evt_tx));
    (out_tx, evt_rx)
}

async fn run(
    cfg: ClientConfig,
    metrics: NodeMetrics,
    mut out_rx: mpsc::Receiver<Message>,
    evt_tx: mpsc::Sender<ClientEvent>,
) {
    let mut logged_disconnect_once = false;
    loop {
        match run_once(&cfg, &mut out_rx, &evt_tx).await {
            Ok(()) => info!(host = %cfg.host, port = cfg.port, "proxy session ended"),
            Err(e) => {
                if !cfg.log_disconnects_once || !logged_disconnect_once {
                    warn!(host = %cfg.host, port = cfg.port, error = %e, "proxy session failed");
                    logged_disconnect_once = true;
                }
            }
        }
        if evt_tx.send(ClientEvent::Disconnected).await.is_err() {
            return;
        }
        metrics.proxy_reconnects();
        sleep(RECONNECT_BACKOFF).await;
    }
}

async fn run_once(
    cfg: &ClientConfig,
    out_rx: &mut mpsc::Receiver<Message>,
    evt_tx: &mpsc::Sender<ClientEvent>,
) -> ProxyResult<()> {
    let stream = TcpStream::connect((cfg.host.as_str(), cfg.port)).await.map_err(rt_wire::WireError::from)?;
    stream.set_nodelay(true).ok();
    let (read_half, mut write_half) = stream.into_split();
    let mut reader = MessageReader::new(read_half, rt_wire::DEFAULT_BUF_CAP);

    client_handshake(&mut reader, &mut write_half, &cfg.auth_key).await?;
    info!(host = %cfg.host, port = cfg.port, "proxy session ready");
    if evt_tx.send(ClientEvent::Ready).await.is_err() {
        return Ok(());
    }

    let mut heartbeat = tokio::time::interval(HEARTBEAT_INTERVAL);

    loop {
        tokio::select! {
            maybe_msg = out_rx.recv() => {
                match maybe_msg {
                    Some(msg) => rt_wire::write_message(&mut write_half, &msg).await?,
                    None => return Ok(()),
                }
            }
            _ = heartbeat.tick() => {
                rt_wire::write_message(&mut write_half, &Message::Heartbeat).await?;
            }
            read = tokio::time::timeout(IDLE_TIMEOUT, reader.read_message()) => {
                match read {
                    Err(_elapsed) => return Err(ProxyError::PeerTimeout),
                    Ok(Ok(Some(msg))) => {
                        if evt_tx.send(ClientEvent::Message(msg)).await.is_err() {
                            return Ok(());
                        }
                    }
                    Ok(Ok(None)) => return Err(ProxyError::ProtocolFormat("hub closed connection".into())),
                    Ok(Err(e)) => return Err(e.into()),
                }
            }
        }
    }
}

/// Client-side handshake (spec §4.2 client half, steps 1-2).
async fn client_handshake(
    reader: &mut MessageReader<tokio::net::tcp::OwnedReadHalf>,
    writer: &mut OwnedWriteHalf,
    auth_key: &AuthKey,
) -> ProxyResult<()> {
    match reader.read_message().await? {
        Some(Message::ProtoVer { major, .. }) if major == rt_wire::PROTO_MAJOR => {}
        Some(Message::ProtoVer { major, .. }) => {
            return Err(ProxyError::ProtocolVersionMismatch { expected: rt_wire::PROTO_MAJOR, got: major })
        }
        Some(_) => return Err(ProxyError::ProtocolFormat("expected ProtoVer in VER_WAIT".into())),
        None => return Err(ProxyError::ProtocolFormat("connection closed during VER_WAIT".into())),
    }

    loop {
        match reader.read_message().await? {
            Some(Message::AuthChallenge { nonce }) => {
                let digest = rt_auth::compute_response(auth_key, &nonce);
                rt_wire::write_message(writer, &Message::AuthResponse { digest }).await?;
            }
            Some(Message::AuthOk) => return Ok(()),
            Some(_) => return Err(ProxyError::ProtocolFormat("unexpected message in AUTH_WAIT".into())),
            None => return Err(ProxyError::ProtocolFormat("connection closed during AUTH_WAIT".into())),
        }
    }
}
