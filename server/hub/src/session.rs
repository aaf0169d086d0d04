//! Component C (server half): per-connection handshake FSM (spec §4.2),
//! after which the session becomes a thin pump between the socket and the
//! router's event channel. Grounded on the teacher's `gateway.rs`
//! per-connection task shape — single writer task fed by an mpsc channel,
//! a handshake step, then a read loop — adapted from QUIC streams to a
//! plain `TcpStream` split in two.

use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tracing::{info, warn};

use rt_auth::AuthKey;
use rt_metrics::hub::HubMetrics;
use rt_wire::{Message, MessageReader};

use crate::errors::{HubError, HubResult};
use crate::router::{PeerId, RouterEvent};

const WRITER_CHANNEL_DEPTH: usize = 256;

pub async fn handle_connection(
    stream: TcpStream,
    peer: PeerId,
    auth_key: AuthKey,
    router_tx: mpsc::Sender<RouterEvent>,
    metrics: HubMetrics,
) {
    stream.set_nodelay(true).ok();
    let (read_half, write_half) = stream.into_split();
    let mut reader = MessageReader::new(read_half, rt_wire::DEFAULT_BUF_CAP);

    let (out_tx, out_rx) = mpsc::channel::<Message>(WRITER_CHANNEL_DEPTH);
    let writer_task = tokio::spawn(run_writer(write_half, out_rx));

    if let Err(e) = server_handshake(&mut reader, &out_tx, &auth_key).await {
        warn!(%peer, error = %e, "handshake failed, closing session");
        metrics.auth_failed();
        writer_task.abort();
        return;
    }
    metrics.auth_success();

    if router_tx.send(RouterEvent::Connected { peer, tx: out_tx }).await.is_err() {
        writer_task.abort();
        return;
    }
    info!(%peer, "session ready");

    loop {
        match reader.read_message().await {
            Ok(Some(msg)) => {
                if router_tx.send(RouterEvent::Message { peer, msg }).await.is_err() {
                    break;
                }
            }
            Ok(None) => {
                info!(%peer, "peer closed connection");
                break;
            }
            Err(e) => {
                warn!(%peer, error = %e, "protocol error, closing session");
                break;
            }
        }
    }

    let _ = router_tx.send(RouterEvent::Disconnected { peer }).await;
    writer_task.abort();
}

async fn run_writer(mut write_half: OwnedWriteHalf, mut out_rx: mpsc::Receiver<Message>) {
    while let Some(msg) = out_rx.recv().await {
        if let Err(e) = rt_wire::write_message(&mut write_half, &msg).await {
            warn!(error = %e, "session write failed");
            break;
        }
    }
}

/// Server-side handshake (spec §4.2 step 1-2).
async fn server_handshake(
    reader: &mut MessageReader<OwnedReadHalf>,
    out_tx: &mpsc::Sender<Message>,
    auth_key: &AuthKey,
) -> HubResult<()> {
    let _ = out_tx.send(Message::ProtoVer { major: rt_wire::PROTO_MAJOR, minor: rt_wire::PROTO_MINOR }).await;

    if !auth_key.is_enabled() {
        let _ = out_tx.send(Message::AuthOk).await;
        return Ok(());
    }

    let nonce = rt_auth::generate_nonce();
    let _ = out_tx.send(Message::AuthChallenge { nonce }).await;

    match reader.read_message().await? {
        Some(Message::AuthResponse { digest }) => {
            rt_auth::verify_response(auth_key, &nonce, &digest).map_err(|_| HubError::AuthenticationFailed)?;
            let _ = out_tx.send(Message::AuthOk).await;
            let _ = out_tx.send(Message::TransmitterStateChange { is_transmitting: false }).await;
            Ok(())
        }
        Some(_) => Err(HubError::ProtocolFormat("expected AuthResponse in AUTH_WAIT".into())),
        None => Err(HubError::ProtocolFormat("connection closed during AUTH_WAIT".into())),
    }
}
