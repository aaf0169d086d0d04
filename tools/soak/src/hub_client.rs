//! Thin NetTrx client used by the soak harness: connects, runs the client
//! half of the handshake (spec §4.2), and exposes the raw read/write halves
//! so `main.rs` can drive a worker's scripted message sequence directly,
//! without going through the reconnect/backoff policy `rt-trx-proxy::client_fsm`
//! applies for a real remote transceiver (a soak worker wants a hard failure
//! per iteration, not a silent retry).

use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;

use rt_auth::AuthKey;
use rt_wire::{Message, MessageReader};

pub struct HubClient {
    pub reader: MessageReader<OwnedReadHalf>,
    pub writer: OwnedWriteHalf,
}

impl HubClient {
    /// Connect and run the client-side handshake (spec §4.2 client half,
    /// steps 1-2), returning once the session is READY.
    pub async fn connect(host: &str, port: u16, auth_key: &AuthKey, timeout: Duration) -> Result<Self> {
        let stream = tokio::time::timeout(timeout, TcpStream::connect((host, port)))
            .await
            .context("connect timed out")??;
        stream.set_nodelay(true).ok();
        let (read_half, write_half) = stream.into_split();
        let mut client = Self { reader: MessageReader::new(read_half, rt_wire::DEFAULT_BUF_CAP), writer: write_half };
        client.handshake(auth_key, timeout).await?;
        Ok(client)
    }

    async fn handshake(&mut self, auth_key: &AuthKey, timeout: Duration) -> Result<()> {
        match self.recv_timeout(timeout).await?.ok_or_else(|| anyhow!("closed during VER_WAIT"))? {
            Message::ProtoVer { major, .. } if major == rt_wire::PROTO_MAJOR => {}
            Message::ProtoVer { major, .. } => {
                return Err(anyhow!("proto major mismatch: got {major}, want {}", rt_wire::PROTO_MAJOR))
            }
            other => return Err(anyhow!("expected ProtoVer, got {:?}", other.type_id())),
        }

        loop {
            match self.recv_timeout(timeout).await?.ok_or_else(|| anyhow!("closed during AUTH_WAIT"))? {
                Message::AuthChallenge { nonce } => {
                    let digest = rt_auth::compute_response(auth_key, &nonce);
                    self.send(Message::AuthResponse { digest }).await?;
                }
                Message::AuthOk => return Ok(()),
                other => return Err(anyhow!("unexpected message in AUTH_WAIT: {:?}", other.type_id())),
            }
        }
    }

    pub async fn send(&mut self, msg: Message) -> Result<()> {
        rt_wire::write_message(&mut self.writer, &msg).await.map_err(Into::into)
    }

    pub async fn recv(&mut self) -> Result<Option<Message>> {
        self.reader.read_message().await.map_err(Into::into)
    }

    pub async fn recv_timeout(&mut self, timeout: Duration) -> Result<Option<Message>> {
        tokio::time::timeout(timeout, self.recv()).await.context("read timed out")?
    }
}
