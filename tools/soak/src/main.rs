//! `rt-soak`: a TCP load/conformance harness for `rt-hub`.
//!
//! The direct analogue of the teacher's QUIC connect/disconnect soak
//! tester (see DESIGN.md), retargeted at the NetTrx protocol: each
//! iteration of a worker opens a *listener* and a *transmitter* session
//! against the hub, drives the transmitter through the master-election and
//! squelch/flush sequence of spec §4.3/§4.7, and asserts the listener
//! observes exactly the broadcast the spec promises — then tears both
//! sessions down and repeats.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use tokio::sync::Mutex;
use tokio::time::sleep;
use tracing::{info, warn, Level};
use tracing_subscriber::EnvFilter;

mod hub_client;
mod stats;

use hub_client::HubClient;
use rt_auth::AuthKey;
use rt_wire::Message;
use stats::{dur_ms, quantiles_ms, SoakReport};

#[derive(Parser, Debug, Clone)]
#[command(name = "rt-soak", about = "NetTrx hub load/conformance harness")]
struct Args {
    #[arg(long, default_value = "127.0.0.1")]
    hub_host: String,

    #[arg(long, default_value_t = rt_wire::DEFAULT_PORT)]
    hub_port: u16,

    #[arg(long, default_value = "")]
    auth_key: String,

    /// Run for N iterations per worker.
    #[arg(long)]
    iterations: Option<u64>,

    /// Run for duration seconds (overrides iterations if set).
    #[arg(long)]
    duration_secs: Option<u64>,

    /// Number of concurrent workers, each driving its own listener+tx pair.
    #[arg(long, default_value_t = 8)]
    concurrency: usize,

    /// Bytes in the simulated encoded-audio payload per frame.
    #[arg(long, default_value_t = 160)]
    audio_frame_bytes: usize,

    /// Per-step read/connect timeout, milliseconds.
    #[arg(long, default_value_t = 2_000)]
    step_timeout_ms: u64,

    /// Write a JSON report to this path.
    #[arg(long)]
    report_json: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .init();

    let args = Args::parse();
    let stop_at = args.duration_secs.map(|s| Instant::now() + Duration::from_secs(s));

    let report = Arc::new(Mutex::new(SoakReport::default()));
    let connect_samples = Arc::new(Mutex::new(Vec::<u64>::new()));
    let auth_samples = Arc::new(Mutex::new(Vec::<u64>::new()));

    let mut handles = Vec::new();
    for worker_id in 0..args.concurrency {
        let args = args.clone();
        let report = report.clone();
        let connect_samples = connect_samples.clone();
        let auth_samples = auth_samples.clone();
        handles.push(tokio::spawn(async move {
            worker_loop(worker_id, args, stop_at, report, connect_samples, auth_samples).await
        }));
    }

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("ctrl-c received; stopping");
        }
        _ = async {
            for h in handles {
                let _ = h.await;
            }
        } => {}
    }

    let mut rep = report.lock().await.clone();
    {
        let mut c = connect_samples.lock().await;
        let (p50, p95) = quantiles_ms(&mut c);
        rep.timings.connect_ms_p50 = p50;
        rep.timings.connect_ms_p95 = p95;
    }
    {
        let mut a = auth_samples.lock().await;
        let (p50, p95) = quantiles_ms(&mut a);
        rep.timings.auth_ms_p50 = p50;
        rep.timings.auth_ms_p95 = p95;
    }

    info!("report: {}", serde_json::to_string_pretty(&rep)?);
    if let Some(path) = args.report_json.as_deref() {
        std::fs::write(path, serde_json::to_vec_pretty(&rep)?)?;
        info!("wrote {}", path);
    }

    Ok(())
}

async fn worker_loop(
    worker_id: usize,
    args: Args,
    stop_at: Option<Instant>,
    report: Arc<Mutex<SoakReport>>,
    connect_samples: Arc<Mutex<Vec<u64>>>,
    auth_samples: Arc<Mutex<Vec<u64>>>,
) -> Result<()> {
    let auth_key = AuthKey::from(args.auth_key.as_str());
    let step_timeout = Duration::from_millis(args.step_timeout_ms);
    let payload = vec![0x5au8; args.audio_frame_bytes];

    let mut iter: u64 = 0;
    loop {
        if let Some(stop) = stop_at {
            if Instant::now() >= stop {
                break;
            }
        }
        if let Some(max) = args.iterations {
            if iter >= max {
                break;
            }
        }
        iter += 1;

        if let Err(e) =
            run_iteration(&args, &auth_key, step_timeout, &payload, &report, &connect_samples, &auth_samples).await
        {
            warn!(worker_id, iteration = iter, error = %e, "soak iteration failed");
        } else {
            report.lock().await.counters.sessions_completed += 1;
        }
    }

    Ok(())
}

async fn run_iteration(
    args: &Args,
    auth_key: &AuthKey,
    step_timeout: Duration,
    payload: &[u8],
    report: &Arc<Mutex<SoakReport>>,
    connect_samples: &Arc<Mutex<Vec<u64>>>,
    auth_samples: &Arc<Mutex<Vec<u64>>>,
) -> Result<()> {
    let mut listener = connect_timed(args, auth_key, step_timeout, report, connect_samples, auth_samples).await?;
    let mut tx = connect_timed(args, auth_key, step_timeout, report, connect_samples, auth_samples).await?;

    tx.send(Message::Heartbeat).await?;
    match tx.recv_timeout(step_timeout).await {
        Ok(Some(Message::Heartbeat)) => report.lock().await.counters.heartbeat_ok += 1,
        other => {
            report.lock().await.counters.heartbeat_err += 1;
            return Err(anyhow!("expected Heartbeat echo, got {:?}", other));
        }
    }

    tx.send(Message::Audio { payload: payload.to_vec() }).await?;
    let squelch = listener.recv_timeout(step_timeout).await?;
    let audio = listener.recv_timeout(step_timeout).await?;
    match (squelch, audio) {
        (Some(Message::Squelch { is_open: true, .. }), Some(Message::Audio { .. })) => {
            report.lock().await.counters.master_won += 1;
        }
        other => {
            report.lock().await.counters.master_rejected += 1;
            return Err(anyhow!("master-election sequence mismatch: {:?}", other));
        }
    }

    tx.send(Message::Flush).await?;
    let squelch_close = listener.recv_timeout(step_timeout).await?;
    let flushed = listener.recv_timeout(step_timeout).await?;
    match (squelch_close, flushed) {
        (Some(Message::Squelch { is_open: false, .. }), Some(Message::AllSamplesFlushed)) => {
            report.lock().await.counters.flush_ok += 1;
        }
        other => return Err(anyhow!("flush close sequence mismatch: {:?}", other)),
    }

    Ok(())
}

async fn connect_timed(
    args: &Args,
    auth_key: &AuthKey,
    step_timeout: Duration,
    report: &Arc<Mutex<SoakReport>>,
    connect_samples: &Arc<Mutex<Vec<u64>>>,
    auth_samples: &Arc<Mutex<Vec<u64>>>,
) -> Result<HubClient> {
    let t0 = Instant::now();
    let client = HubClient::connect(&args.hub_host, args.hub_port, auth_key, step_timeout).await;
    match client {
        Ok(c) => {
            let elapsed = t0.elapsed();
            let mut r = report.lock().await;
            r.counters.connect_ok += 1;
            r.counters.auth_ok += 1;
            drop(r);
            connect_samples.lock().await.push(dur_ms(elapsed));
            auth_samples.lock().await.push(dur_ms(elapsed));
            Ok(c)
        }
        Err(e) => {
            let mut r = report.lock().await;
            r.counters.connect_err += 1;
            r.counters.auth_err += 1;
            Err(e).context("connect+handshake failed")
        }
    }
}
