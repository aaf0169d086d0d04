//! `rt-node`: one remote transceiver site end to end — an SDR tuner feeds
//! a single DDR channel, whose audio runs through the local Rx pipe and a
//! signal level detector, and is pushed to the hub over a reconnecting
//! NetTrx session as this site's "Remote Tx" contribution (spec §4.4
//! component G); whatever the hub relays back from other sites' masters
//! is decoded as this site's "Remote Rx" half (component F) and handed to
//! a decode-event sink, since keying a local transmitter or audio device
//! from it is explicitly out of scope (spec §1).

mod config;

use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn, Level};
use tracing_subscriber::EnvFilter;

use rt_audio::DecodeEventSink;
use rt_auth::AuthKey;
use rt_ddr::{BandwidthClass, Ddr};
use rt_dsp::{TunerRate, INTERNAL_AUDIO_RATE};
use rt_metrics::node::NodeMetrics;
use rt_metrics::{MetricsConfig, MetricsServer};
use rt_sdr::{tuner, RtlTcpSource};
use rt_siglev::{DdrSiglevDetector, SigLevDet};
use rt_trx_proxy::client_fsm::{self, ClientConfig, ClientEvent};
use rt_wire::{CodecSelect, Message, TxCtrlMode};

use config::Config;

const SQUELCH_OPEN_SIGLEV: f32 = 15.0;
const SQUELCH_CLOSE_SIGLEV: f32 = 10.0;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .init();

    let cfg = Config::parse();
    run(cfg).await
}

async fn run(cfg: Config) -> Result<()> {
    let metrics = NodeMetrics::new("rt");
    let metrics_server = MetricsServer::install(MetricsConfig { listen: cfg.metrics_listen.clone(), namespace: "rt" })
        .context("installing metrics recorder")?;
    tokio::spawn(async move {
        if let Err(e) = metrics_server.serve().await {
            warn!(error = %e, "metrics server exited");
        }
    });

    let tuner_rate = TunerRate::from_hz(cfg.sdr_sample_rate)
        .with_context(|| format!("unsupported SDR_SAMPLE_RATE {}", cfg.sdr_sample_rate))?;

    let source = RtlTcpSource::connect(&cfg.sdr_host, cfg.sdr_port, cfg.sdr_sample_rate)
        .await
        .context("connecting to rtl_tcp SDR source")?;
    let reconnect = reconnector(cfg.sdr_host.clone(), cfg.sdr_port, cfg.sdr_sample_rate);
    let tuner_handle = tuner::spawn(Box::new(source), reconnect, metrics);

    let mut ddr = Ddr::spawn(tuner_handle, cfg.rx_fq_hz, cfg.rx_modulation, metrics)
        .await
        .context("spawning DDR channel")?;
    info!(freq_hz = cfg.rx_fq_hz, modulation = ?cfg.rx_modulation, "DDR channel running");

    let channel_rate = BandwidthClass::for_mode(cfg.rx_modulation).output_rate_hz(tuner_rate);
    let mut siglev = SigLevDet::Ddr(DdrSiglevDetector::new(channel_rate));
    let mut pre_demod_rx = ddr.take_pre_demod().expect("pre-demod tap not yet taken");

    let codec_select = CodecSelect { name: cfg.codec.clone(), options: cfg.codec_options() };
    let mut tx_codec = rt_audio::AudioCodec::from_select(&codec_select).context("selecting Tx audio codec")?;
    let mut local_pipe = rt_audio::LocalRxPipe::new(INTERNAL_AUDIO_RATE);

    let client_cfg = ClientConfig {
        host: cfg.hub_host.clone(),
        port: cfg.hub_port,
        auth_key: AuthKey::from(cfg.auth_key.as_str()),
        log_disconnects_once: cfg.log_disconnects_once,
    };
    let (out_tx, mut evt_rx) = client_fsm::spawn(client_cfg, metrics);

    let mut remote_rx = rt_trx_proxy::remote_rx::RemoteRx::new(
        codec_select.clone(),
        cfg.rx_fq_hz,
        config::demod_mode_to_wire(cfg.rx_modulation),
    );
    let mut remote_tx = rt_trx_proxy::remote_tx::RemoteTx::new(codec_select);
    let mut decode_sink = rt_audio::localrx::RecordingSink::default();
    let mut squelch_is_open = false;

    loop {
        tokio::select! {
            evt = evt_rx.recv() => {
                let Some(evt) = evt else { break };
                match evt {
                    ClientEvent::Ready => {
                        for m in remote_rx.on_ready() {
                            let _ = out_tx.send(m).await;
                        }
                        for m in remote_tx.on_ready() {
                            let _ = out_tx.send(m).await;
                        }
                        let _ = out_tx.send(Message::SetTxCtrlMode(TxCtrlMode::Auto)).await;
                        remote_tx.set_ctrl_mode(TxCtrlMode::Auto);
                    }
                    ClientEvent::Disconnected => {
                        remote_tx.on_disconnected();
                    }
                    ClientEvent::Message(msg) => {
                        handle_inbound(msg, &mut remote_rx, &mut remote_tx, &mut decode_sink, &out_tx).await;
                    }
                }
            }
            pre_demod_block = pre_demod_rx.recv() => {
                if let Some(block) = pre_demod_block {
                    siglev.process_iq(&block);
                    metrics.siglev(siglev.last_siglev() as f64);
                }
            }
            audio_block = ddr.audio().recv() => {
                let Some(mut block) = audio_block else { break };

                let detector_open = if squelch_is_open {
                    siglev.last_siglev() > SQUELCH_CLOSE_SIGLEV
                } else {
                    siglev.last_siglev() > SQUELCH_OPEN_SIGLEV
                };
                local_pipe.process(&mut block, detector_open, siglev.last_siglev(), &[], &mut decode_sink);

                let now_open = local_pipe.is_open();
                if now_open != squelch_is_open {
                    squelch_is_open = now_open;
                    metrics.squelch_open(squelch_is_open);
                    let _ = out_tx
                        .send(Message::Squelch { is_open: squelch_is_open, siglev: siglev.last_siglev(), rx_id: 1 })
                        .await;
                    if !squelch_is_open {
                        if let Some(flush) = remote_tx.on_stream_idle() {
                            let _ = out_tx.send(flush).await;
                        }
                    }
                }

                if squelch_is_open {
                    let pcm = to_i16_pcm(&block);
                    let mut payload = Vec::new();
                    tx_codec.encode(&pcm, &mut payload);
                    for m in remote_tx.on_audio_encoded(payload) {
                        let _ = out_tx.send(m).await;
                    }
                }
            }
        }
    }

    ddr.disable().await;
    Ok(())
}

async fn handle_inbound(
    msg: Message,
    remote_rx: &mut rt_trx_proxy::remote_rx::RemoteRx,
    remote_tx: &mut rt_trx_proxy::remote_tx::RemoteTx,
    decode_sink: &mut rt_audio::localrx::RecordingSink,
    out_tx: &tokio::sync::mpsc::Sender<Message>,
) {
    match &msg {
        Message::SetTxCtrlMode(mode) => {
            if let Some(m) = remote_tx.set_ctrl_mode(*mode) {
                let _ = out_tx.send(m).await;
            }
            return;
        }
        Message::AllSamplesFlushed => {
            remote_tx.on_all_samples_flushed();
            return;
        }
        _ => {}
    }

    let mut events = Vec::new();
    remote_rx.on_message(&msg, &mut events);
    for event in events {
        match event {
            rt_trx_proxy::remote_rx::RxEvent::Dtmf { digit, .. } => {
                decode_sink.on_decode_event(rt_audio::DecodeEvent::Dtmf { digit, active: true });
            }
            rt_trx_proxy::remote_rx::RxEvent::Tone { freq_hz } => {
                decode_sink.on_decode_event(rt_audio::DecodeEvent::Tone { freq_hz });
            }
            rt_trx_proxy::remote_rx::RxEvent::Sel5 { digits } => {
                decode_sink.on_decode_event(rt_audio::DecodeEvent::Sel5 { digits });
            }
            // AudioFrame decoding into a local transmitter's audio device is
            // out of scope (spec §1: "specific audio device back-ends").
            _ => {}
        }
    }
}

fn reconnector(host: String, port: u16, sample_rate: u32) -> tuner::Reconnector {
    Box::new(move || {
        let host = host.clone();
        Box::pin(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            let source = RtlTcpSource::connect(&host, port, sample_rate).await?;
            Ok(Box::new(source) as tuner::BoxedSource)
        })
    })
}

fn to_i16_pcm(samples: &[f32]) -> Vec<i16> {
    samples.iter().map(|&s| (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16).collect()
}
