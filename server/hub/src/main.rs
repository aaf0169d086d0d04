use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::net::TcpListener;
use tracing::{info, warn, Level};
use tracing_subscriber::EnvFilter;

use rt_auth::AuthKey;
use rt_hub::config::Config;
use rt_hub::router::{self, RouterConfig};
use rt_hub::session;
use rt_metrics::hub::HubMetrics;
use rt_metrics::{LabelPolicy, MetricsConfig, MetricsServer};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .init();

    let cfg = Config::parse();
    cfg.validate().context("invalid configuration")?;

    let metrics_server = MetricsServer::install(MetricsConfig { listen: cfg.metrics_listen.clone(), namespace: "rt" })
        .context("installing metrics recorder")?;
    tokio::spawn(async move {
        if let Err(e) = metrics_server.serve().await {
            warn!(error = %e, "metrics server exited");
        }
    });

    let router_tx = router::spawn(
        RouterConfig {
            squelch_hold: Duration::from_millis(cfg.sql_timeout_ms),
            heartbeat_interval: Duration::from_millis(cfg.heartbeat_timeout_ms),
        },
        HubMetrics::new("rt", LabelPolicy::default()),
    );

    let auth_key = AuthKey::from(cfg.auth_key.as_str());
    let listener = TcpListener::bind(("0.0.0.0", cfg.listen_port)).await.context("binding listen port")?;
    info!(port = cfg.listen_port, "hub listening");

    let accept_loop = async {
        loop {
            let (stream, addr) = listener.accept().await?;
            let router_tx = router_tx.clone();
            let auth_key = auth_key.clone();
            let metrics = HubMetrics::new("rt", LabelPolicy::default());
            tokio::spawn(session::handle_connection(stream, addr, auth_key, router_tx, metrics));
        }
        #[allow(unreachable_code)]
        Ok::<(), anyhow::Error>(())
    };

    tokio::select! {
        r = accept_loop => r?,
        _ = tokio::signal::ctrl_c() => {
            info!("shutdown requested");
        }
    }

    Ok(())
}
