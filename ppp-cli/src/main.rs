//! pppctl
//!
//! Runs a supervised PPP interface against a simulated peer until Ctrl-C,
//! logging every link transition.
//!
//! Usage: `pppctl [SETTINGS.json]` or `pppctl init` to write the default
//! settings file.

mod session;
mod settings;

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Context;
use ppp_iface::LinkSnapshot;
use settings::Settings;
use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "pppctl=info,ppp_link=info,ppp_iface=info,ppp_sim=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = match std::env::args().nth(1).as_deref() {
        Some("init") => {
            let path = Settings::default()
                .save()
                .context("failed to write default settings")?;
            println!("Wrote {}", path.display());
            return Ok(());
        }
        Some(path) => {
            let path = PathBuf::from(path);
            Settings::load_from(&path)
                .with_context(|| format!("failed to load {}", path.display()))?
        }
        None => Settings::load(),
    };

    info!("Starting pppctl (auth mode {})", settings.connect.authmode);

    let stop = Arc::new(AtomicBool::new(false));
    let (snapshot_tx, mut snapshot_rx) = watch::channel(LinkSnapshot::default());

    let session = {
        let stop = stop.clone();
        tokio::task::spawn_blocking(move || session::run(settings, stop, snapshot_tx))
    };

    let mut last = LinkSnapshot::default();
    loop {
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                result.context("failed to listen for Ctrl-C")?;
                info!("Shutting down");
                stop.store(true, Ordering::Release);
                break;
            }
            changed = snapshot_rx.changed() => {
                if changed.is_err() {
                    // Session ended on its own
                    break;
                }
                let snapshot = *snapshot_rx.borrow_and_update();
                if snapshot != last {
                    info!(
                        "state: active={} connecting={} connected={} status={}",
                        snapshot.active,
                        snapshot.connect_active,
                        snapshot.connected,
                        snapshot.status
                    );
                    last = snapshot;
                }
            }
        }
    }

    let summary = session.await.context("session task failed")??;
    info!(
        "Session finished: {} link(s) brought up, clean close: {}{}",
        summary.sessions,
        summary.clean_close,
        if summary.gave_up { ", gave up reconnecting" } else { "" }
    );
    Ok(())
}
