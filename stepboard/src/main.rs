use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};

use stepboard::background::run_board_refresher;
use stepboard::config::Config;
use stepboard::viewer::sync_counts;
use stepboard::{
    render_board, ApiClient, Backend, CredentialStore, FixedProbe, HandoffSlot, Leaderboard,
    Session, StaticCode,
};

#[cfg(unix)]
use tokio::signal::unix::{signal, SignalKind};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stepboard=info".into()),
        )
        .init();

    let config = Config::from_env()?;
    let session = Arc::new(Session::new(
        config.session_path.clone().map(CredentialStore::new),
    ));
    let api = Arc::new(
        ApiClient::new(
            &config.api_base,
            config.request_timeout,
            Arc::clone(&session),
            Arc::new(StaticCode(config.login_code.clone())),
        )
        .context("failed to build API client")?,
    );

    let handoff = Arc::new(HandoffSlot::new());
    if let Some(pending) = config.handoff.clone() {
        handoff.post(pending);
    }

    let board = Arc::new(
        Leaderboard::new(
            Arc::clone(&api) as Arc<dyn Backend>,
            Arc::clone(&session),
            Arc::new(FixedProbe(Some(config.geometry))),
        )
        .with_handoff(handoff),
    );

    info!(api_base = %config.api_base, "stepboard starting");
    board.activate().await;
    if let Err(err) = sync_counts(api.as_ref(), &session).await {
        warn!(?err, "join count unavailable");
    }
    let identity = session.identity().await;
    info!(
        join_count = identity.join_count,
        prize_multiplier = identity.prize_multiplier,
        "session ready"
    );
    println!("{}", render_board(&board.snapshot().await));

    if config.once {
        return Ok(());
    }

    tokio::spawn(run_board_refresher(
        Arc::clone(&board),
        config.refresh_interval,
        |state| println!("{}", render_board(state)),
    ));

    shutdown_signal().await;
    info!("stepboard stopped");
    Ok(())
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        let ctrl_c = tokio::signal::ctrl_c();
        let terminate = match signal(SignalKind::terminate()) {
            Ok(signal) => Some(signal),
            Err(err) => {
                warn!(?err, "failed to install SIGTERM handler");
                None
            }
        };

        tokio::select! {
            _ = ctrl_c => {},
            _ = async {
                if let Some(mut signal) = terminate {
                    signal.recv().await;
                } else {
                    std::future::pending::<()>().await;
                }
            } => {},
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
