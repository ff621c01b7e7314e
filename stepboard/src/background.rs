use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::constants::MAX_REFRESH_BACKOFF_MS;
use crate::engine::{Leaderboard, LoadOutcome};
use crate::state::BoardState;

/// Periodically reloads the visible segment and hands every new snapshot
/// to `on_update`. Failed reloads back off exponentially.
pub async fn run_board_refresher<F>(board: Arc<Leaderboard>, interval: Duration, on_update: F)
where
    F: Fn(&BoardState) + Send + Sync + 'static,
{
    let base_interval = interval;
    let mut backoff = base_interval;
    let max_backoff = Duration::from_millis(MAX_REFRESH_BACKOFF_MS).max(base_interval);

    loop {
        tokio::time::sleep(backoff).await;
        match board.refresh().await {
            LoadOutcome::Failed => {
                backoff = std::cmp::min(backoff * 2, max_backoff);
                warn!(retry_in_ms = backoff.as_millis() as u64, "board refresh failed; backing off");
            }
            outcome => {
                debug!(?outcome, "board refreshed");
                backoff = base_interval;
            }
        }
        on_update(&board.snapshot().await);
    }
}
