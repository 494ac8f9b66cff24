//! Long-running background task that polls the Soroban RPC and writes
//! decoded campaign ledger events to the database.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use sqlx::SqlitePool;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::db;
use crate::errors::Result;
use crate::events::{EventKind, LedgerEvent};
use crate::rpc;

pub struct IndexerState {
    pub pool: SqlitePool,
    pub config: Config,
    pub client: Client,
}

/// Where the next `getEvents` call should resume.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Position {
    ledger: u32,
    cursor: Option<String>,
}

/// Poll until `shutdown` is cancelled. Meant to be spawned as a background [`tokio`] task.
pub async fn run(state: Arc<IndexerState>, shutdown: CancellationToken) {
    info!(contract = %state.config.contract_id, "Indexer starting");

    let mut position = match resume_position(&state.pool, state.config.start_ledger).await {
        Ok(position) => position,
        Err(e) => {
            error!("Could not read indexer cursor, starting from config: {e}");
            Position {
                ledger: state.config.start_ledger,
                cursor: None,
            }
        }
    };
    info!(ledger = position.ledger, cursor = ?position.cursor, "Resuming");

    loop {
        match poll_once(&state.pool, &state.client, &state.config, &position).await {
            Ok(next) => position = next,
            Err(e) => error!("Indexer poll error: {e}"),
        }

        tokio::select! {
            _ = shutdown.cancelled() => {
                info!(ledger = position.ledger, "Indexer stopping");
                return;
            }
            _ = tokio::time::sleep(Duration::from_secs(state.config.poll_interval_secs)) => {}
        }
    }
}

/// The persisted cursor wins over the configured start ledger.
async fn resume_position(pool: &SqlitePool, start_ledger: u32) -> Result<Position> {
    let last_ledger = db::get_last_ledger(pool).await?;
    let cursor = db::get_cursor_string(pool).await?;
    let ledger = if last_ledger > 0 {
        last_ledger as u32
    } else {
        start_ledger
    };
    Ok(Position { ledger, cursor })
}

/// Fetch one page, store what decodes, and persist the next position.
async fn poll_once(
    pool: &SqlitePool,
    client: &Client,
    config: &Config,
    position: &Position,
) -> Result<Position> {
    let (raw_events, next_cursor, latest_ledger) = rpc::fetch_events(
        client,
        &config.rpc_url,
        &config.contract_id,
        position.ledger,
        position.cursor.as_deref(),
        config.events_per_page,
    )
    .await?;

    if !raw_events.is_empty() {
        let decoded = rpc::decode_events(&raw_events, &config.contract_id);
        let known = drop_unknown(decoded);
        let inserted = db::insert_events(pool, &known).await?;
        info!(
            raw = raw_events.len(),
            decoded = known.len(),
            inserted,
            "Stored campaign events"
        );
    }

    let next = advance(position, next_cursor, latest_ledger);
    db::save_cursor(pool, next.ledger as i64, next.cursor.as_deref()).await?;
    Ok(next)
}

fn drop_unknown(events: Vec<LedgerEvent>) -> Vec<LedgerEvent> {
    events
        .into_iter()
        .filter(|ev| {
            let known = EventKind::from_stored(&ev.event_type) != EventKind::Unknown;
            if !known {
                warn!(ledger = ev.ledger, tx = ?ev.tx_hash, "Skipping unrecognised event");
            }
            known
        })
        .collect()
}

/// A pagination cursor keeps the start ledger so the next call continues
/// within the same range; the ledger only moves forward to the latest known one.
fn advance(position: &Position, next_cursor: Option<String>, latest_ledger: Option<u64>) -> Position {
    let ledger = latest_ledger
        .map(|l| (l as u32).max(position.ledger))
        .unwrap_or(position.ledger);
    debug!(from = position.ledger, to = ledger, "Advancing cursor");
    Position {
        ledger,
        cursor: next_cursor,
    }
}
