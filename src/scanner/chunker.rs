//! Adaptive chunked walk over a block range.
//!
//! Historical scans cover ranges far too large for a single log query. The
//! walk starts with large chunks and halves the chunk size when the API
//! repeatedly fails, down to a floor. A failed chunk is always re-attempted
//! from its own start block, so completed ranges are never revisited and a
//! successful walk tiles `[start, head]` exactly.

use std::future::Future;
use std::time::Duration;
use tracing::{debug, error, warn};

use crate::config::consts::{
    CHUNK_RETRY_BACKOFF_SECS, CHUNK_RETRY_LIMIT, INITIAL_CHUNK_BLOCKS, MIN_CHUNK_BLOCKS,
};
use crate::scanner::types::RawLogEvent;

#[derive(Debug, Clone)]
pub struct ChunkerConfig {
    pub initial_chunk: u64,
    pub min_chunk: u64,
    /// Attempts per chunk before the chunk size is reduced.
    pub retry_limit: u32,
    /// Base backoff between chunk retries, multiplied by the retry index.
    pub retry_backoff: Duration,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            initial_chunk: INITIAL_CHUNK_BLOCKS,
            min_chunk: MIN_CHUNK_BLOCKS,
            retry_limit: CHUNK_RETRY_LIMIT,
            retry_backoff: Duration::from_secs(CHUNK_RETRY_BACKOFF_SECS),
        }
    }
}

/// Outcome of a chunked walk. `complete` distinguishes a full tiling of the
/// requested range from a walk that stopped early at the chunk-size floor;
/// callers decide whether partial results are usable.
#[derive(Debug)]
pub struct ChunkedScan {
    pub logs: Vec<RawLogEvent>,
    pub complete: bool,
}

/// Walk `[start, head]` in consecutive chunks, collecting logs via `fetch`.
pub async fn scan_range<F, Fut>(
    config: &ChunkerConfig,
    start: u64,
    head: u64,
    fetch: F,
) -> ChunkedScan
where
    F: Fn(u64, u64) -> Fut,
    Fut: Future<Output = anyhow::Result<Vec<RawLogEvent>>>,
{
    let mut chunk_size = config.initial_chunk.max(1);
    let mut logs = Vec::new();
    let mut current = start;

    while current <= head {
        let end = current.saturating_add(chunk_size - 1).min(head);

        let mut retries = 0u32;
        let mut succeeded = false;
        loop {
            debug!(from = current, to = end, chunk_size, "Querying block chunk");
            match fetch(current, end).await {
                Ok(batch) => {
                    debug!(
                        from = current,
                        to = end,
                        count = batch.len(),
                        "Retrieved chunk logs"
                    );
                    logs.extend(batch);
                    succeeded = true;
                    break;
                }
                Err(e) => {
                    retries += 1;
                    warn!(
                        from = current,
                        to = end,
                        retry = retries,
                        error = %e,
                        "Chunk query failed"
                    );
                    if retries >= config.retry_limit {
                        break;
                    }
                    tokio::time::sleep(config.retry_backoff * retries).await;
                }
            }
        }

        if succeeded {
            current = end + 1;
            continue;
        }

        if chunk_size > config.min_chunk {
            chunk_size = (chunk_size / 2).max(config.min_chunk);
            warn!(chunk_size, from = current, "Reducing chunk size and retrying");
            continue;
        }

        error!(
            from = current,
            to = end,
            "Chunk failed at minimum size, stopping walk"
        );
        return ChunkedScan {
            logs,
            complete: false,
        };
    }

    ChunkedScan {
        logs,
        complete: true,
    }
}
