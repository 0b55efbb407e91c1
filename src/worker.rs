//! Worker: owns a private DB connection pool and a shared provider handle;
//! executes the fetch-texts → encode stage for one shard.

use crate::error::{EngineError, Result};
use crate::provider::{EmbeddingProvider, EmbeddingRow, TextRow};
use crate::selector::IdPage;
use sqlx::{PgPool, Row};
use std::sync::Arc;

/// Partition of an [`IdPage`] assigned to a single worker.
pub type IdShard = Vec<String>;

/// Partition `page` into `workers` shards of size `ceil(len / workers)`,
/// per the Scheduler's `DISPATCH` state.
pub fn partition(page: &IdPage, workers: usize) -> Vec<IdShard> {
    if page.is_empty() || workers == 0 {
        return Vec::new();
    }
    let chunk_size = page.len().div_ceil(workers).max(1);
    page.chunks(chunk_size).map(|c| c.to_vec()).collect()
}

/// A long-lived worker: one private DB pool (min=1, max=2) and a cached
/// provider handle, reused across every shard it is given for the life of
/// the run.
pub struct Worker {
    pool: PgPool,
    provider: Arc<dyn EmbeddingProvider>,
}

impl Worker {
    pub fn new(pool: PgPool, provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self { pool, provider }
    }

    /// Fetch texts for `shard`'s keys, then encode them. Does not retry the
    /// SELECT internally — retry is bounded to the Work Selector and the
    /// Updater; a failure here propagates to the Scheduler, which records
    /// it and continues with the next batch.
    pub async fn process_shard(
        &self,
        table: &str,
        input_col: &str,
        primary_key: &str,
        batch_index: u64,
        shard: &IdShard,
        verbose: bool,
    ) -> Result<Vec<EmbeddingRow>> {
        if shard.is_empty() {
            return Ok(Vec::new());
        }

        let sql = format!(
            r#"SELECT "{primary_key}"::STRING, "{input_col}" FROM "{table}" WHERE "{primary_key}"::STRING = ANY($1::STRING[])"#
        );
        let rows = sqlx::query(&sql)
            .bind(shard)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| EngineError::worker(batch_index, e.to_string()))?;

        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let text_rows: Vec<TextRow> = rows
            .iter()
            .map(|row| {
                let key: String = row.try_get(0)?;
                let text: String = row.try_get(1)?;
                Ok((key, text))
            })
            .collect::<std::result::Result<Vec<_>, sqlx::Error>>()
            .map_err(|e| EngineError::worker(batch_index, e.to_string()))?;

        self.provider
            .encode_batch(batch_index, &text_rows, verbose)
            .await
            .map_err(|e| EngineError::worker(batch_index, e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partition_empty_page() {
        assert_eq!(partition(&vec![], 4), Vec::<IdShard>::new());
    }

    #[test]
    fn test_partition_even_split() {
        let page: IdPage = (1..=1000).map(|i| i.to_string()).collect();
        let shards = partition(&page, 4);
        assert_eq!(shards.len(), 4);
        for shard in &shards {
            assert_eq!(shard.len(), 250);
        }
    }

    #[test]
    fn test_partition_ceil_rounding() {
        let page: IdPage = (1..=10).map(|i| i.to_string()).collect();
        let shards = partition(&page, 3);
        // ceil(10/3) = 4, so shards are [4, 4, 2]
        assert_eq!(shards.iter().map(|s| s.len()).collect::<Vec<_>>(), vec![4, 4, 2]);
    }

    #[test]
    fn test_partition_more_workers_than_rows() {
        let page: IdPage = vec!["1".to_string(), "2".to_string()];
        let shards = partition(&page, 8);
        assert_eq!(shards.len(), 2);
        assert_eq!(shards[0].len(), 1);
        assert_eq!(shards[1].len(), 1);
    }
}
