//! Work Selector: paged scan producing primary-key batches where the
//! target column is NULL.

use crate::error::{EngineError, Result};
use crate::retry::{jittered_linear_delay, MAX_ATTEMPTS};
use sqlx::{PgPool, Row};

/// One page of primary-key values with a NULL output column. Opaque
/// scalars are carried as their textual representation so the engine
/// never needs to know the primary key's concrete SQL type.
pub type IdPage = Vec<String>;

/// `SELECT <pk> FROM <table> WHERE <output_col> IS NULL LIMIT <limit>`.
///
/// Retries up to [`MAX_ATTEMPTS`] times with jittered linear backoff; each
/// attempt acquires a fresh pooled connection. Exhaustion always surfaces
/// as a fatal `SelectTransient` — there is no path where a stale page from
/// an earlier failed attempt is returned.
pub async fn select_null_ids(
    pool: &PgPool,
    table: &str,
    output_col: &str,
    primary_key: &str,
    limit: u32,
) -> Result<IdPage> {
    let sql = format!(
        r#"SELECT "{primary_key}"::STRING FROM "{table}" WHERE "{output_col}" IS NULL LIMIT $1"#
    );

    let mut last_error: Option<sqlx::Error> = None;
    for attempt in 1..=MAX_ATTEMPTS {
        match sqlx::query(&sql)
            .bind(limit as i64)
            .fetch_all(pool)
            .await
        {
            Ok(rows) => {
                let ids = rows
                    .iter()
                    .map(|row| row.try_get::<String, _>(0))
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                return Ok(ids);
            }
            Err(e) => {
                if attempt < MAX_ATTEMPTS {
                    log::warn!(
                        "retry {attempt}/{MAX_ATTEMPTS} on select_null_ids: {e}"
                    );
                    tokio::time::sleep(jittered_linear_delay(attempt)).await;
                    last_error = Some(e);
                } else {
                    return Err(EngineError::select_transient(MAX_ATTEMPTS, e.to_string()));
                }
            }
        }
    }

    // Unreachable in practice: the loop above always returns on success or
    // on the final attempt's failure. Kept as a defensive fallback so the
    // function is total.
    Err(EngineError::select_transient(
        MAX_ATTEMPTS,
        last_error.map(|e| e.to_string()).unwrap_or_default(),
    ))
}
