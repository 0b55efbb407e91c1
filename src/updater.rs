//! Updater: applies `(key, vector)` pairs to the target column as one
//! batched UPDATE, with its own retry/backoff distinct from the Work
//! Selector's.

use crate::provider::EmbeddingRow;
use crate::retry::{jittered_linear_delay, MAX_ATTEMPTS};
use crate::vector::to_literal;
use chrono::Local;
use sqlx::{PgPool, QueryBuilder};

/// Outcome of one Updater invocation.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct UpdateReport {
    pub applied_count: usize,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

/// Apply `pairs` to `table`'s `output_col` in one batched UPDATE.
///
/// Casts the incoming literal primary-key value to the PK's declared type
/// in the join predicate (`v.pk::pk_type`), not the other direction, since
/// the PK's SQL type can be anything while the incoming value always
/// arrives as text.
///
/// Retries up to [`MAX_ATTEMPTS`] times: ROLLBACK, sleep, retry. On success,
/// commits. On exhaustion, the failure is recorded as a terminal error in
/// the report and the function returns normally — the engine continues to
/// the next batch rather than treating this as process-fatal.
pub async fn apply(
    pool: &PgPool,
    table: &str,
    output_col: &str,
    primary_key: &str,
    primary_key_type: &str,
    pairs: &[EmbeddingRow],
    batch_index: u64,
    dry_run: bool,
) -> UpdateReport {
    let mut report = UpdateReport::default();

    if pairs.is_empty() || dry_run {
        if dry_run && !pairs.is_empty() {
            let ddl_preview = format!(
                r#"UPDATE "{table}" AS t SET "{output_col}" = v.embedding FROM (VALUES …) AS v("{primary_key}", embedding) WHERE t."{primary_key}" = v."{primary_key}"::"{primary_key_type}""#
            );
            log::info!("[DRY RUN] would execute: {ddl_preview}");
        }
        return report;
    }

    for attempt in 1..=MAX_ATTEMPTS {
        let mut tx = match pool.begin().await {
            Ok(tx) => tx,
            Err(e) => {
                record_failure(&mut report, batch_index, attempt, &e.to_string());
                if attempt < MAX_ATTEMPTS {
                    tokio::time::sleep(jittered_linear_delay(attempt)).await;
                    continue;
                } else {
                    break;
                }
            }
        };

        let mut builder: QueryBuilder<sqlx::Postgres> = QueryBuilder::new(format!(
            r#"UPDATE "{table}" AS t SET "{output_col}" = v.embedding::VECTOR FROM (VALUES "#
        ));
        builder.push_values(pairs.iter(), |mut b, (key, vector)| {
            b.push_bind(key.clone());
            b.push_bind(to_literal(vector));
        });
        builder.push(format!(
            r#") AS v("{primary_key}", embedding) WHERE t."{primary_key}" = v."{primary_key}"::"{primary_key_type}""#
        ));

        match builder.build().execute(&mut *tx).await {
            Ok(_) => match tx.commit().await {
                Ok(_) => {
                    report.applied_count = pairs.len();
                    return report;
                }
                Err(e) => {
                    let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");
                    if attempt < MAX_ATTEMPTS {
                        report.warnings.push(format!(
                            "[{timestamp}] [WARN] (batch {batch_index}) retry {attempt}/{MAX_ATTEMPTS} after commit failure: {e}"
                        ));
                        tokio::time::sleep(jittered_linear_delay(attempt)).await;
                    } else {
                        record_failure(&mut report, batch_index, attempt, &e.to_string());
                    }
                }
            },
            Err(e) => {
                let _ = tx.rollback().await;
                let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");
                if attempt < MAX_ATTEMPTS {
                    report.warnings.push(format!(
                        "[{timestamp}] [WARN] (batch {batch_index}) retry {attempt}/{MAX_ATTEMPTS} after failure: {e}"
                    ));
                    tokio::time::sleep(jittered_linear_delay(attempt)).await;
                } else {
                    record_failure(&mut report, batch_index, attempt, &e.to_string());
                }
            }
        }
    }

    report
}

fn record_failure(report: &mut UpdateReport, batch_index: u64, attempts: u32, message: &str) {
    let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");
    report.errors.push(format!(
        "[{timestamp}] [ERROR] (batch {batch_index}) failed after {attempts} attempts: {message}"
    ));
}
