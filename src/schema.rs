//! Schema Introspector: discovers the table's primary key and ensures the
//! destination vector column exists with the provider's declared dimension.

use crate::error::{EngineError, Result};
use sqlx::{PgPool, Row};

/// Primary key column name and its declared SQL type name.
#[derive(Debug, Clone, PartialEq)]
pub struct TableSchema {
    pub primary_key_name: String,
    pub primary_key_sql_type: String,
    pub output_column_exists: bool,
    pub output_column_dim: Option<usize>,
}

/// Discover the primary index of `table::regclass`.
///
/// Fails with `SchemaError` if the table has no primary key.
pub async fn primary_key(pool: &PgPool, table: &str) -> Result<(String, String)> {
    let row = sqlx::query(
        r#"
        SELECT
            a.attname AS column_name,
            t.typname AS column_type
        FROM pg_index i
        JOIN pg_attribute a
          ON a.attrelid = i.indrelid
         AND a.attnum = ANY(i.indkey)
        JOIN pg_type t
          ON a.atttypid = t.oid
        WHERE i.indrelid = $1::regclass
          AND i.indisprimary
        "#,
    )
    .bind(table)
    .fetch_optional(pool)
    .await?;

    match row {
        Some(row) => {
            let name: String = row.try_get("column_name")?;
            let sql_type: String = row.try_get("column_type")?;
            Ok((name, sql_type))
        }
        None => Err(EngineError::schema(format!(
            "no primary key found for table '{table}'"
        ))),
    }
}

/// Verify or create the destination vector column.
///
/// If the column exists, its type name must contain "vector"; otherwise
/// this fails with `SchemaError`. If absent, emits
/// `ALTER TABLE <table> ADD COLUMN <column> VECTOR(<dim>)` unless
/// `dry_run`, in which case the DDL is logged and not executed.
pub async fn ensure_vector_column(
    pool: &PgPool,
    table: &str,
    column: &str,
    dim: usize,
    dry_run: bool,
) -> Result<()> {
    let row = sqlx::query(
        r#"
        SELECT a.attname, t.typname
        FROM pg_attribute a
        JOIN pg_type t ON a.atttypid = t.oid
        WHERE a.attrelid = $1::regclass
          AND a.attname = $2
          AND a.attnum > 0
          AND NOT a.attisdropped
        "#,
    )
    .bind(table)
    .bind(column)
    .fetch_optional(pool)
    .await?;

    if let Some(row) = row {
        let type_name: String = row.try_get(1)?;
        if !type_name.to_lowercase().contains("vector") {
            return Err(EngineError::schema(format!(
                "column {column} exists but is not of VECTOR type (found {type_name})"
            )));
        }
        log::info!("column {column} already exists");
        return Ok(());
    }

    let ddl = format!(r#"ALTER TABLE "{table}" ADD COLUMN "{column}" VECTOR({dim})"#);
    if dry_run {
        log::info!("[DRY RUN] would execute: {ddl}");
        return Ok(());
    }

    sqlx::query(&ddl).execute(pool).await?;
    Ok(())
}

/// Count rows whose output column is NULL, used for the progress bar's
/// total in follow mode.
pub async fn null_row_count(
    pool: &PgPool,
    table: &str,
    output_col: &str,
    primary_key: &str,
) -> Result<i64> {
    let sql = format!(r#"SELECT COUNT("{primary_key}") FROM "{table}" WHERE "{output_col}" IS NULL"#);
    let row = sqlx::query(&sql).fetch_one(pool).await?;
    let count: i64 = row.try_get(0)?;
    Ok(count)
}
