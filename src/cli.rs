//! CLI façade: parses flags, builds an [`EngineConfig`], and dispatches to
//! the engine. Intentionally thin — no business logic lives here.

use crate::config::EngineConfig;
use crate::db;
use crate::provider::ProviderRegistry;
use crate::vector::to_literal;
use clap::{Args, Parser, Subcommand};
use sqlx::Row;

#[derive(Parser, Debug)]
#[command(name = "vectorize", about = "Bulk vector-embedding pipeline for CockroachDB tables")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the vectorization engine.
    Embed(EmbedArgs),
    /// Inspect registered embedding providers.
    Model {
        #[command(subcommand)]
        command: ModelCommand,
    },
    /// One-shot similarity search.
    Search(SearchArgs),
}

#[derive(Subcommand, Debug)]
pub enum ModelCommand {
    /// Print `id\tlabel` for each registered provider.
    List,
    /// Print a provider's label and description.
    Desc { model: String },
    /// Diagnostic smoke-test: print label/description/dimension and encode
    /// a couple of example strings.
    Test { model: String },
}

#[derive(Args, Debug)]
pub struct EmbedArgs {
    #[arg(short = 'u', long, env = "DATABASE_URL")]
    pub url: String,
    #[arg(short = 't', long)]
    pub table: String,
    #[arg(short = 'i', long)]
    pub input: String,
    #[arg(short = 'o', long)]
    pub output: String,
    #[arg(short = 'm', long)]
    pub model: String,
    #[arg(short = 'b', long, default_value_t = 1000)]
    pub batch_size: u32,
    #[arg(short = 'n', long = "num-batches", default_value_t = 1)]
    pub num_batches: u32,
    #[arg(short = 'F', long)]
    pub follow: bool,
    /// Minutes before the idle budget is exhausted; 0 = unbounded.
    #[arg(long = "max-idle", default_value_t = 60.0)]
    pub max_idle: f64,
    /// Seconds, the floor and starting point of the idle backoff.
    #[arg(long = "min-idle", default_value_t = 15.0)]
    pub min_idle: f64,
    #[arg(short = 'w', long, default_value_t = 1)]
    pub workers: usize,
    #[arg(short = 'p', long)]
    pub progress: bool,
    #[arg(short = 'v', long)]
    pub verbose: bool,
    #[arg(short = 'd', long = "dry-run")]
    pub dry_run: bool,
}

impl EmbedArgs {
    pub fn into_config(self) -> EngineConfig {
        EngineConfig {
            url: self.url,
            table: self.table,
            input_col: self.input,
            output_col: self.output,
            provider_id: self.model,
            batch_size: self.batch_size,
            num_batches: self.num_batches,
            follow: self.follow,
            max_idle_seconds: self.max_idle * 60.0,
            min_idle_seconds: self.min_idle,
            workers: self.workers,
            progress: self.progress,
            verbose: self.verbose,
            dry_run: self.dry_run,
        }
    }
}

#[derive(Args, Debug)]
pub struct SearchArgs {
    #[arg(short = 'u', long, env = "DATABASE_URL")]
    pub url: String,
    #[arg(short = 't', long)]
    pub table: String,
    #[arg(short = 'm', long)]
    pub model: String,
    #[arg(long)]
    pub text: String,
    #[arg(long)]
    pub source: String,
    #[arg(long)]
    pub embedding: String,
    #[arg(long, default_value_t = 10)]
    pub limit: i64,
}

pub fn run_model_list() {
    for info in ProviderRegistry::list() {
        println!("{}\t{}", info.id, info.label);
    }
}

pub fn run_model_desc(model: &str) {
    match ProviderRegistry::describe(model) {
        Some(info) => {
            println!("{}", info.label);
            println!("{}", info.description);
        }
        None => {
            println!("No model '{model}' found. Run `model list` to see available models.");
        }
    }
}

pub async fn run_model_test(model: &str) -> anyhow::Result<()> {
    let provider = ProviderRegistry::resolve(model)?;
    println!("label: {}", provider.label());
    println!("description: {}", provider.description());
    println!("dimension: {}", provider.dimension());
    for sample in ["hello world", "the quick brown fox"] {
        let vector = provider.encode_one(sample).await?;
        println!(
            "encode({sample:?}) -> [{:.4}, {:.4}, ... len={}]",
            vector.first().copied().unwrap_or(0.0),
            vector.get(1).copied().unwrap_or(0.0),
            vector.len()
        );
    }
    Ok(())
}

/// `search`: encode the query once, run the follower-read distance query,
/// and print `distance --> pk\nsource\n` per row.
pub async fn run_search(args: SearchArgs) -> anyhow::Result<()> {
    let provider = ProviderRegistry::resolve(&args.model)?;
    let query_vector = provider.encode_one(&args.text).await?;
    let literal = to_literal(&query_vector);

    let pool = db::build_pool(&args.url, 1, 1).await?;
    let (pk, _pk_type) = crate::schema::primary_key(&pool, &args.table).await?;
    let table = &args.table;
    let source = &args.source;
    let embedding = &args.embedding;
    let sql = format!(
        r#"
        SELECT "{pk}"::STRING, "{source}", "{embedding}" <=> $1 AS distance
        FROM "{table}" AS OF SYSTEM TIME follower_read_timestamp()
        WHERE "{embedding}" IS NOT NULL
        ORDER BY "{embedding}" <=> $1
        LIMIT $2
        "#
    );

    let rows = sqlx::query(&sql)
        .bind(&literal)
        .bind(args.limit)
        .fetch_all(&pool)
        .await?;

    for row in rows {
        let pk: String = row.try_get(0)?;
        let source: String = row.try_get(1)?;
        let distance: f64 = row.try_get(2)?;
        println!("{distance} --> {pk}");
        println!("{source}\n");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embed_args_minutes_converted_to_seconds() {
        let args = EmbedArgs {
            url: "postgresql://root@localhost/defaultdb".to_string(),
            table: "docs".to_string(),
            input: "body".to_string(),
            output: "emb".to_string(),
            model: "local".to_string(),
            batch_size: 1000,
            num_batches: 1,
            follow: false,
            max_idle: 60.0,
            min_idle: 15.0,
            workers: 1,
            progress: false,
            verbose: false,
            dry_run: false,
        };
        let config = args.into_config();
        assert_eq!(config.max_idle_seconds, 3600.0);
        assert_eq!(config.min_idle_seconds, 15.0);
    }

    #[test]
    fn test_cli_parses_embed_subcommand() {
        let cli = Cli::parse_from([
            "vectorize", "embed", "-u", "postgresql://root@localhost/db", "-t", "docs", "-i",
            "body", "-o", "emb", "-m", "local",
        ]);
        match cli.command {
            Command::Embed(args) => assert_eq!(args.table, "docs"),
            _ => panic!("expected Embed command"),
        }
    }

    #[test]
    fn test_cli_rejects_verbose_and_progress_together_at_clap_level_is_not_enforced() {
        // clap doesn't know about this mutual exclusion; EngineConfig::normalize does.
        let cli = Cli::parse_from([
            "vectorize", "embed", "-u", "postgresql://root@localhost/db", "-t", "docs", "-i",
            "body", "-o", "emb", "-m", "local", "-v", "-p",
        ]);
        match cli.command {
            Command::Embed(args) => {
                assert!(args.verbose && args.progress);
            }
            _ => panic!("expected Embed command"),
        }
    }
}
