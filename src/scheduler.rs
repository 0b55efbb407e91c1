//! Scheduler: the main loop, implemented as an explicit state machine.
//! `DISPATCH` is reachable only from a non-empty page and `IDLE` only
//! from an empty one, so the idle-backoff branch is always live.

use crate::config::EngineConfig;
use crate::db;
use crate::error::Result;
use crate::observer::Observer;
use crate::provider::{EmbeddingProvider, EmbeddingRow};
use crate::schema::{self, TableSchema};
use crate::selector::select_null_ids;
use crate::updater;
use crate::worker::{partition, Worker};
use std::sync::Arc;
use std::time::Duration;

/// Idle backoff state. Resets at the start of each "run" in follow mode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IdleState {
    pub idle_wait: f64,
    pub idle_spent: f64,
    pub idle_budget: f64,
    min_idle: f64,
}

impl IdleState {
    pub fn new(min_idle: f64, idle_budget: f64) -> Self {
        Self {
            idle_wait: min_idle,
            idle_spent: 0.0,
            idle_budget,
            min_idle,
        }
    }

    /// Work was found: reset the backoff to its floor.
    pub fn reset(&mut self) {
        self.idle_wait = self.min_idle;
        self.idle_spent = 0.0;
    }

    /// `true` once the idle budget (if bounded) has been exhausted.
    pub fn exhausted(&self) -> bool {
        self.idle_budget > 0.0 && self.idle_spent >= self.idle_budget
    }

    /// Sleep duration for this idle cycle, clamped to the remaining budget
    /// only when the budget is bounded (`idle_budget == 0` is unbounded).
    pub fn next_sleep(&self) -> f64 {
        if self.idle_budget > 0.0 {
            let remaining = (self.idle_budget - self.idle_spent).max(0.0);
            self.idle_wait.min(remaining)
        } else {
            self.idle_wait
        }
    }

    /// Record a completed idle sleep and double the backoff.
    pub fn advance(&mut self, slept: f64) {
        self.idle_spent += slept;
        self.idle_wait *= 2.0;
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum State {
    Select,
    Empty,
    Dispatch,
    Collect,
    Update,
    Decide,
    Idle,
    Exit,
}

/// Per-run tally of warnings/errors, reported by the Observer at exit.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub batches_processed: u64,
    pub rows_updated: u64,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

pub struct Scheduler {
    config: EngineConfig,
    main_pool: sqlx::PgPool,
    schema: TableSchema,
    workers: Vec<Worker>,
    observer: Observer,
}

impl Scheduler {
    /// `INIT`: validate config, resolve provider, construct the main pool
    /// and worker pool.
    pub async fn init(config: EngineConfig, provider: Arc<dyn EmbeddingProvider>) -> Result<Self> {
        let config = config.normalize()?;
        let main_pool = db::build_pool(&config.url, 0, config.workers as u32).await?;

        let mut workers = Vec::with_capacity(config.workers);
        for _ in 0..config.workers {
            let pool = db::build_pool(&config.url, 1, 2).await?;
            workers.push(Worker::new(pool, provider.clone()));
        }

        let schema = TableSchema {
            primary_key_name: String::new(),
            primary_key_sql_type: String::new(),
            output_column_exists: false,
            output_column_dim: Some(provider.dimension()),
        };

        let observer = Observer::new(config.progress, config.verbose);

        Ok(Self {
            config,
            main_pool,
            schema,
            workers,
            observer,
        })
    }

    /// `PREPARE`: introspect PK, ensure vector column, reset loop state.
    async fn prepare(&mut self, dim: usize) -> Result<()> {
        let (name, sql_type) = schema::primary_key(&self.main_pool, &self.config.table).await?;
        schema::ensure_vector_column(
            &self.main_pool,
            &self.config.table,
            &self.config.output_col,
            dim,
            self.config.dry_run,
        )
        .await?;
        self.schema.primary_key_name = name;
        self.schema.primary_key_sql_type = sql_type;
        self.schema.output_column_exists = true;
        Ok(())
    }

    /// Run the engine to completion, returning an accumulated summary.
    pub async fn run(mut self) -> Result<RunSummary> {
        let dim = self.schema.output_column_dim.unwrap_or(0);
        self.prepare(dim).await?;

        let mut idle = IdleState::new(self.config.min_idle_seconds, self.config.idle_budget_seconds());
        let mut run_counter: u64 = 1;
        let mut batch_in_run: u64 = 1;
        let mut summary = RunSummary::default();

        let mut page = Vec::new();
        let mut collected: Vec<EmbeddingRow> = Vec::new();

        let mut state = State::Select;
        let started_at = std::time::Instant::now();

        if self.config.progress {
            let total = if self.config.follow {
                schema::null_row_count(
                    &self.main_pool,
                    &self.config.table,
                    &self.config.output_col,
                    &self.schema.primary_key_name,
                )
                .await? as u64
            } else {
                self.config.batch_size as u64 * self.config.num_batches as u64
            };
            self.observer.start_run(total);
        }

        loop {
            match state {
                State::Select => {
                    page = select_null_ids(
                        &self.main_pool,
                        &self.config.table,
                        &self.config.output_col,
                        &self.schema.primary_key_name,
                        self.config.batch_size,
                    )
                    .await?;
                    state = if page.is_empty() {
                        State::Empty
                    } else {
                        State::Dispatch
                    };
                }
                State::Empty => {
                    state = State::Idle;
                }
                State::Dispatch => {
                    idle.reset();
                    self.observer
                        .log_batch_start(run_counter, batch_in_run, page.len());

                    let shards = partition(&page, self.workers.len());
                    let mut futures = Vec::with_capacity(shards.len());
                    for (shard, worker) in shards.iter().zip(self.workers.iter()) {
                        futures.push(worker.process_shard(
                            &self.config.table,
                            &self.config.input_col,
                            &self.schema.primary_key_name,
                            batch_in_run,
                            shard,
                            self.config.verbose,
                        ));
                    }
                    collected.clear();
                    let results = futures::future::join_all(futures).await;
                    for result in results {
                        match result {
                            Ok(mut rows) => {
                                self.observer.advance(rows.len() as u64);
                                collected.append(&mut rows);
                            }
                            Err(e) => {
                                summary.errors.push(e.to_string());
                            }
                        }
                    }
                    state = State::Collect;
                }
                State::Collect => {
                    state = State::Update;
                }
                State::Update => {
                    let report = updater::apply(
                        &self.main_pool,
                        &self.config.table,
                        &self.config.output_col,
                        &self.schema.primary_key_name,
                        &self.schema.primary_key_sql_type,
                        &collected,
                        batch_in_run,
                        self.config.dry_run,
                    )
                    .await;
                    summary.rows_updated += report.applied_count as u64;
                    summary.warnings.extend(report.warnings);
                    summary.errors.extend(report.errors);
                    summary.batches_processed += 1;
                    state = State::Decide;
                }
                State::Decide => {
                    batch_in_run += 1;
                    if !self.config.follow && batch_in_run > self.config.num_batches as u64 {
                        state = State::Exit;
                    } else if self.config.follow
                        && batch_in_run > self.config.num_batches as u64
                    {
                        self.observer
                            .log_run_complete(run_counter, self.config.num_batches);
                        self.observer.finish_run();
                        run_counter += 1;
                        batch_in_run = 1;
                        state = State::Select;
                        if self.config.progress {
                            let total = schema::null_row_count(
                                &self.main_pool,
                                &self.config.table,
                                &self.config.output_col,
                                &self.schema.primary_key_name,
                            )
                            .await? as u64;
                            self.observer.start_run(total);
                        }
                    } else {
                        state = State::Select;
                    }
                }
                State::Idle => {
                    if idle.exhausted() {
                        self.observer
                            .log_max_idle_reached(self.config.max_idle_seconds / 60.0);
                        state = State::Exit;
                    } else {
                        let to_sleep = idle.next_sleep();
                        tokio::time::sleep(Duration::from_secs_f64(to_sleep)).await;
                        idle.advance(to_sleep);
                        state = State::Select;
                    }
                }
                State::Exit => break,
            }
        }

        self.observer.log_done(started_at.elapsed().as_secs_f64());
        self.observer.report(&summary.warnings, &summary.errors)?;

        Ok(summary)
    }

    pub fn observer(&self) -> &Observer {
        &self.observer
    }
}
