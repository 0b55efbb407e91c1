//! Error types for the vectorization engine.

use thiserror::Error;

/// Result type alias for the engine.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Comprehensive error type for the vectorization engine.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Invalid flags, unknown provider, mutually-exclusive options.
    #[error("configuration error: {message}")]
    Configuration { message: String },

    /// No primary key, or output column exists with a non-vector type.
    #[error("schema error: {message}")]
    Schema { message: String },

    /// Work Selector query failed after exhausting its retry budget.
    #[error("select failed after {attempts} attempts: {message}")]
    SelectTransient { attempts: u32, message: String },

    /// Updater statement or commit failed after exhausting its retry budget.
    #[error("update failed after {attempts} attempts: {message}")]
    UpdateTransient { attempts: u32, message: String },

    /// A worker's shard failed (fetch error or provider error).
    #[error("worker failure on batch {batch_index}: {message}")]
    Worker { batch_index: u64, message: String },

    /// Propagated from the Embedding Provider capability.
    #[error("provider error: {0}")]
    Provider(#[from] crate::provider::ProviderError),

    /// Database driver errors that don't fit a more specific variant.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Generic I/O errors (log file writes, etc).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl EngineError {
    /// Create a configuration error.
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a schema error.
    pub fn schema<S: Into<String>>(message: S) -> Self {
        Self::Schema {
            message: message.into(),
        }
    }

    /// Create a select-transient error after retry exhaustion.
    pub fn select_transient<S: Into<String>>(attempts: u32, message: S) -> Self {
        Self::SelectTransient {
            attempts,
            message: message.into(),
        }
    }

    /// Create an update-transient error after retry exhaustion.
    pub fn update_transient<S: Into<String>>(attempts: u32, message: S) -> Self {
        Self::UpdateTransient {
            attempts,
            message: message.into(),
        }
    }

    /// Create a worker-failure error.
    pub fn worker<S: Into<String>>(batch_index: u64, message: S) -> Self {
        Self::Worker {
            batch_index,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_error_message() {
        let err = EngineError::configuration("-v and -p are mutually exclusive");
        assert!(matches!(err, EngineError::Configuration { .. }));
        assert_eq!(
            err.to_string(),
            "configuration error: -v and -p are mutually exclusive"
        );
    }

    #[test]
    fn test_select_transient_carries_attempts() {
        let err = EngineError::select_transient(10, "connection refused");
        assert!(matches!(err, EngineError::SelectTransient { attempts: 10, .. }));
    }

    #[test]
    fn test_worker_error_carries_batch_index() {
        let err = EngineError::worker(7, "fetch returned no rows for shard");
        match err {
            EngineError::Worker { batch_index, .. } => assert_eq!(batch_index, 7),
            _ => panic!("wrong variant"),
        }
    }
}
