//! Observability infrastructure for tally.
//!
//! Structured logging with consistent spans. This module provides an
//! initialization helper and span constructors so every component logs with
//! the same field names.

use std::sync::Once;
use tracing::Span;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, fmt};

static INIT: Once = Once::new();

/// Log output format.
#[derive(Debug, Clone, Copy, Default)]
pub enum LogFormat {
    /// JSON structured logs (for production).
    Json,
    /// Pretty-printed logs (for development).
    #[default]
    Pretty,
}

/// Initializes the logging subsystem.
///
/// Call once at application startup. Safe to call multiple times;
/// subsequent calls are no-ops.
///
/// # Environment Variables
///
/// - `RUST_LOG`: Controls log levels (e.g., `info`, `tally_vote=debug`)
///
/// # Example
///
/// ```rust
/// use tally_core::observability::{init_logging, LogFormat};
///
/// init_logging(LogFormat::Pretty);
/// ```
pub fn init_logging(format: LogFormat) {
    INIT.call_once(|| {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        match format {
            LogFormat::Json => {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(fmt::layer().json())
                    .init();
            }
            LogFormat::Pretty => {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(fmt::layer().pretty())
                    .init();
            }
        }
    });
}

/// Creates a span for voting operations with standard fields.
///
/// # Example
///
/// ```rust
/// use tally_core::observability::voting_span;
///
/// let span = voting_span("evaluate", "202608080412_0003", "task_202608080412_0003_r_000007");
/// let _guard = span.enter();
/// // ... do voting operation
/// ```
#[must_use]
pub fn voting_span(operation: &str, job: &str, task: &str) -> Span {
    tracing::info_span!("voting", op = operation, job = job, task = task)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_logging_is_idempotent() {
        // Should not panic (uses Once internally)
        init_logging(LogFormat::Pretty);
        init_logging(LogFormat::Pretty);
    }

    #[test]
    fn span_helper_creates_span() {
        let span = voting_span("evaluate", "job-1", "task_job-1_r_000000");
        let _guard = span.enter();
        tracing::info!("test message in span");
    }
}
