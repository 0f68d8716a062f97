//! # Structured Logging Module
//!
//! Environment-aware structured logging that writes to the console and, when possible,
//! to a JSON log file per run for auditing migrations after the fact.

use chrono::Utc;
use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::OnceLock;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::constants::ENVIRONMENT_VAR;

static LOGGER_INITIALIZED: OnceLock<Option<WorkerGuard>> = OnceLock::new();

/// Initialize structured logging with environment-specific configuration.
///
/// Log files go to `./log`. Safe to call more than once.
pub fn init_structured_logging() {
    init_structured_logging_in(Path::new("log"));
}

/// Same as [`init_structured_logging`] with an explicit log directory
pub fn init_structured_logging_in(log_dir: &Path) {
    LOGGER_INITIALIZED.get_or_init(|| {
        let environment = get_environment();
        let log_level = get_log_level(&environment);

        let console_layer = fmt::layer()
            .with_target(true)
            .with_thread_ids(true)
            .with_level(true)
            .with_ansi(true)
            .with_filter(env_filter(&log_level));

        let log_file = log_file_path(log_dir, &environment);
        let file_output = fs::create_dir_all(log_dir).ok().and_then(|_| {
            let file_name = log_file.file_name()?.to_owned();
            let appender = tracing_appender::rolling::never(log_dir, file_name);
            Some(tracing_appender::non_blocking(appender))
        });

        let (file_layer, guard) = match file_output {
            Some((writer, guard)) => (
                Some(
                    fmt::layer()
                        .with_writer(writer)
                        .with_target(true)
                        .with_thread_ids(true)
                        .with_level(true)
                        .with_ansi(false)
                        .json()
                        .with_filter(env_filter(&log_level)),
                ),
                Some(guard),
            ),
            None => (None, None),
        };

        // A subscriber may already be installed by an embedding application
        if tracing_subscriber::registry()
            .with(console_layer)
            .with(file_layer)
            .try_init()
            .is_err()
        {
            tracing::debug!("Global tracing subscriber already initialized - continuing with existing subscriber");
        }

        let log_file = match guard {
            Some(_) => log_file.display().to_string(),
            None => "console only".to_string(),
        };
        tracing::info!(
            pid = process::id(),
            environment = %environment,
            log_file = %log_file,
            "Structured logging initialized"
        );

        guard
    });
}

/// `RUST_LOG` wins over the environment default
fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

fn log_file_path(log_dir: &Path, environment: &str) -> PathBuf {
    let timestamp = Utc::now().format("%Y%m%d_%H%M%S");
    log_dir.join(format!("{environment}.{}.{timestamp}.log", process::id()))
}

/// Get current environment from environment variables
fn get_environment() -> String {
    std::env::var(ENVIRONMENT_VAR).unwrap_or_else(|_| "development".to_string())
}

/// Get log level based on environment
fn get_log_level(environment: &str) -> String {
    match environment {
        "production" => "info".to_string(),
        _ => "debug".to_string(),
    }
}

/// Log structured data for object-type operations (query, submit, patch)
pub fn log_object_operation(
    operation: &str,
    object_type: &str,
    status: &str,
    record_count: Option<usize>,
    details: Option<&str>,
) {
    tracing::info!(
        operation = %operation,
        object_type = %object_type,
        status = %status,
        record_count = record_count,
        details = details,
        timestamp = %Utc::now().to_rfc3339(),
        "OBJECT_OPERATION"
    );
}

/// Log structured data for a single record
pub fn log_record_operation(
    operation: &str,
    object_type: &str,
    source_id: &str,
    destination_id: Option<&str>,
    status: &str,
    details: Option<&str>,
) {
    tracing::debug!(
        operation = %operation,
        object_type = %object_type,
        source_id = %source_id,
        destination_id = destination_id,
        status = %status,
        details = details,
        timestamp = %Utc::now().to_rfc3339(),
        "RECORD_OPERATION"
    );
}

/// Log error with full context
pub fn log_error(component: &str, operation: &str, error: &str, context: Option<&str>) {
    tracing::error!(
        component = %component,
        operation = %operation,
        error = %error,
        context = context,
        timestamp = %Utc::now().to_rfc3339(),
        "ERROR"
    );
}
