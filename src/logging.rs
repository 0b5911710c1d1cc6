//! # Structured Logging Module
//!
//! Environment-aware structured logging for debugging component lifecycles
//! and asynchronous bus traffic.

use std::sync::OnceLock;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Initialize structured logging with environment-specific configuration
pub fn init_structured_logging() {
    LOGGER_INITIALIZED.get_or_init(|| {
        let environment = get_environment();
        let log_level = get_log_level(&environment);

        let subscriber = tracing_subscriber::registry().with(
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_level(true)
                .with_filter(EnvFilter::new(log_level)),
        );

        // Use try_init to avoid panic if a global subscriber already exists
        // (e.g. the host application installed its own)
        if subscriber.try_init().is_err() {
            tracing::debug!(
                "Global tracing subscriber already initialized - continuing with existing subscriber"
            );
        }

        tracing::info!(
            environment = %environment,
            "Structured logging initialized"
        );
    });
}

/// Get current environment from environment variables
fn get_environment() -> String {
    std::env::var("CONDUCTOR_ENV")
        .or_else(|_| std::env::var("APP_ENV"))
        .unwrap_or_else(|_| "development".to_string())
}

/// Get log level based on environment
fn get_log_level(environment: &str) -> String {
    match environment {
        "test" => "debug".to_string(),
        "development" => "debug".to_string(),
        "production" => "info".to_string(),
        _ => "debug".to_string(),
    }
}

/// Log structured data for component lifecycle operations
pub fn log_lifecycle_operation(
    operation: &str,
    component_id: &str,
    status: &str,
    duration_ms: Option<u64>,
    details: Option<&str>,
) {
    tracing::info!(
        operation = %operation,
        component_id = %component_id,
        status = %status,
        duration_ms = duration_ms,
        details = details,
        "LIFECYCLE_OPERATION"
    );
}

/// Log structured data for bus operations
pub fn log_bus_operation(
    operation: &str,
    source: &str,
    target: &str,
    message_type: &str,
    status: &str,
) {
    tracing::debug!(
        operation = %operation,
        source = %source,
        target = %target,
        message_type = %message_type,
        status = %status,
        "BUS_OPERATION"
    );
}
