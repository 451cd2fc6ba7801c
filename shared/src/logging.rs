//! Shared logging utilities for consistent tracing across all processes

use chrono::{DateTime, Utc};
use tracing::{error, info};

use crate::types::ProcessRole;

/// Build the filter directive for the current process.
///
/// The process crate and `shared` follow `base_level`; HTTP plumbing stays
/// at `warn` unless request tracing is explicitly wanted.
pub fn filter_directive(role: &ProcessRole, base_level: &str) -> String {
    format!(
        "{target}={base_level},shared={base_level},tower_http=warn,hyper=warn,reqwest=warn",
        target = role.log_target()
    )
}

/// Initialize the stdout tracing subscriber for the current process role.
///
/// `RUST_LOG`, when set, replaces the computed directive.
pub fn init_tracing(log_level: Option<&str>) {
    use tracing_subscriber::{fmt, EnvFilter};

    let role = ProcessRole::current();
    let directive = filter_directive(role, log_level.unwrap_or("info"));
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&directive));

    // try_init: tests and embedders may already have installed a subscriber
    let _ = fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .try_init();
}

/// Get formatted timestamp for consistent logging
pub fn format_timestamp() -> String {
    let now: DateTime<Utc> = Utc::now();
    now.format("%H:%M:%S%.3f").to_string()
}

/// Macro for process-aware info logging
#[macro_export]
macro_rules! process_info {
    ($process:expr, $($arg:tt)*) => {
        tracing::info!(
            process = %$process,
            timestamp = $crate::logging::format_timestamp(),
            $($arg)*
        );
    };
}

/// Macro for process-aware warning logging
#[macro_export]
macro_rules! process_warn {
    ($process:expr, $($arg:tt)*) => {
        tracing::warn!(
            process = %$process,
            timestamp = $crate::logging::format_timestamp(),
            $($arg)*
        );
    };
}

/// Macro for process-aware error logging
#[macro_export]
macro_rules! process_error {
    ($process:expr, $($arg:tt)*) => {
        tracing::error!(
            process = %$process,
            timestamp = $crate::logging::format_timestamp(),
            $($arg)*
        );
    };
}

/// Macro for process-aware debug logging
#[macro_export]
macro_rules! process_debug {
    ($process:expr, $($arg:tt)*) => {
        tracing::debug!(
            process = %$process,
            timestamp = $crate::logging::format_timestamp(),
            $($arg)*
        );
    };
}

/// Contextual logging helper for startup messages
pub fn log_startup(process: &ProcessRole, details: &str) {
    info!(
        process = %process,
        timestamp = format_timestamp(),
        "🚀 Starting {}",
        details
    );
}

/// Contextual logging helper for shutdown messages
pub fn log_shutdown(process: &ProcessRole, reason: &str) {
    info!(
        process = %process,
        timestamp = format_timestamp(),
        "🛑 Shutting down: {}",
        reason
    );
}

/// Contextual logging helper for error conditions
pub fn log_error(process: &ProcessRole, context: &str, error: &dyn std::fmt::Display) {
    error!(
        process = %process,
        timestamp = format_timestamp(),
        error = %error,
        "❌ {} failed",
        context
    );
}

/// Contextual logging helper for success conditions
pub fn log_success(process: &ProcessRole, message: &str) {
    info!(
        process = %process,
        timestamp = format_timestamp(),
        "✅ {}",
        message
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directive_targets_process_crate() {
        let directive = filter_directive(&ProcessRole::Stressor("s1".into()), "debug");
        assert!(directive.starts_with("stressor=debug,shared=debug"));
        assert!(directive.contains("reqwest=warn"));

        let directive = filter_directive(&ProcessRole::ControlPlane, "info");
        assert!(directive.starts_with("control=info"));

        let directive = filter_directive(&ProcessRole::Manager, "warn");
        assert!(directive.starts_with("manager=warn"));
    }

    #[test]
    fn timestamp_has_millisecond_precision() {
        let ts = format_timestamp();
        assert_eq!(ts.len(), "00:00:00.000".len());
    }
}
