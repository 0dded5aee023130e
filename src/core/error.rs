//! # Core Error Module
//!
//! This module defines the central `LogError` type used throughout the library.
//! It leverages `thiserror` for error message formatting. Every validation
//! failure is raised immediately at the call site; only `Delivery` carries a
//! failure that originated outside the crate.

use crate::loggers::registry::LoggerKey;
use thiserror::Error;

/// Boxed error used for collaborator failures (delivery callbacks, custom formatters).
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Central error type for the `rs_alertlog` library.
#[derive(Debug, Error)]
pub enum LogError {
    /// The input matched neither a valid rank nor a valid level name.
    #[error("Unknown level: {0}. Expected one of DEBUG(10), INFO(20), WARNING(30), ERROR(40), CRITICAL(50)")]
    UnknownLevel(String),

    /// The format identifier is not registered and is not a callable renderer.
    #[error("Unknown format: {0}")]
    UnknownFormat(String),

    /// Malformed or missing configuration fields.
    #[error(
        "Invalid logger configuration: {0}. Required: {{ send }} on first configuration. \
         Optional: {{ format: id | name | fn, app_name: non-empty string, min_level: rank | name, colors: map<level, color> }}"
    )]
    InvalidConfig(String),

    /// Malformed arguments to a log call.
    #[error(
        "Invalid log call: {0}. Expected a non-empty message string or \
         {{ message: non-empty string, name?: string, stack?: string, context?: map }}"
    )]
    InvalidLogCall(String),

    /// A formatter failed while rendering a log event.
    #[error("Formatter failed to render event: {0}")]
    InvalidFormatter(#[source] BoxError),

    /// Registry lookup for a logger that was never configured.
    #[error("Logger {0} is not configured")]
    NotConfigured(LoggerKey),

    /// The `send` collaborator failed; the original error is kept as the source.
    #[error("Delivery failed: {0}")]
    Delivery(#[source] BoxError),

    /// Error related to settings loading or merging.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Webhook request or network failure.
    #[error("HTTP error: {0}")]
    HttpError(String),
}
