//! # Logger Registry
//!
//! Keyed collection of [`Logger`]s with lazy creation on first configuration.
//! Each registry owns its formatter registry, so tests can run against fresh
//! instances; [`LoggerRegistry::global`] offers a process-wide one.

use crate::core::error::{BoxError, LogError};
use crate::loggers::builder::{Logger, LoggerConfig};
use crate::loggers::core::{LogEvent, Payload};
use crate::loggers::format::FormatterRegistry;
use crate::loggers::trail::TrailExtractor;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::fmt;
use std::sync::{Arc, LazyLock};

static GLOBAL: LazyLock<LoggerRegistry> = LazyLock::new(LoggerRegistry::new);

/// Identity of a logger inside a registry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LoggerKey {
    Default,
    Name(String),
    Number(i64),
}

impl fmt::Display for LoggerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoggerKey::Default => f.write_str("<default>"),
            LoggerKey::Name(n) => write!(f, "{:?}", n),
            LoggerKey::Number(n) => write!(f, "#{}", n),
        }
    }
}

impl From<&str> for LoggerKey {
    fn from(s: &str) -> Self {
        LoggerKey::Name(s.to_string())
    }
}

impl From<String> for LoggerKey {
    fn from(s: String) -> Self {
        LoggerKey::Name(s)
    }
}

impl From<i64> for LoggerKey {
    fn from(n: i64) -> Self {
        LoggerKey::Number(n)
    }
}

impl From<i32> for LoggerKey {
    fn from(n: i32) -> Self {
        LoggerKey::Number(i64::from(n))
    }
}

impl From<u32> for LoggerKey {
    fn from(n: u32) -> Self {
        LoggerKey::Number(i64::from(n))
    }
}

pub struct LoggerRegistry {
    loggers: DashMap<LoggerKey, Logger>,
    formats: Arc<FormatterRegistry>,
    trails: Arc<TrailExtractor>,
}

impl Default for LoggerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl LoggerRegistry {
    pub fn new() -> Self {
        Self::with_trail_extractor(TrailExtractor::new())
    }

    /// Registry whose loggers attribute sources with `trails`.
    pub fn with_trail_extractor(trails: TrailExtractor) -> Self {
        Self {
            loggers: DashMap::new(),
            formats: Arc::new(FormatterRegistry::new()),
            trails: Arc::new(trails),
        }
    }

    /// Process-wide registry, created on first use.
    pub fn global() -> &'static LoggerRegistry {
        &GLOBAL
    }

    pub fn formats(&self) -> &FormatterRegistry {
        &self.formats
    }

    /// Registers a custom formatter usable by every logger of this registry.
    pub fn register_format<F, P>(&self, id: u32, name: &str, f: F) -> Result<(), LogError>
    where
        F: Fn(&LogEvent) -> Result<P, BoxError> + Send + Sync + 'static,
        P: Into<Payload>,
    {
        self.formats.register(id, name, f)
    }

    /// Looks up a configured logger.
    pub fn get(&self, key: impl Into<LoggerKey>) -> Result<Logger, LogError> {
        let key = key.into();
        self.loggers
            .get(&key)
            .map(|l| l.value().clone())
            .ok_or(LogError::NotConfigured(key))
    }

    /// Creates the logger for `key`, or merge-updates it if it already exists.
    pub fn configure(&self, key: impl Into<LoggerKey>, config: LoggerConfig) -> Result<Logger, LogError> {
        match self.loggers.entry(key.into()) {
            Entry::Occupied(entry) => {
                let logger = entry.get().clone();
                logger.set_config(config)?;
                Ok(logger)
            }
            Entry::Vacant(entry) => {
                let logger = Logger::new(config, self.formats.clone(), self.trails.clone())?;
                tracing::debug!(key = %entry.key(), "logger created");
                entry.insert(logger.clone());
                Ok(logger)
            }
        }
    }

    /// `get_logger(key?, config?)`: resolves the keyed (or default) logger,
    /// configuring it first when a configuration is given.
    pub fn get_logger(&self, key: Option<LoggerKey>, config: Option<LoggerConfig>) -> Result<Logger, LogError> {
        let key = key.unwrap_or(LoggerKey::Default);
        match config {
            Some(config) => self.configure(key, config),
            None => self.get(key),
        }
    }

    pub fn default_logger(&self) -> Result<Logger, LogError> {
        self.get(LoggerKey::Default)
    }

    pub fn configure_default(&self, config: LoggerConfig) -> Result<Logger, LogError> {
        self.configure(LoggerKey::Default, config)
    }

    pub fn contains(&self, key: impl Into<LoggerKey>) -> bool {
        self.loggers.contains_key(&key.into())
    }

    pub fn keys(&self) -> Vec<LoggerKey> {
        self.loggers.iter().map(|e| e.key().clone()).collect()
    }
}

/// `get_logger` against the process-wide registry.
pub fn get_logger(key: Option<LoggerKey>, config: Option<LoggerConfig>) -> Result<Logger, LogError> {
    LoggerRegistry::global().get_logger(key, config)
}
