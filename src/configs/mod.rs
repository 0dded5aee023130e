//! # Logger Settings
//!
//! Loads logger settings from an optional JSON file merged with `ALERTLOG_`
//! environment variables, and turns them into a [`LoggerConfig`].

use crate::core::error::LogError;
use crate::loggers::builder::LoggerConfig;
use crate::loggers::format::FormatId;
use crate::loggers::level::{Level, LevelSpec};
use crate::transports::webhook::WebhookSender;
use figment::Figment;
use figment::providers::{Env, Format, Json};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const ENV_PREFIX: &str = "ALERTLOG_";

/// Format reference as written in settings: numeric id or name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FormatSetting {
    Id(u32),
    Name(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoggerSettings {
    pub app_name: Option<String>,
    pub min_level: Option<LevelSpec>,
    pub format: Option<FormatSetting>,
    /// Level name -> color.
    pub colors: Option<HashMap<String, String>>,
    pub webhook_url: Option<String>,
}

impl LoggerSettings {
    /// File (if given) merged with `ALERTLOG_*` env vars; `__` splits nested keys.
    /// Fails if the file is missing.
    pub fn load(path: Option<&str>) -> Result<Self, LogError> {
        let mut figment = Figment::new();
        if let Some(path) = path {
            if !std::path::Path::new(path).exists() {
                return Err(LogError::ConfigError(format!("Local file not found: {}", path)));
            }
            figment = figment.merge(Json::file(path));
        }
        Self::from_figment(figment.merge(Env::prefixed(ENV_PREFIX).split("__")))
    }

    pub fn from_figment(figment: Figment) -> Result<Self, LogError> {
        figment
            .extract()
            .map_err(|e| LogError::ConfigError(e.to_string()))
    }

    /// Converts to a partial configuration. A `webhook_url` becomes the `send`
    /// callback; callers may still override it with [`LoggerConfig::send`].
    pub fn into_config(self) -> Result<LoggerConfig, LogError> {
        let mut config = LoggerConfig::new();

        if let Some(url) = self.webhook_url {
            config = config.with_send(WebhookSender::new(url).into_send());
        }
        if let Some(app_name) = self.app_name {
            config = config.with_app_name(app_name);
        }
        if let Some(level) = self.min_level {
            config = config.with_min_level(level);
        }
        if let Some(format) = self.format {
            config = config.with_format(match format {
                FormatSetting::Id(id) => FormatId::Id(id),
                FormatSetting::Name(name) => FormatId::Name(name),
            });
        }
        if let Some(colors) = self.colors {
            let mut resolved = HashMap::with_capacity(colors.len());
            for (name, color) in colors {
                let level: Level = name
                    .parse()
                    .map_err(|e: LogError| LogError::ConfigError(format!("colors: {}", e)))?;
                resolved.insert(level, color);
            }
            config = config.with_colors(resolved);
        }

        Ok(config)
    }
}
