//! # Formatter Registry
//!
//! Maps a format identifier (numeric id, name, or a caller-supplied function)
//! to a renderer `LogEvent -> Payload`. The built-in `SLACK` renderer is always
//! registered under id 1.

use crate::core::error::{BoxError, LogError};
use crate::loggers::core::{LogEvent, Payload};
use chrono::Utc;
use serde_json::{Value, json};
use std::fmt;
use std::sync::{Arc, RwLock};

/// A synchronous, pure renderer.
pub type RenderFn = Arc<dyn Fn(&LogEvent) -> Result<Payload, BoxError> + Send + Sync>;

pub const SLACK_ID: u32 = 1;
pub const SLACK_NAME: &str = "SLACK";

/// Format reference as accepted by logger configuration.
#[derive(Clone)]
pub enum FormatId {
    Id(u32),
    Name(String),
    Render(RenderFn),
}

impl FormatId {
    /// Wraps a closure as a pass-through renderer.
    ///
    /// An `Err` from the closure surfaces as `LogError::InvalidFormatter`.
    /// Panics are not caught and unwind through the log call.
    pub fn custom<F, P>(f: F) -> Self
    where
        F: Fn(&LogEvent) -> Result<P, BoxError> + Send + Sync + 'static,
        P: Into<Payload>,
    {
        FormatId::Render(Arc::new(move |event: &LogEvent| f(event).map(Into::into)))
    }
}

impl Default for FormatId {
    fn default() -> Self {
        FormatId::Id(SLACK_ID)
    }
}

impl fmt::Debug for FormatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatId::Id(id) => write!(f, "FormatId::Id({})", id),
            FormatId::Name(n) => write!(f, "FormatId::Name({:?})", n),
            FormatId::Render(_) => f.write_str("FormatId::Render(<fn>)"),
        }
    }
}

impl From<u32> for FormatId {
    fn from(id: u32) -> Self {
        FormatId::Id(id)
    }
}

impl From<&str> for FormatId {
    fn from(name: &str) -> Self {
        FormatId::Name(name.to_string())
    }
}

impl From<String> for FormatId {
    fn from(name: String) -> Self {
        FormatId::Name(name)
    }
}

impl From<RenderFn> for FormatId {
    fn from(f: RenderFn) -> Self {
        FormatId::Render(f)
    }
}

struct FormatterEntry {
    id: u32,
    name: String,
    render: RenderFn,
}

/// Registry of named renderers.
pub struct FormatterRegistry {
    entries: RwLock<Vec<FormatterEntry>>,
}

impl Default for FormatterRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl FormatterRegistry {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(vec![FormatterEntry {
                id: SLACK_ID,
                name: SLACK_NAME.to_string(),
                render: Arc::new(render_slack),
            }]),
        }
    }

    /// Registers a renderer under a fresh id and name.
    pub fn register<F, P>(&self, id: u32, name: &str, f: F) -> Result<(), LogError>
    where
        F: Fn(&LogEvent) -> Result<P, BoxError> + Send + Sync + 'static,
        P: Into<Payload>,
    {
        if name.trim().is_empty() {
            return Err(LogError::InvalidConfig("formatter name must be non-empty".into()));
        }
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        if entries
            .iter()
            .any(|e| e.id == id || e.name.eq_ignore_ascii_case(name))
        {
            return Err(LogError::InvalidConfig(format!(
                "formatter id {} or name {:?} is already registered",
                id, name
            )));
        }
        entries.push(FormatterEntry {
            id,
            name: name.to_string(),
            render: Arc::new(move |event: &LogEvent| f(event).map(Into::into)),
        });
        Ok(())
    }

    /// Resolves a format reference; callables pass through unchanged.
    pub fn resolve(&self, format: &FormatId) -> Result<RenderFn, LogError> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        let found = match format {
            FormatId::Render(f) => return Ok(f.clone()),
            FormatId::Id(id) => entries.iter().find(|e| e.id == *id),
            FormatId::Name(name) => entries
                .iter()
                .find(|e| e.name.eq_ignore_ascii_case(name.trim())),
        };
        found
            .map(|e| e.render.clone())
            .ok_or_else(|| LogError::UnknownFormat(format!("{:?}", format)))
    }

    /// Registered `(id, name)` pairs in registration order.
    pub fn names(&self) -> Vec<(u32, String)> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries.iter().map(|e| (e.id, e.name.clone())).collect()
    }
}

/// Default SLACK renderer, timestamped with the current time.
pub fn render_slack(event: &LogEvent) -> Result<Payload, BoxError> {
    Ok(Payload::Structured(slack_payload(event, Utc::now().timestamp())))
}

/// Builds the Slack block payload for `event` with a fixed timestamp (seconds).
pub fn slack_payload(event: &LogEvent, ts: i64) -> Value {
    let mut blocks = Vec::with_capacity(4);

    blocks.push(json!({
        "type": "header",
        "text": {
            "type": "plain_text",
            "text": format!("[{}] {}", event.level_name, event.app_name),
            "emoji": true
        }
    }));

    let body = match &event.name {
        Some(name) => format!("{}: {}", name, event.message),
        None => event.message.clone(),
    };
    blocks.push(json!({
        "type": "section",
        "text": { "type": "mrkdwn", "text": body }
    }));

    if let Some(stack) = event.stack.as_deref().filter(|s| !s.is_empty()) {
        blocks.push(json!({
            "type": "section",
            "text": { "type": "mrkdwn", "text": format!("```{}```", stack) }
        }));
    }

    let mut elements = vec![json!({
        "type": "mrkdwn",
        "text": format!("<!date^{ts}^{{date_short_pretty}} {{time_secs}}|{ts}>")
    })];

    if let Some(frame) = event.trail.frame() {
        let location = match &frame.scope {
            Some(scope) => format!("{}/{}", frame.file, scope),
            None => frame.file.clone(),
        };
        elements.push(json!({
            "type": "mrkdwn",
            "text": format!("{} line {}:{}", location, frame.line, frame.column)
        }));
    }

    for (key, value) in &event.context {
        let rendered = match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        elements.push(json!({
            "type": "mrkdwn",
            "text": format!("*{}*: {}", key, rendered)
        }));
    }

    blocks.push(json!({ "type": "context", "elements": elements }));

    json!({
        "attachments": [{
            "color": event.color,
            "blocks": blocks
        }]
    })
}
