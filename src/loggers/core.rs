use crate::core::error::LogError;
use crate::loggers::level::Level;
use crate::loggers::trail::Trail;
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;

/// Context mapping attached to an event; keeps insertion order.
pub type Context = Map<String, Value>;

/// Canonical record produced for every log call that passes the level filter.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEvent {
    pub app_name: String,
    pub level: Level,
    pub level_name: &'static str,
    pub color: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
    pub trail: Trail,
    pub context: Context,
}

/// Explicit event options: a message plus optional name, stack and context.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StructuredEvent {
    pub message: String,
    pub name: Option<String>,
    pub stack: Option<String>,
    pub context: Option<Context>,
}

impl StructuredEvent {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Default::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_stack(mut self, stack: impl Into<String>) -> Self {
        self.stack = Some(stack.into());
        self
    }

    pub fn with_context(mut self, context: Context) -> Self {
        self.context = Some(context);
        self
    }

    /// Builds an event from an error value. The name is the error's type name
    /// without its module path; the message is its `Display` output.
    pub fn from_error<E: std::error::Error + ?Sized>(err: &E) -> Self {
        let type_name = std::any::type_name::<E>();
        let short = type_name
            .split('<')
            .next()
            .and_then(|path| path.rsplit("::").next())
            .unwrap_or(type_name);
        Self::new(err.to_string()).with_name(short)
    }
}

/// Input to a log call.
#[derive(Debug, Clone, PartialEq)]
pub enum LogInput {
    PlainMessage(String),
    StructuredEvent(StructuredEvent),
}

impl LogInput {
    /// Checks the shape of the input: a non-empty message in either variant.
    pub fn validate(&self) -> Result<(), LogError> {
        let message = match self {
            LogInput::PlainMessage(m) => m,
            LogInput::StructuredEvent(e) => &e.message,
        };
        if message.is_empty() {
            return Err(LogError::InvalidLogCall("message must be a non-empty string".into()));
        }
        Ok(())
    }
}

impl From<&str> for LogInput {
    fn from(s: &str) -> Self {
        LogInput::PlainMessage(s.to_string())
    }
}

impl From<String> for LogInput {
    fn from(s: String) -> Self {
        LogInput::PlainMessage(s)
    }
}

impl From<&String> for LogInput {
    fn from(s: &String) -> Self {
        LogInput::PlainMessage(s.clone())
    }
}

impl From<StructuredEvent> for LogInput {
    fn from(e: StructuredEvent) -> Self {
        LogInput::StructuredEvent(e)
    }
}

/// Rendered output of a formatter, handed to the delivery callback.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Payload {
    Text(String),
    Structured(Value),
}

impl Payload {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Payload::Text(s) => Some(s),
            Payload::Structured(_) => None,
        }
    }

    pub fn as_structured(&self) -> Option<&Value> {
        match self {
            Payload::Structured(v) => Some(v),
            Payload::Text(_) => None,
        }
    }
}

impl fmt::Display for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Payload::Text(s) => f.write_str(s),
            Payload::Structured(v) => write!(f, "{}", v),
        }
    }
}

impl From<String> for Payload {
    fn from(s: String) -> Self {
        Payload::Text(s)
    }
}

impl From<&str> for Payload {
    fn from(s: &str) -> Self {
        Payload::Text(s.to_string())
    }
}

impl From<Value> for Payload {
    fn from(v: Value) -> Self {
        match v {
            Value::String(s) => Payload::Text(s),
            other => Payload::Structured(other),
        }
    }
}
