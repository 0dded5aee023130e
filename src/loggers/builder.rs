use crate::core::error::{BoxError, LogError};
use crate::loggers::core::{Context, LogEvent, LogInput, Payload};
use crate::loggers::format::{FormatId, FormatterRegistry, RenderFn};
use crate::loggers::level::{Level, LevelSpec};
use crate::loggers::trail::TrailExtractor;
use arc_swap::ArcSwap;
use futures::future::BoxFuture;
use futures::FutureExt;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::panic::Location;
use std::sync::{Arc, Mutex};

pub const DEFAULT_APP_NAME: &str = "My App";
pub const DEFAULT_MIN_LEVEL: Level = Level::Warning;

pub type SendFuture = BoxFuture<'static, Result<Value, BoxError>>;

/// Delivery callback: receives the rendered payload, resolves or fails.
pub type SendFn = Arc<dyn Fn(Payload) -> SendFuture + Send + Sync>;

/// Adapts an async closure into a [`SendFn`].
pub fn send_fn<F, Fut, E>(f: F) -> SendFn
where
    F: Fn(Payload) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value, E>> + Send + 'static,
    E: Into<BoxError>,
{
    Arc::new(move |payload: Payload| -> SendFuture {
        let fut = f(payload);
        async move { fut.await.map_err(Into::into) }.boxed()
    })
}

/// Partial logger configuration. Omitted fields keep the logger's current
/// value, or fall back to the defaults on first configuration.
#[derive(Clone, Default)]
pub struct LoggerConfig {
    pub send: Option<SendFn>,
    pub format: Option<FormatId>,
    pub app_name: Option<String>,
    pub min_level: Option<LevelSpec>,
    pub colors: Option<HashMap<Level, String>>,
}

impl LoggerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_send(mut self, send: SendFn) -> Self {
        self.send = Some(send);
        self
    }

    pub fn with_format(mut self, format: impl Into<FormatId>) -> Self {
        self.format = Some(format.into());
        self
    }

    pub fn with_app_name(mut self, app_name: impl Into<String>) -> Self {
        self.app_name = Some(app_name.into());
        self
    }

    pub fn with_min_level(mut self, level: impl Into<LevelSpec>) -> Self {
        self.min_level = Some(level.into());
        self
    }

    pub fn with_colors(mut self, colors: HashMap<Level, String>) -> Self {
        self.colors = Some(colors);
        self
    }

    /// Sets one color, keeping any others already given to this builder.
    pub fn with_color(mut self, level: Level, color: impl Into<String>) -> Self {
        self.colors
            .get_or_insert_with(HashMap::new)
            .insert(level, color.into());
        self
    }
}

impl fmt::Debug for LoggerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoggerConfig")
            .field("send", &self.send.as_ref().map(|_| "<fn>"))
            .field("format", &self.format)
            .field("app_name", &self.app_name)
            .field("min_level", &self.min_level)
            .field("colors", &self.colors)
            .finish()
    }
}

/// Fully resolved configuration a logger runs with.
pub struct ActiveConfig {
    send: SendFn,
    format: FormatId,
    render: RenderFn,
    app_name: String,
    min_level: Level,
    colors: Option<HashMap<Level, String>>,
}

impl ActiveConfig {
    fn merge(
        current: Option<&ActiveConfig>,
        partial: LoggerConfig,
        formats: &FormatterRegistry,
    ) -> Result<Self, LogError> {
        let send = partial
            .send
            .or_else(|| current.map(|c| c.send.clone()))
            .ok_or_else(|| LogError::InvalidConfig("send callback is required".into()))?;

        let (format, render) = match (partial.format, current) {
            (Some(format), _) => {
                let render = formats
                    .resolve(&format)
                    .map_err(|e| LogError::InvalidConfig(e.to_string()))?;
                (format, render)
            }
            (None, Some(c)) => (c.format.clone(), c.render.clone()),
            (None, None) => {
                let format = FormatId::default();
                let render = formats
                    .resolve(&format)
                    .map_err(|e| LogError::InvalidConfig(e.to_string()))?;
                (format, render)
            }
        };

        let app_name = partial
            .app_name
            .or_else(|| current.map(|c| c.app_name.clone()))
            .unwrap_or_else(|| DEFAULT_APP_NAME.to_string());
        if app_name.is_empty() {
            return Err(LogError::InvalidConfig("app_name must be a non-empty string".into()));
        }

        let min_level = match partial.min_level {
            Some(spec) => spec
                .resolve()
                .map_err(|e| LogError::InvalidConfig(e.to_string()))?,
            None => current.map_or(DEFAULT_MIN_LEVEL, |c| c.min_level),
        };

        let colors = partial.colors.or_else(|| current.and_then(|c| c.colors.clone()));

        Ok(Self {
            send,
            format,
            render,
            app_name,
            min_level,
            colors,
        })
    }

    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    pub fn min_level(&self) -> Level {
        self.min_level
    }

    pub fn format(&self) -> &FormatId {
        &self.format
    }

    pub fn colors(&self) -> Option<&HashMap<Level, String>> {
        self.colors.as_ref()
    }

    pub fn send_fn(&self) -> &SendFn {
        &self.send
    }

    /// Configured color for `level`, else the built-in default.
    pub fn color_for(&self, level: Level) -> String {
        self.colors
            .as_ref()
            .and_then(|c| c.get(&level))
            .cloned()
            .unwrap_or_else(|| level.default_color().to_string())
    }
}

/// Handle to a configured logger. Clones share the same configuration.
#[derive(Clone)]
pub struct Logger {
    config: Arc<ArcSwap<ActiveConfig>>,
    write_guard: Arc<Mutex<()>>,
    formats: Arc<FormatterRegistry>,
    trails: Arc<TrailExtractor>,
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cfg = self.config.load();
        f.debug_struct("Logger")
            .field("app_name", &cfg.app_name)
            .field("min_level", &cfg.min_level)
            .field("format", &cfg.format)
            .finish()
    }
}

impl Logger {
    /// Creates a logger from a first configuration; `send` is mandatory here.
    pub fn new(
        config: LoggerConfig,
        formats: Arc<FormatterRegistry>,
        trails: Arc<TrailExtractor>,
    ) -> Result<Self, LogError> {
        let active = ActiveConfig::merge(None, config, &formats)?;
        Ok(Self {
            config: Arc::new(ArcSwap::from_pointee(active)),
            write_guard: Arc::new(Mutex::new(())),
            formats,
            trails,
        })
    }

    /// Defaults-merging update of the active configuration. On failure the
    /// previous configuration stays in place.
    pub fn set_config(&self, partial: LoggerConfig) -> Result<(), LogError> {
        let _guard = self.write_guard.lock().unwrap_or_else(|e| e.into_inner());
        let current = self.config.load_full();
        let next = ActiveConfig::merge(Some(current.as_ref()), partial, &self.formats)?;
        self.config.store(Arc::new(next));
        Ok(())
    }

    /// Snapshot of the active configuration.
    pub fn config(&self) -> Arc<ActiveConfig> {
        self.config.load_full()
    }

    /// True when both handles refer to the same logger.
    pub fn same_as(&self, other: &Logger) -> bool {
        Arc::ptr_eq(&self.config, &other.config)
    }

    /// Validates, filters, renders and delivers one event.
    ///
    /// Everything up to rendering happens before this returns; the future only
    /// awaits the `send` callback. Resolves to `Ok(None)` when the level is
    /// below the configured minimum, otherwise to whatever `send` produced.
    #[track_caller]
    pub fn log(
        &self,
        level: impl Into<LevelSpec>,
        input: impl Into<LogInput>,
        context: impl Into<Option<Context>>,
    ) -> impl Future<Output = Result<Option<Value>, LogError>> + Send + 'static {
        let caller = Location::caller();
        let prepared = self.prepare(level.into(), input.into(), context.into(), caller);
        async move {
            match prepared? {
                None => Ok(None),
                Some((send, payload)) => send(payload).await.map(Some).map_err(LogError::Delivery),
            }
        }
    }

    #[track_caller]
    pub fn debug(
        &self,
        input: impl Into<LogInput>,
        context: impl Into<Option<Context>>,
    ) -> impl Future<Output = Result<Option<Value>, LogError>> + Send + 'static {
        self.log(Level::Debug, input, context)
    }

    #[track_caller]
    pub fn info(
        &self,
        input: impl Into<LogInput>,
        context: impl Into<Option<Context>>,
    ) -> impl Future<Output = Result<Option<Value>, LogError>> + Send + 'static {
        self.log(Level::Info, input, context)
    }

    #[track_caller]
    pub fn warning(
        &self,
        input: impl Into<LogInput>,
        context: impl Into<Option<Context>>,
    ) -> impl Future<Output = Result<Option<Value>, LogError>> + Send + 'static {
        self.log(Level::Warning, input, context)
    }

    #[track_caller]
    pub fn error(
        &self,
        input: impl Into<LogInput>,
        context: impl Into<Option<Context>>,
    ) -> impl Future<Output = Result<Option<Value>, LogError>> + Send + 'static {
        self.log(Level::Error, input, context)
    }

    #[track_caller]
    pub fn critical(
        &self,
        input: impl Into<LogInput>,
        context: impl Into<Option<Context>>,
    ) -> impl Future<Output = Result<Option<Value>, LogError>> + Send + 'static {
        self.log(Level::Critical, input, context)
    }

    fn prepare(
        &self,
        level: LevelSpec,
        input: LogInput,
        context: Option<Context>,
        caller: &'static Location<'static>,
    ) -> Result<Option<(SendFn, Payload)>, LogError> {
        let level = level
            .resolve()
            .map_err(|e| LogError::InvalidLogCall(e.to_string()))?;
        input.validate()?;

        let cfg = self.config.load();
        if level < cfg.min_level {
            tracing::trace!(event_level = %level, min_level = %cfg.min_level, "log event filtered");
            return Ok(None);
        }

        let event = self.build_event(&cfg, level, input, context, caller);
        let payload = (cfg.render)(&event).map_err(LogError::InvalidFormatter)?;
        Ok(Some((cfg.send.clone(), payload)))
    }

    fn build_event(
        &self,
        cfg: &ActiveConfig,
        level: Level,
        input: LogInput,
        context: Option<Context>,
        caller: &Location<'_>,
    ) -> LogEvent {
        let (message, name, stack, embedded) = match input {
            LogInput::PlainMessage(message) => (message, None, None, None),
            LogInput::StructuredEvent(e) => (e.message, e.name, e.stack, e.context),
        };
        let stack = stack.filter(|s| !s.is_empty());

        // An explicit stack already starts at the real origin; a fresh capture
        // comes from `#[track_caller]`, which skips our own frames.
        let trail = match &stack {
            Some(stack) => self.trails.extract(stack, false),
            None => self.trails.from_location(caller),
        };

        LogEvent {
            app_name: cfg.app_name.clone(),
            level,
            level_name: level.name(),
            color: cfg.color_for(level),
            name,
            message,
            stack,
            trail,
            context: context.or(embedded).unwrap_or_default(),
        }
    }
}
