pub mod core;
pub mod configs;
pub mod loggers;
pub mod transports;

pub use core::error::{BoxError, LogError};
pub use loggers::{
    Context, FormatId, Level, LogEvent, LogInput, Logger, LoggerConfig, LoggerKey, LoggerRegistry,
    Payload, StructuredEvent, Trail, get_logger, send_fn,
};

#[doc(hidden)]
pub use serde_json as __serde_json;
