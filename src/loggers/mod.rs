// src/loggers/mod.rs

pub mod builder;
pub mod core;
pub mod format;
pub mod level;
pub mod registry;
pub mod trail;

pub use builder::{ActiveConfig, Logger, LoggerConfig, SendFn, send_fn};
pub use core::{Context, LogEvent, LogInput, Payload, StructuredEvent};
pub use format::{FormatId, FormatterRegistry, RenderFn};
pub use level::{Level, LevelSpec, rank_of};
pub use registry::{LoggerKey, LoggerRegistry, get_logger};
pub use trail::{Trail, TrailExtractor};

#[macro_export]
macro_rules! log_base {
    // No kv pairs
    ($logger:expr, $level:expr, $msg:expr) => {
        $crate::log_base!($logger, $level, $msg, )
    };
    // With kv pairs (zero or more)
    ($logger:expr, $level:expr, $msg:expr, $( $k:expr => $v:expr ),* $(,)? ) => {
        {
            #[allow(unused_mut)]
            let mut ctx = $crate::loggers::core::Context::new();
            $(
                // Unserializable values become null
                ctx.insert(
                    $k.to_string(),
                    $crate::__serde_json::to_value(&$v).unwrap_or($crate::__serde_json::Value::Null),
                );
            )*
            let ctx = if ctx.is_empty() { None } else { Some(ctx) };
            $logger.log($level, $msg, ctx)
        }
    };
}

#[macro_export]
macro_rules! debug {
    ($logger:expr, $msg:expr $(, $k:expr => $v:expr )* $(,)? ) => {
        $crate::log_base!($logger, $crate::loggers::level::Level::Debug, $msg $(, $k => $v )* )
    };
}

#[macro_export]
macro_rules! info {
    ($logger:expr, $msg:expr $(, $k:expr => $v:expr )* $(,)? ) => {
        $crate::log_base!($logger, $crate::loggers::level::Level::Info, $msg $(, $k => $v )* )
    };
}

#[macro_export]
macro_rules! warning {
    ($logger:expr, $msg:expr $(, $k:expr => $v:expr )* $(,)? ) => {
        $crate::log_base!($logger, $crate::loggers::level::Level::Warning, $msg $(, $k => $v )* )
    };
}

#[macro_export]
macro_rules! error {
    ($logger:expr, $msg:expr $(, $k:expr => $v:expr )* $(,)? ) => {
        $crate::log_base!($logger, $crate::loggers::level::Level::Error, $msg $(, $k => $v )* )
    };
}

#[macro_export]
macro_rules! critical {
    ($logger:expr, $msg:expr $(, $k:expr => $v:expr )* $(,)? ) => {
        $crate::log_base!($logger, $crate::loggers::level::Level::Critical, $msg $(, $k => $v )* )
    };
}
