//! # Trail Extractor
//!
//! Recovers the source location of a log call from a captured call-stack text.
//!
//! Two frame shapes are understood:
//! - V8-style lines: `at scope (file:line:column)` or `at file:line:column`
//! - `std::backtrace::Backtrace` output, where the symbol sits on its own
//!   numbered line and the `at file:line:column` line follows it
//!
//! Runtime frames (`std::`, `core::`, `alloc::`) are never attributed. With
//! `exclude_self`, frames belonging to this crate are skipped until the first
//! frame that is not ours.

use regex::Regex;
use serde::Serialize;
use std::panic::Location;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

static AT_FRAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*at\s+(?:(.+?)\s+\()?(.+?):(\d+):(\d+)\)?\s*$").expect("valid frame pattern")
});

static SYMBOL_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(\d+):\s+(\S.*?)\s*$").expect("valid symbol pattern"));

static SYMBOL_HASH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"::h[0-9a-f]{16}$").expect("valid hash pattern"));

const RUNTIME_PREFIXES: [&str; 8] = [
    "std::",
    "core::",
    "alloc::",
    "<std::",
    "<core::",
    "<alloc::",
    "__rust",
    "rust_begin_unwind",
];

const SELF_SOURCE_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/src/");
const SELF_CRATE: &str = env!("CARGO_CRATE_NAME");

/// A single resolved stack frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Frame {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    pub file: String,
    pub line: u32,
    pub column: u32,
}

/// Source attribution for a log call. Either empty, or carrying file, line and
/// column together with an optional scope.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Trail {
    #[serde(flatten)]
    frame: Option<Frame>,
}

impl Trail {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn new(frame: Frame) -> Self {
        Self { frame: Some(frame) }
    }

    pub fn is_empty(&self) -> bool {
        self.frame.is_none()
    }

    pub fn frame(&self) -> Option<&Frame> {
        self.frame.as_ref()
    }

    pub fn scope(&self) -> Option<&str> {
        self.frame.as_ref().and_then(|f| f.scope.as_deref())
    }

    pub fn file(&self) -> Option<&str> {
        self.frame.as_ref().map(|f| f.file.as_str())
    }

    pub fn line(&self) -> Option<u32> {
        self.frame.as_ref().map(|f| f.line)
    }

    pub fn column(&self) -> Option<u32> {
        self.frame.as_ref().map(|f| f.column)
    }
}

/// Parses stack texts into [`Trail`]s, relativizing file paths against a base directory.
#[derive(Debug, Clone)]
pub struct TrailExtractor {
    base_dir: PathBuf,
    self_dir: String,
    self_crate: String,
}

impl Default for TrailExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl TrailExtractor {
    /// Extractor relative to the process's current working directory.
    pub fn new() -> Self {
        Self {
            base_dir: std::env::current_dir().unwrap_or_default(),
            self_dir: SELF_SOURCE_DIR.to_string(),
            self_crate: SELF_CRATE.to_string(),
        }
    }

    pub fn with_base_dir(mut self, base_dir: impl Into<PathBuf>) -> Self {
        self.base_dir = base_dir.into();
        self
    }

    /// Overrides what counts as a library frame: files under `source_dir`
    /// or scopes inside `crate_name`.
    pub fn with_self_identity(mut self, source_dir: impl Into<String>, crate_name: impl Into<String>) -> Self {
        self.self_dir = source_dir.into();
        self.self_crate = crate_name.into();
        self
    }

    /// Returns the first attributable frame, or an empty trail. Never fails.
    pub fn extract(&self, stack: &str, exclude_self: bool) -> Trail {
        // A backtrace symbol names the `at` line directly below it, and only
        // while the frame indices run 0, 1, 2, ...
        let mut pending_scope: Option<String> = None;
        let mut next_index: u64 = 0;

        for line in stack.lines() {
            let symbol = pending_scope.take();

            if let Some(caps) = AT_FRAME.captures(line) {
                let scope = caps.get(1).map(|m| m.as_str().to_string()).or(symbol);
                let (Ok(line_no), Ok(column)) = (caps[3].parse::<u32>(), caps[4].parse::<u32>()) else {
                    continue;
                };
                let file = caps[2].trim_start_matches("file://").to_string();

                if is_runtime(scope.as_deref(), &file) {
                    continue;
                }
                if exclude_self && self.is_self(scope.as_deref(), &file) {
                    continue;
                }

                return Trail::new(Frame {
                    scope,
                    file: self.relativize(&file),
                    line: line_no,
                    column,
                });
            }

            if let Some(caps) = SYMBOL_LINE.captures(line) {
                if caps[1].parse::<u64>() == Ok(next_index) {
                    next_index += 1;
                    pending_scope = Some(SYMBOL_HASH.replace(&caps[2], "").into_owned());
                }
            }
        }

        Trail::empty()
    }

    /// Trail for a caller location captured through `#[track_caller]`.
    pub fn from_location(&self, location: &Location<'_>) -> Trail {
        Trail::new(Frame {
            scope: None,
            file: self.relativize(location.file()),
            line: location.line(),
            column: location.column(),
        })
    }

    fn is_self(&self, scope: Option<&str>, file: &str) -> bool {
        let in_crate = scope.is_some_and(|s| {
            let s = s.trim_start_matches('<');
            s.strip_prefix(self.self_crate.as_str())
                .is_some_and(|rest| rest.starts_with("::"))
        });
        in_crate || (!self.self_dir.is_empty() && file.starts_with(self.self_dir.as_str()))
    }

    fn relativize(&self, file: &str) -> String {
        let trimmed = file.strip_prefix("./").unwrap_or(file);
        let path = Path::new(trimmed);
        if path.is_absolute() && !self.base_dir.as_os_str().is_empty() {
            if let Ok(rel) = path.strip_prefix(&self.base_dir) {
                return rel.to_string_lossy().replace('\\', "/");
            }
        }
        trimmed.to_string()
    }
}

fn is_runtime(scope: Option<&str>, file: &str) -> bool {
    file.starts_with("/rustc/")
        || scope.is_some_and(|s| RUNTIME_PREFIXES.iter().any(|p| s.starts_with(p)))
}

/// `extract` with the default extractor.
pub fn extract(stack: &str, exclude_self: bool) -> Trail {
    TrailExtractor::new().extract(stack, exclude_self)
}

#[cfg(test)]
mod tests {
    use super::*;

    const V8_STACK: &str = "Error: boom
    at Logger.log (/srv/app/node_modules/alertlog/index.js:120:15)
    at handleRequest (/srv/app/src/server.js:42:7)
    at /srv/app/src/main.js:9:3";

    fn extractor() -> TrailExtractor {
        TrailExtractor::new()
            .with_base_dir("/srv/app")
            .with_self_identity("/srv/app/node_modules/alertlog/", "alertlog")
    }

    #[test]
    fn first_frame_taken_without_exclusion() {
        let trail = extractor().extract(V8_STACK, false);
        assert_eq!(trail.scope(), Some("Logger.log"));
        assert_eq!(trail.file(), Some("node_modules/alertlog/index.js"));
        assert_eq!(trail.line(), Some(120));
        assert_eq!(trail.column(), Some(15));
    }

    #[test]
    fn self_frames_skipped_with_exclusion() {
        let trail = extractor().extract(V8_STACK, true);
        assert_eq!(trail.scope(), Some("handleRequest"));
        assert_eq!(trail.file(), Some("src/server.js"));
        assert_eq!(trail.line(), Some(42));
    }

    #[test]
    fn consecutive_self_frames_all_skipped() {
        let stack = "    at a (/srv/app/node_modules/alertlog/index.js:1:1)
    at b (/srv/app/node_modules/alertlog/format.js:2:2)
    at caller (/srv/app/src/jobs.js:3:4)
    at c (/srv/app/node_modules/alertlog/index.js:5:5)";
        let trail = extractor().extract(stack, true);
        assert_eq!(trail.scope(), Some("caller"));
        assert_eq!(trail.file(), Some("src/jobs.js"));
    }

    #[test]
    fn anonymous_frame_has_no_scope() {
        let stack = "    at /srv/app/src/main.js:9:3";
        let trail = extractor().extract(stack, false);
        assert_eq!(trail.scope(), None);
        assert_eq!(trail.file(), Some("src/main.js"));
        assert_eq!(trail.column(), Some(3));
    }

    #[test]
    fn unparseable_stack_yields_empty_trail() {
        let trail = extractor().extract("no frames here\njust text", true);
        assert!(trail.is_empty());
        assert_eq!(serde_json::to_value(&trail).unwrap(), serde_json::json!({}));
    }

    #[test]
    fn rust_backtrace_skips_runtime_and_self_frames() {
        let stack = "   0: std::backtrace_rs::backtrace::libunwind::trace
             at /rustc/abc/library/std/src/../../backtrace/src/backtrace/libunwind.rs:116:5
   1: std::backtrace::Backtrace::force_capture
             at /rustc/abc/library/std/src/backtrace.rs:312:9
   2: rs_alertlog::loggers::builder::Logger::log::h0123456789abcdef
             at ./src/loggers/builder.rs:200:9
   3: billing::jobs::settle::h0123456789abcdef
             at ./src/jobs.rs:31:13
   4: main
             at ./src/main.rs:4:5";
        let ex = TrailExtractor::new().with_base_dir("/srv/billing");

        let trail = ex.extract(stack, true);
        assert_eq!(trail.scope(), Some("billing::jobs::settle"));
        assert_eq!(trail.file(), Some("src/jobs.rs"));
        assert_eq!(trail.line(), Some(31));
        assert_eq!(trail.column(), Some(13));

        let unfiltered = ex.extract(stack, false);
        assert_eq!(unfiltered.scope(), Some("rs_alertlog::loggers::builder::Logger::log"));
    }

    #[test]
    fn numbered_message_line_is_not_a_scope() {
        let stack = "500: upstream failed\n    at /srv/app/src/main.js:9:3";
        let trail = extractor().extract(stack, false);
        assert_eq!(trail.scope(), None);
        assert_eq!(trail.file(), Some("src/main.js"));
        assert_eq!(trail.line(), Some(9));
    }

    #[test]
    fn backtrace_symbol_only_names_the_next_line() {
        let stack = "   0: app::run
   1: app::main
             at ./src/main.rs:4:5";
        let trail = TrailExtractor::new().with_base_dir("/srv/app").extract(stack, false);
        assert_eq!(trail.scope(), Some("app::main"));

        let detached = "   0: app::run
note: frames omitted
             at ./src/main.rs:4:5";
        let trail = TrailExtractor::new().with_base_dir("/srv/app").extract(detached, false);
        assert_eq!(trail.scope(), None);
        assert_eq!(trail.file(), Some("src/main.rs"));
    }

    #[test]
    fn paths_outside_base_are_kept() {
        let stack = "    at x (/opt/other/lib.js:1:2)";
        let trail = extractor().extract(stack, false);
        assert_eq!(trail.file(), Some("/opt/other/lib.js"));
    }

    #[test]
    fn location_becomes_trail() {
        let here = Location::caller();
        let trail = TrailExtractor::new().from_location(here);
        assert_eq!(trail.line(), Some(here.line()));
        assert!(trail.scope().is_none());
    }
}
