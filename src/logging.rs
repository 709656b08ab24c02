//! Structured logging for the client
//!
//! Every operation reports what it did through a [`Logger`]: an append-only
//! sink of (category, level, message) entries. The default sink forwards to
//! `tracing`, so host applications that already run a subscriber see client
//! activity with no extra wiring. Log output is strictly an observability
//! side channel; nothing in the client reads it back.

use std::fmt;
use std::sync::{Arc, Mutex};

use tracing_subscriber::{fmt::format::FmtSpan, EnvFilter};

/// Subsystem a log entry belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogCategory {
    Configuration,
    Network,
    Analytics,
    Device,
    Lifecycle,
}

impl LogCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogCategory::Configuration => "configuration",
            LogCategory::Network => "network",
            LogCategory::Analytics => "analytics",
            LogCategory::Device => "device",
            LogCategory::Lifecycle => "lifecycle",
        }
    }
}

impl fmt::Display for LogCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity of a log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Log,
    Success,
    Warning,
    Error,
}

/// Destination for log entries
///
/// Implementations must not panic and must not block the caller meaningfully.
pub trait LogSink: Send + Sync {
    fn emit(&self, category: LogCategory, level: LogLevel, message: &str);
}

/// Default sink: forwards entries to `tracing`
pub struct TracingSink;

impl LogSink for TracingSink {
    fn emit(&self, category: LogCategory, level: LogLevel, message: &str) {
        match level {
            LogLevel::Log => {
                tracing::info!(category = category.as_str(), "{message}");
            }
            LogLevel::Success => {
                tracing::info!(category = category.as_str(), status = "success", "{message}");
            }
            LogLevel::Warning => {
                tracing::warn!(category = category.as_str(), "{message}");
            }
            LogLevel::Error => {
                tracing::error!(category = category.as_str(), "{message}");
            }
        }
    }
}

/// Categorized, leveled logger shared by every client component
#[derive(Clone)]
pub struct Logger {
    sink: Arc<dyn LogSink>,
}

impl Default for Logger {
    fn default() -> Self {
        Self::new(Arc::new(TracingSink))
    }
}

impl Logger {
    pub fn new(sink: Arc<dyn LogSink>) -> Self {
        Self { sink }
    }

    pub fn log(&self, category: LogCategory, message: impl AsRef<str>) {
        self.sink.emit(category, LogLevel::Log, message.as_ref());
    }

    pub fn success(&self, category: LogCategory, message: impl AsRef<str>) {
        self.sink.emit(category, LogLevel::Success, message.as_ref());
    }

    pub fn warning(&self, category: LogCategory, message: impl AsRef<str>) {
        self.sink.emit(category, LogLevel::Warning, message.as_ref());
    }

    pub fn error(&self, category: LogCategory, message: impl AsRef<str>) {
        self.sink.emit(category, LogLevel::Error, message.as_ref());
    }
}

/// One recorded log entry
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub category: LogCategory,
    pub level: LogLevel,
    pub message: String,
}

/// In-memory sink for asserting on log output in tests
#[derive(Default)]
pub struct MemorySink {
    entries: Mutex<Vec<LogEntry>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all recorded entries, in emission order
    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }

    /// Number of entries at the given category and level
    pub fn count(&self, category: LogCategory, level: LogLevel) -> usize {
        self.entries()
            .iter()
            .filter(|e| e.category == category && e.level == level)
            .count()
    }
}

impl LogSink for MemorySink {
    fn emit(&self, category: LogCategory, level: LogLevel, message: &str) {
        self.entries
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push(LogEntry {
                category,
                level,
                message: message.to_string(),
            });
    }
}

/// Initialize tracing for tests (logs to the test writer)
pub fn init_test() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .with_span_events(FmtSpan::CLOSE)
        .try_init();
}
