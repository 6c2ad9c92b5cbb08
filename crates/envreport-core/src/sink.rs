//! Logging sinks and the scoped INFO writer.

use std::fmt::{self, Display};
use std::sync::{Arc, Mutex};

/// Continuation and nested-line indentation.
pub const NESTED_INDENT: &str = "      ";

/// Destination of report blocks.
///
/// Shared by every unit of one reporter; implementations must tolerate
/// concurrent calls.
pub trait LogSink: Send + Sync {
    /// Logger name the sink writes under.
    fn name(&self) -> &str;

    fn is_info_enabled(&self) -> bool;

    /// Writes one complete block at INFO.
    fn info(&self, text: &str);

    /// Reports a non-fatal internal failure.
    fn warn(&self, message: &str, error: Option<&dyn std::error::Error>);
}

/// Sink writing through `tracing`, tagging events with a `logger` field.
#[derive(Debug, Clone)]
pub struct TracingSink {
    name: String,
}

impl TracingSink {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl LogSink for TracingSink {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_info_enabled(&self) -> bool {
        tracing::enabled!(tracing::Level::INFO)
    }

    fn info(&self, text: &str) {
        tracing::info!(logger = %self.name, "{}", text);
    }

    fn warn(&self, message: &str, error: Option<&dyn std::error::Error>) {
        match error {
            Some(e) => tracing::warn!(logger = %self.name, error = %e, "{}", message),
            None => tracing::warn!(logger = %self.name, "{}", message),
        }
    }
}

/// Severity of a captured event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Warn,
}

/// One event recorded by [`CapturingSink`].
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedEvent {
    pub level: Level,
    pub text: String,
    /// Display form of the attached error, for warnings.
    pub error: Option<String>,
}

/// In-memory sink for tests and embedding hosts.
#[derive(Debug)]
pub struct CapturingSink {
    name: String,
    info_enabled: bool,
    events: Mutex<Vec<CapturedEvent>>,
}

impl CapturingSink {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            info_enabled: true,
            events: Mutex::new(Vec::new()),
        }
    }

    /// A sink whose INFO level is switched off.
    pub fn info_disabled(name: impl Into<String>) -> Self {
        Self {
            info_enabled: false,
            ..Self::new(name)
        }
    }

    /// All events so far, in arrival order.
    pub fn events(&self) -> Vec<CapturedEvent> {
        self.lock().clone()
    }

    /// Texts of INFO events.
    pub fn infos(&self) -> Vec<String> {
        self.texts(Level::Info)
    }

    /// Messages of WARN events.
    pub fn warnings(&self) -> Vec<String> {
        self.texts(Level::Warn)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn texts(&self, level: Level) -> Vec<String> {
        self.lock()
            .iter()
            .filter(|e| e.level == level)
            .map(|e| e.text.clone())
            .collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<CapturedEvent>> {
        self.events.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn push(&self, event: CapturedEvent) {
        self.lock().push(event);
    }
}

impl LogSink for CapturingSink {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_info_enabled(&self) -> bool {
        self.info_enabled
    }

    fn info(&self, text: &str) {
        self.push(CapturedEvent {
            level: Level::Info,
            text: text.to_string(),
            error: None,
        });
    }

    fn warn(&self, message: &str, error: Option<&dyn std::error::Error>) {
        self.push(CapturedEvent {
            level: Level::Warn,
            text: message.to_string(),
            error: error.map(|e| e.to_string()),
        });
    }
}

/// Scoped INFO channel.
///
/// Buffers one block and hands it to the sink exactly once: on [`close`]
/// or when dropped, unwinding included.
///
/// [`close`]: InfoWriter::close
pub struct InfoWriter {
    sink: Arc<dyn LogSink>,
    buffer: String,
    closed: bool,
}

impl InfoWriter {
    /// Opens a writer, or returns `None` when INFO is disabled on the sink.
    pub fn open(sink: &Arc<dyn LogSink>) -> Option<Self> {
        if !sink.is_info_enabled() {
            return None;
        }
        Some(Self {
            sink: Arc::clone(sink),
            buffer: String::new(),
            closed: false,
        })
    }

    /// The sink this writer emits to.
    pub fn sink(&self) -> &Arc<dyn LogSink> {
        &self.sink
    }

    /// Appends one raw line.
    pub fn line(&mut self, text: impl AsRef<str>) {
        if !self.buffer.is_empty() {
            self.buffer.push('\n');
        }
        self.buffer.push_str(text.as_ref());
    }

    /// `Title:`
    pub fn title(&mut self, title: &str) {
        self.line(format!("{}:", title));
    }

    /// `  - key: value`
    pub fn entry(&mut self, key: &str, value: impl Display) {
        self.line(format!("  - {}: {}", key, value));
    }

    /// `  - text`
    pub fn item(&mut self, text: impl Display) {
        self.line(format!("  - {}", text));
    }

    /// Six-space indented `key: value` under the previous entry.
    pub fn nested(&mut self, key: &str, value: impl Display) {
        self.line(format!("{}{}: {}", NESTED_INDENT, key, value));
    }

    /// Six-space indented free text under the previous entry.
    pub fn nested_item(&mut self, text: impl Display) {
        self.line(format!("{}{}", NESTED_INDENT, text));
    }

    /// `  - key: a, b, c` continued on six-space indented lines every
    /// `per_line` items; `none` when `items` is empty.
    pub fn wrapped<S: AsRef<str>>(&mut self, key: &str, items: &[S], per_line: usize) {
        let lines = crate::fmt::wrapped_list(items, per_line);
        let mut lines = lines.into_iter();
        match lines.next() {
            Some(first) => self.entry(key, first),
            None => self.entry(key, "none"),
        }
        for rest in lines {
            self.nested_item(rest);
        }
    }

    /// Text buffered so far.
    pub fn text(&self) -> &str {
        &self.buffer
    }

    /// Emits the block now.
    pub fn close(mut self) {
        self.flush();
    }

    fn flush(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.sink.info(&self.buffer);
    }
}

impl fmt::Write for InfoWriter {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.buffer.push_str(s);
        Ok(())
    }
}

impl Drop for InfoWriter {
    fn drop(&mut self) {
        self.flush();
    }
}

impl fmt::Debug for InfoWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InfoWriter")
            .field("sink", &self.sink.name())
            .field("closed", &self.closed)
            .finish()
    }
}
