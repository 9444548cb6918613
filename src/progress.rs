//! Progress reporting for simulation runs
//!
//! The engine emits ordered textual status lines while the pipeline runs so
//! external observers can follow along in real time. The sink abstracts away
//! the transport: the default forwards to `tracing`, and `BufferSink`
//! captures lines for inspection.

use std::sync::Mutex;

use tracing::info;

/// Receives ordered status lines from a running simulation
pub trait ProgressSink: Send + Sync {
    /// Append one status line
    fn log(&self, line: &str);
}

/// Forwards progress lines to the `tracing` pipeline
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl ProgressSink for TracingSink {
    fn log(&self, line: &str) {
        info!("{}", line);
    }
}

/// Captures progress lines in memory
#[derive(Debug, Default)]
pub struct BufferSink {
    lines: Mutex<Vec<String>>,
}

impl BufferSink {
    /// Create an empty buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// All lines logged so far, in order
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().expect("progress lock poisoned").clone()
    }
}

impl ProgressSink for BufferSink {
    fn log(&self, line: &str) {
        self.lines
            .lock()
            .expect("progress lock poisoned")
            .push(line.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_sink_preserves_order() {
        let sink = BufferSink::new();
        sink.log("first");
        sink.log("second");
        assert_eq!(sink.lines(), vec!["first", "second"]);
    }
}
