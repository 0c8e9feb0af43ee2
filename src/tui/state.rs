//! Log capture for the TUI.

use std::collections::VecDeque;
use std::io::{self, Write};
use std::sync::{Arc, Mutex};
use tracing_subscriber::fmt::MakeWriter;

/// In-memory ring of formatted log lines.
pub struct LogBuffer {
    lines: Mutex<VecDeque<String>>,
    capacity: usize,
}

impl LogBuffer {
    /// Create a new log buffer with a fixed capacity.
    pub fn new(capacity: usize) -> Self {
        Self {
            lines: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    /// Push a line, evicting the oldest past capacity.
    pub fn push_line(&self, line: String) {
        let Ok(mut lines) = self.lines.lock() else {
            return;
        };
        lines.push_back(line);
        while lines.len() > self.capacity {
            lines.pop_front();
        }
    }

    /// Get the most recent lines, up to limit, oldest first.
    pub fn recent(&self, limit: usize) -> Vec<String> {
        let Ok(lines) = self.lines.lock() else {
            return Vec::new();
        };
        let start = lines.len().saturating_sub(limit);
        lines.iter().skip(start).cloned().collect()
    }

    pub fn clear(&self) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.clear();
        }
    }

    pub fn len(&self) -> usize {
        self.lines.lock().map(|l| l.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Writer that splits output into lines for a [`LogBuffer`].
pub struct LogWriter {
    buffer: Arc<LogBuffer>,
    line: Vec<u8>,
}

impl LogWriter {
    fn flush_line(&mut self) {
        if !self.line.is_empty() {
            let line = String::from_utf8_lossy(&self.line).to_string();
            self.buffer.push_line(line);
            self.line.clear();
        }
    }
}

impl Write for LogWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        for &b in buf {
            if b == b'\n' {
                self.flush_line();
            } else {
                self.line.push(b);
            }
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.flush_line();
        Ok(())
    }
}

impl Drop for LogWriter {
    fn drop(&mut self) {
        self.flush_line();
    }
}

/// `MakeWriter` routing tracing output into a [`LogBuffer`].
pub struct LogMakeWriter {
    buffer: Arc<LogBuffer>,
}

impl LogMakeWriter {
    pub fn new(buffer: Arc<LogBuffer>) -> Self {
        Self { buffer }
    }
}

impl<'a> MakeWriter<'a> for LogMakeWriter {
    type Writer = LogWriter;

    fn make_writer(&'a self) -> Self::Writer {
        LogWriter {
            buffer: self.buffer.clone(),
            line: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_evicts_oldest() {
        let buffer = LogBuffer::new(2);
        buffer.push_line("a".into());
        buffer.push_line("b".into());
        buffer.push_line("c".into());
        assert_eq!(buffer.recent(10), vec!["b", "c"]);
        assert_eq!(buffer.recent(1), vec!["c"]);
    }

    #[test]
    fn test_writer_splits_lines() {
        let buffer = Arc::new(LogBuffer::new(10));
        let make = LogMakeWriter::new(buffer.clone());
        {
            let mut writer = make.make_writer();
            writer.write_all(b"first\nsec").unwrap();
            writer.write_all(b"ond\npartial").unwrap();
        }
        assert_eq!(buffer.recent(10), vec!["first", "second", "partial"]);
    }
}
