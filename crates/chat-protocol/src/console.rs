//! Display contract for whatever renders text to a human.

use std::io::Write;

use parking_lot::Mutex;

/// Receives every line meant for the local user or operator.
pub trait Console: Send + Sync {
    fn display(&self, text: &str);
}

/// Writes each line to stdout.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutConsole;

impl Console for StdoutConsole {
    fn display(&self, text: &str) {
        let mut out = std::io::stdout().lock();
        // A closed stdout has nowhere to report to.
        let _ = writeln!(out, "{text}");
        let _ = out.flush();
    }
}

/// Keeps displayed lines in memory, for embedding and tests.
#[derive(Debug, Default)]
pub struct BufferConsole {
    lines: Mutex<Vec<String>>,
}

impl BufferConsole {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }

    pub fn last(&self) -> Option<String> {
        self.lines.lock().last().cloned()
    }

    pub fn contains(&self, text: &str) -> bool {
        self.lines.lock().iter().any(|line| line == text)
    }

    pub fn clear(&self) {
        self.lines.lock().clear();
    }
}

impl Console for BufferConsole {
    fn display(&self, text: &str) {
        self.lines.lock().push(text.to_owned());
    }
}
