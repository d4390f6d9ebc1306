//! Bounded log of operator-visible warnings, shown at the bottom of the page.

use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};

/// Default number of messages retained.
pub const DEFAULT_CAPACITY: usize = 255;

/// A single timestamped message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogMessage {
    pub at: DateTime<Utc>,
    pub text: String,
}

impl fmt::Display for LogMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.at.format("%Y-%m-%d %H:%M:%S UTC"), self.text)
    }
}

/// Shared FIFO ring buffer of messages. Clones share the same buffer.
#[derive(Debug, Clone)]
pub struct MessageLog {
    entries: Arc<Mutex<VecDeque<LogMessage>>>,
    capacity: usize,
}

impl MessageLog {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// A log holding at most `capacity` messages. A capacity of zero keeps
    /// nothing and only forwards to `tracing`.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))),
            capacity,
        }
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<LogMessage>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append a warning, evicting the oldest message when full.
    pub fn warn(&self, text: impl Into<String>) {
        let text = text.into();
        tracing::warn!("{}", text);

        if self.capacity == 0 {
            return;
        }

        let message = LogMessage {
            at: Utc::now(),
            text,
        };
        let mut entries = self.lock();
        while entries.len() >= self.capacity {
            entries.pop_front();
        }
        entries.push_back(message);
    }

    /// Snapshot of all messages, oldest first.
    pub fn entries(&self) -> Vec<LogMessage> {
        self.lock().iter().cloned().collect()
    }

    /// Formatted messages, oldest first.
    pub fn list(&self) -> Vec<String> {
        self.lock().iter().map(ToString::to_string).collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for MessageLog {
    fn default() -> Self {
        Self::new()
    }
}
