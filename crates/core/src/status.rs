use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

use crate::surface::Surface;

/// Number of entries kept on screen.
pub const STATUS_CAPACITY: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Warn,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusEntry {
    pub level: Level,
    pub time: String,
    pub message: String,
}

impl StatusEntry {
    pub fn render(&self) -> String {
        format!("[{}] {}", self.time, self.message)
    }
}

/// Rolling on-screen log. Every entry also goes to `tracing`.
pub struct StatusLog {
    entries: Mutex<VecDeque<StatusEntry>>,
    surface: Arc<dyn Surface>,
}

impl StatusLog {
    pub fn new(surface: Arc<dyn Surface>) -> Self {
        Self {
            entries: Mutex::new(VecDeque::with_capacity(STATUS_CAPACITY + 1)),
            surface,
        }
    }

    pub fn info(&self, message: impl Into<String>) {
        self.push(Level::Info, message.into());
    }

    pub fn warn(&self, message: impl Into<String>) {
        self.push(Level::Warn, message.into());
    }

    pub fn error(&self, message: impl Into<String>) {
        self.push(Level::Error, message.into());
    }

    pub fn entries(&self) -> Vec<StatusEntry> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.iter().cloned().collect()
    }

    fn push(&self, level: Level, message: String) {
        match level {
            Level::Info => tracing::info!("{}", message),
            Level::Warn => tracing::warn!("{}", message),
            Level::Error => tracing::error!("{}", message),
        }

        let entry = StatusEntry {
            level,
            time: chrono::Local::now().format("%H:%M:%S").to_string(),
            message,
        };
        let snapshot = {
            let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
            entries.push_back(entry);
            while entries.len() > STATUS_CAPACITY {
                entries.pop_front();
            }
            entries.iter().cloned().collect::<Vec<_>>()
        };
        self.surface.show_status(&snapshot);
    }
}
