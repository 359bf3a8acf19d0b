use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Sessions shorter than this are not worth a log entry.
pub const MIN_ENTRY_MINUTES: i64 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeEntry {
    pub task_id: String,
    pub started_at: DateTime<Utc>,
    pub minutes: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Active {
    task_id: String,
    started_at: DateTime<Utc>,
}

/// Tracks time spent on the currently open task document.
#[derive(Debug, Clone, Default)]
pub struct TimeTracker {
    active: Option<Active>,
}

impl TimeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active_task(&self) -> Option<&str> {
        self.active.as_ref().map(|a| a.task_id.as_str())
    }

    pub fn elapsed_minutes(&self, now: DateTime<Utc>) -> i64 {
        self.active
            .as_ref()
            .map(|a| (now - a.started_at).num_minutes())
            .unwrap_or(0)
    }

    /// Starts timing `task_id`, flushing whatever was running before.
    /// Switching to the task already being timed changes nothing.
    pub fn switch_to(&mut self, task_id: &str, now: DateTime<Utc>) -> Option<TimeEntry> {
        if self.active_task() == Some(task_id) {
            return None;
        }
        let flushed = self.flush(now);
        self.active = Some(Active {
            task_id: task_id.to_string(),
            started_at: now,
        });
        flushed
    }

    pub fn stop(&mut self, now: DateTime<Utc>) -> Option<TimeEntry> {
        self.flush(now)
    }

    fn flush(&mut self, now: DateTime<Utc>) -> Option<TimeEntry> {
        let active = self.active.take()?;
        let minutes = (now - active.started_at).num_minutes();
        if minutes < MIN_ENTRY_MINUTES {
            debug!(task = %active.task_id, minutes, "discarding short session");
            return None;
        }
        Some(TimeEntry {
            task_id: active.task_id,
            started_at: active.started_at,
            minutes,
        })
    }
}
