//! Bounded in-memory record of recent task executions.
//!
//! Owned by the task manager rather than shared globally; callers that need
//! history hold a reference to the manager. Oldest entries are evicted once
//! capacity is reached and reads return newest first.

use crate::project::TaskExecution;
use std::collections::VecDeque;

pub const DEFAULT_CAPACITY: usize = 20;

pub struct TaskHistory {
    entries: VecDeque<TaskExecution>,
    capacity: usize,
}

impl TaskHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Record an execution, evicting the oldest entry at capacity.
    pub fn record(&mut self, execution: TaskExecution) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(execution);
    }

    /// Up to `limit` most recent executions, newest first.
    pub fn recent(&self, limit: usize) -> Vec<&TaskExecution> {
        self.entries.iter().rev().take(limit).collect()
    }

    /// Up to `limit` most recent executions of `task_type`, newest first.
    pub fn recent_of_type(&self, task_type: &str, limit: usize) -> Vec<&TaskExecution> {
        self.entries
            .iter()
            .rev()
            .filter(|t| t.task_type == task_type)
            .take(limit)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for TaskHistory {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
