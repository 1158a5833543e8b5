//! FIFO of jobs waiting for the runner.
//!
//! Owned by the controller and mutated only from its task, so there is no
//! internal locking: a job handed to the runner has already left the queue
//! and `clear` cannot reach it.

use std::collections::VecDeque;

use crate::job::JobDescriptor;

#[derive(Debug, Default)]
pub struct JobQueue {
    pending: VecDeque<JobDescriptor>,
}

impl JobQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a job at the tail.
    pub fn enqueue(&mut self, job: JobDescriptor) {
        self.pending.push_back(job);
    }

    /// Discards every pending job; returns how many were dropped.
    pub fn clear(&mut self) -> usize {
        let dropped = self.pending.len();
        self.pending.clear();
        dropped
    }

    /// Removes and returns the oldest job.
    pub fn pop_front(&mut self) -> Option<JobDescriptor> {
        self.pending.pop_front()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Pending jobs, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &JobDescriptor> {
        self.pending.iter()
    }
}
