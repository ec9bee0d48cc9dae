use crate::action::Action;
use crate::state::State;
use std::collections::VecDeque;

/// Work item processed by the store's single writer.
pub(crate) enum Job {
    Dispatch(Action),
    Reset(State),
}

impl Job {
    /// Action type, or `reset`.
    pub fn label(&self) -> &str {
        match self {
            Job::Dispatch(action) => action.action_type(),
            Job::Reset(_) => "reset",
        }
    }
}

/// FIFO of pending jobs plus the flag telling whether some caller is
/// currently draining it.
#[derive(Default)]
pub(crate) struct DispatchQueue {
    pending: VecDeque<Job>,
    draining: bool,
}

impl DispatchQueue {
    /// Enqueue a job; returns `true` if the caller must drain the queue.
    pub fn push(&mut self, job: Job) -> bool {
        self.pending.push_back(job);
        if self.draining {
            false
        } else {
            self.draining = true;
            true
        }
    }

    /// Next job to run. Releases the drain role once the queue is empty.
    pub fn next(&mut self) -> Option<Job> {
        let job = self.pending.pop_front();
        if job.is_none() {
            self.draining = false;
        }
        job
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }
}
