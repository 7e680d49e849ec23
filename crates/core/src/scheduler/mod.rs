//! The scheduler: owns the waiting/ready/blocked queues and applies the configured
//! policy's ordering rules.
//!
//! Callers (the loader and the executor) are expected to hold this behind a single
//! mutex per run — the "scheduler lock" described in the concurrency model — and to
//! never hold it across a device acquisition.

pub mod policy;

use std::collections::{HashMap, HashSet, VecDeque};

use crate::config::SchedulingPolicy;
use crate::process::Process;

/// Owns the three process queues for one simulation run.
#[derive(Debug)]
pub struct Scheduler {
    policy: SchedulingPolicy,
    quantum_ms: u32,
    waiting: VecDeque<u32>,
    ready: Vec<u32>,
    blocked: HashSet<u32>,
}

impl Scheduler {
    /// Creates a scheduler with every process initially in `waiting`, in admission
    /// (pid) order.
    #[must_use]
    pub fn new(policy: SchedulingPolicy, quantum_ms: u32, waiting: Vec<u32>) -> Self {
        Self {
            policy,
            quantum_ms,
            waiting: waiting.into_iter().collect(),
            ready: Vec::new(),
            blocked: HashSet::new(),
        }
    }

    /// The configured processor quantum, meaningful only under [`SchedulingPolicy::RoundRobin`].
    #[must_use]
    pub fn quantum_ms(&self) -> u32 {
        self.quantum_ms
    }

    /// `true` once every process has been admitted out of `waiting`.
    #[must_use]
    pub fn waiting_is_empty(&self) -> bool {
        self.waiting.is_empty()
    }

    /// Moves the next waiting process into `ready`, applying the policy's insertion
    /// rule. Returns the admitted pid, and — under STR — the previous ready head if
    /// admission changed it (the executor must preempt that process).
    pub fn admit_next(&mut self, processes: &HashMap<u32, Process>) -> Option<(u32, Option<u32>)> {
        let pid = self.waiting.pop_front()?;
        let preempt = self.insert_ready(pid, processes);
        Some((pid, preempt))
    }

    /// Returns a process blocked on a device to `ready`. Returns the previous ready
    /// head under STR if this completion should preempt the running process.
    pub fn device_completion(&mut self, pid: u32, processes: &HashMap<u32, Process>) -> Option<u32> {
        self.blocked.remove(&pid);
        self.insert_ready(pid, processes)
    }

    /// Marks `pid` as blocked on a device, removing it from consideration until
    /// [`Scheduler::device_completion`] is called for it.
    pub fn mark_blocked(&mut self, pid: u32) {
        self.blocked.insert(pid);
    }

    /// Re-admits a preempted or quantum-expired process back into `ready`.
    pub fn requeue(&mut self, pid: u32, processes: &HashMap<u32, Process>) {
        self.insert_ready(pid, processes);
    }

    /// Pops the current ready head, if any.
    pub fn pop_ready(&mut self) -> Option<u32> {
        if self.ready.is_empty() {
            None
        } else {
            Some(self.ready.remove(0))
        }
    }

    /// The current ready head without removing it.
    #[must_use]
    pub fn peek_ready(&self) -> Option<u32> {
        self.ready.first().copied()
    }

    fn insert_ready(&mut self, pid: u32, processes: &HashMap<u32, Process>) -> Option<u32> {
        let old_head = self.ready.first().copied();
        match self.policy {
            SchedulingPolicy::Fifo | SchedulingPolicy::RoundRobin => self.ready.push(pid),
            SchedulingPolicy::Priority => {
                self.ready.push(pid);
                policy::resort(self.policy, &mut self.ready, processes);
            }
            SchedulingPolicy::Sjf => {
                policy::insert_on_admission(self.policy, &mut self.ready, pid, processes);
            }
            SchedulingPolicy::Str => {
                self.ready.push(pid);
                policy::resort(self.policy, &mut self.ready, processes);
            }
        }
        let new_head = self.ready.first().copied();
        if self.policy == SchedulingPolicy::Str && old_head.is_some() && new_head != old_head {
            old_head
        } else {
            None
        }
    }
}
