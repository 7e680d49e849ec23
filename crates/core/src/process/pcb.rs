//! Process Control Block: per-process runtime state and its legal transitions.

use crate::common::error::RuntimeError;

/// Lifecycle state of a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessState {
    /// Built by the process builder, not yet admitted.
    New,
    /// Admitted, waiting for the executor.
    Ready,
    /// Currently dispatched.
    Running,
    /// Blocked on a device or otherwise suspended.
    Waiting,
    /// `A{finish}` has executed.
    Terminated,
}

impl ProcessState {
    fn label(self) -> &'static str {
        match self {
            Self::New => "NEW",
            Self::Ready => "READY",
            Self::Running => "RUNNING",
            Self::Waiting => "WAITING",
            Self::Terminated => "TERMINATED",
        }
    }

    fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::New, Self::Ready)
                | (Self::Ready, Self::Running)
                | (Self::Running, Self::Waiting)
                | (Self::Waiting, Self::Ready)
                | (Self::Running, Self::Ready)
                | (Self::Running, Self::Terminated)
        )
    }
}

/// Per-process control block.
#[derive(Debug, Clone)]
pub struct Pcb {
    /// 1-based process id, in admission order.
    pub pid: u32,
    /// Current lifecycle state.
    pub state: ProcessState,
    /// Milliseconds accumulated in the current simulation, refreshed by the executor.
    pub process_duration_ms: u64,
    /// Set by the scheduler when this process must yield; cleared once the executor
    /// acknowledges it.
    pub interrupt_pending: bool,
    /// Sticky flag: `true` once this process has been preempted at least once.
    pub interrupt_ever_occurred: bool,
    /// Elapsed ms inside the current `P{run}` burst at the moment of preemption.
    pub saved_running_time_ms: u32,
    /// Remaining estimated total ms of work, decremented as instructions complete;
    /// drives STR's re-sort.
    pub estimated_time_remaining_ms: u32,
    /// Count of hard-drive acquisitions by this process, used to pick `used mod capacity`.
    pub hard_drives_used: u32,
    /// Count of projector acquisitions by this process.
    pub projectors_used: u32,
    /// Number of memory blocks allocated to this process.
    pub block_count: u32,
    /// Last address handed out by the memory cursor for this process.
    pub last_address: u32,
    /// Index into the process's instruction list of the next instruction to execute;
    /// lets a preempted process resume instead of restarting.
    pub resume_index: usize,
    /// Elapsed seconds on the run clock when `A{begin}` first executed.
    pub start_time_secs: Option<f64>,
}

impl Pcb {
    /// Creates a freshly built PCB in the [`ProcessState::New`] state.
    #[must_use]
    pub fn new(pid: u32, estimated_total_ms: u32) -> Self {
        Self {
            pid,
            state: ProcessState::New,
            process_duration_ms: 0,
            interrupt_pending: false,
            interrupt_ever_occurred: false,
            saved_running_time_ms: 0,
            estimated_time_remaining_ms: estimated_total_ms,
            hard_drives_used: 0,
            projectors_used: 0,
            block_count: 0,
            last_address: 0,
            resume_index: 0,
            start_time_secs: None,
        }
    }

    /// Attempts a state transition, validating it against the legal state graph.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError::IllegalTransition`] if `next` is not reachable from the
    /// current state.
    pub fn transition(&mut self, next: ProcessState) -> Result<(), RuntimeError> {
        if !self.state.can_transition_to(next) {
            return Err(RuntimeError::IllegalTransition {
                pid: self.pid,
                from: self.state.label().to_string(),
                to: next.label().to_string(),
            });
        }
        self.state = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legal_lifecycle_transitions_succeed() {
        let mut pcb = Pcb::new(1, 100);
        pcb.transition(ProcessState::Ready).expect("new->ready");
        pcb.transition(ProcessState::Running).expect("ready->running");
        pcb.transition(ProcessState::Waiting).expect("running->waiting");
        pcb.transition(ProcessState::Ready).expect("waiting->ready");
        pcb.transition(ProcessState::Running).expect("ready->running");
        pcb.transition(ProcessState::Terminated).expect("running->terminated");
    }

    #[test]
    fn illegal_transition_is_rejected() {
        let mut pcb = Pcb::new(1, 100);
        let err = pcb.transition(ProcessState::Running).unwrap_err();
        assert!(matches!(err, RuntimeError::IllegalTransition { pid: 1, .. }));
    }
}
