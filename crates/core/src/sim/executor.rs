//! Process Executor: drives one process's instruction stream through its handlers.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use crate::common::error::RuntimeError;
use crate::common::Clock;
use crate::config::SchedulingPolicy;
use crate::memory::{format_address, MemoryCursor};
use crate::metadata::Instruction;
use crate::process::{Process, ProcessState};
use crate::resources::{DeviceKind, ResourceManager};
use crate::scheduler::Scheduler;
use crate::sim::logger::Logger;

/// Tick granularity used while watching for preemption during `P{run}`. Small enough
/// to honor "as soon as the current ms tick is observed" without busy-spinning.
const PREEMPT_POLL_MS: u32 = 5;

/// How a dispatch of one process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Every instruction ran; the process reached `A{finish}` and is TERMINATED.
    Completed,
    /// The process was preempted (interrupt flag observed, or RR quantum expired) and
    /// must be requeued as READY by the caller.
    Preempted,
    /// A device instruction finished but a shorter job became ready while this process
    /// was blocked; the executor has already requeued it as READY itself, so the
    /// caller must not requeue it again.
    Blocked,
}

/// Signals what a single instruction handler did, before the shared post-step
/// bookkeeping (duration/remaining-time accounting) below it decides how to react.
enum StepOutcome {
    Continue,
    PreemptMidInstruction,
    AlreadyRequeued,
}

/// Drives a single process's instructions against the shared device/memory/logger
/// infrastructure, honoring preemption signaled through `interrupt_flag`.
pub struct Executor<'a> {
    /// Clock used to read elapsed time for log lines.
    pub clock: &'a Clock,
    /// Device resource pools.
    pub resources: &'a ResourceManager,
    /// Shared memory cursor.
    pub memory: &'a MemoryCursor,
    /// Single log sink.
    pub logger: &'a Logger,
    /// The shared ready/waiting/blocked queues, consulted around device waits.
    pub scheduler: &'a Mutex<Scheduler>,
    /// The shared process table, consulted alongside `scheduler` for queue resorts.
    pub processes: &'a Mutex<HashMap<u32, Process>>,
    /// The configured scheduling policy; gates whether `quantum_ms` applies.
    pub policy: SchedulingPolicy,
    /// `Config.quantum_ms`; meaningful only under [`SchedulingPolicy::RoundRobin`].
    pub quantum_ms: u32,
}

impl Executor<'_> {
    /// Runs `process` from its current resume point until it completes or is
    /// preempted.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError`] if a handler encounters a descriptor or PCB transition
    /// outside its contract — this indicates a bug in the process builder or parser,
    /// not a user-data error (those are rejected earlier, at parse time).
    pub fn dispatch(
        &self,
        process: &mut Process,
        interrupt_flag: &Arc<AtomicBool>,
    ) -> Result<DispatchOutcome, RuntimeError> {
        process.pcb.transition(ProcessState::Running)?;

        while process.pcb.resume_index < process.instructions.len() {
            let index = process.pcb.resume_index;
            let instruction = process.instructions[index].clone();

            let (step, consumed_ms) = match instruction.code {
                'S' => {
                    self.handle_system(&instruction);
                    (StepOutcome::Continue, 0)
                }
                'A' => {
                    self.handle_application(&instruction, process)?;
                    (StepOutcome::Continue, 0)
                }
                'P' => {
                    let (preempted, ms) = self.handle_processor(&instruction, process, interrupt_flag);
                    let step = if preempted { StepOutcome::PreemptMidInstruction } else { StepOutcome::Continue };
                    (step, ms)
                }
                'M' => {
                    self.handle_memory(&instruction, process);
                    (StepOutcome::Continue, instruction.total_ms)
                }
                'I' => {
                    let pid = process.pid;
                    let yielded = self.handle_device(&instruction, process, Direction::Input, pid)?;
                    let step = if yielded { StepOutcome::AlreadyRequeued } else { StepOutcome::Continue };
                    (step, instruction.total_ms)
                }
                'O' => {
                    let pid = process.pid;
                    let yielded = self.handle_device(&instruction, process, Direction::Output, pid)?;
                    let step = if yielded { StepOutcome::AlreadyRequeued } else { StepOutcome::Continue };
                    (step, instruction.total_ms)
                }
                other => {
                    tracing::error!(
                        pid = process.pid,
                        code = %other,
                        descriptor = %instruction.descriptor,
                        "runtime invariant violated: unrecognized instruction code"
                    );
                    return Err(RuntimeError::UnrecognizedDescriptor {
                        code: other,
                        descriptor: instruction.descriptor.clone(),
                    });
                }
            };

            process.pcb.process_duration_ms += u64::from(consumed_ms);
            process.pcb.estimated_time_remaining_ms =
                process.pcb.estimated_time_remaining_ms.saturating_sub(consumed_ms);

            match step {
                StepOutcome::PreemptMidInstruction => {
                    interrupt_flag.store(false, Ordering::SeqCst);
                    process.pcb.interrupt_pending = false;
                    process.pcb.interrupt_ever_occurred = true;
                    process.pcb.transition(ProcessState::Ready)?;
                    return Ok(DispatchOutcome::Preempted);
                }
                StepOutcome::AlreadyRequeued => {
                    process.pcb.resume_index = index + 1;
                    return Ok(DispatchOutcome::Blocked);
                }
                StepOutcome::Continue => {}
            }

            if interrupt_flag.load(Ordering::SeqCst) && instruction.code != 'P' {
                // Deferred per the concurrency model: device/control steps are not
                // preemptible mid-instruction, so we only honor it now, at the
                // instruction boundary we've just reached.
                interrupt_flag.store(false, Ordering::SeqCst);
                process.pcb.interrupt_pending = false;
                process.pcb.interrupt_ever_occurred = true;
                process.pcb.resume_index = index + 1;
                process.pcb.transition(ProcessState::Ready)?;
                return Ok(DispatchOutcome::Preempted);
            }

            process.pcb.resume_index = index + 1;
        }

        process.pcb.transition(ProcessState::Terminated)?;
        Ok(DispatchOutcome::Completed)
    }

    fn emit(&self, message: &str) {
        self.logger.log(message);
    }

    /// Runs the `S{begin}`/`S{finish}` system brackets, which sit outside any process.
    pub(crate) fn handle_system(&self, instruction: &Instruction) {
        match instruction.descriptor.as_str() {
            "begin" => self.logger.log("Simulator program starting"),
            "finish" => {
                self.logger.log("Simulator program ending");
                self.memory.reset();
            }
            _ => {}
        }
    }

    fn handle_application(
        &self,
        instruction: &Instruction,
        process: &mut Process,
    ) -> Result<(), RuntimeError> {
        match instruction.descriptor.as_str() {
            "begin" => {
                process.pcb.start_time_secs.get_or_insert_with(|| self.clock.elapsed_secs());
                self.emit(&format!("preparing process {}", process.pid));
                self.emit(&format!("starting process {}", process.pid));
            }
            "finish" => {
                self.emit(&format!("End process {}", process.pid));
            }
            other => {
                return Err(RuntimeError::UnrecognizedDescriptor {
                    code: 'A',
                    descriptor: other.to_string(),
                })
            }
        }
        Ok(())
    }

    /// Waits `total_ms`, polling `interrupt_flag` every [`PREEMPT_POLL_MS`] and
    /// additionally capping the burst at the processor quantum under round-robin.
    /// Returns whether the burst was preempted, and the ms actually consumed this call
    /// (the full remaining budget on completion, or just the partial burst otherwise).
    fn handle_processor(
        &self,
        instruction: &Instruction,
        process: &mut Process,
        interrupt_flag: &Arc<AtomicBool>,
    ) -> (bool, u32) {
        self.emit("start processing action");

        let already_elapsed = process.pcb.saved_running_time_ms;
        let remaining = instruction.total_ms.saturating_sub(already_elapsed);
        let quantum_cap = if self.policy == SchedulingPolicy::RoundRobin && self.quantum_ms > 0 {
            self.quantum_ms
        } else {
            u32::MAX
        };

        let mut waited_this_burst = 0u32;
        let mut preempted = false;
        while waited_this_burst < remaining {
            let tick = PREEMPT_POLL_MS.min(remaining - waited_this_burst);
            simulate_wait(tick);
            waited_this_burst += tick;

            if waited_this_burst >= quantum_cap && waited_this_burst < remaining {
                preempted = true;
                break;
            }
            if interrupt_flag.load(Ordering::SeqCst) {
                preempted = true;
                break;
            }
        }

        if preempted {
            process.pcb.saved_running_time_ms = already_elapsed + waited_this_burst;
            self.emit("interrupt processing action");
        } else {
            process.pcb.saved_running_time_ms = 0;
            self.emit("end processing action");
        }
        (preempted, waited_this_burst)
    }

    fn handle_memory(&self, instruction: &Instruction, process: &mut Process) {
        match instruction.descriptor.as_str() {
            "allocate" => {
                simulate_wait(instruction.total_ms);
                let address = self.memory.allocate();
                process.pcb.block_count += 1;
                process.pcb.last_address = address as u32;
                self.emit(&format!("memory allocated at {}", format_address(address)));
            }
            "block" => {
                self.emit("start memory blocking");
                simulate_wait(instruction.total_ms);
                self.emit("end memory blocking");
            }
            _ => {}
        }
    }

    /// Runs an `I`/`O` device instruction to completion, blocking the PCB on the
    /// device for the duration. Returns `true` if, by the time the device finished, a
    /// shorter job had become ready and this process must yield the processor — in
    /// that case the process has already been left in `ready` via
    /// [`Scheduler::device_completion`] and the caller must not requeue it again.
    /// Returns `false` if this process keeps running; the PCB is back in `Running`.
    fn handle_device(
        &self,
        instruction: &Instruction,
        process: &mut Process,
        direction: Direction,
        pid: u32,
    ) -> Result<bool, RuntimeError> {
        let kind = DeviceKind::from_descriptor(&instruction.descriptor)?;
        let verb = direction.verb();

        process.pcb.transition(ProcessState::Waiting)?;
        {
            let mut scheduler = self.scheduler.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
            scheduler.mark_blocked(pid);
        }

        let guard = self.resources.acquire(kind);
        let index_label = match kind {
            DeviceKind::Hdd => {
                let used = process.pcb.hard_drives_used;
                process.pcb.hard_drives_used += 1;
                Some(("HDD", used % self.resources.capacity(DeviceKind::Hdd)))
            }
            DeviceKind::Projector => {
                let used = process.pcb.projectors_used;
                process.pcb.projectors_used += 1;
                Some(("PROJECTOR", used % self.resources.capacity(DeviceKind::Projector)))
            }
            DeviceKind::Keyboard | DeviceKind::Scanner | DeviceKind::Monitor => None,
        };

        let start_message = match index_label {
            Some((label, idx)) => format!("start {} {verb} on {label} {idx}", instruction.descriptor),
            None => format!("start {} {verb}", instruction.descriptor),
        };
        self.emit(&start_message);

        simulate_wait(instruction.total_ms);

        self.emit(&format!("end {} {verb}", instruction.descriptor));
        drop(guard);

        process.pcb.transition(ProcessState::Ready)?;
        let resumes_immediately = {
            let mut scheduler = self.scheduler.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
            let mut processes =
                self.processes.lock().unwrap_or_else(std::sync::PoisonError::into_inner);

            // The remaining-time snapshot used for the resort must reflect this
            // instruction's cost, which the caller hasn't subtracted yet.
            let mut snapshot = process.clone();
            snapshot.pcb.estimated_time_remaining_ms =
                snapshot.pcb.estimated_time_remaining_ms.saturating_sub(instruction.total_ms);
            processes.insert(pid, snapshot);

            scheduler.device_completion(pid, &processes);
            let head_is_self = scheduler.peek_ready() == Some(pid);
            if head_is_self {
                scheduler.pop_ready();
            }
            processes.remove(&pid);
            head_is_self
        };

        if resumes_immediately {
            process.pcb.transition(ProcessState::Running)?;
        }
        Ok(!resumes_immediately)
    }
}

#[derive(Debug, Clone, Copy)]
enum Direction {
    Input,
    Output,
}

impl Direction {
    fn verb(self) -> &'static str {
        match self {
            Self::Input => "input",
            Self::Output => "output",
        }
    }
}

/// Blocks the calling thread for `ms` simulated milliseconds on a short-lived worker
/// thread, so a device operation's wait is attributable to its own thread of control
/// rather than the executor's.
fn simulate_wait(ms: u32) {
    if ms == 0 {
        return;
    }
    thread::spawn(move || thread::sleep(Duration::from_millis(u64::from(ms))))
        .join()
        .expect("wait thread does not panic");
}
