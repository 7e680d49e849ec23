//! Admission loader: periodically promotes one process from `waiting` to `ready`.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use crate::process::Process;
use crate::scheduler::Scheduler;
use crate::sim::logger::Logger;

/// Default simulated interval, in milliseconds, between successive admissions.
pub const DEFAULT_ADMISSION_INTERVAL_MS: u64 = 100;

/// Runs the admission loop until `waiting` is empty, one thread per simulation run.
pub struct Loader {
    scheduler: Arc<Mutex<Scheduler>>,
    processes: Arc<Mutex<HashMap<u32, Process>>>,
    interrupt_flags: Arc<HashMap<u32, Arc<AtomicBool>>>,
    logger: Arc<Logger>,
    admission_interval_ms: u64,
}

impl Loader {
    /// Creates a loader bound to the shared scheduler, process table, and interrupt
    /// flags for one simulation run.
    #[must_use]
    pub fn new(
        scheduler: Arc<Mutex<Scheduler>>,
        processes: Arc<Mutex<HashMap<u32, Process>>>,
        interrupt_flags: Arc<HashMap<u32, Arc<AtomicBool>>>,
        logger: Arc<Logger>,
        admission_interval_ms: u64,
    ) -> Self {
        Self {
            scheduler,
            processes,
            interrupt_flags,
            logger,
            admission_interval_ms,
        }
    }

    /// Runs the admission loop on the calling thread until `waiting` is exhausted.
    pub fn run(&self) {
        loop {
            thread::sleep(Duration::from_millis(self.admission_interval_ms));

            let mut scheduler = self
                .scheduler
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            if scheduler.waiting_is_empty() {
                break;
            }

            let processes = self
                .processes
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            let admitted = scheduler.admit_next(&processes);
            drop(processes);
            drop(scheduler);

            let Some((pid, preempt_target)) = admitted else {
                break;
            };
            self.logger.log(&format!("OS: arrival of process {pid}"));

            if let Some(previous_head) = preempt_target {
                if let Some(flag) = self.interrupt_flags.get(&previous_head) {
                    flag.store(true, Ordering::SeqCst);
                }
            }
        }
    }
}
