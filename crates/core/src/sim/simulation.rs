//! Top-level wiring: loads a config, builds the program, and runs it to completion.

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use crate::common::error::SimError;
use crate::common::Clock;
use crate::config::Config;
use crate::memory::MemoryCursor;
use crate::metadata;
use crate::process::{self, Process};
use crate::resources::ResourceManager;
use crate::scheduler::Scheduler;
use crate::sim::executor::{DispatchOutcome, Executor};
use crate::sim::loader::{Loader, DEFAULT_ADMISSION_INTERVAL_MS};
use crate::sim::logger::Logger;

/// One fully wired simulation run, built from a single config file.
pub struct Simulation {
    config: Config,
    clock: Clock,
    logger: Arc<Logger>,
    resources: Arc<ResourceManager>,
    memory: Arc<MemoryCursor>,
    scheduler: Arc<Mutex<Scheduler>>,
    processes: Arc<Mutex<HashMap<u32, Process>>>,
    interrupt_flags: Arc<HashMap<u32, Arc<AtomicBool>>>,
    system_begin: crate::metadata::Instruction,
    system_finish: crate::metadata::Instruction,
}

impl Simulation {
    /// Loads the configuration at `config_path`, then the meta-data program it
    /// references, and builds every process.
    ///
    /// # Errors
    ///
    /// Returns [`SimError`] on any config/meta-data parse failure or malformed program
    /// structure.
    pub fn load(config_path: &Path) -> Result<Self, SimError> {
        let config = Config::load(config_path)?;
        let clock = Clock::start();
        let logger = Arc::new(Logger::new(clock.clone(), config.log_sink, &config.log_file_path)?);

        let metadata_text =
            std::fs::read_to_string(&config.metadata_file_path).map_err(|source| SimError::Io {
                path: config.metadata_file_path.clone(),
                source,
            })?;
        let instructions = metadata::parse(&metadata_text, &config)?;
        let program = process::build(&instructions)?;

        let resources = Arc::new(ResourceManager::new(
            config.hard_drive_quantity,
            config.projector_quantity,
        ));
        let memory = Arc::new(MemoryCursor::new(
            config.system_memory_kbytes,
            config.memory_block_size_kbytes,
        ));

        let waiting_pids: Vec<u32> = program.processes.iter().map(|p| p.pid).collect();
        let interrupt_flags: HashMap<u32, Arc<AtomicBool>> = waiting_pids
            .iter()
            .map(|pid| (*pid, Arc::new(AtomicBool::new(false))))
            .collect();
        let processes: HashMap<u32, Process> =
            program.processes.into_iter().map(|p| (p.pid, p)).collect();

        let scheduler = Scheduler::new(config.scheduling_policy, config.quantum_ms, waiting_pids);

        tracing::info!(
            processes = processes.len(),
            policy = ?config.scheduling_policy,
            "program built, ready to run"
        );

        Ok(Self {
            system_begin: program.system_begin,
            system_finish: program.system_finish,
            config,
            clock,
            logger,
            resources,
            memory,
            scheduler: Arc::new(Mutex::new(scheduler)),
            processes: Arc::new(Mutex::new(processes)),
            interrupt_flags: Arc::new(interrupt_flags),
        })
    }

    /// Runs the simulation to completion: the system-begin bracket, every process in
    /// scheduler order, then the system-finish bracket.
    ///
    /// # Errors
    ///
    /// Returns [`SimError`] if a runtime invariant is violated mid-run.
    pub fn run(&self) -> Result<(), SimError> {
        let executor = Executor {
            clock: &self.clock,
            resources: &self.resources,
            memory: &self.memory,
            logger: &self.logger,
            scheduler: &self.scheduler,
            processes: &self.processes,
            policy: self.config.scheduling_policy,
            quantum_ms: self.config.quantum_ms,
        };
        executor.handle_system(&self.system_begin);

        let loader = Loader::new(
            Arc::clone(&self.scheduler),
            Arc::clone(&self.processes),
            Arc::clone(&self.interrupt_flags),
            Arc::clone(&self.logger),
            DEFAULT_ADMISSION_INTERVAL_MS,
        );
        let loader_handle = thread::spawn(move || loader.run());

        loop {
            let next_pid = {
                let mut scheduler = self
                    .scheduler
                    .lock()
                    .unwrap_or_else(std::sync::PoisonError::into_inner);
                scheduler.pop_ready()
            };

            let Some(pid) = next_pid else {
                let done = {
                    let scheduler = self
                        .scheduler
                        .lock()
                        .unwrap_or_else(std::sync::PoisonError::into_inner);
                    scheduler.waiting_is_empty()
                };
                if done {
                    break;
                }
                thread::sleep(Duration::from_millis(5));
                continue;
            };

            let mut process = {
                let mut processes = self
                    .processes
                    .lock()
                    .unwrap_or_else(std::sync::PoisonError::into_inner);
                processes
                    .remove(&pid)
                    .expect("a pid popped from ready must be present in the process table")
            };

            let flag = Arc::clone(&self.interrupt_flags[&pid]);
            tracing::debug!(pid, "dispatching process");
            let outcome = executor.dispatch(&mut process, &flag)?;
            tracing::debug!(pid, ?outcome, "dispatch returned");

            {
                // Always acquire `scheduler` before `processes`, matching the loader
                // thread's order (`loader.rs`), to avoid an AB-BA lock inversion.
                let pcb_terminated = process.pcb.state == crate::process::ProcessState::Terminated;
                let should_requeue = outcome == DispatchOutcome::Preempted && !pcb_terminated;

                if should_requeue {
                    let mut scheduler = self
                        .scheduler
                        .lock()
                        .unwrap_or_else(std::sync::PoisonError::into_inner);
                    let mut processes = self
                        .processes
                        .lock()
                        .unwrap_or_else(std::sync::PoisonError::into_inner);
                    processes.insert(pid, process);
                    scheduler.requeue(pid, &processes);
                } else {
                    let mut processes = self
                        .processes
                        .lock()
                        .unwrap_or_else(std::sync::PoisonError::into_inner);
                    processes.insert(pid, process);
                }
            }
        }

        loader_handle.join().expect("loader thread does not panic");
        executor.handle_system(&self.system_finish);
        tracing::info!("simulation run complete");
        Ok(())
    }
}
