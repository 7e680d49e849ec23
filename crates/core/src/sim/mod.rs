//! Simulation orchestration: logger, executor, loader, and the top-level `Simulation`.

pub mod executor;
pub mod loader;
pub mod logger;
pub mod simulation;

pub use executor::{DispatchOutcome, Executor};
pub use loader::Loader;
pub use logger::Logger;
pub use simulation::Simulation;
