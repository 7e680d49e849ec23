//! Process model: the PCB state machine and the program-to-processes builder.

pub mod builder;
pub mod pcb;

pub use builder::{build, Process, Program};
pub use pcb::{Pcb, ProcessState};
