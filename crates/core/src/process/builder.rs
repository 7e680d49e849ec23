//! Splits a meta-data instruction stream into independent processes.

use crate::common::error::RuntimeError;
use crate::metadata::Instruction;
use crate::process::pcb::Pcb;

/// One process: its bracketed instruction slice, its estimate, and its PCB.
#[derive(Debug, Clone)]
pub struct Process {
    /// 1-based, in admission order.
    pub pid: u32,
    /// The instructions from `A{begin}` through `A{finish}`, inclusive.
    pub instructions: Vec<Instruction>,
    /// `Σ instruction.total_ms` over `instructions`.
    pub estimated_total_ms: u32,
    /// Runtime state.
    pub pcb: Pcb,
}

impl Process {
    /// Count of `I`/`O` instructions, used by the priority policy.
    #[must_use]
    pub fn io_instruction_count(&self) -> usize {
        self.instructions
            .iter()
            .filter(|i| matches!(i.code, 'I' | 'O'))
            .count()
    }
}

/// A parsed program: the system-level bracket instructions plus the processes they
/// enclose.
#[derive(Debug, Clone)]
pub struct Program {
    /// The leading `S{begin}` instruction.
    pub system_begin: Instruction,
    /// Every process, in program order (admission order).
    pub processes: Vec<Process>,
    /// The trailing `S{finish}` instruction.
    pub system_finish: Instruction,
}

/// Builds a [`Program`] from a flat instruction stream.
///
/// # Errors
///
/// Returns [`RuntimeError::MalformedProgramStructure`] if the stream does not bracket
/// correctly as `S{begin}` (`A{begin}` … `A{finish}`)* `S{finish}`.
pub fn build(instructions: &[Instruction]) -> Result<Program, RuntimeError> {
    let mut iter = instructions.iter().peekable();

    let system_begin = iter
        .next()
        .filter(|i| i.code == 'S' && i.descriptor == "begin")
        .cloned()
        .ok_or_else(|| {
            RuntimeError::MalformedProgramStructure("stream must open with S{begin}".to_string())
        })?;

    let mut processes = Vec::new();
    while let Some(next) = iter.peek() {
        if next.code == 'S' && next.descriptor == "finish" {
            break;
        }

        let head = iter.next().expect("peeked Some above");
        if !(head.code == 'A' && head.descriptor == "begin") {
            return Err(RuntimeError::MalformedProgramStructure(format!(
                "expected A{{begin}} to open process {}, found {}{{{}}}",
                processes.len() + 1,
                head.code,
                head.descriptor
            )));
        }

        let pid = (processes.len() + 1) as u32;
        let mut chunk = vec![head.clone()];
        let mut closed = false;
        for instr in iter.by_ref() {
            chunk.push(instr.clone());
            if instr.code == 'A' && instr.descriptor == "finish" {
                closed = true;
                break;
            }
        }
        if !closed {
            return Err(RuntimeError::MalformedProgramStructure(format!(
                "process {pid} is missing its A{{finish}}"
            )));
        }

        let estimated_total_ms = chunk.iter().map(|i| i.total_ms).sum();
        processes.push(Process {
            pid,
            instructions: chunk,
            estimated_total_ms,
            pcb: Pcb::new(pid, estimated_total_ms),
        });
    }

    let system_finish = iter
        .next()
        .filter(|i| i.code == 'S' && i.descriptor == "finish")
        .cloned()
        .ok_or_else(|| {
            RuntimeError::MalformedProgramStructure("stream must close with S{finish}".to_string())
        })?;

    if iter.next().is_some() {
        return Err(RuntimeError::MalformedProgramStructure(
            "instructions found after S{finish}".to_string(),
        ));
    }

    Ok(Program {
        system_begin,
        processes,
        system_finish,
    })
}
