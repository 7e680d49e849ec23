//! Ordering rules for the five CPU scheduling policies.
//!
//! Each function sorts a slice of pids in place against a lookup of the current
//! process table. Every policy breaks ties by ascending pid (earlier admission wins).

use std::collections::HashMap;

use crate::config::SchedulingPolicy;
use crate::process::Process;

/// Re-sorts `ready` according to `policy`. FIFO and RR are insertion-ordered and are
/// therefore no-ops here; PS and STR are resorted on every call.
pub fn resort(policy: SchedulingPolicy, ready: &mut Vec<u32>, processes: &HashMap<u32, Process>) {
    match policy {
        SchedulingPolicy::Fifo | SchedulingPolicy::RoundRobin | SchedulingPolicy::Sjf => {}
        SchedulingPolicy::Priority => {
            ready.sort_by_key(|pid| {
                let process = &processes[pid];
                (std::cmp::Reverse(process.io_instruction_count()), *pid)
            });
        }
        SchedulingPolicy::Str => {
            ready.sort_by_key(|pid| {
                let process = &processes[pid];
                (process.pcb.estimated_time_remaining_ms, *pid)
            });
        }
    }
}

/// Inserts `pid` into `ready` at the position its policy dictates on admission.
/// FIFO, RR, and STR simply append (STR's ordering is restored by the next
/// [`resort`] call); PS and SJF insert in sorted position immediately.
pub fn insert_on_admission(
    policy: SchedulingPolicy,
    ready: &mut Vec<u32>,
    pid: u32,
    processes: &HashMap<u32, Process>,
) {
    match policy {
        SchedulingPolicy::Fifo | SchedulingPolicy::RoundRobin | SchedulingPolicy::Str => {
            ready.push(pid);
        }
        SchedulingPolicy::Priority => {
            ready.push(pid);
            resort(policy, ready, processes);
        }
        SchedulingPolicy::Sjf => {
            let incoming = processes[&pid].estimated_total_ms;
            let position = ready
                .iter()
                .position(|other| {
                    let other_ms = processes[other].estimated_total_ms;
                    (other_ms, *other) > (incoming, pid)
                })
                .unwrap_or(ready.len());
            ready.insert(position, pid);
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;
    use crate::process::Pcb;

    fn process_with(pid: u32, io_count: usize, estimated_total_ms: u32) -> Process {
        let instructions = (0..io_count)
            .map(|_| crate::metadata::Instruction {
                code: 'I',
                descriptor: "keyboard".to_string(),
                cycles: 1,
                total_ms: 1,
            })
            .collect();
        Process {
            pid,
            instructions,
            estimated_total_ms,
            pcb: Pcb::new(pid, estimated_total_ms),
        }
    }

    /// Each case names the pids with their `(io_count, estimated_total_ms)`, the
    /// policy under test, and the ready order `resort` must produce.
    #[rstest]
    #[case::priority_by_io_density(
        SchedulingPolicy::Priority,
        vec![(1, 2, 10), (2, 5, 10), (3, 2, 10)],
        vec![2, 1, 3],
    )]
    #[case::str_by_remaining_time(
        SchedulingPolicy::Str,
        vec![(1, 0, 50), (2, 0, 10)],
        vec![2, 1],
    )]
    fn resort_orders_ready_by_policy(
        #[case] policy: SchedulingPolicy,
        #[case] specs: Vec<(u32, usize, u32)>,
        #[case] expected: Vec<u32>,
    ) {
        let mut processes = HashMap::new();
        let mut ready = Vec::new();
        for (pid, io_count, estimated_total_ms) in &specs {
            let mut process = process_with(*pid, *io_count, *estimated_total_ms);
            process.pcb.estimated_time_remaining_ms = *estimated_total_ms;
            processes.insert(*pid, process);
            ready.push(*pid);
        }
        resort(policy, &mut ready, &processes);
        assert_eq!(ready, expected);
    }

    #[test]
    fn sjf_inserts_in_sorted_position() {
        let mut processes = HashMap::new();
        processes.insert(1, process_with(1, 0, 50));
        processes.insert(2, process_with(2, 0, 10));
        processes.insert(3, process_with(3, 0, 30));
        let mut ready = vec![1];
        insert_on_admission(SchedulingPolicy::Sjf, &mut ready, 2, &processes);
        insert_on_admission(SchedulingPolicy::Sjf, &mut ready, 3, &processes);
        assert_eq!(ready, vec![2, 3, 1]);
    }
}
