//! End-to-end runs driving [`Simulation`] through whole config/program pairs, one per
//! scheduling policy plus a device-bound concurrency scenario.

use std::io::Write as _;

use ossim_core::Simulation;
use pretty_assertions::assert_eq;
use tempfile::tempdir;

fn write_file(dir: &std::path::Path, name: &str, contents: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    let mut file = std::fs::File::create(&path).expect("create fixture file");
    file.write_all(contents.as_bytes()).expect("write fixture file");
    path
}

fn config_text(metadata_path: &std::path::Path, log_path: &std::path::Path, policy: &str) -> String {
    format!(
        "Start Simulator Configuration File\n\
         Version/Phase: 1.0\n\
         File Path: {meta}\n\
         Monitor display time {{msec}}: 10\n\
         Processor cycle time {{msec}}: 5\n\
         Scanner cycle time {{msec}}: 10\n\
         Hard drive cycle time {{msec}}: 10\n\
         Keyboard cycle time {{msec}}: 10\n\
         Memory cycle time {{msec}}: 5\n\
         Projector cycle time {{msec}}: 10\n\
         System memory {{kbytes}}: 4\n\
         Memory block size {{kbytes}}: 1\n\
         Projector quantity: 1\n\
         Hard drive quantity: 1\n\
         CPU Scheduling Code: {policy}\n\
         Processor Quantum Number: 2\n\
         Log: Log to File\n\
         Log File Path: {log}\n\
         End Simulator Configuration File",
        meta = metadata_path.display(),
        log = log_path.display(),
        policy = policy,
    )
}

/// Like [`config_text`] but with processor and hard-drive cycle times broken out, so a
/// scenario can pick burst durations that land predictably relative to the loader's
/// fixed `DEFAULT_ADMISSION_INTERVAL_MS` admission cadence.
fn config_text_with_timing(
    metadata_path: &std::path::Path,
    log_path: &std::path::Path,
    policy: &str,
    processor_ms: u32,
    hard_drive_ms: u32,
    quantum_ms: u32,
) -> String {
    format!(
        "Start Simulator Configuration File\n\
         Version/Phase: 1.0\n\
         File Path: {meta}\n\
         Monitor display time {{msec}}: 10\n\
         Processor cycle time {{msec}}: {processor_ms}\n\
         Scanner cycle time {{msec}}: 10\n\
         Hard drive cycle time {{msec}}: {hard_drive_ms}\n\
         Keyboard cycle time {{msec}}: 10\n\
         Memory cycle time {{msec}}: 5\n\
         Projector cycle time {{msec}}: 10\n\
         System memory {{kbytes}}: 4\n\
         Memory block size {{kbytes}}: 1\n\
         Projector quantity: 1\n\
         Hard drive quantity: 1\n\
         CPU Scheduling Code: {policy}\n\
         Processor Quantum Number: {quantum_ms}\n\
         Log: Log to File\n\
         Log File Path: {log}\n\
         End Simulator Configuration File",
        meta = metadata_path.display(),
        log = log_path.display(),
    )
}

/// Extracts the pid argument of every `"starting process <pid>"` line, in log order.
fn start_order(log: &str) -> Vec<u32> {
    log.lines()
        .filter_map(|line| line.split("starting process ").nth(1))
        .filter_map(|rest| rest.split_whitespace().next())
        .filter_map(|token| token.parse::<u32>().ok())
        .collect()
}

const ONE_PROCESS_PROGRAM: &str = "Start Program Meta-Data Code:\n\
     S{begin}0; A{begin}0; P{run}2; M{allocate}1; I{keyboard}1; A{finish}0; S{finish}0.\n\
     End Program Meta-Data Code.";

const TWO_PROCESS_PROGRAM: &str = "Start Program Meta-Data Code:\n\
     S{begin}0; \
     A{begin}0; P{run}3; A{finish}0; \
     A{begin}0; P{run}1; A{finish}0; \
     S{finish}0.\n\
     End Program Meta-Data Code.";

#[test]
fn runs_single_process_program_to_completion() {
    let dir = tempdir().expect("tempdir");
    let metadata_path = write_file(dir.path(), "program.mdf", ONE_PROCESS_PROGRAM);
    let log_path = dir.path().join("run.lgf");
    let config_path = write_file(
        dir.path(),
        "config.cfg",
        &config_text(&metadata_path, &log_path, "FIFO"),
    );

    let simulation = Simulation::load(&config_path).expect("simulation loads");
    simulation.run().expect("simulation runs to completion");

    let log = std::fs::read_to_string(&log_path).expect("log file written");
    assert!(log.contains("Simulator program starting"));
    assert!(log.contains("Simulator program ending"));
    assert!(log.contains("starting process 1"));
    assert!(log.contains("End process 1"));
}

#[test]
fn runs_round_robin_program_with_two_processes() {
    let dir = tempdir().expect("tempdir");
    let metadata_path = write_file(dir.path(), "program.mdf", TWO_PROCESS_PROGRAM);
    let log_path = dir.path().join("run.lgf");
    let config_path = write_file(
        dir.path(),
        "config.cfg",
        &config_text(&metadata_path, &log_path, "RR"),
    );

    let simulation = Simulation::load(&config_path).expect("simulation loads");
    simulation.run().expect("simulation runs to completion");

    let log = std::fs::read_to_string(&log_path).expect("log file written");
    assert!(log.contains("starting process 1"));
    assert!(log.contains("starting process 2"));
    assert!(log.contains("End process 1"));
    assert!(log.contains("End process 2"));
}

const PRIORITY_PROGRAM: &str = "Start Program Meta-Data Code:\n\
     S{begin}0; \
     A{begin}0; P{run}6; A{finish}0; \
     A{begin}0; P{run}1; A{finish}0; \
     A{begin}0; I{keyboard}1; I{keyboard}1; A{finish}0; \
     S{finish}0.\n\
     End Program Meta-Data Code.";

/// S3: process 1 occupies the processor long enough for both 2 and 3 to be admitted
/// while it runs. Process 3 has more I/O instructions than process 2, so priority
/// (I/O density, descending) must place it ahead of 2 once both are ready.
#[test]
fn priority_scheduling_runs_more_io_bound_process_first() {
    let dir = tempdir().expect("tempdir");
    let metadata_path = write_file(dir.path(), "program.mdf", PRIORITY_PROGRAM);
    let log_path = dir.path().join("run.lgf");
    let config_path = write_file(
        dir.path(),
        "config.cfg",
        &config_text_with_timing(&metadata_path, &log_path, "PS", 50, 50, 0),
    );

    let simulation = Simulation::load(&config_path).expect("simulation loads");
    simulation.run().expect("simulation runs to completion");

    let log = std::fs::read_to_string(&log_path).expect("log file written");
    let order = start_order(&log);
    assert_eq!(order, vec![1, 3, 2], "process 1 runs first, then I/O-dense 3 ahead of 2");
    assert!(log.contains("End process 1"));
    assert!(log.contains("End process 2"));
    assert!(log.contains("End process 3"));
}

const SJF_PROGRAM: &str = "Start Program Meta-Data Code:\n\
     S{begin}0; \
     A{begin}0; P{run}6; A{finish}0; \
     A{begin}0; P{run}4; A{finish}0; \
     A{begin}0; P{run}1; A{finish}0; \
     S{finish}0.\n\
     End Program Meta-Data Code.";

/// S4: process 1 keeps the processor busy while 2 (4 cycles) and 3 (1 cycle) are both
/// admitted. Non-preemptive SJF must insert the shorter job ahead of the longer one.
#[test]
fn sjf_scheduling_runs_shortest_job_first() {
    let dir = tempdir().expect("tempdir");
    let metadata_path = write_file(dir.path(), "program.mdf", SJF_PROGRAM);
    let log_path = dir.path().join("run.lgf");
    let config_path = write_file(
        dir.path(),
        "config.cfg",
        &config_text_with_timing(&metadata_path, &log_path, "SJF", 50, 50, 0),
    );

    let simulation = Simulation::load(&config_path).expect("simulation loads");
    simulation.run().expect("simulation runs to completion");

    let log = std::fs::read_to_string(&log_path).expect("log file written");
    let order = start_order(&log);
    assert_eq!(order, vec![1, 3, 2], "process 1 runs first, then the shorter job 3 ahead of 2");
}

const STR_PROGRAM: &str = "Start Program Meta-Data Code:\n\
     S{begin}0; \
     A{begin}0; P{run}10; A{finish}0; \
     A{begin}0; P{run}2; A{finish}0; \
     A{begin}0; P{run}1; A{finish}0; \
     S{finish}0.\n\
     End Program Meta-Data Code.";

/// S5: while process 1 runs, 2 is admitted alone, then 3 arrives with a shorter
/// remaining time than 2. STR must re-sort the ready queue and flag 2 for preemption
/// the moment it is dispatched, even though 2 started running first.
#[test]
fn str_scheduling_preempts_a_running_process_for_a_shorter_one() {
    let dir = tempdir().expect("tempdir");
    let metadata_path = write_file(dir.path(), "program.mdf", STR_PROGRAM);
    let log_path = dir.path().join("run.lgf");
    let config_path = write_file(
        dir.path(),
        "config.cfg",
        &config_text_with_timing(&metadata_path, &log_path, "STR", 50, 50, 0),
    );

    let simulation = Simulation::load(&config_path).expect("simulation loads");
    simulation.run().expect("simulation runs to completion");

    let log = std::fs::read_to_string(&log_path).expect("log file written");
    let order = start_order(&log);
    assert_eq!(order, vec![1, 3, 2], "process 1 runs first, then STR picks the shorter job 3 over 2");
    assert!(log.contains("End process 1"));
    assert!(log.contains("End process 2"));
    assert!(log.contains("End process 3"));
}

const DEVICE_BOUND_PROGRAM: &str = "Start Program Meta-Data Code:\n\
     S{begin}0; \
     A{begin}0; I{hard drive}1; P{run}4; A{finish}0; \
     A{begin}0; P{run}1; A{finish}0; \
     S{finish}0.\n\
     End Program Meta-Data Code.";

/// S6: process 1 blocks on a hard-drive read while process 2 is admitted and becomes
/// ready. When the read completes, process 1 has more remaining processor time than
/// process 2, so it must yield the processor rather than resuming immediately.
#[test]
fn device_completion_yields_processor_to_a_shorter_ready_process() {
    let dir = tempdir().expect("tempdir");
    let metadata_path = write_file(dir.path(), "program.mdf", DEVICE_BOUND_PROGRAM);
    let log_path = dir.path().join("run.lgf");
    let config_path = write_file(
        dir.path(),
        "config.cfg",
        &config_text_with_timing(&metadata_path, &log_path, "STR", 50, 300, 0),
    );

    let simulation = Simulation::load(&config_path).expect("simulation loads");
    simulation.run().expect("simulation runs to completion");

    let log = std::fs::read_to_string(&log_path).expect("log file written");
    let end2 = log.find("End process 2").expect("process 2 completes");
    let end1 = log.find("End process 1").expect("process 1 completes");
    assert!(
        end2 < end1,
        "process 1 must yield to the shorter process 2 once its device read completes"
    );
}

#[test]
fn rejects_config_with_unknown_scheduling_code() {
    let dir = tempdir().expect("tempdir");
    let metadata_path = write_file(dir.path(), "program.mdf", ONE_PROCESS_PROGRAM);
    let log_path = dir.path().join("run.lgf");
    let bad_config = config_text(&metadata_path, &log_path, "FIFO").replace("FIFO", "BOGUS");
    let config_path = write_file(dir.path(), "config.cfg", &bad_config);

    let error = Simulation::load(&config_path).unwrap_err();
    assert!(error.to_string().contains("BOGUS"));
}
