#![cfg(unix)]

use std::time::{Duration, Instant};

use cg_batch::{
    BatchOptions, CommandSimulator, FailureReason, RunContext, SimulationError, Simulator,
    run_batch,
};
use cg_core::Table;
use cg_params::KeyPath;
use cg_sampling::{ParameterPoint, SampleTable};

fn point() -> ParameterPoint {
    ParameterPoint {
        index: 0,
        values: vec![(
            KeyPath {
                component: Some("lv".to_string()),
                attribute: "E".to_string(),
            },
            2.5,
        )],
    }
}

fn shell(script: &str) -> CommandSimulator {
    CommandSimulator::new("sh").arg("-c").arg(script)
}

#[test]
fn reads_csv_from_stdout() {
    let sim = shell("cat > /dev/null; printf 't,p,q\\n0,1,5\\n1,3,5\\n'").time_column("t");
    let series = sim.simulate(&point(), &RunContext::new(0, None)).unwrap();
    assert_eq!(series.time(), Some(&[0.0, 1.0][..]));
    assert_eq!(series.channel("p"), Some(&[1.0, 3.0][..]));
    assert_eq!(series.channel_names(), &["p".to_string(), "q".to_string()]);
}

#[test]
fn receives_nested_parameters_on_stdin() {
    let sim = shell("grep -q '\"lv\":{\"E\":2.5}' && printf 'payload\\n1\\n'");
    let series = sim.simulate(&point(), &RunContext::new(0, None)).unwrap();
    assert_eq!(series.channel("payload"), Some(&[1.0][..]));
}

#[test]
fn non_zero_exit_is_solver_failure() {
    let sim = shell("cat > /dev/null; echo 'integration diverged' >&2; exit 3");
    let err = sim.simulate(&point(), &RunContext::new(0, None)).unwrap_err();
    match err {
        SimulationError::Solver { message } => assert!(message.contains("integration diverged")),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn garbage_output_is_invalid() {
    let sim = shell("cat > /dev/null; printf 'p\\nnot-a-number\\n'");
    let err = sim.simulate(&point(), &RunContext::new(0, None)).unwrap_err();
    assert!(matches!(err, SimulationError::InvalidOutput { .. }));
}

#[test]
fn missing_program_is_reported_per_row() {
    let sim = CommandSimulator::new("/nonexistent/cg-simulator");
    let table = Table::from_columns(vec![("x".to_string(), vec![1.0, 2.0])]).unwrap();
    let outcome = run_batch(
        &SampleTable::new(table, Vec::new()),
        &sim,
        &BatchOptions {
            n_jobs: 2,
            timeout: None,
        },
        None,
        None,
    )
    .unwrap();
    assert_eq!(outcome.failures.indices(), &[0, 1]);
}

#[test]
fn overrunning_child_is_killed() {
    let sim = CommandSimulator::new("sleep").arg("5");
    let table = Table::from_columns(vec![("x".to_string(), vec![1.0])]).unwrap();
    let started = Instant::now();
    let outcome = run_batch(
        &SampleTable::new(table, Vec::new()),
        &sim,
        &BatchOptions {
            n_jobs: 1,
            timeout: Some(Duration::from_millis(200)),
        },
        None,
        None,
    )
    .unwrap();
    assert!(started.elapsed() < Duration::from_secs(4));
    assert_eq!(
        outcome.results[0].failure(),
        Some(&FailureReason::Timeout(Duration::from_millis(200)))
    );
}
