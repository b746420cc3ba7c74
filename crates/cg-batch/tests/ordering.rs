use std::time::Duration;

use cg_batch::{
    BatchOptions, FnSimulator, RunContext, SimulationError, SimulationResult, TimeSeries,
    run_batch,
};
use cg_core::Table;
use cg_sampling::{ParameterPoint, SampleTable};

fn table(n: usize) -> SampleTable {
    let a = (0..n).map(|i| i as f64 * 0.5).collect();
    let b = (0..n).map(|i| 100.0 - i as f64).collect();
    let table =
        Table::from_columns(vec![("lv.E".to_string(), a), ("T".to_string(), b)]).unwrap();
    SampleTable::new(table, Vec::new())
}

fn jittery(point: &ParameterPoint, ctx: &RunContext) -> Result<TimeSeries, SimulationError> {
    // uneven run times shuffle completion order across workers
    std::thread::sleep(Duration::from_millis(((ctx.index * 7) % 5) as u64));
    if ctx.index % 11 == 3 {
        return Err(SimulationError::solver("max step reached"));
    }
    let e = point.get("lv.E").unwrap_or(f64::NAN);
    let t = point.get("T").unwrap_or(f64::NAN);
    TimeSeries::from_channels([("p_lv", vec![e, e + t]), ("q", vec![t, t])])
        .map_err(|err| SimulationError::invalid_output(err.to_string()))
}

#[test]
fn sequential_and_parallel_runs_agree() {
    let samples = table(40);
    let sim = FnSimulator(jittery);
    let sequential = run_batch(
        &samples,
        &sim,
        &BatchOptions {
            n_jobs: 1,
            timeout: None,
        },
        None,
        None,
    )
    .unwrap();
    let parallel = run_batch(
        &samples,
        &sim,
        &BatchOptions {
            n_jobs: 8,
            timeout: None,
        },
        None,
        None,
    )
    .unwrap();

    assert_eq!(sequential, parallel);
    assert_eq!(parallel.results.len(), 40);
    assert_eq!(parallel.failures.indices(), &[3, 14, 25, 36]);
    for (i, result) in parallel.results.iter().enumerate() {
        assert_eq!(result.is_failed(), parallel.failures.contains(i));
        if let SimulationResult::Success(series) = result {
            assert_eq!(series.channel("p_lv").unwrap()[0], i as f64 * 0.5);
        }
    }
}
