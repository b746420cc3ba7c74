use std::fs;
use std::path::{Path, PathBuf};

use cg_app::{
    AppError, PipelineProgressEvent, PipelineStage, SampleRequest, SamplerHandle, SobolIndexTable,
    build_training_set, run_pipeline, sample_input_space, simulate_options,
};
use cg_batch::{FnSimulator, RunContext, SimulationError, TimeSeries};
use cg_params::{PipelineConfig, SimulatorDef, StepDef, TimingMapDef};
use cg_sampling::ParameterPoint;

fn unique_temp_dir(name: &str) -> PathBuf {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("time")
        .as_nanos();
    let dir = std::env::temp_dir().join(format!("cg_app_{name}_{nanos}"));
    fs::create_dir_all(&dir).expect("create temp dir");
    dir
}

const PARAMS: &str = r#"{
  "T": 1000,
  "lv": {"E_max": [1.5, 3.0], "t_max": [0.2, 0.4], "tau": 0.025},
  "ao": {"r": [200, 300]}
}"#;

fn write_params(dir: &Path) -> PathBuf {
    let path = dir.join("heart.json");
    fs::write(&path, PARAMS).unwrap();
    path
}

fn config(dir: &Path) -> PipelineConfig {
    let mut config = PipelineConfig::new(write_params(dir));
    config.output_root = dir.join("outputs");
    config.sampling.n_samples = 4;
    config.batch.n_jobs = 2;
    config.timings = Some(TimingMapDef {
        ref_time: 1000.0,
        map: [("lv.t_max".to_string(), vec!["lv.t_max".to_string()])]
            .into_iter()
            .collect(),
    });
    config
}

fn model(point: &ParameterPoint, ctx: &RunContext) -> Result<TimeSeries, SimulationError> {
    if ctx.index == 1 {
        return Err(SimulationError::solver("step size underflow"));
    }
    let e = point.get("lv.E_max").unwrap_or(f64::NAN);
    let t_max = point.get("lv.t_max").unwrap_or(f64::NAN);
    TimeSeries::from_channels([
        ("p_lv", vec![0.0, 40.0 * e, 10.0]),
        ("t_peak", vec![t_max; 3]),
    ])
    .map_err(|err| SimulationError::invalid_output(err.to_string()))
}

#[test]
fn full_pipeline_writes_every_stage_output() {
    let dir = unique_temp_dir("full");
    let config = config(&dir);
    let sim = FnSimulator(model);

    let mut stages = Vec::new();
    let mut on_progress = |event: PipelineProgressEvent| stages.push(event.stage);
    let report = run_pipeline(&config, Some(&sim), Some(&mut on_progress)).unwrap();

    let out = dir.join("outputs/output_4_samples_heart");
    assert_eq!(report.output_dir, out);
    assert_eq!(fs::read_to_string(out.join("parameters.json")).unwrap(), PARAMS);
    assert!(out.join("input_samples_4.csv").exists());
    assert!(out.join("manifest.json").exists());
    assert!(out.join("problem.json").exists());
    assert!(out.join("raw_simulations_4_samples/simulation_0.csv").exists());
    assert!(!out.join("raw_simulations_4_samples/simulation_1.csv").exists());

    let failures = report.failures.unwrap();
    assert_eq!(failures.indices(), &[1]);
    let summary = report.summary.unwrap();
    assert_eq!(summary.len(), 3);
    assert_eq!(summary.sample_indices(), vec![0, 2, 3]);

    // timings were rescaled before simulation: t_max in [200, 400]
    for index in summary.sample_indices() {
        let t_peak = summary.value(index, "t_peak_mean").unwrap();
        assert!((200.0..=400.0).contains(&t_peak), "t_peak {t_peak}");
    }

    assert_eq!(stages.first(), Some(&PipelineStage::LoadingParameters));
    assert_eq!(stages.last(), Some(&PipelineStage::Completed));
    assert!(stages.contains(&PipelineStage::MappingTimings));

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn later_stages_resume_from_disk() {
    let dir = unique_temp_dir("resume");
    let mut config = config(&dir);
    let sim = FnSimulator(model);

    config.steps = vec![StepDef::Sample, StepDef::Simulate];
    let first = run_pipeline(&config, Some(&sim), None).unwrap();
    assert!(first.summary.is_none());

    config.steps = vec![StepDef::Features];
    let second = run_pipeline(&config, None, None).unwrap();
    assert_eq!(second.failures, first.failures);
    let summary = second.summary.unwrap();
    assert_eq!(summary.sample_indices(), vec![0, 2, 3]);

    let handle = SamplerHandle::open(&config.parameters, &config.output_root, 4).unwrap();
    assert_eq!(handle.samples().timing_ref(), Some(1000.0));
    assert_eq!(handle.samples().fixed_value("lv.tau"), Some(0.025));

    let training = build_training_set(handle.samples(), &summary, "p_lv_max", None).unwrap();
    assert_eq!(training.sample_indices, vec![0, 2, 3]);
    assert_eq!(training.parameters, vec!["lv.E_max", "lv.t_max", "ao.r"]);
    for (row, y) in training.x.iter().zip(&training.y) {
        assert_eq!(*y, 40.0 * row[0]);
    }

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn single_parameter_four_samples() {
    let dir = unique_temp_dir("single");
    let params = dir.join("x.json");
    fs::write(&params, r#"{"x": [0, 1]}"#).unwrap();
    let output_root = dir.join("out");

    let (handle, out) = sample_input_space(&SampleRequest::new(&params, &output_root, 4), None).unwrap();
    assert_eq!(out, output_root.join("output_4_samples_x"));
    assert_eq!(handle.n_samples(), 4);
    let column = handle.samples().table().column("x").unwrap();
    assert!(column.iter().all(|v| (0.0..=1.0).contains(v)));

    let csv = fs::read_to_string(out.join("input_samples_4.csv")).unwrap();
    assert_eq!(csv.lines().next(), Some("x"));
    assert_eq!(csv.lines().count(), 5);

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn configuration_errors_are_classified() {
    let dir = unique_temp_dir("config_errors");
    let params = dir.join("bad.json");
    fs::write(&params, r#"{"lv": {"E": [3, 1]}}"#).unwrap();
    let output_root = dir.join("out");
    let err = sample_input_space(&SampleRequest::new(&params, &output_root, 4), None).unwrap_err();
    assert!(err.is_configuration(), "{err}");
    assert!(!output_root.exists());

    let mut config = config(&dir);
    config.steps = vec![StepDef::Sample, StepDef::Simulate];
    let err = run_pipeline(&config, None, None).unwrap_err();
    assert!(matches!(err, AppError::Configuration(_)));

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn sobol_index_file_needs_required_columns() {
    let dir = unique_temp_dir("sobol");
    let good = dir.join("indices.csv");
    fs::write(
        &good,
        "index,parameter,output,value,confidence\nS1,lv.E,p_max,0.4,0.05\nST,lv.E,p_max,0.6,\n",
    )
    .unwrap();
    let mut table = SobolIndexTable::load(&good).unwrap();
    assert_eq!(table.len(), 2);
    assert_eq!(table.rows[1].confidence, None);

    table.swap_s1_st();
    let swapped = dir.join("swapped.csv");
    table.save(&swapped).unwrap();
    let reloaded = SobolIndexTable::load(&swapped).unwrap();
    assert_eq!(reloaded.rows[0].index, "ST");
    assert_eq!(reloaded.rows[0].value, 0.4);

    let bad = dir.join("bad.csv");
    fs::write(&bad, "index,parameter,value\nS1,lv.E,0.4\n").unwrap();
    let err = SobolIndexTable::load(&bad).unwrap_err();
    assert!(err.is_schema());
    assert!(err.to_string().contains("output"));

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn channel_named_time_is_kept_across_resume() {
    let dir = unique_temp_dir("time_channel");
    let mut config = config(&dir);
    let sim = FnSimulator(|point: &ParameterPoint, _ctx: &RunContext| {
        let e = point.get("lv.E_max").unwrap_or(f64::NAN);
        TimeSeries::from_channels([("time", vec![0.0, 0.5, 1.0]), ("p", vec![e, 2.0 * e, e])])
            .map_err(|err| SimulationError::invalid_output(err.to_string()))
    });

    let first = run_pipeline(&config, Some(&sim), None).unwrap();
    let in_run = first.summary.unwrap();
    assert_eq!(
        in_run.columns(),
        &["time_mean", "time_max", "time_min", "p_mean", "p_max", "p_min"]
    );

    config.steps = vec![StepDef::Features];
    let resumed = run_pipeline(&config, None, None).unwrap().summary.unwrap();
    assert_eq!(resumed, in_run);

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn oversized_timeout_is_a_configuration_error() {
    let dir = unique_temp_dir("timeout");
    let mut config = config(&dir);
    config.simulator = Some(SimulatorDef {
        program: "model".to_string(),
        args: Vec::new(),
        time_column: None,
        timeout_s: Some(1e20),
        working_dir: None,
    });
    let err = simulate_options(&config).unwrap_err();
    assert!(err.is_configuration(), "{err}");

    if let Some(simulator) = &mut config.simulator {
        simulator.timeout_s = Some(2.5);
        simulator.time_column = Some("t".to_string());
    }
    let options = simulate_options(&config).unwrap();
    assert_eq!(options.timeout, Some(std::time::Duration::from_millis(2500)));
    assert_eq!(options.time_column.as_deref(), Some("t"));

    fs::remove_dir_all(&dir).ok();
}
