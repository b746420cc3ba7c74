use std::fs;
use std::path::PathBuf;

use cg_params::*;

fn temp_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(name);
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn roundtrip_yaml_config() {
    let dir = temp_dir("cg_params_roundtrip");
    let path = dir.join("pipeline.yaml");

    let mut config = PipelineConfig::new(dir.join("parameters.json"));
    config.output_root = dir.join("outputs");
    config.sampling.n_samples = 16;
    config.timings = Some(TimingMapDef::chamber_defaults());
    config.volumes.push(VolumeRelationDef {
        reference: "v_tot".to_string(),
        columns: vec!["ao.v".to_string()],
    });

    save_config(&path, &config).unwrap();
    let loaded = load_config(&path).unwrap();

    assert_eq!(config, loaded);
}

#[test]
fn load_config_resolves_against_file_location() {
    let dir = temp_dir("cg_params_relative");
    let path = dir.join("pipeline.yaml");
    fs::write(&path, "parameters: inputs/p.json\nsampling:\n  n_samples: 4\n").unwrap();

    let config = load_config(&path).unwrap();
    assert_eq!(config.parameters, dir.join("inputs/p.json"));
    assert_eq!(config.output_root, dir.join("outputs/simulations"));
}

#[test]
fn invalid_config_is_rejected_on_load() {
    let dir = temp_dir("cg_params_invalid");
    let path = dir.join("pipeline.yaml");
    fs::write(&path, "parameters: p.json\nbatch:\n  n_jobs: 0\n").unwrap();

    let err = load_config(&path).unwrap_err();
    assert!(err.is_configuration());
}

#[test]
fn spec_loads_from_disk() {
    let dir = temp_dir("cg_params_spec");
    let path = dir.join("parameters_small.json");
    fs::write(&path, r#"{"ao": {"r": [200, 300], "c": 0.3}}"#).unwrap();

    let spec = ParameterSpec::load(&path).unwrap();
    assert_eq!(spec.stem(), "parameters_small");
    assert_eq!(spec.free_names(), vec!["ao.r".to_string()]);

    let missing = ParameterSpec::load(&dir.join("nope.json")).unwrap_err();
    assert!(!missing.is_configuration());
}
