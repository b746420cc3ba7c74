use std::path::Path;

use cg_params::ParameterSpec;
use cg_sampling::{SamplingMethod, generate_samples};
use proptest::prelude::*;

fn spec_json(bounds: &[(f64, f64)], fixed: usize) -> String {
    let mut parts: Vec<String> = bounds
        .iter()
        .enumerate()
        .map(|(i, (low, width))| format!("\"p{}\": [{}, {}]", i, low, low + width))
        .collect();
    for i in 0..fixed {
        parts.push(format!("\"f{}\": {}", i, i as f64 + 0.5));
    }
    format!("{{\"comp\": {{{}}}}}", parts.join(", "))
}

fn method_strategy() -> impl Strategy<Value = SamplingMethod> {
    prop_oneof![
        Just(SamplingMethod::Sobol),
        Just(SamplingMethod::LatinHypercube),
        Just(SamplingMethod::Random),
    ]
}

proptest! {
    #[test]
    fn samples_have_requested_shape_and_stay_in_bounds(
        bounds in prop::collection::vec((-1.0e3_f64..1.0e3, 1.0e-3_f64..1.0e3), 1..12),
        fixed in 0usize..4,
        n in 1usize..70,
        method in method_strategy(),
        seed in any::<u64>(),
    ) {
        let json = spec_json(&bounds, fixed);
        let spec = ParameterSpec::from_json_str(&json, Path::new("prop.json")).unwrap();
        let samples = generate_samples(&spec, n, method, seed).unwrap();

        prop_assert_eq!(samples.n_samples(), n);
        prop_assert_eq!(samples.column_names().to_vec(), spec.free_names());
        prop_assert_eq!(samples.fixed_values().len(), fixed);

        for param in spec.free_parameters() {
            let column = samples.table().column(&param.name).unwrap();
            for v in column {
                prop_assert!(*v >= param.low && *v <= param.high, "{} = {} outside [{}, {}]", param.name, v, param.low, param.high);
            }
        }
    }
}

#[test]
fn sobol_design_ignores_seed() {
    let spec = ParameterSpec::from_json_str(r#"{"a": [0, 1], "b": [0, 1]}"#, Path::new("s.json"))
        .unwrap();
    let first = generate_samples(&spec, 8, SamplingMethod::Sobol, 1).unwrap();
    let second = generate_samples(&spec, 8, SamplingMethod::Sobol, 99).unwrap();
    assert_eq!(first, second);
}

#[test]
fn too_many_free_parameters_for_sobol() {
    let bounds: Vec<(f64, f64)> = (0..40).map(|_| (0.0, 1.0)).collect();
    let spec =
        ParameterSpec::from_json_str(&spec_json(&bounds, 0), Path::new("wide.json")).unwrap();
    assert!(generate_samples(&spec, 4, SamplingMethod::Sobol, 0).is_err());
    assert!(generate_samples(&spec, 4, SamplingMethod::LatinHypercube, 0).is_ok());
}
