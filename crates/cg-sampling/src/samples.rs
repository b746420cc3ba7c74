//! Sample tables and per-row parameter points.

use std::collections::BTreeMap;

use cg_core::{Table, scale_unit};
use cg_params::{KeyPath, ParameterSpec};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::lhs;
use crate::sobol::Sobol;
use crate::{SamplingError, SamplingMethod, SamplingResult};

/// Sampled free parameters, one row per sample, together with the fixed
/// values every row runs with.
///
/// Also records which post-processing steps have been applied so they are
/// never applied twice.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleTable {
    table: Table,
    fixed: Vec<(String, f64)>,
    key_paths: BTreeMap<String, KeyPath>,
    pub(crate) timing_ref: Option<f64>,
    pub(crate) volumes_mapped: bool,
}

impl SampleTable {
    pub fn new(table: Table, fixed: Vec<(String, f64)>) -> Self {
        Self {
            table,
            fixed,
            key_paths: BTreeMap::new(),
            timing_ref: None,
            volumes_mapped: false,
        }
    }

    /// Rebuild a table that was persisted after post-processing.
    pub fn restore(
        table: Table,
        fixed: Vec<(String, f64)>,
        timing_ref: Option<f64>,
        volumes_mapped: bool,
    ) -> Self {
        Self {
            table,
            fixed,
            key_paths: BTreeMap::new(),
            timing_ref,
            volumes_mapped,
        }
    }

    /// Take the nested location of each parameter from `spec`. Names the spec
    /// does not know stay top-level keys.
    pub fn with_key_paths(mut self, spec: &ParameterSpec) -> Self {
        self.key_paths = spec.key_paths().into_iter().collect();
        self
    }

    pub fn key_path(&self, name: &str) -> KeyPath {
        self.key_paths
            .get(name)
            .cloned()
            .unwrap_or_else(|| KeyPath::global(name))
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    pub(crate) fn table_mut(&mut self) -> &mut Table {
        &mut self.table
    }

    pub fn n_samples(&self) -> usize {
        self.table.n_rows()
    }

    pub fn column_names(&self) -> &[String] {
        self.table.column_names()
    }

    pub fn fixed_values(&self) -> &[(String, f64)] {
        &self.fixed
    }

    pub(crate) fn fixed_mut(&mut self) -> &mut [(String, f64)] {
        &mut self.fixed
    }

    pub fn fixed_value(&self, name: &str) -> Option<f64> {
        self.fixed.iter().find(|(n, _)| n == name).map(|(_, v)| *v)
    }

    /// Reference time the timing columns were rescaled with, if any.
    pub fn timing_ref(&self) -> Option<f64> {
        self.timing_ref
    }

    pub fn volumes_mapped(&self) -> bool {
        self.volumes_mapped
    }

    /// Merge row `index` with the fixed values.
    pub fn point(&self, index: usize) -> SamplingResult<ParameterPoint> {
        let row = self.table.row(index)?;
        let sampled = self.table.column_names().iter().zip(row);
        let values = self
            .fixed
            .iter()
            .map(|(name, value)| (name, *value))
            .chain(sampled)
            .map(|(name, value)| (self.key_path(name), value))
            .collect();
        Ok(ParameterPoint { index, values })
    }

    pub fn points(&self) -> SamplingResult<Vec<ParameterPoint>> {
        (0..self.n_samples()).map(|i| self.point(i)).collect()
    }
}

/// Every parameter value one simulation runs with.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterPoint {
    /// Row of the sample table this point came from.
    pub index: usize,
    pub values: Vec<(KeyPath, f64)>,
}

impl ParameterPoint {
    /// Look a value up by its flattened name.
    pub fn get(&self, name: &str) -> Option<f64> {
        self.values
            .iter()
            .find(|(path, _)| path.matches(name))
            .map(|(_, v)| *v)
    }

    /// Nested `{component: {attribute: value}}` form, with global parameters
    /// at the top level. This is the shape simulators receive.
    pub fn to_nested_json(&self) -> Value {
        let mut root = Map::new();
        for (path, value) in &self.values {
            let number = Value::from(*value);
            match &path.component {
                Some(component) => {
                    let entry = root
                        .entry(component.clone())
                        .or_insert_with(|| Value::Object(Map::new()));
                    if let Value::Object(attributes) = entry {
                        attributes.insert(path.attribute.clone(), number);
                    }
                }
                None => {
                    root.insert(path.attribute.clone(), number);
                }
            }
        }
        Value::Object(root)
    }
}

/// Sample `n_samples` points of the parameter spec's free parameters.
pub fn generate_samples(
    spec: &ParameterSpec,
    n_samples: usize,
    method: SamplingMethod,
    seed: u64,
) -> SamplingResult<SampleTable> {
    if n_samples == 0 {
        return Err(SamplingError::config("n_samples must be at least 1"));
    }

    let free = spec.free_parameters();
    let dims = free.len();
    let unit = match method {
        SamplingMethod::Sobol => {
            if !n_samples.is_power_of_two() {
                warn!(
                    n_samples,
                    "Sobol balance properties require a power-of-two sample count"
                );
            }
            Sobol::new(dims)?.take_points(n_samples)?
        }
        SamplingMethod::LatinHypercube => lhs::latin_hypercube(n_samples, dims, seed),
        SamplingMethod::Random => lhs::uniform(n_samples, dims, seed),
    };

    let columns = free
        .iter()
        .enumerate()
        .map(|(d, param)| {
            let values = unit
                .iter()
                .map(|point| scale_unit(point[d], param.low, param.high))
                .collect();
            (param.name.clone(), values)
        })
        .collect();
    let table = Table::from_columns(columns)?;

    debug!(
        method = %method,
        n_samples,
        dims,
        "Generated sample table"
    );

    Ok(SampleTable::new(table, spec.fixed_values()).with_key_paths(spec))
}
