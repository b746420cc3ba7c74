//! Parameter-bounds specification.
//!
//! The document is a JSON object. Top-level keys are either component
//! identifiers mapping attribute names to values, or global parameters holding
//! a value directly:
//!
//! ```json
//! {
//!   "T": 1000.0,
//!   "v_tot": [4000.0, 6000.0],
//!   "ao": { "r": [200.0, 300.0], "c": 0.3 }
//! }
//! ```
//!
//! A value is either a fixed number or a `[low, high]` pair. Ranged entries are
//! the free parameters that get sampled; their flattened names
//! (`component.attribute` or `name`) are the sample-table columns, in file
//! order.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::ParamsResult;
use crate::validate::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParameterValue {
    Fixed(f64),
    Range { low: f64, high: f64 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParameterEntry {
    pub component: Option<String>,
    pub attribute: String,
    pub value: ParameterValue,
}

impl ParameterEntry {
    /// Flattened column name.
    pub fn name(&self) -> String {
        self.key_path().name()
    }

    pub fn key_path(&self) -> KeyPath {
        KeyPath {
            component: self.component.clone(),
            attribute: self.attribute.clone(),
        }
    }
}

/// Where a parameter sits in the nested document. Flattened names are
/// ambiguous once a key contains a dot, so this is kept alongside them.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyPath {
    pub component: Option<String>,
    pub attribute: String,
}

impl KeyPath {
    pub fn global(name: &str) -> Self {
        Self {
            component: None,
            attribute: name.to_string(),
        }
    }

    pub fn name(&self) -> String {
        match &self.component {
            Some(component) => format!("{}.{}", component, self.attribute),
            None => self.attribute.clone(),
        }
    }

    /// Compare against a flattened name without allocating.
    pub fn matches(&self, name: &str) -> bool {
        match &self.component {
            Some(component) => name
                .strip_prefix(component.as_str())
                .and_then(|rest| rest.strip_prefix('.'))
                == Some(self.attribute.as_str()),
            None => name == self.attribute,
        }
    }
}

/// A ranged entry, ready for sampling.
#[derive(Debug, Clone, PartialEq)]
pub struct FreeParameter {
    pub name: String,
    pub low: f64,
    pub high: f64,
}

/// Problem description consumed by external Sobol analysis tools.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensitivityProblem {
    pub num_vars: usize,
    pub names: Vec<String>,
    pub bounds: Vec<[f64; 2]>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParameterSpec {
    path: PathBuf,
    stem: String,
    entries: Vec<ParameterEntry>,
}

impl ParameterSpec {
    pub fn load(path: &Path) -> ParamsResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content, path)
    }

    /// Parse a specification. `path` only provides identity (the stem that
    /// namespaces output directories); nothing is read from it.
    pub fn from_json_str(content: &str, path: &Path) -> ParamsResult<Self> {
        let root: Value = serde_json::from_str(content)?;
        let Value::Object(root) = root else {
            return Err(ValidationError::NotAnObject {
                context: "parameter specification root".to_string(),
            }
            .into());
        };

        let mut entries = Vec::new();
        for (key, value) in &root {
            match value {
                Value::Object(attributes) => {
                    parse_component(key, attributes, &mut entries)?;
                }
                other => entries.push(ParameterEntry {
                    component: None,
                    attribute: key.clone(),
                    value: parse_value(key, other)?,
                }),
            }
        }

        let spec = Self {
            path: path.to_path_buf(),
            stem: file_stem(path),
            entries,
        };
        spec.check()?;
        Ok(spec)
    }

    fn check(&self) -> Result<(), ValidationError> {
        let mut seen: Vec<String> = Vec::with_capacity(self.entries.len());
        for entry in &self.entries {
            let name = entry.name();
            if seen.contains(&name) {
                return Err(ValidationError::DuplicateId {
                    id: name,
                    context: "flattened parameter names".to_string(),
                });
            }
            seen.push(name);
        }
        if self.free_parameters().is_empty() {
            return Err(ValidationError::Missing {
                field: "at least one [low, high] ranged parameter".to_string(),
            });
        }
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name without extension; namespaces the run's output directory.
    pub fn stem(&self) -> &str {
        &self.stem
    }

    pub fn entries(&self) -> &[ParameterEntry] {
        &self.entries
    }

    pub fn free_parameters(&self) -> Vec<FreeParameter> {
        self.entries
            .iter()
            .filter_map(|entry| match entry.value {
                ParameterValue::Range { low, high } => Some(FreeParameter {
                    name: entry.name(),
                    low,
                    high,
                }),
                ParameterValue::Fixed(_) => None,
            })
            .collect()
    }

    /// Flattened name and nested location of every entry, in file order.
    pub fn key_paths(&self) -> Vec<(String, KeyPath)> {
        self.entries
            .iter()
            .map(|entry| (entry.name(), entry.key_path()))
            .collect()
    }

    pub fn free_names(&self) -> Vec<String> {
        self.free_parameters().into_iter().map(|p| p.name).collect()
    }

    pub fn fixed_values(&self) -> Vec<(String, f64)> {
        self.entries
            .iter()
            .filter_map(|entry| match entry.value {
                ParameterValue::Fixed(v) => Some((entry.name(), v)),
                ParameterValue::Range { .. } => None,
            })
            .collect()
    }

    pub fn sensitivity_problem(&self) -> SensitivityProblem {
        let free = self.free_parameters();
        SensitivityProblem {
            num_vars: free.len(),
            names: free.iter().map(|p| p.name.clone()).collect(),
            bounds: free.iter().map(|p| [p.low, p.high]).collect(),
        }
    }
}

fn parse_component(
    component: &str,
    attributes: &Map<String, Value>,
    entries: &mut Vec<ParameterEntry>,
) -> Result<(), ValidationError> {
    if attributes.is_empty() {
        return Err(ValidationError::Missing {
            field: format!("attributes of component '{}'", component),
        });
    }
    for (attribute, value) in attributes {
        let field = format!("{}.{}", component, attribute);
        if value.is_object() {
            return Err(ValidationError::InvalidValue {
                field,
                value: "{...}".to_string(),
                reason: "components cannot be nested".to_string(),
            });
        }
        entries.push(ParameterEntry {
            component: Some(component.to_string()),
            attribute: attribute.clone(),
            value: parse_value(&field, value)?,
        });
    }
    Ok(())
}

fn parse_value(field: &str, value: &Value) -> Result<ParameterValue, ValidationError> {
    let invalid = |reason: &str| ValidationError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    };

    match value {
        Value::Number(n) => {
            let v = n.as_f64().ok_or_else(|| invalid("not representable as f64"))?;
            Ok(ParameterValue::Fixed(v))
        }
        Value::Array(items) => {
            let [low, high] = items.as_slice() else {
                return Err(invalid("bounds must be a [low, high] pair"));
            };
            let low = low.as_f64().ok_or_else(|| invalid("lower bound is not a number"))?;
            let high = high.as_f64().ok_or_else(|| invalid("upper bound is not a number"))?;
            if !(low.is_finite() && high.is_finite()) {
                return Err(invalid("bounds must be finite"));
            }
            if low >= high {
                return Err(invalid("lower bound must be below upper bound"));
            }
            Ok(ParameterValue::Range { low, high })
        }
        _ => Err(invalid("expected a number or a [low, high] pair")),
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "parameters".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const NAGHAVI_LIKE: &str = r#"{
        "T": 1000.0,
        "v_tot": [4000.0, 6000.0],
        "ao": { "r": [200.0, 300.0], "c": 0.3 },
        "lv": { "t_tr": [0.3, 0.5], "E_pas": 1.0, "tau": [0.02, 0.03] }
    }"#;

    fn spec() -> ParameterSpec {
        ParameterSpec::from_json_str(NAGHAVI_LIKE, Path::new("inputs/naghavi_test.json")).unwrap()
    }

    #[test]
    fn flattens_in_file_order() {
        let spec = spec();
        assert_eq!(
            spec.free_names(),
            vec!["v_tot", "ao.r", "lv.t_tr", "lv.tau"]
        );
        assert_eq!(
            spec.fixed_values(),
            vec![
                ("T".to_string(), 1000.0),
                ("ao.c".to_string(), 0.3),
                ("lv.E_pas".to_string(), 1.0)
            ]
        );
    }

    #[test]
    fn dotted_global_keeps_its_key_path() {
        let spec = ParameterSpec::from_json_str(
            r#"{"a.b": [0, 1], "lv": {"E": 2.0}}"#,
            Path::new("dotted.json"),
        )
        .unwrap();
        let paths = spec.key_paths();
        assert_eq!(paths[0], ("a.b".to_string(), KeyPath::global("a.b")));
        assert_eq!(paths[1].1.component.as_deref(), Some("lv"));

        assert!(paths[0].1.matches("a.b"));
        assert!(paths[1].1.matches("lv.E"));
        assert!(!paths[1].1.matches("lvE"));
        assert!(!paths[1].1.matches("lv.E.x"));
    }

    #[test]
    fn stem_comes_from_path() {
        assert_eq!(spec().stem(), "naghavi_test");
    }

    #[test]
    fn problem_uses_declared_bounds() {
        let problem = spec().sensitivity_problem();
        assert_eq!(problem.num_vars, 4);
        assert_eq!(problem.bounds[1], [200.0, 300.0]);
    }

    #[test]
    fn rejects_inverted_bounds() {
        let err = ParameterSpec::from_json_str(r#"{"a": {"b": [2.0, 1.0]}}"#, Path::new("x.json"))
            .unwrap_err();
        assert!(err.to_string().contains("a.b"));
        assert!(err.is_configuration());
    }

    #[test]
    fn rejects_three_element_bounds() {
        let result =
            ParameterSpec::from_json_str(r#"{"a": [0.0, 1.0, 2.0]}"#, Path::new("x.json"));
        assert!(result.is_err());
    }

    #[test]
    fn rejects_strings_and_nesting() {
        assert!(ParameterSpec::from_json_str(r#"{"a": "fast"}"#, Path::new("x.json")).is_err());
        assert!(
            ParameterSpec::from_json_str(r#"{"a": {"b": {"c": [0, 1]}}}"#, Path::new("x.json"))
                .is_err()
        );
    }

    #[test]
    fn requires_a_ranged_parameter() {
        let err = ParameterSpec::from_json_str(r#"{"a": {"b": 1.0}}"#, Path::new("x.json"))
            .unwrap_err();
        assert!(err.to_string().contains("ranged"));
    }

    #[test]
    fn rejects_non_object_root_and_bad_json() {
        assert!(ParameterSpec::from_json_str("[1, 2]", Path::new("x.json")).is_err());
        assert!(ParameterSpec::from_json_str("{", Path::new("x.json")).is_err());
    }

    #[test]
    fn rejects_colliding_flattened_names() {
        let result = ParameterSpec::from_json_str(
            r#"{"ao.r": [0, 1], "ao": {"r": [0, 1]}}"#,
            Path::new("x.json"),
        );
        assert!(result.is_err());
    }
}
