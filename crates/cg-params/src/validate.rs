//! Configuration validation logic.

use std::collections::HashSet;

use crate::config::PipelineConfig;

/// Longest accepted per-run timeout (one year).
pub const MAX_TIMEOUT_S: f64 = 365.0 * 24.0 * 3600.0;

#[derive(thiserror::Error, Debug)]
pub enum ValidationError {
    #[error("Duplicate ID: {id} in {context}")]
    DuplicateId { id: String, context: String },

    #[error("Missing required entry: {field}")]
    Missing { field: String },

    #[error("Expected a JSON object for {context}")]
    NotAnObject { context: String },

    #[error("Invalid value: {field} = {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

fn invalid(field: &str, value: impl ToString, reason: &str) -> ValidationError {
    ValidationError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

pub fn validate_config(config: &PipelineConfig) -> Result<(), ValidationError> {
    if config.parameters.as_os_str().is_empty() {
        return Err(ValidationError::Missing {
            field: "parameters".to_string(),
        });
    }

    if config.sampling.n_samples == 0 {
        return Err(invalid("sampling.n_samples", 0, "must be at least 1"));
    }

    if config.batch.n_jobs == 0 {
        return Err(invalid("batch.n_jobs", 0, "must be at least 1"));
    }

    if let Some(timings) = &config.timings {
        if !(timings.ref_time.is_finite() && timings.ref_time > 0.0) {
            return Err(invalid(
                "timings.ref_time",
                timings.ref_time,
                "must be finite and positive",
            ));
        }
        for (canonical, columns) in &timings.map {
            if columns.is_empty() {
                return Err(ValidationError::Missing {
                    field: format!("timings.map.{} columns", canonical),
                });
            }
        }
    }

    for (i, relation) in config.volumes.iter().enumerate() {
        let field = format!("volumes[{}]", i);
        if relation.reference.is_empty() {
            return Err(ValidationError::Missing {
                field: format!("{}.reference", field),
            });
        }
        if relation.columns.is_empty() {
            return Err(ValidationError::Missing {
                field: format!("{}.columns", field),
            });
        }
        if relation.columns.contains(&relation.reference) {
            return Err(invalid(
                &field,
                &relation.reference,
                "reference cannot scale itself",
            ));
        }
    }

    if let Some(simulator) = &config.simulator {
        if simulator.program.trim().is_empty() {
            return Err(ValidationError::Missing {
                field: "simulator.program".to_string(),
            });
        }
        if let Some(timeout) = simulator.timeout_s
            && !(timeout.is_finite() && timeout > 0.0 && timeout <= MAX_TIMEOUT_S)
        {
            return Err(invalid(
                "simulator.timeout_s",
                timeout,
                "must be positive and at most one year",
            ));
        }
    }

    if config.steps.is_empty() {
        return Err(ValidationError::Missing {
            field: "steps".to_string(),
        });
    }
    let mut steps = HashSet::new();
    for step in &config.steps {
        if !steps.insert(step) {
            return Err(ValidationError::DuplicateId {
                id: format!("{:?}", step).to_lowercase(),
                context: "steps".to_string(),
            });
        }
    }

    Ok(())
}
