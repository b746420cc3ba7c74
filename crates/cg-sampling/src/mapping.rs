//! Post-processing of sampled values.
//!
//! Timing parameters are sampled as fractions of a cardiac cycle and rescaled
//! to absolute time; vessel volumes are sampled as fractions of a reference
//! volume and converted to absolute volume. Timings are mapped first and each
//! step touches a value at most once.

use std::collections::{BTreeMap, BTreeSet};

use cg_params::{TimingMapDef, VolumeRelationDef};
use tracing::{debug, info};

use crate::{SampleTable, SamplingError, SamplingResult};

#[derive(Debug, Clone, PartialEq)]
pub struct TimingMap {
    pub ref_time: f64,
    /// Canonical parameter name -> columns it governs.
    pub map: BTreeMap<String, Vec<String>>,
}

impl From<&TimingMapDef> for TimingMap {
    fn from(def: &TimingMapDef) -> Self {
        Self {
            ref_time: def.ref_time,
            map: def.map.clone(),
        }
    }
}

impl TimingMap {
    fn governed(&self) -> BTreeSet<&str> {
        self.map
            .values()
            .flat_map(|columns| columns.iter().map(String::as_str))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VolumeRelation {
    pub reference: String,
    pub columns: Vec<String>,
}

impl From<&VolumeRelationDef> for VolumeRelation {
    fn from(def: &VolumeRelationDef) -> Self {
        Self {
            reference: def.reference.clone(),
            columns: def.columns.clone(),
        }
    }
}

enum Slot {
    Sampled,
    Fixed(usize),
}

impl SampleTable {
    fn slot(&self, name: &str) -> Option<Slot> {
        if self.table().has_column(name) {
            Some(Slot::Sampled)
        } else {
            self.fixed_values()
                .iter()
                .position(|(n, _)| n == name)
                .map(Slot::Fixed)
        }
    }

    fn require_slot(&self, name: &str, context: &str) -> SamplingResult<Slot> {
        self.slot(name).ok_or_else(|| {
            SamplingError::config(format!(
                "{} '{}' is neither a sampled nor a fixed parameter",
                context, name
            ))
        })
    }

    /// Multiply every governed column (and governed fixed value) by
    /// `ref_time`. Returns the number of values rescaled.
    ///
    /// Applying the same `ref_time` again is a no-op. A different `ref_time`
    /// after the first application, or any call after the vessel volumes were
    /// mapped, is an error.
    pub fn map_sample_timings(&mut self, timings: &TimingMap) -> SamplingResult<usize> {
        if !(timings.ref_time.is_finite() && timings.ref_time > 0.0) {
            return Err(SamplingError::config(format!(
                "ref_time must be finite and positive, got {}",
                timings.ref_time
            )));
        }
        if self.volumes_mapped {
            return Err(SamplingError::config(
                "sample timings must be mapped before vessel volumes",
            ));
        }
        if let Some(previous) = self.timing_ref {
            if previous == timings.ref_time {
                debug!(ref_time = previous, "Sample timings already mapped");
                return Ok(0);
            }
            return Err(SamplingError::config(format!(
                "sample timings already mapped with ref_time {}, refusing {}",
                previous, timings.ref_time
            )));
        }

        let governed = timings.governed();
        let mut slots = Vec::with_capacity(governed.len());
        for name in &governed {
            slots.push((*name, self.require_slot(name, "timing column")?));
        }

        for (name, slot) in &slots {
            match slot {
                Slot::Sampled => {
                    if let Some(column) = self.table_mut().column_mut(name) {
                        column.iter_mut().for_each(|v| *v *= timings.ref_time);
                    }
                }
                Slot::Fixed(i) => self.fixed_mut()[*i].1 *= timings.ref_time,
            }
        }

        self.timing_ref = Some(timings.ref_time);
        info!(
            ref_time = timings.ref_time,
            rescaled = slots.len(),
            "Mapped sample timings"
        );
        Ok(slots.len())
    }

    /// Convert fraction columns into absolute values of their reference.
    /// Returns the number of values rescaled; a second call is a no-op.
    pub fn map_vessel_volumes(&mut self, relations: &[VolumeRelation]) -> SamplingResult<usize> {
        if self.volumes_mapped {
            debug!("Vessel volumes already mapped");
            return Ok(0);
        }

        let mut scaled: BTreeSet<&str> = BTreeSet::new();
        for relation in relations {
            for column in &relation.columns {
                if !scaled.insert(column.as_str()) {
                    return Err(SamplingError::config(format!(
                        "volume column '{}' appears in more than one relation",
                        column
                    )));
                }
            }
        }
        for relation in relations {
            if scaled.contains(relation.reference.as_str()) {
                return Err(SamplingError::config(format!(
                    "volume reference '{}' is itself a scaled column",
                    relation.reference
                )));
            }
            let reference = self.require_slot(&relation.reference, "volume reference")?;
            for column in &relation.columns {
                let slot = self.require_slot(column, "volume column")?;
                if matches!((&reference, slot), (Slot::Sampled, Slot::Fixed(_))) {
                    return Err(SamplingError::config(format!(
                        "fixed value '{}' cannot scale with sampled reference '{}'",
                        column, relation.reference
                    )));
                }
            }
        }

        let mut count = 0;
        for relation in relations {
            let reference: Vec<f64> = match self.require_slot(&relation.reference, "volume reference")? {
                Slot::Sampled => self.table().require_column(&relation.reference)?.to_vec(),
                Slot::Fixed(i) => vec![self.fixed_values()[i].1; self.n_samples()],
            };
            for column in &relation.columns {
                match self.require_slot(column, "volume column")? {
                    Slot::Sampled => {
                        if let Some(values) = self.table_mut().column_mut(column) {
                            for (v, r) in values.iter_mut().zip(&reference) {
                                *v *= r;
                            }
                        }
                    }
                    Slot::Fixed(i) => {
                        if let Some(r) = reference.first() {
                            self.fixed_mut()[i].1 *= r;
                        }
                    }
                }
                count += 1;
            }
        }

        self.volumes_mapped = true;
        info!(relations = relations.len(), rescaled = count, "Mapped vessel volumes");
        Ok(count)
    }
}
