use crate::CoreError;

/// Floating point type used throughout the pipeline.
pub type Real = f64;

pub fn ensure_finite(v: Real, what: &'static str) -> Result<Real, CoreError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(CoreError::NonFinite { what, value: v })
    }
}

/// Map a unit-cube coordinate onto `[low, high]`.
pub fn scale_unit(u: Real, low: Real, high: Real) -> Real {
    // rounding of `high - low` can overshoot by an ulp
    (low + u * (high - low)).min(high)
}

/// Arithmetic mean ignoring NaN entries. `None` when nothing remains.
pub fn nan_mean(values: &[Real]) -> Option<Real> {
    let mut sum = 0.0;
    let mut count = 0usize;
    for v in values.iter().filter(|v| !v.is_nan()) {
        sum += v;
        count += 1;
    }
    if count == 0 {
        None
    } else {
        Some(sum / count as Real)
    }
}

/// Maximum ignoring NaN entries.
pub fn nan_max(values: &[Real]) -> Option<Real> {
    values
        .iter()
        .copied()
        .filter(|v| !v.is_nan())
        .fold(None, |acc, v| match acc {
            Some(m) if m >= v => Some(m),
            _ => Some(v),
        })
}

/// Minimum ignoring NaN entries.
pub fn nan_min(values: &[Real]) -> Option<Real> {
    values
        .iter()
        .copied()
        .filter(|v| !v.is_nan())
        .fold(None, |acc, v| match acc {
            Some(m) if m <= v => Some(m),
            _ => Some(v),
        })
}
