use std::fmt;
use std::str::FromStr;

use cg_params::SamplingMethodDef;

use crate::SamplingError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SamplingMethod {
    /// Unscrambled Sobol sequence, starting at the origin.
    #[default]
    Sobol,
    /// Latin hypercube with jitter inside each stratum.
    LatinHypercube,
    /// Independent uniform draws.
    Random,
}

impl SamplingMethod {
    /// Whether the design depends on the RNG seed.
    pub fn is_seeded(self) -> bool {
        !matches!(self, SamplingMethod::Sobol)
    }
}

impl From<SamplingMethodDef> for SamplingMethod {
    fn from(def: SamplingMethodDef) -> Self {
        match def {
            SamplingMethodDef::Sobol => SamplingMethod::Sobol,
            SamplingMethodDef::Lhs => SamplingMethod::LatinHypercube,
            SamplingMethodDef::Random => SamplingMethod::Random,
        }
    }
}

impl FromStr for SamplingMethod {
    type Err = SamplingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sobol" => Ok(SamplingMethod::Sobol),
            "lhs" | "latinhypercube" | "latin_hypercube" => Ok(SamplingMethod::LatinHypercube),
            "random" | "uniform" => Ok(SamplingMethod::Random),
            _ => Err(SamplingError::UnknownMethod {
                name: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for SamplingMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sobol => write!(f, "Sobol"),
            Self::LatinHypercube => write!(f, "LHS"),
            Self::Random => write!(f, "Random"),
        }
    }
}
