//! Content-based hashing for run IDs.

use sha2::{Digest, Sha256};

/// Identify a campaign by its parameter file contents and design settings.
pub fn compute_run_id(parameter_bytes: &[u8], method: &str, seed: u64, n_samples: usize) -> String {
    let mut hasher = Sha256::new();
    hasher.update(parameter_bytes);
    hasher.update(method.as_bytes());
    hasher.update(seed.to_le_bytes());
    hasher.update((n_samples as u64).to_le_bytes());
    format!("{:x}", hasher.finalize())
}
