//! cg-core: shared foundation for the comparative GSA pipeline.
//!
//! Contains:
//! - error (shared error type)
//! - numeric (NaN-aware reductions + finiteness checks)
//! - table (named-column numeric table used for samples and time series)
//! - csv_io (CSV persistence for tables and sparse rows)

pub mod csv_io;
pub mod error;
pub mod numeric;
pub mod table;

pub use error::{CoreError, CoreResult};
pub use numeric::*;
pub use table::Table;
