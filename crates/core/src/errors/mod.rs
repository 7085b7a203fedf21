//! Error types and result extensions for the performance layer

mod builders;
mod conversions;
mod extensions;
mod types;

pub use extensions::*;
pub(crate) use extensions::is_integrity_violation;
pub use types::{BoxError, Error, Result};
