//! Cache error handling
//!
//! Every variant carries a [`RecoveryHint`] so that callers and dashboards
//! can decide what to do without parsing messages.

mod conversions;
mod display;
mod recovery;
mod types;

pub use types::*;
