//! Error classification, recovery policy and handled-error records

mod category;
mod info;
mod rules;

pub use category::{ErrorCategory, ErrorSeverity};
pub use info::{ErrorContext, ErrorInfo, ErrorResponse};
pub use rules::{Classification, ClassificationRule, ErrorClassifier, RecoverabilityRule};
