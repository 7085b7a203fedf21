//! Ordered classification and recoverability rules

use super::category::{ErrorCategory, ErrorSeverity};
use crate::errors::{is_integrity_violation, Error};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

type Predicate = Arc<dyn Fn(&Error) -> bool + Send + Sync>;

/// A single `(predicate, category, severity)` entry
#[derive(Clone)]
pub struct ClassificationRule {
    name: String,
    predicate: Predicate,
    category: ErrorCategory,
    severity: ErrorSeverity,
}

impl ClassificationRule {
    pub fn new<F>(
        name: impl Into<String>,
        category: ErrorCategory,
        severity: ErrorSeverity,
        predicate: F,
    ) -> Self
    where
        F: Fn(&Error) -> bool + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            predicate: Arc::new(predicate),
            category,
            severity,
        }
    }

    /// Match when any error in the source chain has type `T` and satisfies `check`.
    pub fn source<T, F>(
        name: impl Into<String>,
        category: ErrorCategory,
        severity: ErrorSeverity,
        check: F,
    ) -> Self
    where
        T: std::error::Error + 'static,
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        Self::new(name, category, severity, move |err| {
            err.find_source::<T>().is_some_and(&check)
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn matches(&self, error: &Error) -> bool {
        (self.predicate)(error)
    }
}

impl fmt::Debug for ClassificationRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassificationRule")
            .field("name", &self.name)
            .field("category", &self.category)
            .field("severity", &self.severity)
            .finish_non_exhaustive()
    }
}

/// Per-error override of the category-level recoverability
#[derive(Clone)]
pub struct RecoverabilityRule {
    name: String,
    predicate: Predicate,
    recoverable: bool,
}

impl RecoverabilityRule {
    pub fn new<F>(name: impl Into<String>, recoverable: bool, predicate: F) -> Self
    where
        F: Fn(&Error) -> bool + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            predicate: Arc::new(predicate),
            recoverable,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for RecoverabilityRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecoverabilityRule")
            .field("name", &self.name)
            .field("recoverable", &self.recoverable)
            .finish_non_exhaustive()
    }
}

/// Outcome of running an error through the rule list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub category: ErrorCategory,
    pub severity: ErrorSeverity,
    /// Name of the rule that matched, `fallback` when none did
    pub rule: String,
}

/// Maps errors to a category and severity, then decides recovery.
///
/// Rules are evaluated top to bottom and the first match wins. Rules added
/// with [`ErrorClassifier::with_rule`] run before the built-in ones, in the
/// order they were added.
#[derive(Debug, Clone)]
pub struct ErrorClassifier {
    rules: Vec<ClassificationRule>,
    custom_rules: usize,
    recoverability: Vec<RecoverabilityRule>,
    custom_recoverability: usize,
}

impl Default for ErrorClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl ErrorClassifier {
    /// Classifier with the built-in rule set
    #[must_use]
    pub fn new() -> Self {
        Self {
            rules: default_rules(),
            custom_rules: 0,
            recoverability: default_recoverability_rules(),
            custom_recoverability: 0,
        }
    }

    /// Classifier with no rules; everything falls back to `(System, Medium)`
    #[must_use]
    pub fn empty() -> Self {
        Self {
            rules: Vec::new(),
            custom_rules: 0,
            recoverability: Vec::new(),
            custom_recoverability: 0,
        }
    }

    /// Add a caller rule ahead of the built-in ones
    #[must_use]
    pub fn with_rule(mut self, rule: ClassificationRule) -> Self {
        self.rules.insert(self.custom_rules, rule);
        self.custom_rules += 1;
        self
    }

    /// Add a recoverability override ahead of the built-in ones
    #[must_use]
    pub fn with_recoverability_rule(mut self, rule: RecoverabilityRule) -> Self {
        self.recoverability.insert(self.custom_recoverability, rule);
        self.custom_recoverability += 1;
        self
    }

    pub fn rules(&self) -> impl Iterator<Item = &ClassificationRule> {
        self.rules.iter()
    }

    pub fn classify(&self, error: &Error) -> Classification {
        self.rules
            .iter()
            .find(|rule| rule.matches(error))
            .map(|rule| Classification {
                category: rule.category,
                severity: rule.severity,
                rule: rule.name.clone(),
            })
            .unwrap_or_else(|| Classification {
                category: ErrorCategory::System,
                severity: ErrorSeverity::Medium,
                rule: "fallback".to_string(),
            })
    }

    /// Category default, overridden by the first matching per-error rule
    pub fn is_recoverable(&self, error: &Error, category: ErrorCategory) -> bool {
        self.recoverability
            .iter()
            .find(|rule| (rule.predicate)(error))
            .map_or_else(|| category.is_recoverable(), |rule| rule.recoverable)
    }

    /// Advisory retry delay; `None` for errors that should not be retried
    pub fn retry_after(&self, error: &Error, category: ErrorCategory) -> Option<Duration> {
        if let Error::CircuitOpen { retry_after, .. } = error.peeled() {
            return Some(*retry_after);
        }
        if !self.is_recoverable(error, category) {
            return None;
        }
        category.default_retry_after()
    }
}

fn variant(
    name: &str,
    category: ErrorCategory,
    severity: ErrorSeverity,
    predicate: fn(&Error) -> bool,
) -> ClassificationRule {
    ClassificationRule::new(name, category, severity, move |err| predicate(err.peeled()))
}

fn default_rules() -> Vec<ClassificationRule> {
    use ErrorCategory as C;
    use ErrorSeverity as S;

    vec![
        variant("security", C::Security, S::Critical, |e| {
            matches!(e, Error::Security { .. })
        }),
        variant("authentication", C::Authentication, S::Medium, |e| {
            matches!(e, Error::Authentication { .. })
        }),
        variant("authorization", C::Authorization, S::Medium, |e| {
            matches!(e, Error::Authorization { .. })
        }),
        variant("payment", C::Payment, S::High, |e| {
            matches!(e, Error::Payment { .. })
        }),
        variant("database", C::Database, S::High, |e| {
            matches!(e, Error::Database { .. })
        }),
        variant("circuit_open", C::ExternalService, S::High, |e| {
            matches!(e, Error::CircuitOpen { .. })
        }),
        variant("external_service", C::ExternalService, S::Medium, |e| {
            matches!(e, Error::ExternalService { .. })
        }),
        variant("validation", C::Validation, S::Low, |e| {
            matches!(e, Error::Validation { .. })
        }),
        variant("performance", C::Performance, S::Medium, |e| {
            matches!(e, Error::Performance { .. })
        }),
        variant("timeout", C::Performance, S::Medium, |e| {
            matches!(e, Error::Timeout { .. })
        }),
        variant("cache", C::Performance, S::Low, |e| {
            matches!(e, Error::Cache { .. })
        }),
        variant("configuration", C::System, S::High, |e| {
            matches!(e, Error::Configuration { .. })
        }),
        ClassificationRule::source::<std::io::Error, _>(
            "network_io",
            C::ExternalService,
            S::Medium,
            |io| {
                matches!(
                    io.kind(),
                    std::io::ErrorKind::TimedOut
                        | std::io::ErrorKind::ConnectionRefused
                        | std::io::ErrorKind::ConnectionReset
                )
            },
        ),
    ]
}

fn default_recoverability_rules() -> Vec<RecoverabilityRule> {
    vec![RecoverabilityRule::new(
        "database_integrity",
        false,
        |err| matches!(err.peeled(), Error::Database { message, .. } if is_integrity_violation(message)),
    )]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ResultExt;
    use std::io;

    #[test]
    fn test_variant_rules() {
        let classifier = ErrorClassifier::new();

        let c = classifier.classify(&Error::database("select", "connection lost"));
        assert_eq!(c.category, ErrorCategory::Database);
        assert_eq!(c.severity, ErrorSeverity::High);

        let c = classifier.classify(&Error::security("sql injection attempt"));
        assert_eq!(c.category, ErrorCategory::Security);
        assert_eq!(c.severity, ErrorSeverity::Critical);

        let c = classifier.classify(&Error::validation("email", "missing @"));
        assert_eq!(c.category, ErrorCategory::Validation);
        assert_eq!(c.severity, ErrorSeverity::Low);
    }

    #[test]
    fn test_fallback_is_system_medium() {
        let classifier = ErrorClassifier::new();
        let c = classifier.classify(&Error::other("something odd"));

        assert_eq!(c.category, ErrorCategory::System);
        assert_eq!(c.severity, ErrorSeverity::Medium);
        assert_eq!(c.rule, "fallback");

        let c = ErrorClassifier::empty().classify(&Error::security("x"));
        assert_eq!(c.category, ErrorCategory::System);
    }

    #[test]
    fn test_source_chain_rule() {
        let classifier = ErrorClassifier::new();
        let io_err = io::Error::new(io::ErrorKind::TimedOut, "read timed out");
        let c = classifier.classify(&Error::wrap("shipping quote", io_err));

        assert_eq!(c.category, ErrorCategory::ExternalService);
        assert_eq!(c.rule, "network_io");
    }

    #[test]
    fn test_context_wrapping_keeps_category() {
        let classifier = ErrorClassifier::new();
        let result: crate::Result<()> = Err(Error::payment("stripe", "card declined"));
        let err = result.context("placing order").unwrap_err();

        assert_eq!(classifier.classify(&err).category, ErrorCategory::Payment);
    }

    #[test]
    fn test_custom_rules_run_first_in_insertion_order() {
        let classifier = ErrorClassifier::new()
            .with_rule(ClassificationRule::new(
                "fraud",
                ErrorCategory::Security,
                ErrorSeverity::Critical,
                |e| matches!(e, Error::Payment { message, .. } if message.contains("fraud")),
            ))
            .with_rule(ClassificationRule::new(
                "any_payment",
                ErrorCategory::Payment,
                ErrorSeverity::Low,
                |e| matches!(e, Error::Payment { .. }),
            ));

        let names: Vec<_> = classifier.rules().take(2).map(|r| r.name().to_string()).collect();
        assert_eq!(names, vec!["fraud", "any_payment"]);

        let c = classifier.classify(&Error::payment("stripe", "fraud suspected"));
        assert_eq!(c.category, ErrorCategory::Security);

        let c = classifier.classify(&Error::payment("stripe", "insufficient funds"));
        assert_eq!(c.severity, ErrorSeverity::Low);
    }

    #[test]
    fn test_recoverability_and_retry_after() {
        let classifier = ErrorClassifier::new();

        let err = Error::database("update stock", "deadlock detected");
        assert!(classifier.is_recoverable(&err, ErrorCategory::Database));
        assert_eq!(
            classifier.retry_after(&err, ErrorCategory::Database),
            Some(Duration::from_secs(30))
        );

        let err = Error::database("insert user", "unique constraint violated");
        assert!(!classifier.is_recoverable(&err, ErrorCategory::Database));
        assert_eq!(classifier.retry_after(&err, ErrorCategory::Database), None);

        let err = Error::authentication("expired token");
        assert!(!classifier.is_recoverable(&err, ErrorCategory::Authentication));

        let err = Error::circuit_open("payments", Duration::from_secs(42));
        assert_eq!(
            classifier.retry_after(&err, ErrorCategory::ExternalService),
            Some(Duration::from_secs(42))
        );
    }

    #[test]
    fn test_recoverability_override_precedence() {
        let classifier = ErrorClassifier::new().with_recoverability_rule(RecoverabilityRule::new(
            "retry_all_db",
            true,
            |e| matches!(e, Error::Database { .. }),
        ));

        let err = Error::database("insert", "unique constraint violated");
        assert!(classifier.is_recoverable(&err, ErrorCategory::Database));
    }
}
