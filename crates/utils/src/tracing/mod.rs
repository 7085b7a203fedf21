//! Logging initialisation and span helpers

use mercado_core::constants::MERCADO_LOG_VAR;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

// Re-export tracing macros for convenience
pub use tracing::{debug, error, info, instrument, span, trace, warn, Level, Span};

/// Directive used when neither `MERCADO_LOG` nor `RUST_LOG` is set
pub const DEFAULT_DIRECTIVE: &str = "info";

/// Install the global subscriber.
///
/// The filter comes from `MERCADO_LOG`, then `RUST_LOG`, then
/// [`DEFAULT_DIRECTIVE`]. `log` records from the resilience utilities are
/// bridged into the same output. Interactive terminals get ANSI colour and
/// targets; anything else gets a compact plain format.
pub fn init_tracing() -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>> {
    let filter = resolve_filter(
        std::env::var(MERCADO_LOG_VAR).ok(),
        std::env::var(EnvFilter::DEFAULT_ENV).ok(),
    );

    let tty = is_tty();
    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(tty)
        .with_target(tty)
        .with_thread_ids(false)
        .with_level(true)
        .compact();

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}

/// First parseable directive wins; invalid ones fall through
fn resolve_filter(mercado_log: Option<String>, rust_log: Option<String>) -> EnvFilter {
    [mercado_log, rust_log]
        .into_iter()
        .flatten()
        .find_map(|directive| EnvFilter::try_new(directive).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_DIRECTIVE))
}

/// Check if we're running in a TTY environment
fn is_tty() -> bool {
    std::io::IsTerminal::is_terminal(&std::io::stderr())
}

/// Span wrapping one monitored operation
pub fn operation_span(operation: &str, correlation_id: Option<&str>) -> Span {
    span!(
        Level::INFO,
        "operation",
        operation = %operation,
        correlation_id = correlation_id.unwrap_or("")
    )
}
