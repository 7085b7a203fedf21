//! The shared performance context
//!
//! One [`PerformanceContext`] is built at process start and handed to every
//! component that needs caching, monitoring or error handling. Clones share
//! all state. [`PerformanceContext::close`] stops background maintenance and
//! drains the audit queue.

use crate::errors::ErrorLog;
use crate::scope::{OperationScope, OperationStatus, Tags};
use mercado_cache::{CacheService, CacheStore, MemoryStore};
use mercado_core::audit::{
    AuditDispatcher, AuditEvent, AuditSink, JsonlAuditSink, TracingAuditSink,
};
use mercado_core::{
    CorrelationContext, CorrelationRegistry, Error, ErrorClassifier, ErrorContext,
    ErrorSeverity, PerformanceConfig, Result, ResultExt,
};
use mercado_metrics::{
    Alert, AlertEvaluator, AlertSeverity, AggregatorConfig, MetricsAggregator, OperationKind,
    PrometheusExporter, SysinfoCollector, SystemCollector,
};
use mercado_utils::{CircuitBreakerConfig, CircuitBreakerRegistry};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

const SLOW_QUERY_LOG_LEN: usize = 100;

/// A database operation slower than the slow-query threshold
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlowQuery {
    pub operation: String,
    pub duration_ms: f64,
    pub correlation_id: Option<String>,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

pub(crate) struct ContextInner {
    pub(crate) config: PerformanceConfig,
    pub(crate) cache: CacheService,
    pub(crate) metrics: MetricsAggregator,
    pub(crate) alerts: AlertEvaluator,
    pub(crate) breakers: CircuitBreakerRegistry,
    pub(crate) classifier: ErrorClassifier,
    pub(crate) correlations: CorrelationRegistry,
    pub(crate) audit: AuditDispatcher,
    pub(crate) exporter: PrometheusExporter,
    pub(crate) errors: ErrorLog,
    pub(crate) slow_queries: Mutex<VecDeque<SlowQuery>>,
    pub(crate) last_sweep: Mutex<Instant>,
    pub(crate) maintenance: Mutex<Option<JoinHandle<()>>>,
    pub(crate) shutdown: watch::Sender<bool>,
    pub(crate) started: Instant,
}

impl ContextInner {
    /// Record a finished operation and judge it against the SLA
    pub(crate) fn record_operation(
        &self,
        name: &str,
        elapsed: Duration,
        status: OperationStatus,
        tags: Tags,
        correlation_id: Option<&str>,
    ) {
        let duration_ms = elapsed.as_secs_f64() * 1000.0;
        let kind = OperationKind::from_tags(&tags);

        self.metrics.record_sample(name, duration_ms, tags);
        self.exporter.record_operation(name, status.as_str(), elapsed);
        debug!(operation = name, %status, duration_ms, "Operation finished");

        if let Some(alert) = self.alerts.check_latency(name, duration_ms, kind) {
            self.on_alert(&alert);
        }

        if kind == OperationKind::Database && duration_ms > self.config.sla.slow_query_ms {
            warn!(
                operation = name,
                duration_ms,
                threshold_ms = self.config.sla.slow_query_ms,
                "Slow query"
            );
            let mut log = self.slow_queries.lock();
            log.push_back(SlowQuery {
                operation: name.to_string(),
                duration_ms,
                correlation_id: correlation_id.map(str::to_string),
                timestamp: chrono::Utc::now(),
            });
            while log.len() > SLOW_QUERY_LOG_LEN {
                log.pop_front();
            }
        }

        if let Some(id) = correlation_id {
            self.correlations.record_event(
                id,
                "operation",
                format!("{name} {status} in {duration_ms:.1}ms"),
                HashMap::from([("operation".to_string(), name.to_string())]),
            );
        }
    }

    /// Count an alert and forward critical ones to the audit trail
    pub(crate) fn on_alert(&self, alert: &Alert) {
        self.exporter.record_alert(alert.severity.as_str());
        if alert.severity == AlertSeverity::Critical {
            let event = AuditEvent::new("alert.critical", ErrorSeverity::Critical).with_details(
                serde_json::json!({
                    "metric": alert.metric_name,
                    "value": alert.current_value,
                    "threshold": alert.threshold,
                    "message": alert.message,
                }),
            );
            self.audit.submit(event);
        }
    }
}

/// Cheap-to-clone handle to the performance layer
#[derive(Clone)]
pub struct PerformanceContext {
    pub(crate) inner: Arc<ContextInner>,
}

impl PerformanceContext {
    /// Build with defaults for every collaborator not in `config`.
    ///
    /// Must be called from within a Tokio runtime.
    pub async fn new(config: PerformanceConfig) -> Result<Self> {
        Self::builder(config).build().await
    }

    pub fn builder(config: PerformanceConfig) -> PerformanceContextBuilder {
        PerformanceContextBuilder {
            config,
            store: None,
            audit_sink: None,
            system: None,
            classifier: None,
        }
    }

    pub fn config(&self) -> &PerformanceConfig {
        &self.inner.config
    }

    pub fn cache(&self) -> &CacheService {
        &self.inner.cache
    }

    pub fn metrics(&self) -> &MetricsAggregator {
        &self.inner.metrics
    }

    pub fn alerts(&self) -> &AlertEvaluator {
        &self.inner.alerts
    }

    pub fn circuit_breakers(&self) -> &CircuitBreakerRegistry {
        &self.inner.breakers
    }

    pub fn classifier(&self) -> &ErrorClassifier {
        &self.inner.classifier
    }

    pub fn uptime(&self) -> Duration {
        self.inner.started.elapsed()
    }

    /// Start timing an operation.
    ///
    /// A `kind=db` tag judges the operation against database thresholds and
    /// the slow-query limit; everything else uses API thresholds.
    pub fn monitor_operation(&self, name: &str, tags: Tags) -> OperationScope {
        OperationScope::new(Arc::clone(&self.inner), name, tags)
    }

    /// Open a correlation context for a new request and return its id
    pub fn begin_request(
        &self,
        user_id: Option<&str>,
        endpoint: Option<&str>,
        ip_address: Option<&str>,
    ) -> String {
        self.inner.correlations.begin(
            user_id.map(str::to_string),
            endpoint.map(str::to_string),
            ip_address.map(str::to_string),
        )
    }

    /// Close a request's correlation context and return its timeline
    pub fn end_request(&self, correlation_id: &str) -> Option<CorrelationContext> {
        self.inner.correlations.end(correlation_id)
    }

    /// Append to a request timeline; `false` if the context is gone
    pub fn record_event(
        &self,
        correlation_id: &str,
        kind: impl Into<String>,
        message: impl Into<String>,
    ) -> bool {
        self.inner
            .correlations
            .record_event(correlation_id, kind, message, HashMap::new())
    }

    pub fn correlation(&self, correlation_id: &str) -> Option<CorrelationContext> {
        self.inner.correlations.get(correlation_id)
    }

    /// Error context pre-filled from a live correlation context
    pub fn error_context(&self, correlation_id: &str) -> ErrorContext {
        let mut context = ErrorContext::new().with_correlation_id(correlation_id);
        if let Some(request) = self.inner.correlations.get(correlation_id) {
            context.user_id = request.user_id;
            context.endpoint = request.endpoint;
            context.ip_address = request.ip_address;
        }
        context
    }

    /// Stop maintenance and flush pending audit events
    pub async fn close(&self) {
        let _ = self.inner.shutdown.send(true);
        let handle = self.inner.maintenance.lock().take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                warn!(error = %e, "Maintenance task ended abnormally");
            }
        }
        self.inner.audit.close().await;
        info!("Performance context closed");
    }
}

impl std::fmt::Debug for PerformanceContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PerformanceContext")
            .field("operations", &self.inner.metrics.operations().len())
            .field("breakers", &self.inner.breakers.len())
            .field("correlations", &self.inner.correlations.len())
            .finish()
    }
}

/// Builder for [`PerformanceContext`]
pub struct PerformanceContextBuilder {
    config: PerformanceConfig,
    store: Option<Arc<dyn CacheStore>>,
    audit_sink: Option<Arc<dyn AuditSink>>,
    system: Option<Arc<dyn SystemCollector>>,
    classifier: Option<ErrorClassifier>,
}

impl PerformanceContextBuilder {
    /// Cache backend; defaults to an in-process [`MemoryStore`]
    pub fn store(mut self, store: Arc<dyn CacheStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Audit sink; defaults to the JSON lines file from the config, else
    /// the `audit` log target
    pub fn audit_sink(mut self, sink: Arc<dyn AuditSink>) -> Self {
        self.audit_sink = Some(sink);
        self
    }

    pub fn system_collector(mut self, system: Arc<dyn SystemCollector>) -> Self {
        self.system = Some(system);
        self
    }

    pub fn classifier(mut self, classifier: ErrorClassifier) -> Self {
        self.classifier = Some(classifier);
        self
    }

    pub async fn build(self) -> Result<PerformanceContext> {
        self.config.validate()?;
        let config = self.config;

        let audit_sink: Arc<dyn AuditSink> = match (self.audit_sink, &config.audit.jsonl_path) {
            (Some(sink), _) => sink,
            (None, Some(path)) => Arc::new(
                JsonlAuditSink::open(path)
                    .await
                    .map_err(|e| Error::file_system(path.clone(), "open", e))?,
            ),
            (None, None) => Arc::new(TracingAuditSink),
        };

        let store = self
            .store
            .unwrap_or_else(|| Arc::new(MemoryStore::new()) as Arc<dyn CacheStore>);
        let system = self
            .system
            .unwrap_or_else(|| Arc::new(SysinfoCollector::new()) as Arc<dyn SystemCollector>);

        let exporter = PrometheusExporter::new()
            .map_err(|e| Error::other(format!("failed to create metrics exporter: {e}")))?;

        let (shutdown, _) = watch::channel(false);
        let inner = ContextInner {
            cache: CacheService::new(store, &config.cache),
            metrics: MetricsAggregator::with_collector(
                AggregatorConfig::from(&config.metrics),
                system,
            ),
            alerts: AlertEvaluator::new(config.sla.clone(), &config.alerts),
            breakers: CircuitBreakerRegistry::new(CircuitBreakerConfig::from(&config.breaker)),
            classifier: self.classifier.unwrap_or_default(),
            correlations: CorrelationRegistry::new(config.correlation.max_age()),
            audit: AuditDispatcher::new(audit_sink, config.audit.queue_capacity),
            exporter,
            errors: ErrorLog::new(config.errors.recent_errors),
            slow_queries: Mutex::new(VecDeque::new()),
            last_sweep: Mutex::new(Instant::now()),
            maintenance: Mutex::new(None),
            shutdown,
            started: Instant::now(),
            config,
        };

        info!(
            store = %inner.cache.store().store_type(),
            audit_queue = inner.config.audit.queue_capacity,
            "Performance context ready"
        );
        Ok(PerformanceContext {
            inner: Arc::new(inner),
        })
    }
}

/// Load configuration from disk and environment, then build
pub async fn from_config_file(path: Option<&std::path::Path>) -> Result<PerformanceContext> {
    let mut loader = mercado_core::config::ConfigLoader::new();
    if let Some(path) = path {
        loader = loader.file(path);
    }
    let config = loader.load().context("loading performance configuration")?;
    PerformanceContext::new(config).await
}
