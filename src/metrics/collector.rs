//! Metrics collection using Prometheus
//!
//! This module provides metrics collection for the match tracker service
//! using Prometheus metrics.

use crate::types::{Draw, DrawKind};
use anyhow::Result;
use prometheus::{
    HistogramOpts, HistogramVec, IntCounterVec, IntGauge, IntGaugeVec, Opts, Registry,
};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Main metrics collector for the match tracker
#[derive(Clone)]
pub struct MetricsCollector {
    /// Prometheus registry
    registry: Arc<Registry>,

    /// Service-level metrics
    service_metrics: ServiceMetrics,

    /// Spreadsheet API metrics
    sheet_metrics: SheetMetrics,

    /// Match submission and standings metrics
    match_metrics: MatchMetrics,
}

/// Service-level metrics
#[derive(Clone)]
pub struct ServiceMetrics {
    /// Service uptime in seconds
    pub uptime_seconds: IntGauge,

    /// HTTP requests served
    pub http_requests_total: IntCounterVec,

    /// Health check status (0=unhealthy, 1=degraded, 2=healthy)
    pub health_status: IntGauge,

    /// Component health status
    pub component_health: IntGaugeVec,
}

/// Spreadsheet API metrics
#[derive(Clone)]
pub struct SheetMetrics {
    /// Spreadsheet API calls by operation and outcome
    pub sheet_requests_total: IntCounterVec,

    /// Spreadsheet API call durations
    pub sheet_request_duration: HistogramVec,
}

/// Match submission and standings metrics
#[derive(Clone)]
pub struct MatchMetrics {
    /// Results appended to the sheet
    pub matches_submitted_total: IntCounterVec,

    /// Submissions turned away
    pub submissions_rejected_total: IntCounterVec,

    /// Time spent computing standings
    pub standings_duration: HistogramVec,
}

impl MetricsCollector {
    /// Create a new metrics collector with default registry
    pub fn new() -> Result<Self> {
        let registry = Arc::new(Registry::new());
        Self::with_registry(registry)
    }

    /// Create a new metrics collector with custom registry
    pub fn with_registry(registry: Arc<Registry>) -> Result<Self> {
        let service_metrics = ServiceMetrics::new(&registry)?;
        let sheet_metrics = SheetMetrics::new(&registry)?;
        let match_metrics = MatchMetrics::new(&registry)?;

        Ok(Self {
            registry,
            service_metrics,
            sheet_metrics,
            match_metrics,
        })
    }

    /// Get the Prometheus registry
    pub fn registry(&self) -> Arc<Registry> {
        self.registry.clone()
    }

    /// Get service metrics
    pub fn service(&self) -> &ServiceMetrics {
        &self.service_metrics
    }

    /// Get spreadsheet metrics
    pub fn sheets(&self) -> &SheetMetrics {
        &self.sheet_metrics
    }

    /// Get match metrics
    pub fn matches(&self) -> &MatchMetrics {
        &self.match_metrics
    }

    /// Record an HTTP request being answered
    pub fn record_http_request(&self, route: &str, status: u16) {
        self.service_metrics
            .http_requests_total
            .with_label_values(&[route, &status.to_string()])
            .inc();
    }

    /// Record a spreadsheet API call
    pub fn record_sheet_request(&self, operation: &str, success: bool, duration: Duration) {
        let status = if success { "success" } else { "error" };

        self.sheet_metrics
            .sheet_requests_total
            .with_label_values(&[operation, status])
            .inc();

        self.sheet_metrics
            .sheet_request_duration
            .with_label_values(&[operation])
            .observe(duration.as_secs_f64());
    }

    /// Record a result appended to the sheet
    pub fn record_match_submitted(&self, draw: Draw) {
        self.match_metrics
            .matches_submitted_total
            .with_label_values(&[draw.as_str()])
            .inc();
    }

    /// Record a submission that was turned away
    pub fn record_submission_rejected(&self, reason: &str) {
        self.match_metrics
            .submissions_rejected_total
            .with_label_values(&[reason])
            .inc();
    }

    /// Record standings computation duration
    pub fn record_standings(&self, kind: DrawKind, duration: Duration) {
        let kind_str = match kind {
            DrawKind::Singles => "singles",
            DrawKind::Doubles => "doubles",
        };

        self.match_metrics
            .standings_duration
            .with_label_values(&[kind_str])
            .observe(duration.as_secs_f64());
    }

    /// Update health status
    pub fn update_health_status(&self, status: u8) {
        self.service_metrics.health_status.set(status as i64);
    }

    /// Update component health
    pub fn update_component_health(&self, component: &str, healthy: bool) {
        let status = if healthy { 1 } else { 0 };
        self.service_metrics
            .component_health
            .with_label_values(&[component])
            .set(status);
    }

    /// Update uptime gauge
    pub fn update_uptime(&self, uptime: Duration) {
        self.service_metrics
            .uptime_seconds
            .set(uptime.as_secs() as i64);
    }

    /// Create a timer for measuring operation duration
    pub fn start_timer(&self) -> MetricsTimer {
        MetricsTimer::new()
    }
}

/// Timer for measuring operation durations
pub struct MetricsTimer {
    start: Instant,
}

impl MetricsTimer {
    fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Get the elapsed duration
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Stop the timer and return the duration
    pub fn stop(self) -> Duration {
        self.elapsed()
    }
}

impl ServiceMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let uptime_seconds =
            IntGauge::new("rally_ledger_uptime_seconds", "Service uptime in seconds")?;
        registry.register(Box::new(uptime_seconds.clone()))?;

        let http_requests_total = IntCounterVec::new(
            Opts::new("rally_ledger_http_requests_total", "HTTP requests served"),
            &["route", "status"],
        )?;
        registry.register(Box::new(http_requests_total.clone()))?;

        let health_status = IntGauge::new(
            "rally_ledger_health_status",
            "Health status (0=unhealthy, 1=degraded, 2=healthy)",
        )?;
        registry.register(Box::new(health_status.clone()))?;

        let component_health = IntGaugeVec::new(
            Opts::new("rally_ledger_component_health", "Component health status"),
            &["component"],
        )?;
        registry.register(Box::new(component_health.clone()))?;

        Ok(Self {
            uptime_seconds,
            http_requests_total,
            health_status,
            component_health,
        })
    }
}

impl SheetMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let sheet_requests_total = IntCounterVec::new(
            Opts::new(
                "rally_ledger_sheet_requests_total",
                "Spreadsheet API calls by operation and outcome",
            ),
            &["operation", "status"],
        )?;
        registry.register(Box::new(sheet_requests_total.clone()))?;

        let sheet_request_duration = HistogramVec::new(
            HistogramOpts::new(
                "rally_ledger_sheet_request_duration_seconds",
                "Spreadsheet API call duration",
            )
            .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]),
            &["operation"],
        )?;
        registry.register(Box::new(sheet_request_duration.clone()))?;

        Ok(Self {
            sheet_requests_total,
            sheet_request_duration,
        })
    }
}

impl MatchMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let matches_submitted_total = IntCounterVec::new(
            Opts::new(
                "rally_ledger_matches_submitted_total",
                "Match results appended to the sheet",
            ),
            &["draw"],
        )?;
        registry.register(Box::new(matches_submitted_total.clone()))?;

        let submissions_rejected_total = IntCounterVec::new(
            Opts::new(
                "rally_ledger_submissions_rejected_total",
                "Match submissions turned away",
            ),
            &["reason"],
        )?;
        registry.register(Box::new(submissions_rejected_total.clone()))?;

        let standings_duration = HistogramVec::new(
            HistogramOpts::new(
                "rally_ledger_standings_duration_seconds",
                "Time spent computing standings",
            )
            .buckets(vec![0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05]),
            &["kind"],
        )?;
        registry.register(Box::new(standings_duration.clone()))?;

        Ok(Self {
            matches_submitted_total,
            submissions_rejected_total,
            standings_duration,
        })
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new().expect("Failed to create default metrics collector")
    }
}
