//! Metrics for the match tracker
//!
//! This module provides Prometheus metrics for HTTP requests, spreadsheet
//! calls and match submissions. They are served by the `/metrics` endpoint.

pub mod collector;

pub use collector::{MatchMetrics, MetricsCollector, MetricsTimer, ServiceMetrics, SheetMetrics};
