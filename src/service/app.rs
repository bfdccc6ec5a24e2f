//! Main application state and service coordination
//!
//! This module contains the production AppState that wires the spreadsheet
//! backend, the authenticator and the ledger together, and runs the
//! background maintenance task.

use crate::auth::{JwtPermissionAuthenticator, PermissionAuthenticator, StaticPermissionAuthenticator};
use crate::config::{AppConfig, AuthBackend, SheetsBackend};
use crate::ledger::MatchLedger;
use crate::metrics::MetricsCollector;
use crate::service::health::{ComponentCheck, HealthCheck, HealthStatus};
use crate::sheets::{GoogleSheetsClient, InMemorySheets, SheetsClient};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::Duration;
use tracing::{debug, info, warn};

/// Interval of the uptime/health metrics refresh
const METRICS_REFRESH_INTERVAL: Duration = Duration::from_secs(30);

/// Service-level errors
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Service initialization error: {message}")]
    Initialization { message: String },
}

/// Main application state containing all service components
pub struct AppState {
    /// Application configuration
    config: AppConfig,

    /// Reads and writes the match sheets
    ledger: MatchLedger,

    /// Resolves bearer tokens into permissions
    authenticator: Arc<dyn PermissionAuthenticator>,

    /// Prometheus metrics
    metrics_collector: Arc<MetricsCollector>,

    /// Background task handles
    background_tasks: Mutex<Vec<JoinHandle<()>>>,

    /// Service status
    is_running: Arc<RwLock<bool>>,

    /// Last spreadsheet health check and when it ran
    sheets_check: Mutex<Option<(Instant, ComponentCheck)>>,

    started_at: Instant,
}

impl AppState {
    /// Initialize the application with the backends named in `config`
    pub async fn new(config: AppConfig) -> Result<Self, ServiceError> {
        info!("Initializing {} match tracker service", config.service.name);
        info!(
            "Configuration: sheets_backend={:?}, auth_backend={:?}, port={}",
            config.sheets.backend, config.auth.backend, config.service.http_port
        );

        let metrics_collector =
            Arc::new(
                MetricsCollector::new().map_err(|e| ServiceError::Initialization {
                    message: format!("Failed to create metrics collector: {}", e),
                })?,
            );

        let sheets = Self::initialize_sheets(&config, metrics_collector.clone())?;
        let authenticator = Self::initialize_authenticator(&config)?;

        Ok(Self::from_parts(config, sheets, authenticator, metrics_collector))
    }

    /// Assemble the state from already built components
    pub fn from_parts(
        config: AppConfig,
        sheets: Arc<dyn SheetsClient>,
        authenticator: Arc<dyn PermissionAuthenticator>,
        metrics_collector: Arc<MetricsCollector>,
    ) -> Self {
        let ledger = MatchLedger::with_metrics(
            sheets,
            config.sheets.clone(),
            config.competition.clone(),
            metrics_collector.clone(),
        );

        Self {
            config,
            ledger,
            authenticator,
            metrics_collector,
            background_tasks: Mutex::new(Vec::new()),
            is_running: Arc::new(RwLock::new(false)),
            sheets_check: Mutex::new(None),
            started_at: Instant::now(),
        }
    }

    /// Mark the service running and start background tasks
    pub async fn start(self: &Arc<Self>) -> Result<(), ServiceError> {
        info!("Starting {} service", self.config.service.name);

        *self.is_running.write().await = true;
        self.start_background_tasks().await;

        info!("✅ {} service started", self.config.service.name);
        Ok(())
    }

    /// Perform graceful shutdown
    pub async fn shutdown(&self) -> Result<(), ServiceError> {
        info!("Starting graceful shutdown of {}", self.config.service.name);

        *self.is_running.write().await = false;

        let tasks: Vec<JoinHandle<()>> = self.background_tasks.lock().await.drain(..).collect();
        for task in tasks {
            task.abort();
            if let Err(e) = task.await {
                if !e.is_cancelled() {
                    warn!("Background task ended with error: {}", e);
                }
            }
        }

        self.metrics_collector.update_health_status(0);
        info!("✅ {} shutdown completed", self.config.service.name);
        Ok(())
    }

    /// Get service configuration
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Check if service is running
    pub async fn is_running(&self) -> bool {
        *self.is_running.read().await
    }

    pub fn ledger(&self) -> &MatchLedger {
        &self.ledger
    }

    pub fn authenticator(&self) -> Arc<dyn PermissionAuthenticator> {
        self.authenticator.clone()
    }

    /// Get metrics collector
    pub fn metrics_collector(&self) -> Arc<MetricsCollector> {
        self.metrics_collector.clone()
    }

    pub(crate) fn sheets_check_cache(&self) -> &Mutex<Option<(Instant, ComponentCheck)>> {
        &self.sheets_check
    }

    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Build the spreadsheet client for the configured backend
    fn initialize_sheets(
        config: &AppConfig,
        metrics_collector: Arc<MetricsCollector>,
    ) -> Result<Arc<dyn SheetsClient>, ServiceError> {
        match config.sheets.backend {
            SheetsBackend::Google => {
                info!(
                    "Using Google Sheets backend for spreadsheet {}",
                    config.sheets.spreadsheet_id
                );
                let client = GoogleSheetsClient::new(
                    &config.sheets,
                    config.sheets_request_timeout(),
                    metrics_collector,
                )
                .map_err(|e| ServiceError::Initialization {
                    message: format!("Failed to create Google Sheets client: {}", e),
                })?;
                Ok(Arc::new(client))
            }
            SheetsBackend::Memory => {
                warn!("Using in-memory sheets backend; results are lost on restart");
                Ok(Arc::new(InMemorySheets::new()))
            }
        }
    }

    /// Build the authenticator for the configured backend
    fn initialize_authenticator(
        config: &AppConfig,
    ) -> Result<Arc<dyn PermissionAuthenticator>, ServiceError> {
        match config.auth.backend {
            AuthBackend::Jwt => {
                let authenticator = JwtPermissionAuthenticator::from_settings(&config.auth)
                    .map_err(|e| ServiceError::Configuration {
                        message: e.to_string(),
                    })?;
                Ok(Arc::new(authenticator))
            }
            AuthBackend::Static => {
                info!(
                    "Using static token authenticator with {} tokens",
                    config.auth.static_tokens.len()
                );
                Ok(Arc::new(StaticPermissionAuthenticator::new(
                    config.auth.static_tokens.clone(),
                )))
            }
        }
    }

    /// Start background maintenance tasks
    async fn start_background_tasks(self: &Arc<Self>) {
        info!(
            "Starting metrics refresh task ({}s interval)",
            METRICS_REFRESH_INTERVAL.as_secs()
        );

        let state = Arc::clone(self);
        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(METRICS_REFRESH_INTERVAL);
            loop {
                interval.tick().await;
                if !state.is_running().await {
                    break;
                }

                let collector = state.metrics_collector();
                collector.update_uptime(state.uptime());
                match HealthCheck::liveness_check(state.clone()).await {
                    Ok(status) => {
                        collector.update_health_status(match status {
                            HealthStatus::Healthy => 2,
                            HealthStatus::Degraded => 1,
                            HealthStatus::Unhealthy => 0,
                        });
                        debug!("Metrics refreshed, service {}", status);
                    }
                    Err(e) => warn!("Health refresh failed: {}", e),
                }
            }
            debug!("Metrics refresh task stopped");
        });

        self.background_tasks.lock().await.push(task);
    }
}
