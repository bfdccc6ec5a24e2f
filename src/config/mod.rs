//! Configuration management for the match tracker service
//!
//! This module handles all configuration loading from environment variables
//! and TOML files, validation, and default values.

pub mod app;

// Re-export commonly used types
pub use app::{
    validate_config, AppConfig, AuthBackend, AuthSettings, CompetitionSettings, DrawSheets,
    ServiceSettings, SheetsBackend, SheetsSettings,
};
