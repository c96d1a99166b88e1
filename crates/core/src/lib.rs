//! Shared data model, error taxonomy, and configuration for the listing ads engine.

pub mod config;
pub mod error;
pub mod types;

pub use config::AppConfig;
pub use error::{CampaignError, CampaignResult, QuotaError, QuotaErrorKind};
