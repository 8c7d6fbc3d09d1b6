//! Data Transfer Objects
//!
//! Request and response types for the API endpoints.
//! These types are serialized/deserialized to/from JSON.

use serde::{Deserialize, Serialize};

use crate::activity::ActivityResults;
use crate::groups::ValidationErrors;

// ============================================
// ACTIVITY DTOs
// ============================================

/// Query parameters of the activity pages
#[derive(Debug, Default, Deserialize)]
pub struct ActivityParams {
    /// Raw search query, absent when the page is opened without searching
    #[serde(default)]
    pub q: Option<String>,
}

/// Activity page response
#[derive(Debug, Serialize)]
pub struct ActivityResponse {
    /// Raw search query as submitted
    pub q: Option<String>,
    /// Search results, absent when no query was submitted
    pub results: Option<ActivityResults>,
}

// ============================================
// GROUP DTOs
// ============================================

/// Query parameters of the group form validation endpoint
#[derive(Debug, Default, Deserialize)]
pub struct ValidateParams {
    /// Validate against the legacy form
    #[serde(default)]
    pub legacy: bool,
}

/// Rejected group form
#[derive(Debug, Serialize)]
pub struct ValidationErrorResponse {
    /// Field name → messages
    pub errors: ValidationErrors,
}

// ============================================
// HEALTH DTOs
// ============================================

/// Full health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Overall status: healthy or unhealthy
    pub status: String,
    /// Database status
    pub storage: String,
    /// Number of stored annotations, if the database answered
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annotations: Option<u64>,
    /// Number of reserved group slugs
    pub blacklist_entries: usize,
    /// Server uptime in seconds
    pub uptime_seconds: u64,
    /// Application version
    pub version: String,
}
