//! Group Routes
//!
//! - POST /groups/validate - Validate a create-group form
//! - POST /groups/validate?legacy=true - Validate the legacy form

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;

use crate::api::dto::{ValidateParams, ValidationErrorResponse};
use crate::api::state::AppState;
use crate::groups::{GroupForm, GroupSchema, LegacyGroupSchema};

/// POST /groups/validate
///
/// Returns the cleaned form, or 422 with messages per field.
pub async fn validate_group(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ValidateParams>,
    Json(form): Json<GroupForm>,
) -> Response {
    let result = if params.legacy {
        LegacyGroupSchema.validate(&form)
    } else {
        GroupSchema::with_blacklist(Arc::clone(&state.blacklist)).validate(&form)
    };

    match result {
        Ok(valid) => (StatusCode::OK, Json(valid)).into_response(),
        Err(errors) => {
            tracing::debug!(legacy = params.legacy, "{}", errors);
            (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(ValidationErrorResponse { errors }),
            )
                .into_response()
        }
    }
}
