//! Activity Routes
//!
//! Activity search pages.
//!
//! - GET /search - Search across all groups
//! - GET /groups/:pubid/search - Search within one group
//! - GET /users/:username/search - Search one user's annotations
//!
//! A search naming exactly one group and/or user on `/search` answers with
//! `302 Found` pointing at the scoped page instead of results.

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;

use crate::activity::{self, check_redirect, extract, ExecuteOptions, RouteContext};
use crate::api::dto::{ActivityParams, ActivityResponse};
use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;

/// GET /search
pub async fn search(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ActivityParams>,
) -> ApiResult<Response> {
    respond(state, RouteContext::Search, params).await
}

/// GET /groups/:pubid/search
pub async fn group_search(
    State(state): State<Arc<AppState>>,
    Path(pubid): Path<String>,
    Query(params): Query<ActivityParams>,
) -> ApiResult<Response> {
    respond(state, RouteContext::group(pubid), params).await
}

/// GET /users/:username/search
pub async fn user_search(
    State(state): State<Arc<AppState>>,
    Path(username): Path<String>,
    Query(params): Query<ActivityParams>,
) -> ApiResult<Response> {
    respond(state, RouteContext::user(username), params).await
}

async fn respond(
    state: Arc<AppState>,
    route: RouteContext,
    params: ActivityParams,
) -> ApiResult<Response> {
    let Some(mut query) = extract(params.q.as_deref(), &route, state.syntax.as_ref())? else {
        return Ok(Json(ActivityResponse {
            q: None,
            results: None,
        })
        .into_response());
    };

    if let Some(target) = check_redirect(&route, &mut query, state.syntax.as_ref()) {
        return Ok((StatusCode::FOUND, [(header::LOCATION, target.location())]).into_response());
    }

    let options = ExecuteOptions::new(state.page_size);
    let db = Arc::clone(&state.db);
    let results = tokio::task::spawn_blocking(move || {
        activity::execute(db.as_ref(), db.as_ref(), &query, &options)
    })
    .await
    .map_err(|e| ApiError::Internal(format!("Search task failed: {}", e)))??;

    tracing::info!(
        route = %route.path(),
        total = results.total,
        "Activity search served"
    );

    Ok(Json(ActivityResponse {
        q: params.q,
        results: Some(results),
    })
    .into_response())
}
