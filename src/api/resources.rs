//! Generic Redfish resource reads served from the document store.
//!
//! Anything under `/redfish/v1` without a dedicated route lands here. The
//! request gate has already authenticated the caller by the time it does.

use axum::{
    Json, Router,
    extract::State,
    http::{Method, Uri},
};
use serde_json::Value;

use super::error::{ApiError, ResultExt};
use crate::db::Database;

#[derive(Clone)]
pub struct ResourcesState {
    pub db: Database,
}

/// Router whose fallback answers every unrouted request.
pub fn router(state: ResourcesState) -> Router {
    Router::new().fallback(get_resource).with_state(state)
}

/// Strip trailing slashes so `/redfish/v1/Chassis/` and `/redfish/v1/Chassis` are one resource.
pub fn normalize_odata_id(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() { "/" } else { trimmed }
}

async fn get_resource(
    State(state): State<ResourcesState>,
    method: Method,
    uri: Uri,
) -> Result<Json<Value>, ApiError> {
    let odata_id = normalize_odata_id(uri.path());

    if !odata_id.starts_with("/redfish/v1/") {
        return Err(ApiError::not_found("Resource not found"));
    }

    if method != Method::GET {
        return Err(ApiError::method_not_allowed(format!(
            "{} is not supported on {}",
            method, odata_id
        )));
    }

    state
        .db
        .resources()
        .get(odata_id)
        .await
        .store_err("Failed to load resource")?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("No resource at {}", odata_id)))
}
