//! Session service endpoints.
//!
//! - GET `/redfish/v1/SessionService` - Service settings
//! - POST `/redfish/v1/SessionService/Sessions` - Log in, returns `X-Auth-Token`
//! - GET `/redfish/v1/SessionService/Sessions` - List visible sessions
//! - GET `/redfish/v1/SessionService/Sessions/{id}` - Session details (own or admin)
//! - DELETE `/redfish/v1/SessionService/Sessions/{id}` - Log out (own or admin)

use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    http::{HeaderMap, HeaderName, StatusCode, header::LOCATION},
    response::IntoResponse,
    routing::get,
};
use chrono::{DateTime, SecondsFormat};
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;

use super::error::ApiError;
use crate::auth::{
    AuthError, Authenticated, RequestGate, SESSIONS_PATH, Session, SessionAuthority, X_AUTH_TOKEN,
};

#[derive(Clone)]
pub struct SessionsState {
    pub authority: Arc<SessionAuthority>,
    /// The collection path is exempt (it is the login endpoint), so listing authenticates itself.
    pub gate: Arc<RequestGate>,
}

pub fn router(state: SessionsState) -> Router {
    Router::new()
        .route("/redfish/v1/SessionService", get(session_service))
        .route(SESSIONS_PATH, get(list_sessions).post(create_session))
        .route(
            &format!("{}/{{id}}", SESSIONS_PATH),
            get(get_session).delete(delete_session),
        )
        .with_state(state)
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct LoginRequest {
    user_name: String,
    password: String,
}

fn session_uri(session_id: &str) -> String {
    format!("{}/{}", SESSIONS_PATH, session_id)
}

fn session_resource(session: &Session) -> Value {
    let created = i64::try_from(session.created_at)
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true));

    json!({
        "@odata.id": session_uri(&session.session_id),
        "@odata.type": "#Session.v1_6_0.Session",
        "Id": session.session_id,
        "Name": "User Session",
        "UserName": session.username,
        "CreatedTime": created,
    })
}

async fn session_service(
    State(state): State<SessionsState>,
    Authenticated(_principal): Authenticated,
) -> Json<Value> {
    Json(json!({
        "@odata.id": "/redfish/v1/SessionService",
        "@odata.type": "#SessionService.v1_1_8.SessionService",
        "Id": "SessionService",
        "Name": "Session Service",
        "ServiceEnabled": true,
        "SessionTimeout": state.authority.settings().session_timeout_secs,
        "Sessions": { "@odata.id": SESSIONS_PATH },
    }))
}

async fn create_session(
    State(state): State<SessionsState>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(login) =
        body.map_err(|_| ApiError::bad_request("Request body must contain UserName and Password"))?;

    let created = state
        .authority
        .create_session(&login.user_name, &login.password)
        .await?;

    let headers = [
        (LOCATION, session_uri(&created.session.session_id)),
        (HeaderName::from_static(X_AUTH_TOKEN), created.token),
    ];

    Ok((
        StatusCode::CREATED,
        headers,
        Json(session_resource(&created.session)),
    ))
}

async fn list_sessions(
    State(state): State<SessionsState>,
    headers: HeaderMap,
) -> Result<Json<Value>, ApiError> {
    let principal = state.gate.authenticate(&headers).await?;
    let sessions = state.authority.list_sessions(&principal).await?;

    let members: Vec<Value> = sessions
        .iter()
        .map(|s| json!({ "@odata.id": session_uri(&s.session_id) }))
        .collect();

    Ok(Json(json!({
        "@odata.id": SESSIONS_PATH,
        "@odata.type": "#SessionCollection.SessionCollection",
        "Name": "Session Collection",
        "Members@odata.count": members.len(),
        "Members": members,
    })))
}

async fn get_session(
    State(state): State<SessionsState>,
    Authenticated(principal): Authenticated,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let session = state.authority.get_session(&id).await?;

    // Other users' sessions are invisible, not forbidden.
    if !principal.can_manage(&session) {
        return Err(AuthError::SessionNotFound.into());
    }

    Ok(Json(session_resource(&session)))
}

async fn delete_session(
    State(state): State<SessionsState>,
    Authenticated(principal): Authenticated,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    // Ownership is checked on the stored record, so an expired one still belongs to its user.
    let stored = state.authority.lookup_session(&id).await?;
    if stored.is_some_and(|session| !principal.can_manage(&session)) {
        return Err(ApiError::forbidden(
            "Only administrators may delete other users' sessions",
        ));
    }

    state.authority.invalidate_session(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
