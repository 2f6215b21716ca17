//! Per-request authentication gate.
//!
//! Runs before any handler. Exempt paths pass straight through without
//! touching credentials; everything else must resolve to a [`Principal`],
//! which is attached to the request extensions for handlers to pick up with
//! the [`Authenticated`] extractor.

use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::debug;

use super::credentials::{Credentials, extract_credentials};
use super::errors::AuthError;
use super::policy::AccessPolicy;
use super::store::PrincipalResolver;
use super::types::Principal;

pub struct RequestGate {
    policy: Arc<AccessPolicy>,
    resolver: Arc<dyn PrincipalResolver>,
    allow_basic_auth: bool,
}

/// What the gate decided for one request.
#[derive(Debug)]
pub enum GateOutcome {
    ExemptAllowed,
    Authenticated(Principal),
    Rejected(AuthError),
}

impl RequestGate {
    pub fn new(
        policy: Arc<AccessPolicy>,
        resolver: Arc<dyn PrincipalResolver>,
        allow_basic_auth: bool,
    ) -> Self {
        Self {
            policy,
            resolver,
            allow_basic_auth,
        }
    }

    pub fn policy(&self) -> &AccessPolicy {
        &self.policy
    }

    pub async fn check(&self, path: &str, headers: &HeaderMap) -> GateOutcome {
        if !self.policy.requires_auth(path) {
            return GateOutcome::ExemptAllowed;
        }

        match self.authenticate(headers).await {
            Ok(principal) => GateOutcome::Authenticated(principal),
            Err(e) => GateOutcome::Rejected(e),
        }
    }

    /// Resolve whatever credentials the headers carry, ignoring the policy.
    pub async fn authenticate(&self, headers: &HeaderMap) -> Result<Principal, AuthError> {
        match extract_credentials(headers) {
            Some(Credentials::Bearer(token)) => {
                self.resolver.load_principal_by_token(&token).await
            }
            Some(Credentials::Basic { username, password }) if self.allow_basic_auth => {
                // A bad Basic login on a resource is a missing session, not a failed login.
                self.resolver
                    .load_principal_by_password(&username, &password)
                    .await
                    .map_err(|e| match e {
                        AuthError::AuthenticationFailed => AuthError::Unauthenticated,
                        other => other,
                    })
            }
            _ => Err(AuthError::Unauthenticated),
        }
    }
}

/// Middleware wrapping the whole router.
pub async fn request_gate(
    State(gate): State<Arc<RequestGate>>,
    mut request: Request,
    next: Next,
) -> Response {
    let outcome = gate.check(request.uri().path(), request.headers()).await;

    match outcome {
        GateOutcome::ExemptAllowed => {
            debug!(path = %request.uri().path(), "Exempt path");
            next.run(request).await
        }
        GateOutcome::Authenticated(principal) => {
            debug!(path = %request.uri().path(), user = %principal.username, "Request authenticated");
            request.extensions_mut().insert(principal);
            next.run(request).await
        }
        GateOutcome::Rejected(e) => {
            debug!(path = %request.uri().path(), error = %e, "Request rejected");
            e.into_response()
        }
    }
}

/// Extractor for the principal the gate attached to the request.
pub struct Authenticated(pub Principal);

impl<S> FromRequestParts<S> for Authenticated
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Principal>()
            .cloned()
            .map(Authenticated)
            .ok_or(AuthError::Unauthenticated)
    }
}
