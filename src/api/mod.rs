pub mod error;
mod resources;
mod service_root;
mod sessions;

use axum::Router;
use std::sync::Arc;

use crate::auth::{RequestGate, SessionAuthority};
use crate::db::Database;

pub use resources::normalize_odata_id;

/// Create the Redfish router. Authentication is not applied here; the caller
/// wraps the whole router in the request gate.
pub fn create_api_router(
    db: Database,
    authority: Arc<SessionAuthority>,
    gate: Arc<RequestGate>,
) -> Router {
    let sessions_state = sessions::SessionsState { authority, gate };
    let resources_state = resources::ResourcesState { db };

    Router::new()
        .merge(service_root::router())
        .merge(sessions::router(sessions_state))
        .merge(resources::router(resources_state))
}
