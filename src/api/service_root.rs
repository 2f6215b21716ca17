//! Discovery endpoints, all reachable without a session.
//!
//! - GET `/redfish` - Protocol version document
//! - GET `/redfish/` - Permanent redirect to `/redfish`
//! - GET `/redfish/v1`, `/redfish/v1/` - Service root

use axum::{Json, Router, response::Redirect, routing::get};
use serde_json::{Value, json};

use crate::auth::{SERVICE_ROOT_PATH, SESSIONS_PATH, VERSIONS_PATH};

const REDFISH_VERSION: &str = "1.15.0";

pub fn router() -> Router {
    Router::new()
        .route(VERSIONS_PATH, get(versions))
        .route("/redfish/", get(|| async { Redirect::permanent(VERSIONS_PATH) }))
        .route("/redfish/v1", get(service_root))
        .route(SERVICE_ROOT_PATH, get(service_root))
}

async fn versions() -> Json<Value> {
    Json(json!({ "v1": SERVICE_ROOT_PATH }))
}

async fn service_root() -> Json<Value> {
    Json(json!({
        "@odata.id": SERVICE_ROOT_PATH,
        "@odata.type": "#ServiceRoot.v1_15_0.ServiceRoot",
        "Id": "RootService",
        "Name": "Root Service",
        "RedfishVersion": REDFISH_VERSION,
        "Chassis": { "@odata.id": "/redfish/v1/Chassis" },
        "Managers": { "@odata.id": "/redfish/v1/Managers" },
        "Systems": { "@odata.id": "/redfish/v1/Systems" },
        "EventService": { "@odata.id": "/redfish/v1/EventService" },
        "SessionService": { "@odata.id": "/redfish/v1/SessionService" },
        "Links": {
            "Sessions": { "@odata.id": SESSIONS_PATH }
        }
    }))
}
