#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    http::{Request, Response, request::Builder},
};
use redfish_gate::auth::{AccessPolicy, SessionSettings, hash_password};
use redfish_gate::db::{AccountRole, Database};
use redfish_gate::{ServerConfig, create_app};
use serde_json::{Value, json};
use std::path::PathBuf;
use tower::ServiceExt;
use uuid::Uuid;

pub const JWT_SECRET: &[u8] = b"integration-test-secret-0123456789abcdef";

pub struct TestApp {
    pub app: Router,
    pub db: Database,
}

/// App with the default settings and three accounts:
/// alice/wonderland (Operator), bob/builder (ReadOnly), root/rootpass (Administrator).
pub async fn test_app() -> TestApp {
    test_app_with(|_| {}).await
}

pub async fn test_app_with(configure: impl FnOnce(&mut ServerConfig)) -> TestApp {
    let db = Database::open(":memory:")
        .await
        .expect("Failed to open test database");
    test_app_on(db, configure).await
}

/// Same accounts and documents as [`test_app`], on the given database.
pub async fn test_app_on(db: Database, configure: impl FnOnce(&mut ServerConfig)) -> TestApp {
    for (username, password, role) in [
        ("alice", "wonderland", AccountRole::Operator),
        ("bob", "builder", AccountRole::ReadOnly),
        ("root", "rootpass", AccountRole::Administrator),
    ] {
        let hash = hash_password(password).expect("Failed to hash password");
        db.accounts()
            .create(username, &hash, role)
            .await
            .expect("Failed to create account");
    }

    db.resources()
        .put(
            "/redfish/v1/Chassis",
            &json!({
                "@odata.id": "/redfish/v1/Chassis",
                "Name": "Chassis Collection",
                "Members": [],
            }),
        )
        .await
        .expect("Failed to seed resource");

    let mut config = ServerConfig {
        db: db.clone(),
        jwt_secret: JWT_SECRET.to_vec(),
        session: SessionSettings::default(),
        allow_basic_auth: false,
        policy: AccessPolicy::redfish_default(),
    };
    configure(&mut config);

    TestApp {
        app: create_app(&config),
        db,
    }
}

impl TestApp {
    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.app.clone().oneshot(request).await.unwrap()
    }

    pub async fn get(&self, uri: &str) -> Response<Body> {
        self.send(Request::get(uri).body(Body::empty()).unwrap())
            .await
    }

    pub async fn get_with_token(&self, uri: &str, token: &str) -> Response<Body> {
        self.send(
            Request::get(uri)
                .header("authorization", format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    pub async fn delete_with_token(&self, uri: &str, token: &str) -> Response<Body> {
        self.send(
            Request::delete(uri)
                .header("authorization", format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    /// POST a login and return the raw response.
    pub async fn post_login(&self, username: &str, password: &str) -> Response<Body> {
        self.send(
            json_request(Request::post("/redfish/v1/SessionService/Sessions"))
                .body(Body::from(
                    json!({ "UserName": username, "Password": password }).to_string(),
                ))
                .unwrap(),
        )
        .await
    }

    /// Log in and return `(token, session uri)`.
    pub async fn login(&self, username: &str, password: &str) -> (String, String) {
        let response = self.post_login(username, password).await;
        assert_eq!(response.status(), 201, "login as {} failed", username);

        let header = |name: &str| {
            response
                .headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
                .unwrap_or_else(|| panic!("missing {} header", name))
        };
        (header("x-auth-token"), header("location"))
    }
}

/// Sqlite file under the temp dir, removed (with its WAL files) on drop.
pub struct TempDatabase {
    path: PathBuf,
}

impl TempDatabase {
    pub fn new(name: &str) -> Self {
        let path = std::env::temp_dir().join(format!(
            "redfish-gate-{}-{}-{}.db",
            name,
            std::process::id(),
            Uuid::new_v4()
        ));
        Self { path }
    }

    pub async fn open(&self) -> Database {
        Database::open(self.path.to_str().expect("temp path is not UTF-8"))
            .await
            .expect("Failed to open test database")
    }
}

impl Drop for TempDatabase {
    fn drop(&mut self) {
        for suffix in ["", "-wal", "-shm"] {
            let mut path = self.path.clone().into_os_string();
            path.push(suffix);
            let _ = std::fs::remove_file(path);
        }
    }
}

pub fn json_request(builder: Builder) -> Builder {
    builder.header("content-type", "application/json")
}

pub async fn body_json(response: Response<Body>) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}
