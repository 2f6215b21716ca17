//! CLI argument parsing, validation, and startup helpers.

use crate::ServerConfig;
use crate::api::normalize_odata_id;
use crate::auth::{AccessPolicy, SessionSettings, hash_password};
use crate::db::{AccountRole, Database};
use clap::Parser;
use tracing::{error, info, warn};

const MIN_JWT_SECRET_LENGTH: usize = 32;

#[derive(clap::ValueEnum, Clone, Debug, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
    Compact,
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "redfish-gate",
    about = "Redfish service with session token authentication"
)]
pub struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "8000")]
    pub port: u16,

    /// Path to SQLite database file
    #[arg(short, long, default_value = "redfish.db")]
    pub database: String,

    /// Path to file containing JWT secret. Prefer using JWT_SECRET env var instead
    #[arg(long)]
    pub jwt_secret_file: Option<String>,

    /// Session lifetime in seconds
    #[arg(long, env = "SESSION_TIMEOUT", default_value = "1800",
        value_parser = clap::value_parser!(u64).range(30..=86400))]
    pub session_timeout: u64,

    /// Consecutive failed logins before an account is locked (0 disables lockout)
    #[arg(long, default_value = "5")]
    pub lockout_threshold: u32,

    /// Seconds an account stays locked
    #[arg(long, default_value = "60")]
    pub lockout_duration: u64,

    /// Accept HTTP Basic credentials on protected paths
    #[arg(long)]
    pub allow_basic_auth: bool,

    /// Create an Administrator account with this name on startup (password from ADMIN_PASSWORD)
    #[arg(long, value_name = "USER")]
    pub bootstrap_admin: Option<String>,

    /// JSON file with an array of Redfish documents to load into the resource store
    #[arg(long, value_name = "FILE")]
    pub seed: Option<String>,

    /// Log output format
    #[arg(short, long, default_value = "pretty")]
    pub log_format: LogFormat,
}

/// Initialize logging based on the specified format.
pub fn init_logging(format: &LogFormat) {
    match format {
        LogFormat::Pretty => tracing_subscriber::fmt::init(),
        LogFormat::Json => tracing_subscriber::fmt().json().init(),
        LogFormat::Compact => tracing_subscriber::fmt().compact().init(),
    }
}

/// Load JWT secret from environment variable or file.
/// Returns None and logs an error if the secret cannot be loaded.
pub fn load_jwt_secret(jwt_secret_file: Option<&str>) -> Option<String> {
    let secret = if let Ok(secret) = std::env::var("JWT_SECRET") {
        // Clear the environment variable to prevent leaking
        // SAFETY: We're single-threaded at this point during startup,
        // and no other code is reading this environment variable.
        unsafe { std::env::remove_var("JWT_SECRET") };
        secret
    } else if let Some(path) = jwt_secret_file {
        match std::fs::read_to_string(path) {
            Ok(content) => content.trim().to_string(),
            Err(e) => {
                error!(path = %path, error = %e, "Failed to read JWT secret file");
                return None;
            }
        }
    } else {
        error!(
            "JWT secret is required. Set JWT_SECRET environment variable (recommended) or use --jwt-secret-file"
        );
        return None;
    };

    if secret.len() < MIN_JWT_SECRET_LENGTH {
        error!(
            "JWT secret is shorter than {} characters. Use a longer secret",
            MIN_JWT_SECRET_LENGTH
        );
        return None;
    }

    Some(secret)
}

/// Handle --bootstrap-admin: create the account unless it already exists.
/// Returns false and logs an error if the account could not be created.
pub async fn handle_bootstrap_admin(db: &Database, username: &str) -> bool {
    match db.accounts().get_by_username(username).await {
        Ok(Some(_)) => {
            info!(user = %username, "Admin account already exists");
            return true;
        }
        Ok(None) => {}
        Err(e) => {
            error!(error = %e, "Failed to check for existing admin");
            return false;
        }
    }

    let password = match std::env::var("ADMIN_PASSWORD") {
        Ok(password) if !password.is_empty() => password,
        _ => {
            error!("ADMIN_PASSWORD environment variable is required with --bootstrap-admin");
            return false;
        }
    };
    // SAFETY: We're single-threaded at this point during startup,
    // and no other code is reading this environment variable.
    unsafe { std::env::remove_var("ADMIN_PASSWORD") };

    let hash = match hash_password(&password) {
        Ok(hash) => hash,
        Err(e) => {
            error!(error = %e, "Failed to hash admin password");
            return false;
        }
    };

    match db
        .accounts()
        .create(username, &hash, AccountRole::Administrator)
        .await
    {
        Ok(_) => {
            info!(user = %username, "Admin account created");
            true
        }
        Err(e) => {
            error!(error = %e, "Failed to create admin account");
            false
        }
    }
}

/// Load Redfish documents from a JSON array, each keyed by its `@odata.id`.
/// Returns the number of documents stored, or None after logging the failure.
pub async fn load_seed_documents(db: &Database, path: &str) -> Option<usize> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            error!(path = %path, error = %e, "Failed to read seed file");
            return None;
        }
    };

    let documents: Vec<serde_json::Value> = match serde_json::from_str(&content) {
        Ok(documents) => documents,
        Err(e) => {
            error!(path = %path, error = %e, "Seed file must be a JSON array of documents");
            return None;
        }
    };

    let mut stored = 0;
    for document in &documents {
        let Some(odata_id) = document.get("@odata.id").and_then(|v| v.as_str()) else {
            warn!("Skipping seed document without @odata.id");
            continue;
        };
        if let Err(e) = db
            .resources()
            .put(normalize_odata_id(odata_id), document)
            .await
        {
            error!(odata_id = %odata_id, error = %e, "Failed to store seed document");
            return None;
        }
        stored += 1;
    }

    info!(path = %path, count = stored, "Seed documents loaded");
    Some(stored)
}

/// Build ServerConfig from validated arguments.
pub fn build_config(args: &Args, db: Database, jwt_secret: String) -> ServerConfig {
    ServerConfig {
        db,
        jwt_secret: jwt_secret.into_bytes(),
        session: SessionSettings {
            session_timeout_secs: args.session_timeout,
            lockout_threshold: args.lockout_threshold,
            lockout_duration_secs: args.lockout_duration,
        },
        allow_basic_auth: args.allow_basic_auth,
        policy: AccessPolicy::redfish_default(),
    }
}

/// Open the database, logging errors if it fails.
pub async fn open_database(path: &str) -> Option<Database> {
    match Database::open(path).await {
        Ok(db) => {
            info!(path = %path, "Database opened");
            Some(db)
        }
        Err(e) => {
            error!(path = %path, error = %e, "Failed to open database");
            None
        }
    }
}
