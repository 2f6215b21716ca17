//! Redfish session authentication.
//!
//! Clients log in by POSTing to the session collection and receive a signed
//! session token. Every later request carries the token, which is verified
//! and then checked against the stored session record, so deleting the
//! session (logout, expiry sweep) revokes the token at once. A small static
//! policy exempts the discovery and login endpoints.

mod authority;
mod credentials;
mod errors;
mod gate;
mod password;
mod policy;
mod store;
mod types;

pub use authority::{DEFAULT_SESSION_TIMEOUT_SECS, SessionAuthority, SessionSettings};
pub use credentials::{Credentials, X_AUTH_TOKEN, extract_credentials};
pub use errors::AuthError;
pub use gate::{Authenticated, GateOutcome, RequestGate, request_gate};
pub use password::{PasswordError, hash_password, prepare_dummy_hash, verify_password};
pub use policy::{
    AccessPolicy, AccessRule, EVENT_STREAM_PATH, PathPattern, SERVICE_ROOT_PATH, SESSIONS_PATH,
    VERSIONS_PATH,
};
pub use store::{AccountDirectory, PrincipalResolver, SessionRepository};
pub use types::{CreatedSession, Principal, Session};
