//! Session and principal types.

use crate::db::AccountRole;

/// Server-side record of one login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub session_id: String,
    pub username: String,
    /// Role captured at login time
    pub role: AccountRole,
    /// Unix seconds
    pub created_at: u64,
    /// Unix seconds; the session is invalid from this instant on
    pub expires_at: u64,
}

impl Session {
    pub fn is_expired(&self, now: u64) -> bool {
        self.expires_at <= now
    }
}

/// A freshly created session together with the token handed to the client.
#[derive(Debug, Clone)]
pub struct CreatedSession {
    pub session: Session,
    pub token: String,
}

/// Authenticated identity attached to a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub username: String,
    pub role: AccountRole,
    /// Set when the request authenticated with a session token, absent for Basic auth
    pub session_id: Option<String>,
}

impl Principal {
    pub fn is_admin(&self) -> bool {
        self.role == AccountRole::Administrator
    }

    /// Whether this principal may read or delete the given session.
    pub fn can_manage(&self, session: &Session) -> bool {
        self.is_admin() || self.username == session.username
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(username: &str) -> Session {
        Session {
            session_id: "s-1".to_string(),
            username: username.to_string(),
            role: AccountRole::Operator,
            created_at: 100,
            expires_at: 200,
        }
    }

    #[test]
    fn test_is_expired_at_boundary() {
        let s = session("alice");
        assert!(!s.is_expired(199));
        assert!(s.is_expired(200));
    }

    #[test]
    fn test_can_manage_own_or_admin() {
        let alice = Principal {
            username: "alice".to_string(),
            role: AccountRole::ReadOnly,
            session_id: None,
        };
        let root = Principal {
            username: "root".to_string(),
            role: AccountRole::Administrator,
            session_id: None,
        };

        assert!(alice.can_manage(&session("alice")));
        assert!(!alice.can_manage(&session("bob")));
        assert!(root.can_manage(&session("bob")));
    }
}
