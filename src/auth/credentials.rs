//! Credential extraction from request headers.

use axum::http::{HeaderMap, header};
use base64::Engine;

/// Redfish session token header, accepted when no `Authorization` header is sent.
pub const X_AUTH_TOKEN: &str = "x-auth-token";

/// Credentials presented with a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credentials {
    Bearer(String),
    Basic { username: String, password: String },
}

/// Read credentials from `Authorization` (Bearer or Basic), falling back to `X-Auth-Token`.
/// Unknown schemes and undecodable values count as no credentials.
pub fn extract_credentials(headers: &HeaderMap) -> Option<Credentials> {
    if let Some(value) = headers.get(header::AUTHORIZATION) {
        return parse_authorization(value.to_str().ok()?);
    }

    let token = headers.get(X_AUTH_TOKEN)?.to_str().ok()?.trim();
    if token.is_empty() {
        return None;
    }
    Some(Credentials::Bearer(token.to_string()))
}

fn parse_authorization(value: &str) -> Option<Credentials> {
    let (scheme, rest) = value.trim().split_once(' ')?;
    let rest = rest.trim();
    if rest.is_empty() {
        return None;
    }

    if scheme.eq_ignore_ascii_case("bearer") {
        return Some(Credentials::Bearer(rest.to_string()));
    }

    if scheme.eq_ignore_ascii_case("basic") {
        let decoded = base64::engine::general_purpose::STANDARD
            .decode(rest)
            .ok()?;
        let decoded = String::from_utf8(decoded).ok()?;
        let (username, password) = decoded.split_once(':')?;
        return Some(Credentials::Basic {
            username: username.to_string(),
            password: password.to_string(),
        });
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_static(value));
        }
        map
    }

    #[test]
    fn test_bearer() {
        let h = headers(&[("authorization", "Bearer abc.def.ghi")]);
        assert_eq!(
            extract_credentials(&h),
            Some(Credentials::Bearer("abc.def.ghi".to_string()))
        );
    }

    #[test]
    fn test_bearer_scheme_case_insensitive() {
        let h = headers(&[("authorization", "bearer   tok  ")]);
        assert_eq!(
            extract_credentials(&h),
            Some(Credentials::Bearer("tok".to_string()))
        );
    }

    #[test]
    fn test_x_auth_token() {
        let h = headers(&[("x-auth-token", "tok")]);
        assert_eq!(
            extract_credentials(&h),
            Some(Credentials::Bearer("tok".to_string()))
        );
    }

    #[test]
    fn test_authorization_takes_precedence() {
        let h = headers(&[("authorization", "Bearer first"), ("x-auth-token", "second")]);
        assert_eq!(
            extract_credentials(&h),
            Some(Credentials::Bearer("first".to_string()))
        );
    }

    #[test]
    fn test_basic() {
        // "alice:pa:ss"
        let h = headers(&[("authorization", "Basic YWxpY2U6cGE6c3M=")]);
        assert_eq!(
            extract_credentials(&h),
            Some(Credentials::Basic {
                username: "alice".to_string(),
                password: "pa:ss".to_string(),
            })
        );
    }

    #[test]
    fn test_missing_or_unusable() {
        assert_eq!(extract_credentials(&HeaderMap::new()), None);
        assert_eq!(extract_credentials(&headers(&[("authorization", "Bearer")])), None);
        assert_eq!(extract_credentials(&headers(&[("authorization", "Bearer ")])), None);
        assert_eq!(extract_credentials(&headers(&[("authorization", "Digest abc")])), None);
        assert_eq!(extract_credentials(&headers(&[("authorization", "Basic !!!")])), None);
        assert_eq!(extract_credentials(&headers(&[("x-auth-token", "")])), None);
    }
}
