//! Caller identity middleware.
//!
//! Authentication happens upstream: the gateway in front of this server sets
//! `x-user-id` for every authenticated caller and `x-user-role: admin` for
//! tournament admins. The middleware turns those headers into an [`Identity`]
//! request extension.
//!
//! ```rust,no_run
//! use axum::extract::Extension;
//! use mp_server::api::identity::Identity;
//!
//! async fn whoami(Extension(identity): Extension<Identity>) -> String {
//!     format!("user {}", identity.user_id)
//! }
//! # let _ = whoami;
//! ```

use axum::{
    extract::Request,
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use matchplay::tournament::UserId;

use super::error::ApiError;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";

/// Authenticated caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    pub user_id: UserId,
    pub is_admin: bool,
}

impl Identity {
    /// Fail with 403 unless the caller is an admin
    pub fn require_admin(&self) -> Result<(), ApiError> {
        if self.is_admin {
            Ok(())
        } else {
            Err(ApiError::forbidden("Admin role required"))
        }
    }
}

fn identity_from_headers(headers: &HeaderMap) -> Option<Identity> {
    let user_id = headers
        .get(USER_ID_HEADER)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()?;
    let is_admin = headers
        .get(USER_ROLE_HEADER)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|role| role.eq_ignore_ascii_case("admin"));

    Some(Identity { user_id, is_admin })
}

/// Reject requests without a caller identity with `401 Unauthorized`
pub async fn identity_middleware(
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    match identity_from_headers(request.headers()) {
        Some(identity) => {
            request.extensions_mut().insert(identity);
            Ok(next.run(request).await)
        }
        None => Err(StatusCode::UNAUTHORIZED),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_player_identity() {
        let mut headers = HeaderMap::new();
        headers.insert(USER_ID_HEADER, HeaderValue::from_static("42"));

        let identity = identity_from_headers(&headers).unwrap();
        assert_eq!(identity.user_id, 42);
        assert!(!identity.is_admin);
        assert!(identity.require_admin().is_err());
    }

    #[test]
    fn test_admin_identity() {
        let mut headers = HeaderMap::new();
        headers.insert(USER_ID_HEADER, HeaderValue::from_static("7"));
        headers.insert(USER_ROLE_HEADER, HeaderValue::from_static("Admin"));

        assert!(identity_from_headers(&headers).unwrap().is_admin);
    }

    #[test]
    fn test_missing_or_malformed_user() {
        assert!(identity_from_headers(&HeaderMap::new()).is_none());

        let mut headers = HeaderMap::new();
        headers.insert(USER_ID_HEADER, HeaderValue::from_static("alice"));
        assert!(identity_from_headers(&headers).is_none());
    }
}
