//! Caller authentication and permission checks
//!
//! Writes to the match sheets require a bearer token carrying the configured
//! write permission. The permissions claim is read by a
//! [`PermissionAuthenticator`]; [`require_permissions`] turns a missing or
//! insufficient token into an `Unauthorized` error.

pub mod jwt;

pub use jwt::JwtPermissionAuthenticator;

use crate::error::{Result, TrackerError};
use async_trait::async_trait;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Permission granted to callers that may record matches
pub const DEFAULT_WRITE_PERMISSION: &str = "write:table_tennis_score";

/// Trait for resolving a bearer token into the caller's permissions
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PermissionAuthenticator: Send + Sync {
    /// Permissions carried by `token`; errors when the token is not acceptable
    async fn permissions(&self, token: &str) -> Result<Vec<String>>;

    /// Authenticator name for logs
    fn name(&self) -> &'static str;
}

/// Authenticator backed by a fixed token → permissions table
#[derive(Debug, Clone, Default)]
pub struct StaticPermissionAuthenticator {
    tokens: BTreeMap<String, Vec<String>>,
}

impl StaticPermissionAuthenticator {
    pub fn new(tokens: BTreeMap<String, Vec<String>>) -> Self {
        Self { tokens }
    }

    /// Add a token granting `permissions`
    pub fn with_token(mut self, token: &str, permissions: &[&str]) -> Self {
        self.tokens.insert(
            token.to_string(),
            permissions.iter().map(|p| p.to_string()).collect(),
        );
        self
    }
}

#[async_trait]
impl PermissionAuthenticator for StaticPermissionAuthenticator {
    async fn permissions(&self, token: &str) -> Result<Vec<String>> {
        self.tokens
            .get(token)
            .cloned()
            .ok_or_else(|| TrackerError::unauthorized("unknown token").into())
    }

    fn name(&self) -> &'static str {
        "static"
    }
}

/// Token part of an `Authorization: Bearer <token>` header value
pub fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

/// Check that the caller behind `authorization` holds every `required` permission
pub async fn require_permissions(
    authenticator: &dyn PermissionAuthenticator,
    authorization: Option<&str>,
    required: &[String],
) -> Result<()> {
    let token = authorization
        .and_then(bearer_token)
        .ok_or_else(|| TrackerError::unauthorized("missing bearer token"))?;

    let granted = match authenticator.permissions(token).await {
        Ok(granted) => granted,
        Err(e) => {
            warn!("Token rejected by {} authenticator: {}", authenticator.name(), e);
            return Err(TrackerError::unauthorized("invalid token").into());
        }
    };

    if let Some(missing) = required.iter().find(|p| !granted.contains(p)) {
        warn!("Caller lacks required permission '{}'", missing);
        return Err(TrackerError::unauthorized(format!("missing permission '{missing}'")).into());
    }

    debug!("Caller authorized with {} permissions", granted.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn required() -> Vec<String> {
        vec![DEFAULT_WRITE_PERMISSION.to_string()]
    }

    fn is_unauthorized(result: Result<()>) -> bool {
        matches!(
            result.unwrap_err().downcast_ref::<TrackerError>(),
            Some(TrackerError::Unauthorized { .. })
        )
    }

    #[test]
    fn test_bearer_token() {
        assert_eq!(bearer_token("Bearer abc"), Some("abc"));
        assert_eq!(bearer_token("bearer  abc "), Some("abc"));
        assert_eq!(bearer_token("Basic abc"), None);
        assert_eq!(bearer_token("Bearer "), None);
        assert_eq!(bearer_token("abc"), None);
    }

    #[tokio::test]
    async fn test_static_authenticator_grants_permissions() {
        let auth = StaticPermissionAuthenticator::default()
            .with_token("writer", &[DEFAULT_WRITE_PERMISSION])
            .with_token("reader", &["read:table_tennis_score"]);

        assert!(require_permissions(&auth, Some("Bearer writer"), &required())
            .await
            .is_ok());
        assert!(is_unauthorized(
            require_permissions(&auth, Some("Bearer reader"), &required()).await
        ));
        assert!(is_unauthorized(
            require_permissions(&auth, Some("Bearer nobody"), &required()).await
        ));
        assert!(is_unauthorized(require_permissions(&auth, None, &required()).await));
    }

    #[tokio::test]
    async fn test_authenticator_errors_become_unauthorized() {
        let mut auth = MockPermissionAuthenticator::new();
        auth.expect_permissions()
            .returning(|_| Err(anyhow::anyhow!("signature mismatch")));
        auth.expect_name().return_const("mock");

        assert!(is_unauthorized(
            require_permissions(&auth, Some("Bearer token"), &required()).await
        ));
    }

    #[tokio::test]
    async fn test_no_required_permissions_only_needs_a_valid_token() {
        let mut auth = MockPermissionAuthenticator::new();
        auth.expect_permissions().returning(|_| Ok(Vec::new()));
        auth.expect_name().return_const("mock");

        assert!(require_permissions(&auth, Some("Bearer token"), &[]).await.is_ok());
    }
}
