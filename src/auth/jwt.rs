//! JWT permission authenticator
//!
//! Reads the `permissions` claim of an access token issued by the identity
//! provider.

use crate::auth::PermissionAuthenticator;
use crate::config::AuthSettings;
use crate::error::{Result, TrackerError};
use async_trait::async_trait;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use tracing::{debug, info, warn};

#[derive(Debug, Deserialize)]
struct PermissionClaims {
    #[serde(default)]
    sub: Option<String>,
    #[serde(default)]
    permissions: Vec<String>,
}

/// Authenticator that decodes bearer tokens as JWTs
pub struct JwtPermissionAuthenticator {
    key: DecodingKey,
    validation: Validation,
}

impl JwtPermissionAuthenticator {
    /// Build from auth settings
    ///
    /// A configured public key selects RS256, a shared secret HS256. Without
    /// either, tokens are only decoded when unverified tokens are allowed.
    pub fn from_settings(settings: &AuthSettings) -> Result<Self> {
        let (key, mut validation) = if let Some(path) = &settings.public_key_path {
            let pem = std::fs::read(path).map_err(|e| TrackerError::ConfigurationError {
                message: format!("Failed to read public key {}: {}", path.display(), e),
            })?;
            let key = DecodingKey::from_rsa_pem(&pem).map_err(|e| {
                TrackerError::ConfigurationError {
                    message: format!("Invalid RSA public key {}: {}", path.display(), e),
                }
            })?;
            info!("Verifying access tokens with RS256 key {}", path.display());
            (key, Validation::new(Algorithm::RS256))
        } else if let Some(secret) = &settings.shared_secret {
            info!("Verifying access tokens with HS256 shared secret");
            (
                DecodingKey::from_secret(secret.as_bytes()),
                Validation::new(Algorithm::HS256),
            )
        } else if settings.allow_unverified_tokens {
            warn!("Access token signatures are NOT verified");
            let mut validation = Validation::new(Algorithm::RS256);
            validation.insecure_disable_signature_validation();
            (DecodingKey::from_secret(&[]), validation)
        } else {
            return Err(TrackerError::ConfigurationError {
                message: "JWT auth needs a public key, a shared secret or allow_unverified_tokens"
                    .to_string(),
            }
            .into());
        };

        match &settings.audience {
            Some(audience) => validation.set_audience(&[audience]),
            None => validation.validate_aud = false,
        }
        if let Some(issuer) = &settings.issuer {
            // Issuers are configured as base URLs; tokens carry them with a trailing slash
            let trimmed = issuer.trim_end_matches('/');
            validation.set_issuer(&[trimmed.to_string(), format!("{trimmed}/")]);
        }

        Ok(Self { key, validation })
    }

    /// Build directly from a key and validation rules
    pub fn new(key: DecodingKey, validation: Validation) -> Self {
        Self { key, validation }
    }
}

#[async_trait]
impl PermissionAuthenticator for JwtPermissionAuthenticator {
    async fn permissions(&self, token: &str) -> Result<Vec<String>> {
        let data = decode::<PermissionClaims>(token, &self.key, &self.validation)
            .map_err(|e| TrackerError::unauthorized(format!("invalid token: {e}")))?;

        debug!(
            "Decoded token for subject {:?} with {} permissions",
            data.claims.sub,
            data.claims.permissions.len()
        );
        Ok(data.claims.permissions)
    }

    fn name(&self) -> &'static str {
        "jwt"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::DEFAULT_WRITE_PERMISSION;
    use crate::config::AuthBackend;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde_json::json;

    const SECRET: &str = "test-secret";

    fn settings() -> AuthSettings {
        AuthSettings {
            backend: AuthBackend::Jwt,
            shared_secret: Some(SECRET.to_string()),
            audience: Some("https://tracker.example".to_string()),
            issuer: Some("https://tenant.example".to_string()),
            ..AuthSettings::default()
        }
    }

    fn token(claims: serde_json::Value, secret: &str) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn claims(audience: &str) -> serde_json::Value {
        json!({
            "sub": "auth0|player",
            "aud": audience,
            "iss": "https://tenant.example/",
            "exp": chrono::Utc::now().timestamp() + 600,
            "permissions": [DEFAULT_WRITE_PERMISSION],
        })
    }

    #[tokio::test]
    async fn test_valid_token_yields_permissions() {
        let auth = JwtPermissionAuthenticator::from_settings(&settings()).unwrap();
        let permissions = auth
            .permissions(&token(claims("https://tracker.example"), SECRET))
            .await
            .unwrap();
        assert_eq!(permissions, vec![DEFAULT_WRITE_PERMISSION.to_string()]);
    }

    #[tokio::test]
    async fn test_wrong_signature_or_audience_rejected() {
        let auth = JwtPermissionAuthenticator::from_settings(&settings()).unwrap();
        assert!(auth
            .permissions(&token(claims("https://tracker.example"), "other-secret"))
            .await
            .is_err());
        assert!(auth
            .permissions(&token(claims("https://elsewhere.example"), SECRET))
            .await
            .is_err());
        assert!(auth.permissions("not-a-jwt").await.is_err());
    }

    #[tokio::test]
    async fn test_unverified_tokens_only_when_allowed() {
        let mut settings = settings();
        settings.shared_secret = None;
        assert!(JwtPermissionAuthenticator::from_settings(&settings).is_err());

        settings.allow_unverified_tokens = true;
        let auth = JwtPermissionAuthenticator::from_settings(&settings).unwrap();
        let permissions = auth
            .permissions(&token(claims("https://tracker.example"), "anything"))
            .await
            .unwrap();
        assert_eq!(permissions.len(), 1);
    }

    #[tokio::test]
    async fn test_missing_permissions_claim_is_empty() {
        let auth = JwtPermissionAuthenticator::from_settings(&AuthSettings {
            shared_secret: Some(SECRET.to_string()),
            ..AuthSettings::default()
        })
        .unwrap();
        let claims = json!({ "sub": "x", "exp": chrono::Utc::now().timestamp() + 600 });
        assert!(auth.permissions(&token(claims, SECRET)).await.unwrap().is_empty());
    }
}
