// Credential session - holds the bearer credential shared by every poll
use crate::application::data_source::IdentityProvider;
use crate::error::AuthError;
use std::fmt;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Opaque bearer token. No expiry handling: it lives until the process restarts.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn bearer(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

pub struct CredentialSession {
    provider: Arc<dyn IdentityProvider>,
    credential: RwLock<Option<Credential>>,
}

impl CredentialSession {
    pub fn new(provider: Arc<dyn IdentityProvider>) -> Self {
        Self {
            provider,
            credential: RwLock::new(None),
        }
    }

    /// Log in and keep the credential for later polls. On failure the session stays empty.
    pub async fn acquire(&self, identity: &str, secret: &str) -> Result<Credential, AuthError> {
        let credential = self.provider.login(identity, secret).await?;
        *self.credential.write().await = Some(credential.clone());
        tracing::info!("Acquired data API credential for {}", identity);
        Ok(credential)
    }

    pub async fn current(&self) -> Option<Credential> {
        self.credential.read().await.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct FakeIdentity;

    #[async_trait]
    impl IdentityProvider for FakeIdentity {
        async fn login(&self, identity: &str, secret: &str) -> Result<Credential, AuthError> {
            if identity == "ops@example.com" && secret == "secret" {
                Ok(Credential::new("token-1"))
            } else {
                Err(AuthError::Rejected {
                    status: 401,
                    message: "invalid username/password".to_string(),
                })
            }
        }
    }

    #[tokio::test]
    async fn test_acquire_stores_credential() {
        let session = CredentialSession::new(Arc::new(FakeIdentity));
        assert!(session.current().await.is_none());

        let credential = session.acquire("ops@example.com", "secret").await.unwrap();
        assert_eq!(credential.bearer(), "token-1");
        assert_eq!(session.current().await, Some(credential));
    }

    #[tokio::test]
    async fn test_rejected_login_leaves_session_empty() {
        let session = CredentialSession::new(Arc::new(FakeIdentity));

        let err = session.acquire("ops@example.com", "wrong").await.unwrap_err();
        assert!(matches!(err, AuthError::Rejected { status: 401, .. }));
        assert!(session.current().await.is_none());
    }

    #[test]
    fn test_debug_redacts_token() {
        assert_eq!(format!("{:?}", Credential::new("abc")), "Credential(***)");
    }
}
