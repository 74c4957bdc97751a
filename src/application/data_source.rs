// Seams to the remote collaborators: identity service and zone data feeds
use crate::application::session::Credential;
use crate::domain::telemetry::RawRecord;
use crate::error::{AuthError, FetchError};
use async_trait::async_trait;

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Exchange an identity/secret pair for a bearer credential
    async fn login(&self, identity: &str, secret: &str) -> Result<Credential, AuthError>;
}

#[async_trait]
pub trait ZoneDataSource: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Whether `fetch` needs a bearer credential. Polls are skipped while none is held.
    fn requires_credential(&self) -> bool {
        true
    }

    /// Pull the current raw records
    async fn fetch(&self, credential: Option<&Credential>) -> Result<Vec<RawRecord>, FetchError>;
}
