// Identity service client - email/password login against the app services auth API
use crate::application::data_source::IdentityProvider;
use crate::application::session::Credential;
use crate::error::AuthError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone)]
pub struct RealmIdentity {
    client: reqwest::Client,
    base_url: String,
    app_id: String,
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct LoginResponse {
    access_token: Option<String>,
}

impl RealmIdentity {
    pub fn new(base_url: String, app_id: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            app_id,
        }
    }

    fn login_url(&self) -> String {
        format!(
            "{}/api/client/v2.0/app/{}/auth/providers/local-userpass/login",
            self.base_url, self.app_id
        )
    }
}

#[async_trait]
impl IdentityProvider for RealmIdentity {
    async fn login(&self, identity: &str, secret: &str) -> Result<Credential, AuthError> {
        let response = self
            .client
            .post(self.login_url())
            .json(&LoginRequest {
                username: identity,
                password: secret,
            })
            .send()
            .await
            .map_err(AuthError::Unreachable)?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(AuthError::Rejected { status, message });
        }

        let body = response
            .json::<LoginResponse>()
            .await
            .map_err(|e| AuthError::MalformedResponse(e.to_string()))?;

        body.access_token
            .filter(|t| !t.is_empty())
            .map(Credential::new)
            .ok_or_else(|| AuthError::MalformedResponse("missing access_token".to_string()))
    }
}
