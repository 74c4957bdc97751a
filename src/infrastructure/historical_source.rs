// Historical data source - plain GET returning raw zone records, fetched once
use crate::application::data_source::ZoneDataSource;
use crate::application::session::Credential;
use crate::domain::telemetry::{decode_documents, RawRecord};
use crate::error::FetchError;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Clone)]
pub struct HistoricalSource {
    client: reqwest::Client,
    url: String,
}

/// Either a bare array or the document-query envelope.
#[derive(Deserialize)]
#[serde(untagged)]
enum HistoricalBody {
    Envelope { documents: Vec<Value> },
    Bare(Vec<Value>),
}

impl HistoricalSource {
    pub fn new(url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            url,
        }
    }
}

#[async_trait]
impl ZoneDataSource for HistoricalSource {
    fn name(&self) -> &str {
        "historical"
    }

    fn requires_credential(&self) -> bool {
        false
    }

    async fn fetch(&self, credential: Option<&Credential>) -> Result<Vec<RawRecord>, FetchError> {
        let mut request = self.client.get(&self.url);
        if let Some(credential) = credential {
            request = request.bearer_auth(credential.bearer());
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Status { status, body });
        }

        let documents = match response
            .json::<HistoricalBody>()
            .await
            .map_err(|e| FetchError::MalformedBody(e.to_string()))?
        {
            HistoricalBody::Envelope { documents } => documents,
            HistoricalBody::Bare(documents) => documents,
        };

        Ok(decode_documents(documents))
    }
}
