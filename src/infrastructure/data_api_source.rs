// Document-query data source - POSTs a find action with a bearer credential
use crate::application::data_source::ZoneDataSource;
use crate::application::session::Credential;
use crate::domain::telemetry::{decode_documents, RawRecord};
use crate::error::FetchError;
use crate::infrastructure::config::DataApiSettings;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone)]
pub struct DataApiSource {
    client: reqwest::Client,
    endpoint: String,
    collection: String,
    database: String,
    data_source: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FindRequest<'a> {
    collection: &'a str,
    database: &'a str,
    data_source: &'a str,
}

#[derive(Deserialize)]
struct FindResponse {
    documents: Vec<serde_json::Value>,
}

impl DataApiSource {
    pub fn new(settings: &DataApiSettings) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: settings.endpoint.trim_end_matches('/').to_string(),
            collection: settings.collection.clone(),
            database: settings.database.clone(),
            data_source: settings.data_source.clone(),
        }
    }

    fn find_url(&self) -> String {
        format!("{}/find", self.endpoint)
    }
}

#[async_trait]
impl ZoneDataSource for DataApiSource {
    fn name(&self) -> &str {
        "data-api"
    }

    async fn fetch(&self, credential: Option<&Credential>) -> Result<Vec<RawRecord>, FetchError> {
        let credential = credential.ok_or(FetchError::MissingCredential)?;

        let response = self
            .client
            .post(self.find_url())
            .bearer_auth(credential.bearer())
            .json(&FindRequest {
                collection: &self.collection,
                database: &self.database,
                data_source: &self.data_source,
            })
            .send()
            .await
            .map_err(FetchError::Transport)?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Status { status, body });
        }

        let body = response
            .json::<FindResponse>()
            .await
            .map_err(|e| FetchError::MalformedBody(e.to_string()))?;

        Ok(decode_documents(body.documents))
    }
}
