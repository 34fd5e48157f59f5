//! HTTP client for the data service

use std::time::Duration;

use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::migration::MigrationReport;
use crate::model::Document;
use crate::store::Store;
use crate::{Error, Result};

const USER_AGENT: &str = concat!("xjp-common/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// `{ "url": "/uploads/..." }` returned by both upload endpoints
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UploadResponse {
    pub url: String,
}

/// Client for `GET/POST /data` and the upload endpoints
#[derive(Debug, Clone)]
pub struct DataClient {
    base_url: String,
    http_client: reqwest::Client,
}

impl DataClient {
    /// `base_url` is the service origin, e.g. `http://localhost:3001`.
    /// An empty base means same-origin relative requests, which reqwest
    /// cannot issue, so it is rejected.
    pub fn new(base_url: &str) -> Result<Self> {
        let base_url = base_url.trim().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(Error::Config("data service base URL is empty".to_string()));
        }

        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            base_url,
            http_client,
        })
    }

    /// Client for the origin in `XJP_API_BASE_URL`
    pub fn from_env() -> Result<Self> {
        let base = crate::config::api_base_url_from_env().ok_or_else(|| {
            Error::Config(format!("{} is not set", crate::config::API_BASE_URL_ENV))
        })?;
        Self::new(&base)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(Error::Http(format!("{}: {}", status, body)))
    }

    /// Fetch the whole document. Malformed content decodes as empty.
    pub async fn fetch(&self) -> Result<Document> {
        let url = self.url("/data");
        debug!(url = %url, "Fetching document");

        let response = Self::check(self.http_client.get(&url).send().await?).await?;
        let value: Value = response.json().await?;
        Ok(Document::from_value_lenient(value))
    }

    /// Overwrite the stored document
    pub async fn save(&self, document: &Document) -> Result<()> {
        let url = self.url("/data");
        debug!(
            url = %url,
            members = document.members.len(),
            singles = document.singles.len(),
            "Saving document"
        );

        Self::check(self.http_client.post(&url).json(document).send().await?).await?;
        Ok(())
    }

    async fn upload(&self, path: &str, field: &str, file_name: &str, bytes: Vec<u8>) -> Result<String> {
        let part = Part::bytes(bytes).file_name(file_name.to_string());
        let form = Form::new().part(field.to_string(), part);

        let response =
            Self::check(self.http_client.post(self.url(path)).multipart(form).send().await?)
                .await?;
        let uploaded: UploadResponse = response.json().await?;
        info!(url = %uploaded.url, "Upload stored");
        Ok(uploaded.url)
    }

    /// Upload an image; the service re-encodes it as JPEG.
    /// Returns the stored `/uploads/...` path.
    pub async fn upload_image(&self, file_name: &str, bytes: Vec<u8>) -> Result<String> {
        self.upload("/upload", "image", file_name, bytes).await
    }

    /// Upload an audio file verbatim. Returns the stored `/uploads/audio/...` path.
    pub async fn upload_audio(&self, file_name: &str, bytes: Vec<u8>) -> Result<String> {
        self.upload("/upload-audio", "audio", file_name, bytes).await
    }
}

/// Fetch the document, migrate legacy history keys and derive selections.
///
/// On error nothing is returned; callers that want to keep going can fall
/// back to `Store::load(Document::default())`.
pub async fn load_store(client: &DataClient) -> Result<(Store, MigrationReport)> {
    let document = client.fetch().await?;
    Ok(Store::load(document))
}
