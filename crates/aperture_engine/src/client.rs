//! HTTP client for the backend's JSON API.
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use url::Url;

use crate::{ClientError, ClientErrorKind, HealthResponse, JobsResponse, SearchResponse};

#[derive(Debug, Clone)]
pub struct ClientSettings {
    /// Root of the versioned API, e.g. `http://127.0.0.1:8000/api/v1`.
    pub base_url: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl ClientSettings {
    pub fn for_backend(host: &str, port: u16, api_prefix: &str) -> Self {
        Self {
            base_url: format!(
                "http://{host}:{port}/{}",
                api_prefix.trim_matches('/')
            ),
            ..Self::default()
        }
    }
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000/api/v1".to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
        }
    }
}

#[async_trait]
pub trait BackendApi: Send + Sync {
    async fn search(&self, query: &str) -> Result<SearchResponse, ClientError>;
    async fn jobs(&self) -> Result<JobsResponse, ClientError>;
    /// Fire-and-forget: the backend runs the ingestion in the background.
    async fn trigger_ingest(&self) -> Result<(), ClientError>;
    async fn health(&self) -> Result<HealthResponse, ClientError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestBackendClient {
    client: reqwest::Client,
    base: Url,
}

impl ReqwestBackendClient {
    pub fn new(settings: &ClientSettings) -> Result<Self, ClientError> {
        let mut base = Url::parse(&settings.base_url)
            .map_err(|err| ClientError::new(ClientErrorKind::InvalidUrl, err.to_string()))?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| ClientError::new(ClientErrorKind::Unreachable, err.to_string()))?;

        Ok(Self { client, base })
    }

    /// `search/?q=<query>` below the API root.
    pub fn search_url(&self, query: &str) -> Result<Url, ClientError> {
        let mut url = self.endpoint("search/")?;
        url.query_pairs_mut().append_pair("q", query);
        Ok(url)
    }

    /// The health route lives at the server root, outside the API prefix.
    pub fn health_url(&self) -> Url {
        let mut url = self.base.clone();
        url.set_path("/");
        url.set_query(None);
        url
    }

    fn endpoint(&self, path: &str) -> Result<Url, ClientError> {
        self.base
            .join(path)
            .map_err(|err| ClientError::new(ClientErrorKind::InvalidUrl, err.to_string()))
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, ClientError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::new(
                ClientErrorKind::HttpStatus(status.as_u16()),
                format!("unexpected status {status}"),
            ));
        }
        let body = response.bytes().await.map_err(map_reqwest_error)?;
        serde_json::from_slice(&body)
            .map_err(|err| ClientError::new(ClientErrorKind::Malformed, err.to_string()))
    }
}

#[async_trait]
impl BackendApi for ReqwestBackendClient {
    async fn search(&self, query: &str) -> Result<SearchResponse, ClientError> {
        let url = self.search_url(query)?;
        self.get_json(url).await
    }

    async fn jobs(&self) -> Result<JobsResponse, ClientError> {
        let url = self.endpoint("jobs/")?;
        self.get_json(url).await
    }

    async fn trigger_ingest(&self) -> Result<(), ClientError> {
        let url = self.endpoint("ingest/gmail")?;
        let response = self
            .client
            .post(url)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(ClientError::new(
                ClientErrorKind::HttpStatus(status.as_u16()),
                format!("unexpected status {status}"),
            ))
        }
    }

    async fn health(&self) -> Result<HealthResponse, ClientError> {
        self.get_json(self.health_url()).await
    }
}

fn map_reqwest_error(err: reqwest::Error) -> ClientError {
    if err.is_timeout() {
        return ClientError::new(ClientErrorKind::Timeout, err.to_string());
    }
    if err.is_decode() {
        return ClientError::new(ClientErrorKind::Malformed, err.to_string());
    }
    ClientError::new(ClientErrorKind::Unreachable, err.to_string())
}
