use crate::core::{AnalysisResult, AnalyzeRequest, DownloadRequest, DownloadResponse};
use async_trait::async_trait;
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid backend URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("backend returned HTTP {0}")]
    Status(reqwest::StatusCode),
    #[error("analysis failed: {0}")]
    Analysis(String),
    #[error("download rejected: {0}")]
    Download(String),
}

/// The backend surface this client drives. Behind a trait so tests can stand
/// in a canned implementation without a running server.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn analyze(&self, url: &str) -> Result<AnalysisResult, ClientError>;
    async fn start_download(
        &self,
        request: &DownloadRequest,
    ) -> Result<DownloadResponse, ClientError>;
}

pub struct ApiClient {
    client: reqwest::Client,
    base_url: Url,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout_secs: u64) -> Result<Self, ClientError> {
        let base_url = Url::parse(base_url)?;
        let client = reqwest::Client::builder()
            .user_agent(format!("kick-dvr/{}", env!("CARGO_PKG_VERSION")))
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .expect("Failed to create HTTP client");

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.as_str().trim_end_matches('/'), path)
    }

    /// SSE endpoint for a task's progress stream.
    pub fn events_url(&self, task_id: &str) -> String {
        self.endpoint(&format!("api/events/{}", task_id))
    }
}

#[async_trait]
impl Backend for ApiClient {
    async fn analyze(&self, url: &str) -> Result<AnalysisResult, ClientError> {
        let request = AnalyzeRequest {
            url: url.to_string(),
        };

        let response = self
            .client
            .post(self.endpoint("api/analyze"))
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Status(status));
        }

        let result: AnalysisResult = response.json().await?;
        if !result.success {
            let reason = result
                .error
                .filter(|e| !e.is_empty())
                .unwrap_or_else(|| "unknown error".to_string());
            return Err(ClientError::Analysis(reason));
        }

        tracing::info!(
            "Analyzed {}: {} ({})",
            result.url,
            result.title,
            if result.is_live { "live" } else { "vod" }
        );
        Ok(result)
    }

    async fn start_download(
        &self,
        request: &DownloadRequest,
    ) -> Result<DownloadResponse, ClientError> {
        let response = self
            .client
            .post(self.endpoint("api/download"))
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Status(status));
        }

        let result: DownloadResponse = response.json().await?;
        if !result.success {
            let reason = result
                .error
                .filter(|e| !e.is_empty())
                .unwrap_or_else(|| "unknown error".to_string());
            return Err(ClientError::Download(reason));
        }

        tracing::info!("Download started, task {}", result.task_id);
        Ok(result)
    }
}
