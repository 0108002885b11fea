//! Zencoder API facade.
//!
//! The reconciliation engine consumes the narrow [`ZencoderApi`] trait; the
//! HTTP transport lives entirely in [`HttpZencoderClient`]. Raw response
//! types mirror the wire fields the engine actually reads — flexible scalars
//! come in as [`RawField`] and are typed by `services::normalize`.

use async_trait::async_trait;
use serde::Deserialize;

use crate::services::normalize::RawField;

/// A facade call itself failed (network, auth, non-success status). Distinct
/// from a job that transcoded unsuccessfully, which is ordinary snapshot data.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP request to Zencoder failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Zencoder returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("failed to decode Zencoder response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Acknowledgment returned by job creation. Carries identity and the input's
/// initial state only; technical metadata is not available until the first
/// details fetch.
#[derive(Debug, Clone, Deserialize)]
pub struct RawCreateResponse {
    pub id: Option<RawField>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    pub input: Option<RawCreateInput>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawCreateInput {
    pub id: Option<RawField>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
}

/// Job details: per-track metadata, per-track states, timestamps, errors.
#[derive(Debug, Clone, Deserialize)]
pub struct RawDetailsResponse {
    pub job: RawJobDetails,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawJobDetails {
    pub id: Option<RawField>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    pub input_media_file: Option<RawMediaFile>,
    #[serde(default)]
    pub output_media_files: Vec<RawMediaFile>,
}

/// One media file record (input or output) inside a details response.
/// Every field is optional on the wire.
#[derive(Debug, Clone, Deserialize)]
pub struct RawMediaFile {
    pub id: Option<RawField>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub width: Option<RawField>,
    #[serde(default)]
    pub height: Option<RawField>,
    #[serde(default)]
    pub frame_rate: Option<RawField>,
    #[serde(default)]
    pub duration_in_ms: Option<RawField>,
    #[serde(default, alias = "file_size_in_bytes")]
    pub file_size_bytes: Option<RawField>,
    #[serde(default)]
    pub md5_checksum: Option<RawField>,
    #[serde(default)]
    pub audio_codec: Option<RawField>,
    #[serde(default)]
    pub video_codec: Option<RawField>,
    #[serde(default)]
    pub audio_bitrate_in_kbps: Option<RawField>,
    #[serde(default)]
    pub video_bitrate_in_kbps: Option<RawField>,
}

/// Job progress: aggregate job state, completion percentage and the events
/// currently executing on each output.
#[derive(Debug, Clone, Deserialize)]
pub struct RawProgressResponse {
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub progress: Option<RawField>,
    #[serde(default)]
    pub errors: Vec<String>,
    #[serde(default)]
    pub outputs: Vec<RawOutputProgress>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawOutputProgress {
    #[serde(default)]
    pub current_event: Option<String>,
}

/// The set of upstream operations the reconciliation engine needs. Implemented
/// over HTTP by [`HttpZencoderClient`]; tests substitute canned responses.
#[async_trait]
pub trait ZencoderApi: Send + Sync {
    async fn create_job(&self, source_url: &str) -> Result<RawCreateResponse, TransportError>;

    async fn job_details(&self, job_id: &str) -> Result<RawDetailsResponse, TransportError>;

    async fn job_progress(&self, job_id: &str) -> Result<RawProgressResponse, TransportError>;

    /// Ask the provider to cancel a job. Acknowledgment only; whether and when
    /// the job actually transitions is the provider's business.
    async fn cancel_job(&self, job_id: &str) -> Result<(), TransportError>;
}

/// HTTP client for the Zencoder v2 API.
pub struct HttpZencoderClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl HttpZencoderClient {
    pub fn new(api_key: String) -> Result<Self, TransportError> {
        Self::with_base_url(api_key, "https://app.zencoder.com/api/v2".to_string())
    }

    pub fn with_base_url(api_key: String, base_url: String) -> Result<Self, TransportError> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()?;

        Ok(Self {
            http,
            api_key,
            base_url,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }

    async fn decode<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, TransportError> {
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(TransportError::Decode)
    }
}

#[async_trait]
impl ZencoderApi for HttpZencoderClient {
    async fn create_job(&self, source_url: &str) -> Result<RawCreateResponse, TransportError> {
        tracing::debug!(source_url = %source_url, "submitting Zencoder job");
        let response = self
            .http
            .post(self.url("jobs"))
            .header("Zencoder-Api-Key", &self.api_key)
            .json(&serde_json::json!({ "input": source_url }))
            .send()
            .await?;

        Self::decode(response).await
    }

    async fn job_details(&self, job_id: &str) -> Result<RawDetailsResponse, TransportError> {
        let response = self
            .http
            .get(self.url(&format!("jobs/{}.json", job_id)))
            .header("Zencoder-Api-Key", &self.api_key)
            .send()
            .await?;

        Self::decode(response).await
    }

    async fn job_progress(&self, job_id: &str) -> Result<RawProgressResponse, TransportError> {
        let response = self
            .http
            .get(self.url(&format!("jobs/{}/progress.json", job_id)))
            .header("Zencoder-Api-Key", &self.api_key)
            .send()
            .await?;

        Self::decode(response).await
    }

    async fn cancel_job(&self, job_id: &str) -> Result<(), TransportError> {
        tracing::debug!(job_id = %job_id, "requesting Zencoder job cancellation");
        let response = self
            .http
            .put(self.url(&format!("jobs/{}/cancel.json", job_id)))
            .header("Zencoder-Api-Key", &self.api_key)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(())
    }
}
