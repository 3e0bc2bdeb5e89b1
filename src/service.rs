//! Remote shrink service.
//!
//! `POST <endpoint>` with the raw image as body answers `201` and
//! `{"input":{"size"},"output":{"size","url"}}`, or an error status with
//! `{"error": "<code>"}`. `GET <output.url>` returns the compressed bytes,
//! optionally resized when a `{"resize": {...}}` body is attached.

use crate::constants::{
    API_USER, ERROR_CODE_QUOTA, ERROR_CODE_UNAUTHORIZED, SHRINK_CREATED_STATUS,
};
use crate::error::{CamlibError, Result};
use crate::utils::percent_saved;
use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{BoxStream, StreamExt, TryStreamExt};
use reqwest::{Body, Client};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Compressed bytes as they arrive from the service.
pub type ByteStream = BoxStream<'static, Result<Bytes>>;

/// Optional target dimensions for the fetched result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ResizeDirective {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

impl ResizeDirective {
    /// `None` unless at least one dimension is set.
    pub fn new(width: Option<u32>, height: Option<u32>) -> Option<Self> {
        if width.is_none() && height.is_none() {
            None
        } else {
            Some(Self { width, height })
        }
    }
}

#[derive(Serialize)]
struct ResizeRequest<'a> {
    resize: &'a ResizeDirective,
}

/// Sizes reported for a successful shrink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Savings {
    pub input_size: u64,
    pub output_size: u64,
}

impl Savings {
    /// Compression only pays off when the output is strictly smaller.
    pub fn is_beneficial(&self) -> bool {
        self.output_size < self.input_size
    }

    pub fn bytes_saved(&self) -> u64 {
        self.input_size.saturating_sub(self.output_size)
    }

    pub fn percent_saved(&self) -> i64 {
        percent_saved(self.input_size, self.output_size)
    }
}

/// The service's answer to a shrink request, decoded once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShrinkOutcome {
    Success { savings: Savings, url: String },
    QuotaExceeded,
    Unauthorized,
    OtherError { status: u16, code: Option<String> },
    Unparsable,
}

#[derive(Deserialize)]
struct SizeField {
    size: u64,
}

#[derive(Deserialize)]
struct OutputField {
    size: u64,
    url: String,
}

#[derive(Deserialize)]
struct ShrinkResponse {
    input: SizeField,
    output: OutputField,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: Option<String>,
}

impl ShrinkOutcome {
    pub fn decode(status: u16, body: &[u8]) -> Self {
        let value: serde_json::Value = match serde_json::from_slice(body) {
            Ok(value) => value,
            Err(_) => return ShrinkOutcome::Unparsable,
        };

        if status == SHRINK_CREATED_STATUS {
            return match serde_json::from_value::<ShrinkResponse>(value) {
                Ok(response) => ShrinkOutcome::Success {
                    savings: Savings {
                        input_size: response.input.size,
                        output_size: response.output.size,
                    },
                    url: response.output.url,
                },
                Err(_) => ShrinkOutcome::Unparsable,
            };
        }

        let code = serde_json::from_value::<ErrorResponse>(value)
            .ok()
            .and_then(|e| e.error);
        match code.as_deref() {
            Some(ERROR_CODE_QUOTA) => ShrinkOutcome::QuotaExceeded,
            Some(ERROR_CODE_UNAUTHORIZED) => ShrinkOutcome::Unauthorized,
            _ => ShrinkOutcome::OtherError { status, code },
        }
    }
}

#[async_trait]
pub trait CompressionService: Send + Sync {
    /// Uploads the file's current bytes and decodes the answer.
    /// `Err` means no usable response arrived at all.
    async fn shrink(&self, path: &Path) -> Result<ShrinkOutcome>;

    /// Opens the result at `url` as a byte stream.
    async fn fetch(&self, url: &str, resize: Option<&ResizeDirective>) -> Result<ByteStream>;
}

/// `CompressionService` over HTTPS with basic authentication.
#[derive(Debug, Clone)]
pub struct ShrinkClient {
    client: Client,
    endpoint: String,
    api_key: String,
}

impl ShrinkClient {
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("camlib/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl CompressionService for ShrinkClient {
    async fn shrink(&self, path: &Path) -> Result<ShrinkOutcome> {
        let file = tokio::fs::File::open(path).await?;
        let response = self
            .client
            .post(&self.endpoint)
            .basic_auth(API_USER, Some(&self.api_key))
            .body(Body::from(file))
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.bytes().await?;
        Ok(ShrinkOutcome::decode(status, &body))
    }

    async fn fetch(&self, url: &str, resize: Option<&ResizeDirective>) -> Result<ByteStream> {
        let mut request = self.client.get(url);
        if let Some(resize) = resize {
            request = request
                .basic_auth(API_USER, Some(&self.api_key))
                .json(&ResizeRequest { resize });
        }

        let response = request.send().await?.error_for_status()?;
        Ok(response.bytes_stream().map_err(CamlibError::from).boxed())
    }
}
