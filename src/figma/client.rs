//! Figma API client
//!
//! Thin wrapper over the Figma REST endpoints the tools consume.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::config::figma::TOKEN_HEADER;
use crate::config::Config;
use crate::error::{ConfigError, FigmaApiError, FigmaMcpError, Result};
use crate::figma::types::*;

/// Remote calls the tool handlers depend on
#[async_trait]
pub trait FigmaApi: Send + Sync {
    /// `GET /files/{key}/nodes`, filtered to `node_ids` when non-empty
    async fn get_file_nodes(&self, file_key: &str, node_ids: &[String])
        -> Result<FileNodesResponse>;

    /// `GET /files/{key}/components`
    async fn get_file_components(&self, file_key: &str) -> Result<FileComponentsResponse>;

    /// `GET /files/{key}`
    async fn get_file(&self, file_key: &str) -> Result<FileResponse>;

    /// `GET /files/{key}/styles`
    async fn get_file_styles(&self, file_key: &str) -> Result<FileStylesResponse>;

    /// `POST /files/{key}/export`
    async fn export_nodes(&self, file_key: &str, request: &ExportRequest)
        -> Result<ExportResponse>;
}

/// Figma API client
pub struct FigmaClient {
    /// HTTP client carrying the auth header
    http_client: reqwest::Client,

    /// API base URL without trailing slash
    base_url: String,
}

impl FigmaClient {
    /// Create a new Figma client from configuration
    pub fn new(config: &Config) -> Result<Self> {
        let mut token = HeaderValue::from_str(&config.api_key).map_err(|_| {
            FigmaMcpError::Config(ConfigError::InvalidConfig {
                message: "API key is not a valid header value".to_string(),
            })
        })?;
        token.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(HeaderName::from_static(TOKEN_HEADER), token);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http_client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            http_client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
        })
    }

    /// URL of a file resource
    fn file_url(&self, file_key: &str) -> String {
        format!("{}/files/{}", self.base_url, urlencoding::encode(file_key))
    }

    /// Send a request and decode a successful JSON body
    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        action: &str,
    ) -> Result<T> {
        let response = request.send().await?;

        if response.status().is_success() {
            let body = response.bytes().await?;
            decode_body(&body)
        } else {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            Err(FigmaMcpError::Figma(FigmaApiError::RequestFailed {
                message: format!("Failed to {} ({}): {}", action, status, text),
            }))
        }
    }
}

/// Decode a JSON body without a nesting limit.
///
/// Document trees nest two JSON levels per node, so serde_json's default
/// limit of 128 rejects files only ~64 nodes deep. The stack grows on demand
/// instead.
pub fn decode_body<T: DeserializeOwned>(body: &[u8]) -> Result<T> {
    let mut deserializer = serde_json::Deserializer::from_slice(body);
    deserializer.disable_recursion_limit();
    let value = T::deserialize(serde_stacker::Deserializer::new(&mut deserializer))?;
    deserializer.end()?;
    Ok(value)
}

#[async_trait]
impl FigmaApi for FigmaClient {
    async fn get_file_nodes(
        &self,
        file_key: &str,
        node_ids: &[String],
    ) -> Result<FileNodesResponse> {
        let mut url = format!("{}/nodes", self.file_url(file_key));
        if !node_ids.is_empty() {
            url.push_str("?ids=");
            url.push_str(&urlencoding::encode(&node_ids.join(",")));
        }

        tracing::debug!(%url, "Fetching file nodes");
        self.send(self.http_client.get(&url), "get file nodes").await
    }

    async fn get_file_components(&self, file_key: &str) -> Result<FileComponentsResponse> {
        let url = format!("{}/components", self.file_url(file_key));

        tracing::debug!(%url, "Fetching file components");
        self.send(self.http_client.get(&url), "get file components")
            .await
    }

    async fn get_file(&self, file_key: &str) -> Result<FileResponse> {
        let url = self.file_url(file_key);

        tracing::debug!(%url, "Fetching file");
        self.send(self.http_client.get(&url), "get file").await
    }

    async fn get_file_styles(&self, file_key: &str) -> Result<FileStylesResponse> {
        let url = format!("{}/styles", self.file_url(file_key));

        tracing::debug!(%url, "Fetching file styles");
        self.send(self.http_client.get(&url), "get file styles").await
    }

    async fn export_nodes(
        &self,
        file_key: &str,
        request: &ExportRequest,
    ) -> Result<ExportResponse> {
        let url = format!("{}/export", self.file_url(file_key));

        tracing::debug!(%url, format = %request.format, count = request.ids.len(), "Exporting nodes");
        self.send(self.http_client.post(&url).json(request), "export nodes")
            .await
    }
}
