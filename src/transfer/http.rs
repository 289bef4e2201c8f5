//! HTTP transport module
//!
//! Talks to the file-sharing server over plain HTTP with reqwest.

#![cfg(feature = "http")]

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use tracing::{debug, error, info};
use url::Url;

use crate::catalog::{parse_file_list, parse_recipient_list, SortSpec, StoredFile, UploadResponse};
use crate::error::{Result, ShareError};
use crate::transfer::transport::{CatalogTransport, UploadReceipt, UploadRequest};

/// reqwest-backed [`CatalogTransport`]
pub struct HttpTransport {
    /// HTTP client
    client: reqwest::Client,
    /// Server root, e.g. `http://192.168.1.5:5000/`
    base_url: Url,
    /// Treat list entries without an `encrypted` flag as encrypted
    assume_encrypted: bool,
}

impl HttpTransport {
    /// Create a transport for the server at `base_url`.
    ///
    /// `timeout` bounds each whole request; `None` lets requests run until
    /// the connection completes or fails.
    pub fn new(base_url: Url, timeout: Option<Duration>, assume_encrypted: bool) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;

        // Url::join replaces the last segment unless the path ends in '/'
        let mut base_url = base_url;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self {
            client,
            base_url,
            assume_encrypted,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// URL of a fixed endpoint
    pub fn endpoint_url(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path)?)
    }

    /// URL of `/download/{storage_name}` with the name percent-encoded
    pub fn download_url(&self, storage_name: &str) -> Result<Url> {
        let mut url = self.endpoint_url("download/")?;
        url.path_segments_mut()
            .map_err(|_| ShareError::config_error_with_field("Server URL cannot have path segments", "server"))?
            .pop_if_empty()
            .push(storage_name);
        Ok(url)
    }

    /// Turn a non-2xx response into a [`ShareError::NetworkError`]
    async fn check_status(response: reqwest::Response, what: &str) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let url = response.url().to_string();
        let body = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
        let detail = serde_json::from_str::<UploadResponse>(&body)
            .ok()
            .and_then(|r| r.error)
            .unwrap_or(body);

        error!("{} failed: {} - {}", what, status, detail);
        Err(ShareError::network_error_full(
            format!("{} failed with status {}", what, status),
            url,
            detail,
        ))
    }
}

#[async_trait]
impl CatalogTransport for HttpTransport {
    async fn list_files(&self, sort: SortSpec) -> Result<Vec<StoredFile>> {
        let url = self.endpoint_url("get_files")?;
        debug!("Listing files from {} ({})", url, sort);

        let response = self
            .client
            .get(url)
            .query(&sort.query_pairs())
            .send()
            .await?;
        let response = Self::check_status(response, "Listing files").await?;
        let body = response.text().await?;

        let files = parse_file_list(&body, self.assume_encrypted)?;
        debug!("Server listed {} files", files.len());
        Ok(files)
    }

    async fn list_recipients(&self) -> Result<Vec<String>> {
        let url = self.endpoint_url("get_ips")?;
        debug!("Listing recipients from {}", url);

        let response = self.client.get(url).send().await?;
        let response = Self::check_status(response, "Listing recipients").await?;
        let body = response.text().await?;

        parse_recipient_list(&body)
    }

    async fn upload(&self, request: UploadRequest) -> Result<UploadReceipt> {
        let url = self.endpoint_url("upload")?;
        info!(
            "Uploading {} ({} bytes) to {} for {}",
            request.display_name,
            request.bytes.len(),
            url,
            request.recipient
        );

        let part = Part::bytes(request.bytes.to_vec())
            .file_name(request.display_name.clone())
            .mime_str("application/octet-stream")?;
        let form = Form::new()
            .part("file", part)
            .text("recipient", request.recipient.as_form_value().to_string());

        let response = self.client.post(url).multipart(form).send().await?;
        let response = Self::check_status(response, "Upload").await?;
        let body = response.text().await?;

        let parsed: UploadResponse = serde_json::from_str(&body).map_err(|e| {
            ShareError::protocol_error_with_source("Unexpected /upload response shape", e.to_string())
        })?;
        let (message, storage_name) = parsed.into_outcome()?;

        info!("Upload accepted: {}", message);
        Ok(UploadReceipt { storage_name, message })
    }

    async fn fetch(&self, storage_name: &str) -> Result<Bytes> {
        let url = self.download_url(storage_name)?;
        debug!("Fetching {}", url);

        let response = self.client.get(url).send().await?;
        let response = Self::check_status(response, "Download").await?;
        let bytes = response.bytes().await?;

        debug!("Fetched {} bytes for {}", bytes.len(), storage_name);
        Ok(bytes)
    }

    fn endpoint(&self) -> String {
        self.base_url.to_string()
    }
}
