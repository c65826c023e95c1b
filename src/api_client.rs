use anyhow::{Context, Result};
use reqwest::header::{ACCEPT, HeaderValue};
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RemoveBgError {
    #[error("request to remove.bg failed: {0}")]
    Request(#[source] reqwest::Error),
    #[error("remove.bg returned an error ({status}): {title} (code: {code})")]
    Api {
        status: StatusCode,
        title: String,
        code: String,
    },
    #[error("remove.bg returned status {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("failed to read remove.bg response: {0}")]
    ResponseRead(#[source] reqwest::Error),
}

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("request to {url} failed: {source}")]
    Request { url: String, source: reqwest::Error },
    #[error("download from {url} returned status {status}: {body}")]
    Status {
        url: String,
        status: StatusCode,
        body: String,
    },
    #[error("failed to read body from {url}: {source}")]
    Read { url: String, source: reqwest::Error },
}

#[derive(Debug, Deserialize)]
struct RemoveBgErrorBody {
    #[serde(default)]
    errors: Vec<RemoveBgErrorEntry>,
}

#[derive(Debug, Deserialize)]
struct RemoveBgErrorEntry {
    #[serde(default)]
    title: String,
    #[serde(default)]
    code: String,
}

/// HTTP side of the bot: Telegram file downloads and the remove.bg API,
/// sharing one client and its timeout.
pub struct ApiClient {
    remove_bg_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl ApiClient {
    pub fn new(remove_bg_url: String, api_key: String, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            remove_bg_url,
            api_key,
            client,
        })
    }

    pub async fn download(&self, url: &str) -> Result<Vec<u8>, DownloadError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| DownloadError::Request {
                url: url.to_string(),
                source,
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(DownloadError::Status {
                url: url.to_string(),
                status,
                body,
            });
        }

        let bytes = response.bytes().await.map_err(|source| DownloadError::Read {
            url: url.to_string(),
            source,
        })?;

        Ok(bytes.to_vec())
    }

    pub async fn remove_background(&self, png: Vec<u8>) -> Result<Vec<u8>, RemoveBgError> {
        let image_part = Part::bytes(png)
            .file_name("image.png")
            .mime_str("image/png")
            .map_err(RemoveBgError::Request)?;

        let form = Form::new()
            .part("image_file", image_part)
            .text("size", "auto")
            .text("format", "png");

        let response = self
            .client
            .post(&self.remove_bg_url)
            .header("X-Api-Key", &self.api_key)
            .header(ACCEPT, HeaderValue::from_static("image/png"))
            .multipart(form)
            .send()
            .await
            .map_err(RemoveBgError::Request)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(classify_error_body(status, body));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(RemoveBgError::ResponseRead)?;

        Ok(bytes.to_vec())
    }
}

fn classify_error_body(status: StatusCode, body: String) -> RemoveBgError {
    let first = serde_json::from_str::<RemoveBgErrorBody>(&body)
        .ok()
        .and_then(|parsed| parsed.errors.into_iter().next());

    match first {
        Some(entry) => RemoveBgError::Api {
            status,
            title: entry.title,
            code: entry.code,
        },
        None => RemoveBgError::Status { status, body },
    }
}
