//! Upload endpoint client.
//!
//! [`Uploader`] is the seam between the queue and the network; the queue only
//! ever sees `Result<StoredFile, UploadError>` per file. [`HttpUploader`] is the
//! real implementation: one multipart POST per file against the Study Tracker
//! upload endpoint.
//!
//! # Request
//!
//! | Field      | Content                    |
//! |------------|----------------------------|
//! | `file`     | payload, with its file name |
//! | `folderId` | destination folder id      |
//! | `path`     | target path in the folder  |
//!
//! A 2xx answer carries `{"path": "..."}`; anything else is a failure for
//! that file only.

use reqwest::multipart::{Form, Part};
use std::future::Future;
use std::sync::Arc;

use crate::config::UploadConfig;
use crate::error::{ConfigResult, UploadError, UploadResult};
use crate::models::{QueuedFile, StoredFile, UploadTarget};

/// Sends one file to the upload endpoint.
pub trait Uploader: Send + Sync {
    fn upload(
        &self,
        file: &QueuedFile,
        target: &UploadTarget,
    ) -> impl Future<Output = UploadResult<StoredFile>> + Send;
}

impl<U: Uploader> Uploader for Arc<U> {
    fn upload(
        &self,
        file: &QueuedFile,
        target: &UploadTarget,
    ) -> impl Future<Output = UploadResult<StoredFile>> + Send {
        (**self).upload(file, target)
    }
}

/// Multipart HTTP uploader.
#[derive(Clone)]
pub struct HttpUploader {
    client: reqwest::Client,
    url: String,
}

impl HttpUploader {
    /// Client for `config.upload_url()` with the configured timeout.
    pub fn new(config: &UploadConfig) -> ConfigResult<Self> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client,
            url: config.upload_url(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Uploader for HttpUploader {
    async fn upload(&self, file: &QueuedFile, target: &UploadTarget) -> UploadResult<StoredFile> {
        let part = Part::stream_with_length(file.body(), file.size).file_name(file.name.clone());
        let form = Form::new()
            .part("file", part)
            .text("folderId", target.folder_id.clone())
            .text("path", target.path.clone());

        let response = self.client.post(&self.url).multipart(form).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(UploadError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<StoredFile>()
            .await
            .map_err(|e| UploadError::InvalidResponse(e.to_string()))
    }
}
