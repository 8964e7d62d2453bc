//! Report delivery over HTTP
//!
//! Uploads a finished report with a single `PUT` to `<endpoint>/<file name>`,
//! which fits presigned object-store URLs and plain WebDAV shares alike.
//! Delivery only ever reads the report: a failed upload leaves the file on
//! disk exactly as written, and is never retried.

use crate::error::DeliveryError;
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

/// MIME type of `.xlsx` files.
pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Where a report ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryReceipt {
    pub url: String,
    pub status: u16,
    pub bytes: usize,
}

pub struct HttpDelivery {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpDelivery {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, DeliveryError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DeliveryError::Transport {
                url: endpoint.to_string(),
                message: e.to_string(),
            })?;

        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
        })
    }

    /// Upload target for a report file.
    pub fn target_url(&self, artifact: &Path) -> String {
        let file_name = artifact
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        format!("{}/{}", self.endpoint, file_name)
    }

    pub async fn deliver(&self, artifact: &Path) -> Result<DeliveryReceipt, DeliveryError> {
        let body = tokio::fs::read(artifact)
            .await
            .map_err(|e| DeliveryError::ReadArtifact {
                path: artifact.to_path_buf(),
                source: e,
            })?;
        let url = self.target_url(artifact);
        let bytes = body.len();

        info!(url = %url, bytes, "Uploading report");

        let response = self
            .client
            .put(&url)
            .header(reqwest::header::CONTENT_TYPE, XLSX_CONTENT_TYPE)
            .body(body)
            .send()
            .await
            .map_err(|e| DeliveryError::Transport {
                url: url.clone(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!(url = %url, status = status.as_u16(), "Upload rejected");
            return Err(DeliveryError::Rejected {
                url,
                status: status.as_u16(),
            });
        }

        Ok(DeliveryReceipt {
            url,
            status: status.as_u16(),
            bytes,
        })
    }
}
