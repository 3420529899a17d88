//! Google Drive API client for listing and exporting files.

use std::path::Path;

use futures::StreamExt;
use reqwest::Client;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::auth::Authenticator;
use crate::error::{ArchiverError, Result};
use crate::models::{ApiErrorResponse, DriveFile, FileListResponse};

/// Base URL for Google Drive API v3.
const DRIVE_API_BASE: &str = "https://www.googleapis.com/drive/v3";

/// Client for listing Drive files and exporting documents.
pub struct DriveClient {
    auth: Authenticator,
    http: Client,
    api_base: String,
}

impl DriveClient {
    /// Create a new DriveClient against the production API.
    pub fn new(auth: Authenticator) -> Self {
        Self::with_base_url(auth, DRIVE_API_BASE)
    }

    /// Create a client against a non-default API endpoint (used by tests).
    pub fn with_base_url(auth: Authenticator, api_base: impl Into<String>) -> Self {
        Self {
            auth,
            http: Client::new(),
            api_base: api_base.into(),
        }
    }

    /// List every non-trashed file visible to the authenticated user,
    /// following `nextPageToken` until the listing is exhausted.
    pub async fn list_all(&self) -> Result<Vec<DriveFile>> {
        let token = self.auth.get_access_token().await?;
        let mut all_files = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self
                .http
                .get(format!("{}/files", self.api_base))
                .bearer_auth(&token)
                .query(&[
                    ("q", "trashed=false"),
                    ("spaces", "drive"),
                    ("fields", "nextPageToken, files(id, name, mimeType, parents)"),
                ]);

            if let Some(ref token) = page_token {
                request = request.query(&[("pageToken", token)]);
            }

            let response = request.send().await?;
            if !response.status().is_success() {
                return Err(api_error(response).await);
            }

            let list_response: FileListResponse = response.json().await?;
            debug!(count = list_response.files.len(), "fetched listing page");
            all_files.extend(list_response.files);

            match list_response.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        Ok(all_files)
    }

    /// Export a document in the given format, streaming the converted bytes
    /// to `destination`.
    pub async fn export_file<P: AsRef<Path>>(
        &self,
        file_id: &str,
        mime_type: &str,
        destination: P,
    ) -> Result<()> {
        let token = self.auth.get_access_token().await?;

        let response = self
            .http
            .get(format!("{}/files/{}/export", self.api_base, file_id))
            .bearer_auth(&token)
            .query(&[("mimeType", mime_type)])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        // Stream to file
        let mut file = File::create(destination.as_ref()).await?;
        let mut stream = response.bytes_stream();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await?;
        }

        file.flush().await?;

        Ok(())
    }
}

/// Decode a non-2xx response into an `ApiError`, preferring the structured
/// Drive error body when present.
async fn api_error(response: reqwest::Response) -> ArchiverError {
    let status = response.status();
    let error_body = response.text().await.unwrap_or_default();
    if let Ok(api_error) = serde_json::from_str::<ApiErrorResponse>(&error_body) {
        return ArchiverError::ApiError {
            status: api_error.error.code,
            message: api_error.error.message,
        };
    }
    ArchiverError::ApiError {
        status: status.as_u16(),
        message: error_body,
    }
}
