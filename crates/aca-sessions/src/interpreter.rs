//! Code execution and file operations against a session.

use crate::error::{Error, Result};
use crate::http::{Payload, SessionsHttpClient};
use crate::models::{
    CodeExecutionProperties, CodeExecutionRequest, CodeExecutionResult, FileDownloadRequest,
    FileDownloadResult, FileListResponse, FileUploadRequest, FileUploadResult, RemoteFileMetadata,
};
use reqwest::multipart::{Form, Part};
use reqwest::Method;
use serde::de::DeserializeOwned;
use std::sync::Arc;

/// Executes code snippets and manages files inside remote sessions.
///
/// All remote interaction goes through the shared [`SessionsHttpClient`];
/// this type only shapes requests and decodes responses.
pub struct CodeInterpreter {
    http: Arc<SessionsHttpClient>,
}

impl CodeInterpreter {
    /// Create an interpreter over the given transport.
    pub fn new(http: Arc<SessionsHttpClient>) -> Self {
        Self { http }
    }

    /// Execute a code snippet in a session.
    pub async fn execute(&self, req: &CodeExecutionRequest) -> Result<CodeExecutionResult> {
        tracing::trace!(session_id = %req.session_id, code = %req.code, "executing code");

        let body = serde_json::to_value(CodeExecutionProperties {
            code_input_type: Default::default(),
            execution_type: Default::default(),
            timeout_in_seconds: req.timeout_in_seconds,
            code: req.effective_code(),
        })?;

        let response = self
            .http
            .send(Method::POST, "executions", &req.session_id, Payload::Json(body))
            .await?;

        decode_json(response).await
    }

    /// List the files stored in a session.
    pub async fn list_files(&self, session_id: &str) -> Result<Vec<RemoteFileMetadata>> {
        tracing::trace!(session_id = %session_id, "listing files");

        let response = self
            .http
            .send(Method::GET, "files", session_id, Payload::None)
            .await?;

        let listing: FileListResponse = decode_json(response).await?;
        Ok(listing.value)
    }

    /// Download a file from a session.
    pub async fn download_file(&self, req: &FileDownloadRequest) -> Result<FileDownloadResult> {
        tracing::trace!(
            session_id = %req.session_id,
            file = %req.remote_file_name,
            "downloading file"
        );

        let path = format!(
            "files/{}/content",
            urlencoding::encode(&req.remote_file_name)
        );
        let response = self
            .http
            .send(Method::GET, &path, &req.session_id, Payload::None)
            .await?;

        let url = response.url().to_string();
        let contents = response
            .bytes()
            .await
            .map_err(|source| Error::Transport { url, source })?;

        Ok(FileDownloadResult {
            remote_file_name: req.remote_file_name.clone(),
            contents,
        })
    }

    /// Upload a file into a session.
    pub async fn upload_file(&self, req: &FileUploadRequest) -> Result<FileUploadResult> {
        tracing::trace!(
            session_id = %req.session_id,
            file = %req.file_name,
            size = req.content.len(),
            "uploading file"
        );

        let form = Form::new().part(
            "file",
            Part::bytes(req.content.clone()).file_name(req.file_name.clone()),
        );

        let response = self
            .http
            .send(Method::POST, "files", &req.session_id, Payload::Multipart(form))
            .await?;

        let file_metadata: RemoteFileMetadata = decode_json(response).await?;
        Ok(FileUploadResult { file_metadata })
    }
}

/// Read a successful response body and decode it as JSON.
async fn decode_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let url = response.url().to_string();
    let body = response
        .text()
        .await
        .map_err(|source| Error::Transport { url, source })?;
    Ok(serde_json::from_str(&body)?)
}
