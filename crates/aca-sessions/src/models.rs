//! Wire request/response types for the sessions service.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Default timeout for a single code execution.
pub const DEFAULT_EXECUTION_TIMEOUT_SECS: u32 = 100;

/// How code is provided to the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodeInputType {
    /// Code is provided as an inline string.
    #[default]
    Inline,
}

/// How the service runs the code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodeExecutionType {
    /// The call returns once execution has finished.
    #[default]
    Synchronous,
}

// Leading whitespace/backticks and an optional "python" language tag, as
// emitted by models that wrap code in markdown fences.
static LEADING_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:\s|`)*(?i:python)?\s*").expect("valid regex"));
static TRAILING_FENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?:\s|`)*$").expect("valid regex"));

/// Strip markdown fencing and a leading `python` tag from a code snippet.
pub fn sanitize_code_input(code: &str) -> String {
    if code.trim().is_empty() {
        return String::new();
    }
    let code = LEADING_FENCE.replace(code, "");
    TRAILING_FENCE.replace(&code, "").into_owned()
}

/// A request to execute a code snippet in a session.
#[derive(Debug, Clone)]
pub struct CodeExecutionRequest {
    /// Target session identifier.
    pub session_id: String,
    /// The code snippet to execute.
    pub code: String,
    /// Whether to sanitize the snippet before sending (default: true).
    pub sanitize_input: bool,
    /// Execution timeout in seconds (default: 100).
    pub timeout_in_seconds: u32,
}

impl CodeExecutionRequest {
    /// Create a request with default sanitization and timeout.
    pub fn new(session_id: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            code: code.into(),
            sanitize_input: true,
            timeout_in_seconds: DEFAULT_EXECUTION_TIMEOUT_SECS,
        }
    }

    /// Disable input sanitization.
    pub fn raw_input(mut self) -> Self {
        self.sanitize_input = false;
        self
    }

    /// Override the execution timeout.
    pub fn timeout_in_seconds(mut self, secs: u32) -> Self {
        self.timeout_in_seconds = secs;
        self
    }

    /// The code as it will be sent over the wire.
    pub fn effective_code(&self) -> String {
        if self.sanitize_input {
            sanitize_code_input(&self.code)
        } else {
            self.code.clone()
        }
    }
}

/// JSON body of an execution request.
#[derive(Debug, Serialize)]
pub(crate) struct CodeExecutionProperties {
    #[serde(rename = "codeInputType")]
    pub code_input_type: CodeInputType,
    #[serde(rename = "executionType")]
    pub execution_type: CodeExecutionType,
    #[serde(rename = "timeoutInSeconds")]
    pub timeout_in_seconds: u32,
    pub code: String,
}

/// Detailed result of a code execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionDetails {
    /// Value of the final expression, if any.
    #[serde(rename = "executionResult")]
    pub execution_result: Option<String>,
    /// Captured standard output.
    pub stdout: Option<String>,
    /// Captured standard error.
    pub stderr: Option<String>,
}

/// Result of a code execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeExecutionResult {
    /// Identifier assigned to the execution by the service.
    #[serde(default)]
    pub id: Option<String>,
    /// Execution status, e.g. `Succeeded` or `Failed`.
    pub status: String,
    /// Detailed result; absent on some failures.
    #[serde(default)]
    pub result: Option<ExecutionDetails>,
}

/// Metadata for a file stored in a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteFileMetadata {
    /// File name.
    pub name: String,
    /// Last modification time, when reported.
    #[serde(rename = "lastModifiedAt", default)]
    pub last_modified_at: Option<DateTime<Utc>>,
    /// Entry type, e.g. `file`.
    #[serde(rename = "type", default)]
    pub entry_type: Option<String>,
}

/// Envelope around a file listing.
#[derive(Debug, Deserialize)]
pub(crate) struct FileListResponse {
    pub value: Vec<RemoteFileMetadata>,
}

/// A request to upload a file into a session.
#[derive(Debug, Clone)]
pub struct FileUploadRequest {
    /// Target session identifier.
    pub session_id: String,
    /// Name to store the file under.
    pub file_name: String,
    /// File content.
    pub content: Vec<u8>,
}

/// Result of a file upload.
#[derive(Debug, Clone)]
pub struct FileUploadResult {
    /// Metadata of the uploaded file as reported by the service.
    pub file_metadata: RemoteFileMetadata,
}

/// A request to download a file from a session.
#[derive(Debug, Clone)]
pub struct FileDownloadRequest {
    /// Target session identifier.
    pub session_id: String,
    /// Remote file name to download.
    pub remote_file_name: String,
}

/// Result of a file download.
#[derive(Debug, Clone)]
pub struct FileDownloadResult {
    /// The downloaded file name.
    pub remote_file_name: String,
    /// Raw file contents.
    pub contents: Bytes,
}
