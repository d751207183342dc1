//! # aca-sessions
//!
//! Client library for Azure Container Apps dynamic sessions: execute code
//! snippets and manage files inside short-lived, isolated remote sessions.
//!
//! The crate solves two recurring problems behind a small surface:
//!
//! - **Credential caching**: [`TokenCache`] keeps one bearer token fresh
//!   under concurrent use, collapsing simultaneous refreshes into a single
//!   underlying fetch.
//! - **Session pooling**: [`SessionPool`] bounds concurrent session creation
//!   and hands unexpired sessions back to new callers instead of creating
//!   new remote sessions.
//!
//! Both sit on top of [`SessionsHttpClient`], a thin transport that attaches
//! the cached credential and the service's `identifier`/`api-version` query
//! parameters to every request and folds failures into typed errors.
//!
//! ## Quick Start
//!
//! ```ignore
//! use aca_sessions::{
//!     CodeExecutionRequest, CodeInterpreter, HttpClientOptions, SessionPool,
//!     SessionPoolOptions, SessionsHttpClient, StaticCredential, TokenCache,
//!     TokenProviderOptions,
//! };
//! use std::sync::Arc;
//!
//! # async fn example() -> aca_sessions::Result<()> {
//! let cache = Arc::new(TokenCache::new(
//!     Arc::new(StaticCredential::new("my-token")),
//!     TokenProviderOptions::default(),
//! ));
//!
//! let http = Arc::new(SessionsHttpClient::new(
//!     HttpClientOptions::builder()
//!         .endpoint("https://region.dynamicsessions.io/python/execute")
//!         .build()?,
//!     Some(cache),
//! ));
//!
//! let pool = SessionPool::new(SessionPoolOptions {
//!     endpoint: "https://region.dynamicsessions.io".into(),
//!     ..Default::default()
//! })?;
//!
//! let session = pool.get_or_create().await?;
//!
//! let interpreter = CodeInterpreter::new(http);
//! let result = interpreter
//!     .execute(&CodeExecutionRequest::new(&session.id, "print('hello')"))
//!     .await?;
//! println!("status: {}", result.status);
//!
//! pool.terminate(&session.id);
//! # Ok(())
//! # }
//! ```

mod config;
mod error;
mod http;
mod interpreter;
mod models;
mod pool;
mod token;

pub use config::{
    normalize_endpoint, parse_scopes, HttpClientOptions, HttpClientOptionsBuilder,
    SessionPoolOptions, TokenProviderOptions, DEFAULT_API_VERSION, DEFAULT_SCOPE,
};
pub use error::{Error, Result};
pub use http::{Payload, SessionsHttpClient, USER_AGENT};
pub use interpreter::CodeInterpreter;
pub use models::{
    sanitize_code_input, CodeExecutionRequest, CodeExecutionResult, CodeExecutionType,
    CodeInputType, ExecutionDetails, FileDownloadRequest, FileDownloadResult, FileUploadRequest,
    FileUploadResult, RemoteFileMetadata,
};
pub use pool::{SessionPool, SessionRecord, CONTAINER_IMAGE_PROPERTY};
pub use token::{AccessToken, ClientSecretCredential, StaticCredential, TokenCache, TokenCredential};
