//! Session admission and reuse pool.
//!
//! The pool tracks remote session records keyed by id, hands unexpired
//! sessions back to new callers instead of creating fresh remote sessions,
//! and gates the scan-or-create step behind a counting semaphore so that at
//! most `max_concurrent_sessions` creation attempts proceed at once.

use crate::config::SessionPoolOptions;
use crate::error::{Error, Result};
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::Semaphore;
use uuid::Uuid;

/// Property key recording which container image a session runs.
pub const CONTAINER_IMAGE_PROPERTY: &str = "ContainerImage";

/// A remote session tracked by the pool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    /// Globally unique, caller-opaque session identifier.
    pub id: String,
    /// Derived URL for the session.
    pub endpoint: String,
    /// When the session was created.
    pub created_at: DateTime<Utc>,
    /// When the session is considered expired.
    pub expires_at: DateTime<Utc>,
    /// Lifecycle flag; only active sessions are eligible for reuse.
    pub is_active: bool,
    /// Open string-to-string properties, e.g. the container image tag.
    pub properties: HashMap<String, String>,
}

impl SessionRecord {
    /// True when the session is active and not yet expired.
    pub fn is_available(&self) -> bool {
        self.is_active && self.expires_at > Utc::now()
    }
}

/// Pool of reusable remote sessions.
///
/// The mapping supports concurrent reads and per-id insert/remove without a
/// pool-wide lock. Expiry is evaluated lazily at access time; an expired
/// session is only discovered when next requested.
pub struct SessionPool {
    sessions: DashMap<String, SessionRecord>,
    admission: Semaphore,
    options: SessionPoolOptions,
    session_timeout: Duration,
}

impl SessionPool {
    /// Create a new pool.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] when the options fail validation.
    pub fn new(options: SessionPoolOptions) -> Result<Self> {
        options.validate()?;
        tracing::info!(
            max_concurrent_sessions = options.max_concurrent_sessions,
            session_timeout_minutes = options.session_timeout_minutes,
            "creating session pool"
        );
        Ok(Self {
            sessions: DashMap::new(),
            admission: Semaphore::new(options.max_concurrent_sessions),
            session_timeout: Duration::minutes(options.session_timeout_minutes),
            options,
        })
    }

    /// Get an available session, creating one if none can be reused.
    ///
    /// Scans for any active, unexpired record first (selection among eligible
    /// records is arbitrary). When none exists, a new record is synthesized
    /// and inserted. The admission permit is held for the scan-or-create step
    /// only, so the bound applies to concurrent creation attempts rather than
    /// to the number of live sessions.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Cancelled`] when the pool has been closed.
    pub async fn get_or_create(&self) -> Result<SessionRecord> {
        let _permit = self
            .admission
            .acquire()
            .await
            .map_err(|_| Error::Cancelled)?;

        let reusable = self
            .sessions
            .iter()
            .find_map(|entry| entry.value().is_available().then(|| entry.value().clone()));

        if let Some(session) = reusable {
            tracing::info!(session_id = %session.id, "reusing existing session");
            return Ok(session);
        }

        let id = Uuid::new_v4().to_string();
        let now = Utc::now();
        let session = SessionRecord {
            endpoint: format!(
                "{}/sessions/{}",
                self.options.endpoint.trim_end_matches('/'),
                id
            ),
            id: id.clone(),
            created_at: now,
            expires_at: now + self.session_timeout,
            is_active: true,
            properties: HashMap::from([(
                CONTAINER_IMAGE_PROPERTY.to_string(),
                self.options.container_image.clone(),
            )]),
        };

        self.sessions.insert(id.clone(), session.clone());
        tracing::info!(session_id = %id, "created new session");
        Ok(session)
    }

    /// Mark intent to return a session to the pool.
    ///
    /// Presence in the mapping with `is_active` set is what makes a session
    /// eligible for reuse, so this does not mutate the stored record.
    pub fn release(&self, session_id: &str) {
        if self.sessions.contains_key(session_id) {
            tracing::info!(session_id = %session_id, "released session");
        }
    }

    /// Terminate a session, removing it from the pool.
    ///
    /// The slot becomes eligible for replacement; subsequent lookups for the
    /// id find nothing.
    pub fn terminate(&self, session_id: &str) {
        if let Some((_, mut session)) = self.sessions.remove(session_id) {
            session.is_active = false;
            tracing::info!(session_id = %session_id, "terminated session");
        }
    }

    /// Snapshot of all active, unexpired sessions.
    pub fn active_sessions(&self) -> Vec<SessionRecord> {
        self.sessions
            .iter()
            .filter_map(|entry| entry.value().is_available().then(|| entry.value().clone()))
            .collect()
    }

    /// Current number of tracked sessions, expired ones included.
    pub fn size(&self) -> usize {
        self.sessions.len()
    }

    /// Close the pool.
    ///
    /// Callers blocked on the admission gate, and any later
    /// [`get_or_create`](Self::get_or_create) calls, fail with
    /// [`Error::Cancelled`]. Tracked sessions are left untouched.
    pub fn close(&self) {
        tracing::info!("closing session pool");
        self.admission.close();
    }

    #[cfg(test)]
    fn insert_record(&self, session: SessionRecord) {
        self.sessions.insert(session.id.clone(), session);
    }
}
