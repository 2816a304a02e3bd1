//! Session Registry — process-wide mapping from attempt id to live session.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use crate::interview::session::Session;

/// Handle to one live session. The per-session mutex serializes operations
/// for a single attempt; distinct attempts never contend.
pub type SessionHandle = Arc<Mutex<Session>>;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("a session is already active for attempt {0}")]
    AlreadyActive(Uuid),

    #[error("no session started for attempt {0}")]
    NotStarted(Uuid),
}

/// Keyed store governing session lifecycle. Injectable so lifecycle
/// correctness does not depend on any particular storage choice.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Registers a session for an attempt. A second registration while the
    /// first is live is rejected with `AlreadyActive`.
    async fn create(
        &self,
        attempt_id: Uuid,
        session: Session,
    ) -> Result<SessionHandle, SessionError>;

    /// Looks up the live session for an attempt.
    async fn get(&self, attempt_id: Uuid) -> Result<SessionHandle, SessionError>;

    /// Removes the session. A second destroy for the same attempt reports
    /// `NotStarted`.
    async fn destroy(&self, attempt_id: Uuid) -> Result<(), SessionError>;

    /// Attempt ids with a live session.
    async fn active_ids(&self) -> Vec<Uuid>;
}

/// In-memory store. State lives only for the process's uptime: a restart
/// loses every in-flight session, leaving those attempts IN_PROGRESS until
/// resolved through the manual result endpoint.
#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<Uuid, SessionHandle>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn create(
        &self,
        attempt_id: Uuid,
        session: Session,
    ) -> Result<SessionHandle, SessionError> {
        let mut sessions = self.sessions.write().await;
        if sessions.contains_key(&attempt_id) {
            return Err(SessionError::AlreadyActive(attempt_id));
        }
        let handle: SessionHandle = Arc::new(Mutex::new(session));
        sessions.insert(attempt_id, handle.clone());
        Ok(handle)
    }

    async fn get(&self, attempt_id: Uuid) -> Result<SessionHandle, SessionError> {
        self.sessions
            .read()
            .await
            .get(&attempt_id)
            .cloned()
            .ok_or(SessionError::NotStarted(attempt_id))
    }

    async fn destroy(&self, attempt_id: Uuid) -> Result<(), SessionError> {
        self.sessions
            .write()
            .await
            .remove(&attempt_id)
            .map(|_| ())
            .ok_or(SessionError::NotStarted(attempt_id))
    }

    async fn active_ids(&self) -> Vec<Uuid> {
        self.sessions.read().await.keys().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interview::context::InterviewContext;
    use crate::llm_client::LlmClient;

    fn test_session() -> Session {
        let context = InterviewContext {
            interview_id: Uuid::new_v4(),
            title: "Backend Engineer".to_string(),
            description: "Core services team".to_string(),
            duration_minutes: 45,
            criteria: vec![],
            skills: vec![],
            responsibilities: vec![],
        };
        let llm = LlmClient::new("test-key".to_string());
        Session::new(context, llm.conversation())
    }

    #[tokio::test]
    async fn test_create_then_get_returns_same_session() {
        let store = InMemorySessionStore::new();
        let attempt_id = Uuid::new_v4();

        let created = store.create(attempt_id, test_session()).await.unwrap();
        let fetched = store.get(attempt_id).await.unwrap();

        assert!(Arc::ptr_eq(&created, &fetched));
        assert_eq!(store.active_ids().await, vec![attempt_id]);
    }

    #[tokio::test]
    async fn test_double_create_is_rejected() {
        let store = InMemorySessionStore::new();
        let attempt_id = Uuid::new_v4();

        store.create(attempt_id, test_session()).await.unwrap();
        let err = store.create(attempt_id, test_session()).await.unwrap_err();

        assert!(matches!(err, SessionError::AlreadyActive(id) if id == attempt_id));
        // The original session is untouched
        assert_eq!(store.active_ids().await.len(), 1);
    }

    #[tokio::test]
    async fn test_get_without_create_is_not_started() {
        let store = InMemorySessionStore::new();
        let attempt_id = Uuid::new_v4();

        let err = store.get(attempt_id).await.unwrap_err();
        assert!(matches!(err, SessionError::NotStarted(id) if id == attempt_id));
    }

    #[tokio::test]
    async fn test_destroy_removes_and_second_destroy_fails() {
        let store = InMemorySessionStore::new();
        let attempt_id = Uuid::new_v4();

        store.create(attempt_id, test_session()).await.unwrap();
        store.destroy(attempt_id).await.unwrap();

        assert!(store.get(attempt_id).await.is_err());
        let err = store.destroy(attempt_id).await.unwrap_err();
        assert!(matches!(err, SessionError::NotStarted(id) if id == attempt_id));
    }

    #[tokio::test]
    async fn test_distinct_attempts_are_independent() {
        let store = InMemorySessionStore::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        store.create(a, test_session()).await.unwrap();
        store.create(b, test_session()).await.unwrap();
        store.destroy(a).await.unwrap();

        assert!(store.get(a).await.is_err());
        assert!(store.get(b).await.is_ok());
    }
}
