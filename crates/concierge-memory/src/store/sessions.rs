//! Session rows: lazy creation and partial-field upsert.

use super::Store;
use async_trait::async_trait;
use concierge_core::{
    context::ContextEntry,
    error::ConciergeError,
    session::{SessionPatch, SessionState},
    traits::SessionStore,
};
use tracing::debug;

fn decode_state(user_id: &str, raw: &str) -> SessionState {
    // A row written by an older build may not parse; start fresh rather than
    // wedge the user.
    serde_json::from_str(raw).unwrap_or_else(|e| {
        tracing::warn!("session for {user_id} is unreadable, resetting: {e}");
        SessionState::default()
    })
}

impl Store {
    /// Load a user's session, inserting an empty row on first contact.
    pub async fn load_session(&self, user_id: &str) -> Result<SessionState, ConciergeError> {
        sqlx::query("INSERT OR IGNORE INTO sessions (user_id) VALUES (?)")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| ConciergeError::Memory(format!("create session failed: {e}")))?;

        let (raw,): (String,) = sqlx::query_as("SELECT state FROM sessions WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| ConciergeError::Memory(format!("load session failed: {e}")))?;

        Ok(decode_state(user_id, &raw))
    }

    /// Read-apply-write a patch inside one transaction.
    pub async fn apply_patch(
        &self,
        user_id: &str,
        patch: &SessionPatch,
    ) -> Result<SessionState, ConciergeError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| ConciergeError::Memory(format!("begin failed: {e}")))?;

        let current: Option<(String,)> =
            sqlx::query_as("SELECT state FROM sessions WHERE user_id = ?")
                .bind(user_id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(|e| ConciergeError::Memory(format!("load session failed: {e}")))?;

        let mut state = current
            .map(|(raw,)| decode_state(user_id, &raw))
            .unwrap_or_default();
        patch.apply(&mut state);
        let encoded = serde_json::to_string(&state)?;

        sqlx::query(
            "INSERT INTO sessions (user_id, state) VALUES (?, ?) \
             ON CONFLICT(user_id) DO UPDATE SET state = excluded.state, \
             updated_at = datetime('now')",
        )
        .bind(user_id)
        .bind(&encoded)
        .execute(&mut *tx)
        .await
        .map_err(|e| ConciergeError::Memory(format!("upsert session failed: {e}")))?;

        tx.commit()
            .await
            .map_err(|e| ConciergeError::Memory(format!("commit failed: {e}")))?;

        debug!("session {user_id} updated");
        Ok(state)
    }

    /// Number of session rows.
    pub async fn session_count(&self) -> Result<i64, ConciergeError> {
        let (n,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM sessions")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| ConciergeError::Memory(format!("count sessions failed: {e}")))?;
        Ok(n)
    }
}

#[async_trait]
impl SessionStore for Store {
    async fn get(&self, user_id: &str) -> Result<SessionState, ConciergeError> {
        self.load_session(user_id).await
    }

    async fn upsert(&self, user_id: &str, patch: &SessionPatch) -> Result<(), ConciergeError> {
        if patch.is_empty() {
            return Ok(());
        }
        self.apply_patch(user_id, patch).await.map(|_| ())
    }

    async fn recent_history(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<ContextEntry>, ConciergeError> {
        self.history_for(user_id, limit).await
    }

    async fn append_exchange(
        &self,
        user_id: &str,
        user_text: &str,
        reply_text: &str,
        route: &str,
    ) -> Result<(), ConciergeError> {
        self.store_exchange(user_id, user_text, reply_text, route)
            .await
    }
}
