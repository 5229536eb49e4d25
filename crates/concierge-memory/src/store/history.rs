//! Conversation history.

use super::Store;
use concierge_core::{context::ContextEntry, error::ConciergeError};
use uuid::Uuid;

impl Store {
    /// Store one user message and the reply it got.
    pub async fn store_exchange(
        &self,
        user_id: &str,
        user_text: &str,
        reply_text: &str,
        route: &str,
    ) -> Result<(), ConciergeError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| ConciergeError::Memory(format!("begin failed: {e}")))?;

        for (role, content) in [("user", user_text), ("assistant", reply_text)] {
            sqlx::query(
                "INSERT INTO history (id, user_id, role, content, route) VALUES (?, ?, ?, ?, ?)",
            )
            .bind(Uuid::new_v4().to_string())
            .bind(user_id)
            .bind(role)
            .bind(content)
            .bind(route)
            .execute(&mut *tx)
            .await
            .map_err(|e| ConciergeError::Memory(format!("store {role} message failed: {e}")))?;
        }

        tx.commit()
            .await
            .map_err(|e| ConciergeError::Memory(format!("commit failed: {e}")))
    }

    /// The last `limit` messages for a user, oldest first.
    pub async fn history_for(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<ContextEntry>, ConciergeError> {
        let rows: Vec<(String, String)> = sqlx::query_as(
            "SELECT role, content FROM ( \
                 SELECT role, content, created_at, rowid FROM history \
                 WHERE user_id = ? ORDER BY created_at DESC, rowid DESC LIMIT ? \
             ) ORDER BY created_at ASC, rowid ASC",
        )
        .bind(user_id)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| ConciergeError::Memory(format!("load history failed: {e}")))?;

        Ok(rows
            .into_iter()
            .map(|(role, content)| ContextEntry { role, content })
            .collect())
    }

    /// The route chosen for the user's most recent message, if any.
    pub async fn last_route(&self, user_id: &str) -> Result<Option<String>, ConciergeError> {
        let row: Option<(Option<String>,)> = sqlx::query_as(
            "SELECT route FROM history WHERE user_id = ? AND role = 'user' \
             ORDER BY created_at DESC, rowid DESC LIMIT 1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| ConciergeError::Memory(format!("load last route failed: {e}")))?;
        Ok(row.and_then(|(r,)| r))
    }
}
