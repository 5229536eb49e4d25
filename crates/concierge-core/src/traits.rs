use crate::{
    action::{Action, Candidate, CapabilityReply, Domain, SearchQuery},
    context::{Completion, Context, ContextEntry},
    error::{CapabilityError, ConciergeError},
    session::{SessionPatch, SessionState},
};
use async_trait::async_trait;

/// Reasoning backend used by the intent classifier and the orchestrator
/// handoff.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Human-readable provider name.
    fn name(&self) -> &str;

    /// Send a context to the provider and get its reply.
    async fn complete(&self, context: &Context) -> Result<Completion, ConciergeError>;

    /// Check if the provider is configured and ready.
    async fn is_available(&self) -> bool;
}

/// A capability service: one integration domain behind a black box.
///
/// Given a normalized action it performs it and returns a display string,
/// or a typed error the dispatcher turns into a reply.
#[async_trait]
pub trait Capability: Send + Sync {
    /// The domain this service answers for.
    fn domain(&self) -> Domain;

    /// Perform one action for a user.
    async fn perform(&self, user_id: &str, action: &Action)
        -> Result<CapabilityReply, CapabilityError>;

    /// Look up candidate items (events, tasks) for update/delete targeting.
    async fn search(
        &self,
        _user_id: &str,
        _query: &SearchQuery,
    ) -> Result<Vec<Candidate>, CapabilityError> {
        Ok(Vec::new())
    }
}

/// Per-user session and history persistence.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Load the session for a user, creating an empty one lazily.
    async fn get(&self, user_id: &str) -> Result<SessionState, ConciergeError>;

    /// Apply a partial update. Fields the patch keeps are left untouched.
    async fn upsert(&self, user_id: &str, patch: &SessionPatch) -> Result<(), ConciergeError>;

    /// Most recent turns, oldest first.
    async fn recent_history(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<ContextEntry>, ConciergeError>;

    /// Record one user/assistant exchange.
    async fn append_exchange(
        &self,
        user_id: &str,
        user_text: &str,
        reply_text: &str,
        route: &str,
    ) -> Result<(), ConciergeError>;
}
