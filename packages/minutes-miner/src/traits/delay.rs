//! Delay strategy - every politeness wait and backoff goes through here.

use async_trait::async_trait;

use super::transport::ResourceKind;

/// Why the engine is about to wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DelayKind {
    /// Before any listing-page attempt
    Listing,
    /// Before any document download attempt
    Document,
    /// After a 403, before retrying
    Forbidden,
    /// After any other failure, before retrying
    Retry,
    /// Between two source groups
    GroupPause,
}

impl DelayKind {
    /// Pre-attempt politeness kind for a resource.
    pub fn before(kind: ResourceKind) -> Self {
        match kind {
            ResourceKind::Listing => DelayKind::Listing,
            ResourceKind::Document => DelayKind::Document,
        }
    }
}

/// Injectable wait. Production sleeps a jittered interval; tests record.
#[async_trait]
pub trait Delay: Send + Sync {
    async fn wait(&self, kind: DelayKind);
}
