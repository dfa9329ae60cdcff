//! Delay strategies: jittered sleeps for production, none for tests.

use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

use crate::traits::delay::{Delay, DelayKind};
use crate::types::config::{DelayRanges, JitterRange};

/// Sleeps a random interval drawn from the configured range for each kind.
#[derive(Debug, Clone, Default)]
pub struct JitterDelay {
    ranges: DelayRanges,
}

impl JitterDelay {
    pub fn new(ranges: DelayRanges) -> Self {
        Self { ranges }
    }

    /// Range used for a kind.
    pub fn range(&self, kind: DelayKind) -> JitterRange {
        match kind {
            DelayKind::Listing => self.ranges.listing,
            DelayKind::Document => self.ranges.document,
            DelayKind::Forbidden => self.ranges.forbidden,
            DelayKind::Retry => self.ranges.retry,
            DelayKind::GroupPause => self.ranges.group_pause,
        }
    }

    /// Duration the next wait of this kind would take; `None` when disabled.
    pub fn sample(&self, kind: DelayKind) -> Option<Duration> {
        self.ranges.enabled.then(|| self.range(kind).sample())
    }
}

#[async_trait]
impl Delay for JitterDelay {
    async fn wait(&self, kind: DelayKind) {
        if let Some(duration) = self.sample(kind) {
            debug!(?kind, wait_ms = duration.as_millis() as u64, "Pacing");
            tokio::time::sleep(duration).await;
        }
    }
}

/// Never waits.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDelay;

#[async_trait]
impl Delay for NoDelay {
    async fn wait(&self, _kind: DelayKind) {}
}
