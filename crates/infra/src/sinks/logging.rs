//! Sink that only records diffs in the log

use async_trait::async_trait;
use calrelay_core::DiffSink;
use calrelay_domain::{DiffEvent, Result};
use tracing::info;

/// Used when no downstream webhook is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingDiffSink;

#[async_trait]
impl DiffSink for LoggingDiffSink {
    async fn deliver(&self, event: &DiffEvent) -> Result<()> {
        info!(
            target: "calrelay::diff",
            resource = %event.resource_id,
            item_id = %event.item_id,
            kind = %event.kind,
            marker = event.marker.as_deref().unwrap_or("-"),
            "diff"
        );
        Ok(())
    }
}
