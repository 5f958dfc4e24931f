//! Background removal of expired exports.

use std::path::Path;
use std::time::{Duration, SystemTime};

use tokio::task::JoinHandle;

use super::{is_export_name, ExportError, SpreadsheetExporter};

/// Shortest pause between two sweeps
const MIN_SWEEP_INTERVAL: Duration = Duration::from_secs(1);

impl SpreadsheetExporter {
    /// Delete exports last modified more than `ttl` ago.
    ///
    /// Files that do not look like exports are left alone. Returns the number
    /// of deleted files.
    pub async fn sweep_expired(&self, ttl: Duration) -> Result<usize, ExportError> {
        let mut entries = tokio::fs::read_dir(self.dir()).await?;
        let now = SystemTime::now();
        let mut removed = 0;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if !is_sweepable(&path) {
                continue;
            }

            let modified = match entry.metadata().await.and_then(|m| m.modified()) {
                Ok(modified) => modified,
                Err(e) => {
                    tracing::warn!(path = %path.display(), "Cannot stat export: {}", e);
                    continue;
                }
            };
            let age = now.duration_since(modified).unwrap_or_default();
            if age < ttl {
                continue;
            }

            match tokio::fs::remove_file(&path).await {
                Ok(()) => removed += 1,
                // Already gone, e.g. removed by hand
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    tracing::warn!(path = %path.display(), "Failed to remove export: {}", e);
                }
            }
        }

        Ok(removed)
    }
}

fn is_sweepable(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(is_export_name)
}

/// Run [`SpreadsheetExporter::sweep_expired`] periodically until the runtime stops.
pub fn spawn_sweeper(exporter: SpreadsheetExporter, ttl: Duration) -> JoinHandle<()> {
    let period = (ttl / 2).max(MIN_SWEEP_INTERVAL);

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        loop {
            ticker.tick().await;
            match exporter.sweep_expired(ttl).await {
                Ok(0) => {}
                Ok(removed) => tracing::info!(removed, "Expired exports removed"),
                Err(e) => tracing::warn!("Export sweep failed: {}", e),
            }
        }
    })
}
