//! Per-request OCR job resources.

use std::path::Path;

use tempfile::NamedTempFile;
use uuid::Uuid;

use crate::admission::SlotPermit;

/// Resources held by one admitted request: the backend slot and the staged
/// upload.
///
/// Dropping the job deletes the staged file and releases the slot, whichever
/// way the request ends.
#[derive(Debug)]
pub struct OcrJob {
    id: Uuid,
    upload: NamedTempFile,
    _permit: SlotPermit,
}

impl OcrJob {
    /// Stage `image` in `upload_dir` under a unique name.
    ///
    /// If staging fails the permit is dropped with the error, releasing the
    /// slot.
    pub async fn stage(
        id: Uuid,
        permit: SlotPermit,
        upload_dir: &Path,
        image: &[u8],
    ) -> std::io::Result<Self> {
        let prefix = format!("{}-", id);
        let upload = tempfile::Builder::new()
            .prefix(&prefix)
            .suffix(".jpg")
            .tempfile_in(upload_dir)?;

        tokio::fs::write(upload.path(), image).await?;

        Ok(Self {
            id,
            upload,
            _permit: permit,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Path of the staged upload
    pub fn path(&self) -> &Path {
        self.upload.path()
    }
}

impl Drop for OcrJob {
    fn drop(&mut self) {
        // Fields drop after this: the file is removed, then the slot freed
        tracing::debug!(job_id = %self.id, path = %self.upload.path().display(), "Releasing OCR job");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::admission::ConcurrencySlotLimiter;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_stage_writes_and_drop_cleans_up() {
        let dir = TempDir::new().unwrap();
        let slots = ConcurrencySlotLimiter::new(1);
        let permit = slots.try_acquire().unwrap();
        let id = Uuid::new_v4();

        let job = OcrJob::stage(id, permit, dir.path(), b"image-bytes").await.unwrap();
        let path = job.path().to_path_buf();

        assert_eq!(std::fs::read(&path).unwrap(), b"image-bytes");
        assert!(path.file_name().unwrap().to_str().unwrap().starts_with(&id.to_string()));
        assert!(path.extension().is_some_and(|e| e == "jpg"));
        assert_eq!(slots.held(), 1);

        drop(job);

        assert!(!path.exists());
        assert_eq!(slots.held(), 0);
    }

    #[tokio::test]
    async fn test_failed_stage_releases_slot() {
        let dir = TempDir::new().unwrap();
        let slots = ConcurrencySlotLimiter::new(1);
        let permit = slots.try_acquire().unwrap();

        let missing = dir.path().join("does-not-exist");
        let result = OcrJob::stage(Uuid::new_v4(), permit, &missing, b"x").await;

        assert!(result.is_err());
        assert_eq!(slots.held(), 0);
    }
}
