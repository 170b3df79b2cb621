//! Stores attached photos through a [`PhotoStorageService`].

use common::PhotoId;
use wizard::{PhotoFile, RejectedPhoto, ValidationAdapter, WizardError};

use crate::SharedWizard;
use crate::error::CheckoutError;
use crate::services::storage::PhotoStorageService;

/// Outcome of one upload pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadReport {
    pub stored: Vec<PhotoId>,
    pub rejected: Vec<RejectedPhoto>,
}

impl UploadReport {
    pub fn stored_count(&self) -> usize {
        self.stored.len()
    }

    pub fn rejected_count(&self) -> usize {
        self.rejected.len()
    }
}

/// Uploads pending photos for a wizard session.
pub struct PhotoUploader<S: PhotoStorageService> {
    storage: S,
}

impl<S: PhotoStorageService> PhotoUploader<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Stores every photo that has no handle yet.
    ///
    /// Stored photos get their handle recorded. Photos the storage refuses
    /// are removed from the draft and reported; the rest of the batch
    /// continues. The wizard lock is not held while storage is awaited.
    #[tracing::instrument(skip(self, wizard))]
    pub async fn upload_pending<V: ValidationAdapter>(
        &self,
        wizard: &SharedWizard<V>,
    ) -> Result<UploadReport, CheckoutError> {
        let pending: Vec<(PhotoId, PhotoFile)> = {
            let w = wizard.lock().await;
            if w.is_submitted() {
                return Err(WizardError::AlreadySubmitted.into());
            }
            w.draft()
                .pending_photos()
                .map(|p| (p.id, p.file.clone()))
                .collect()
        };

        let mut report = UploadReport::default();
        for (id, file) in pending {
            let stored = self.storage.store(&file).await;

            let mut w = wizard.lock().await;
            let recorded = match stored {
                Ok(handle) => w.record_photo_handle(id, handle).map(|()| {
                    report.stored.push(id);
                }),
                Err(error) => {
                    metrics::counter!("photos_rejected_total", "reason" => error.code())
                        .increment(1);
                    tracing::warn!(file = %file.file_name, code = error.code(), "photo rejected by storage");
                    let discarded = w.discard_photo(id).map(|_| ());
                    report.rejected.push(RejectedPhoto {
                        file_name: file.file_name,
                        error,
                    });
                    discarded
                }
            };

            match recorded {
                // Removed by the user while the upload was running.
                Ok(()) | Err(WizardError::PhotoNotFound(_)) => {}
                Err(other) => return Err(other.into()),
            }
        }

        tracing::debug!(
            stored = report.stored_count(),
            rejected = report.rejected_count(),
            "photo upload finished"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::storage::InMemoryPhotoStorage;
    use wizard::{ListingKind, ListingWizard, RuleValidator, UploadError, WizardConfig};

    fn shared_wizard() -> SharedWizard<RuleValidator> {
        crate::share(ListingWizard::new(
            ListingKind::Salon,
            RuleValidator::for_kind(ListingKind::Salon),
            WizardConfig::for_kind(ListingKind::Salon),
        ))
    }

    fn jpeg(name: &str) -> PhotoFile {
        PhotoFile::new(name, "image/jpeg", vec![0u8; 64])
    }

    #[tokio::test]
    async fn test_upload_records_handles() {
        let storage = InMemoryPhotoStorage::new();
        let uploader = PhotoUploader::new(storage.clone());
        let wizard = shared_wizard();
        wizard
            .lock()
            .await
            .attach_photos(vec![jpeg("a.jpg"), jpeg("b.jpg")])
            .unwrap();

        let report = uploader.upload_pending(&wizard).await.unwrap();

        assert_eq!(report.stored_count(), 2);
        assert_eq!(storage.stored_count(), 2);
        let w = wizard.lock().await;
        assert_eq!(w.draft().pending_photos().count(), 0);
        assert_eq!(w.draft().photos()[0].handle.as_deref(), Some("photo://0001"));
    }

    #[tokio::test]
    async fn test_refused_photo_is_dropped_and_batch_continues() {
        let storage = InMemoryPhotoStorage::new();
        storage.reject_file(
            "big.jpg",
            UploadError::TooLarge {
                size: 9_000_000,
                max: 5_242_880,
            },
        );
        let uploader = PhotoUploader::new(storage.clone());
        let wizard = shared_wizard();
        wizard
            .lock()
            .await
            .attach_photos(vec![jpeg("a.jpg"), jpeg("big.jpg"), jpeg("c.jpg")])
            .unwrap();

        let report = uploader.upload_pending(&wizard).await.unwrap();

        assert_eq!(report.stored_count(), 2);
        assert_eq!(report.rejected[0].file_name, "big.jpg");
        assert_eq!(report.rejected[0].error.code(), "too-large");
        assert_eq!(wizard.lock().await.draft().photos().len(), 2);
    }

    #[tokio::test]
    async fn test_second_pass_uploads_nothing() {
        let storage = InMemoryPhotoStorage::new();
        let uploader = PhotoUploader::new(storage.clone());
        let wizard = shared_wizard();
        wizard.lock().await.attach_photos(vec![jpeg("a.jpg")]).unwrap();

        uploader.upload_pending(&wizard).await.unwrap();
        let report = uploader.upload_pending(&wizard).await.unwrap();

        assert_eq!(report.stored_count(), 0);
        assert_eq!(storage.stored_count(), 1);
    }
}
