//! Photo attachments and their constraints.

use common::PhotoId;
use serde::{Deserialize, Serialize};

use crate::error::UploadError;

const MIB: usize = 1024 * 1024;

/// A file picked by the user, not yet stored anywhere.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoFile {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl PhotoFile {
    pub fn new(
        file_name: impl Into<String>,
        mime_type: impl Into<String>,
        bytes: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            mime_type: mime_type.into(),
            bytes: bytes.into(),
        }
    }

    /// Size in bytes.
    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

/// A photo accepted into the draft.
///
/// `handle` is set once the storage service has confirmed the upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Photo {
    pub id: PhotoId,
    pub file: PhotoFile,
    pub handle: Option<String>,
}

impl Photo {
    pub fn new(file: PhotoFile) -> Self {
        Self {
            id: PhotoId::new(),
            file,
            handle: None,
        }
    }

    /// Returns true if the photo has not been stored yet.
    pub fn is_pending(&self) -> bool {
        self.handle.is_none()
    }
}

/// Limits applied when photos are attached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhotoPolicy {
    pub max_photos: usize,
    pub max_bytes: usize,
    pub allowed_mime_types: Vec<String>,
}

impl PhotoPolicy {
    /// Limits for job postings.
    pub fn job() -> Self {
        Self {
            max_photos: 5,
            ..Self::default()
        }
    }

    /// Limits for salon listings.
    pub fn salon() -> Self {
        Self {
            max_photos: 10,
            ..Self::default()
        }
    }

    /// Checks per-file constraints (type, then size). The count limit is
    /// applied by the caller, which knows how many slots are left.
    pub fn check(&self, file: &PhotoFile) -> Result<(), UploadError> {
        if !self
            .allowed_mime_types
            .iter()
            .any(|m| m.eq_ignore_ascii_case(&file.mime_type))
        {
            return Err(UploadError::BadType(file.mime_type.clone()));
        }
        if file.size() > self.max_bytes {
            return Err(UploadError::TooLarge {
                size: file.size(),
                max: self.max_bytes,
            });
        }
        Ok(())
    }
}

impl Default for PhotoPolicy {
    fn default() -> Self {
        Self {
            max_photos: 10,
            max_bytes: 5 * MIB,
            allowed_mime_types: vec![
                "image/jpeg".to_string(),
                "image/png".to_string(),
                "image/webp".to_string(),
            ],
        }
    }
}

/// A file that was not accepted, and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedPhoto {
    pub file_name: String,
    pub error: UploadError,
}

/// Outcome of attaching a batch of photos.
///
/// Partial acceptance is normal: one bad file never aborts the batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttachReport {
    pub accepted: Vec<PhotoId>,
    pub rejected: Vec<RejectedPhoto>,
}

impl AttachReport {
    pub fn accepted_count(&self) -> usize {
        self.accepted.len()
    }

    pub fn rejected_count(&self) -> usize {
        self.rejected.len()
    }

    pub(crate) fn reject(&mut self, file_name: String, error: UploadError) {
        self.rejected.push(RejectedPhoto { file_name, error });
    }
}
