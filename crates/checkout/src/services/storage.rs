//! Photo storage trait and in-memory implementation.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use wizard::{PhotoFile, UploadError};

/// Trait for persisting photo files.
#[async_trait]
pub trait PhotoStorageService: Send + Sync {
    /// Stores a file and returns its handle or URL.
    async fn store(&self, file: &PhotoFile) -> Result<String, UploadError>;
}

#[derive(Debug, Default)]
struct InMemoryStorageState {
    stored: HashMap<String, PhotoFile>,
    rejections: HashMap<String, UploadError>,
    next_id: u32,
}

/// In-memory photo storage for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPhotoStorage {
    state: Arc<RwLock<InMemoryStorageState>>,
}

impl InMemoryPhotoStorage {
    /// Creates a new in-memory photo storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes storage refuse the named file with `error`.
    pub fn reject_file(&self, file_name: impl Into<String>, error: UploadError) {
        self.state
            .write()
            .unwrap()
            .rejections
            .insert(file_name.into(), error);
    }

    /// Returns the number of stored files.
    pub fn stored_count(&self) -> usize {
        self.state.read().unwrap().stored.len()
    }

    pub fn has_handle(&self, handle: &str) -> bool {
        self.state.read().unwrap().stored.contains_key(handle)
    }
}

#[async_trait]
impl PhotoStorageService for InMemoryPhotoStorage {
    async fn store(&self, file: &PhotoFile) -> Result<String, UploadError> {
        let mut state = self.state.write().unwrap();

        if let Some(error) = state.rejections.get(&file.file_name) {
            return Err(error.clone());
        }

        state.next_id += 1;
        let handle = format!("photo://{:04}", state.next_id);
        state.stored.insert(handle.clone(), file.clone());
        Ok(handle)
    }
}
