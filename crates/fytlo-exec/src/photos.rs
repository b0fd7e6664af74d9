use std::path::Path;
use std::path::PathBuf;
use std::sync::Mutex;

use async_trait::async_trait;

use fytlo_core::state::ImageHandle;
use fytlo_core::state::PhotoAuthorization;

use crate::contracts::PhotoLibrary;
use crate::contracts::PhotoLibraryError;

/// Photo library backed by a plain directory. Authorization is simulated:
/// it starts in the configured state and a request resolves an undetermined
/// state to granted or denied.
#[derive(Debug)]
pub struct DirectoryPhotoLibrary {
    dir: PathBuf,
    status: Mutex<PhotoAuthorization>,
    request_grants: bool,
}

impl DirectoryPhotoLibrary {
    pub fn new(dir: impl Into<PathBuf>, status: PhotoAuthorization, request_grants: bool) -> Self {
        Self {
            dir: dir.into(),
            status: Mutex::new(status),
            request_grants,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn current(&self) -> PhotoAuthorization {
        *self.status.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl PhotoLibrary for DirectoryPhotoLibrary {
    async fn authorization_status(&self) -> PhotoAuthorization {
        self.current()
    }

    async fn request_authorization(&self) -> PhotoAuthorization {
        let mut status = self.status.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if *status == PhotoAuthorization::NotDetermined {
            *status = if self.request_grants {
                PhotoAuthorization::Authorized
            } else {
                PhotoAuthorization::Denied
            };
            tracing::info!(status = ?*status, "photo library authorization resolved");
        }
        *status
    }

    async fn write(&self, image: &ImageHandle) -> Result<PathBuf, PhotoLibraryError> {
        if !self.current().allows_write() {
            return Err(PhotoLibraryError::NotAuthorized);
        }
        tokio::fs::create_dir_all(&self.dir).await?;
        let target = self.dir.join(target_name(image.origin()));
        tokio::fs::copy(image.origin(), &target).await?;
        Ok(target)
    }
}

fn target_name(origin: &Path) -> String {
    let stamp = chrono::Local::now().format("%Y%m%d-%H%M%S%3f");
    match origin.extension().and_then(|ext| ext.to_str()) {
        Some(ext) => format!("fytlo-{stamp}.{ext}"),
        None => format!("fytlo-{stamp}"),
    }
}
