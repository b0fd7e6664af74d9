use std::path::Path;
use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;

use fytlo_core::state::ImageHandle;
use fytlo_core::state::PhotoAuthorization;
use fytlo_core::state::PickOutcome;
use fytlo_core::state::PickSource;

#[derive(Debug, Error)]
pub enum PhotoLibraryError {
    #[error("photo library access not authorized")]
    NotAuthorized,
    #[error("photo library io: {0}")]
    Io(#[from] std::io::Error),
}

/// Destination for saved results. Calls may suspend; the runtime runs them
/// off the session thread and reports back through the action channel.
#[async_trait]
pub trait PhotoLibrary: Send + Sync {
    async fn authorization_status(&self) -> PhotoAuthorization;

    async fn request_authorization(&self) -> PhotoAuthorization;

    /// Returns where the image was stored.
    async fn write(&self, image: &ImageHandle) -> Result<PathBuf, PhotoLibraryError>;
}

pub trait ImagePicker {
    /// `selection` is the item the user chose in the source, if any. No
    /// selection means the user backed out.
    fn pick(&self, source: PickSource, selection: Option<&Path>) -> PickOutcome;
}
