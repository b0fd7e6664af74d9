use std::path::Path;

use fytlo_core::messages;
use fytlo_core::state::ImageHandle;
use fytlo_core::state::PickOutcome;
use fytlo_core::state::PickSource;

use crate::contracts::ImagePicker;

/// Picks images from the filesystem. There is no camera on this platform.
#[derive(Debug, Default, Clone, Copy)]
pub struct FilePicker;

impl ImagePicker for FilePicker {
    fn pick(&self, source: PickSource, selection: Option<&Path>) -> PickOutcome {
        match source {
            PickSource::Camera => PickOutcome::Failed(messages::CAMERA_UNAVAILABLE.to_string()),
            PickSource::Library => match selection {
                None => PickOutcome::Cancelled,
                Some(path) if path.as_os_str().is_empty() => PickOutcome::Cancelled,
                Some(path) => read_image(path),
            },
        }
    }
}

fn read_image(path: &Path) -> PickOutcome {
    match image::image_dimensions(path) {
        Ok((width, height)) => {
            tracing::debug!(width, height, "image picked");
            PickOutcome::Picked(ImageHandle::new(path, width, height))
        }
        Err(err) => {
            tracing::warn!(error = %err, "picked file is not a readable image");
            PickOutcome::Failed(messages::PHOTO_UNREADABLE.to_string())
        }
    }
}
