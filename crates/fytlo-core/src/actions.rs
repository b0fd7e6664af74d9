use std::time::Duration;

use super::state::AttemptId;
use super::state::GarmentSlot;
use super::state::ImageHandle;
use super::state::PhotoAuthorization;
use super::state::PickOutcome;
use super::state::PickTarget;
use super::state::PreviewSelection;
use super::state::SaveId;
use super::state::ToastId;

#[derive(Debug, Clone)]
pub enum SessionAction {
    User(UserAction),
    Runtime(RuntimeAction),
}

impl From<UserAction> for SessionAction {
    fn from(action: UserAction) -> Self {
        Self::User(action)
    }
}

impl From<RuntimeAction> for SessionAction {
    fn from(action: RuntimeAction) -> Self {
        Self::Runtime(action)
    }
}

/// Intents raised by the presentation layer.
#[derive(Debug, Clone)]
pub enum UserAction {
    GoToWelcome,
    GoToBodyUpload,
    GoToOutfitBuilder,
    ContinueFromBodyUpload,
    SetBodyImage(Option<ImageHandle>),
    SetGarment {
        slot: GarmentSlot,
        image: Option<ImageHandle>,
    },
    PickerFinished {
        target: PickTarget,
        outcome: PickOutcome,
    },
    SetPreview(PreviewSelection),
    TogglePreview,
    Generate,
    CancelGeneration,
    AnswerAutoSavePrompt {
        enabled: bool,
    },
    ShowToast {
        message: String,
        duration: Option<Duration>,
    },
    HideToast,
}

/// Outcomes reported back by the effect runtime.
#[derive(Debug, Clone)]
pub enum RuntimeAction {
    GenerationWoke {
        attempt: AttemptId,
        cancelled: bool,
    },
    ToastExpired {
        id: ToastId,
    },
    PhotoAuthorizationChecked {
        save: SaveId,
        status: PhotoAuthorization,
        image: ImageHandle,
    },
    PhotoAuthorizationRequested {
        save: SaveId,
        status: PhotoAuthorization,
        image: ImageHandle,
    },
    PhotoWriteFinished {
        save: SaveId,
        success: bool,
    },
}
