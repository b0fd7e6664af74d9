use std::time::Duration;

use super::actions::RuntimeAction;
use super::actions::SessionAction;
use super::actions::UserAction;
use super::messages;
use super::slots::can_modify;
use super::slots::record_selection;
use super::state::passes_full_body_check;
use super::state::AttemptId;
use super::state::AutoSavePreference;
use super::state::DirtySlot;
use super::state::GarmentSlot;
use super::state::ImageHandle;
use super::state::PhotoAuthorization;
use super::state::PickOutcome;
use super::state::PickTarget;
use super::state::PreviewSelection;
use super::state::Route;
use super::state::SaveId;
use super::state::SessionState;
use super::state::ToastId;
use super::toast;

/// Side effects the runtime performs on behalf of the reducer. Outcomes come
/// back as [`RuntimeAction`]s.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FytloEffect {
    RequestFrame,
    StartGeneration { attempt: AttemptId },
    CancelGeneration { attempt: AttemptId },
    ScheduleToastHide { id: ToastId, after: Duration },
    CancelToastHide,
    PersistAutoSavePreference(AutoSavePreference),
    CheckPhotoAuthorization { save: SaveId, image: ImageHandle },
    RequestPhotoAuthorization { save: SaveId, image: ImageHandle },
    WritePhoto { save: SaveId, image: ImageHandle },
}

pub fn reduce(state: &mut SessionState, action: SessionAction) -> Vec<FytloEffect> {
    match action {
        SessionAction::User(user) => reduce_user(state, user),
        SessionAction::Runtime(runtime) => reduce_runtime(state, runtime),
    }
}

fn reduce_user(state: &mut SessionState, action: UserAction) -> Vec<FytloEffect> {
    match action {
        UserAction::GoToWelcome => {
            let mut effects = cancel_generation_and_reset(state, Route::Welcome);
            reset_session_images(state);
            state.selected_preview = PreviewSelection::Before;
            effects.push(FytloEffect::RequestFrame);
            effects
        }
        UserAction::GoToBodyUpload => {
            let mut effects = cancel_generation_and_reset(state, Route::BodyUpload);
            state.selected_preview = PreviewSelection::Before;
            effects.push(FytloEffect::RequestFrame);
            effects
        }
        UserAction::GoToOutfitBuilder => go_to_outfit_builder(state),
        UserAction::ContinueFromBodyUpload => {
            if !state.can_continue_from_body_upload() {
                return toast::show(state, messages::ADD_FULL_BODY_PHOTO, None);
            }
            go_to_outfit_builder(state)
        }
        UserAction::SetBodyImage(image) => {
            let mut effects = set_body_image(state, image);
            effects.push(FytloEffect::RequestFrame);
            effects
        }
        UserAction::SetGarment { slot, image } => set_garment(state, slot, image),
        UserAction::PickerFinished { target, outcome } => match outcome {
            PickOutcome::Cancelled => Vec::new(),
            PickOutcome::Failed(reason) => toast::show(state, &reason, None),
            PickOutcome::Picked(image) => match target {
                PickTarget::Body => accept_body_photo(state, image),
                PickTarget::Garment(slot) => set_garment(state, slot, Some(image)),
            },
        },
        UserAction::SetPreview(selection) => {
            state.selected_preview = selection;
            vec![FytloEffect::RequestFrame]
        }
        UserAction::TogglePreview => {
            state.selected_preview = state.selected_preview.toggled();
            vec![FytloEffect::RequestFrame]
        }
        UserAction::Generate => start_generation(state),
        UserAction::CancelGeneration => match state.generation.current {
            Some(attempt) => {
                tracing::debug!(attempt = attempt.0, "generation cancel requested");
                vec![FytloEffect::CancelGeneration { attempt }]
            }
            None => Vec::new(),
        },
        UserAction::AnswerAutoSavePrompt { enabled } => {
            let preference = if enabled {
                AutoSavePreference::Enabled
            } else {
                AutoSavePreference::Disabled
            };
            state.auto_save_preference = preference;
            state.show_auto_save_prompt = false;
            let mut effects = vec![
                FytloEffect::PersistAutoSavePreference(preference),
                FytloEffect::RequestFrame,
            ];
            if enabled {
                effects.extend(begin_save(state));
            }
            effects
        }
        UserAction::ShowToast { message, duration } => toast::show(state, &message, duration),
        UserAction::HideToast => toast::hide(state),
    }
}

fn reduce_runtime(state: &mut SessionState, action: RuntimeAction) -> Vec<FytloEffect> {
    match action {
        RuntimeAction::GenerationWoke { attempt, cancelled } => {
            finish_generation(state, attempt, cancelled)
        }
        RuntimeAction::ToastExpired { id } => toast::expire(state, id),
        RuntimeAction::PhotoAuthorizationChecked {
            save,
            status,
            image,
        } => {
            if !is_pending_save(state, save) {
                return Vec::new();
            }
            match status {
                status if status.allows_write() => vec![FytloEffect::WritePhoto { save, image }],
                PhotoAuthorization::NotDetermined => {
                    vec![FytloEffect::RequestPhotoAuthorization { save, image }]
                }
                _ => finish_save(state, messages::SAVE_PERMISSION_NEEDED),
            }
        }
        RuntimeAction::PhotoAuthorizationRequested {
            save,
            status,
            image,
        } => {
            if !is_pending_save(state, save) {
                return Vec::new();
            }
            if status.allows_write() {
                vec![FytloEffect::WritePhoto { save, image }]
            } else {
                finish_save(state, messages::SAVE_PERMISSION_NEEDED)
            }
        }
        RuntimeAction::PhotoWriteFinished { save, success } => {
            if !is_pending_save(state, save) {
                return Vec::new();
            }
            let message = if success {
                messages::SAVED
            } else {
                messages::SAVE_FAILED
            };
            finish_save(state, message)
        }
    }
}

fn go_to_outfit_builder(state: &mut SessionState) -> Vec<FytloEffect> {
    // Navigation never cancels a running attempt; the generating screen
    // stays until the attempt resolves.
    if state.is_generating {
        tracing::debug!("outfit builder navigation ignored while generating");
        return Vec::new();
    }
    state.route = Route::OutfitBuilder;
    vec![FytloEffect::RequestFrame]
}

fn cancel_generation_and_reset(state: &mut SessionState, next: Route) -> Vec<FytloEffect> {
    let effects = match state.generation.current.take() {
        Some(attempt) => {
            tracing::debug!(attempt = attempt.0, "generation cancelled by navigation");
            vec![FytloEffect::CancelGeneration { attempt }]
        }
        None => Vec::new(),
    };
    state.is_generating = false;
    state.route = next;
    effects
}

fn reset_session_images(state: &mut SessionState) {
    state.body_image = None;
    state.top_image = None;
    state.bottom_image = None;
    state.result_image = None;
    state.dirty_slot = DirtySlot::None;
    state.show_auto_save_prompt = false;
    abandon_save(state);
}

fn set_body_image(state: &mut SessionState, image: Option<ImageHandle>) -> Vec<FytloEffect> {
    let effects = cancel_generation_and_reset(state, Route::BodyUpload);
    state.body_image = image;
    state.result_image = None;
    state.selected_preview = PreviewSelection::Before;
    state.dirty_slot = DirtySlot::None;
    state.show_auto_save_prompt = false;
    abandon_save(state);
    effects
}

fn accept_body_photo(state: &mut SessionState, image: ImageHandle) -> Vec<FytloEffect> {
    if passes_full_body_check(&image, &state.config.body_check) {
        let mut effects = set_body_image(state, Some(image));
        effects.push(FytloEffect::RequestFrame);
        return effects;
    }
    tracing::debug!(
        width = image.width(),
        height = image.height(),
        "body photo rejected by full-body check"
    );
    let mut effects = set_body_image(state, None);
    effects.extend(toast::show(state, messages::NOT_FULL_BODY, None));
    effects
}

fn set_garment(
    state: &mut SessionState,
    slot: GarmentSlot,
    image: Option<ImageHandle>,
) -> Vec<FytloEffect> {
    if !can_modify(state, slot) {
        return toast::show(state, messages::ONE_GARMENT_PER_GENERATION, None);
    }
    record_selection(state, slot, image);
    vec![FytloEffect::RequestFrame]
}

fn start_generation(state: &mut SessionState) -> Vec<FytloEffect> {
    if state.is_generating {
        return Vec::new();
    }
    if state.body_image.is_none() {
        return toast::show(state, messages::ADD_FULL_BODY_PHOTO, None);
    }
    if !state.can_generate() {
        return toast::show(state, messages::ADD_GARMENT, None);
    }

    let mut effects = Vec::new();
    if let Some(previous) = state.generation.current.take() {
        effects.push(FytloEffect::CancelGeneration { attempt: previous });
    }
    let attempt = state.generation.mint();
    state.generation.current = Some(attempt);
    state.is_generating = true;
    state.route = Route::Generating;
    tracing::info!(attempt = attempt.0, "generation started");

    effects.push(FytloEffect::StartGeneration { attempt });
    effects.push(FytloEffect::RequestFrame);
    effects
}

fn finish_generation(
    state: &mut SessionState,
    attempt: AttemptId,
    cancelled: bool,
) -> Vec<FytloEffect> {
    if cancelled {
        if !state.generation.is_current(attempt) {
            tracing::debug!(attempt = attempt.0, "superseded cancelled attempt ignored");
            return Vec::new();
        }
        cancel_generation_and_reset(state, Route::OutfitBuilder);
        tracing::info!(attempt = attempt.0, "generation cancelled");
        return vec![FytloEffect::RequestFrame];
    }
    if !state.generation.is_current(attempt) {
        tracing::debug!(attempt = attempt.0, "stale generation result discarded");
        return Vec::new();
    }

    // Passthrough until a real compositor exists.
    state.result_image = state.body_image.clone();
    state.dirty_slot = DirtySlot::None;
    state.selected_preview = PreviewSelection::After;
    state.is_generating = false;
    state.route = Route::OutfitBuilder;
    tracing::info!(attempt = attempt.0, "generation completed");

    let mut effects = vec![FytloEffect::RequestFrame];
    effects.extend(auto_save_after_generation(state));
    state.generation.current = None;
    effects
}

fn auto_save_after_generation(state: &mut SessionState) -> Vec<FytloEffect> {
    if state.result_image.is_none() {
        return Vec::new();
    }
    match state.auto_save_preference {
        AutoSavePreference::Unknown => {
            state.show_auto_save_prompt = true;
            Vec::new()
        }
        AutoSavePreference::Enabled => begin_save(state),
        AutoSavePreference::Disabled => Vec::new(),
    }
}

fn begin_save(state: &mut SessionState) -> Vec<FytloEffect> {
    let Some(image) = state.result_image.clone() else {
        return Vec::new();
    };
    state.next_save_id += 1;
    let save = SaveId(state.next_save_id);
    state.pending_save = Some(save);
    tracing::debug!(save = save.0, "auto-save started");
    vec![FytloEffect::CheckPhotoAuthorization { save, image }]
}

fn is_pending_save(state: &SessionState, save: SaveId) -> bool {
    if state.pending_save == Some(save) {
        return true;
    }
    tracing::debug!(save = save.0, "stale save outcome discarded");
    false
}

fn finish_save(state: &mut SessionState, message: &str) -> Vec<FytloEffect> {
    state.pending_save = None;
    toast::show(state, message, None)
}

// The result the save belongs to is gone. A write already underway still
// completes, but its outcome is no longer reported.
fn abandon_save(state: &mut SessionState) {
    if let Some(save) = state.pending_save.take() {
        tracing::debug!(save = save.0, "auto-save abandoned");
    }
}

#[cfg(test)]
mod tests;
