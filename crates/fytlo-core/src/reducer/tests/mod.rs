use pretty_assertions::assert_eq;

pub(super) use super::reduce;
pub(super) use super::FytloEffect;
pub(super) use crate::actions::RuntimeAction;
pub(super) use crate::actions::SessionAction;
pub(super) use crate::actions::UserAction;
pub(super) use crate::config::Config;
pub(super) use crate::messages;
pub(super) use crate::state::AttemptId;
pub(super) use crate::state::AutoSavePreference;
pub(super) use crate::state::DirtySlot;
pub(super) use crate::state::GarmentSlot;
pub(super) use crate::state::ImageHandle;
pub(super) use crate::state::PhotoAuthorization;
pub(super) use crate::state::PickOutcome;
pub(super) use crate::state::PickTarget;
pub(super) use crate::state::PreviewSelection;
pub(super) use crate::state::Route;
pub(super) use crate::state::SaveId;
pub(super) use crate::state::SessionState;
pub(super) use crate::state::Toast;
pub(super) use crate::state::ToastId;

mod auto_save;
mod toast_timers;

fn state() -> SessionState {
    SessionState::new(Config::default(), AutoSavePreference::Unknown)
}

fn state_with_preference(preference: AutoSavePreference) -> SessionState {
    SessionState::new(Config::default(), preference)
}

fn body() -> ImageHandle {
    ImageHandle::new("/photos/body.jpg", 1000, 2000)
}

fn garment(name: &str) -> ImageHandle {
    ImageHandle::new(format!("/photos/{name}.png"), 600, 600)
}

fn run_user(state: &mut SessionState, action: UserAction) -> Vec<FytloEffect> {
    reduce(state, SessionAction::User(action))
}

fn run_runtime(state: &mut SessionState, action: RuntimeAction) -> Vec<FytloEffect> {
    reduce(state, SessionAction::Runtime(action))
}

fn set_garment(state: &mut SessionState, slot: GarmentSlot, image: Option<ImageHandle>) -> Vec<FytloEffect> {
    run_user(state, UserAction::SetGarment { slot, image })
}

/// Body photo in place and the top slot claimed.
fn ready_state(preference: AutoSavePreference) -> SessionState {
    let mut state = state_with_preference(preference);
    run_user(&mut state, UserAction::SetBodyImage(Some(body())));
    run_user(&mut state, UserAction::ContinueFromBodyUpload);
    set_garment(&mut state, GarmentSlot::Top, Some(garment("top")));
    state
}

fn started_attempt(effects: &[FytloEffect]) -> AttemptId {
    effects
        .iter()
        .find_map(|effect| match effect {
            FytloEffect::StartGeneration { attempt } => Some(*attempt),
            _ => None,
        })
        .expect("generation started")
}

fn wake(state: &mut SessionState, attempt: AttemptId, cancelled: bool) -> Vec<FytloEffect> {
    run_runtime(state, RuntimeAction::GenerationWoke { attempt, cancelled })
}

fn pending_save(state: &SessionState) -> SaveId {
    state.pending_save.expect("save in progress")
}

fn visible_toast(state: &SessionState) -> Option<&str> {
    state.toast.is_visible.then_some(state.toast.message.as_str())
}

#[derive(Debug, Clone, PartialEq)]
struct Snapshot {
    route: Route,
    body: Option<ImageHandle>,
    top: Option<ImageHandle>,
    bottom: Option<ImageHandle>,
    result: Option<ImageHandle>,
    dirty: DirtySlot,
    preview: PreviewSelection,
    is_generating: bool,
    toast: Toast,
    preference: AutoSavePreference,
    prompt: bool,
    current: Option<AttemptId>,
}

fn snapshot(state: &SessionState) -> Snapshot {
    Snapshot {
        route: state.route,
        body: state.body_image.clone(),
        top: state.top_image.clone(),
        bottom: state.bottom_image.clone(),
        result: state.result_image.clone(),
        dirty: state.dirty_slot,
        preview: state.selected_preview,
        is_generating: state.is_generating,
        toast: state.toast.clone(),
        preference: state.auto_save_preference,
        prompt: state.show_auto_save_prompt,
        current: state.generation.current,
    }
}

fn assert_generation_invariant(state: &SessionState) {
    if state.is_generating {
        assert_eq!(state.route, Route::Generating);
        assert!(state.generation.current.is_some());
    }
}
