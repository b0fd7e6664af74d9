use super::*;
use pretty_assertions::assert_eq;

fn generated(preference: AutoSavePreference) -> (SessionState, Vec<FytloEffect>) {
    let mut state = ready_state(preference);
    let attempt = started_attempt(&run_user(&mut state, UserAction::Generate));
    let effects = wake(&mut state, attempt, false);
    (state, effects)
}

fn checked(state: &mut SessionState, save: SaveId, status: PhotoAuthorization) -> Vec<FytloEffect> {
    run_runtime(
        state,
        RuntimeAction::PhotoAuthorizationChecked {
            save,
            status,
            image: body(),
        },
    )
}

fn requested(state: &mut SessionState, save: SaveId, status: PhotoAuthorization) -> Vec<FytloEffect> {
    run_runtime(
        state,
        RuntimeAction::PhotoAuthorizationRequested {
            save,
            status,
            image: body(),
        },
    )
}

#[test]
fn enabled_preference_saves_without_prompt() {
    let (mut state, effects) = generated(AutoSavePreference::Enabled);
    let save = pending_save(&state);
    assert!(!state.show_auto_save_prompt);
    assert!(effects.contains(&FytloEffect::CheckPhotoAuthorization { save, image: body() }));

    let effects = checked(&mut state, save, PhotoAuthorization::Authorized);
    assert_eq!(effects, vec![FytloEffect::WritePhoto { save, image: body() }]);

    run_runtime(&mut state, RuntimeAction::PhotoWriteFinished { save, success: true });
    assert_eq!(visible_toast(&state), Some(messages::SAVED));
    assert!(!state.show_auto_save_prompt);
    assert_eq!(state.pending_save, None);
}

#[test]
fn disabled_preference_takes_no_action() {
    let (state, effects) = generated(AutoSavePreference::Disabled);
    assert!(!state.show_auto_save_prompt);
    assert_eq!(state.pending_save, None);
    assert_eq!(effects, vec![FytloEffect::RequestFrame]);
}

#[test]
fn unknown_preference_prompts_once_and_saves_when_enabled() {
    let (mut state, effects) = generated(AutoSavePreference::Unknown);
    assert!(state.show_auto_save_prompt);
    assert!(!effects
        .iter()
        .any(|effect| matches!(effect, FytloEffect::CheckPhotoAuthorization { .. })));

    let effects = run_user(&mut state, UserAction::AnswerAutoSavePrompt { enabled: true });

    let save = pending_save(&state);
    assert_eq!(
        effects,
        vec![
            FytloEffect::PersistAutoSavePreference(AutoSavePreference::Enabled),
            FytloEffect::RequestFrame,
            FytloEffect::CheckPhotoAuthorization { save, image: body() },
        ]
    );
    assert!(!state.show_auto_save_prompt);
    assert_eq!(state.auto_save_preference, AutoSavePreference::Enabled);
}

#[test]
fn declining_persists_and_dismisses() {
    let (mut state, _) = generated(AutoSavePreference::Unknown);

    let effects = run_user(&mut state, UserAction::AnswerAutoSavePrompt { enabled: false });

    assert_eq!(
        effects,
        vec![
            FytloEffect::PersistAutoSavePreference(AutoSavePreference::Disabled),
            FytloEffect::RequestFrame,
        ]
    );
    assert!(!state.show_auto_save_prompt);
    assert_eq!(state.auto_save_preference, AutoSavePreference::Disabled);
}

#[test]
fn enabling_without_result_only_persists() {
    let mut state = state();
    let effects = run_user(&mut state, UserAction::AnswerAutoSavePrompt { enabled: true });
    assert!(!effects
        .iter()
        .any(|effect| matches!(effect, FytloEffect::CheckPhotoAuthorization { .. })));
    assert_eq!(state.pending_save, None);
}

#[test]
fn undetermined_permission_is_requested_then_written() {
    let (mut state, _) = generated(AutoSavePreference::Enabled);
    let save = pending_save(&state);

    let effects = checked(&mut state, save, PhotoAuthorization::NotDetermined);
    assert_eq!(effects, vec![FytloEffect::RequestPhotoAuthorization { save, image: body() }]);

    let effects = requested(&mut state, save, PhotoAuthorization::Limited);
    assert_eq!(effects, vec![FytloEffect::WritePhoto { save, image: body() }]);
}

#[test]
fn refused_request_toasts_permission_failure() {
    let (mut state, _) = generated(AutoSavePreference::Enabled);
    let save = pending_save(&state);
    let effects = requested(&mut state, save, PhotoAuthorization::Denied);
    assert!(!effects
        .iter()
        .any(|effect| matches!(effect, FytloEffect::WritePhoto { .. })));
    assert_eq!(visible_toast(&state), Some(messages::SAVE_PERMISSION_NEEDED));
    assert_eq!(state.pending_save, None);
}

#[test]
fn denied_permission_is_not_requested_again() {
    let (mut state, _) = generated(AutoSavePreference::Enabled);
    let save = pending_save(&state);
    let effects = checked(&mut state, save, PhotoAuthorization::Denied);
    assert!(!effects.iter().any(|effect| matches!(
        effect,
        FytloEffect::RequestPhotoAuthorization { .. } | FytloEffect::WritePhoto { .. }
    )));
    assert_eq!(visible_toast(&state), Some(messages::SAVE_PERMISSION_NEEDED));
}

#[test]
fn write_failure_has_its_own_message() {
    let (mut state, _) = generated(AutoSavePreference::Enabled);
    let save = pending_save(&state);
    run_runtime(&mut state, RuntimeAction::PhotoWriteFinished { save, success: false });
    assert_eq!(visible_toast(&state), Some(messages::SAVE_FAILED));
    assert_ne!(messages::SAVE_FAILED, messages::SAVE_PERMISSION_NEEDED);
}

#[test]
fn leaving_for_welcome_drops_save_outcome() {
    let (mut state, _) = generated(AutoSavePreference::Enabled);
    let save = pending_save(&state);

    run_user(&mut state, UserAction::GoToWelcome);
    assert_eq!(state.pending_save, None);

    let effects = run_runtime(&mut state, RuntimeAction::PhotoWriteFinished { save, success: true });
    assert!(effects.is_empty());
    assert_eq!(visible_toast(&state), None);
}

#[test]
fn new_body_photo_stops_save_before_write() {
    let (mut state, _) = generated(AutoSavePreference::Enabled);
    let save = pending_save(&state);

    run_user(&mut state, UserAction::SetBodyImage(Some(body())));

    assert!(checked(&mut state, save, PhotoAuthorization::Authorized).is_empty());
    assert!(requested(&mut state, save, PhotoAuthorization::Authorized).is_empty());
}

#[test]
fn each_save_gets_a_fresh_id() {
    let (mut state, _) = generated(AutoSavePreference::Enabled);
    let first = pending_save(&state);
    run_runtime(&mut state, RuntimeAction::PhotoWriteFinished { save: first, success: true });

    set_garment(&mut state, GarmentSlot::Bottom, Some(garment("jeans")));
    let attempt = started_attempt(&run_user(&mut state, UserAction::Generate));
    wake(&mut state, attempt, false);
    let second = pending_save(&state);
    assert!(second > first);

    let stale = RuntimeAction::PhotoWriteFinished {
        save: first,
        success: false,
    };
    assert!(run_runtime(&mut state, stale).is_empty());
}
