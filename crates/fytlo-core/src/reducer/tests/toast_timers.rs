use std::time::Duration;

use super::*;
use pretty_assertions::assert_eq;

fn show(state: &mut SessionState, message: &str, duration: Option<Duration>) -> Vec<FytloEffect> {
    run_user(
        state,
        UserAction::ShowToast {
            message: message.to_string(),
            duration,
        },
    )
}

fn scheduled(effects: &[FytloEffect]) -> (ToastId, Duration) {
    effects
        .iter()
        .find_map(|effect| match effect {
            FytloEffect::ScheduleToastHide { id, after } => Some((*id, *after)),
            _ => None,
        })
        .expect("hide scheduled")
}

#[test]
fn show_cancels_pending_hide_and_schedules_default_duration() {
    let mut state = state();
    let effects = show(&mut state, "hello", None);

    let (id, after) = scheduled(&effects);
    assert_eq!(effects[0], FytloEffect::CancelToastHide);
    assert_eq!(after, Duration::from_secs(2));
    assert_eq!(state.toast.id, id);
    assert_eq!(visible_toast(&state), Some("hello"));
}

#[test]
fn short_durations_are_clamped() {
    let mut state = state();
    let (_, after) = scheduled(&show(&mut state, "quick", Some(Duration::from_millis(50))));
    assert_eq!(after, Duration::from_millis(500));
}

#[test]
fn earlier_timer_cannot_hide_newer_toast() {
    let mut state = state();
    let (first, _) = scheduled(&show(&mut state, "x", None));
    let (second, _) = scheduled(&show(&mut state, "y", None));
    assert_ne!(first, second);

    let effects = run_runtime(&mut state, RuntimeAction::ToastExpired { id: first });
    assert!(effects.is_empty());
    assert_eq!(visible_toast(&state), Some("y"));

    run_runtime(&mut state, RuntimeAction::ToastExpired { id: second });
    assert_eq!(visible_toast(&state), None);
    assert_eq!(state.toast.message, "y");
}

#[test]
fn explicit_hide_cancels_timer() {
    let mut state = state();
    show(&mut state, "bye", None);
    let effects = run_user(&mut state, UserAction::HideToast);
    assert_eq!(effects, vec![FytloEffect::CancelToastHide, FytloEffect::RequestFrame]);
    assert!(!state.toast.is_visible);
}

#[test]
fn displayed_message_is_sanitized() {
    let mut state = state();
    show(&mut state, "  ping   me at someone@example.org\n", None);
    assert_eq!(visible_toast(&state), Some("ping me at •••"));
}

#[test]
fn blank_message_is_not_shown() {
    let mut state = state();
    let before = state.toast.clone();
    assert!(show(&mut state, "   ", None).is_empty());
    assert_eq!(state.toast, before);
}
