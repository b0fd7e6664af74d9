//! Single-slot transient notifications.
//!
//! Every toast gets a fresh [`ToastId`]. The hide timer scheduled for a toast
//! carries that id back, and the hide is applied only while the id is still
//! current, so an older timer can never hide a newer toast.

use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;

use super::reducer::FytloEffect;
use super::state::SessionState;
use super::state::Toast;
use super::state::ToastId;

pub const MAX_TOAST_CHARS: usize = 160;
pub const MIN_TOAST_DURATION: Duration = Duration::from_millis(500);
pub const REDACTION: &str = "•••";

static WHITESPACE: OnceLock<Regex> = OnceLock::new();
static EMAIL: OnceLock<Regex> = OnceLock::new();
static URL: OnceLock<Regex> = OnceLock::new();
static OPAQUE_TOKEN: OnceLock<Regex> = OnceLock::new();

fn pattern(cell: &'static OnceLock<Regex>, source: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(source).expect("static toast pattern"))
}

/// Cleans text before it reaches the screen or accessibility output.
pub fn sanitize_message(raw: &str) -> String {
    let collapsed = pattern(&WHITESPACE, r"\s+").replace_all(raw.trim(), " ");
    let value = pattern(&EMAIL, r"[A-Z0-9a-z._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}")
        .replace_all(&collapsed, REDACTION);
    let value = pattern(
        &URL,
        r"(?:https?://|\bwww\.)\S+|\b[A-Za-z0-9-]+(?:\.[A-Za-z0-9-]+)*\.[A-Za-z]{2,}/\S*",
    )
    .replace_all(&value, REDACTION);
    let value = pattern(&OPAQUE_TOKEN, r"[A-Za-z0-9_-]{24,}").replace_all(&value, REDACTION);
    let capped: String = value.chars().take(MAX_TOAST_CHARS).collect();
    capped.trim_end().to_string()
}

pub(crate) fn show(
    state: &mut SessionState,
    message: &str,
    duration: Option<Duration>,
) -> Vec<FytloEffect> {
    let message = sanitize_message(message);
    if message.is_empty() {
        return Vec::new();
    }
    let duration = duration
        .unwrap_or_else(|| state.config.toast.default_duration())
        .max(MIN_TOAST_DURATION);

    state.next_toast_id += 1;
    let id = ToastId(state.next_toast_id);
    state.toast = Toast {
        id,
        message,
        is_visible: true,
    };
    tracing::debug!(toast = id.0, "toast shown");
    vec![
        FytloEffect::CancelToastHide,
        FytloEffect::ScheduleToastHide { id, after: duration },
        FytloEffect::RequestFrame,
    ]
}

pub(crate) fn hide(state: &mut SessionState) -> Vec<FytloEffect> {
    state.toast.is_visible = false;
    vec![FytloEffect::CancelToastHide, FytloEffect::RequestFrame]
}

pub(crate) fn expire(state: &mut SessionState, id: ToastId) -> Vec<FytloEffect> {
    if state.toast.id != id {
        tracing::debug!(toast = id.0, current = state.toast.id.0, "stale toast timer ignored");
        return Vec::new();
    }
    state.toast.is_visible = false;
    vec![FytloEffect::RequestFrame]
}
