use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

use serde::Deserialize;
use serde::Serialize;

use super::config::BodyCheckConfig;
use super::config::Config;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Welcome,
    BodyUpload,
    OutfitBuilder,
    Generating,
}

impl Route {
    pub fn label(self) -> &'static str {
        match self {
            Self::Welcome => "Fytlo",
            Self::BodyUpload => "Full-body photo",
            Self::OutfitBuilder => "Outfit",
            Self::Generating => "Generating",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GarmentSlot {
    Top,
    Bottom,
}

impl GarmentSlot {
    pub fn other(self) -> Self {
        match self {
            Self::Top => Self::Bottom,
            Self::Bottom => Self::Top,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Top => "top",
            Self::Bottom => "bottom",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirtySlot {
    None,
    Top,
    Bottom,
}

impl DirtySlot {
    pub fn slot(self) -> Option<GarmentSlot> {
        match self {
            Self::None => None,
            Self::Top => Some(GarmentSlot::Top),
            Self::Bottom => Some(GarmentSlot::Bottom),
        }
    }
}

impl From<GarmentSlot> for DirtySlot {
    fn from(slot: GarmentSlot) -> Self {
        match slot {
            GarmentSlot::Top => Self::Top,
            GarmentSlot::Bottom => Self::Bottom,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewSelection {
    Before,
    After,
}

impl PreviewSelection {
    pub fn toggled(self) -> Self {
        match self {
            Self::Before => Self::After,
            Self::After => Self::Before,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Before => "Before",
            Self::After => "After",
        }
    }
}

/// User choice for saving results to the photo library. The integer codes
/// are the persisted representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutoSavePreference {
    Unknown,
    Enabled,
    Disabled,
}

impl AutoSavePreference {
    pub fn code(self) -> i64 {
        match self {
            Self::Unknown => 0,
            Self::Enabled => 1,
            Self::Disabled => 2,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::Unknown),
            1 => Some(Self::Enabled),
            2 => Some(Self::Disabled),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Unknown => "not asked",
            Self::Enabled => "on",
            Self::Disabled => "off",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhotoAuthorization {
    Authorized,
    Limited,
    NotDetermined,
    Denied,
}

impl PhotoAuthorization {
    pub fn allows_write(self) -> bool {
        matches!(self, Self::Authorized | Self::Limited)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickSource {
    Camera,
    Library,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PickOutcome {
    Picked(ImageHandle),
    Cancelled,
    Failed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickTarget {
    Body,
    Garment(GarmentSlot),
}

#[derive(Debug, PartialEq, Eq)]
struct ImageInner {
    origin: PathBuf,
    width: u32,
    height: u32,
}

/// Opaque handle to a picked or generated image. Clones share the same
/// underlying record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageHandle(Arc<ImageInner>);

impl ImageHandle {
    pub fn new(origin: impl Into<PathBuf>, width: u32, height: u32) -> Self {
        Self(Arc::new(ImageInner {
            origin: origin.into(),
            width,
            height,
        }))
    }

    pub fn origin(&self) -> &Path {
        &self.0.origin
    }

    pub fn width(&self) -> u32 {
        self.0.width
    }

    pub fn height(&self) -> u32 {
        self.0.height
    }

    pub fn display_name(&self) -> String {
        self.0
            .origin
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.0.origin.display().to_string())
    }
}

/// Placeholder heuristic until a body-detection model exists: tall enough
/// and portrait enough.
pub fn passes_full_body_check(image: &ImageHandle, rules: &BodyCheckConfig) -> bool {
    let height = f64::from(image.height());
    if height < f64::from(rules.min_height) {
        return false;
    }
    let aspect = height / f64::from(image.width().max(1));
    aspect >= rules.min_aspect
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AttemptId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ToastId(pub u64);

/// Identifies one auto-save of a result, from the authorization check to the
/// write outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SaveId(pub u64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub id: ToastId,
    pub message: String,
    pub is_visible: bool,
}

impl Default for Toast {
    fn default() -> Self {
        Self {
            id: ToastId(0),
            message: String::new(),
            is_visible: false,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct GenerationTracker {
    pub current: Option<AttemptId>,
    pub next_attempt: u64,
}

impl GenerationTracker {
    pub fn mint(&mut self) -> AttemptId {
        self.next_attempt += 1;
        AttemptId(self.next_attempt)
    }

    pub fn is_current(&self, attempt: AttemptId) -> bool {
        self.current == Some(attempt)
    }
}

#[derive(Debug, Clone)]
pub struct SessionState {
    pub route: Route,
    pub body_image: Option<ImageHandle>,
    pub top_image: Option<ImageHandle>,
    pub bottom_image: Option<ImageHandle>,
    pub result_image: Option<ImageHandle>,
    pub dirty_slot: DirtySlot,
    pub selected_preview: PreviewSelection,
    pub is_generating: bool,
    pub toast: Toast,
    pub auto_save_preference: AutoSavePreference,
    pub show_auto_save_prompt: bool,
    pub generation: GenerationTracker,
    pub next_toast_id: u64,
    pub pending_save: Option<SaveId>,
    pub next_save_id: u64,
    pub config: Config,
}

impl SessionState {
    pub fn new(config: Config, auto_save_preference: AutoSavePreference) -> Self {
        Self {
            route: Route::Welcome,
            body_image: None,
            top_image: None,
            bottom_image: None,
            result_image: None,
            dirty_slot: DirtySlot::None,
            selected_preview: PreviewSelection::Before,
            is_generating: false,
            toast: Toast::default(),
            auto_save_preference,
            show_auto_save_prompt: false,
            generation: GenerationTracker::default(),
            next_toast_id: 0,
            pending_save: None,
            next_save_id: 0,
            config,
        }
    }

    pub fn garment(&self, slot: GarmentSlot) -> Option<&ImageHandle> {
        match slot {
            GarmentSlot::Top => self.top_image.as_ref(),
            GarmentSlot::Bottom => self.bottom_image.as_ref(),
        }
    }

    pub fn garment_mut(&mut self, slot: GarmentSlot) -> &mut Option<ImageHandle> {
        match slot {
            GarmentSlot::Top => &mut self.top_image,
            GarmentSlot::Bottom => &mut self.bottom_image,
        }
    }

    /// A slot is locked when the other one has already been changed this
    /// generation cycle.
    pub fn is_slot_locked(&self, slot: GarmentSlot) -> bool {
        self.dirty_slot == DirtySlot::from(slot.other())
    }

    pub fn can_continue_from_body_upload(&self) -> bool {
        self.body_image
            .as_ref()
            .is_some_and(|image| passes_full_body_check(image, &self.config.body_check))
    }

    pub fn can_generate(&self) -> bool {
        if self.is_generating || self.body_image.is_none() {
            return false;
        }
        match self.dirty_slot.slot() {
            Some(slot) => self.garment(slot).is_some(),
            None => false,
        }
    }

    pub fn preview_image(&self) -> Option<&ImageHandle> {
        match self.selected_preview {
            PreviewSelection::Before => self.body_image.as_ref(),
            PreviewSelection::After => self.result_image.as_ref(),
        }
    }
}
