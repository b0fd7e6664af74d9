use super::state::DirtySlot;
use super::state::GarmentSlot;
use super::state::ImageHandle;
use super::state::SessionState;

/// Only the slot touched first in a generation cycle may change until the
/// cycle ends.
pub fn can_modify(state: &SessionState, slot: GarmentSlot) -> bool {
    match state.dirty_slot.slot() {
        None => true,
        Some(dirty) => dirty == slot,
    }
}

/// Callers check [`can_modify`] first. Clearing a slot still marks it dirty.
pub fn record_selection(state: &mut SessionState, slot: GarmentSlot, image: Option<ImageHandle>) {
    *state.garment_mut(slot) = image;
    if state.dirty_slot == DirtySlot::None {
        state.dirty_slot = DirtySlot::from(slot);
    }
}
