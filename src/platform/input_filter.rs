//=========================================================================
// Input Filter
//
// Classifies raw winit input for the surface controller.
//
// The renderer receives exactly one kind of input from this layer: a
// discrete trigger on a press-down gesture. Everything else is either
// swallowed (volume keys, so a worn headset's buttons cannot nudge the
// host volume) or passed through to default handling.
//
//=========================================================================

//=== External Dependencies ===============================================

use winit::event::{ElementState, MouseButton, TouchPhase};
use winit::keyboard::{KeyCode, PhysicalKey};

//=== FilterVerdict =======================================================

/// What the surface controller should do with an input event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FilterVerdict {
    /// Press-down gesture: pulse haptics and forward one trigger.
    Trigger,

    /// Consumed here; must not reach default handling.
    Swallowed,

    /// Not ours; leave to default handling.
    Pass,
}

//=== InputFilter =========================================================

// Stateless classifier; only down-phases matter, so no per-pointer
// tracking is needed.
pub(crate) struct InputFilter;

impl InputFilter {
    pub(crate) fn new() -> Self {
        Self
    }

    /// Keyboard: volume-adjust keys are swallowed, the rest passes.
    pub(crate) fn assess_key(&self, key: PhysicalKey) -> FilterVerdict {
        match key {
            PhysicalKey::Code(KeyCode::AudioVolumeUp | KeyCode::AudioVolumeDown) => {
                FilterVerdict::Swallowed
            }
            _ => FilterVerdict::Pass,
        }
    }

    /// Pointer buttons: a left press is the trigger gesture; releases
    /// and other buttons pass.
    pub(crate) fn assess_pointer(&self, button: MouseButton, state: ElementState) -> FilterVerdict {
        match (button, state) {
            (MouseButton::Left, ElementState::Pressed) => FilterVerdict::Trigger,
            _ => FilterVerdict::Pass,
        }
    }

    /// Touch: only the start phase triggers; moves, ends, and
    /// cancellations pass.
    pub(crate) fn assess_touch(&self, phase: TouchPhase) -> FilterVerdict {
        match phase {
            TouchPhase::Started => FilterVerdict::Trigger,
            _ => FilterVerdict::Pass,
        }
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn volume_keys_are_swallowed() {
        let filter = InputFilter::new();
        assert_eq!(
            filter.assess_key(PhysicalKey::Code(KeyCode::AudioVolumeUp)),
            FilterVerdict::Swallowed
        );
        assert_eq!(
            filter.assess_key(PhysicalKey::Code(KeyCode::AudioVolumeDown)),
            FilterVerdict::Swallowed
        );
    }

    #[test]
    fn ordinary_keys_pass() {
        let filter = InputFilter::new();
        assert_eq!(
            filter.assess_key(PhysicalKey::Code(KeyCode::Space)),
            FilterVerdict::Pass
        );
        assert_eq!(
            filter.assess_key(PhysicalKey::Code(KeyCode::Escape)),
            FilterVerdict::Pass
        );
    }

    #[test]
    fn left_press_is_the_trigger_gesture() {
        let filter = InputFilter::new();
        assert_eq!(
            filter.assess_pointer(MouseButton::Left, ElementState::Pressed),
            FilterVerdict::Trigger
        );
    }

    #[test]
    fn releases_and_other_buttons_pass() {
        let filter = InputFilter::new();
        assert_eq!(
            filter.assess_pointer(MouseButton::Left, ElementState::Released),
            FilterVerdict::Pass,
            "Only the down phase may trigger"
        );
        assert_eq!(
            filter.assess_pointer(MouseButton::Right, ElementState::Pressed),
            FilterVerdict::Pass
        );
    }

    #[test]
    fn touch_start_triggers_once_per_gesture() {
        let filter = InputFilter::new();
        assert_eq!(filter.assess_touch(TouchPhase::Started), FilterVerdict::Trigger);
        assert_eq!(filter.assess_touch(TouchPhase::Moved), FilterVerdict::Pass);
        assert_eq!(filter.assess_touch(TouchPhase::Ended), FilterVerdict::Pass);
        assert_eq!(filter.assess_touch(TouchPhase::Cancelled), FilterVerdict::Pass);
    }
}
