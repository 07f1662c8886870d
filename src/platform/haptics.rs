//=========================================================================
// Haptics
//=========================================================================
//
// Feedback seam for the trigger gesture. Hosts with a real actuator
// implement `Haptics`; everyone else gets the silent default, which only
// leaves a trace in the log.
//
//=========================================================================

//=== Standard Library Imports ============================================

use std::time::Duration;

//=== External Crates =====================================================

use log::trace;

//=== Haptics =============================================================

/// Press-down feedback delivered alongside a trigger event.
pub trait Haptics: Send {
    /// Requests one feedback pulse of the given duration.
    fn pulse(&self, duration: Duration);
}

//=== SilentHaptics =======================================================

/// Default implementation for hosts without an actuator.
#[derive(Debug, Default)]
pub struct SilentHaptics;

impl Haptics for SilentHaptics {
    fn pulse(&self, duration: Duration) {
        trace!(target: "platform", "Haptic pulse requested ({:?})", duration);
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn silent_haptics_is_usable_as_trait_object() {
        let haptics: Box<dyn Haptics> = Box::new(SilentHaptics);
        haptics.pulse(Duration::from_millis(50));
    }
}
