//=========================================================================
// Renderer Lifecycle
//
// Explicit state machine for the renderer's host-visible lifecycle.
//
// States:
//   Uninitialized → Running ⇄ Paused
//        └──────────────┴───────┴──→ Destroyed
//
// The render loop advances the machine as surface events arrive and the
// shell advances it one final time before invoking destroy. Every bridge
// call after `create` is therefore guarded by a validated transition,
// which is what keeps the teardown ordering honest: a machine that has
// reached `Destroyed` can never accept another event.
//
//=========================================================================

//=== LifecycleState ======================================================

/// Host-visible renderer states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleState {
    /// Renderer exists but the display is not initialized yet.
    Uninitialized,

    /// Display initialized, frames may be drawn.
    Running,

    /// Backgrounded; the renderer is quiesced and no frames are drawn.
    Paused,

    /// Torn down; no further transitions are accepted.
    Destroyed,
}

//=== LifecycleEvent ======================================================

/// Transitions requested against the lifecycle machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleEvent {
    /// The surface is ready and display resources were established.
    DisplayInitialized,

    /// The host lost foreground.
    Pause,

    /// The host regained foreground.
    Resume,

    /// Final teardown.
    Destroy,
}

//=== InvalidTransition ===================================================

/// A lifecycle event that is not legal in the current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidTransition {
    /// State the machine was in when the event arrived.
    pub from: LifecycleState,
    /// The rejected event.
    pub event: LifecycleEvent,
}

impl std::fmt::Display for InvalidTransition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Lifecycle event {:?} is invalid in state {:?}", self.event, self.from)
    }
}

impl std::error::Error for InvalidTransition {}

//=== Lifecycle ===========================================================

/// Validated lifecycle state machine, starting at `Uninitialized`.
#[derive(Debug, Clone)]
pub struct Lifecycle {
    state: LifecycleState,
}

impl Lifecycle {
    pub fn new() -> Self {
        Self {
            state: LifecycleState::Uninitialized,
        }
    }

    /// Current state of the machine.
    pub fn state(&self) -> LifecycleState {
        self.state
    }

    /// Returns true if `event` would be accepted in the current state.
    pub fn accepts(&self, event: LifecycleEvent) -> bool {
        Self::next(self.state, event).is_some()
    }

    //--- advance() --------------------------------------------------------
    //
    // Applies an event, moving to the next state or rejecting the event
    // without changing state. Destroy is accepted from every live state
    // so teardown can happen even before the display ever initialized.
    //
    pub fn advance(&mut self, event: LifecycleEvent) -> Result<LifecycleState, InvalidTransition> {
        match Self::next(self.state, event) {
            Some(next) => {
                self.state = next;
                Ok(next)
            }
            None => Err(InvalidTransition {
                from: self.state,
                event,
            }),
        }
    }

    fn next(state: LifecycleState, event: LifecycleEvent) -> Option<LifecycleState> {
        use LifecycleEvent::*;
        use LifecycleState::*;

        match (state, event) {
            (Uninitialized, DisplayInitialized) => Some(Running),
            (Running, Pause) => Some(Paused),
            (Paused, Resume) => Some(Running),
            (Uninitialized | Running | Paused, Destroy) => Some(Destroyed),
            _ => None,
        }
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use LifecycleEvent::*;
    use LifecycleState::*;

    //=====================================================================
    // Happy Path
    //=====================================================================

    #[test]
    fn full_session_sequence() {
        let mut lc = Lifecycle::new();
        assert_eq!(lc.state(), Uninitialized);

        assert_eq!(lc.advance(DisplayInitialized).unwrap(), Running);
        assert_eq!(lc.advance(Pause).unwrap(), Paused);
        assert_eq!(lc.advance(Resume).unwrap(), Running);
        assert_eq!(lc.advance(Destroy).unwrap(), Destroyed);
    }

    #[test]
    fn destroy_is_legal_from_every_live_state() {
        for setup in [&[][..], &[DisplayInitialized][..], &[DisplayInitialized, Pause][..]] {
            let mut lc = Lifecycle::new();
            for &event in setup {
                lc.advance(event).unwrap();
            }
            assert_eq!(
                lc.advance(Destroy).unwrap(),
                Destroyed,
                "Destroy must be accepted after setup {:?}",
                setup
            );
        }
    }

    //=====================================================================
    // Rejected Transitions
    //=====================================================================

    #[test]
    fn pause_before_initialization_is_rejected() {
        let mut lc = Lifecycle::new();
        let err = lc.advance(Pause).unwrap_err();
        assert_eq!(err.from, Uninitialized);
        assert_eq!(err.event, Pause);
        assert_eq!(lc.state(), Uninitialized, "Rejected events must not change state");
    }

    #[test]
    fn double_initialization_is_rejected() {
        let mut lc = Lifecycle::new();
        lc.advance(DisplayInitialized).unwrap();
        assert!(lc.advance(DisplayInitialized).is_err());
        assert_eq!(lc.state(), Running);
    }

    #[test]
    fn resume_while_running_is_rejected() {
        let mut lc = Lifecycle::new();
        lc.advance(DisplayInitialized).unwrap();
        assert!(lc.advance(Resume).is_err());
    }

    #[test]
    fn destroyed_accepts_nothing() {
        let mut lc = Lifecycle::new();
        lc.advance(Destroy).unwrap();

        for event in [DisplayInitialized, Pause, Resume, Destroy] {
            assert!(
                lc.advance(event).is_err(),
                "Destroyed must reject {:?}",
                event
            );
            assert_eq!(lc.state(), Destroyed);
        }
    }

    //=====================================================================
    // Queries
    //=====================================================================

    #[test]
    fn accepts_mirrors_advance() {
        let lc = Lifecycle::new();
        assert!(lc.accepts(DisplayInitialized));
        assert!(lc.accepts(Destroy));
        assert!(!lc.accepts(Pause));
        assert!(!lc.accepts(Resume));
    }

    #[test]
    fn invalid_transition_is_error_trait() {
        fn assert_error<T: std::error::Error>() {}
        assert_error::<InvalidTransition>();
    }
}
