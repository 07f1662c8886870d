//=========================================================================
// Renderer Bridge
//=========================================================================
//
// The single seam between host lifecycle events and the renderer.
//
// The shell never sees inside the renderer: it holds an opaque
// `RendererHandle` and drives the renderer exclusively through the seven
// operations of the `RendererBridge` trait. Host capabilities (texture
// loading, audio playback) flow the other way, injected once at `create`
// as a `HostServices` value.
//
// Call ordering contract (enforced by the shell, relied on by
// implementations):
//   create → initialize_display → draw_frame* → destroy
// with pause/resume/trigger_event interleaved between initialization and
// destruction. `initialize_display` and `draw_frame` arrive on the render
// thread; `create` and `destroy` on the thread running the shell.
//
//=========================================================================

//=== Standard Library Imports ============================================

use std::num::NonZeroU64;

//=== Internal Dependencies ===============================================

use crate::core::services::HostServices;

//=== RendererHandle ======================================================

/// Opaque identifier for one live renderer instance.
///
/// Integer-sized, created once by [`RendererBridge::create`], passed by
/// value to every subsequent bridge call, and invalid after
/// [`RendererBridge::destroy`] returns. The shell owns the handle; bridge
/// implementations map it back to whatever state they allocated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RendererHandle(NonZeroU64);

impl RendererHandle {
    /// Wraps a raw non-zero value. Zero is reserved as "no renderer" and
    /// is rejected.
    pub fn from_raw(raw: u64) -> Option<Self> {
        NonZeroU64::new(raw).map(Self)
    }

    /// Returns the raw integer value of the handle.
    pub fn as_raw(self) -> u64 {
        self.0.get()
    }
}

//=== FrameReport =========================================================

/// Per-frame result returned by [`RendererBridge::draw_frame`].
///
/// The render loop plumbs the report through but does not act on it;
/// the field set is reserved for frame timing and scheduling flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameReport {
    /// Implementation-defined frame flags. Unused by the caller.
    pub flags: u64,
}

//=== BridgeError =========================================================

/// Failures raised by renderer bridge operations.
///
/// There is no partial-failure recovery at this layer: any variant is
/// fatal to the session. The render loop stops on the first error and the
/// shell reports it without issuing further bridge calls.
#[derive(Debug)]
pub enum BridgeError {
    /// Renderer allocation failed; no handle was produced.
    Creation(String),

    /// An operation on a live renderer failed.
    Call {
        /// Name of the failing bridge operation.
        operation: &'static str,
        /// Implementation-provided failure detail.
        detail: String,
    },
}

impl std::fmt::Display for BridgeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Creation(detail) => write!(f, "Renderer creation failed: {}", detail),
            Self::Call { operation, detail } => {
                write!(f, "Renderer call '{}' failed: {}", operation, detail)
            }
        }
    }
}

impl std::error::Error for BridgeError {}

//=== RendererBridge ======================================================

/// The renderer contract: seven operations, one opaque handle.
///
/// Implementations are shared across the main and render threads, so the
/// trait requires `Send + Sync`; per-renderer state belongs behind the
/// handle, not behind `&mut self`.
pub trait RendererBridge: Send + Sync {
    /// Allocates a renderer and hands it the host capability object.
    ///
    /// Must succeed before any other bridge call is made. The returned
    /// handle names this renderer instance for the rest of the session.
    fn create(&self, services: HostServices) -> Result<RendererHandle, BridgeError>;

    /// Establishes display resources for the renderer.
    ///
    /// Invoked exactly once, on the render thread, after the presentation
    /// surface exists and before the first [`Self::draw_frame`].
    fn initialize_display(&self, handle: RendererHandle) -> Result<(), BridgeError>;

    /// Produces one frame. Invoked on the render thread, once per pacing
    /// tick. The caller stores the report but enforces no contract on it.
    fn draw_frame(&self, handle: RendererHandle) -> Result<FrameReport, BridgeError>;

    /// Signals one discrete user action (a press-down gesture).
    fn trigger_event(&self, handle: RendererHandle) -> Result<(), BridgeError>;

    /// Suspends renderer-internal timers and audio. Forwarded before the
    /// surface itself pauses, so the renderer quiesces first.
    fn pause(&self, handle: RendererHandle) -> Result<(), BridgeError>;

    /// Resumes a previously paused renderer.
    fn resume(&self, handle: RendererHandle) -> Result<(), BridgeError>;

    /// Releases all renderer-owned resources. The handle is invalid once
    /// this returns; the shell guarantees no draw call is in flight.
    fn destroy(&self, handle: RendererHandle) -> Result<(), BridgeError>;
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    //=====================================================================
    // RendererHandle Tests
    //=====================================================================

    #[test]
    fn handle_rejects_zero() {
        assert!(
            RendererHandle::from_raw(0).is_none(),
            "Zero is reserved and must not produce a handle"
        );
    }

    #[test]
    fn handle_roundtrips_raw_value() {
        let handle = RendererHandle::from_raw(42).unwrap();
        assert_eq!(handle.as_raw(), 42);
    }

    #[test]
    fn handles_compare_by_value() {
        let a = RendererHandle::from_raw(7).unwrap();
        let b = RendererHandle::from_raw(7).unwrap();
        let c = RendererHandle::from_raw(8).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn handles_are_hashable() {
        let mut set = HashSet::new();
        set.insert(RendererHandle::from_raw(1).unwrap());
        set.insert(RendererHandle::from_raw(1).unwrap());
        set.insert(RendererHandle::from_raw(2).unwrap());
        assert_eq!(set.len(), 2, "Equal handles must collapse in a set");
    }

    //=====================================================================
    // FrameReport Tests
    //=====================================================================

    #[test]
    fn frame_report_defaults_to_no_flags() {
        assert_eq!(FrameReport::default().flags, 0);
    }

    //=====================================================================
    // BridgeError Tests
    //=====================================================================

    #[test]
    fn bridge_error_is_error_trait() {
        fn assert_error<T: std::error::Error>() {}
        assert_error::<BridgeError>();
    }

    #[test]
    fn bridge_error_display_names_operation() {
        let err = BridgeError::Call {
            operation: "draw_frame",
            detail: "context lost".to_string(),
        };
        let text = format!("{}", err);
        assert!(text.contains("draw_frame"));
        assert!(text.contains("context lost"));
    }
}
