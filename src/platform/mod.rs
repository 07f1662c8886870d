//=========================================================================
// Platform Subsystem
//
// Owns the presentation surface and relays its lifecycle to the render
// thread via MPSC.
//
// Architecture:
// ```text
//  Main Thread:                      Render Thread:
//  ┌──────────────────────────┐     ┌───────────────────┐
//  │  Winit Event Loop        │     │  RenderLoop       │
//  │   ↓                      │     │   ↓               │
//  │  InputFilter             │     │  Lifecycle        │
//  │   ├─ trigger detection   │     │   ↓               │
//  │   └─ volume-key swallow  │     │  RendererBridge   │
//  │   ↓                      │     └───────────────────┘
//  │  SurfaceEvent ───────────┼──────────────┘
//  └──────────────────────────┘     MPSC Channel
// ```
//
// Key Design Decisions:
// - **Immersive presentation**: borderless fullscreen with a hidden
//   cursor, re-asserted whenever the window regains focus. The
//   reassertion is idempotent; no state is tracked.
// - **Surface configuration is fixed at creation**: the window takes the
//   platform's default color depth and requests no depth or stencil
//   planes, since the renderer manages its own targets behind the bridge.
// - **Graceful channel disconnect**: if the render thread dies, the
//   platform logs a warning but keeps running so the user can still
//   close the window.
// - **Main thread requirement**: Winit mandates the main thread on
//   macOS/iOS, so this runs on the thread that called `Shell::run()`.
//
// Responsibilities:
// - Create and manage the OS window (lazily, in `resumed`)
// - Map suspend/resume/close transitions to surface events
// - Classify input, pulse haptics, and forward trigger gestures
// - Forward refresh events when pacing is display-coupled
//
//=========================================================================

//=== Submodules ==========================================================

pub mod haptics;
mod input_filter;

//=== Standard Library Imports ============================================

use std::time::Duration;

//=== External Crates =====================================================

use crossbeam_channel::Sender;
use log::{debug, error, info, trace, warn};
use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, EventLoop},
    window::{Fullscreen, Window, WindowAttributes},
};

//=== Internal Imports ====================================================

use haptics::Haptics;
use input_filter::{FilterVerdict, InputFilter};

// Feedback pulse length for the trigger gesture.
const TRIGGER_PULSE: Duration = Duration::from_millis(50);

//=== SurfaceEvent ========================================================

/// Events sent from the surface controller to the render thread.
///
/// These are the only messages that cross the thread boundary; the render
/// loop turns them into bridge calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SurfaceEvent {
    /// The presentation surface exists; display init may proceed.
    Ready,

    /// One display refresh elapsed. Sent only under coupled pacing.
    Redraw,

    /// The host lost foreground.
    Paused,

    /// The host regained foreground.
    Resumed,

    /// One press-down gesture.
    Trigger,

    /// The surface is going away; the render loop must exit.
    Shutdown,
}

//=== PlatformError =======================================================

/// Platform initialization and runtime errors.
///
/// Typically fatal: without an event loop there is nothing to present to.
#[derive(Debug)]
pub(crate) enum PlatformError {
    /// Event loop creation failed (OS-level issue).
    LoopCreation(winit::error::EventLoopError),

    /// Event loop execution error.
    LoopExecution(winit::error::EventLoopError),
}

impl std::fmt::Display for PlatformError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LoopCreation(e) => write!(f, "Event loop creation failed: {}", e),
            Self::LoopExecution(e) => write!(f, "Event loop error: {}", e),
        }
    }
}

impl std::error::Error for PlatformError {}

//=== SurfaceController ===================================================

/// Window owner and lifecycle relay.
///
/// Not Send/Sync; lives on the main thread for its whole life. All
/// communication with the render thread goes through the MPSC sender.
pub(crate) struct SurfaceController {
    /// OS window handle (None until `resumed` is called).
    window: Option<Window>,

    /// Channel to the render thread.
    events: Sender<SurfaceEvent>,

    /// Input classifier for trigger detection and key swallowing.
    filter: InputFilter,

    /// Feedback actuator for the trigger gesture.
    haptics: Box<dyn Haptics>,

    /// Whether refresh events are forwarded (coupled pacing only).
    forward_redraws: bool,

    /// Window title.
    title: String,

    /// Set once the surface has been announced to the render thread.
    announced_ready: bool,
}

impl SurfaceController {
    //--- Construction -----------------------------------------------------

    /// Creates a controller. The window itself is created lazily in
    /// `resumed`, which is also where `Ready` is announced.
    pub(crate) fn new(
        events: Sender<SurfaceEvent>,
        title: String,
        forward_redraws: bool,
        haptics: Box<dyn Haptics>,
    ) -> Self {
        info!(target: "platform", "Surface controller initialized");
        Self {
            window: None,
            events,
            filter: InputFilter::new(),
            haptics,
            forward_redraws,
            title,
            announced_ready: false,
        }
    }

    //--- Execution --------------------------------------------------------

    /// Runs the event loop until the window closes.
    ///
    /// Blocks for the life of the surface. Returns an error only if the
    /// loop cannot be created or fails while executing.
    ///
    /// # Panics
    ///
    /// Panics if called off the main thread (macOS/iOS Winit requirement).
    pub(crate) fn run(mut self) -> Result<(), PlatformError> {
        debug!(target: "platform", "Starting event loop");

        let event_loop = EventLoop::new().map_err(PlatformError::LoopCreation)?;
        event_loop
            .run_app(&mut self)
            .map_err(PlatformError::LoopExecution)
    }

    //--- Internal Helpers -------------------------------------------------

    // Sends an event to the render thread; a disconnected channel is
    // logged, not fatal, so the window can still be closed by hand.
    fn announce(&self, event: SurfaceEvent) {
        if self.events.send(event).is_err() {
            warn!(target: "platform", "Render thread gone, dropping {:?}", event);
        }
    }

    // Re-applies the immersive presentation state. Safe to call at any
    // time; winit treats redundant settings as no-ops.
    fn assert_immersive(&self) {
        if let Some(window) = &self.window {
            window.set_fullscreen(Some(Fullscreen::Borderless(None)));
            window.set_cursor_visible(false);
        }
    }

    #[cfg(test)]
    pub(crate) fn has_window(&self) -> bool {
        self.window.is_some()
    }
}

//=== Winit Integration ===================================================

impl ApplicationHandler for SurfaceController {
    /// Called when the app becomes active (startup or mobile resume).
    ///
    /// Creates the window on first activation and announces `Ready`;
    /// later activations map to `Resumed`.
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            debug!(target: "platform", "Surface resumed");
            self.announce(SurfaceEvent::Resumed);
            return;
        }

        let attrs = WindowAttributes::default()
            .with_title(self.title.clone())
            .with_fullscreen(Some(Fullscreen::Borderless(None)));

        match event_loop.create_window(attrs) {
            Ok(window) => {
                info!(
                    target: "platform",
                    "Surface created: {}x{}",
                    window.inner_size().width,
                    window.inner_size().height
                );
                window.set_cursor_visible(false);
                window.request_redraw();
                self.window = Some(window);

                if !self.announced_ready {
                    self.announced_ready = true;
                    self.announce(SurfaceEvent::Ready);
                }
            }
            Err(e) => {
                error!(target: "platform", "Surface creation failed: {}", e);
                self.announce(SurfaceEvent::Shutdown);
                event_loop.exit();
            }
        }
    }

    /// Called when the app loses foreground. The renderer is told first,
    /// before the surface itself idles.
    fn suspended(&mut self, _event_loop: &ActiveEventLoop) {
        debug!(target: "platform", "Surface suspended");
        self.announce(SurfaceEvent::Paused);
    }

    /// Handles per-window events.
    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        match &event {
            WindowEvent::CloseRequested => {
                info!(target: "platform", "Surface close requested");
                self.announce(SurfaceEvent::Shutdown);
                event_loop.exit();
            }

            WindowEvent::Focused(true) => {
                // System chrome may have come back while unfocused.
                self.assert_immersive();
            }

            WindowEvent::KeyboardInput { event: key_event, .. } => {
                if self.filter.assess_key(key_event.physical_key) == FilterVerdict::Swallowed {
                    trace!(target: "platform", "Volume key swallowed");
                }
            }

            WindowEvent::MouseInput { state, button, .. } => {
                if self.filter.assess_pointer(*button, *state) == FilterVerdict::Trigger {
                    self.haptics.pulse(TRIGGER_PULSE);
                    self.announce(SurfaceEvent::Trigger);
                }
            }

            WindowEvent::Touch(touch) => {
                if self.filter.assess_touch(touch.phase) == FilterVerdict::Trigger {
                    self.haptics.pulse(TRIGGER_PULSE);
                    self.announce(SurfaceEvent::Trigger);
                }
            }

            WindowEvent::RedrawRequested => {
                if self.forward_redraws {
                    self.announce(SurfaceEvent::Redraw);
                }
                // Keep the refresh stream alive either way.
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }

            _ => {
                // Ignore: Resized, Moved, etc. carry nothing for the renderer.
            }
        }
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::haptics::SilentHaptics;
    use crossbeam_channel::unbounded;

    fn controller(events: Sender<SurfaceEvent>) -> SurfaceController {
        SurfaceController::new(events, "test".to_string(), true, Box::new(SilentHaptics))
    }

    #[test]
    fn window_is_created_lazily() {
        let (tx, _rx) = unbounded();
        let ctl = controller(tx);
        assert!(!ctl.has_window(), "Window must not exist before resumed()");
    }

    #[test]
    fn announce_reaches_the_render_thread() {
        let (tx, rx) = unbounded();
        let ctl = controller(tx);

        ctl.announce(SurfaceEvent::Trigger);
        assert_eq!(rx.try_recv(), Ok(SurfaceEvent::Trigger));
    }

    #[test]
    fn announce_survives_a_disconnected_channel() {
        let (tx, rx) = unbounded();
        let ctl = controller(tx);
        drop(rx);

        // Must log and carry on, not panic.
        ctl.announce(SurfaceEvent::Shutdown);
    }

    #[test]
    fn immersive_reassertion_without_window_is_a_noop() {
        let (tx, _rx) = unbounded();
        let ctl = controller(tx);
        ctl.assert_immersive();
    }
}
