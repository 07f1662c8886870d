//=========================================================================
// Render Loop
//
// Drives the renderer bridge from a dedicated render thread, consuming
// surface events relayed by the platform layer.
//
// Responsibilities:
// - Call initialize_display exactly once, before the first draw
// - Draw once per pacing tick (decoupled) or per forwarded refresh
//   (coupled), but only while the lifecycle machine is Running
// - Forward pause/resume/trigger to the bridge in arrival order
// - Exit on shutdown or channel disconnect so the shell can join the
//   thread before invoking destroy
//
// Notes:
// The render loop runs independently from the platform layer and owns
// every bridge call between create and destroy. Communication with the
// platform occurs only through message passing, which is the mechanism
// that keeps bridge calls from ever racing each other: pause, resume,
// and trigger arrive on the same thread that draws.
//
//=========================================================================

//=== Submodules ==========================================================

pub mod bridge;
pub mod lifecycle;
pub mod resources;
pub mod services;
pub mod sound;

//=== Standard Library Imports ============================================

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

//=== External Crates =====================================================

use crossbeam_channel::{Receiver, RecvTimeoutError};
use log::{debug, error, info, trace, warn};

//=== Internal Imports ====================================================

use crate::core::bridge::{BridgeError, FrameReport, RendererBridge, RendererHandle};
use crate::core::lifecycle::{Lifecycle, LifecycleEvent, LifecycleState};
use crate::platform::SurfaceEvent;

//=== FramePacing =========================================================

/// How the render thread decides when to draw.
///
/// `Decoupled` is the reprojection analog at this layer: the render rate
/// is detached from display refresh and held to a fixed timestep, which
/// also bounds the thread's duty cycle for thermally sustainable long
/// sessions. `Coupled` is the fallback: one draw per forwarded display
/// refresh.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FramePacing {
    /// Draw once per forwarded display refresh event.
    Coupled,

    /// Draw on a fixed timestep, ignoring display refresh events.
    Decoupled {
        /// Target frames per second. Must be positive.
        fps: f64,
    },
}

//=== TickControl =========================================================
//
// Control flow for the render loop. Every event application and draw
// signals either to continue or to leave the loop.
//
enum TickControl {
    Continue,
    Exit,
}

//=== RenderOutcome =======================================================

/// Final state of the render thread, returned through its join handle.
///
/// The shell inspects `failure` before deciding whether to destroy the
/// renderer: a bridge failure terminates the session abruptly with no
/// further bridge calls.
pub(crate) struct RenderOutcome {
    /// Lifecycle machine as the loop left it.
    pub(crate) lifecycle: Lifecycle,

    /// First bridge failure, if any. Fatal; the loop stopped on it.
    pub(crate) failure: Option<BridgeError>,

    /// Number of frames drawn.
    pub(crate) frames: u64,

    /// Report from the most recent draw, plumbed through for forward
    /// compatibility. Currently unused by the shell.
    pub(crate) last_report: Option<FrameReport>,
}

//=== LoopState ===========================================================
//
// Mutable loop bookkeeping, separated from the loop's configuration so
// event application can borrow both independently.
//
struct LoopState {
    lifecycle: Lifecycle,
    failure: Option<BridgeError>,
    frames: u64,
    last_report: Option<FrameReport>,
}

impl LoopState {
    fn new() -> Self {
        Self {
            lifecycle: Lifecycle::new(),
            failure: None,
            frames: 0,
            last_report: None,
        }
    }

    fn into_outcome(self) -> RenderOutcome {
        RenderOutcome {
            lifecycle: self.lifecycle,
            failure: self.failure,
            frames: self.frames,
            last_report: self.last_report,
        }
    }
}

//=== RenderLoop ==========================================================

/// Render-thread driver for one renderer instance.
pub(crate) struct RenderLoop {
    bridge: Arc<dyn RendererBridge>,
    handle: RendererHandle,
    pacing: FramePacing,
}

impl RenderLoop {
    //--- Construction -----------------------------------------------------

    pub(crate) fn new(
        bridge: Arc<dyn RendererBridge>,
        handle: RendererHandle,
        pacing: FramePacing,
    ) -> Self {
        Self {
            bridge,
            handle,
            pacing,
        }
    }

    //--- spawn() ----------------------------------------------------------
    //
    // Moves the loop onto its own thread. The returned handle yields the
    // outcome once the loop exits; joining it is how the shell guarantees
    // no draw call is in flight when destroy runs.
    //
    pub(crate) fn spawn(self, receiver: Receiver<SurfaceEvent>) -> thread::JoinHandle<RenderOutcome> {
        thread::spawn(move || self.run(receiver))
    }

    fn run(self, receiver: Receiver<SurfaceEvent>) -> RenderOutcome {
        debug!(target: "render", "Render loop started ({:?})", self.pacing);

        let mut state = LoopState::new();
        match self.pacing {
            FramePacing::Coupled => self.run_coupled(&receiver, &mut state),
            FramePacing::Decoupled { fps } => self.run_decoupled(&receiver, fps, &mut state),
        }

        info!(
            target: "render",
            "Render loop exited ({} frames, state {:?})",
            state.frames,
            state.lifecycle.state()
        );
        state.into_outcome()
    }

    //--- Coupled Mode -----------------------------------------------------
    //
    // Blocks on the event channel; drawing happens when the platform
    // forwards a refresh. Channel disconnect counts as shutdown.
    //
    fn run_coupled(&self, receiver: &Receiver<SurfaceEvent>, state: &mut LoopState) {
        while let Ok(event) = receiver.recv() {
            if let TickControl::Exit = self.apply(event, state) {
                return;
            }
        }
        debug!(target: "render", "Surface channel disconnected");
    }

    //--- Decoupled Mode ---------------------------------------------------
    //
    // Fixed timestep: wait up to one frame for events, drain the rest,
    // draw, then sleep off the remainder of the frame budget.
    //
    fn run_decoupled(&self, receiver: &Receiver<SurfaceEvent>, fps: f64, state: &mut LoopState) {
        let frame_duration = Duration::from_secs_f64(1.0 / fps);

        loop {
            let frame_start = Instant::now();

            //--- Step 1: Gather surface events ----------------------------
            match receiver.recv_timeout(frame_duration) {
                Ok(event) => {
                    if let TickControl::Exit = self.apply(event, state) {
                        return;
                    }
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    debug!(target: "render", "Surface channel disconnected");
                    return;
                }
            }
            while let Ok(event) = receiver.try_recv() {
                if let TickControl::Exit = self.apply(event, state) {
                    return;
                }
            }

            //--- Step 2: Draw ---------------------------------------------
            if let TickControl::Exit = self.draw(state) {
                return;
            }

            //--- Step 3: Sustain fixed pacing -----------------------------
            let elapsed = frame_start.elapsed();
            if elapsed < frame_duration {
                thread::sleep(frame_duration - elapsed);
            }
        }
    }

    //--- Event Application ------------------------------------------------

    fn apply(&self, event: SurfaceEvent, state: &mut LoopState) -> TickControl {
        match event {
            SurfaceEvent::Ready => self.on_ready(state),

            SurfaceEvent::Redraw => match self.pacing {
                FramePacing::Coupled => self.draw(state),
                FramePacing::Decoupled { .. } => {
                    trace!(target: "render", "Refresh event ignored in decoupled mode");
                    TickControl::Continue
                }
            },

            SurfaceEvent::Paused => self.on_pause(state),
            SurfaceEvent::Resumed => self.on_resume(state),
            SurfaceEvent::Trigger => self.on_trigger(state),

            SurfaceEvent::Shutdown => {
                debug!(target: "render", "Shutdown requested");
                TickControl::Exit
            }
        }
    }

    fn on_ready(&self, state: &mut LoopState) -> TickControl {
        if state.lifecycle.advance(LifecycleEvent::DisplayInitialized).is_err() {
            warn!(target: "render", "Surface announced ready twice, ignoring");
            return TickControl::Continue;
        }

        debug!(target: "render", "Initializing display");
        match self.bridge.initialize_display(self.handle) {
            Ok(()) => TickControl::Continue,
            Err(e) => self.fatal(e, state),
        }
    }

    fn on_pause(&self, state: &mut LoopState) -> TickControl {
        if !state.lifecycle.accepts(LifecycleEvent::Pause) {
            debug!(target: "render", "Pause before display init, nothing to quiesce");
            return TickControl::Continue;
        }

        // Renderer quiesces first, then the loop stops drawing.
        match self.bridge.pause(self.handle) {
            Ok(()) => {
                let _ = state.lifecycle.advance(LifecycleEvent::Pause);
                TickControl::Continue
            }
            Err(e) => self.fatal(e, state),
        }
    }

    fn on_resume(&self, state: &mut LoopState) -> TickControl {
        if !state.lifecycle.accepts(LifecycleEvent::Resume) {
            debug!(target: "render", "Resume without matching pause, ignoring");
            return TickControl::Continue;
        }

        match self.bridge.resume(self.handle) {
            Ok(()) => {
                let _ = state.lifecycle.advance(LifecycleEvent::Resume);
                TickControl::Continue
            }
            Err(e) => self.fatal(e, state),
        }
    }

    fn on_trigger(&self, state: &mut LoopState) -> TickControl {
        if state.lifecycle.state() != LifecycleState::Running {
            debug!(target: "render", "Trigger outside running state, ignoring");
            return TickControl::Continue;
        }

        match self.bridge.trigger_event(self.handle) {
            Ok(()) => TickControl::Continue,
            Err(e) => self.fatal(e, state),
        }
    }

    //--- Drawing ----------------------------------------------------------

    fn draw(&self, state: &mut LoopState) -> TickControl {
        if state.lifecycle.state() != LifecycleState::Running {
            trace!(target: "render", "Skipping draw in state {:?}", state.lifecycle.state());
            return TickControl::Continue;
        }

        match self.bridge.draw_frame(self.handle) {
            Ok(report) => {
                state.frames += 1;
                state.last_report = Some(report);
                TickControl::Continue
            }
            Err(e) => self.fatal(e, state),
        }
    }

    fn fatal(&self, error: BridgeError, state: &mut LoopState) -> TickControl {
        error!(target: "render", "Fatal bridge failure: {}", error);
        state.failure = Some(error);
        TickControl::Exit
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
