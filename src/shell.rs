//=========================================================================
// Spheres Shell
//
// Main entry point and coordinator for a renderer session.
//
// Architecture:
// ```text
//     ShellBuilder  ──build()──>  Shell  ──run(bridge)──>  [Session]
//         │                        │
//         ├─ with_pacing()         ├─ constructs backends + services
//         ├─ with_title()          ├─ bridge.create() → handle
//         └─ with_haptics()        ├─ spawns render thread
//                                  ├─ runs surface event loop (blocks)
//                                  └─ joins, then bridge.destroy()
// ```
//
// The ordering in `run` is the teardown guarantee: the surface event
// loop exits and the render thread is joined before destroy is invoked,
// so no draw call can race renderer teardown.
//
//=========================================================================

//=== Standard Library Imports ============================================

use std::path::PathBuf;
use std::sync::Arc;

//=== External Crates =====================================================

use crossbeam_channel::bounded;
use log::{error, info};

//=== Internal Imports ====================================================

use crate::core::bridge::{BridgeError, RendererBridge};
use crate::core::lifecycle::{InvalidTransition, LifecycleEvent};
use crate::core::resources::ResourceBackend;
use crate::core::services::HostServices;
use crate::core::sound::SoundBackend;
use crate::core::{FramePacing, RenderLoop};
use crate::platform::haptics::{Haptics, SilentHaptics};
use crate::platform::SurfaceController;

//=== ShellError ==========================================================

/// Failures that end a session abnormally.
#[derive(Debug)]
pub enum ShellError {
    /// A bridge call failed. Fatal; no retry or partial teardown.
    Bridge(BridgeError),

    /// The lifecycle machine rejected a transition the shell required.
    Lifecycle(InvalidTransition),

    /// The render thread panicked instead of returning an outcome.
    RenderThreadPanicked,
}

impl std::fmt::Display for ShellError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bridge(e) => write!(f, "Renderer bridge failure: {}", e),
            Self::Lifecycle(e) => write!(f, "Lifecycle violation: {}", e),
            Self::RenderThreadPanicked => write!(f, "Render thread panicked"),
        }
    }
}

impl std::error::Error for ShellError {}

//=== ShellBuilder ========================================================

/// Builder for configuring and constructing a [`Shell`].
///
/// # Default Values
///
/// - **Pacing**: `Decoupled { fps: 60.0 }` (fixed-timestep rendering)
/// - **Channel capacity**: 128 surface events
/// - **Title**: "SpheresVR"
/// - **Haptics**: [`SilentHaptics`]
/// - **Audio**: live output device, degrading to silent if absent
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use spheres_shell::{FramePacing, ShellBuilder};
/// # use spheres_shell::core::bridge::*;
/// # use spheres_shell::core::services::HostServices;
/// # struct MyRenderer;
/// # impl RendererBridge for MyRenderer {
/// #     fn create(&self, _: HostServices) -> Result<RendererHandle, BridgeError> {
/// #         Ok(RendererHandle::from_raw(1).unwrap())
/// #     }
/// #     fn initialize_display(&self, _: RendererHandle) -> Result<(), BridgeError> { Ok(()) }
/// #     fn draw_frame(&self, _: RendererHandle) -> Result<FrameReport, BridgeError> {
/// #         Ok(FrameReport::default())
/// #     }
/// #     fn trigger_event(&self, _: RendererHandle) -> Result<(), BridgeError> { Ok(()) }
/// #     fn pause(&self, _: RendererHandle) -> Result<(), BridgeError> { Ok(()) }
/// #     fn resume(&self, _: RendererHandle) -> Result<(), BridgeError> { Ok(()) }
/// #     fn destroy(&self, _: RendererHandle) -> Result<(), BridgeError> { Ok(()) }
/// # }
///
/// let shell = ShellBuilder::new("assets")
///     .with_pacing(FramePacing::Decoupled { fps: 90.0 })
///     .build();
///
/// shell.run(Arc::new(MyRenderer)).expect("session failed");
/// ```
pub struct ShellBuilder {
    assets_root: PathBuf,
    title: String,
    pacing: FramePacing,
    channel_capacity: usize,
    haptics: Box<dyn Haptics>,
    silent_audio: bool,
}

impl ShellBuilder {
    /// Creates a builder serving assets from `assets_root`.
    pub fn new(assets_root: impl Into<PathBuf>) -> Self {
        Self {
            assets_root: assets_root.into(),
            title: "SpheresVR".to_string(),
            pacing: FramePacing::Decoupled { fps: 60.0 },
            channel_capacity: 128,
            haptics: Box::new(SilentHaptics),
            silent_audio: false,
        }
    }

    /// Sets the window title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Selects frame pacing for the render thread.
    ///
    /// # Panics
    ///
    /// Panics if decoupled pacing is requested with a non-positive rate.
    pub fn with_pacing(mut self, pacing: FramePacing) -> Self {
        if let FramePacing::Decoupled { fps } = pacing {
            assert!(fps > 0.0, "Frame rate must be positive, got {}", fps);
        }
        self.pacing = pacing;
        self
    }

    /// Sets the surface event channel capacity.
    ///
    /// # Panics
    ///
    /// Panics if `capacity == 0`.
    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        assert!(capacity > 0, "Channel capacity must be positive");
        self.channel_capacity = capacity;
        self
    }

    /// Installs a haptic actuator for trigger feedback.
    pub fn with_haptics(mut self, haptics: Box<dyn Haptics>) -> Self {
        self.haptics = haptics;
        self
    }

    /// Disables the audio output device entirely. Playback requests
    /// still resolve names and allocate ids.
    pub fn with_silent_audio(mut self) -> Self {
        self.silent_audio = true;
        self
    }

    /// Builds the shell instance.
    pub fn build(self) -> Shell {
        info!(
            "Building shell (pacing: {:?}, channel: {})",
            self.pacing, self.channel_capacity
        );

        Shell {
            assets_root: self.assets_root,
            title: self.title,
            pacing: self.pacing,
            channel_capacity: self.channel_capacity,
            haptics: self.haptics,
            silent_audio: self.silent_audio,
        }
    }
}

//=== Shell ===============================================================

/// One configured renderer session, ready to run.
///
/// `run` blocks until the surface closes or a bridge call fails.
pub struct Shell {
    assets_root: PathBuf,
    title: String,
    pacing: FramePacing,
    channel_capacity: usize,
    haptics: Box<dyn Haptics>,
    silent_audio: bool,
}

impl Shell {
    /// Runs the session to completion.
    ///
    /// # Lifecycle
    ///
    /// 1. Constructs the resource and sound backends and bundles them as
    ///    [`HostServices`]
    /// 2. `bridge.create(services)` produces the renderer handle
    /// 3. Spawns the render thread and enters the surface event loop
    /// 4. On surface close: the loop exits, the channel disconnects, the
    ///    render thread drains and is joined
    /// 5. `bridge.destroy(handle)` runs only after the join, and only if
    ///    the render thread reported no failure
    ///
    /// # Errors
    ///
    /// Any [`BridgeError`] is fatal and returned as-is; there is no
    /// retry and no partial-failure recovery at this layer.
    pub fn run(self, bridge: Arc<dyn RendererBridge>) -> Result<(), ShellError> {
        info!("Starting shell session (pacing: {:?})", self.pacing);

        //--- 1. Host services --------------------------------------------
        let resources = Arc::new(ResourceBackend::new(&self.assets_root));
        let sound = Arc::new(if self.silent_audio {
            SoundBackend::silent(&self.assets_root)
        } else {
            SoundBackend::new(&self.assets_root)
        });
        let services = HostServices::new(resources, sound);

        //--- 2. Renderer creation ----------------------------------------
        let handle = bridge.create(services).map_err(ShellError::Bridge)?;
        info!("Renderer created (handle {})", handle.as_raw());

        //--- 3. Render thread + surface loop -----------------------------
        let (tx, rx) = bounded(self.channel_capacity);
        let render_thread = RenderLoop::new(Arc::clone(&bridge), handle, self.pacing).spawn(rx);

        let forward_redraws = matches!(self.pacing, FramePacing::Coupled);
        let controller = SurfaceController::new(tx, self.title, forward_redraws, self.haptics);
        if let Err(e) = controller.run() {
            // The surface is gone either way; log and fall through to
            // teardown so the renderer is still released.
            error!("Platform failure: {}", e);
        }

        //--- 4. Join before destroy --------------------------------------
        let outcome = render_thread
            .join()
            .map_err(|_| ShellError::RenderThreadPanicked)?;

        if let Some(failure) = outcome.failure {
            error!("Session ended abnormally after {} frames", outcome.frames);
            return Err(ShellError::Bridge(failure));
        }

        //--- 5. Destroy --------------------------------------------------
        let mut lifecycle = outcome.lifecycle;
        lifecycle
            .advance(LifecycleEvent::Destroy)
            .map_err(ShellError::Lifecycle)?;
        bridge.destroy(handle).map_err(ShellError::Bridge)?;

        info!("Shell shutdown complete ({} frames drawn)", outcome.frames);
        Ok(())
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    //=====================================================================
    // ShellBuilder Tests
    //=====================================================================

    #[test]
    fn builder_defaults() {
        let builder = ShellBuilder::new("assets");
        assert_eq!(builder.pacing, FramePacing::Decoupled { fps: 60.0 });
        assert_eq!(builder.channel_capacity, 128);
        assert_eq!(builder.title, "SpheresVR");
        assert!(!builder.silent_audio);
    }

    #[test]
    fn builder_with_pacing() {
        let builder = ShellBuilder::new("assets").with_pacing(FramePacing::Coupled);
        assert_eq!(builder.pacing, FramePacing::Coupled);
    }

    #[test]
    #[should_panic(expected = "Frame rate must be positive")]
    fn builder_rejects_zero_frame_rate() {
        ShellBuilder::new("assets").with_pacing(FramePacing::Decoupled { fps: 0.0 });
    }

    #[test]
    #[should_panic(expected = "Frame rate must be positive")]
    fn builder_rejects_negative_frame_rate() {
        ShellBuilder::new("assets").with_pacing(FramePacing::Decoupled { fps: -90.0 });
    }

    #[test]
    #[should_panic(expected = "Channel capacity must be positive")]
    fn builder_rejects_zero_capacity() {
        ShellBuilder::new("assets").with_channel_capacity(0);
    }

    #[test]
    fn builder_fluent_api_chaining() {
        let shell = ShellBuilder::new("assets")
            .with_title("Demo")
            .with_pacing(FramePacing::Decoupled { fps: 90.0 })
            .with_channel_capacity(256)
            .with_silent_audio()
            .build();

        assert_eq!(shell.title, "Demo");
        assert_eq!(shell.pacing, FramePacing::Decoupled { fps: 90.0 });
        assert_eq!(shell.channel_capacity, 256);
        assert!(shell.silent_audio);
    }
}
