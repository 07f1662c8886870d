//=========================================================================
// Spheres Shell — Library Root
//
// This crate defines the public API surface of the SpheresVR host shell.
//
// Responsibilities:
// - Expose the session entry point (`Shell` / `ShellBuilder`)
// - Expose the renderer contract (`core::bridge::RendererBridge`) and
//   the host services the renderer pulls assets through
// - Keep OS integration (`platform`) hidden from end users
//
// Typical usage:
// ```no_run
// use std::sync::Arc;
// use spheres_shell::ShellBuilder;
// # use spheres_shell::core::bridge::*;
// # use spheres_shell::core::services::HostServices;
// # struct MyRenderer;
// # impl RendererBridge for MyRenderer {
// #     fn create(&self, _: HostServices) -> Result<RendererHandle, BridgeError> {
// #         Ok(RendererHandle::from_raw(1).unwrap())
// #     }
// #     fn initialize_display(&self, _: RendererHandle) -> Result<(), BridgeError> { Ok(()) }
// #     fn draw_frame(&self, _: RendererHandle) -> Result<FrameReport, BridgeError> {
// #         Ok(FrameReport::default())
// #     }
// #     fn trigger_event(&self, _: RendererHandle) -> Result<(), BridgeError> { Ok(()) }
// #     fn pause(&self, _: RendererHandle) -> Result<(), BridgeError> { Ok(()) }
// #     fn resume(&self, _: RendererHandle) -> Result<(), BridgeError> { Ok(()) }
// #     fn destroy(&self, _: RendererHandle) -> Result<(), BridgeError> { Ok(()) }
// # }
//
// fn main() {
//     spheres_shell::logging::init_logging(None);
//     ShellBuilder::new("assets")
//         .build()
//         .run(Arc::new(MyRenderer))
//         .expect("session failed");
// }
// ```
//
//=========================================================================

//--- Public Modules ------------------------------------------------------
//
// `core` contains the renderer contract, the lifecycle machine, and the
// host service backends. It is exposed publicly so bridge implementors
// can name its types; typical application code only touches the
// top-level `Shell` facade.
//
pub mod core;
pub mod logging;
pub mod prelude;

//--- Internal Modules ----------------------------------------------------
//
// `platform` contains OS-specific logic (window, Winit integration,
// event loop) and is kept private, as it is not part of the public API
// surface. Its haptics seam is re-exported below.
//
// `shell` defines the session entry point and teardown choreography.
//
mod platform;
mod shell;

//--- Public Exports ------------------------------------------------------

pub use crate::core::FramePacing;
pub use crate::platform::haptics::{Haptics, SilentHaptics};
pub use crate::shell::{Shell, ShellBuilder, ShellError};
