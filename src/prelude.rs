//=========================================================================
// Prelude
//=========================================================================
//
// Convenience module that re-exports commonly used types and traits.
//
// Usage:
//   use spheres_shell::prelude::*;
//
//=========================================================================

//=== Public API ==========================================================

// Shell entry points
pub use crate::shell::{Shell, ShellBuilder, ShellError};

// Frame pacing
pub use crate::core::FramePacing;

// Renderer bridge contract
pub use crate::core::bridge::{BridgeError, FrameReport, RendererBridge, RendererHandle};

// Lifecycle machine
pub use crate::core::lifecycle::{InvalidTransition, Lifecycle, LifecycleEvent, LifecycleState};

// Host services
pub use crate::core::resources::{ResourceBackend, ResourceError, TextureHandle, TextureRecord};
pub use crate::core::services::HostServices;
pub use crate::core::sound::{PlayHandle, SoundBackend};

// Haptic feedback
pub use crate::platform::haptics::{Haptics, SilentHaptics};
