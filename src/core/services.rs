//=========================================================================
// Host Services
//=========================================================================
//
// The capability object handed to the renderer at creation.
//
// Instead of the renderer looking host callbacks up by name, the shell
// constructs both backends once at startup and passes them here as an
// explicit value. Whoever holds a clone can pull textures, text, and
// audio; nothing else of the host is reachable through it.
//
//=========================================================================

//=== Standard Library Imports ============================================

use std::fmt;
use std::sync::Arc;

//=== Internal Dependencies ===============================================

use crate::core::resources::ResourceBackend;
use crate::core::sound::SoundBackend;

//=== HostServices ========================================================

/// Shared handle to the host's resource and sound backends.
///
/// Cheap to clone; clones refer to the same backend instances.
#[derive(Clone)]
pub struct HostServices {
    resources: Arc<ResourceBackend>,
    sound: Arc<SoundBackend>,
}

impl HostServices {
    pub fn new(resources: Arc<ResourceBackend>, sound: Arc<SoundBackend>) -> Self {
        Self { resources, sound }
    }

    pub fn resources(&self) -> &ResourceBackend {
        &self.resources
    }

    pub fn sound(&self) -> &SoundBackend {
        &self.sound
    }
}

impl fmt::Debug for HostServices {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostServices")
            .field("textures", &self.resources.texture_count())
            .field("active_plays", &self.sound.active_count())
            .finish()
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn clones_share_backend_state() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("click.wav"), b"").unwrap();

        let services = HostServices::new(
            Arc::new(ResourceBackend::new(dir.path())),
            Arc::new(SoundBackend::silent(dir.path())),
        );
        let observer = services.clone();

        let id = services.sound().play_sound("click", 0.0).unwrap();
        assert!(
            observer.sound().is_active(id),
            "A play started through one clone must be visible through another"
        );
    }

    #[test]
    fn debug_output_summarizes_state() {
        let dir = TempDir::new().unwrap();
        let services = HostServices::new(
            Arc::new(ResourceBackend::new(dir.path())),
            Arc::new(SoundBackend::silent(dir.path())),
        );
        let text = format!("{:?}", services);
        assert!(text.contains("HostServices"));
    }
}
