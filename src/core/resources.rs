//=========================================================================
// Resource Backend
//
// Loads and caches named image and text assets on behalf of the renderer.
//
// Responsibilities:
// - Resolve flat string asset names under a single asset root
// - Decode images to RGBA records and hand out integer texture handles
// - Cache loads by name so repeated requests return the live handle
// - Release textures individually or all at once
//
// Notes:
// Backend calls arrive from whichever thread the renderer happens to be
// on (typically the render thread), so the table sits behind a Mutex.
// Handles are allocated from a monotonic counter starting at 1 and are
// never reused.
//
//=========================================================================

//=== Standard Library Imports ============================================

use std::collections::HashMap;
use std::fs;
use std::num::NonZeroU32;
use std::path::PathBuf;
use std::sync::Mutex;

//=== External Crates =====================================================

use log::{debug, info, warn};

//=== TextureHandle =======================================================

/// Integer identifier for one loaded texture.
///
/// Owned by the caller until released with
/// [`ResourceBackend::free_texture`]. Live handles are unique for the
/// lifetime of the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(NonZeroU32);

impl TextureHandle {
    /// Returns the raw integer value of the handle.
    pub fn as_raw(self) -> u32 {
        self.0.get()
    }
}

//=== ResourceError =======================================================

/// Failures raised by the resource and sound backends.
#[derive(Debug)]
pub enum ResourceError {
    /// No asset backs the requested name. Propagated to the renderer,
    /// which decides fallback behavior.
    NotFound(String),

    /// The asset exists but could not be read or decoded.
    Load {
        /// Asset name as requested.
        name: String,
        /// Underlying failure detail.
        detail: String,
    },

    /// A release was requested for a handle the backend does not know.
    /// Treated as a logic error in the caller, not a silent success.
    UnknownTexture(TextureHandle),
}

impl std::fmt::Display for ResourceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(name) => write!(f, "No asset found for '{}'", name),
            Self::Load { name, detail } => write!(f, "Failed to load '{}': {}", name, detail),
            Self::UnknownTexture(handle) => {
                write!(f, "Unknown texture handle {}", handle.as_raw())
            }
        }
    }
}

impl std::error::Error for ResourceError {}

//=== TextureRecord =======================================================

/// One decoded texture: RGBA pixels plus dimensions.
#[derive(Debug)]
pub struct TextureRecord {
    name: String,
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl TextureRecord {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Tightly packed RGBA8 pixel data, row-major.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }
}

//=== TextureTable ========================================================
//
// Interior state guarded by the backend's Mutex. Two maps are kept in
// step: handle → record for lookups and name → handle for the load cache.
//
struct TextureTable {
    by_handle: HashMap<TextureHandle, TextureRecord>,
    by_name: HashMap<String, TextureHandle>,
    next_id: u32,
}

impl TextureTable {
    fn new() -> Self {
        Self {
            by_handle: HashMap::new(),
            by_name: HashMap::new(),
            next_id: 1,
        }
    }

    fn allocate(&mut self) -> TextureHandle {
        let id = NonZeroU32::new(self.next_id).expect("texture id counter stays nonzero");
        self.next_id += 1;
        TextureHandle(id)
    }
}

//=== ResourceBackend =====================================================

/// Name-keyed texture and text asset store rooted at one directory.
///
/// All methods are safe to call from any thread.
pub struct ResourceBackend {
    root: PathBuf,
    table: Mutex<TextureTable>,
}

impl ResourceBackend {
    //--- Construction -----------------------------------------------------

    /// Creates a backend serving assets from `root`. Names are resolved
    /// verbatim under this directory; there is no directory structure or
    /// versioning in the asset namespace.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        info!(target: "resources", "Resource backend rooted at {}", root.display());
        Self {
            root,
            table: Mutex::new(TextureTable::new()),
        }
    }

    //--- Texture Loading --------------------------------------------------

    /// Loads the named image, registers it, and returns its handle.
    ///
    /// Loads are cached by name: a second request for a name with a live
    /// texture returns the existing handle instead of decoding again.
    ///
    /// # Errors
    ///
    /// [`ResourceError::NotFound`] when no file backs `name`;
    /// [`ResourceError::Load`] when the file exists but cannot be decoded.
    pub fn load_texture(&self, name: &str) -> Result<TextureHandle, ResourceError> {
        if let Some(&handle) = self
            .table
            .lock()
            .expect("texture table lock")
            .by_name
            .get(name)
        {
            debug!(target: "resources", "Texture '{}' served from cache", name);
            return Ok(handle);
        }

        // Decode outside the lock; a slow disk read must not stall other
        // backend calls.
        let path = self.resolve(name)?;
        let image = image::open(&path)
            .map_err(|e| ResourceError::Load {
                name: name.to_string(),
                detail: e.to_string(),
            })?
            .to_rgba8();
        let (width, height) = image.dimensions();

        let mut table = self.table.lock().expect("texture table lock");

        // Another thread may have finished loading the same name while
        // this one was decoding; its handle wins.
        if let Some(&handle) = table.by_name.get(name) {
            debug!(target: "resources", "Texture '{}' raced another load, reusing", name);
            return Ok(handle);
        }

        let handle = table.allocate();
        table.by_handle.insert(
            handle,
            TextureRecord {
                name: name.to_string(),
                width,
                height,
                pixels: image.into_raw(),
            },
        );
        table.by_name.insert(name.to_string(), handle);

        info!(
            target: "resources",
            "Texture '{}' loaded ({}x{}, handle {})",
            name, width, height, handle.as_raw()
        );
        Ok(handle)
    }

    //--- Text Loading -----------------------------------------------------

    /// Returns the full text content of the named asset.
    pub fn read_text_file(&self, name: &str) -> Result<String, ResourceError> {
        let path = self.resolve(name)?;
        fs::read_to_string(&path).map_err(|e| ResourceError::Load {
            name: name.to_string(),
            detail: e.to_string(),
        })
    }

    //--- Texture Release --------------------------------------------------

    /// Releases a previously loaded texture.
    ///
    /// Unknown handles are a logic error in the caller: the call returns
    /// [`ResourceError::UnknownTexture`] and logs a warning rather than
    /// silently succeeding.
    pub fn free_texture(&self, handle: TextureHandle) -> Result<(), ResourceError> {
        let mut table = self.table.lock().expect("texture table lock");

        match table.by_handle.remove(&handle) {
            Some(record) => {
                table.by_name.remove(&record.name);
                debug!(target: "resources", "Texture '{}' released", record.name);
                Ok(())
            }
            None => {
                warn!(
                    target: "resources",
                    "Release requested for unknown texture handle {}",
                    handle.as_raw()
                );
                Err(ResourceError::UnknownTexture(handle))
            }
        }
    }

    /// Releases every loaded texture. Used when the display context is
    /// torn down as a whole.
    pub fn free_all_textures(&self) {
        let mut table = self.table.lock().expect("texture table lock");
        let count = table.by_handle.len();
        table.by_handle.clear();
        table.by_name.clear();
        info!(target: "resources", "Released all textures ({})", count);
    }

    //--- Queries ----------------------------------------------------------

    /// Number of currently live textures.
    pub fn texture_count(&self) -> usize {
        self.table.lock().expect("texture table lock").by_handle.len()
    }

    pub fn is_loaded(&self, handle: TextureHandle) -> bool {
        self.table
            .lock()
            .expect("texture table lock")
            .by_handle
            .contains_key(&handle)
    }

    /// Runs `f` against the record behind `handle`, if it is live.
    pub fn with_texture<R>(
        &self,
        handle: TextureHandle,
        f: impl FnOnce(&TextureRecord) -> R,
    ) -> Option<R> {
        let table = self.table.lock().expect("texture table lock");
        table.by_handle.get(&handle).map(f)
    }

    //--- Internal Helpers -------------------------------------------------

    // Maps a flat asset name to its backing file, or NotFound.
    fn resolve(&self, name: &str) -> Result<PathBuf, ResourceError> {
        let path = self.root.join(name);
        if path.is_file() {
            Ok(path)
        } else {
            Err(ResourceError::NotFound(name.to_string()))
        }
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbaImage;
    use tempfile::TempDir;

    //--- Fixtures ---------------------------------------------------------

    fn backend_with_assets() -> (TempDir, ResourceBackend) {
        let dir = TempDir::new().expect("temp asset dir");

        RgbaImage::new(2, 2)
            .save(dir.path().join("wall.png"))
            .expect("write wall.png");
        fs::write(dir.path().join("notes.txt"), "hello spheres").expect("write notes.txt");

        let backend = ResourceBackend::new(dir.path());
        (dir, backend)
    }

    //=====================================================================
    // Texture Loading
    //=====================================================================

    #[test]
    fn first_texture_handle_is_one() {
        let (_dir, backend) = backend_with_assets();
        let handle = backend.load_texture("wall.png").unwrap();
        assert_eq!(handle.as_raw(), 1);
        assert!(backend.is_loaded(handle));
    }

    #[test]
    fn missing_texture_is_not_found_and_allocates_nothing() {
        let (_dir, backend) = backend_with_assets();

        match backend.load_texture("missing.png") {
            Err(ResourceError::NotFound(name)) => assert_eq!(name, "missing.png"),
            other => panic!("Expected NotFound, got {:?}", other.map(|h| h.as_raw())),
        }
        assert_eq!(backend.texture_count(), 0);

        // The counter must not have burned an id on the failed load.
        let handle = backend.load_texture("wall.png").unwrap();
        assert_eq!(handle.as_raw(), 1);
    }

    #[test]
    fn undecodable_file_is_a_load_error() {
        let (dir, backend) = backend_with_assets();
        fs::write(dir.path().join("broken.png"), b"not an image").unwrap();

        assert!(matches!(
            backend.load_texture("broken.png"),
            Err(ResourceError::Load { .. })
        ));
        assert_eq!(backend.texture_count(), 0);
    }

    #[test]
    fn repeated_load_returns_cached_handle() {
        let (_dir, backend) = backend_with_assets();
        let first = backend.load_texture("wall.png").unwrap();
        let second = backend.load_texture("wall.png").unwrap();
        assert_eq!(first, second, "Same live name must map to the same handle");
        assert_eq!(backend.texture_count(), 1);
    }

    #[test]
    fn record_carries_dimensions_and_pixels() {
        let (_dir, backend) = backend_with_assets();
        let handle = backend.load_texture("wall.png").unwrap();

        let (w, h, len) = backend
            .with_texture(handle, |rec| (rec.width(), rec.height(), rec.pixels().len()))
            .expect("record must be live");
        assert_eq!((w, h), (2, 2));
        assert_eq!(len, 2 * 2 * 4, "RGBA8 layout expected");
    }

    //=====================================================================
    // Texture Release
    //=====================================================================

    #[test]
    fn second_free_of_same_handle_is_flagged() {
        let (_dir, backend) = backend_with_assets();
        let handle = backend.load_texture("wall.png").unwrap();

        assert!(backend.free_texture(handle).is_ok());
        assert!(
            matches!(
                backend.free_texture(handle),
                Err(ResourceError::UnknownTexture(h)) if h == handle
            ),
            "Releasing an already-freed handle must be diagnosed"
        );
    }

    #[test]
    fn freed_name_can_be_loaded_again_with_a_fresh_handle() {
        let (_dir, backend) = backend_with_assets();
        let first = backend.load_texture("wall.png").unwrap();
        backend.free_texture(first).unwrap();

        let second = backend.load_texture("wall.png").unwrap();
        assert_ne!(first, second, "Handles are never reused");
        assert!(!backend.is_loaded(first));
        assert!(backend.is_loaded(second));
    }

    #[test]
    fn free_all_empties_the_table() {
        let (dir, backend) = backend_with_assets();
        RgbaImage::new(1, 1).save(dir.path().join("floor.png")).unwrap();

        backend.load_texture("wall.png").unwrap();
        backend.load_texture("floor.png").unwrap();
        assert_eq!(backend.texture_count(), 2);

        backend.free_all_textures();
        assert_eq!(backend.texture_count(), 0);
    }

    #[test]
    fn live_handles_are_unique() {
        let (dir, backend) = backend_with_assets();
        RgbaImage::new(1, 1).save(dir.path().join("floor.png")).unwrap();

        let a = backend.load_texture("wall.png").unwrap();
        let b = backend.load_texture("floor.png").unwrap();
        assert_ne!(a, b);
    }

    //=====================================================================
    // Text Files
    //=====================================================================

    #[test]
    fn text_file_roundtrip() {
        let (_dir, backend) = backend_with_assets();
        assert_eq!(backend.read_text_file("notes.txt").unwrap(), "hello spheres");
    }

    #[test]
    fn missing_text_file_is_not_found() {
        let (_dir, backend) = backend_with_assets();
        assert!(matches!(
            backend.read_text_file("absent.txt"),
            Err(ResourceError::NotFound(_))
        ));
    }
}
