//=========================================================================
// Sound Backend
//
// Starts, stops, pauses, and resumes sound and music playback on behalf
// of the renderer, supporting multiple concurrent instances.
//
// Architecture:
// ```text
//  Caller thread (any):              Audio thread:
//  ┌───────────────────────┐        ┌──────────────────────────┐
//  │ resolve name           │        │ OutputStream (device)    │
//  │ allocate PlayHandle    │        │ voices: id → Sink        │
//  │ record in live table   │        │                          │
//  │ send AudioCommand ─────┼───────►│ decode, append, pause,   │
//  └───────────────────────┘        │ stop, reap finished      │
//                                    └──────────────────────────┘
// ```
//
// The audio device is confined to its own thread because the output
// stream is not Send; callers only ever touch the command channel and
// the live table, so every public method is safe from any thread. When
// no output device exists the thread keeps draining commands with no
// device state, and name resolution plus id allocation behave exactly
// as they do with audio present.
//
// Play ids come from a monotonic counter starting at 1 and are never
// reused, so a stopped instance's id cannot be confused with a later one.
//
//=========================================================================

//=== Standard Library Imports ============================================

use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::BufReader;
use std::num::NonZeroU32;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Mutex;
use std::thread;

//=== External Crates =====================================================

use crossbeam_channel::{unbounded, Receiver, Sender};
use log::{debug, info, trace, warn};
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source, SpatialSink};

//=== Internal Dependencies ===============================================

use crate::core::resources::ResourceError;

//=== PlayHandle ==========================================================

/// Identifier for one in-flight sound or music playback instance.
///
/// Owned by the caller until [`SoundBackend::stop_play`] or until the
/// instance finishes naturally (backend-internal).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlayHandle(NonZeroU32);

impl PlayHandle {
    /// Returns the raw integer value of the id.
    pub fn as_raw(self) -> u32 {
        self.0.get()
    }
}

//=== AudioCommand ========================================================
//
// Messages from callers to the audio thread. Name resolution and id
// allocation have already happened by the time a command is sent, so the
// audio thread only deals in paths and ids.
//
enum AudioCommand {
    PlayMusic { id: PlayHandle, path: PathBuf },
    PlaySound { id: PlayHandle, path: PathBuf, pan: f32 },
    Stop { id: PlayHandle },
    PauseAll,
    ResumeAll,
    Shutdown,
}

//=== Voice ===============================================================
//
// One playing instance on the audio thread. Music uses a plain sink,
// spatialized one-shots a spatial sink.
//
enum Voice {
    Plain(Sink),
    Spatial(SpatialSink),
}

impl Voice {
    fn pause(&self) {
        match self {
            Self::Plain(sink) => sink.pause(),
            Self::Spatial(sink) => sink.pause(),
        }
    }

    fn play(&self) {
        match self {
            Self::Plain(sink) => sink.play(),
            Self::Spatial(sink) => sink.play(),
        }
    }

    fn stop(&self) {
        match self {
            Self::Plain(sink) => sink.stop(),
            Self::Spatial(sink) => sink.stop(),
        }
    }

    fn finished(&self) -> bool {
        match self {
            Self::Plain(sink) => sink.empty(),
            Self::Spatial(sink) => sink.empty(),
        }
    }
}

//=== SoundBackend ========================================================

/// Name-keyed playback service rooted at one asset directory.
///
/// `play_*` resolve the name, allocate an id, and return immediately;
/// decoding and mixing happen on the audio thread.
pub struct SoundBackend {
    root: PathBuf,
    commands: Option<Sender<AudioCommand>>,
    audio_thread: Option<thread::JoinHandle<()>>,
    live: Mutex<HashSet<PlayHandle>>,
    next_id: AtomicU32,
    muted: AtomicBool,
    paused: AtomicBool,
}

impl SoundBackend {
    //--- Construction -----------------------------------------------------

    /// Creates a backend with a live audio thread.
    ///
    /// If no output device can be opened the thread logs a warning and
    /// keeps running without one; playback requests then behave exactly
    /// like [`SoundBackend::silent`].
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let (tx, rx) = unbounded();

        let audio_thread = thread::Builder::new()
            .name("spheres-audio".to_string())
            .spawn(move || audio_thread_main(rx));

        let audio_thread = match audio_thread {
            Ok(handle) => Some(handle),
            Err(e) => {
                warn!(target: "sound", "Could not spawn audio thread: {}", e);
                None
            }
        };

        let mut backend = Self::silent(root);
        if audio_thread.is_some() {
            backend.commands = Some(tx);
            backend.audio_thread = audio_thread;
        }
        backend
    }

    /// Creates a backend with no audio thread at all.
    ///
    /// Name resolution, id allocation, and the live table work as usual;
    /// nothing is audible. Intended for headless hosts and tests.
    pub fn silent(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            commands: None,
            audio_thread: None,
            live: Mutex::new(HashSet::new()),
            next_id: AtomicU32::new(1),
            muted: AtomicBool::new(false),
            paused: AtomicBool::new(false),
        }
    }

    //--- Playback ---------------------------------------------------------

    /// Starts a looping background track and returns its play id.
    ///
    /// # Errors
    ///
    /// [`ResourceError::NotFound`] when `name` resolves to no asset; no
    /// id is allocated in that case.
    pub fn play_music(&self, name: &str) -> Result<PlayHandle, ResourceError> {
        let path = self.resolve(name)?;
        let id = self.register();
        info!(target: "sound", "Music '{}' started (id {})", name, id.as_raw());

        if !self.muted.load(Ordering::Relaxed) {
            self.send(AudioCommand::PlayMusic { id, path });
        }
        Ok(id)
    }

    /// Starts a one-shot spatialized sound and returns its play id.
    ///
    /// `direction` is a stereo pan: -1.0 is full left, +1.0 full right,
    /// 0.0 centered. Values outside that range are clamped.
    pub fn play_sound(&self, name: &str, direction: f32) -> Result<PlayHandle, ResourceError> {
        let path = self.resolve(name)?;
        let id = self.register();
        let pan = direction.clamp(-1.0, 1.0);
        info!(
            target: "sound",
            "Sound '{}' started (id {}, pan {:+.2})",
            name, id.as_raw(), pan
        );

        if !self.muted.load(Ordering::Relaxed) {
            self.send(AudioCommand::PlaySound { id, path, pan });
        }
        Ok(id)
    }

    /// Stops one playback instance. Unknown or already-stopped ids are a
    /// no-op.
    pub fn stop_play(&self, id: PlayHandle) {
        let removed = self.live.lock().expect("live table lock").remove(&id);
        if removed {
            debug!(target: "sound", "Play id {} stopped", id.as_raw());
            self.send(AudioCommand::Stop { id });
        } else {
            debug!(target: "sound", "Stop for unknown play id {}, ignoring", id.as_raw());
        }
    }

    //--- Global Switches --------------------------------------------------

    /// Pauses every active instance. One switch, not per-instance.
    pub fn pause_all(&self) {
        self.paused.store(true, Ordering::Relaxed);
        self.send(AudioCommand::PauseAll);
        debug!(target: "sound", "All playback paused");
    }

    /// Resumes every paused instance.
    pub fn resume_all(&self) {
        self.paused.store(false, Ordering::Relaxed);
        self.send(AudioCommand::ResumeAll);
        debug!(target: "sound", "All playback resumed");
    }

    /// While muted, new plays still resolve names and allocate ids but
    /// produce no audible voice. Instances already playing are untouched.
    pub fn set_muted(&self, muted: bool) {
        self.muted.store(muted, Ordering::Relaxed);
    }

    //--- Queries ----------------------------------------------------------

    pub fn is_active(&self, id: PlayHandle) -> bool {
        self.live.lock().expect("live table lock").contains(&id)
    }

    /// Number of instances not yet explicitly stopped.
    pub fn active_count(&self) -> usize {
        self.live.lock().expect("live table lock").len()
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Relaxed)
    }

    pub fn is_muted(&self) -> bool {
        self.muted.load(Ordering::Relaxed)
    }

    //--- Internal Helpers -------------------------------------------------

    // Allocates the next monotonic id and records it as live.
    fn register(&self) -> PlayHandle {
        let raw = self.next_id.fetch_add(1, Ordering::Relaxed);
        let id = PlayHandle(NonZeroU32::new(raw).expect("play id counter stays nonzero"));
        self.live.lock().expect("live table lock").insert(id);
        id
    }

    fn send(&self, command: AudioCommand) {
        if let Some(tx) = &self.commands {
            if tx.send(command).is_err() {
                warn!(target: "sound", "Audio thread gone, dropping command");
            }
        }
    }

    // Flat namespace probe: the name verbatim, then common extensions.
    fn resolve(&self, name: &str) -> Result<PathBuf, ResourceError> {
        let candidates = [name.to_string(), format!("{}.wav", name), format!("{}.ogg", name)];
        for candidate in &candidates {
            let path = self.root.join(candidate);
            if path.is_file() {
                return Ok(path);
            }
        }
        Err(ResourceError::NotFound(name.to_string()))
    }
}

impl Drop for SoundBackend {
    fn drop(&mut self) {
        self.send(AudioCommand::Shutdown);
        if let Some(handle) = self.audio_thread.take() {
            let _ = handle.join();
        }
    }
}

//=== Audio Thread ========================================================
//
// Owns the output stream and all sinks. Finished one-shot voices are
// reaped lazily before each command so the voice map does not grow
// without bound during long sessions.
//
fn audio_thread_main(rx: Receiver<AudioCommand>) {
    debug!(target: "sound", "Audio thread starting");

    let output = match OutputStream::try_default() {
        Ok((stream, handle)) => Some((stream, handle)),
        Err(e) => {
            warn!(target: "sound", "No audio output device: {}", e);
            None
        }
    };

    let mut voices: HashMap<PlayHandle, Voice> = HashMap::new();
    let mut paused = false;

    while let Ok(command) = rx.recv() {
        voices.retain(|_, voice| !voice.finished());

        match command {
            AudioCommand::PlayMusic { id, path } => {
                if let Some((_, handle)) = &output {
                    if let Some(voice) = start_music(handle, &path) {
                        if paused {
                            voice.pause();
                        }
                        voices.insert(id, voice);
                    }
                }
            }

            AudioCommand::PlaySound { id, path, pan } => {
                if let Some((_, handle)) = &output {
                    if let Some(voice) = start_sound(handle, &path, pan) {
                        if paused {
                            voice.pause();
                        }
                        voices.insert(id, voice);
                    }
                }
            }

            AudioCommand::Stop { id } => {
                if let Some(voice) = voices.remove(&id) {
                    voice.stop();
                }
            }

            AudioCommand::PauseAll => {
                paused = true;
                for voice in voices.values() {
                    voice.pause();
                }
            }

            AudioCommand::ResumeAll => {
                paused = false;
                for voice in voices.values() {
                    voice.play();
                }
            }

            AudioCommand::Shutdown => {
                for voice in voices.values() {
                    voice.stop();
                }
                break;
            }
        }
    }

    debug!(target: "sound", "Audio thread exited");
}

fn start_music(handle: &OutputStreamHandle, path: &Path) -> Option<Voice> {
    let source = open_source(path)?;
    match Sink::try_new(handle) {
        Ok(sink) => {
            // Looping needs a restartable source; buffer the decoded
            // samples so the track can repeat.
            sink.append(source.buffered().repeat_infinite());
            Some(Voice::Plain(sink))
        }
        Err(e) => {
            warn!(target: "sound", "Could not create sink: {}", e);
            None
        }
    }
}

fn start_sound(handle: &OutputStreamHandle, path: &Path, pan: f32) -> Option<Voice> {
    let source = open_source(path)?;
    // Emitter offset on the x axis between ears at ±1 realizes the pan.
    match SpatialSink::try_new(handle, [pan, 0.0, 0.0], [-1.0, 0.0, 0.0], [1.0, 0.0, 0.0]) {
        Ok(sink) => {
            sink.append(source);
            Some(Voice::Spatial(sink))
        }
        Err(e) => {
            warn!(target: "sound", "Could not create spatial sink: {}", e);
            None
        }
    }
}

fn open_source(path: &Path) -> Option<Decoder<BufReader<File>>> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) => {
            warn!(target: "sound", "Could not open {}: {}", path.display(), e);
            return None;
        }
    };
    match Decoder::new(BufReader::new(file)) {
        Ok(source) => {
            trace!(target: "sound", "Decoding {}", path.display());
            Some(source)
        }
        Err(e) => {
            warn!(target: "sound", "Could not decode {}: {}", path.display(), e);
            None
        }
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
//
// All tests run against a silent backend so they hold on hosts without
// an audio device; id allocation and the live table are identical in
// both modes.
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    //--- Fixtures ---------------------------------------------------------

    fn backend_with_sounds() -> (TempDir, SoundBackend) {
        let dir = TempDir::new().expect("temp sound dir");
        fs::write(dir.path().join("ding.wav"), b"").expect("write ding.wav");
        fs::write(dir.path().join("ambient.ogg"), b"").expect("write ambient.ogg");

        let backend = SoundBackend::silent(dir.path());
        (dir, backend)
    }

    //=====================================================================
    // Id Allocation
    //=====================================================================

    #[test]
    fn concurrent_plays_get_distinct_monotonic_ids() {
        let (_dir, backend) = backend_with_sounds();

        let first = backend.play_sound("ding", 0.5).unwrap();
        let second = backend.play_sound("ding", -0.5).unwrap();

        assert_eq!(first.as_raw(), 1);
        assert_eq!(second.as_raw(), 2);
        assert_eq!(backend.active_count(), 2);
    }

    #[test]
    fn music_and_sound_share_the_id_space() {
        let (_dir, backend) = backend_with_sounds();

        let sound = backend.play_sound("ding", 0.0).unwrap();
        let music = backend.play_music("ambient").unwrap();
        assert_ne!(sound, music);
        assert_eq!(music.as_raw(), 2);
    }

    #[test]
    fn failed_play_allocates_no_id() {
        let (_dir, backend) = backend_with_sounds();

        assert!(matches!(
            backend.play_sound("missing", 0.0),
            Err(ResourceError::NotFound(_))
        ));
        assert!(matches!(
            backend.play_music("missing"),
            Err(ResourceError::NotFound(_))
        ));
        assert_eq!(backend.active_count(), 0);

        // Next successful play still gets the first id.
        assert_eq!(backend.play_sound("ding", 0.0).unwrap().as_raw(), 1);
    }

    //=====================================================================
    // Stop Semantics
    //=====================================================================

    #[test]
    fn stopping_one_instance_leaves_the_other_active() {
        let (_dir, backend) = backend_with_sounds();

        let first = backend.play_sound("ding", 0.5).unwrap();
        let second = backend.play_sound("ding", -0.5).unwrap();

        backend.stop_play(first);

        assert!(!backend.is_active(first));
        assert!(backend.is_active(second));
    }

    #[test]
    fn stop_is_idempotent() {
        let (_dir, backend) = backend_with_sounds();

        let id = backend.play_sound("ding", 0.0).unwrap();
        backend.stop_play(id);
        backend.stop_play(id);
        assert_eq!(backend.active_count(), 0);
    }

    #[test]
    fn stopped_ids_are_never_reissued() {
        let (_dir, backend) = backend_with_sounds();

        let first = backend.play_sound("ding", 0.0).unwrap();
        backend.stop_play(first);

        let second = backend.play_sound("ding", 0.0).unwrap();
        assert_ne!(first, second);
    }

    //=====================================================================
    // Name Resolution
    //=====================================================================

    #[test]
    fn names_resolve_with_and_without_extension() {
        let (_dir, backend) = backend_with_sounds();

        assert!(backend.play_sound("ding", 0.0).is_ok());
        assert!(backend.play_sound("ding.wav", 0.0).is_ok());
        assert!(backend.play_music("ambient").is_ok());
    }

    //=====================================================================
    // Global Switches
    //=====================================================================

    #[test]
    fn pause_and_resume_toggle_the_global_switch() {
        let (_dir, backend) = backend_with_sounds();

        assert!(!backend.is_paused());
        backend.pause_all();
        assert!(backend.is_paused());
        backend.resume_all();
        assert!(!backend.is_paused());
    }

    #[test]
    fn muted_plays_still_allocate_ids() {
        let (_dir, backend) = backend_with_sounds();

        backend.set_muted(true);
        let id = backend.play_sound("ding", 0.0).unwrap();
        assert!(backend.is_active(id));
        assert_eq!(id.as_raw(), 1);
    }

    #[test]
    fn muted_plays_still_report_missing_assets() {
        let (_dir, backend) = backend_with_sounds();

        backend.set_muted(true);
        assert!(matches!(
            backend.play_sound("missing", 0.0),
            Err(ResourceError::NotFound(_))
        ));
    }
}
