//! Audio cues played at period boundaries.
//!
//! The engine only ever asks for a cue by name through [`CuePlayer`]. What
//! actually gets played is decided by the [`CueMap`]: a custom sound file
//! registered for the cue, or a synthesized built-in tone when none is set.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::thread;
use std::time::Duration;

use rodio::{source::SineWave, Decoder, OutputStream, Sink, Source};
use thiserror::Error;
use tracing::{debug, warn};

/// Largest custom sound file accepted, in bytes.
pub const MAX_CUE_BYTES: u64 = 10 * 1024 * 1024;

/// File extensions the bundled decoder features can play.
pub const SUPPORTED_EXTENSIONS: [&str; 3] = ["mp3", "wav", "ogg"];

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum, strum_macros::Display,
)]
#[strum(serialize_all = "lowercase")]
pub enum Cue {
    /// Played when an active period begins.
    Start,
    /// Played when an active period runs out.
    Bell,
}

#[derive(Error, Debug)]
pub enum CueError {
    #[error("sound file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("unsupported sound format: {} (expected mp3, wav or ogg)", .0.display())]
    UnsupportedFormat(PathBuf),

    #[error("sound file {} is {bytes} bytes, limit is 10 MiB", .path.display())]
    TooLarge { path: PathBuf, bytes: u64 },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("no audio output: {0}")]
    Stream(#[from] rodio::StreamError),

    #[error("playback rejected: {0}")]
    Play(#[from] rodio::PlayError),

    #[error("could not decode sound: {0}")]
    Decode(#[from] rodio::decoder::DecoderError),
}

/// What a cue resolves to at playback time
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CueSource {
    File(PathBuf),
    Builtin(Cue),
}

/// Custom sounds keyed by cue. Cues without an entry use the built-in tone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CueMap {
    custom: HashMap<Cue, PathBuf>,
}

impl CueMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a custom sound after checking it exists, has a playable
    /// extension and is within [`MAX_CUE_BYTES`]. On error the previous entry
    /// is kept.
    pub fn set(&mut self, cue: Cue, path: impl AsRef<Path>) -> Result<(), CueError> {
        let path = path.as_ref().to_path_buf();
        let meta = fs::metadata(&path).map_err(|_| CueError::NotFound(path.clone()))?;

        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some(e) if SUPPORTED_EXTENSIONS.contains(&e) => {}
            _ => return Err(CueError::UnsupportedFormat(path)),
        }

        if meta.len() > MAX_CUE_BYTES {
            return Err(CueError::TooLarge {
                path,
                bytes: meta.len(),
            });
        }

        self.custom.insert(cue, path);
        Ok(())
    }

    pub fn remove(&mut self, cue: Cue) -> Option<PathBuf> {
        self.custom.remove(&cue)
    }

    pub fn get(&self, cue: Cue) -> Option<&Path> {
        self.custom.get(&cue).map(PathBuf::as_path)
    }

    pub fn resolve(&self, cue: Cue) -> CueSource {
        match self.custom.get(&cue) {
            Some(path) => CueSource::File(path.clone()),
            None => CueSource::Builtin(cue),
        }
    }
}

/// Capability the countdown engine uses to request a cue.
///
/// Implementations must return quickly; playback itself happens elsewhere.
pub trait CuePlayer {
    fn play(&mut self, cue: Cue) -> Result<(), CueError>;
}

/// Plays cues through the default audio device
#[derive(Debug, Clone)]
pub struct RodioCuePlayer {
    cues: CueMap,
    volume: f32,
}

impl RodioCuePlayer {
    /// `volume` is a percentage, clamped to 100.
    pub fn new(cues: CueMap, volume: u8) -> Self {
        Self {
            cues,
            volume: f32::from(volume.min(100)) / 100.0,
        }
    }

    /// Play a cue on the calling thread and wait for it to finish.
    pub fn play_blocking(&self, cue: Cue) -> Result<(), CueError> {
        let source = self.checked_source(cue)?;
        play_source(&source, self.volume)
    }

    fn checked_source(&self, cue: Cue) -> Result<CueSource, CueError> {
        let source = self.cues.resolve(cue);
        if let CueSource::File(path) = &source {
            if !path.exists() {
                return Err(CueError::NotFound(path.clone()));
            }
        }
        Ok(source)
    }
}

impl CuePlayer for RodioCuePlayer {
    fn play(&mut self, cue: Cue) -> Result<(), CueError> {
        let source = self.checked_source(cue)?;
        let volume = self.volume;

        // The output stream is not Send, so it is opened on the playback thread.
        thread::Builder::new()
            .name(format!("cue-{cue}"))
            .spawn(move || {
                if let Err(e) = play_source(&source, volume) {
                    warn!(%cue, error = %e, "cue playback failed");
                }
            })?;
        Ok(())
    }
}

fn play_source(source: &CueSource, volume: f32) -> Result<(), CueError> {
    let (_stream, handle) = OutputStream::try_default()?;
    let sink = Sink::try_new(&handle)?;
    sink.set_volume(volume);

    match source {
        CueSource::File(path) => {
            let file = File::open(path)?;
            sink.append(Decoder::new(BufReader::new(file))?);
        }
        CueSource::Builtin(cue) => append_builtin_tone(&sink, *cue),
    }

    sink.sleep_until_end();
    Ok(())
}

fn append_builtin_tone(sink: &Sink, cue: Cue) {
    // (frequency, beeps, beep length, gap)
    let (freq, beeps, beep, gap) = match cue {
        Cue::Start => (880.0, 2, Duration::from_millis(160), Duration::from_millis(90)),
        Cue::Bell => (660.0, 3, Duration::from_millis(420), Duration::from_millis(140)),
    };

    for i in 0..beeps {
        let delay = if i == 0 { Duration::ZERO } else { gap };
        sink.append(
            SineWave::new(freq)
                .take_duration(beep)
                .amplify(0.3)
                .delay(delay),
        );
    }
}

/// Player used with `--mute`
#[derive(Debug, Clone, Copy, Default)]
pub struct MutedCuePlayer;

impl CuePlayer for MutedCuePlayer {
    fn play(&mut self, cue: Cue) -> Result<(), CueError> {
        debug!(%cue, "cue muted");
        Ok(())
    }
}

/// Test player that records every requested cue
#[derive(Debug, Clone, Default)]
pub struct RecordingCuePlayer {
    played: Rc<RefCell<Vec<Cue>>>,
}

impl RecordingCuePlayer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn played(&self) -> Vec<Cue> {
        self.played.borrow().clone()
    }

    pub fn count(&self, cue: Cue) -> usize {
        self.played.borrow().iter().filter(|c| **c == cue).count()
    }

    pub fn clear(&self) {
        self.played.borrow_mut().clear();
    }
}

impl CuePlayer for RecordingCuePlayer {
    fn play(&mut self, cue: Cue) -> Result<(), CueError> {
        self.played.borrow_mut().push(cue);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn cue_names() {
        assert_eq!(Cue::Start.to_string(), "start");
        assert_eq!(Cue::Bell.to_string(), "bell");
    }

    #[test]
    fn resolve_falls_back_to_builtin() {
        let map = CueMap::new();
        assert_eq!(map.resolve(Cue::Bell), CueSource::Builtin(Cue::Bell));
        assert_eq!(map.resolve(Cue::Start), CueSource::Builtin(Cue::Start));
    }

    #[test]
    fn set_accepts_supported_audio_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("gong.WAV");
        fs::write(&path, b"RIFF").unwrap();

        let mut map = CueMap::new();
        map.set(Cue::Bell, &path).unwrap();

        assert_eq!(map.get(Cue::Bell), Some(path.as_path()));
        assert_eq!(map.resolve(Cue::Bell), CueSource::File(path));
        assert_eq!(map.resolve(Cue::Start), CueSource::Builtin(Cue::Start));
    }

    #[test]
    fn set_rejects_missing_file() {
        let dir = tempdir().unwrap();
        let mut map = CueMap::new();
        let err = map.set(Cue::Start, dir.path().join("nope.mp3")).unwrap_err();
        assert_matches!(err, CueError::NotFound(_));
        assert_eq!(map.get(Cue::Start), None);
    }

    #[test]
    fn set_rejects_non_audio_extension() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        fs::write(&path, b"hello").unwrap();

        let mut map = CueMap::new();
        assert_matches!(
            map.set(Cue::Start, &path),
            Err(CueError::UnsupportedFormat(_))
        );
    }

    #[test]
    fn set_rejects_oversized_file_and_keeps_previous() {
        let dir = tempdir().unwrap();
        let good = dir.path().join("bell.mp3");
        fs::write(&good, b"ID3").unwrap();
        let big = dir.path().join("huge.mp3");
        let mut f = File::create(&big).unwrap();
        f.write_all(&vec![0u8; (MAX_CUE_BYTES + 1) as usize]).unwrap();

        let mut map = CueMap::new();
        map.set(Cue::Bell, &good).unwrap();
        assert_matches!(
            map.set(Cue::Bell, &big),
            Err(CueError::TooLarge { bytes, .. }) if bytes == MAX_CUE_BYTES + 1
        );
        assert_eq!(map.get(Cue::Bell), Some(good.as_path()));
    }

    #[test]
    fn remove_restores_builtin() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("start.ogg");
        fs::write(&path, b"OggS").unwrap();

        let mut map = CueMap::new();
        map.set(Cue::Start, &path).unwrap();
        assert_eq!(map.remove(Cue::Start), Some(path));
        assert_eq!(map.resolve(Cue::Start), CueSource::Builtin(Cue::Start));
    }

    #[test]
    fn rodio_player_reports_vanished_file_without_spawning() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bell.mp3");
        fs::write(&path, b"ID3").unwrap();

        let mut map = CueMap::new();
        map.set(Cue::Bell, &path).unwrap();
        fs::remove_file(&path).unwrap();

        let mut player = RodioCuePlayer::new(map, 80);
        assert_matches!(player.play(Cue::Bell), Err(CueError::NotFound(_)));
    }

    #[test]
    fn recording_player_counts_cues() {
        let player = RecordingCuePlayer::new();
        let mut handle = player.clone();
        handle.play(Cue::Start).unwrap();
        handle.play(Cue::Bell).unwrap();
        handle.play(Cue::Start).unwrap();

        assert_eq!(player.played(), vec![Cue::Start, Cue::Bell, Cue::Start]);
        assert_eq!(player.count(Cue::Start), 2);

        player.clear();
        assert!(player.played().is_empty());
    }
}
