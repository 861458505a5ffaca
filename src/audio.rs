use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AudioError {
    #[error("Cannot decode '{path}' as audio: {reason}.")]
    Decode { path: String, reason: String },
    #[error("Cannot export audio to '{path}': {reason}.")]
    Export { path: String, reason: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tags {
    pub title: Option<String>,
}

/// Decoded audio metadata. Backends carry sample data internally; the
/// interpreter only ever sees this descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct Clip {
    pub duration_ms: i64,
    pub channels: u16,
    pub sample_rate: u32,
    pub bits_per_sample: u16,
    pub tags: Tags,
}

impl Clip {
    pub fn bitrate_kbps(&self) -> i64 {
        let bits_per_second =
            self.sample_rate as i64 * self.bits_per_sample as i64 * self.channels as i64;
        bits_per_second / 1000
    }
}

/// Codec capability. Editing operations are metadata transforms on a
/// `Clip`; `decode` and `export` are the only calls that touch storage.
pub trait AudioBackend {
    fn decode(&self, path: &Path) -> Result<Clip, AudioError>;
    fn export(&self, clip: &Clip, path: &Path, format: &str) -> Result<(), AudioError>;

    fn trim(&self, mut clip: Clip, start_ms: i64, end_ms: i64) -> Clip {
        clip.duration_ms = (end_ms - start_ms).max(0);
        clip
    }

    fn concat(&self, mut first: Clip, second: Clip) -> Clip {
        first.duration_ms += second.duration_ms;
        first
    }

    fn apply_gain(&self, clip: Clip, _db: f64) -> Clip {
        clip
    }
}

/// Default backend of the CLI build: no codec support, every decode
/// fails. `ftoa` then yields null and `Audio(...)` constructors error.
pub struct NoAudioBackend;

impl AudioBackend for NoAudioBackend {
    fn decode(&self, path: &Path) -> Result<Clip, AudioError> {
        Err(AudioError::Decode {
            path: path.display().to_string(),
            reason: "no audio backend available".into(),
        })
    }

    fn export(&self, _clip: &Clip, path: &Path, _format: &str) -> Result<(), AudioError> {
        Err(AudioError::Export {
            path: path.display().to_string(),
            reason: "no audio backend available".into(),
        })
    }
}

/// Test backend: a clip store keyed by path. Exporting writes the clip
/// back into the store under the target path.
#[derive(Default)]
pub struct MemoryAudioBackend {
    clips: RefCell<HashMap<PathBuf, Clip>>,
}

impl MemoryAudioBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, path: impl Into<PathBuf>, clip: Clip) {
        self.clips.borrow_mut().insert(path.into(), clip);
    }

    pub fn clip(&self, path: &Path) -> Option<Clip> {
        self.clips.borrow().get(path).cloned()
    }

    /// A plausible CD-quality stereo clip for fixtures.
    pub fn stock_clip(duration_ms: i64, title: Option<&str>) -> Clip {
        Clip {
            duration_ms,
            channels: 2,
            sample_rate: 44_100,
            bits_per_sample: 16,
            tags: Tags {
                title: title.map(str::to_string),
            },
        }
    }
}

impl AudioBackend for MemoryAudioBackend {
    fn decode(&self, path: &Path) -> Result<Clip, AudioError> {
        self.clip(path).ok_or_else(|| AudioError::Decode {
            path: path.display().to_string(),
            reason: "not a known audio file".into(),
        })
    }

    fn export(&self, clip: &Clip, path: &Path, _format: &str) -> Result<(), AudioError> {
        self.insert(path, clip.clone());
        Ok(())
    }
}
