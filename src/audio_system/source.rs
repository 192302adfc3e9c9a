/// Audio source lifecycle
///
/// Owns the one user-supplied recording: `Empty -> Loading -> {Ready | Failed}`.
/// Every load gets a fresh [`SourceId`] so callbacks that belong to a replaced
/// source can be recognised and dropped.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use super::blob::{BlobGuard, BlobStore, BlobUrl};
use crate::error::AudioError;

/// User-facing message for a source that could not be decoded
pub const LOAD_ERROR_MESSAGE: &str = "Failed to load or decode the selected audio file.";

/// Identity of one `load_from_file` call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceId(u64);

impl SourceId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "source#{}", self.0)
    }
}

/// Lifecycle state of the current source
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceState {
    /// Nothing loaded yet
    Empty,

    /// Waiting for the decoder to confirm the source plays through
    Loading,

    /// Decoder confirmed; clips may be played
    Ready,

    /// Decoding failed; terminal for this source
    Failed { message: String },
}

impl SourceState {
    pub fn description(&self) -> &str {
        match self {
            SourceState::Empty => "No audio loaded",
            SourceState::Loading => "Loading...",
            SourceState::Ready => "Ready",
            SourceState::Failed { message } => message,
        }
    }
}

/// The loaded recording
#[derive(Debug)]
pub struct AudioSource {
    id: SourceId,
    name: String,
    byte_len: usize,
    blob: BlobGuard,
    state: SourceState,
}

impl AudioSource {
    pub fn id(&self) -> SourceId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn byte_len(&self) -> usize {
        self.byte_len
    }

    pub fn url(&self) -> &BlobUrl {
        self.blob.url()
    }

    /// File extension of the name, a format hint for decoders
    pub fn extension(&self) -> Option<&str> {
        Path::new(&self.name).extension().and_then(|ext| ext.to_str())
    }

    pub fn state(&self) -> &SourceState {
        &self.state
    }
}

/// Manages the single live audio source
pub struct AudioSourceManager {
    store: Arc<BlobStore>,
    current: Option<AudioSource>,
    next_id: u64,
}

impl AudioSourceManager {
    pub fn new(store: Arc<BlobStore>) -> Self {
        Self {
            store,
            current: None,
            next_id: 1,
        }
    }

    /// Read a file from disk and load it.
    ///
    /// An I/O failure leaves the current source untouched.
    pub fn load_path(&mut self, path: &Path) -> Result<&AudioSource, AudioError> {
        let data = std::fs::read(path).map_err(|source| AudioError::LoadFailed {
            path: path.display().to_string(),
            source,
        })?;

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        Ok(self.load_from_file(name, data))
    }

    /// Replace the current source with new bytes.
    ///
    /// The previous blob is released first. The new source starts in
    /// `Loading`; readiness arrives later through [`on_ready`](Self::on_ready).
    pub fn load_from_file(&mut self, name: impl Into<String>, data: Vec<u8>) -> &AudioSource {
        self.teardown();

        let id = SourceId(self.next_id);
        self.next_id += 1;

        let name = name.into();
        let byte_len = data.len();
        let blob = self.store.create(data);

        tracing::info!("Loading {} as {} ({} bytes)", name, id, byte_len);

        self.current.insert(AudioSource {
            id,
            name,
            byte_len,
            blob,
            state: SourceState::Loading,
        })
    }

    /// Decoder confirmed the source can play through. Returns whether it applied.
    pub fn on_ready(&mut self, id: SourceId) -> bool {
        let Some(source) = self.current_for(id) else {
            tracing::debug!("Ignoring ready signal from stale {}", id);
            return false;
        };

        match source.state {
            SourceState::Loading => {
                source.state = SourceState::Ready;
                tracing::info!("{} ready", id);
                true
            }
            SourceState::Ready => true,
            SourceState::Failed { .. } | SourceState::Empty => {
                tracing::debug!("Ignoring ready signal for failed {}", id);
                false
            }
        }
    }

    /// Decoder gave up. Returns whether it applied.
    pub fn on_error(&mut self, id: SourceId, cause: &str) -> bool {
        let Some(source) = self.current_for(id) else {
            tracing::debug!("Ignoring error from stale {}: {}", id, cause);
            return false;
        };

        tracing::warn!("{} failed to decode: {}", id, cause);
        source.state = SourceState::Failed {
            message: LOAD_ERROR_MESSAGE.to_string(),
        };
        true
    }

    /// Release the current source, if any
    pub fn teardown(&mut self) {
        if let Some(previous) = self.current.take() {
            tracing::debug!("Releasing {} ({})", previous.id, previous.name);
        }
    }

    fn current_for(&mut self, id: SourceId) -> Option<&mut AudioSource> {
        self.current.as_mut().filter(|s| s.id == id)
    }

    pub fn current(&self) -> Option<&AudioSource> {
        self.current.as_ref()
    }

    pub fn state(&self) -> SourceState {
        self.current
            .as_ref()
            .map(|s| s.state.clone())
            .unwrap_or(SourceState::Empty)
    }

    pub fn is_ready(&self) -> bool {
        matches!(
            self.current.as_ref().map(|s| &s.state),
            Some(SourceState::Ready)
        )
    }

    /// User-facing error for the current source
    pub fn error(&self) -> Option<&str> {
        match self.current.as_ref().map(|s| &s.state) {
            Some(SourceState::Failed { message }) => Some(message.as_str()),
            _ => None,
        }
    }
}
