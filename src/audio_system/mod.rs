//! Audio system module
//!
//! Plays short clips cut out of one user-supplied recording:
//! - One source at a time, with explicit load/ready/failed lifecycle
//! - One shared output, one clip at a time
//! - Automatic stop at the clip's end boundary
//!
//! ## Architecture
//!
//! ```text
//! AudioSourceManager ── BlobStore ──┐
//!   (load, ready, failed)           │ resolve url
//!                                   ▼
//! SegmentPlayer ──────────────> PlaybackDevice (RodioDevice)
//!   ├── Scheduler (reseek timer)    │
//!   └── PlaybackPhase               │ DeviceSignal::{TimeUpdate, Paused}
//!                                   ▼
//!                              event loop ──> SegmentPlayer::on_device_event
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use audio_system::{AudioSourceManager, SegmentPlayer};
//!
//! let id = sources.load_from_file("clip.mp3", bytes).id();
//! player.device_mut().attach(sources.current().unwrap());
//!
//! // ... later, once SourceEvent::Ready { id } arrived:
//! sources.on_ready(id);
//! player.play(sources.is_ready(), clips::resolve(ClipId::Soundboard(1)));
//! ```

pub mod blob;
pub mod device;
pub mod output;
pub mod player;
pub mod probe;
pub mod source;
pub mod timer;

#[cfg(test)]
pub(crate) mod testing;

// Re-export commonly used types
pub use blob::{BlobGuard, BlobStore, BlobUrl, SharedBytes};
pub use device::{DeviceEvent, DeviceSignal, PlaybackDevice};
pub use output::RodioDevice;
pub use player::{DeclineReason, PlayOutcome, PlaybackStatus, SegmentPlayer, PLAYBACK_ERROR_MESSAGE};
pub use source::{AudioSource, AudioSourceManager, SourceId, SourceState, LOAD_ERROR_MESSAGE};
pub use timer::{Scheduler, ThreadScheduler, TimerHandle, TimerToken};
