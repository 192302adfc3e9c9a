/// Playback device seam
///
/// The one shared audio output, modelled as an injected object so the
/// segment controller can be driven by a fake in tests.

use super::source::AudioSource;
use crate::error::AudioError;

/// Device notifications as seen by the segment controller
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DeviceEvent {
    /// Playback position moved (seconds into the recording)
    PositionUpdate(f64),

    /// Playback paused, for whatever reason
    Paused,
}

/// Raw signals posted by a device from its own thread.
///
/// `TimeUpdate` carries no position: the loop samples the device when it
/// handles the signal, so a tick queued before a seek never reports a
/// pre-seek position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceSignal {
    TimeUpdate,
    Paused,
}

/// A single audio output
pub trait PlaybackDevice {
    /// Point the output at a new source. Readiness (or failure) is reported
    /// asynchronously, tagged with the source id.
    fn attach(&mut self, source: &AudioSource);

    /// Drop the current source and stop output
    fn detach(&mut self);

    /// True when nothing is being played
    fn is_paused(&self) -> bool;

    /// Current playback position in seconds
    fn position(&self) -> f64;

    fn seek(&mut self, seconds: f64) -> Result<(), AudioError>;

    fn play(&mut self) -> Result<(), AudioError>;

    /// Pause output; a device reports `Paused` afterwards if it was running
    fn pause(&mut self);
}
