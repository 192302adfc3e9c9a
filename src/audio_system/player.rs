/// Segment playback controller
///
/// Plays `[start, end)` sub-clips of the loaded recording on the shared
/// output, one at a time. Stopping is driven by two signals: a position
/// update at or past the boundary pauses the device, and the device's pause
/// notification ends the session. The session therefore clears exactly once
/// per clip whatever stopped it.

use std::time::Duration;

use super::device::{DeviceEvent, PlaybackDevice};
use super::timer::{Scheduler, TimerHandle, TimerToken};
use crate::clips::ClipRange;

/// User-facing message when the output refuses to start
pub const PLAYBACK_ERROR_MESSAGE: &str =
    "Could not play audio. User interaction might be required first.";

/// Default wait between pausing a running output and repositioning it
pub const DEFAULT_RESEEK_DELAY: Duration = Duration::from_millis(50);

/// Where the controller is in a play cycle
#[derive(Debug, Clone, Copy, PartialEq)]
enum PlaybackPhase {
    /// No session
    Idle,

    /// The output was still running; it has been paused and `clip` starts
    /// when timer `token` fires
    Reseeking { clip: ClipRange, token: TimerToken },

    /// Playing until the position reaches `boundary`
    Playing { boundary: f64 },
}

/// Coarse status for consumers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackStatus {
    Idle,
    Transitioning,
    Playing,
}

/// Why a play request was declined
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclineReason {
    SourceNotReady,
    Busy,
}

/// Result of a play request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayOutcome {
    /// Seeked and started immediately
    Started,

    /// Output paused; seek and play follow after the reseek delay
    Deferred,

    /// Precondition not met; nothing happened
    Declined(DeclineReason),

    /// Output refused to start; see [`SegmentPlayer::last_error`]
    Rejected,
}

impl PlayOutcome {
    /// True when the request will (or did) produce sound
    pub fn is_accepted(&self) -> bool {
        matches!(self, PlayOutcome::Started | PlayOutcome::Deferred)
    }
}

/// Serializes clip playback on one output
pub struct SegmentPlayer<D: PlaybackDevice, S: Scheduler> {
    device: D,
    scheduler: S,
    phase: PlaybackPhase,
    pending: Option<TimerHandle>,
    reseek_delay: Duration,
    last_error: Option<String>,
}

impl<D: PlaybackDevice, S: Scheduler> SegmentPlayer<D, S> {
    pub fn new(device: D, scheduler: S) -> Self {
        Self::with_reseek_delay(device, scheduler, DEFAULT_RESEEK_DELAY)
    }

    pub fn with_reseek_delay(device: D, scheduler: S, reseek_delay: Duration) -> Self {
        Self {
            device,
            scheduler,
            phase: PlaybackPhase::Idle,
            pending: None,
            reseek_delay,
            last_error: None,
        }
    }

    /// Request playback of `clip`.
    ///
    /// Declines silently when the source is not ready or a session is live;
    /// requests are never queued and never interrupt the clip in flight.
    pub fn play(&mut self, source_ready: bool, clip: ClipRange) -> PlayOutcome {
        if !source_ready {
            tracing::trace!("Play {} declined: source not ready", clip);
            return PlayOutcome::Declined(DeclineReason::SourceNotReady);
        }

        if self.is_playing() {
            tracing::trace!("Play {} declined: {:?}", clip, self.phase);
            return PlayOutcome::Declined(DeclineReason::Busy);
        }

        if !self.device.is_paused() {
            // Seeking a running output can be ignored; let the pause land first.
            self.device.pause();
            let handle = self.scheduler.schedule(self.reseek_delay);
            tracing::debug!(
                "Output still running, deferring {} by {:?}",
                clip,
                self.reseek_delay
            );
            self.phase = PlaybackPhase::Reseeking {
                clip,
                token: handle.token(),
            };
            self.pending = Some(handle);
            return PlayOutcome::Deferred;
        }

        self.start(clip)
    }

    fn start(&mut self, clip: ClipRange) -> PlayOutcome {
        let result = self
            .device
            .seek(clip.start)
            .and_then(|_| self.device.play());

        match result {
            Ok(()) => {
                tracing::debug!("Playing {}", clip);
                self.phase = PlaybackPhase::Playing { boundary: clip.end };
                self.last_error = None;
                PlayOutcome::Started
            }
            Err(e) => {
                tracing::error!("Audio playback failed: {}", e);
                self.phase = PlaybackPhase::Idle;
                self.last_error = Some(PLAYBACK_ERROR_MESSAGE.to_string());
                PlayOutcome::Rejected
            }
        }
    }

    /// A scheduled reseek timer fired
    pub fn on_timer(&mut self, token: TimerToken) -> Option<PlayOutcome> {
        match self.phase {
            PlaybackPhase::Reseeking { clip, token: pending } if pending == token => {
                self.pending = None;
                Some(self.start(clip))
            }
            _ => {
                tracing::trace!("Ignoring stale timer {:?}", token);
                None
            }
        }
    }

    /// Feed a device notification. Returns true when a session just ended.
    pub fn on_device_event(&mut self, event: DeviceEvent) -> bool {
        match (event, self.phase) {
            (DeviceEvent::PositionUpdate(position), PlaybackPhase::Playing { boundary }) => {
                if position >= boundary {
                    tracing::trace!("Reached boundary {:.3}s at {:.3}s", boundary, position);
                    self.device.pause();
                }
                false
            }
            (DeviceEvent::Paused, PlaybackPhase::Playing { .. }) => {
                tracing::debug!("Playback finished");
                self.phase = PlaybackPhase::Idle;
                true
            }
            // Our own pre-seek pause; the pending clip still owns the session.
            (DeviceEvent::Paused, PlaybackPhase::Reseeking { .. }) => false,
            _ => false,
        }
    }

    /// Drop any session and pending reseek, e.g. when the source is replaced
    pub fn reset(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.cancel();
        }
        if self.phase != PlaybackPhase::Idle {
            tracing::debug!("Resetting playback from {:?}", self.phase);
        }
        self.phase = PlaybackPhase::Idle;
    }

    pub fn is_playing(&self) -> bool {
        self.phase != PlaybackPhase::Idle
    }

    pub fn status(&self) -> PlaybackStatus {
        match self.phase {
            PlaybackPhase::Idle => PlaybackStatus::Idle,
            PlaybackPhase::Reseeking { .. } => PlaybackStatus::Transitioning,
            PlaybackPhase::Playing { .. } => PlaybackStatus::Playing,
        }
    }

    /// Active stop position, if a clip is playing
    pub fn boundary(&self) -> Option<f64> {
        match self.phase {
            PlaybackPhase::Playing { boundary } => Some(boundary),
            _ => None,
        }
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }
}

impl<D: PlaybackDevice, S: Scheduler> Drop for SegmentPlayer<D, S> {
    fn drop(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio_system::testing::{FakeDevice, ManualScheduler};

    const CLIP: ClipRange = ClipRange::new(1.88, 3.943);
    const OTHER: ClipRange = ClipRange::new(6.106, 6.647);

    fn player() -> SegmentPlayer<FakeDevice, ManualScheduler> {
        SegmentPlayer::new(FakeDevice::idle(), ManualScheduler::default())
    }

    #[test]
    fn test_not_ready_is_silent_noop() {
        let mut player = player();
        let outcome = player.play(false, CLIP);

        assert_eq!(outcome, PlayOutcome::Declined(DeclineReason::SourceNotReady));
        assert!(player.device().seeks.is_empty());
        assert!(player.last_error().is_none());
        assert!(!player.is_playing());
    }

    #[test]
    fn test_play_seeks_and_sets_boundary() {
        let mut player = player();
        assert_eq!(player.play(true, CLIP), PlayOutcome::Started);

        assert_eq!(player.device().seeks, vec![1.88]);
        assert!(!player.device().is_paused());
        assert_eq!(player.boundary(), Some(3.943));
        assert_eq!(player.status(), PlaybackStatus::Playing);
    }

    #[test]
    fn test_boundary_pauses_then_pause_clears() {
        let mut player = player();
        player.play(true, CLIP);

        assert!(!player.on_device_event(DeviceEvent::PositionUpdate(3.0)));
        assert_eq!(player.device().pauses, 0);

        assert!(!player.on_device_event(DeviceEvent::PositionUpdate(3.95)));
        assert_eq!(player.device().pauses, 1);
        // Still busy until the pause notification arrives
        assert!(player.is_playing());

        assert!(player.on_device_event(DeviceEvent::Paused));
        assert!(!player.is_playing());
        assert_eq!(player.boundary(), None);
    }

    #[test]
    fn test_busy_declines_without_touching_device() {
        let mut player = player();
        player.play(true, CLIP);

        let outcome = player.play(true, OTHER);
        assert_eq!(outcome, PlayOutcome::Declined(DeclineReason::Busy));
        assert_eq!(player.device().seeks, vec![1.88]);
        assert_eq!(player.boundary(), Some(3.943));
    }

    #[test]
    fn test_external_pause_clears_session() {
        let mut player = player();
        player.play(true, CLIP);
        player.device_mut().pause();
        assert!(player.on_device_event(DeviceEvent::Paused));
        assert_eq!(player.play(true, OTHER), PlayOutcome::Started);
    }

    #[test]
    fn test_running_device_defers_until_timer() {
        let mut device = FakeDevice::idle();
        device.paused = false;
        let mut player = SegmentPlayer::new(device, ManualScheduler::default());

        assert_eq!(player.play(true, CLIP), PlayOutcome::Deferred);
        assert_eq!(player.device().pauses, 1);
        assert!(player.device().seeks.is_empty());
        assert_eq!(player.status(), PlaybackStatus::Transitioning);
        assert!(player.is_playing());

        // Our own pause notification must not cancel the pending clip
        assert!(!player.on_device_event(DeviceEvent::Paused));
        assert_eq!(player.play(true, OTHER), PlayOutcome::Declined(DeclineReason::Busy));

        let token = player.scheduler.scheduled[0].token();
        assert_eq!(player.on_timer(token), Some(PlayOutcome::Started));
        assert_eq!(player.device().seeks, vec![1.88]);
        assert_eq!(player.boundary(), Some(3.943));
    }

    #[test]
    fn test_stale_timer_is_ignored() {
        let mut player = player();
        assert_eq!(player.on_timer(TimerToken::new(99)), None);
        assert!(!player.is_playing());
    }

    #[test]
    fn test_reset_cancels_pending_reseek() {
        let mut device = FakeDevice::idle();
        device.paused = false;
        let mut player = SegmentPlayer::new(device, ManualScheduler::default());
        player.play(true, CLIP);

        let handle = player.scheduler.scheduled[0].clone();
        player.reset();
        assert!(handle.is_cancelled());
        assert_eq!(player.on_timer(handle.token()), None);
        assert!(player.device().seeks.is_empty());
    }

    #[test]
    fn test_rejection_sets_message_and_stays_usable() {
        let mut device = FakeDevice::idle();
        device.reject_play = true;
        let mut player = SegmentPlayer::new(device, ManualScheduler::default());

        assert_eq!(player.play(true, CLIP), PlayOutcome::Rejected);
        assert_eq!(player.last_error(), Some(PLAYBACK_ERROR_MESSAGE));
        assert!(!player.is_playing());

        player.device_mut().reject_play = false;
        assert_eq!(player.play(true, CLIP), PlayOutcome::Started);
        assert!(player.last_error().is_none());
    }

    #[test]
    fn test_position_while_idle_is_ignored() {
        let mut player = player();
        assert!(!player.on_device_event(DeviceEvent::PositionUpdate(100.0)));
        assert_eq!(player.device().pauses, 0);
    }
}
