//! Test doubles for the device and scheduler seams

use std::time::Duration;

use super::device::PlaybackDevice;
use super::source::{AudioSource, SourceId};
use super::timer::{Scheduler, TimerHandle, TimerToken};
use crate::error::AudioError;

#[derive(Debug, Default)]
pub struct FakeDevice {
    pub paused: bool,
    pub position: f64,
    pub attached: Option<SourceId>,
    pub seeks: Vec<f64>,
    pub pauses: usize,
    pub reject_play: bool,
}

impl FakeDevice {
    pub fn idle() -> Self {
        Self {
            paused: true,
            ..Default::default()
        }
    }
}

impl PlaybackDevice for FakeDevice {
    fn attach(&mut self, source: &AudioSource) {
        self.detach();
        self.attached = Some(source.id());
    }

    fn detach(&mut self) {
        self.attached = None;
        self.paused = true;
    }

    fn is_paused(&self) -> bool {
        self.paused
    }

    fn position(&self) -> f64 {
        self.position
    }

    fn seek(&mut self, seconds: f64) -> Result<(), AudioError> {
        self.seeks.push(seconds);
        self.position = seconds;
        Ok(())
    }

    fn play(&mut self) -> Result<(), AudioError> {
        if self.reject_play {
            return Err(AudioError::PlaybackRejected("autoplay blocked".to_string()));
        }
        self.paused = false;
        Ok(())
    }

    fn pause(&mut self) {
        self.pauses += 1;
        self.paused = true;
    }
}

/// Hands out timers that only fire when a test says so
#[derive(Debug, Default)]
pub struct ManualScheduler {
    next: u64,
    pub scheduled: Vec<TimerHandle>,
}

impl Scheduler for ManualScheduler {
    fn schedule(&mut self, _delay: Duration) -> TimerHandle {
        self.next += 1;
        let handle = TimerHandle::new(TimerToken::new(self.next));
        self.scheduled.push(handle.clone());
        handle
    }
}
