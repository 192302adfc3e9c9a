/// One-shot cancellable timers
///
/// Used for the short wait between pausing a running output and
/// repositioning it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{after, never, select, unbounded, Receiver, Sender};

use crate::messaging::AppEvent;

/// Identity of a scheduled timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerToken(u64);

impl TimerToken {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }
}

/// Handle to a scheduled timer
#[derive(Debug, Clone)]
pub struct TimerHandle {
    token: TimerToken,
    cancelled: Arc<AtomicBool>,
}

impl TimerHandle {
    pub fn new(token: TimerToken) -> Self {
        Self {
            token,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn token(&self) -> TimerToken {
        self.token
    }

    /// Prevent the timer from firing. Safe to call after it fired.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Source of one-shot timers that report back as [`AppEvent::TimerFired`]
pub trait Scheduler {
    fn schedule(&mut self, delay: Duration) -> TimerHandle;
}

struct Pending {
    due: Instant,
    handle: TimerHandle,
}

/// Scheduler backed by one timer thread.
///
/// The thread waits on `after` for the earliest deadline and exits when the
/// scheduler is dropped; timers that have not fired by then are discarded.
pub struct ThreadScheduler {
    requests: Sender<Pending>,
    next_token: u64,
}

impl ThreadScheduler {
    pub fn new(events: Sender<AppEvent>) -> Self {
        let (requests, incoming) = unbounded();
        thread::spawn(move || run_timers(incoming, events));
        Self {
            requests,
            next_token: 1,
        }
    }
}

impl Scheduler for ThreadScheduler {
    fn schedule(&mut self, delay: Duration) -> TimerHandle {
        let handle = TimerHandle::new(TimerToken(self.next_token));
        self.next_token += 1;

        let pending = Pending {
            due: Instant::now() + delay,
            handle: handle.clone(),
        };
        if self.requests.send(pending).is_err() {
            tracing::warn!("Timer thread is gone; {:?} will not fire", handle.token());
        }

        handle
    }
}

fn run_timers(incoming: Receiver<Pending>, events: Sender<AppEvent>) {
    let mut pending: Vec<Pending> = Vec::new();

    loop {
        let wake = match pending.iter().map(|p| p.due).min() {
            Some(due) => after(due.saturating_duration_since(Instant::now())),
            None => never(),
        };

        select! {
            recv(incoming) -> request => match request {
                Ok(request) => pending.push(request),
                Err(_) => break,
            },
            recv(wake) -> _ => {
                let now = Instant::now();
                pending.retain(|p| {
                    if p.due > now {
                        return true;
                    }
                    if !p.handle.is_cancelled() {
                        let _ = events.send(AppEvent::TimerFired(p.handle.token()));
                    }
                    false
                });
            }
        }
    }

    tracing::trace!("Timer thread stopped");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thread_scheduler_fires() {
        let (tx, rx) = unbounded();
        let mut scheduler = ThreadScheduler::new(tx);

        let handle = scheduler.schedule(Duration::from_millis(5));
        match rx.recv_timeout(Duration::from_secs(2)) {
            Ok(AppEvent::TimerFired(token)) => assert_eq!(token, handle.token()),
            other => panic!("expected timer event, got {:?}", other),
        }
    }

    #[test]
    fn test_cancelled_timer_does_not_fire() {
        let (tx, rx) = unbounded();
        let mut scheduler = ThreadScheduler::new(tx);

        let handle = scheduler.schedule(Duration::from_millis(20));
        handle.cancel();
        assert!(handle.is_cancelled());
        assert!(rx.recv_timeout(Duration::from_millis(200)).is_err());
    }

    #[test]
    fn test_timers_fire_in_deadline_order() {
        let (tx, rx) = unbounded();
        let mut scheduler = ThreadScheduler::new(tx);

        let late = scheduler.schedule(Duration::from_millis(60));
        let early = scheduler.schedule(Duration::from_millis(5));

        let mut fired = Vec::new();
        while let Ok(AppEvent::TimerFired(token)) = rx.recv_timeout(Duration::from_secs(2)) {
            fired.push(token);
            if fired.len() == 2 {
                break;
            }
        }
        assert_eq!(fired, vec![early.token(), late.token()]);
    }

    #[test]
    fn test_tokens_are_distinct() {
        let (tx, _rx) = unbounded();
        let mut scheduler = ThreadScheduler::new(tx);
        let a = scheduler.schedule(Duration::from_secs(10));
        let b = scheduler.schedule(Duration::from_secs(10));
        a.cancel();
        b.cancel();
        assert_ne!(a.token(), b.token());
    }
}
