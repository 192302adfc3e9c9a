/// Event loop
///
/// Owns the inbound channel and drives one handler on the calling thread:
/// every event and every frame tick is handled in arrival order, so the
/// handler's state needs no locks.
use std::time::{Duration, Instant};

use crossbeam_channel::{select, tick, unbounded, Receiver, Sender};

use super::events::AppEvent;

/// Whether the loop keeps going after an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// Something the loop can drive
pub trait EventHandler {
    fn handle_event(&mut self, event: AppEvent) -> Flow;

    /// Called once per frame with the time since the previous frame
    fn on_frame(&mut self, dt: Duration);
}

pub struct EventLoop {
    events_tx: Sender<AppEvent>,
    events_rx: Receiver<AppEvent>,
    frame_interval: Duration,
}

impl EventLoop {
    pub fn new(frame_interval: Duration) -> Self {
        let (tx, rx) = unbounded();
        Self {
            events_tx: tx,
            events_rx: rx,
            frame_interval,
        }
    }

    /// Get a sender for posting events
    pub fn sender(&self) -> Sender<AppEvent> {
        self.events_tx.clone()
    }

    /// Run until the handler asks to exit
    pub fn run<H: EventHandler>(&self, handler: &mut H) {
        tracing::info!("Event loop started (frame every {:?})", self.frame_interval);

        let ticker = tick(self.frame_interval);
        let mut last_frame = Instant::now();

        loop {
            select! {
                recv(self.events_rx) -> event => {
                    // We hold a sender ourselves, so this never disconnects.
                    let Ok(event) = event else { break };
                    tracing::trace!("Event: {}", event.description());
                    if handler.handle_event(event) == Flow::Exit {
                        break;
                    }
                }
                recv(ticker) -> now => {
                    if let Ok(now) = now {
                        handler.on_frame(now.saturating_duration_since(last_frame));
                        last_frame = now;
                    }
                }
            }
        }

        tracing::info!("Event loop stopped");
    }

    /// Handle every event already queued, without frames. Returns how many
    /// were handled.
    pub fn drain<H: EventHandler>(&self, handler: &mut H) -> usize {
        let mut handled = 0;
        while let Ok(event) = self.events_rx.try_recv() {
            handled += 1;
            if handler.handle_event(event) == Flow::Exit {
                break;
            }
        }
        handled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messaging::Command;

    #[derive(Default)]
    struct Recorder {
        events: Vec<String>,
        frames: usize,
    }

    impl EventHandler for Recorder {
        fn handle_event(&mut self, event: AppEvent) -> Flow {
            let exit = matches!(event, AppEvent::Command(Command::Quit) | AppEvent::Shutdown);
            self.events.push(event.description());
            if exit {
                Flow::Exit
            } else {
                Flow::Continue
            }
        }

        fn on_frame(&mut self, _dt: Duration) {
            self.frames += 1;
        }
    }

    #[test]
    fn test_run_handles_in_order_until_exit() {
        let event_loop = EventLoop::new(Duration::from_millis(5));
        let sender = event_loop.sender();
        sender.send(AppEvent::Command(Command::StartGame)).unwrap();
        sender.send(AppEvent::Command(Command::Quit)).unwrap();
        sender.send(AppEvent::Command(Command::Status)).unwrap();

        let mut recorder = Recorder::default();
        event_loop.run(&mut recorder);

        assert_eq!(recorder.events, vec!["Start game", "Quit application"]);
    }

    #[test]
    fn test_frames_tick_while_idle() {
        let event_loop = EventLoop::new(Duration::from_millis(2));
        let sender = event_loop.sender();
        std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(60));
            let _ = sender.send(AppEvent::Shutdown);
        });

        let mut recorder = Recorder::default();
        event_loop.run(&mut recorder);
        assert!(recorder.frames > 0);
    }

    #[test]
    fn test_drain_stops_at_exit() {
        let event_loop = EventLoop::new(Duration::from_millis(5));
        let sender = event_loop.sender();
        sender.send(AppEvent::Command(Command::Status)).unwrap();
        sender.send(AppEvent::Shutdown).unwrap();
        sender.send(AppEvent::Command(Command::Status)).unwrap();

        let mut recorder = Recorder::default();
        assert_eq!(event_loop.drain(&mut recorder), 2);
        assert_eq!(event_loop.drain(&mut recorder), 1);
    }
}
