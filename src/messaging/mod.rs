/// Messaging module for the event loop
///
/// - **AppEvent**: everything posted to the loop (commands, device signals,
///   timers, probe results, chat progress)
/// - **Command**: user requests, carried inside `AppEvent::Command`
/// - **Notice**: what happened, broadcast to renderers
///
/// ## Architecture
///
/// ```text
/// ┌────────────┐               ┌───────────┐   Notice   ┌─────────────┐
/// │ stdin      │──┐            │           │ ─────────> │  Event Bus  │
/// │ audio thr. │──┤  AppEvent  │ EventLoop │            └─────────────┘
/// │ timers     │──┼──────────> │ (AppState)│                   │
/// │ probe      │──┤            │           │                   ▼
/// │ chat       │──┘            └───────────┘              ┌──────────┐
/// └────────────┘                                          │ Renderer │
///                                                         └──────────┘
/// ```
///
/// ## Usage
///
/// ```rust,ignore
/// let event_loop = EventLoop::new(Duration::from_millis(33));
/// let (notices, _id) = bus.subscribe();
///
/// event_loop.sender().send(AppEvent::Command(Command::StartGame))?;
/// event_loop.run(&mut app);
/// ```

pub mod bus;
pub mod commands;
pub mod events;
pub mod executor;

// Re-export commonly used types
pub use bus::{EventBus, SubscriberId};
pub use commands::Command;
pub use events::{AppEvent, ChatEvent, Notice, SourceEvent, StatusReport};
pub use executor::{EventHandler, EventLoop, Flow};
