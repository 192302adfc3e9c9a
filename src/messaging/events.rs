/// Event types for the application
///
/// [`AppEvent`]s flow into the event loop from worker threads and input.
/// [`Notice`]s flow out of it to whoever renders the app.
use crate::audio_system::{DeviceSignal, PlaybackStatus, SourceId, TimerToken};
use crate::clips::ClipId;
use crate::pages::{ChatMessage, GameSnapshot, SessionId, TurnId};
use crate::state::Page;

use super::commands::Command;

/// Everything the event loop reacts to
#[derive(Debug, Clone)]
pub enum AppEvent {
    /// A user request
    Command(Command),

    /// Decode probe finished for a source
    Source(SourceEvent),

    /// The output reported progress or a pause
    Device(DeviceSignal),

    /// A reseek timer elapsed
    TimerFired(TimerToken),

    /// A chat worker made progress
    Chat(ChatEvent),

    /// Stop the loop without further processing
    Shutdown,
}

/// Readiness outcome for one loaded source
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceEvent {
    Ready { id: SourceId },
    Failed { id: SourceId, cause: String },
}

/// Progress of one chat turn
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatEvent {
    Fragment {
        session: SessionId,
        turn: TurnId,
        text: String,
    },
    Finished {
        session: SessionId,
        turn: TurnId,
    },
    Failed {
        session: SessionId,
        turn: TurnId,
        cause: String,
    },
}

/// Things that happened, for the renderer
#[derive(Debug, Clone)]
pub enum Notice {
    /// The visible page changed; `audio_ready` tells whether its controls work
    PageChanged { page: Page, audio_ready: bool },

    SourceLoading { name: String },

    SourceReady { name: String },

    SourceFailed { message: String },

    PlaybackStarted { clip: ClipId },

    PlaybackFinished,

    PlaybackError { message: String },

    /// Game state after a start, hit or visible change
    GameUpdated(GameSnapshot),

    /// A complete message entered the transcript
    ChatMessage(ChatMessage),

    /// Text appended to the reply being streamed
    ChatFragment { text: String },

    /// The streamed reply is complete
    ChatReplyDone,

    ChatFailed { message: String },

    Status(StatusReport),

    /// A request could not be carried out
    ErrorOccurred { message: String, context: String },

    ShuttingDown,
}

/// Answer to the `status` command
#[derive(Debug, Clone, PartialEq)]
pub struct StatusReport {
    pub page: Page,
    pub source: String,
    pub playback: PlaybackStatus,
    pub active_button: Option<u8>,
    pub playback_error: Option<String>,
}

impl Notice {
    /// Get a human-readable description of the notice
    pub fn description(&self) -> String {
        match self {
            Notice::PageChanged { page, .. } => format!("Page changed: {}", page),
            Notice::SourceLoading { name } => format!("Loading audio: {}", name),
            Notice::SourceReady { name } => format!("Audio ready: {}", name),
            Notice::SourceFailed { message } => format!("Audio failed: {}", message),
            Notice::PlaybackStarted { clip } => format!("Playing {}", clip),
            Notice::PlaybackFinished => "Playback finished".to_string(),
            Notice::PlaybackError { message } => format!("Playback error: {}", message),
            Notice::GameUpdated(snapshot) => {
                format!("Game: score {} with {:.0}s left", snapshot.score, snapshot.time_left)
            }
            Notice::ChatMessage(message) => format!("Chat message ({:?})", message.role),
            Notice::ChatFragment { text } => format!("Chat fragment ({} bytes)", text.len()),
            Notice::ChatReplyDone => "Chat reply complete".to_string(),
            Notice::ChatFailed { message } => format!("Chat failed: {}", message),
            Notice::Status(report) => format!("Status on {}", report.page),
            Notice::ErrorOccurred { message, .. } => format!("Error: {}", message),
            Notice::ShuttingDown => "Shutting down".to_string(),
        }
    }
}

impl AppEvent {
    /// Short label for logs
    pub fn description(&self) -> String {
        match self {
            AppEvent::Command(command) => command.description(),
            AppEvent::Source(SourceEvent::Ready { id }) => format!("{} ready", id),
            AppEvent::Source(SourceEvent::Failed { id, .. }) => format!("{} failed", id),
            AppEvent::Device(signal) => format!("Device {:?}", signal),
            AppEvent::TimerFired(token) => format!("Timer {:?} fired", token),
            AppEvent::Chat(ChatEvent::Fragment { session, .. }) => {
                format!("{} fragment", session)
            }
            AppEvent::Chat(ChatEvent::Finished { session, .. }) => {
                format!("{} finished", session)
            }
            AppEvent::Chat(ChatEvent::Failed { session, .. }) => format!("{} failed", session),
            AppEvent::Shutdown => "Shutdown".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clips::GameSound;

    #[test]
    fn test_notice_description() {
        let notice = Notice::PlaybackStarted {
            clip: ClipId::Game(GameSound::Start),
        };
        assert_eq!(notice.description(), "Playing game Start");

        let notice = Notice::PageChanged {
            page: Page::Soundboard,
            audio_ready: false,
        };
        assert_eq!(notice.description(), "Page changed: Soundboard");
    }

    #[test]
    fn test_event_description() {
        let event = AppEvent::Source(SourceEvent::Ready { id: SourceId::new(3) });
        assert_eq!(event.description(), "source#3 ready");
        assert_eq!(AppEvent::Shutdown.description(), "Shutdown");
    }
}
