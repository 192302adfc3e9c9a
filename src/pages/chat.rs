/// DM Slide: a streamed conversation with the Fudge Judge
///
/// The session owns the visible transcript. A turn appends the user's line
/// and an empty model reply that fragments grow in place; a failed turn
/// removes that reply again.
use std::fmt;
use std::sync::Arc;
use std::thread;

use crossbeam_channel::Sender;
use serde::{Deserialize, Serialize};

use crate::error::{ChatError, PageError};
use crate::messaging::{AppEvent, ChatEvent};

pub const GREETING: &str = "Call the judge... get some fudge? Are you... a doctor?";
pub const CHAT_ERROR_MESSAGE: &str = "PARDON?! Something went wrong. I'm confused!";
pub const CHAT_UNAVAILABLE_MESSAGE: &str =
    "PARDON?! Couldn't connect to the Fudge Judge. Check your connection or the console.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub text: String,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: Role::Model,
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "chat#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TurnId(pub u64);

/// Lazy, finite stream of reply fragments
pub type FragmentStream = Box<dyn Iterator<Item = Result<String, ChatError>> + Send>;

/// A conversational backend
pub trait ChatProvider: Send + Sync {
    /// Send `message` after `history` and stream the reply.
    fn send_message_stream(
        &self,
        history: &[ChatMessage],
        message: &str,
        system_instruction: &str,
    ) -> Result<FragmentStream, ChatError>;
}

/// Everything a worker needs to run one turn
#[derive(Debug, Clone)]
pub struct TurnRequest {
    pub session: SessionId,
    pub turn: TurnId,
    pub history: Vec<ChatMessage>,
    pub message: String,
}

#[derive(Debug, Clone, Copy)]
struct InFlight {
    turn: TurnId,
    received: bool,
}

pub struct ChatSession {
    id: SessionId,
    messages: Vec<ChatMessage>,
    /// Completed exchanges only; failed turns never reach the provider
    history: Vec<ChatMessage>,
    in_flight: Option<InFlight>,
    next_turn: u64,
    available: bool,
    error: Option<String>,
}

impl ChatSession {
    /// New session opened with the greeting. Without a provider the session
    /// shows the connection message and refuses turns.
    pub fn new(id: SessionId, available: bool) -> Self {
        Self {
            id,
            messages: vec![ChatMessage::model(GREETING)],
            history: Vec::new(),
            in_flight: None,
            next_turn: 1,
            available,
            error: (!available).then(|| CHAT_UNAVAILABLE_MESSAGE.to_string()),
        }
    }

    /// Start a turn for `text`.
    ///
    /// The returned request carries the completed exchanges before this
    /// turn, without the local greeting.
    pub fn begin_turn(&mut self, text: &str) -> Result<TurnRequest, PageError> {
        if !self.available {
            return Err(PageError::ChatUnavailable(CHAT_UNAVAILABLE_MESSAGE.to_string()));
        }
        if self.in_flight.is_some() {
            return Err(PageError::ChatBusy);
        }
        let text = text.trim();
        if text.is_empty() {
            return Err(PageError::EmptyMessage);
        }

        let history = self.history.clone();
        let turn = TurnId(self.next_turn);
        self.next_turn += 1;

        self.error = None;
        self.messages.push(ChatMessage::user(text));
        self.messages.push(ChatMessage::model(String::new()));
        self.in_flight = Some(InFlight {
            turn,
            received: false,
        });

        Ok(TurnRequest {
            session: self.id,
            turn,
            history,
            message: text.to_string(),
        })
    }

    /// Append a fragment to the pending reply.
    ///
    /// Returns true only for the first fragment of the turn.
    pub fn on_fragment(&mut self, turn: TurnId, text: &str) -> bool {
        let Some(in_flight) = self.in_flight.as_mut().filter(|f| f.turn == turn) else {
            tracing::trace!("Dropping fragment for stale turn {:?}", turn);
            return false;
        };

        if let Some(reply) = self.messages.last_mut() {
            reply.text.push_str(text);
        }

        let first = !in_flight.received;
        in_flight.received = true;
        first
    }

    /// Complete the turn and commit the exchange to the provider history
    pub fn on_finished(&mut self, turn: TurnId) -> bool {
        if !self.is_current_turn(turn) {
            return false;
        }
        self.in_flight = None;
        if let [.., user, reply] = self.messages.as_slice() {
            self.history.push(user.clone());
            self.history.push(reply.clone());
        }
        true
    }

    /// Roll back the pending reply and show the failure message
    pub fn on_failed(&mut self, turn: TurnId, cause: &str) -> bool {
        if !self.is_current_turn(turn) {
            return false;
        }
        tracing::error!("Chat turn failed in {}: {}", self.id, cause);
        self.messages.pop();
        self.in_flight = None;
        self.error = Some(CHAT_ERROR_MESSAGE.to_string());
        true
    }

    /// True when `turn` is the one in flight
    pub fn is_current_turn(&self, turn: TurnId) -> bool {
        self.in_flight.map(|f| f.turn) == Some(turn)
    }

    /// Transcript as shown, greeting included
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Exchanges sent to the provider with the next turn
    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn is_waiting(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

/// Run a turn on a worker thread, posting its fragments to the event loop
pub fn spawn_turn(
    provider: Arc<dyn ChatProvider>,
    request: TurnRequest,
    system_instruction: String,
    events: Sender<AppEvent>,
) {
    thread::spawn(move || {
        let TurnRequest {
            session,
            turn,
            history,
            message,
        } = request;

        let failed = |cause: String| AppEvent::Chat(ChatEvent::Failed {
            session,
            turn,
            cause,
        });

        let stream = match provider.send_message_stream(&history, &message, &system_instruction)
        {
            Ok(stream) => stream,
            Err(e) => {
                let _ = events.send(failed(e.to_string()));
                return;
            }
        };

        for fragment in stream {
            let event = match fragment {
                Ok(text) => AppEvent::Chat(ChatEvent::Fragment {
                    session,
                    turn,
                    text,
                }),
                Err(e) => {
                    let _ = events.send(failed(e.to_string()));
                    return;
                }
            };
            if events.send(event).is_err() {
                // Event loop is gone
                return;
            }
        }

        let _ = events.send(AppEvent::Chat(ChatEvent::Finished { session, turn }));
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn session() -> ChatSession {
        ChatSession::new(SessionId(1), true)
    }

    #[test]
    fn test_new_session_greets() {
        let chat = session();
        assert_eq!(chat.messages(), &[ChatMessage::model(GREETING)]);
        assert!(chat.history().is_empty());
        assert!(chat.error().is_none());
    }

    #[test]
    fn test_unavailable_session_refuses_turns() {
        let mut chat = ChatSession::new(SessionId(1), false);
        assert_eq!(chat.error(), Some(CHAT_UNAVAILABLE_MESSAGE));
        assert!(matches!(
            chat.begin_turn("hello"),
            Err(PageError::ChatUnavailable(_))
        ));
        assert_eq!(chat.messages().len(), 1);
    }

    #[test]
    fn test_blank_and_busy_are_rejected() {
        let mut chat = session();
        assert_eq!(chat.begin_turn("   ").unwrap_err(), PageError::EmptyMessage);

        chat.begin_turn("are you okay?").unwrap();
        assert_eq!(chat.begin_turn("hello?").unwrap_err(), PageError::ChatBusy);
    }

    #[test]
    fn test_first_fragment_only_is_reported() {
        let mut chat = session();
        let request = chat.begin_turn("are you a doctor?").unwrap();
        assert_eq!(request.message, "are you a doctor?");
        assert!(request.history.is_empty());

        assert!(chat.on_fragment(request.turn, "Nope"));
        assert!(!chat.on_fragment(request.turn, ". PARDON"));
        assert!(!chat.on_fragment(request.turn, "?!"));
        assert!(chat.on_finished(request.turn));

        assert_eq!(chat.messages().last().unwrap().text, "Nope. PARDON?!");
        assert!(!chat.is_waiting());
    }

    #[test]
    fn test_empty_first_fragment_counts_as_received() {
        let mut chat = session();
        let request = chat.begin_turn("are you okay?").unwrap();

        assert!(chat.on_fragment(request.turn, ""));
        assert!(!chat.on_fragment(request.turn, "Nope."));
        assert_eq!(chat.messages().last().unwrap().text, "Nope.");
    }

    #[test]
    fn test_history_excludes_greeting() {
        let mut chat = session();
        let first = chat.begin_turn("hi").unwrap();
        chat.on_fragment(first.turn, "fudge");
        chat.on_finished(first.turn);

        let second = chat.begin_turn("more").unwrap();
        assert_eq!(
            second.history,
            vec![ChatMessage::user("hi"), ChatMessage::model("fudge")]
        );
    }

    #[test]
    fn test_failure_rolls_back_partial_reply() {
        let mut chat = session();
        let request = chat.begin_turn("slide in the DMs").unwrap();
        chat.on_fragment(request.turn, "May");

        assert!(chat.on_failed(request.turn, "connection reset"));
        assert_eq!(
            chat.messages(),
            &[ChatMessage::model(GREETING), ChatMessage::user("slide in the DMs")]
        );
        assert_eq!(chat.error(), Some(CHAT_ERROR_MESSAGE));

        // The next send clears the error
        chat.begin_turn("again").unwrap();
        assert!(chat.error().is_none());
    }

    #[test]
    fn test_failed_turn_is_not_sent_as_history() {
        let mut chat = session();
        let failed = chat.begin_turn("are you a doctor?").unwrap();
        chat.on_failed(failed.turn, "timeout");

        let retry = chat.begin_turn("hello?").unwrap();
        assert!(retry.history.is_empty());
        // Still visible in the transcript
        assert_eq!(chat.messages()[1], ChatMessage::user("are you a doctor?"));

        chat.on_fragment(retry.turn, "Nope.");
        chat.on_finished(retry.turn);
        assert_eq!(
            chat.history(),
            &[ChatMessage::user("hello?"), ChatMessage::model("Nope.")]
        );
    }

    #[test]
    fn test_stale_turn_events_are_ignored() {
        let mut chat = session();
        let request = chat.begin_turn("hi").unwrap();
        chat.on_finished(request.turn);

        assert!(!chat.on_fragment(request.turn, "late"));
        assert!(!chat.on_failed(request.turn, "late"));
        assert_eq!(chat.messages().last().unwrap().text, "");
        assert!(chat.error().is_none());
    }

    struct Scripted(Vec<Result<&'static str, &'static str>>);

    impl ChatProvider for Scripted {
        fn send_message_stream(
            &self,
            _history: &[ChatMessage],
            _message: &str,
            _system_instruction: &str,
        ) -> Result<FragmentStream, ChatError> {
            let items: Vec<_> = self
                .0
                .iter()
                .map(|&item| {
                    item.map(str::to_string)
                        .map_err(|e| ChatError::Service(e.to_string()))
                })
                .collect();
            Ok(Box::new(items.into_iter()))
        }
    }

    fn run(provider: Scripted) -> Vec<ChatEvent> {
        let (tx, rx) = crossbeam_channel::unbounded();
        let mut chat = session();
        let request = chat.begin_turn("hi").unwrap();
        spawn_turn(Arc::new(provider), request, "be the judge".to_string(), tx);

        let mut events = Vec::new();
        while let Ok(AppEvent::Chat(event)) = rx.recv_timeout(Duration::from_secs(2)) {
            events.push(event);
        }
        events
    }

    #[test]
    fn test_worker_streams_then_finishes() {
        let events = run(Scripted(vec![Ok("Call"), Ok(" the"), Ok(" judge")]));
        assert_eq!(events.len(), 4);
        assert!(matches!(&events[0], ChatEvent::Fragment { text, .. } if text == "Call"));
        assert!(matches!(events[3], ChatEvent::Finished { .. }));
    }

    #[test]
    fn test_worker_reports_mid_stream_failure() {
        let events = run(Scripted(vec![Ok("Call"), Err("boom"), Ok("unreached")]));
        assert_eq!(events.len(), 2);
        assert!(matches!(&events[1], ChatEvent::Failed { cause, .. } if cause.contains("boom")));
    }
}
