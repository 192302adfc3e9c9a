/// Application state
///
/// Owns every piece of runtime state and is driven by the event loop on a
/// single thread. Pages request clips through the one `SegmentPlayer`; all
/// outcomes are announced on the notice bus.
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::Sender;
use rand::rngs::StdRng;

use super::navigation::{NavigationState, Page};
use crate::audio_system::{
    AudioSourceManager, DeviceEvent, DeviceSignal, PlayOutcome, PlaybackDevice, Scheduler,
    SegmentPlayer, TimerToken, PLAYBACK_ERROR_MESSAGE,
};
use crate::clips::{self, ChatSound, ClipId};
use crate::error::PageError;
use crate::messaging::{
    AppEvent, ChatEvent, Command, EventBus, EventHandler, Flow, Notice, SourceEvent,
    StatusReport,
};
use crate::pages::{
    spawn_turn, ChatMessage, ChatProvider, ChatSession, FudgeFury, SessionId, Soundboard,
    CHAT_ERROR_MESSAGE,
};

/// Request `clip` on the shared player and announce the outcome
fn request_clip<D: PlaybackDevice, S: Scheduler>(
    sources: &AudioSourceManager,
    player: &mut SegmentPlayer<D, S>,
    bus: &EventBus,
    clip: ClipId,
) -> PlayOutcome {
    let outcome = player.play(sources.is_ready(), clips::resolve(clip));
    match outcome {
        PlayOutcome::Started | PlayOutcome::Deferred => {
            bus.publish(Notice::PlaybackStarted { clip });
        }
        PlayOutcome::Rejected => bus.publish(Notice::PlaybackError {
            message: player
                .last_error()
                .unwrap_or(PLAYBACK_ERROR_MESSAGE)
                .to_string(),
        }),
        PlayOutcome::Declined(reason) => {
            tracing::trace!("{} not played: {:?}", clip, reason);
        }
    }
    outcome
}

/// Chat backend plus the framing sent with every turn
struct ChatBackend {
    provider: Arc<dyn ChatProvider>,
    system_instruction: String,
}

pub struct AppState<D: PlaybackDevice, S: Scheduler> {
    sources: AudioSourceManager,
    player: SegmentPlayer<D, S>,
    navigation: NavigationState,
    soundboard: Soundboard,
    game: FudgeFury<StdRng>,
    chat: Option<ChatSession>,
    chat_backend: Option<ChatBackend>,
    next_session: u64,
    events: Sender<AppEvent>,
    bus: EventBus,
}

impl<D: PlaybackDevice, S: Scheduler> AppState<D, S> {
    pub fn new(
        sources: AudioSourceManager,
        player: SegmentPlayer<D, S>,
        game: FudgeFury<StdRng>,
        events: Sender<AppEvent>,
        bus: EventBus,
    ) -> Self {
        Self {
            sources,
            player,
            navigation: NavigationState::new(),
            soundboard: Soundboard::new(),
            game,
            chat: None,
            chat_backend: None,
            next_session: 1,
            events,
            bus,
        }
    }

    /// Enable the chat page
    pub fn with_chat(
        mut self,
        provider: Arc<dyn ChatProvider>,
        system_instruction: impl Into<String>,
    ) -> Self {
        self.chat_backend = Some(ChatBackend {
            provider,
            system_instruction: system_instruction.into(),
        });
        self
    }

    pub fn handle_command(&mut self, command: Command) -> Flow {
        tracing::debug!("Executing command: {}", command.description());

        let result = match command {
            Command::Navigate(page) => {
                self.navigate(page);
                Ok(())
            }
            Command::LoadAudio { path } => {
                self.load_audio(&path);
                Ok(())
            }
            Command::PlaySoundboard { item } => self.press_soundboard(item),
            Command::StartGame => self.start_game(),
            Command::HitItem { item } => self.hit_item(item),
            Command::SendChat { text } => self.send_chat(&text),
            Command::Status => {
                self.bus.publish(Notice::Status(self.status()));
                Ok(())
            }
            Command::Quit => {
                tracing::info!("Quit command received");
                self.bus.publish(Notice::ShuttingDown);
                return Flow::Exit;
            }
        };

        if let Err(e) = result {
            tracing::debug!("Command rejected: {}", e);
            self.bus.publish(Notice::ErrorOccurred {
                message: e.to_string(),
                context: self.navigation.current().to_string(),
            });
        }
        Flow::Continue
    }

    fn navigate(&mut self, page: Page) {
        let previous = self.navigation.navigate(page);

        if previous == Page::Game && page != Page::Game {
            self.game.reset();
        }
        if previous == Page::Chat && page != Page::Chat {
            if let Some(chat) = self.chat.take() {
                tracing::debug!("Closing {}", chat.id());
            }
        }

        self.bus.publish(Notice::PageChanged {
            page,
            audio_ready: self.sources.is_ready(),
        });

        match page {
            Page::Game => self.bus.publish(Notice::GameUpdated(self.game.snapshot())),
            Page::Chat if previous != Page::Chat => self.open_chat(),
            _ => {}
        }
    }

    fn open_chat(&mut self) {
        let id = SessionId(self.next_session);
        self.next_session += 1;

        let chat = ChatSession::new(id, self.chat_backend.is_some());
        for message in chat.messages() {
            self.bus.publish(Notice::ChatMessage(message.clone()));
        }
        if let Some(error) = chat.error() {
            self.bus.publish(Notice::ChatFailed {
                message: error.to_string(),
            });
        }

        tracing::debug!("Opened {}", id);
        self.chat = Some(chat);
    }

    /// Replace the recording. A read failure keeps the current source.
    pub fn load_audio(&mut self, path: &Path) {
        match self.sources.load_path(path) {
            Ok(source) => {
                self.player.reset();
                self.soundboard.on_playback_idle();
                self.player.device_mut().attach(source);
                self.bus.publish(Notice::SourceLoading {
                    name: source.name().to_string(),
                });
            }
            Err(e) => {
                tracing::error!("Failed to load {}: {}", path.display(), e);
                self.bus.publish(Notice::ErrorOccurred {
                    message: e.to_string(),
                    context: "load".to_string(),
                });
            }
        }
    }

    fn play_clip(&mut self, clip: ClipId) -> PlayOutcome {
        request_clip(&self.sources, &mut self.player, &self.bus, clip)
    }

    fn require_page(&self, page: Page) -> Result<(), PageError> {
        if self.navigation.current() == page {
            Ok(())
        } else {
            Err(PageError::NotOnPage(page.title()))
        }
    }

    fn press_soundboard(&mut self, item: u8) -> Result<(), PageError> {
        self.require_page(Page::Soundboard)?;
        let (sources, player, bus) = (&self.sources, &mut self.player, &self.bus);
        self.soundboard
            .press(item, |clip| request_clip(sources, player, bus, clip))?;
        Ok(())
    }

    fn start_game(&mut self) -> Result<(), PageError> {
        self.require_page(Page::Game)?;
        let sound = self.game.start();
        self.play_clip(ClipId::Game(sound));
        self.bus.publish(Notice::GameUpdated(self.game.snapshot()));
        Ok(())
    }

    fn hit_item(&mut self, item: u64) -> Result<(), PageError> {
        if !self.game.is_active() {
            return Err(PageError::GameNotRunning);
        }
        let sound = self.game.hit(item).ok_or(PageError::UnknownGameItem(item))?;
        self.play_clip(ClipId::Game(sound));
        self.bus.publish(Notice::GameUpdated(self.game.snapshot()));
        Ok(())
    }

    fn send_chat(&mut self, text: &str) -> Result<(), PageError> {
        let chat = self
            .chat
            .as_mut()
            .ok_or(PageError::NotOnPage(Page::Chat.title()))?;
        let request = chat.begin_turn(text)?;

        self.bus
            .publish(Notice::ChatMessage(ChatMessage::user(request.message.clone())));
        // Sessions refuse turns without a backend
        if let Some(backend) = &self.chat_backend {
            spawn_turn(
                Arc::clone(&backend.provider),
                request,
                backend.system_instruction.clone(),
                self.events.clone(),
            );
        }
        self.play_clip(ClipId::Chat(ChatSound::MessageSent));
        Ok(())
    }

    fn on_source_event(&mut self, event: SourceEvent) {
        match event {
            SourceEvent::Ready { id } => {
                if self.sources.on_ready(id) {
                    let name = self
                        .sources
                        .current()
                        .map(|s| s.name().to_string())
                        .unwrap_or_default();
                    self.bus.publish(Notice::SourceReady { name });
                }
            }
            SourceEvent::Failed { id, cause } => {
                if self.sources.on_error(id, &cause) {
                    let message = self.sources.error().unwrap_or_default().to_string();
                    self.bus.publish(Notice::SourceFailed { message });
                }
            }
        }
    }

    fn on_device_signal(&mut self, signal: DeviceSignal) {
        match signal {
            DeviceSignal::TimeUpdate => {
                let position = self.player.device().position();
                self.player
                    .on_device_event(DeviceEvent::PositionUpdate(position));
            }
            DeviceSignal::Paused => {
                // A pause queued before a later restart no longer describes the output
                if !self.player.device().is_paused() {
                    tracing::trace!("Ignoring stale pause signal");
                    return;
                }
                if self.player.on_device_event(DeviceEvent::Paused) {
                    self.soundboard.on_playback_idle();
                    self.bus.publish(Notice::PlaybackFinished);
                }
            }
        }
    }

    fn on_timer(&mut self, token: TimerToken) {
        if let Some(PlayOutcome::Rejected) = self.player.on_timer(token) {
            self.soundboard.on_playback_idle();
            self.bus.publish(Notice::PlaybackError {
                message: self
                    .player
                    .last_error()
                    .unwrap_or(PLAYBACK_ERROR_MESSAGE)
                    .to_string(),
            });
        }
    }

    fn on_chat_event(&mut self, event: ChatEvent) {
        let session = match &event {
            ChatEvent::Fragment { session, .. }
            | ChatEvent::Finished { session, .. }
            | ChatEvent::Failed { session, .. } => *session,
        };
        let Some(chat) = self.chat.as_mut().filter(|c| c.id() == session) else {
            tracing::trace!("Dropping event for closed {}", session);
            return;
        };

        match event {
            ChatEvent::Fragment { turn, text, .. } => {
                if !chat.is_current_turn(turn) {
                    return;
                }
                let first = chat.on_fragment(turn, &text);
                self.bus.publish(Notice::ChatFragment { text });
                if first {
                    self.play_clip(ClipId::Chat(ChatSound::MessageReceived));
                }
            }
            ChatEvent::Finished { turn, .. } => {
                if chat.on_finished(turn) {
                    self.bus.publish(Notice::ChatReplyDone);
                }
            }
            ChatEvent::Failed { turn, cause, .. } => {
                if chat.on_failed(turn, &cause) {
                    self.bus.publish(Notice::ChatFailed {
                        message: CHAT_ERROR_MESSAGE.to_string(),
                    });
                }
            }
        }
    }

    pub fn status(&self) -> StatusReport {
        StatusReport {
            page: self.navigation.current(),
            source: self.sources.state().description().to_string(),
            playback: self.player.status(),
            active_button: self.soundboard.active(),
            playback_error: self.player.last_error().map(str::to_string),
        }
    }

    /// Release the source and stop output
    pub fn shutdown(&mut self) {
        self.player.reset();
        self.player.device_mut().detach();
        self.sources.teardown();
        self.chat = None;
        tracing::info!("App state shut down");
    }

    pub fn sources(&self) -> &AudioSourceManager {
        &self.sources
    }

    pub fn player(&self) -> &SegmentPlayer<D, S> {
        &self.player
    }

    pub fn player_mut(&mut self) -> &mut SegmentPlayer<D, S> {
        &mut self.player
    }

    pub fn page(&self) -> Page {
        self.navigation.current()
    }

    pub fn soundboard(&self) -> &Soundboard {
        &self.soundboard
    }

    pub fn game(&self) -> &FudgeFury<StdRng> {
        &self.game
    }

    pub fn chat(&self) -> Option<&ChatSession> {
        self.chat.as_ref()
    }
}

impl<D: PlaybackDevice, S: Scheduler> EventHandler for AppState<D, S> {
    fn handle_event(&mut self, event: AppEvent) -> Flow {
        match event {
            AppEvent::Command(command) => return self.handle_command(command),
            AppEvent::Source(event) => self.on_source_event(event),
            AppEvent::Device(signal) => self.on_device_signal(signal),
            AppEvent::TimerFired(token) => self.on_timer(token),
            AppEvent::Chat(event) => self.on_chat_event(event),
            AppEvent::Shutdown => return Flow::Exit,
        }
        Flow::Continue
    }

    fn on_frame(&mut self, dt: Duration) {
        if self.navigation.current() != Page::Game || !self.game.is_active() {
            return;
        }

        let visible = |game: &FudgeFury<StdRng>| {
            (
                game.items().len(),
                game.items().last().map(|item| item.id),
                game.time_left().ceil() as u64,
            )
        };

        let before = visible(&self.game);
        let sound = self.game.tick(dt.as_secs_f64());
        if let Some(sound) = sound {
            self.play_clip(ClipId::Game(sound));
        }

        if sound.is_some() || visible(&self.game) != before {
            self.bus.publish(Notice::GameUpdated(self.game.snapshot()));
        }
    }
}
