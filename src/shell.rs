/// Terminal front end
///
/// Lines typed on stdin become commands for the event loop; notices from the
/// bus are rendered as text on stdout.
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, Sender};

use crate::audio_system::PlaybackStatus;
use crate::clips::{self, ChatSound, GameSound, Speaker, SOUNDBOARD_ITEMS};
use crate::error::ShellError;
use crate::messaging::{AppEvent, Command, Notice};
use crate::pages::{GameSnapshot, ItemKind, Role, Soundboard};
use crate::state::Page;

pub const HELP: &str = "\
Commands:
  menu | soundboard (sb) | game | chat   switch page
  load <path>                           load the 'Call the Judge' recording
  play <n>                              press soundboard button n (1-8)
  start                                 start Fudge Fury
  hit <id>                              click a falling item
  say <text>                            send a DM to the Fudge Judge
  status                                show what is going on
  clips                                 list every clip
  help                                  show this help
  quit                                  exit";

/// One parsed line
#[derive(Debug, Clone, PartialEq)]
pub enum ShellInput {
    Command(Command),
    Help,
    Clips,
    Empty,
}

pub fn parse_line(line: &str) -> Result<ShellInput, ShellError> {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    let command = match word.to_ascii_lowercase().as_str() {
        "" => return Ok(ShellInput::Empty),
        "help" | "?" => return Ok(ShellInput::Help),
        "clips" => return Ok(ShellInput::Clips),
        "menu" | "back" => Command::Navigate(Page::Menu),
        "soundboard" | "sb" => Command::Navigate(Page::Soundboard),
        "game" => Command::Navigate(Page::Game),
        "chat" => Command::Navigate(Page::Chat),
        "load" => Command::LoadAudio {
            path: PathBuf::from(required(rest, "load", "a file path")?),
        },
        "play" => Command::PlaySoundboard {
            item: number(required(rest, "play", "a button number")?)?,
        },
        "start" => Command::StartGame,
        "hit" => Command::HitItem {
            item: number(required(rest, "hit", "an item id")?)?,
        },
        "say" => Command::SendChat {
            text: required(rest, "say", "a message")?.to_string(),
        },
        "status" => Command::Status,
        "quit" | "exit" => Command::Quit,
        other => return Err(ShellError::UnknownCommand(other.to_string())),
    };

    Ok(ShellInput::Command(command))
}

fn required<'a>(
    rest: &'a str,
    command: &'static str,
    argument: &'static str,
) -> Result<&'a str, ShellError> {
    if rest.is_empty() {
        Err(ShellError::MissingArgument { command, argument })
    } else {
        Ok(rest)
    }
}

fn number<T: std::str::FromStr>(value: &str) -> Result<T, ShellError> {
    value
        .parse()
        .map_err(|_| ShellError::InvalidNumber(value.to_string()))
}

/// Table of every clip the app can play
pub fn clip_table() -> String {
    let mut out = String::from("Soundboard:\n");
    for item in &SOUNDBOARD_ITEMS {
        out.push_str(&format!(
            "  {}. {:<34} {:<16} {}\n",
            item.id, item.text, item.speaker, item.clip
        ));
    }
    out.push_str("Game effects:\n");
    for sound in GameSound::ALL {
        out.push_str(&format!("  {:<38} {}\n", format!("{:?}", sound), sound.clip()));
    }
    out.push_str("Chat effects:\n");
    for sound in ChatSound::ALL {
        out.push_str(&format!("  {:<38} {}\n", format!("{:?}", sound), sound.clip()));
    }
    out
}

fn page_screen(page: Page, audio_ready: bool) -> String {
    let mut out = format!("== {} ==\n", page.title());
    match page {
        Page::Menu => {
            out.push_str("  soundboard  Press the lines of the Fudge Judge and Papa Pardon\n");
            out.push_str("  game        Fudge Fury: catch the fudge, dodge the gavels\n");
            out.push_str("  chat        DM Slide: talk to the Fudge Judge\n");
        }
        Page::Soundboard => {
            for item in &SOUNDBOARD_ITEMS {
                let marker = match item.speaker {
                    Speaker::FudgeJudge => "[judge]",
                    Speaker::PapaPardon => "[papa] ",
                };
                out.push_str(&format!("  {}. {} {}\n", item.id, marker, item.text));
            }
        }
        Page::Game => out.push_str("  'start' to play, 'hit <id>' to click an item\n"),
        Page::Chat => out.push_str("  'say <text>' to slide into the Judge's DMs\n"),
    }
    if page.requires_audio() && !audio_ready {
        out.push_str("  (no audio loaded yet: 'load <path>' first, controls are silent)\n");
    }
    out
}

fn game_screen(snapshot: &GameSnapshot) -> String {
    if snapshot.finished {
        let stars = "*".repeat(snapshot.stars as usize);
        return format!(
            "GAME OVER! Score {} [{:<5}]  ('start' to play again)\n",
            snapshot.score, stars
        );
    }
    if !snapshot.active {
        return "Fudge Fury: 'start' to begin\n".to_string();
    }

    let mut out = format!(
        "Score {:>3} | {:>2}s left\n",
        snapshot.score,
        snapshot.time_left.ceil() as u64
    );
    for item in &snapshot.items {
        let label = match item.kind {
            ItemKind::Fudge => "fudge",
            ItemKind::Gavel => "gavel",
        };
        out.push_str(&format!(
            "  #{:<3} {} at ({:>3.0}, {:>3.0})\n",
            item.id, label, item.x, item.y
        ));
    }
    out
}

/// Writes notices as text
pub struct Renderer<W: Write> {
    out: W,
    streaming: bool,
    audio_ready: bool,
}

impl<W: Write> Renderer<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            streaming: false,
            audio_ready: false,
        }
    }

    pub fn show(&mut self, notice: &Notice) -> io::Result<()> {
        if self.streaming && !matches!(notice, Notice::ChatFragment { .. }) {
            // Another notice interrupts the reply being streamed
            writeln!(self.out)?;
            self.streaming = false;
        }

        match notice {
            Notice::PageChanged { page, audio_ready } => {
                self.audio_ready = *audio_ready;
                write!(self.out, "{}", page_screen(*page, *audio_ready))?;
            }
            Notice::SourceLoading { name } => {
                self.audio_ready = false;
                writeln!(self.out, "Loading {}...", name)?;
            }
            Notice::SourceReady { name } => {
                self.audio_ready = true;
                writeln!(self.out, "{} is ready. Controls are live.", name)?;
            }
            Notice::SourceFailed { message } => {
                self.audio_ready = false;
                writeln!(self.out, "Error: {}", message)?;
            }
            Notice::PlaybackStarted { clip } => {
                if let clips::ClipId::Soundboard(n) = clip {
                    if let Some(item) = clips::soundboard_item(*n) {
                        writeln!(self.out, "  > {}: \"{}\"", item.speaker, item.text)?;
                    }
                }
            }
            Notice::PlaybackFinished => {}
            Notice::PlaybackError { message } => writeln!(self.out, "Error: {}", message)?,
            Notice::GameUpdated(snapshot) => write!(self.out, "{}", game_screen(snapshot))?,
            Notice::ChatMessage(message) => match message.role {
                Role::User => writeln!(self.out, "You: {}", message.text)?,
                Role::Model => writeln!(self.out, "Fudge Judge: {}", message.text)?,
            },
            Notice::ChatFragment { text } => {
                if !self.streaming {
                    write!(self.out, "Fudge Judge: ")?;
                    self.streaming = true;
                }
                write!(self.out, "{}", text)?;
            }
            Notice::ChatReplyDone => {}
            Notice::ChatFailed { message } => writeln!(self.out, "{}", message)?,
            Notice::Status(report) => {
                let playback = match report.playback {
                    PlaybackStatus::Idle => "idle",
                    PlaybackStatus::Transitioning => "starting",
                    PlaybackStatus::Playing => "playing",
                };
                let buttons = if Soundboard::buttons_enabled(
                    self.audio_ready,
                    report.playback != PlaybackStatus::Idle,
                ) {
                    "enabled"
                } else {
                    "disabled"
                };
                writeln!(self.out, "Page:     {}", report.page.title())?;
                writeln!(self.out, "Audio:    {}", report.source)?;
                writeln!(self.out, "Playback: {} (buttons {})", playback, buttons)?;
                if let Some(item) = report.active_button.and_then(clips::soundboard_item) {
                    writeln!(self.out, "Active:   {}. {}", item.id, item.text)?;
                }
                if let Some(error) = &report.playback_error {
                    writeln!(self.out, "Error:    {}", error)?;
                }
            }
            Notice::ErrorOccurred { message, .. } => writeln!(self.out, "! {}", message)?,
            Notice::ShuttingDown => writeln!(self.out, "PARDON?! Bye.")?,
        }
        self.out.flush()
    }
}

/// Render notices on stdout until shutdown
pub fn spawn_renderer(notices: Receiver<Notice>) -> JoinHandle<()> {
    thread::spawn(move || {
        let mut renderer = Renderer::new(io::stdout());
        for notice in notices.iter() {
            if let Err(e) = renderer.show(&notice) {
                tracing::warn!("Failed to render notice: {}", e);
            }
            if matches!(notice, Notice::ShuttingDown) {
                break;
            }
        }
    })
}

/// Read commands from stdin. End of input quits.
pub fn spawn_input(events: Sender<AppEvent>) -> JoinHandle<()> {
    thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            match parse_line(&line) {
                Ok(ShellInput::Command(command)) => {
                    let quit = command == Command::Quit;
                    if events.send(AppEvent::Command(command)).is_err() || quit {
                        return;
                    }
                }
                Ok(ShellInput::Help) => println!("{}", HELP),
                Ok(ShellInput::Clips) => print!("{}", clip_table()),
                Ok(ShellInput::Empty) => {}
                Err(e) => println!("! {}", e),
            }
        }
        tracing::debug!("Input closed");
        let _ = events.send(AppEvent::Command(Command::Quit));
    })
}
