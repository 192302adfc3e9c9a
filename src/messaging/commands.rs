/// Command types for the application
///
/// Commands represent requests to perform actions (imperative).
/// The event loop executes them against the app state.
use std::path::PathBuf;

use crate::state::Page;

/// Application commands
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Show another page
    Navigate(Page),

    /// Replace the loaded recording
    LoadAudio { path: PathBuf },

    /// Press a soundboard button
    PlaySoundboard { item: u8 },

    /// Start (or restart) Fudge Fury
    StartGame,

    /// Click a falling item
    HitItem { item: u64 },

    /// Send a chat message
    SendChat { text: String },

    /// Report current state
    Status,

    /// Quit the application
    Quit,
}

impl Command {
    /// Get a human-readable description of the command
    pub fn description(&self) -> String {
        match self {
            Command::Navigate(page) => format!("Navigate to {}", page),
            Command::LoadAudio { path } => format!("Load audio: {}", path.display()),
            Command::PlaySoundboard { item } => format!("Play soundboard #{}", item),
            Command::StartGame => "Start game".to_string(),
            Command::HitItem { item } => format!("Hit item {}", item),
            Command::SendChat { text } => format!("Send chat ({} chars)", text.chars().count()),
            Command::Status => "Show status".to_string(),
            Command::Quit => "Quit application".to_string(),
        }
    }
}
