use crate::audio_system::PlayOutcome;
use crate::clips::{self, ClipId, SoundboardItem, SOUNDBOARD_ITEMS};
use crate::error::SoundboardError;

/// Soundboard page: eight buttons, one clip each
#[derive(Debug, Default)]
pub struct Soundboard {
    active: Option<u8>,
}

impl Soundboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Press button `id`, requesting its clip through `play`.
    ///
    /// The button becomes active only when the request was accepted.
    pub fn press<F>(&mut self, id: u8, play: F) -> Result<PlayOutcome, SoundboardError>
    where
        F: FnOnce(ClipId) -> PlayOutcome,
    {
        let item = clips::soundboard_item(id).ok_or(SoundboardError::UnknownItem(id))?;
        let outcome = play(ClipId::Soundboard(item.id));
        if outcome.is_accepted() {
            tracing::debug!("Soundboard #{} active: {}", item.id, item.text);
            self.active = Some(item.id);
        }
        Ok(outcome)
    }

    /// Playback went idle; no button is lit any more
    pub fn on_playback_idle(&mut self) {
        self.active = None;
    }

    pub fn active(&self) -> Option<u8> {
        self.active
    }

    pub fn active_item(&self) -> Option<&'static SoundboardItem> {
        self.active.and_then(clips::soundboard_item)
    }

    pub fn items(&self) -> &'static [SoundboardItem] {
        &SOUNDBOARD_ITEMS
    }

    /// Buttons accept presses only with a ready source and a quiet output
    pub fn buttons_enabled(audio_ready: bool, audio_playing: bool) -> bool {
        audio_ready && !audio_playing
    }
}
