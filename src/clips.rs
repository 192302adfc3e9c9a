/// Clip registry
///
/// Every sound in the app is a sub-range of the one recording the user loads.
/// The boundaries below are hand-tuned against that recording; keep them exact.
use std::fmt;

use serde::{Deserialize, Serialize};

/// A `[start, end)` range of the source recording, in seconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClipRange {
    pub start: f64,
    pub end: f64,
}

impl ClipRange {
    pub const fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    /// Length of the clip in seconds
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Check the range is well formed (`0 <= start < end`)
    pub fn is_valid(&self) -> bool {
        self.start.is_finite() && self.end.is_finite() && self.start >= 0.0 && self.end > self.start
    }
}

impl fmt::Display for ClipRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3}s-{:.3}s", self.start, self.end)
    }
}

/// Who says the line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Speaker {
    FudgeJudge,
    PapaPardon,
}

impl fmt::Display for Speaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Speaker::FudgeJudge => "The Fudge Judge",
            Speaker::PapaPardon => "Papa Pardon",
        };
        f.pad(name)
    }
}

/// A soundboard button: a clip plus what to show on it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SoundboardItem {
    pub id: u8,
    pub text: &'static str,
    pub clip: ClipRange,
    pub speaker: Speaker,
}

pub const SOUNDBOARD_ITEMS: [SoundboardItem; 8] = [
    SoundboardItem {
        id: 1,
        text: "Call the judge and get some fudge.",
        clip: ClipRange::new(1.88, 3.943),
        speaker: Speaker::FudgeJudge,
    },
    SoundboardItem {
        id: 2,
        text: "Call the judge... fudge?",
        clip: ClipRange::new(4.063, 5.565),
        speaker: Speaker::PapaPardon,
    },
    SoundboardItem {
        id: 3,
        text: "Are you okay?",
        clip: ClipRange::new(6.106, 6.647),
        speaker: Speaker::PapaPardon,
    },
    SoundboardItem {
        id: 4,
        text: "Nope.",
        clip: ClipRange::new(7.067, 8.189),
        speaker: Speaker::FudgeJudge,
    },
    SoundboardItem {
        id: 5,
        text: "Are you a doctor?",
        clip: ClipRange::new(8.429, 9.511),
        speaker: Speaker::FudgeJudge,
    },
    SoundboardItem {
        id: 6,
        text: "Your DM?",
        clip: ClipRange::new(14.077, 15.299),
        speaker: Speaker::PapaPardon,
    },
    SoundboardItem {
        id: 7,
        text: "You trying to slide in the DMs?",
        clip: ClipRange::new(18.003, 20.727),
        speaker: Speaker::PapaPardon,
    },
    SoundboardItem {
        id: 8,
        text: "PARDON?!",
        clip: ClipRange::new(15.98, 17.983),
        speaker: Speaker::FudgeJudge,
    },
];

/// Sound effects used by the Fudge Fury game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameSound {
    /// "Call the judge"
    Start,
    /// "PARDON?!"
    GameOver,
    /// "fudge."
    FudgeSuccess,
    /// "No?"
    FudgeFail,
}

impl GameSound {
    pub const ALL: [GameSound; 4] = [
        GameSound::Start,
        GameSound::GameOver,
        GameSound::FudgeSuccess,
        GameSound::FudgeFail,
    ];

    pub const fn clip(self) -> ClipRange {
        match self {
            GameSound::Start => ClipRange::new(1.88, 2.681),
            GameSound::GameOver => ClipRange::new(15.98, 17.983),
            GameSound::FudgeSuccess => ClipRange::new(3.783, 3.943),
            GameSound::FudgeFail => ClipRange::new(8.209, 8.409),
        }
    }
}

/// Sound effects used by the DM Slide chat
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChatSound {
    /// "DM?"
    MessageSent,
    /// "Maybe."
    MessageReceived,
}

impl ChatSound {
    pub const ALL: [ChatSound; 2] = [ChatSound::MessageSent, ChatSound::MessageReceived];

    pub const fn clip(self) -> ClipRange {
        match self {
            ChatSound::MessageSent => ClipRange::new(14.318, 15.299),
            ChatSound::MessageReceived => ClipRange::new(10.432, 10.753),
        }
    }
}

/// Symbolic name of a clip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClipId {
    Soundboard(u8),
    Game(GameSound),
    Chat(ChatSound),
}

impl fmt::Display for ClipId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClipId::Soundboard(n) => write!(f, "soundboard #{}", n),
            ClipId::Game(sound) => write!(f, "game {:?}", sound),
            ClipId::Chat(sound) => write!(f, "chat {:?}", sound),
        }
    }
}

/// Look up a soundboard button by its number
pub fn soundboard_item(id: u8) -> Option<&'static SoundboardItem> {
    SOUNDBOARD_ITEMS.iter().find(|item| item.id == id)
}

/// Resolve a clip id to its time range.
///
/// # Panics
///
/// Panics on a soundboard number that is not in [`SOUNDBOARD_ITEMS`]. Ids are
/// built from the table itself, so reaching this is a bug, not bad input.
pub fn resolve(id: ClipId) -> ClipRange {
    match id {
        ClipId::Soundboard(n) => match soundboard_item(n) {
            Some(item) => item.clip,
            None => panic!("unknown soundboard clip id {}", n),
        },
        ClipId::Game(sound) => sound.clip(),
        ClipId::Chat(sound) => sound.clip(),
    }
}

/// Every id the registry knows about
pub fn all_ids() -> impl Iterator<Item = ClipId> {
    SOUNDBOARD_ITEMS
        .iter()
        .map(|item| ClipId::Soundboard(item.id))
        .chain(GameSound::ALL.into_iter().map(ClipId::Game))
        .chain(ChatSound::ALL.into_iter().map(ClipId::Chat))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_clip_is_well_formed() {
        let mut count = 0;
        for id in all_ids() {
            let clip = resolve(id);
            assert!(clip.start >= 0.0, "{} starts before zero", id);
            assert!(clip.end > clip.start, "{} has an empty range", id);
            assert!(clip.is_valid());
            count += 1;
        }
        assert_eq!(count, 14);
    }

    #[test]
    fn test_soundboard_boundaries_are_exact() {
        assert_eq!(resolve(ClipId::Soundboard(1)), ClipRange::new(1.88, 3.943));
        assert_eq!(resolve(ClipId::Soundboard(3)), ClipRange::new(6.106, 6.647));
        assert_eq!(resolve(ClipId::Soundboard(8)), ClipRange::new(15.98, 17.983));
        assert_eq!(soundboard_item(7).map(|i| i.speaker), Some(Speaker::PapaPardon));
    }

    #[test]
    fn test_effect_boundaries_are_exact() {
        assert_eq!(
            resolve(ClipId::Game(GameSound::FudgeSuccess)),
            ClipRange::new(3.783, 3.943)
        );
        assert_eq!(
            resolve(ClipId::Chat(ChatSound::MessageReceived)),
            ClipRange::new(10.432, 10.753)
        );
    }

    #[test]
    fn test_soundboard_ids_are_unique() {
        let mut ids: Vec<u8> = SOUNDBOARD_ITEMS.iter().map(|i| i.id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), SOUNDBOARD_ITEMS.len());
    }

    #[test]
    fn test_unknown_item_lookup_is_none() {
        assert!(soundboard_item(0).is_none());
        assert!(soundboard_item(9).is_none());
    }

    #[test]
    #[should_panic(expected = "unknown soundboard clip id 42")]
    fn test_resolve_unknown_id_panics() {
        resolve(ClipId::Soundboard(42));
    }

    #[test]
    fn test_speaker_display() {
        assert_eq!(Speaker::FudgeJudge.to_string(), "The Fudge Judge");
        assert_eq!(Speaker::PapaPardon.to_string(), "Papa Pardon");
    }
}
