/// Fudge Fury: catch falling fudge, avoid the gavels
///
/// Coordinates are percentages of the play field. Items spawn above the top
/// edge and fall until they leave the bottom.
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use crate::clips::GameSound;
use crate::config::GameConfig;

const SPAWN_X_MIN: f64 = 5.0;
const SPAWN_X_SPAN: f64 = 90.0;
const SPAWN_Y: f64 = -10.0;
const REMOVE_Y: f64 = 110.0;
const SPEED_MIN: f64 = 15.0;
const SPEED_SPAN: f64 = 25.0;

const FUDGE_POINTS: u32 = 10;
const GAVEL_PENALTY: u32 = 5;
const POINTS_PER_STAR: u32 = 25;
const MAX_STARS: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ItemKind {
    Fudge,
    Gavel,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FallingItem {
    pub id: u64,
    pub x: f64,
    pub y: f64,
    pub kind: ItemKind,
    pub speed: f64,
}

/// What the renderer needs to draw one frame
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameSnapshot {
    pub active: bool,
    pub finished: bool,
    pub score: u32,
    pub time_left: f64,
    pub stars: u32,
    pub items: Vec<FallingItem>,
}

pub struct FudgeFury<R: Rng = StdRng> {
    settings: GameConfig,
    rng: R,
    score: u32,
    time_left: f64,
    active: bool,
    items: Vec<FallingItem>,
    next_id: u64,
}

impl FudgeFury<StdRng> {
    pub fn new(settings: GameConfig) -> Self {
        Self::with_rng(settings, StdRng::from_entropy())
    }
}

impl<R: Rng> FudgeFury<R> {
    pub fn with_rng(settings: GameConfig, rng: R) -> Self {
        let time_left = settings.duration_secs;
        Self {
            settings,
            rng,
            score: 0,
            time_left,
            active: false,
            items: Vec::new(),
            next_id: 1,
        }
    }

    /// Start (or restart) a round. Returns the sound to play.
    pub fn start(&mut self) -> GameSound {
        self.score = 0;
        self.time_left = self.settings.duration_secs;
        self.items.clear();
        self.active = true;
        tracing::info!("Fudge Fury started ({}s)", self.settings.duration_secs);
        GameSound::Start
    }

    /// Advance the round by `dt` seconds.
    ///
    /// Returns `Some(GameSound::GameOver)` on the frame the clock runs out;
    /// an inactive game ignores ticks so that happens once per round.
    pub fn tick(&mut self, dt: f64) -> Option<GameSound> {
        if !self.active || dt <= 0.0 {
            return None;
        }

        self.time_left -= dt;
        if self.time_left <= 0.0 {
            self.time_left = 0.0;
            self.active = false;
            tracing::info!("Fudge Fury over: score {} ({} stars)", self.score, self.stars());
            return Some(GameSound::GameOver);
        }

        if self.rng.gen::<f64>() < self.settings.drops_per_second * dt {
            self.spawn();
        }

        for item in &mut self.items {
            item.y += item.speed * dt;
        }
        self.items.retain(|item| item.y < REMOVE_Y);

        None
    }

    fn spawn(&mut self) {
        let x = self.rng.gen::<f64>() * SPAWN_X_SPAN + SPAWN_X_MIN;
        let kind = if self.rng.gen::<f64>() < self.settings.fudge_ratio {
            ItemKind::Fudge
        } else {
            ItemKind::Gavel
        };
        let speed = SPEED_MIN + self.rng.gen::<f64>() * SPEED_SPAN;

        self.items.push(FallingItem {
            id: self.next_id,
            x,
            y: SPAWN_Y,
            kind,
            speed,
        });
        self.next_id += 1;
    }

    /// Click on item `id`. Returns the sound to play, or `None` when nothing
    /// was hit.
    pub fn hit(&mut self, id: u64) -> Option<GameSound> {
        if !self.active {
            return None;
        }

        let index = self.items.iter().position(|item| item.id == id)?;
        match self.items[index].kind {
            ItemKind::Fudge => {
                self.score += FUDGE_POINTS;
                self.items.remove(index);
                Some(GameSound::FudgeSuccess)
            }
            // Gavels stay on screen; hitting one again costs again.
            ItemKind::Gavel => {
                self.score = self.score.saturating_sub(GAVEL_PENALTY);
                Some(GameSound::FudgeFail)
            }
        }
    }

    /// Back to the start screen
    pub fn reset(&mut self) {
        self.score = 0;
        self.time_left = self.settings.duration_secs;
        self.items.clear();
        self.active = false;
    }

    pub fn stars(&self) -> u32 {
        (self.score / POINTS_PER_STAR).min(MAX_STARS)
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn time_left(&self) -> f64 {
        self.time_left
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// The round ran out of time and awaits "play again"
    pub fn is_finished(&self) -> bool {
        !self.active && self.time_left <= 0.0
    }

    pub fn items(&self) -> &[FallingItem] {
        &self.items
    }

    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            active: self.active,
            finished: self.is_finished(),
            score: self.score,
            time_left: self.time_left,
            stars: self.stars(),
            items: self.items.clone(),
        }
    }
}
