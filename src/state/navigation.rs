/// Page navigation
///
/// Navigation always succeeds. Pages that need audio render their controls
/// disabled until a source is ready rather than refusing entry.
use std::fmt;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, Default)]
pub enum Page {
    #[default]
    Menu,
    Soundboard,
    Game,
    Chat,
}

impl Page {
    pub const ALL: [Page; 4] = [Page::Menu, Page::Soundboard, Page::Game, Page::Chat];

    /// Whether the page's controls play clips
    pub fn requires_audio(&self) -> bool {
        !matches!(self, Page::Menu)
    }

    /// Title shown in the page header
    pub fn title(&self) -> &'static str {
        match self {
            Page::Menu => "Call the Judge",
            Page::Soundboard => "Soundboard",
            Page::Game => "Fudge Fury",
            Page::Chat => "DM Slide",
        }
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[derive(Debug, Default)]
pub struct NavigationState {
    current: Page,
}

impl NavigationState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Page {
        self.current
    }

    /// Switch to `target`, returning the page that was showing
    pub fn navigate(&mut self, target: Page) -> Page {
        let previous = self.current;
        if previous != target {
            tracing::debug!("Navigation: {} -> {}", previous, target);
        }
        self.current = target;
        previous
    }
}
