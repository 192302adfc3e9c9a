/// State management module
///
/// The single-threaded application state and page navigation.

pub mod app_state;
pub mod navigation;

// Re-export commonly used types
pub use app_state::AppState;
pub use navigation::{NavigationState, Page};
