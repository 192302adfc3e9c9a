/// Pages that consume the playback controller
///
/// Page models never touch the output. They tell the caller which clip to
/// request and the app state forwards that to the `SegmentPlayer`.

pub mod chat;
pub mod game;
pub mod soundboard;

pub use chat::{
    spawn_turn, ChatMessage, ChatProvider, ChatSession, FragmentStream, Role, SessionId,
    TurnId, TurnRequest, CHAT_ERROR_MESSAGE, CHAT_UNAVAILABLE_MESSAGE, GREETING,
};
pub use game::{FallingItem, FudgeFury, GameSnapshot, ItemKind};
pub use soundboard::Soundboard;
