//! Call the Judge: a soundboard, a mini game and a chat built around one
//! user-supplied recording of the "Fudge Judge" video.
//!
//! Every sound is a `[start, end)` slice of that recording, played through a
//! single shared output by [`audio_system::SegmentPlayer`].

pub mod audio_system;
pub mod clips;
pub mod config;
pub mod environment;
pub mod error;
pub mod gemini;
pub mod messaging;
pub mod pages;
pub mod shell;
pub mod state;
