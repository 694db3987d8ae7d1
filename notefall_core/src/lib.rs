pub mod audio;
pub mod config;
pub mod error;
pub mod gameplay;
pub mod input;
pub mod replay;
pub mod time;

pub use notefall_chart::{Chart, GameMode, LogicalTime, Note, NoteKind};
