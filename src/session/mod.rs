//! Editing Session Module
//!
//! Ties the schema registry and the stores together:
//! - Settings commit protocol for layers
//! - Timeline queries for the renderer
//! - Project snapshots and storage
//! - Play request payload

mod editor;
mod playback;
mod project;
mod settings;
mod timeline;

pub use editor::Session;
pub use playback::{PlaybackConfig, PlaybackRequest, Tempo};
pub use project::{BlockRecord, ProjectEntry, ProjectFile, ProjectStorage, SegmentRecord};
pub use settings::{
    build_block, commit_settings, SettingsForm, INPUT_CHANNELS_KEY, OUTPUT_CHANNELS_KEY,
};
pub use timeline::{ClickTarget, LayerCapabilities, LayerSummary, TimelineQuery};
