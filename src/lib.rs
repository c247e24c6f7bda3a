//! Looper Editor - layer configuration and segment timeline model
//!
//! The editor side of a multi-track looper session. Users give each layer
//! a device kind and, where the kind allows it, place input/output
//! segments on the timeline. The resulting configuration is what gets
//! saved as a project or sent to the playback server.
//!
//! # Architecture
//!
//! - `schema`: device kinds, field coercion, channel-count validation
//! - `model`: block store and segment store with change subscribers
//! - `session`: commit protocol, timeline queries, persistence, play payload
//! - `config`: editor configuration files and env overrides

pub mod cli;
pub mod config;
pub mod error;
pub mod model;
pub mod schema;
pub mod session;

pub use config::EditorConfig;
pub use error::{EditorError, Result, ValidationErrors};
pub use model::{Block, LayerId, Polarity, Segment, SegmentId};
pub use session::{Session, SettingsForm, TimelineQuery};
