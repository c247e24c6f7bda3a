//! Session Data Model
//!
//! Stores owned by a session:
//! - Block store: per-layer device configuration
//! - Segment store: per-layer time intervals with change subscribers

mod blocks;
mod ids;
mod segments;

pub use blocks::{Block, BlockStore, FieldData};
pub use ids::{IdAllocator, LayerId, SegmentId};
pub use segments::{Polarity, Segment, SegmentStore, SegmentSubscriber};
