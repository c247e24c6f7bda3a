//! Layer and segment identities

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{EditorError, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayerId(pub u64);

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SegmentId(pub u64);

impl fmt::Display for SegmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Monotonic id counter. Ids handed out are never reused by the same allocator.
#[derive(Debug, Clone, Default)]
pub struct IdAllocator {
    next: u64,
}

impl IdAllocator {
    /// Largest id a store accepts from outside (2^53 - 1, the largest
    /// integer a JSON number keeps exactly in the browser).
    pub const MAX_ID: u64 = (1 << 53) - 1;

    pub fn new() -> Self {
        Self { next: 0 }
    }

    pub fn next_id(&mut self) -> u64 {
        let id = self.next;
        self.next = self.next.saturating_add(1);
        id
    }

    /// Make sure future ids are greater than `id`.
    ///
    /// Ids above [`MAX_ID`](Self::MAX_ID) are refused and leave the counter
    /// where it was.
    pub fn reserve_past(&mut self, id: u64) -> Result<()> {
        if id > Self::MAX_ID {
            return Err(EditorError::IdOutOfRange { id });
        }
        if id >= self.next {
            self.next = id + 1;
        }
        Ok(())
    }

    /// The id the next call to [`next_id`](Self::next_id) returns
    pub fn peek(&self) -> u64 {
        self.next
    }
}
