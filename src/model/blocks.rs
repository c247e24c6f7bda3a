//! Block/Layer Store
//!
//! Maps each layer to its display name, device kind and committed field
//! data. A layer with no device kind is unconfigured.

use std::collections::BTreeMap;

use log::debug;
use serde::{Deserialize, Serialize};

use super::ids::{IdAllocator, LayerId};
use crate::error::Result;
use crate::schema::FieldValue;

/// Committed field values keyed by field name
pub type FieldData = BTreeMap<String, FieldValue>;

/// Configuration of one layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub id: LayerId,
    pub name: String,
    /// Key into the schema registry, `None` while unconfigured
    pub device_kind: Option<String>,
    pub data: FieldData,
}

impl Block {
    /// Fresh unconfigured layer named `Layer-<id>`
    pub fn unconfigured(id: LayerId) -> Self {
        Self {
            id,
            name: format!("Layer-{}", id),
            device_kind: None,
            data: FieldData::new(),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.device_kind.is_some()
    }
}

#[derive(Debug, Clone, Default)]
pub struct BlockStore {
    blocks: BTreeMap<LayerId, Block>,
    ids: IdAllocator,
}

impl BlockStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an unconfigured layer with a fresh id
    pub fn create_layer(&mut self) -> LayerId {
        let id = LayerId(self.ids.next_id());
        self.blocks.insert(id, Block::unconfigured(id));
        debug!("Created layer {}", id);
        id
    }

    pub fn get_block(&self, id: LayerId) -> Option<&Block> {
        self.blocks.get(&id)
    }

    pub fn contains(&self, id: LayerId) -> bool {
        self.blocks.contains_key(&id)
    }

    /// Replace the whole block stored for a layer.
    ///
    /// Fails with `IdOutOfRange` for a layer id the allocator cannot reserve.
    pub fn update_block(&mut self, block: Block) -> Result<()> {
        self.ids.reserve_past(block.id.0)?;
        debug!("Updating block for layer {}", block.id);
        self.blocks.insert(block.id, block);
        Ok(())
    }

    pub fn remove_block(&mut self, id: LayerId) -> Option<Block> {
        self.blocks.remove(&id)
    }

    pub fn all_blocks(&self) -> &BTreeMap<LayerId, Block> {
        &self.blocks
    }

    /// Layer ids in ascending order
    pub fn layer_ids(&self) -> Vec<LayerId> {
        self.blocks.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Remove every block. Layer ids are not handed out again.
    pub fn clear(&mut self) {
        self.blocks.clear();
    }
}
