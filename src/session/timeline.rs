//! Timeline Query Layer
//!
//! Read-only view over the registry and both stores. The renderer asks it
//! what a layer can do, which segment sits under the cursor, and what each
//! layer contributes to a play request.

use serde_json::{Map, Value};

use super::project::SegmentRecord;
use crate::error::{EditorError, Result};
use crate::model::{Block, BlockStore, LayerId, Polarity, Segment, SegmentId, SegmentStore};
use crate::schema::{Cardinality, DeviceSchema, DeviceSchemaRegistry};

/// What a layer's device kind supports. All false while unconfigured.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LayerCapabilities {
    pub inputs: bool,
    pub outputs: bool,
    pub input_segments: bool,
    pub output_segments: bool,
}

impl LayerCapabilities {
    fn from_schema(schema: &DeviceSchema) -> Self {
        Self {
            inputs: schema.input_channels.is_some(),
            outputs: schema.output_channels.is_some(),
            input_segments: schema.input_segments.is_some(),
            output_segments: schema.output_segments.is_some(),
        }
    }

    pub fn hosts(&self, polarity: Polarity) -> bool {
        match polarity {
            Polarity::Input => self.input_segments,
            Polarity::Output => self.output_segments,
        }
    }

    pub fn hosts_segments(&self) -> bool {
        self.input_segments || self.output_segments
    }
}

/// Text shown in a layer's settings box
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerSummary {
    pub name: String,
    pub device_kind: String,
}

/// What a click on the layer's timeline lane should do
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClickTarget {
    /// Edit the segment under the cursor
    Edit(SegmentId),
    /// Start a new segment at this measure
    Create { measure: f64 },
}

pub struct TimelineQuery<'a> {
    registry: &'a DeviceSchemaRegistry,
    blocks: &'a BlockStore,
    segments: &'a SegmentStore,
}

impl<'a> TimelineQuery<'a> {
    pub fn new(
        registry: &'a DeviceSchemaRegistry,
        blocks: &'a BlockStore,
        segments: &'a SegmentStore,
    ) -> Self {
        Self {
            registry,
            blocks,
            segments,
        }
    }

    pub fn block(&self, layer: LayerId) -> Result<&'a Block> {
        self.blocks
            .get_block(layer)
            .ok_or(EditorError::UnknownLayer { layer })
    }

    /// Schema of the layer's kind, `None` while unconfigured
    pub fn schema(&self, layer: LayerId) -> Result<Option<&'a DeviceSchema>> {
        match &self.block(layer)?.device_kind {
            Some(kind) => Ok(Some(self.registry.get_schema(kind)?)),
            None => Ok(None),
        }
    }

    pub fn capabilities(&self, layer: LayerId) -> Result<LayerCapabilities> {
        Ok(self
            .schema(layer)?
            .map(LayerCapabilities::from_schema)
            .unwrap_or_default())
    }

    /// Segment cardinality for one polarity, `None` if not hosted
    pub fn segment_limits(&self, layer: LayerId, polarity: Polarity) -> Result<Option<Cardinality>> {
        Ok(self.schema(layer)?.and_then(|schema| match polarity {
            Polarity::Input => schema.input_segments,
            Polarity::Output => schema.output_segments,
        }))
    }

    pub fn segments(&self, layer: LayerId) -> &'a [Segment] {
        self.segments.get_segments(layer)
    }

    pub fn segment_at(&self, layer: LayerId, measure: f64) -> Option<&'a Segment> {
        self.segments.get_segment_at_measure(layer, measure)
    }

    /// A click strictly inside a segment edits it; a click anywhere else,
    /// including exactly on a boundary, creates a new one.
    pub fn resolve_click(&self, layer: LayerId, measure: f64) -> ClickTarget {
        match self.segment_at(layer, measure) {
            Some(segment) => ClickTarget::Edit(segment.id),
            None => ClickTarget::Create { measure },
        }
    }

    /// Name and kind for the settings box, nothing for unconfigured layers
    pub fn summary(&self, layer: LayerId) -> Option<LayerSummary> {
        let block = self.blocks.get_block(layer)?;
        block.device_kind.as_ref().map(|kind| LayerSummary {
            name: block.name.clone(),
            device_kind: kind.clone(),
        })
    }

    /// `{name, type, segments, ...data}` for a configured layer, an empty
    /// map for an unconfigured or unknown one.
    pub fn get_data(&self, layer: LayerId) -> Map<String, Value> {
        let mut out = Map::new();
        let Some(block) = self.blocks.get_block(layer) else {
            return out;
        };
        let Some(kind) = &block.device_kind else {
            return out;
        };

        let segments: Vec<Value> = self
            .segments(layer)
            .iter()
            .map(|s| serde_json::to_value(SegmentRecord::from(s)).unwrap_or(Value::Null))
            .collect();

        out.insert("name".to_string(), Value::String(block.name.clone()));
        out.insert("type".to_string(), Value::String(kind.clone()));
        out.insert("segments".to_string(), Value::Array(segments));
        for (key, value) in &block.data {
            out.insert(
                key.clone(),
                serde_json::to_value(value).unwrap_or(Value::Null),
            );
        }
        out
    }

    /// One entry per configured layer, in layer order
    pub fn devices(&self) -> Vec<Value> {
        self.blocks
            .layer_ids()
            .into_iter()
            .map(|layer| self.get_data(layer))
            .filter(|data| !data.is_empty())
            .map(Value::Object)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::settings::{commit_settings, SettingsForm};

    struct Fixture {
        registry: DeviceSchemaRegistry,
        blocks: BlockStore,
        segments: SegmentStore,
        click: LayerId,
        empty: LayerId,
    }

    impl Fixture {
        fn new() -> Self {
            let registry = DeviceSchemaRegistry::with_defaults();
            let mut blocks = BlockStore::new();
            let click = blocks.create_layer();
            let empty = blocks.create_layer();
            let form = SettingsForm::new("Click", "Metronome")
                .field("output_channel", "click")
                .outputs("click");
            commit_settings(&registry, &mut blocks, click, &form).unwrap();

            Self {
                registry,
                blocks,
                segments: SegmentStore::new(),
                click,
                empty,
            }
        }

        fn query(&self) -> TimelineQuery<'_> {
            TimelineQuery::new(&self.registry, &self.blocks, &self.segments)
        }
    }

    #[test]
    fn test_capabilities() {
        let fixture = Fixture::new();
        let query = fixture.query();

        let caps = query.capabilities(fixture.click).unwrap();
        assert!(caps.outputs && caps.output_segments);
        assert!(!caps.inputs && !caps.input_segments);
        assert!(caps.hosts(Polarity::Output));

        assert_eq!(
            query.capabilities(fixture.empty).unwrap(),
            LayerCapabilities::default()
        );
        assert!(query.capabilities(LayerId(42)).is_err());
    }

    #[test]
    fn test_resolve_click() {
        let mut fixture = Fixture::new();
        let segment = fixture.segments.create_segment(2.0, 5.0, Polarity::Output);
        fixture.segments.add_segment(fixture.click, segment.clone()).unwrap();
        let query = fixture.query();

        assert_eq!(query.resolve_click(fixture.click, 3.5), ClickTarget::Edit(segment.id));
        assert_eq!(
            query.resolve_click(fixture.click, 5.0),
            ClickTarget::Create { measure: 5.0 }
        );
    }

    #[test]
    fn test_summary() {
        let fixture = Fixture::new();
        let query = fixture.query();

        assert_eq!(
            query.summary(fixture.click),
            Some(LayerSummary {
                name: "Click".to_string(),
                device_kind: "Metronome".to_string(),
            })
        );
        assert_eq!(query.summary(fixture.empty), None);
    }

    #[test]
    fn test_get_data_flattens_fields() {
        let mut fixture = Fixture::new();
        let segment = fixture.segments.create_segment(0.0, 8.0, Polarity::Output);
        fixture.segments.add_segment(fixture.click, segment).unwrap();
        let data = fixture.query().get_data(fixture.click);

        assert_eq!(data["name"], "Click");
        assert_eq!(data["type"], "Metronome");
        assert_eq!(data["output_channel"], "click");
        assert_eq!(data["output_channels"], serde_json::json!(["click"]));
        assert_eq!(
            data["segments"],
            serde_json::json!([{"start": 0.0, "stop": 8.0, "type": "output"}])
        );
    }

    #[test]
    fn test_unconfigured_layer_contributes_nothing() {
        let fixture = Fixture::new();
        let query = fixture.query();

        assert!(query.get_data(fixture.empty).is_empty());
        let devices = query.devices();
        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0]["name"], "Click");
    }
}
