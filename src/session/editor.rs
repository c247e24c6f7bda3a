//! Editor session
//!
//! Owns the schema registry and both stores for the lifetime of one editing
//! session. Every mutation goes through here so the caller-side checks the
//! stores leave out (well-formed segments, polarity support, cardinality)
//! are applied once.

use std::collections::BTreeSet;

use log::{debug, info};
use serde_json::{Map, Value};

use super::playback::{PlaybackRequest, Tempo};
use super::project::{BlockRecord, ProjectFile, SegmentRecord};
use super::settings::{self, SettingsForm};
use super::timeline::TimelineQuery;
use crate::config::EditorConfig;
use crate::error::{EditorError, Result, ValidationErrors};
use crate::model::{
    Block, BlockStore, IdAllocator, LayerId, Polarity, Segment, SegmentId, SegmentStore,
    SegmentSubscriber,
};
use crate::schema::DeviceSchemaRegistry;

pub struct Session {
    registry: DeviceSchemaRegistry,
    blocks: BlockStore,
    segments: SegmentStore,
    tempo: Tempo,
}

impl Session {
    /// Start a session with `layer_count` unconfigured layers
    pub fn new(registry: DeviceSchemaRegistry, layer_count: usize, tempo: Tempo) -> Self {
        let mut blocks = BlockStore::new();
        for _ in 0..layer_count {
            blocks.create_layer();
        }
        Self {
            registry,
            blocks,
            segments: SegmentStore::new(),
            tempo,
        }
    }

    /// Built-in device kinds, layer count and tempo from config
    pub fn from_config(config: &EditorConfig) -> Self {
        Self::new(
            DeviceSchemaRegistry::with_defaults(),
            config.layer_count,
            config.tempo,
        )
    }

    pub fn registry(&self) -> &DeviceSchemaRegistry {
        &self.registry
    }

    pub fn blocks(&self) -> &BlockStore {
        &self.blocks
    }

    pub fn segments(&self) -> &SegmentStore {
        &self.segments
    }

    pub fn tempo(&self) -> Tempo {
        self.tempo
    }

    pub fn set_tempo(&mut self, tempo: Tempo) {
        self.tempo = tempo;
    }

    pub fn layers(&self) -> Vec<LayerId> {
        self.blocks.layer_ids()
    }

    pub fn add_layer(&mut self) -> LayerId {
        self.blocks.create_layer()
    }

    pub fn timeline(&self) -> TimelineQuery<'_> {
        TimelineQuery::new(&self.registry, &self.blocks, &self.segments)
    }

    /// Run the settings commit protocol for one layer
    pub fn commit_settings(
        &mut self,
        layer: LayerId,
        form: &SettingsForm,
    ) -> std::result::Result<(), ValidationErrors> {
        settings::commit_settings(&self.registry, &mut self.blocks, layer, form)
    }

    /// Validate and add a new segment, returning its id
    pub fn place_segment(
        &mut self,
        layer: LayerId,
        start: f64,
        stop: f64,
        polarity: Polarity,
    ) -> Result<SegmentId> {
        self.check_segment(layer, start, stop, polarity, None)?;
        let segment = self.segments.create_segment(start, stop, polarity);
        let id = segment.id;
        self.segments.add_segment(layer, segment)?;
        Ok(id)
    }

    /// Validate and apply an edit to an existing segment
    pub fn edit_segment(&mut self, layer: LayerId, segment: &Segment) -> Result<()> {
        let existing = self
            .segments
            .get_segment(layer, segment.id)
            .ok_or(EditorError::UpdateTargetMissing {
                layer,
                segment: segment.id,
            })?;
        let keeps_polarity = existing.polarity == segment.polarity;
        self.check_segment(
            layer,
            segment.start,
            segment.stop,
            segment.polarity,
            keeps_polarity.then_some(segment.id),
        )?;
        self.segments.update_segment(layer, segment)
    }

    /// `replacing` names a segment that already counts toward the polarity's limit
    fn check_segment(
        &self,
        layer: LayerId,
        start: f64,
        stop: f64,
        polarity: Polarity,
        replacing: Option<SegmentId>,
    ) -> Result<()> {
        let block = self.timeline().block(layer)?;
        let kind = block
            .device_kind
            .as_deref()
            .ok_or(EditorError::Unconfigured { layer })?;

        let candidate = Segment::new(SegmentId(0), start, stop, polarity);
        if !candidate.is_well_formed() {
            return Err(EditorError::InvalidSegment { start, stop });
        }

        let limits = self
            .timeline()
            .segment_limits(layer, polarity)?
            .ok_or_else(|| EditorError::UnsupportedPolarity {
                kind: kind.to_string(),
                polarity: polarity.to_string(),
            })?;

        if replacing.is_none() && !limits.allows_another(self.segments.count(layer, polarity)) {
            return Err(EditorError::TooMany {
                what: format!("{} segments", polarity),
                max_count: limits.max_count,
            });
        }
        Ok(())
    }

    pub fn subscribe(&mut self, layer: LayerId, subscriber: impl SegmentSubscriber + 'static) {
        self.segments.subscribe(layer, subscriber);
    }

    pub fn clear_subscribers(&mut self) {
        self.segments.clear_all_callbacks();
    }

    pub fn get_data(&self, layer: LayerId) -> Map<String, Value> {
        self.timeline().get_data(layer)
    }

    pub fn devices(&self) -> Vec<Value> {
        self.timeline().devices()
    }

    pub fn playback_request(&self) -> PlaybackRequest {
        PlaybackRequest::new(self.tempo, self.devices())
    }

    /// Serializable copy of both stores
    pub fn snapshot(&self) -> ProjectFile {
        let mut project = ProjectFile::default();
        for (id, block) in self.blocks.all_blocks() {
            project.blocks.insert(*id, BlockRecord::from(block));
        }
        for (id, segments) in self.segments.all_segments() {
            project
                .segments
                .insert(*id, segments.iter().map(SegmentRecord::from).collect());
        }
        project
    }

    /// Empty both stores. Subscribers hear about it once each.
    pub fn clear(&mut self) {
        self.blocks.clear();
        self.segments.clear_all();
    }

    /// Replace both stores with a saved project.
    ///
    /// The file is checked up front; on any error neither store changes.
    /// Existing subscribers are notified of the clear and then dropped,
    /// since the views that registered them are rebuilt after a load.
    pub fn load(&mut self, project: &ProjectFile) -> Result<()> {
        let mut errors = ValidationErrors::new();
        let layer_ids: BTreeSet<LayerId> = project
            .blocks
            .keys()
            .chain(project.segments.keys())
            .copied()
            .collect();
        for id in layer_ids {
            if id.0 > IdAllocator::MAX_ID {
                errors.push(EditorError::IdOutOfRange { id: id.0 });
            }
        }
        for record in project.blocks.values() {
            if let Some(kind) = &record.device_kind {
                if !self.registry.kind_exists(kind) {
                    errors.push(EditorError::NotFound { kind: kind.clone() });
                }
            }
        }
        for record in project.segments.values().flatten() {
            let candidate = Segment::new(SegmentId(0), record.start, record.stop, record.polarity);
            if !candidate.is_well_formed() {
                errors.push(EditorError::InvalidSegment {
                    start: record.start,
                    stop: record.stop,
                });
            }
        }
        errors.into_result()?;

        self.clear();
        self.segments.clear_all_callbacks();

        for (id, record) in &project.blocks {
            self.blocks.update_block(Block {
                id: *id,
                name: record.name.clone(),
                device_kind: record.device_kind.clone(),
                data: record.data.clone(),
            })?;
        }
        for (id, records) in &project.segments {
            if !self.blocks.contains(*id) {
                debug!("Segments reference layer {} with no block, adding it", id);
                self.blocks.update_block(Block::unconfigured(*id))?;
            }
            for record in records {
                let segment = self
                    .segments
                    .create_segment(record.start, record.stop, record.polarity);
                self.segments.add_segment(*id, segment)?;
            }
        }

        info!(
            "Loaded project with {} layers and {} segments",
            self.blocks.len(),
            project.segments.values().map(Vec::len).sum::<usize>()
        );
        Ok(())
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::from_config(&EditorConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    fn session() -> (Session, LayerId, LayerId) {
        let mut session = Session::new(DeviceSchemaRegistry::with_defaults(), 2, Tempo::default());
        let layers = session.layers();
        let form = SettingsForm::new("Mic", "AudioOutput")
            .field("device", "hw:0")
            .field("input_channel", "mic")
            .inputs("mic");
        session.commit_settings(layers[0], &form).unwrap();
        (session, layers[0], layers[1])
    }

    #[test]
    fn test_new_session_layers() {
        let session = Session::new(DeviceSchemaRegistry::with_defaults(), 3, Tempo::default());
        assert_eq!(session.layers(), vec![LayerId(0), LayerId(1), LayerId(2)]);
        assert!(session.devices().is_empty());
    }

    #[test]
    fn test_place_segment() {
        let (mut session, mic, _) = session();
        let id = session.place_segment(mic, 2.0, 5.0, Polarity::Input).unwrap();

        let found = session.timeline().segment_at(mic, 3.0).map(|s| s.id);
        assert_eq!(found, Some(id));
    }

    #[test]
    fn test_place_segment_rejections() {
        let (mut session, mic, empty) = session();

        let code = |r: Result<SegmentId>| r.unwrap_err().error_code();
        assert_eq!(code(session.place_segment(mic, 5.0, 5.0, Polarity::Input)), "INVALID_SEGMENT");
        assert_eq!(code(session.place_segment(mic, -1.0, 2.0, Polarity::Input)), "INVALID_SEGMENT");
        assert_eq!(
            code(session.place_segment(mic, 0.0, 2.0, Polarity::Output)),
            "UNSUPPORTED_POLARITY"
        );
        assert_eq!(code(session.place_segment(empty, 0.0, 2.0, Polarity::Input)), "UNCONFIGURED");
        assert_eq!(
            code(session.place_segment(LayerId(50), 0.0, 2.0, Polarity::Input)),
            "UNKNOWN_LAYER"
        );
        assert!(session.segments().get_segments(mic).is_empty());
    }

    #[test]
    fn test_edit_segment() {
        let (mut session, mic, _) = session();
        let id = session.place_segment(mic, 1.0, 2.0, Polarity::Input).unwrap();

        let mut edited = session.segments().get_segment(mic, id).unwrap().clone();
        edited.stop = 4.0;
        session.edit_segment(mic, &edited).unwrap();
        assert_eq!(session.segments().get_segment(mic, id).unwrap().stop, 4.0);

        edited.start = 9.0;
        assert!(session.edit_segment(mic, &edited).is_err());
        assert_eq!(session.segments().get_segment(mic, id).unwrap().start, 1.0);
    }

    #[test]
    fn test_subscribers_fire_on_place() {
        let (mut session, mic, _) = session();
        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);
        session.subscribe(mic, move || counter.set(counter.get() + 1));

        session.place_segment(mic, 0.0, 1.0, Polarity::Input).unwrap();
        assert!(session.place_segment(mic, 1.0, 0.0, Polarity::Input).is_err());

        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_snapshot_and_load() {
        let (mut session, mic, _) = session();
        session.place_segment(mic, 0.0, 4.0, Polarity::Input).unwrap();
        session.place_segment(mic, 8.0, 12.0, Polarity::Input).unwrap();
        let saved = session.snapshot();

        let mut restored = Session::new(DeviceSchemaRegistry::with_defaults(), 0, Tempo::default());
        restored.load(&saved).unwrap();

        assert_eq!(restored.snapshot(), saved);
        assert_eq!(restored.devices(), session.devices());
    }

    #[test]
    fn test_load_notifies_then_drops_subscribers() {
        let (mut session, mic, _) = session();
        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);
        session.subscribe(mic, move || counter.set(counter.get() + 1));

        let saved = session.snapshot();
        session.load(&saved).unwrap();
        assert_eq!(calls.get(), 1);
        assert_eq!(session.segments().subscriber_count(mic), 0);
    }

    #[test]
    fn test_load_rejects_bad_file_without_mutation() {
        let (mut session, mic, _) = session();
        session.place_segment(mic, 0.0, 4.0, Polarity::Input).unwrap();
        let before = session.snapshot();

        let mut bad = before.clone();
        bad.blocks.get_mut(&mic).unwrap().device_kind = Some("Theremin".to_string());
        bad.segments.get_mut(&mic).unwrap().push(SegmentRecord {
            start: 3.0,
            stop: 1.0,
            polarity: Polarity::Input,
        });

        match session.load(&bad).unwrap_err() {
            EditorError::Validation(errors) => {
                assert_eq!(errors.codes(), vec!["NOT_FOUND", "INVALID_SEGMENT"])
            }
            other => panic!("expected validation errors, got {:?}", other),
        }
        assert_eq!(session.snapshot(), before);
    }

    #[test]
    fn test_load_rejects_layer_id_past_max() {
        let (mut session, _, _) = session();
        let before = session.snapshot();
        let project = ProjectFile::from_json(
            r#"{
                "blocks": {"18446744073709551615": {"name": "Huge", "type": null, "data": {}}},
                "segments": {"18446744073709551615": [{"start": 0.0, "stop": 1.0, "type": "input"}]}
            }"#,
        )
        .unwrap();

        match session.load(&project).unwrap_err() {
            EditorError::Validation(errors) => assert_eq!(errors.codes(), vec!["ID_OUT_OF_RANGE"]),
            other => panic!("expected validation errors, got {:?}", other),
        }
        assert_eq!(session.snapshot(), before);
        assert_eq!(session.add_layer(), LayerId(2));
    }

    #[test]
    fn test_load_adds_layers_for_orphan_segments() {
        let mut project = ProjectFile::default();
        project.segments.insert(
            LayerId(3),
            vec![SegmentRecord {
                start: 0.0,
                stop: 1.0,
                polarity: Polarity::Output,
            }],
        );
        let mut session = Session::new(DeviceSchemaRegistry::with_defaults(), 0, Tempo::default());
        session.load(&project).unwrap();

        assert!(session.blocks().contains(LayerId(3)));
        assert_eq!(session.add_layer(), LayerId(4));
    }

    #[test]
    fn test_playback_request_uses_tempo() {
        let (mut session, _, _) = session();
        session.set_tempo(Tempo {
            bpm: 120.0,
            beats_per_measure: 3,
            beat_duration: 4,
        });
        let request = session.playback_request();
        assert_eq!(request.config.tempo.bpm, 120.0);
        assert_eq!(request.config.devices.len(), 1);
    }
}
