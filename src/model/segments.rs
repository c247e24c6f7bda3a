//! Segment Store
//!
//! Per-layer collections of time intervals (in measures) marking when a
//! layer reads or writes audio. Collections keep insertion order; nothing
//! here sorts by time.
//!
//! Views subscribe per layer and are notified synchronously after every
//! insert or update on that layer, in subscription order.

use std::collections::BTreeMap;
use std::fmt;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use super::ids::{IdAllocator, LayerId, SegmentId};
use crate::error::{EditorError, Result};

/// Whether a segment marks reading (input) or writing (output)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Polarity {
    Input,
    Output,
}

impl Polarity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Polarity::Input => "input",
            Polarity::Output => "output",
        }
    }
}

impl fmt::Display for Polarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Polarity {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "input" => Ok(Polarity::Input),
            "output" => Ok(Polarity::Output),
            other => Err(format!("unknown segment type '{}'", other)),
        }
    }
}

/// A time interval on one layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub id: SegmentId,
    /// Start measure
    pub start: f64,
    /// Stop measure
    pub stop: f64,
    #[serde(rename = "type")]
    pub polarity: Polarity,
}

impl Segment {
    pub fn new(id: SegmentId, start: f64, stop: f64, polarity: Polarity) -> Self {
        Self {
            id,
            start,
            stop,
            polarity,
        }
    }

    /// Copy start, stop and polarity from another segment, keeping this id
    pub fn copy_from(&mut self, other: &Segment) {
        self.start = other.start;
        self.stop = other.stop;
        self.polarity = other.polarity;
    }

    pub fn duration(&self) -> f64 {
        self.stop - self.start
    }

    /// Open-interval containment: boundary measures are outside.
    pub fn contains(&self, measure: f64) -> bool {
        self.start < measure && measure < self.stop
    }

    /// Finite, non-negative and `start < stop`
    pub fn is_well_formed(&self) -> bool {
        self.start.is_finite() && self.stop.is_finite() && self.start >= 0.0 && self.start < self.stop
    }
}

/// Receives change notifications for one layer's segments
pub trait SegmentSubscriber {
    fn segments_changed(&mut self);
}

impl<F: FnMut()> SegmentSubscriber for F {
    fn segments_changed(&mut self) {
        self()
    }
}

struct Subscription {
    layer: LayerId,
    subscriber: Box<dyn SegmentSubscriber>,
}

/// Owns every segment of the session and the per-layer subscriber lists
#[derive(Default)]
pub struct SegmentStore {
    segments: BTreeMap<LayerId, Vec<Segment>>,
    /// All subscriptions in registration order
    subscriptions: Vec<Subscription>,
    ids: IdAllocator,
}

impl SegmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a segment with a fresh id from this store's counter
    pub fn create_segment(&mut self, start: f64, stop: f64, polarity: Polarity) -> Segment {
        Segment::new(SegmentId(self.ids.next_id()), start, stop, polarity)
    }

    /// Append a segment to the layer's collection and notify its subscribers.
    ///
    /// A segment id the allocator cannot reserve is refused with
    /// `IdOutOfRange`; nothing is inserted and nobody is notified.
    pub fn add_segment(&mut self, layer: LayerId, segment: Segment) -> Result<()> {
        self.ids.reserve_past(segment.id.0)?;
        debug!(
            "Adding {} segment {} [{}, {}] to layer {}",
            segment.polarity, segment.id, segment.start, segment.stop, layer
        );
        self.segments.entry(layer).or_default().push(segment);
        self.notify(layer);
        Ok(())
    }

    /// Overwrite the segment with the same id in place.
    ///
    /// Fails with `UpdateTargetMissing` when the layer has no segment with
    /// that id; nothing is inserted and nobody is notified.
    pub fn update_segment(&mut self, layer: LayerId, segment: &Segment) -> Result<()> {
        let target = self
            .segments
            .get_mut(&layer)
            .and_then(|segments| segments.iter_mut().find(|s| s.id == segment.id));

        match target {
            Some(existing) => {
                existing.copy_from(segment);
                debug!("Updated segment {} on layer {}", segment.id, layer);
                self.notify(layer);
                Ok(())
            }
            None => {
                warn!(
                    "Could not find segment {} to update for layer {}",
                    segment.id, layer
                );
                Err(EditorError::UpdateTargetMissing {
                    layer,
                    segment: segment.id,
                })
            }
        }
    }

    /// The layer's segments in insertion order
    pub fn get_segments(&self, layer: LayerId) -> &[Segment] {
        self.segments
            .get(&layer)
            .map(|segments| segments.as_slice())
            .unwrap_or(&[])
    }

    pub fn get_segment(&self, layer: LayerId, id: SegmentId) -> Option<&Segment> {
        self.get_segments(layer).iter().find(|s| s.id == id)
    }

    /// First segment in stored order whose open interval contains `measure`
    pub fn get_segment_at_measure(&self, layer: LayerId, measure: f64) -> Option<&Segment> {
        self.get_segments(layer).iter().find(|s| s.contains(measure))
    }

    /// Every layer's segments
    pub fn all_segments(&self) -> &BTreeMap<LayerId, Vec<Segment>> {
        &self.segments
    }

    /// Count of a layer's segments with the given polarity
    pub fn count(&self, layer: LayerId, polarity: Polarity) -> usize {
        self.get_segments(layer)
            .iter()
            .filter(|s| s.polarity == polarity)
            .count()
    }

    /// Remove every segment, then notify every subscriber once in
    /// registration order.
    pub fn clear_all(&mut self) {
        debug!("Clearing segments on {} layers", self.segments.len());
        self.segments.clear();
        for subscription in self.subscriptions.iter_mut() {
            subscription.subscriber.segments_changed();
        }
    }

    /// Register a subscriber for one layer
    pub fn subscribe(&mut self, layer: LayerId, subscriber: impl SegmentSubscriber + 'static) {
        self.subscriptions.push(Subscription {
            layer,
            subscriber: Box::new(subscriber),
        });
    }

    /// Drop every subscriber on every layer
    pub fn clear_all_callbacks(&mut self) {
        self.subscriptions.clear();
    }

    pub fn subscriber_count(&self, layer: LayerId) -> usize {
        self.subscriptions.iter().filter(|s| s.layer == layer).count()
    }

    fn notify(&mut self, layer: LayerId) {
        for subscription in self.subscriptions.iter_mut().filter(|s| s.layer == layer) {
            subscription.subscriber.segments_changed();
        }
    }
}

impl fmt::Debug for SegmentStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SegmentStore")
            .field("segments", &self.segments)
            .field("subscriptions", &self.subscriptions.len())
            .field("next_id", &self.ids.peek())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    const L: LayerId = LayerId(0);

    fn recorder() -> Rc<RefCell<Vec<&'static str>>> {
        Rc::new(RefCell::new(Vec::new()))
    }

    fn record(log: &Rc<RefCell<Vec<&'static str>>>, name: &'static str) -> impl FnMut() {
        let log = Rc::clone(log);
        move || log.borrow_mut().push(name)
    }

    #[test]
    fn test_point_lookup_uses_open_interval() {
        let mut store = SegmentStore::new();
        let segment = store.create_segment(2.0, 5.0, Polarity::Input);
        store.add_segment(L, segment.clone()).unwrap();

        assert_eq!(store.get_segment_at_measure(L, 3.0), Some(&segment));
        assert_eq!(store.get_segment_at_measure(L, 2.0), None);
        assert_eq!(store.get_segment_at_measure(L, 5.0), None);
        assert_eq!(store.get_segment_at_measure(L, 4.999), Some(&segment));
    }

    #[test]
    fn test_point_lookup_returns_first_in_stored_order() {
        let mut store = SegmentStore::new();
        let late = store.create_segment(4.0, 10.0, Polarity::Output);
        let early = store.create_segment(0.0, 6.0, Polarity::Output);
        store.add_segment(L, late.clone()).unwrap();
        store.add_segment(L, early).unwrap();

        assert_eq!(store.get_segment_at_measure(L, 5.0).map(|s| s.id), Some(late.id));
    }

    #[test]
    fn test_insertion_order_is_kept() {
        let mut store = SegmentStore::new();
        let a = store.create_segment(8.0, 9.0, Polarity::Output);
        let b = store.create_segment(1.0, 2.0, Polarity::Output);
        store.add_segment(L, a.clone()).unwrap();
        store.add_segment(L, b.clone()).unwrap();

        let ids: Vec<SegmentId> = store.get_segments(L).iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![a.id, b.id]);
    }

    #[test]
    fn test_update_in_place() {
        let mut store = SegmentStore::new();
        let first = store.create_segment(0.0, 1.0, Polarity::Input);
        let second = store.create_segment(2.0, 3.0, Polarity::Input);
        store.add_segment(L, first.clone()).unwrap();
        store.add_segment(L, second.clone()).unwrap();

        let mut edited = first.clone();
        edited.stop = 1.5;
        edited.polarity = Polarity::Output;
        store.update_segment(L, &edited).unwrap();

        let segments = store.get_segments(L);
        assert_eq!(segments[0], edited);
        assert_eq!(segments[1], second);
    }

    #[test]
    fn test_update_missing_id_changes_nothing() {
        let mut store = SegmentStore::new();
        let log = recorder();
        store.subscribe(L, record(&log, "view"));

        let kept = store.create_segment(0.0, 1.0, Polarity::Input);
        store.add_segment(L, kept.clone()).unwrap();
        let stray = store.create_segment(5.0, 6.0, Polarity::Input);

        let err = store.update_segment(L, &stray).unwrap_err();
        assert_eq!(err.error_code(), "UPDATE_TARGET_MISSING");
        assert_eq!(store.get_segments(L), &[kept]);
        // One notification from the add, none from the failed update
        assert_eq!(log.borrow().len(), 1);
    }

    #[test]
    fn test_update_on_unknown_layer_fails() {
        let mut store = SegmentStore::new();
        let segment = store.create_segment(0.0, 1.0, Polarity::Input);
        assert!(store.update_segment(LayerId(7), &segment).is_err());
        assert!(store.get_segments(LayerId(7)).is_empty());
    }

    #[test]
    fn test_subscribers_run_in_order_once_each() {
        let mut store = SegmentStore::new();
        let log = recorder();
        store.subscribe(L, record(&log, "first"));
        store.subscribe(L, record(&log, "second"));
        store.subscribe(LayerId(1), record(&log, "other layer"));

        let segment = store.create_segment(0.0, 4.0, Polarity::Output);
        store.add_segment(L, segment).unwrap();

        assert_eq!(*log.borrow(), vec!["first", "second"]);
    }

    #[test]
    fn test_clear_all_notifies_every_layer_in_registration_order() {
        let mut store = SegmentStore::new();
        let log = recorder();
        store.subscribe(LayerId(2), record(&log, "a"));
        store.subscribe(LayerId(0), record(&log, "b"));
        store.subscribe(LayerId(2), record(&log, "c"));

        let segment = store.create_segment(0.0, 1.0, Polarity::Input);
        store.add_segment(LayerId(5), segment).unwrap();
        store.clear_all();

        assert_eq!(*log.borrow(), vec!["a", "b", "c"]);
        assert!(store.all_segments().is_empty());
    }

    #[test]
    fn test_clear_all_callbacks() {
        let mut store = SegmentStore::new();
        let log = recorder();
        store.subscribe(L, record(&log, "view"));
        assert_eq!(store.subscriber_count(L), 1);

        store.clear_all_callbacks();
        store.clear_all();

        assert_eq!(store.subscriber_count(L), 0);
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_add_refuses_out_of_range_id() {
        let mut store = SegmentStore::new();
        let log = recorder();
        store.subscribe(L, record(&log, "view"));

        let segment = Segment::new(SegmentId(u64::MAX), 0.0, 1.0, Polarity::Input);
        let err = store.add_segment(L, segment).unwrap_err();

        assert_eq!(err.error_code(), "ID_OUT_OF_RANGE");
        assert!(store.get_segments(L).is_empty());
        assert!(log.borrow().is_empty());
        assert_eq!(store.create_segment(0.0, 1.0, Polarity::Input).id, SegmentId(0));
    }

    #[test]
    fn test_ids_not_reused_after_clear() {
        let mut store = SegmentStore::new();
        let a = store.create_segment(0.0, 1.0, Polarity::Input);
        store.add_segment(L, a.clone()).unwrap();
        store.clear_all();

        let b = store.create_segment(0.0, 1.0, Polarity::Input);
        assert!(b.id > a.id);
    }

    #[test]
    fn test_isolated_stores_allocate_independently() {
        let mut one = SegmentStore::new();
        let mut two = SegmentStore::new();
        assert_eq!(
            one.create_segment(0.0, 1.0, Polarity::Input).id,
            two.create_segment(0.0, 1.0, Polarity::Input).id
        );
    }

    #[test]
    fn test_segment_helpers() {
        let mut segment = Segment::new(SegmentId(3), 1.5, 4.0, Polarity::Input);
        assert_eq!(segment.duration(), 2.5);
        assert!(segment.is_well_formed());

        segment.copy_from(&Segment::new(SegmentId(9), 6.0, 2.0, Polarity::Output));
        assert_eq!(segment.id, SegmentId(3));
        assert_eq!(segment.polarity, Polarity::Output);
        assert!(!segment.is_well_formed());
    }

    #[test]
    fn test_segment_wire_format() {
        let segment = Segment::new(SegmentId(1), 10.0, 14.0, Polarity::Input);
        let json = serde_json::to_value(&segment).unwrap();
        assert_eq!(json["type"], "input");
        assert_eq!(json["start"], 10.0);
    }
}
