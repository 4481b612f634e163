//! Centroid-based object registry
//!
//! Assigns persistent ids to per-frame detections and carries them across
//! missed frames. Matching is greedy nearest-neighbor over the pairwise
//! distance matrix: cheap, deterministic under tie-break-by-scan-order, and
//! adequate while per-frame displacement stays small relative to the spacing
//! between objects. It is not a minimum-cost assignment.

use crate::domain::types::{Centroid, TrackId};
use smallvec::SmallVec;
use std::collections::BTreeMap;

/// Per-object state owned by the registry
#[derive(Debug, Clone)]
pub struct TrackedPoint {
    pub centroid: Centroid,
    /// Consecutive frames without a matching detection
    pub disappeared: u32,
}

/// Tracks objects across frames by centroid proximity
///
/// Ids are monotonic and never reused, so iteration over the id-ordered map
/// is also registration order.
pub struct CentroidRegistry {
    objects: BTreeMap<TrackId, TrackedPoint>,
    next_id: u64,
    max_disappeared: u32,
    max_distance: f32,
}

impl CentroidRegistry {
    pub fn new(max_disappeared: u32, max_distance: f32) -> Self {
        Self { objects: BTreeMap::new(), next_id: 0, max_disappeared, max_distance }
    }

    /// Update the registry with one frame's detection centroids
    ///
    /// Called exactly once per frame, possibly with an empty slice. Returns
    /// the current id-to-state mapping in registry order.
    pub fn update(&mut self, detections: &[Centroid]) -> &BTreeMap<TrackId, TrackedPoint> {
        if self.objects.is_empty() {
            for &centroid in detections {
                self.register(centroid);
            }
            return &self.objects;
        }

        if detections.is_empty() {
            self.age_all();
            return &self.objects;
        }

        self.match_detections(detections);
        &self.objects
    }

    /// Greedy global-minimum association between existing objects and
    /// this frame's detections
    fn match_detections(&mut self, detections: &[Centroid]) {
        let ids: SmallVec<[TrackId; 16]> = self.objects.keys().copied().collect();

        // All candidate pairs, cheapest first; ties resolve by object scan
        // order then detection scan order, so the earlier-registered object
        // wins an equidistant detection.
        let mut candidates: Vec<(f32, usize, usize)> =
            Vec::with_capacity(ids.len() * detections.len());
        for (row, id) in ids.iter().enumerate() {
            let object_centroid = self.objects[id].centroid;
            for (col, detection) in detections.iter().enumerate() {
                candidates.push((object_centroid.distance_to(detection), row, col));
            }
        }
        candidates
            .sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)).then(a.2.cmp(&b.2)));

        let mut row_used: SmallVec<[bool; 16]> = SmallVec::from_elem(false, ids.len());
        let mut col_used: SmallVec<[bool; 16]> = SmallVec::from_elem(false, detections.len());

        for &(distance, row, col) in &candidates {
            if distance > self.max_distance {
                // Sorted ascending: nothing closer remains, the rest stay unmatched
                break;
            }
            if row_used[row] || col_used[col] {
                continue;
            }
            if let Some(point) = self.objects.get_mut(&ids[row]) {
                point.centroid = detections[col];
                point.disappeared = 0;
            }
            row_used[row] = true;
            col_used[col] = true;
        }

        // Unmatched objects age and may be evicted
        for (row, id) in ids.iter().enumerate() {
            if row_used[row] {
                continue;
            }
            self.age_one(*id);
        }

        // Unmatched detections become new objects
        for (col, &centroid) in detections.iter().enumerate() {
            if !col_used[col] {
                self.register(centroid);
            }
        }
    }

    fn register(&mut self, centroid: Centroid) -> TrackId {
        let id = TrackId(self.next_id);
        self.next_id += 1;
        self.objects.insert(id, TrackedPoint { centroid, disappeared: 0 });
        id
    }

    /// Increment one object's disappearance counter, evicting past the limit
    fn age_one(&mut self, id: TrackId) {
        let evict = match self.objects.get_mut(&id) {
            Some(point) => {
                point.disappeared += 1;
                point.disappeared > self.max_disappeared
            }
            None => false,
        };
        if evict {
            self.objects.remove(&id);
        }
    }

    /// A frame with zero detections ages every object
    fn age_all(&mut self) {
        let ids: SmallVec<[TrackId; 16]> = self.objects.keys().copied().collect();
        for id in ids {
            self.age_one(id);
        }
    }

    pub fn objects(&self) -> &BTreeMap<TrackId, TrackedPoint> {
        &self.objects
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}
