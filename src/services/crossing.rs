//! Line-crossing detection over per-id centroid histories
//!
//! The reference line is the horizontal midline of the frame. Direction is
//! judged against the mean of the id's entire prior history rather than the
//! previous sample, which smooths single-frame jitter. Each id is counted at
//! most once for its lifetime: the `counted` flag never resets, so one
//! identity contributes one increment to one counter.

use crate::domain::types::{Centroid, Direction, TrackId};
use rustc_hash::FxHashMap;
use std::collections::hash_map::Entry;

/// Append-only centroid history and counting state for one id
#[derive(Debug)]
pub struct TrackHistory {
    pub centroids: Vec<Centroid>,
    pub counted: bool,
}

/// What one frame's observation of an id amounted to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observation {
    /// First sighting; history seeded, no direction to compare yet
    New,
    /// Known id, no crossing committed this frame
    Tracked,
    /// Known id crossed the reference line this frame
    Crossed(Direction),
}

/// Per-id crossing state, keyed by the registry's ids
///
/// Histories do not survive eviction: once `retain` drops an id, a person
/// who re-appears is a fresh id with a fresh, uncounted history.
pub struct CrossingCounter {
    tracks: FxHashMap<TrackId, TrackHistory>,
}

impl CrossingCounter {
    pub fn new() -> Self {
        Self { tracks: FxHashMap::default() }
    }

    /// Observe one live id's centroid for this frame
    pub fn observe(&mut self, id: TrackId, centroid: Centroid, frame_height: u32) -> Observation {
        match self.tracks.entry(id) {
            Entry::Vacant(vacant) => {
                vacant.insert(TrackHistory { centroids: vec![centroid], counted: false });
                Observation::New
            }
            Entry::Occupied(mut occupied) => {
                let history = occupied.get_mut();
                let mean_y = history.centroids.iter().map(|c| c.y).sum::<f32>()
                    / history.centroids.len() as f32;
                let direction = centroid.y - mean_y;
                history.centroids.push(centroid);

                if history.counted {
                    return Observation::Tracked;
                }

                let midline = frame_height as f32 / 2.0;
                if direction < 0.0 && centroid.y < midline {
                    history.counted = true;
                    Observation::Crossed(Direction::Out)
                } else if direction > 0.0 && centroid.y > midline {
                    history.counted = true;
                    Observation::Crossed(Direction::In)
                } else {
                    Observation::Tracked
                }
            }
        }
    }

    /// Drop histories whose ids the registry no longer tracks
    ///
    /// Returns how many were dropped.
    pub fn retain<F>(&mut self, mut keep: F) -> usize
    where
        F: FnMut(&TrackId) -> bool,
    {
        let before = self.tracks.len();
        self.tracks.retain(|id, _| keep(id));
        before - self.tracks.len()
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    #[cfg(test)]
    pub fn is_counted(&self, id: TrackId) -> Option<bool> {
        self.tracks.get(&id).map(|t| t.counted)
    }
}

impl Default for CrossingCounter {
    fn default() -> Self {
        Self::new()
    }
}
