//! Frame-ordered keyframe indices.
//!
//! Tracks map frame indices to positions in the owning keyframe vector
//! through a `BTreeMap`, giving ordered iteration plus the
//! nearest-previous/next range queries animation playback needs.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

/// Ordered index of one track: frame index to keyframe-vector position.
#[derive(Clone, Debug, Default)]
pub struct Track {
    frames: BTreeMap<u32, usize>,
}

impl Track {
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Insert a keyframe position; fails (returning `false`) when the
    /// frame is already occupied, leaving the track unchanged.
    pub fn insert(&mut self, frame_index: u32, position: usize) -> bool {
        match self.frames.entry(frame_index) {
            Entry::Vacant(entry) => {
                entry.insert(position);
                true
            }
            Entry::Occupied(_) => false,
        }
    }

    /// Remove a frame, returning the stored position if it was present.
    pub fn remove(&mut self, frame_index: u32) -> Option<usize> {
        self.frames.remove(&frame_index)
    }

    /// Exact-frame lookup.
    pub fn find(&self, frame_index: u32) -> Option<usize> {
        self.frames.get(&frame_index).copied()
    }

    /// Nearest keyframes around `frame_index`: the last at or before it
    /// and the first strictly after it.
    pub fn search_closest(&self, frame_index: u32) -> (Option<usize>, Option<usize>) {
        let previous = self.frames.range(..=frame_index).next_back().map(|(_, &p)| p);
        let next = frame_index
            .checked_add(1)
            .and_then(|start| self.frames.range(start..).next().map(|(_, &p)| p));
        (previous, next)
    }

    /// Positions in ascending frame order.
    pub fn positions(&self) -> impl Iterator<Item = usize> + '_ {
        self.frames.values().copied()
    }

    /// Largest frame index in the track.
    pub fn max_frame_index(&self) -> Option<u32> {
        self.frames.keys().next_back().copied()
    }

    /// Fix stored positions after the owning vector removed `removed`.
    pub fn reindex_after_removal(&mut self, removed: usize) {
        for position in self.frames.values_mut() {
            if *position > removed {
                *position -= 1;
            }
        }
    }
}

/// Name-partitioned track set for bone and morph keyframes.
#[derive(Clone, Debug, Default)]
pub struct NamedTrackSet {
    tracks: BTreeMap<String, Track>,
}

impl NamedTrackSet {
    pub fn track(&self, name: &str) -> Option<&Track> {
        self.tracks.get(name)
    }

    pub fn track_mut(&mut self, name: &str) -> &mut Track {
        self.tracks.entry(name.to_string()).or_default()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tracks.keys().map(String::as_str)
    }

    pub fn tracks(&self) -> impl Iterator<Item = &Track> {
        self.tracks.values()
    }

    pub fn insert(&mut self, name: &str, frame_index: u32, position: usize) -> bool {
        self.track_mut(name).insert(frame_index, position)
    }

    pub fn remove(&mut self, name: &str, frame_index: u32) -> Option<usize> {
        let track = self.tracks.get_mut(name)?;
        let removed = track.remove(frame_index);
        if track.is_empty() {
            self.tracks.remove(name);
        }
        removed
    }

    pub fn find(&self, name: &str, frame_index: u32) -> Option<usize> {
        self.tracks.get(name)?.find(frame_index)
    }

    pub fn search_closest(&self, name: &str, frame_index: u32) -> (Option<usize>, Option<usize>) {
        match self.tracks.get(name) {
            Some(track) => track.search_closest(frame_index),
            None => (None, None),
        }
    }

    pub fn max_frame_index(&self) -> Option<u32> {
        self.tracks.values().filter_map(Track::max_frame_index).max()
    }

    pub fn reindex_after_removal(&mut self, removed: usize) {
        for track in self.tracks.values_mut() {
            track.reindex_after_removal(removed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_rejects_duplicate_frame() {
        let mut track = Track::default();
        assert!(track.insert(0, 0));
        assert!(!track.insert(0, 1));
        assert_eq!(track.len(), 1);
        assert_eq!(track.find(0), Some(0));
    }

    #[test]
    fn test_search_closest_brackets_the_frame() {
        let mut track = Track::default();
        track.insert(0, 0);
        track.insert(10, 1);
        track.insert(20, 2);
        assert_eq!(track.search_closest(10), (Some(1), Some(2)));
        assert_eq!(track.search_closest(15), (Some(1), Some(2)));
        assert_eq!(track.search_closest(25), (Some(2), None));
        // Before the first keyframe there is no previous
        let empty = Track::default();
        assert_eq!(empty.search_closest(5), (None, None));
    }

    #[test]
    fn test_positions_stay_frame_ordered_regardless_of_insert_order() {
        let mut track = Track::default();
        track.insert(20, 0);
        track.insert(0, 1);
        track.insert(10, 2);
        let positions: Vec<usize> = track.positions().collect();
        assert_eq!(positions, vec![1, 2, 0]);
    }

    #[test]
    fn test_reindex_after_removal() {
        let mut set = NamedTrackSet::default();
        set.insert("a", 0, 0);
        set.insert("b", 0, 1);
        set.insert("a", 5, 2);
        assert_eq!(set.remove("b", 0), Some(1));
        set.reindex_after_removal(1);
        assert_eq!(set.find("a", 0), Some(0));
        assert_eq!(set.find("a", 5), Some(1));
        // The emptied track is dropped entirely
        assert!(set.track("b").is_none());
    }
}
