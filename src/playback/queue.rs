//! The play queue: an ordered list of tracks independent from any
//! playlist's own order, plus the position of the item being played.

use super::model::{Track, TrackOrigin};
use rand::seq::SliceRandom;
use rand::Rng;

/// Unique id of a queue entry. Lets list diffing tell "same track, moved"
/// apart from "different track".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueueItemId(u64);

impl QueueItemId {
    pub fn get(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueueItem {
    id: QueueItemId,
    pub src: String,
    pub title: String,
    pub original_index: usize,
    pub origin: Option<TrackOrigin>,
}

impl QueueItem {
    pub fn id(&self) -> QueueItemId {
        self.id
    }
}

/// Mints queue item ids. The counter only moves forward, so ids are never
/// reused even after the queue is cleared.
#[derive(Debug, Default)]
struct QueueIds {
    next: u64,
}

impl QueueIds {
    fn issue(&mut self, track: &Track, original_index: usize, origin: Option<&TrackOrigin>) -> QueueItem {
        self.next += 1;
        QueueItem {
            id: QueueItemId(self.next),
            src: track.src.clone(),
            title: track.title.clone(),
            original_index,
            origin: origin.cloned(),
        }
    }
}

#[derive(Debug, Default)]
pub struct PlayQueue {
    items: Vec<QueueItem>,
    index: usize,
    ids: QueueIds,
}

impl PlayQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[QueueItem] {
        &self.items
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Position of the current item. Meaningless while the queue is empty.
    pub fn index(&self) -> usize {
        self.index
    }

    #[cfg(test)]
    pub fn current(&self) -> Option<&QueueItem> {
        self.items.get(self.index)
    }

    pub fn get(&self, index: usize) -> Option<&QueueItem> {
        self.items.get(index)
    }

    pub fn position_of(&self, src: &str) -> Option<usize> {
        self.items.iter().position(|item| item.src == src)
    }

    pub fn push(&mut self, track: &Track, original_index: usize, origin: Option<&TrackOrigin>) -> QueueItemId {
        let item = self.ids.issue(track, original_index, origin);
        let id = item.id;
        self.items.push(item);
        id
    }

    /// Inserts right after the current item and makes it current.
    pub fn insert_next_and_select(
        &mut self,
        track: &Track,
        original_index: usize,
        origin: Option<&TrackOrigin>,
    ) -> usize {
        let item = self.ids.issue(track, original_index, origin);
        let at = if self.items.is_empty() {
            0
        } else {
            self.index + 1
        };
        self.items.insert(at, item);
        self.index = at;
        at
    }

    /// Replaces the queue with a playlist, starting from the clicked track.
    ///
    /// Without an rng the playlist is rotated so `start` comes first and the
    /// rest keep their relative order. With an rng the clicked track comes
    /// first and every other track follows in a uniformly shuffled order.
    pub fn populate<R: Rng + ?Sized>(
        &mut self,
        tracks: &[Track],
        start: usize,
        origin: Option<&TrackOrigin>,
        shuffle: Option<&mut R>,
    ) {
        self.items.clear();
        self.index = 0;
        if tracks.is_empty() {
            return;
        }
        let start = start.min(tracks.len() - 1);

        let mut order: Vec<usize> = (start..tracks.len()).chain(0..start).collect();
        if let Some(rng) = shuffle {
            order[1..].shuffle(rng);
        }

        for original_index in order {
            let item = self.ids.issue(&tracks[original_index], original_index, origin);
            self.items.push(item);
        }
    }

    /// Removes an entry. The current position keeps pointing at the same
    /// item; when that item is the one removed it clamps to the nearest
    /// remaining position.
    pub fn remove(&mut self, index: usize) -> Option<QueueItem> {
        if index >= self.items.len() {
            return None;
        }
        let removed = self.items.remove(index);

        if self.items.is_empty() {
            self.index = 0;
        } else if index < self.index {
            self.index -= 1;
        } else if index == self.index {
            self.index = self.index.min(self.items.len() - 1);
        }
        Some(removed)
    }

    /// Moves the entry at `from` to `to`. Returns false for out-of-range
    /// positions.
    pub fn reorder(&mut self, from: usize, to: usize) -> bool {
        let len = self.items.len();
        if from >= len || to >= len {
            return false;
        }
        if from == to {
            return true;
        }

        let current_id = self.items[self.index].id;
        let item = self.items.remove(from);
        self.items.insert(to, item);
        self.index = self
            .items
            .iter()
            .position(|item| item.id == current_id)
            .unwrap_or(0);
        true
    }

    /// Keeps the current item, shuffles the rest behind it and makes the
    /// current item the head of the queue.
    pub fn shuffle_around_current<R: Rng + ?Sized>(&mut self, rng: &mut R) -> bool {
        if self.items.len() <= 1 {
            return false;
        }
        let current = self.items.remove(self.index);
        self.items.shuffle(rng);
        self.items.insert(0, current);
        self.index = 0;
        true
    }

    /// Moves to the next entry. Returns the new position, or `None` when the
    /// end is reached without wrapping.
    pub fn advance(&mut self, wrap: bool) -> Option<usize> {
        if self.items.is_empty() {
            return None;
        }
        if self.index + 1 < self.items.len() {
            self.index += 1;
        } else if wrap {
            self.index = 0;
        } else {
            return None;
        }
        Some(self.index)
    }

    pub fn retreat(&mut self, wrap: bool) -> Option<usize> {
        if self.items.is_empty() {
            return None;
        }
        if self.index > 0 {
            self.index -= 1;
        } else if wrap {
            self.index = self.items.len() - 1;
        } else {
            return None;
        }
        Some(self.index)
    }

    pub fn select(&mut self, index: usize) -> bool {
        if index >= self.items.len() {
            return false;
        }
        self.index = index;
        true
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.index = 0;
    }
}
