//! Doubly-linked playlist with per-node stable ids, realised as an arena so
//! the structure stays safe Rust instead of raw prev/next pointers.
//!
//! Grounded on `src/playlist.c`'s `SongNode`/`PlayList` pair in the original
//! source; the REDESIGN FLAGS (spec.md §9) call for arena indices in place
//! of the original's pointer-linked list, which is what `NodeId` plus
//! `Vec<Slot>` gives us here.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// A stable identifier for a node within one playlist instance. Not unique
/// across playlists — `active` and `unshuffled` share the same id space by
/// construction (spec.md §3), but a `Playlist`'s arena index is private to
/// that playlist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub i32);

/// Song identity as the playback core sees it: enough to open a decoder and
/// report duration, nothing about tags/art (those stay with the UI layer).
#[derive(Debug, Clone)]
pub struct SongNode {
    pub id: NodeId,
    pub file_path: String,
    pub duration_seconds: f64,
    pub has_errors: bool,
}

impl SongNode {
    pub fn new(id: NodeId, file_path: impl Into<String>) -> Self {
        Self {
            id,
            file_path: file_path.into(),
            duration_seconds: 0.0,
            has_errors: false,
        }
    }
}

struct Slot {
    song: SongNode,
    prev: Option<usize>,
    next: Option<usize>,
    /// `None` once the slot has been vacated by `delete`; arena indices are
    /// never reused so `NodeId` stays stable for the playlist's lifetime.
    live: bool,
}

/// `head`/`tail` order is the canonical play order for this instance
/// (`unshuffled` is display order, `active` is possibly-shuffled play
/// order — callers decide which semantics a given `Playlist` carries).
pub struct Playlist {
    arena: Vec<Slot>,
    head: Option<usize>,
    tail: Option<usize>,
    count: usize,
    next_id: i32,
    total_duration: Option<f64>,
}

impl Default for Playlist {
    fn default() -> Self {
        Self::new()
    }
}

impl Playlist {
    pub fn new() -> Self {
        Self {
            arena: Vec::new(),
            head: None,
            tail: None,
            count: 0,
            next_id: 0,
            total_duration: None,
        }
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn head(&self) -> Option<NodeId> {
        self.head.map(|idx| self.arena[idx].song.id)
    }

    pub fn tail(&self) -> Option<NodeId> {
        self.tail.map(|idx| self.arena[idx].song.id)
    }

    fn index_of(&self, id: NodeId) -> Option<usize> {
        self.arena
            .iter()
            .position(|s| s.live && s.song.id == id)
    }

    /// Appends a new song built from `file_path`, assigning it the next
    /// monotonic id. Returns the assigned id.
    pub fn add(&mut self, file_path: impl Into<String>) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        let song = SongNode::new(id, file_path);
        self.push_song(song);
        id
    }

    /// Appends a fully-formed node (used when rebuilding `active` from
    /// `unshuffled`, where ids must be preserved rather than reassigned).
    pub fn push_song(&mut self, song: SongNode) -> NodeId {
        let id = song.id;
        if id.0 >= self.next_id {
            self.next_id = id.0 + 1;
        }
        let idx = self.arena.len();
        let prev = self.tail;
        self.arena.push(Slot {
            song,
            prev,
            next: None,
            live: true,
        });
        if let Some(tail) = self.tail {
            self.arena[tail].next = Some(idx);
        } else {
            self.head = Some(idx);
        }
        self.tail = Some(idx);
        self.count += 1;
        self.total_duration = None;
        id
    }

    /// Unlinks the node with `id`, returning its `SongNode` to the caller.
    /// Adjusts `prev`/`next`/`head`/`tail`/`count`.
    pub fn delete(&mut self, id: NodeId) -> Option<SongNode> {
        let idx = self.index_of(id)?;
        let prev = self.arena[idx].prev;
        let next = self.arena[idx].next;

        match prev {
            Some(p) => self.arena[p].next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => self.arena[n].prev = prev,
            None => self.tail = prev,
        }

        self.arena[idx].live = false;
        self.count -= 1;
        self.total_duration = None;
        Some(self.arena[idx].song.clone())
    }

    pub fn find_by_id(&self, id: NodeId) -> Option<&SongNode> {
        self.index_of(id).map(|idx| &self.arena[idx].song)
    }

    pub fn find_by_id_mut(&mut self, id: NodeId) -> Option<&mut SongNode> {
        let idx = self.index_of(id)?;
        Some(&mut self.arena[idx].song)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SongNode> {
        let mut cur = self.head;
        std::iter::from_fn(move || {
            let idx = cur?;
            cur = self.arena[idx].next;
            Some(&self.arena[idx].song)
        })
    }

    pub fn next_of(&self, id: NodeId) -> Option<NodeId> {
        let idx = self.index_of(id)?;
        self.arena[idx].next.map(|n| self.arena[n].song.id)
    }

    pub fn prev_of(&self, id: NodeId) -> Option<NodeId> {
        let idx = self.index_of(id)?;
        self.arena[idx].prev.map(|p| self.arena[p].song.id)
    }

    /// Lazily recomputed sum of every live node's duration.
    pub fn total_duration(&mut self) -> f64 {
        if let Some(total) = self.total_duration {
            return total;
        }
        let total = self.iter().map(|s| s.duration_seconds).sum();
        self.total_duration = Some(total);
        total
    }

    /// Builds a playlist containing `self`'s nodes in the same order,
    /// reassigning nothing (ids and durations are carried over verbatim).
    /// Used to materialise the unshuffled view from `active` (or vice
    /// versa) per spec.md §3.
    pub fn deep_copy(&self) -> Playlist {
        let mut copy = Playlist::new();
        for song in self.iter() {
            copy.push_song(song.clone());
        }
        copy
    }

    /// Rebuilds this playlist as a permutation of `source`'s nodes with
    /// `current` placed first, followed by a Fisher-Yates shuffle (seeded,
    /// for test determinism and to match the original's seeded PRNG) of
    /// the remaining nodes.
    pub fn shuffle_from(&mut self, source: &Playlist, current: NodeId, seed: u64) {
        let mut rest: Vec<SongNode> = Vec::with_capacity(source.count());
        let mut head_song: Option<SongNode> = None;
        for song in source.iter() {
            if song.id == current {
                head_song = Some(song.clone());
            } else {
                rest.push(song.clone());
            }
        }

        let mut rng = StdRng::seed_from_u64(seed);
        rest.shuffle(&mut rng);

        *self = Playlist::new();
        if let Some(head) = head_song {
            self.push_song(head);
        }
        for song in rest {
            self.push_song(song);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn count_matches_forward_and_backward_traversal() {
        let mut list = Playlist::new();
        let a = list.add("a.mp3");
        let b = list.add("b.mp3");
        let c = list.add("c.mp3");

        assert_eq!(list.count(), 3);
        let forward: Vec<NodeId> = list.iter().map(|s| s.id).collect();
        assert_eq!(forward, vec![a, b, c]);

        assert_eq!(list.head(), Some(a));
        assert_eq!(list.tail(), Some(c));
        assert_eq!(list.prev_of(c), Some(b));
        assert_eq!(list.next_of(a), Some(b));
    }

    #[test]
    fn delete_unlinks_and_adjusts_endpoints() {
        let mut list = Playlist::new();
        let a = list.add("a.mp3");
        let b = list.add("b.mp3");
        let c = list.add("c.mp3");

        list.delete(b);
        assert_eq!(list.count(), 2);
        assert_eq!(list.next_of(a), Some(c));
        assert_eq!(list.prev_of(c), Some(a));
        assert!(list.find_by_id(b).is_none());
    }

    #[test]
    fn delete_head_and_tail_update_endpoints() {
        let mut list = Playlist::new();
        let a = list.add("a.mp3");
        let b = list.add("b.mp3");
        list.delete(a);
        assert_eq!(list.head(), Some(b));
        list.delete(b);
        assert_eq!(list.head(), None);
        assert_eq!(list.tail(), None);
    }

    #[test]
    fn shuffle_then_unshuffle_restores_original_order() {
        let mut unshuffled = Playlist::new();
        unshuffled.add("a.mp3");
        let current = unshuffled.add("b.mp3");
        unshuffled.add("c.mp3");
        unshuffled.add("d.mp3");

        let mut active = Playlist::new();
        active.shuffle_from(&unshuffled, current, 42);
        assert_eq!(active.head(), Some(current));
        assert_eq!(active.count(), unshuffled.count());

        let restored = unshuffled.deep_copy();
        let original: Vec<NodeId> = unshuffled.iter().map(|s| s.id).collect();
        let restored_order: Vec<NodeId> = restored.iter().map(|s| s.id).collect();
        assert_eq!(original, restored_order);
    }

    #[test]
    fn total_duration_sums_live_nodes() {
        let mut list = Playlist::new();
        let a = list.add("a.mp3");
        list.find_by_id_mut(a).unwrap().duration_seconds = 120.0;
        let b = list.add("b.mp3");
        list.find_by_id_mut(b).unwrap().duration_seconds = 180.0;
        assert_eq!(list.total_duration(), 300.0);
    }
}
