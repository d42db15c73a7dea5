//! Recency order over resident line tags.
//!
//! The tracker keeps tags in a doubly linked list stored in a slab, most recently used at
//! the head and least recently used at the tail, plus a hash index from tag to slab slot.
//!
//! # Performance
//!
//! - `touch()`, `evict_lru()`, `remove()`, `contains()`: O(1) amortised.
//! - Freed slab slots are recycled, so memory stays bounded by the peak number of tags.
//!
//! Ties cannot occur: the order is exactly the order of the most recent `touch` per tag.

use std::collections::HashMap;

#[derive(Clone, Copy, Debug)]
struct Node {
    tag: u64,
    prev: Option<usize>,
    next: Option<usize>,
}

/// Ordered set of line tags supporting move-to-front and pop-least-recent.
#[derive(Clone, Debug, Default)]
pub struct RecencyTracker {
    nodes: Vec<Node>,
    free: Vec<usize>,
    index: HashMap<u64, usize>,
    /// Most recently used.
    head: Option<usize>,
    /// Least recently used.
    tail: Option<usize>,
}

impl RecencyTracker {
    /// Creates an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty tracker with room for `capacity` tags.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity),
            free: Vec::new(),
            index: HashMap::with_capacity(capacity),
            head: None,
            tail: None,
        }
    }

    /// Number of tracked tags.
    #[inline]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Returns true if no tag is tracked.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Returns true if `tag` is tracked.
    #[inline]
    pub fn contains(&self, tag: u64) -> bool {
        self.index.contains_key(&tag)
    }

    /// Marks `tag` as most recently used, inserting it if absent.
    pub fn touch(&mut self, tag: u64) {
        if let Some(&slot) = self.index.get(&tag) {
            if self.head != Some(slot) {
                self.unlink(slot);
                self.push_front(slot);
            }
            return;
        }

        let node = Node {
            tag,
            prev: None,
            next: None,
        };
        let slot = if let Some(slot) = self.free.pop() {
            self.nodes[slot] = node;
            slot
        } else {
            self.nodes.push(node);
            self.nodes.len() - 1
        };
        let _ = self.index.insert(tag, slot);
        self.push_front(slot);
    }

    /// Removes and returns the least recently used tag.
    pub fn evict_lru(&mut self) -> Option<u64> {
        let slot = self.tail?;
        let tag = self.nodes[slot].tag;
        self.release(slot, tag);
        Some(tag)
    }

    /// Returns the least recently used tag without removing it.
    pub fn peek_lru(&self) -> Option<u64> {
        self.tail.map(|slot| self.nodes[slot].tag)
    }

    /// Returns the most recently used tag.
    pub fn peek_mru(&self) -> Option<u64> {
        self.head.map(|slot| self.nodes[slot].tag)
    }

    /// Removes `tag`; returns false if it was not tracked.
    pub fn remove(&mut self, tag: u64) -> bool {
        match self.index.get(&tag) {
            Some(&slot) => {
                self.release(slot, tag);
                true
            }
            None => false,
        }
    }

    /// Forgets every tag.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.free.clear();
        self.index.clear();
        self.head = None;
        self.tail = None;
    }

    /// Iterates tags from most to least recently used.
    pub fn iter(&self) -> impl Iterator<Item = u64> + '_ {
        let mut cursor = self.head;
        std::iter::from_fn(move || {
            let slot = cursor?;
            let node = self.nodes[slot];
            cursor = node.next;
            Some(node.tag)
        })
    }

    fn release(&mut self, slot: usize, tag: u64) {
        self.unlink(slot);
        let _ = self.index.remove(&tag);
        self.free.push(slot);
    }

    fn unlink(&mut self, slot: usize) {
        let Node { prev, next, .. } = self.nodes[slot];
        match prev {
            Some(p) => self.nodes[p].next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => self.nodes[n].prev = prev,
            None => self.tail = prev,
        }
        self.nodes[slot].prev = None;
        self.nodes[slot].next = None;
    }

    fn push_front(&mut self, slot: usize) {
        self.nodes[slot].prev = None;
        self.nodes[slot].next = self.head;
        if let Some(old) = self.head {
            self.nodes[old].prev = Some(slot);
        }
        self.head = Some(slot);
        if self.tail.is_none() {
            self.tail = Some(slot);
        }
    }
}
