//! Id-addressed ordered list
//!
//! A doubly linked list stored in an arena, plus an id → slot map.
//!
//! ```text
//!   lookup: "a" → 0, "b" → 2, "c" → 1
//!
//!   head                               tail
//!    │                                  │
//!    ▼                                  ▼
//!  [0: a] ⇄ [2: b] ⇄ [1: c]
//! ```
//!
//! Reordering exchanges values between slots and re-points the two lookup
//! entries; links never move. Every mutation is O(1).

use std::collections::HashMap;

/// Items addressable by a stable id
pub trait Keyed {
    fn key(&self) -> &str;
}

#[derive(Debug, Clone)]
struct Node<T> {
    value: T,
    prev: Option<usize>,
    next: Option<usize>,
}

/// Ordered list of uniquely keyed items
#[derive(Debug, Clone)]
pub struct KeyedList<T: Keyed> {
    nodes: Vec<Option<Node<T>>>,
    free: Vec<usize>,
    head: Option<usize>,
    tail: Option<usize>,
    lookup: HashMap<String, usize>,
}

impl<T: Keyed> Default for KeyedList<T> {
    fn default() -> Self {
        Self {
            nodes: Vec::new(),
            free: Vec::new(),
            head: None,
            tail: None,
            lookup: HashMap::new(),
        }
    }
}

impl<T: Keyed> KeyedList<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from items in order. Later items with a repeated key are skipped.
    pub fn from_items(items: impl IntoIterator<Item = T>) -> Self {
        let mut list = Self::new();
        for item in items {
            if !list.push_back(item) {
                tracing::warn!("skipping item with a duplicate key");
            }
        }
        list
    }

    /// Append; returns false if the key is already present
    pub fn push_back(&mut self, item: T) -> bool {
        if self.lookup.contains_key(item.key()) {
            return false;
        }

        let key = item.key().to_string();
        let node = Node {
            value: item,
            prev: self.tail,
            next: None,
        };
        let idx = match self.free.pop() {
            Some(idx) => {
                self.nodes[idx] = Some(node);
                idx
            }
            None => {
                self.nodes.push(Some(node));
                self.nodes.len() - 1
            }
        };

        match self.tail {
            Some(tail) => {
                if let Some(tail_node) = self.nodes[tail].as_mut() {
                    tail_node.next = Some(idx);
                }
            }
            None => self.head = Some(idx),
        }
        self.tail = Some(idx);
        self.lookup.insert(key, idx);
        true
    }

    /// Replace the item with the same key in place
    pub fn update(&mut self, item: T) -> bool {
        match self.slot_of(item.key()) {
            Some(idx) => {
                if let Some(node) = self.nodes[idx].as_mut() {
                    node.value = item;
                }
                true
            }
            None => false,
        }
    }

    /// Unlink and return the item with this key
    pub fn remove(&mut self, key: &str) -> Option<T> {
        let idx = self.lookup.remove(key)?;
        let node = self.nodes[idx].take()?;

        match node.prev {
            Some(prev) => {
                if let Some(prev_node) = self.nodes[prev].as_mut() {
                    prev_node.next = node.next;
                }
            }
            None => self.head = node.next,
        }
        match node.next {
            Some(next) => {
                if let Some(next_node) = self.nodes[next].as_mut() {
                    next_node.prev = node.prev;
                }
            }
            None => self.tail = node.prev,
        }

        self.free.push(idx);
        Some(node.value)
    }

    /// Exchange the values of two items; returns false if either is missing
    pub fn swap(&mut self, a: &str, b: &str) -> bool {
        let (Some(ia), Some(ib)) = (self.slot_of(a), self.slot_of(b)) else {
            return false;
        };
        if ia == ib {
            return true;
        }

        let (lo, hi) = if ia < ib { (ia, ib) } else { (ib, ia) };
        let (left, right) = self.nodes.split_at_mut(hi);
        if let (Some(x), Some(y)) = (left[lo].as_mut(), right[0].as_mut()) {
            std::mem::swap(&mut x.value, &mut y.value);
        }

        self.lookup.insert(a.to_string(), ib);
        self.lookup.insert(b.to_string(), ia);
        true
    }

    pub fn get(&self, key: &str) -> Option<&T> {
        self.slot_of(key).and_then(|idx| self.value_at(idx))
    }

    /// Item before `key`
    pub fn prev(&self, key: &str) -> Option<&T> {
        let idx = self.slot_of(key)?;
        let prev = self.nodes[idx].as_ref()?.prev?;
        self.value_at(prev)
    }

    /// Item after `key`
    pub fn next(&self, key: &str) -> Option<&T> {
        let idx = self.slot_of(key)?;
        let next = self.nodes[idx].as_ref()?.next?;
        self.value_at(next)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.lookup.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.lookup.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lookup.is_empty()
    }

    /// Items from head to tail
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            list: self,
            cursor: self.head,
        }
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn slot_of(&self, key: &str) -> Option<usize> {
        self.lookup.get(key).copied()
    }

    fn value_at(&self, idx: usize) -> Option<&T> {
        self.nodes.get(idx)?.as_ref().map(|node| &node.value)
    }
}

/// Head-to-tail iterator over a [`KeyedList`]
pub struct Iter<'a, T: Keyed> {
    list: &'a KeyedList<T>,
    cursor: Option<usize>,
}

impl<'a, T: Keyed> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        let idx = self.cursor?;
        let node = self.list.nodes.get(idx)?.as_ref()?;
        self.cursor = node.next;
        Some(&node.value)
    }
}
