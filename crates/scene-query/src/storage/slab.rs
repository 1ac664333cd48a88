//! Heap-backed slab allocator for scene nodes.
//!
//! Slots freed by a removed subtree go onto a freelist and are handed out
//! again by later inserts, so a re-render that replaces a subtree does not
//! grow the arena.

use std::fmt;
use std::mem;
use std::ops::{Index, IndexMut};

use super::entry::Entry;
use super::index_types::NodeId;

/// Slab of `T` addressed by [`NodeId`].
#[derive(Clone)]
pub struct NodeSlab<T> {
    entries: Vec<Entry<T>>,
    /// Logical element count (occupied slots only).
    len: usize,
    /// Head of the freelist (index of the next available slot).
    next: usize,
}

impl<T> Default for NodeSlab<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> NodeSlab<T> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            len: 0,
            next: 0,
        }
    }

    /// Inserts a value, returning its handle.
    pub fn insert(&mut self, value: T) -> NodeId {
        let key = self.next;
        if key == self.entries.len() {
            self.entries.push(Entry::Occupied(value));
            self.next = self.entries.len();
        } else {
            let next_free = match self.entries[key] {
                Entry::Vacant(next) => next,
                Entry::Occupied(_) => unreachable!("freelist head points at an occupied slot"),
            };
            self.entries[key] = Entry::Occupied(value);
            self.next = next_free;
        }
        self.len += 1;
        NodeId::new(key)
    }

    pub fn get(&self, id: NodeId) -> Option<&T> {
        match self.entries.get(id.get()) {
            Some(Entry::Occupied(value)) => Some(value),
            _ => None,
        }
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut T> {
        match self.entries.get_mut(id.get()) {
            Some(Entry::Occupied(value)) => Some(value),
            _ => None,
        }
    }

    /// Removes the value at `id` if it exists, returning it.
    pub fn try_remove(&mut self, id: NodeId) -> Option<T> {
        let index = id.get();
        let entry = self.entries.get_mut(index)?;
        if matches!(entry, Entry::Vacant(_)) {
            return None;
        }
        match mem::replace(entry, Entry::Vacant(self.next)) {
            Entry::Occupied(value) => {
                self.len = self.len.saturating_sub(1);
                self.next = index;
                Some(value)
            }
            Entry::Vacant(_) => None,
        }
    }

    /// Returns the number of occupied slots.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Iterates occupied slots in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &T)> {
        self.entries
            .iter()
            .enumerate()
            .filter_map(|(index, entry)| match entry {
                Entry::Occupied(value) => Some((NodeId::new(index), value)),
                Entry::Vacant(_) => None,
            })
    }
}

impl<T> Index<NodeId> for NodeSlab<T> {
    type Output = T;

    fn index(&self, id: NodeId) -> &Self::Output {
        self.get(id).expect("invalid node id")
    }
}

impl<T> IndexMut<NodeId> for NodeSlab<T> {
    fn index_mut(&mut self, id: NodeId) -> &mut Self::Output {
        self.get_mut(id).expect("invalid node id")
    }
}

impl<T> fmt::Debug for NodeSlab<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeSlab")
            .field("len", &self.len)
            .field("next", &self.next)
            .field("slots", &self.entries.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_and_get() {
        let mut slab = NodeSlab::new();
        let a = slab.insert("a");
        let b = slab.insert("b");
        assert_eq!(slab.get(a), Some(&"a"));
        assert_eq!(slab[b], "b");
        assert_eq!(slab.len(), 2);
    }

    #[test]
    fn removed_slots_are_reused() {
        let mut slab = NodeSlab::new();
        let a = slab.insert(1);
        let b = slab.insert(2);
        assert_eq!(slab.try_remove(a), Some(1));
        assert_eq!(slab.try_remove(a), None);
        assert!(slab.get(a).is_none());
        assert_eq!(slab.len(), 1);

        let c = slab.insert(3);
        assert_eq!(c, a);
        assert_eq!(slab[c], 3);
        assert_eq!(slab[b], 2);
    }

    #[test]
    fn iter_skips_vacant_slots() {
        let mut slab = NodeSlab::new();
        let a = slab.insert('a');
        let b = slab.insert('b');
        let c = slab.insert('c');
        slab.try_remove(b);
        let live = slab.iter().map(|(id, _)| id).collect::<Vec<_>>();
        assert_eq!(live, vec![a, c]);
        assert!(!slab.is_empty());
    }
}
