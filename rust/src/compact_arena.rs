//! Compact arena holding the tree's nodes.
//!
//! Nodes refer to each other (children, parents, leaf successors) by `NodeId`
//! rather than by reference, so a node discarded during a merge or a root
//! collapse simply returns its slot to the free list. Slots are reused by later
//! allocations.

use std::convert::TryFrom;

use crate::types::NodeId;

/// Statistics for a compact arena
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompactArenaStats {
    pub total_slots: usize,
    pub allocated_count: usize,
    pub free_count: usize,
    pub utilization: f64,
}

/// Arena allocator backed by a `Vec<T>` with a separate free list.
#[derive(Debug, Clone)]
pub struct CompactArena<T> {
    storage: Vec<T>,
    /// Free slot indices for reuse
    free_list: Vec<usize>,
    /// Track which slots are actually allocated
    allocated_mask: Vec<bool>,
    allocated: usize,
}

impl<T> CompactArena<T> {
    /// Create a new empty compact arena
    pub fn new() -> Self {
        Self {
            storage: Vec::new(),
            free_list: Vec::new(),
            allocated_mask: Vec::new(),
            allocated: 0,
        }
    }

    /// Allocate a new item in the arena and return its ID
    #[inline]
    pub fn allocate(&mut self, item: T) -> NodeId {
        let index = if let Some(free_index) = self.free_list.pop() {
            self.storage[free_index] = item;
            self.allocated_mask[free_index] = true;
            free_index
        } else {
            let index = self.storage.len();
            self.storage.push(item);
            self.allocated_mask.push(true);
            index
        };
        self.allocated += 1;

        NodeId::try_from(index).expect("arena index should fit in NodeId")
    }

    /// Deallocate an item from the arena and return it, leaving a default value behind.
    #[inline]
    pub fn deallocate(&mut self, id: NodeId) -> Option<T>
    where
        T: Default,
    {
        let index = self.live_index(id)?;

        self.allocated_mask[index] = false;
        self.free_list.push(index);
        self.allocated -= 1;

        Some(std::mem::take(&mut self.storage[index]))
    }

    /// Get a reference to an item in the arena
    #[inline]
    pub fn get(&self, id: NodeId) -> Option<&T> {
        let index = self.live_index(id)?;
        Some(&self.storage[index])
    }

    /// Get a mutable reference to an item in the arena
    #[inline]
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut T> {
        let index = self.live_index(id)?;
        Some(&mut self.storage[index])
    }

    /// Check if an ID is valid and allocated
    pub fn contains(&self, id: NodeId) -> bool {
        self.live_index(id).is_some()
    }

    fn live_index(&self, id: NodeId) -> Option<usize> {
        let index = usize::try_from(id).ok()?;
        if self.allocated_mask.get(index).copied().unwrap_or(false) {
            Some(index)
        } else {
            None
        }
    }

    /// Iterate over the IDs of all allocated items, in slot order.
    pub fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.allocated_mask
            .iter()
            .enumerate()
            .filter(|(_, &allocated)| allocated)
            .filter_map(|(index, _)| NodeId::try_from(index).ok())
    }

    /// Get arena statistics
    pub fn stats(&self) -> CompactArenaStats {
        let total_slots = self.storage.len();
        let utilization = if total_slots > 0 {
            self.allocated as f64 / total_slots as f64
        } else {
            0.0
        };

        CompactArenaStats {
            total_slots,
            allocated_count: self.allocated,
            free_count: self.free_list.len(),
            utilization,
        }
    }

    /// Get the number of allocated items
    pub fn len(&self) -> usize {
        self.allocated
    }

    /// Check if the arena is empty
    pub fn is_empty(&self) -> bool {
        self.allocated == 0
    }

    /// Clear all items from the arena
    pub fn clear(&mut self) {
        self.storage.clear();
        self.allocated_mask.clear();
        self.free_list.clear();
        self.allocated = 0;
    }

    /// Get the number of free slots
    pub fn free_count(&self) -> usize {
        self.free_list.len()
    }
}

impl<T> Default for CompactArena<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compact_arena_basic_operations() {
        let mut arena = CompactArena::new();

        let id1 = arena.allocate(42);
        let id2 = arena.allocate(84);
        let id3 = arena.allocate(126);

        assert_eq!(arena.get(id1), Some(&42));
        assert_eq!(arena.get(id2), Some(&84));
        assert_eq!(arena.get(id3), Some(&126));

        assert!(arena.contains(id1));
        assert!(arena.contains(id2));
        assert!(arena.contains(id3));
        assert!(!arena.contains(NodeId::MAX));

        let stats = arena.stats();
        assert_eq!(stats.allocated_count, 3);
        assert_eq!(stats.free_count, 0);
        assert_eq!(arena.ids().collect::<Vec<_>>(), vec![id1, id2, id3]);
    }

    #[test]
    fn test_deallocate_and_reuse() {
        let mut arena: CompactArena<i32> = CompactArena::new();

        let id1 = arena.allocate(42);
        let id2 = arena.allocate(84);

        assert_eq!(arena.deallocate(id1), Some(42));
        assert!(!arena.contains(id1));
        assert!(arena.contains(id2));
        assert_eq!(arena.get(id1), None);
        assert_eq!(arena.deallocate(id1), None);
        assert_eq!(arena.free_count(), 1);

        let id3 = arena.allocate(168);
        assert_eq!(id3, id1, "freed slot should be reused");
        assert_eq!(arena.get(id3), Some(&168));

        let stats = arena.stats();
        assert_eq!(stats.allocated_count, 2);
        assert_eq!(stats.free_count, 0);
        assert_eq!(stats.utilization, 1.0);
    }

    #[test]
    fn test_get_mut_and_clear() {
        let mut arena = CompactArena::new();
        let id = arena.allocate(String::from("leaf"));

        if let Some(value) = arena.get_mut(id) {
            value.push_str("-node");
        }
        assert_eq!(arena.get(id).map(String::as_str), Some("leaf-node"));

        arena.clear();
        assert!(arena.is_empty());
        assert_eq!(arena.len(), 0);
        assert!(!arena.contains(id));
        assert_eq!(arena.stats().total_slots, 0);
    }
}
