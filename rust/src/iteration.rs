//! Iterator implementations for BPlusTree.
//!
//! This module contains the iterator types of the B+ tree. All of them follow
//! the leaf chain from the leftmost leaf, so entries come out in ascending key
//! order without touching the internal nodes.

use crate::types::{BPlusTree, LeafNode, NodeId};

// ============================================================================
// ITERATOR STRUCTS
// ============================================================================

/// Iterator over the leaves of the tree in chain order.
pub struct LeafChain<'a, K, P> {
    tree: &'a BPlusTree<K, P>,
    next: Option<NodeId>,
}

/// Iterator over `(key, pointer)` entries in ascending key order.
pub struct EntryIterator<'a, K, P> {
    leaves: LeafChain<'a, K, P>,
    current_leaf: Option<&'a LeafNode<K, P>>,
    current_index: usize,
}

/// Iterator over keys in ascending order, one per entry.
pub struct KeyIterator<'a, K, P> {
    entries: EntryIterator<'a, K, P>,
}

// ============================================================================
// BPLUSTREE ITERATOR METHODS
// ============================================================================

impl<K, P> BPlusTree<K, P> {
    /// Returns the leaves with their ids, following successor links from the
    /// leftmost leaf.
    ///
    /// # Examples
    ///
    /// ```
    /// use bptree::{BPlusTree, Node};
    ///
    /// let mut tree = BPlusTree::new(4).unwrap();
    /// for key in 1..=5 {
    ///     tree.insert(key, ());
    /// }
    /// let leaves: Vec<Vec<i32>> = tree.leaves().map(|(_, leaf)| leaf.keys().to_vec()).collect();
    /// assert_eq!(leaves, vec![vec![1, 2], vec![3, 4, 5]]);
    /// ```
    pub fn leaves(&self) -> LeafChain<'_, K, P> {
        LeafChain {
            tree: self,
            next: Some(self.first_leaf_id()),
        }
    }

    /// Returns every `(key, pointer)` entry in ascending key order.
    pub fn entries(&self) -> EntryIterator<'_, K, P> {
        EntryIterator {
            leaves: self.leaves(),
            current_leaf: None,
            current_index: 0,
        }
    }

    /// Returns the key of every entry in ascending order. Duplicate keys are
    /// yielded once per entry.
    pub fn keys(&self) -> KeyIterator<'_, K, P> {
        KeyIterator {
            entries: self.entries(),
        }
    }
}

// ============================================================================
// ITERATOR IMPLEMENTATIONS
// ============================================================================

impl<'a, K, P> Iterator for LeafChain<'a, K, P> {
    type Item = (NodeId, &'a LeafNode<K, P>);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.next?;
        let leaf = self.tree.leaf(id);
        self.next = leaf.successor();
        Some((id, leaf))
    }
}

impl<'a, K, P> Iterator for EntryIterator<'a, K, P> {
    type Item = (&'a K, &'a P);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(leaf) = self.current_leaf {
                if self.current_index < leaf.len() {
                    let entry = (&leaf.keys[self.current_index], &leaf.pointers[self.current_index]);
                    self.current_index += 1;
                    return Some(entry);
                }
            }
            // Current leaf exhausted (or not started); empty leaves are skipped
            let (_, leaf) = self.leaves.next()?;
            self.current_leaf = Some(leaf);
            self.current_index = 0;
        }
    }
}

impl<'a, K, P> Iterator for KeyIterator<'a, K, P> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        self.entries.next().map(|(k, _)| k)
    }
}
