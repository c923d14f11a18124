//! Construction and initialization logic for BPlusTree and nodes.
//!
//! This module contains the construction, initialization, and setup logic
//! for the B+ tree and its nodes, including degree validation, arena
//! initialization, and default implementations.

use crate::compact_arena::CompactArena;
use crate::error::{BPlusTreeError, InitResult};
use crate::types::{BPlusTree, InternalNode, LeafNode, NodeRef, MIN_DEGREE};

/// Default degree for B+ tree nodes
pub const DEFAULT_DEGREE: usize = 4;

impl<K, P> BPlusTree<K, P> {
    /// Create a B+ tree with the specified degree.
    ///
    /// # Arguments
    ///
    /// * `degree` - Maximum number of slots per node (minimum 3)
    ///
    /// # Returns
    ///
    /// Returns `Ok(BPlusTree)` if the degree is valid, `Err(BPlusTreeError)` otherwise.
    ///
    /// # Examples
    ///
    /// ```
    /// use bptree::BPlusTree;
    ///
    /// let tree = BPlusTree::<i32, u64>::new(4).unwrap();
    /// assert!(tree.is_empty());
    /// assert!(BPlusTree::<i32, u64>::new(2).is_err());
    /// ```
    pub fn new(degree: usize) -> InitResult<Self> {
        validation::validate_degree(degree)?;

        let mut leaf_arena = CompactArena::new();
        let root_id = leaf_arena.allocate(LeafNode::new(degree));

        Ok(Self {
            degree,
            root: NodeRef::Leaf(root_id),
            len: 0,
            leaf_arena,
            internal_arena: CompactArena::new(),
        })
    }

    /// Create a B+ tree with default degree.
    ///
    /// This is equivalent to calling `new(DEFAULT_DEGREE)`.
    pub fn with_default_degree() -> InitResult<Self> {
        Self::new(DEFAULT_DEGREE)
    }
}

impl<K, P> LeafNode<K, P> {
    /// Creates a new, unlinked leaf node for a tree of the given degree.
    ///
    /// # Examples
    ///
    /// ```
    /// use bptree::{LeafNode, Node};
    ///
    /// let leaf: LeafNode<i32, u64> = LeafNode::new(4);
    /// assert_eq!(leaf.key_count(), 0);
    /// assert_eq!(leaf.successor(), None);
    /// ```
    pub fn new(degree: usize) -> Self {
        Self {
            degree,
            keys: Vec::with_capacity(degree),
            pointers: Vec::with_capacity(degree),
            successor: None,
            parent: None,
        }
    }
}

impl<K> InternalNode<K> {
    /// Creates a new internal node with no keys and no children.
    pub fn new(degree: usize) -> Self {
        // One spare slot each: a full node briefly holds the entry that splits it
        Self {
            degree,
            keys: Vec::with_capacity(degree),
            children: Vec::with_capacity(degree + 1),
            parent: None,
        }
    }

    /// Creates a node holding exactly `[left, key, right]`, used when the
    /// root splits.
    pub fn with_children(degree: usize, left: NodeRef, key: K, right: NodeRef) -> Self {
        let mut node = Self::new(degree);
        node.keys.push(key);
        node.children.push(left);
        node.children.push(right);
        node
    }
}

// Default implementations
impl<K, P> Default for BPlusTree<K, P> {
    /// Create a B+ tree with default degree.
    fn default() -> Self {
        let mut leaf_arena = CompactArena::new();
        let root_id = leaf_arena.allocate(LeafNode::new(DEFAULT_DEGREE));
        Self {
            degree: DEFAULT_DEGREE,
            root: NodeRef::Leaf(root_id),
            len: 0,
            leaf_arena,
            internal_arena: CompactArena::new(),
        }
    }
}

impl<K, P> Default for LeafNode<K, P> {
    /// Placeholder left in a freed arena slot.
    fn default() -> Self {
        Self {
            degree: MIN_DEGREE,
            keys: Vec::new(),
            pointers: Vec::new(),
            successor: None,
            parent: None,
        }
    }
}

impl<K> Default for InternalNode<K> {
    /// Placeholder left in a freed arena slot.
    fn default() -> Self {
        Self {
            degree: MIN_DEGREE,
            keys: Vec::new(),
            children: Vec::new(),
            parent: None,
        }
    }
}

/// Validation utilities for construction
pub mod validation {
    use super::*;
    use crate::error::BTreeResult;

    /// Validate that a degree can produce a well-formed B+ tree.
    pub fn validate_degree(degree: usize) -> BTreeResult<()> {
        if degree < MIN_DEGREE {
            Err(BPlusTreeError::invalid_degree(degree, MIN_DEGREE))
        } else {
            Ok(())
        }
    }

    /// Get the recommended degree for a given expected number of entries.
    ///
    /// Always returns at least `MIN_DEGREE`.
    pub fn recommended_degree(expected_entries: usize) -> usize {
        if expected_entries < 100 {
            DEFAULT_DEGREE
        } else if expected_entries < 10_000 {
            16
        } else if expected_entries < 1_000_000 {
            32
        } else {
            64
        }
    }
}
