//! GET operations for BPlusTree.
//!
//! This module contains the read operations of the tree: routing a key to the
//! leaf responsible for it, exact `(key, pointer)` lookups, and the read-only
//! accessors consumers use to walk the structure.

use crate::node::Node;
use crate::types::{BPlusTree, InternalNode, LeafNode, NodeId, NodeRef};

impl<K, P> BPlusTree<K, P> {
    // ============================================================================
    // READ-ONLY ACCESSORS
    // ============================================================================

    /// The current root node.
    pub fn root(&self) -> NodeRef {
        self.root
    }

    /// The configured branching factor.
    pub fn degree(&self) -> usize {
        self.degree
    }

    /// Get a leaf node by ID.
    pub fn get_leaf(&self, id: NodeId) -> Option<&LeafNode<K, P>> {
        self.leaf_arena.get(id)
    }

    /// Get an internal node by ID.
    pub fn get_internal(&self, id: NodeId) -> Option<&InternalNode<K>> {
        self.internal_arena.get(id)
    }

    /// The leftmost leaf, where the leaf chain starts.
    pub fn first_leaf_id(&self) -> NodeId {
        let mut current = self.root;
        loop {
            match current {
                NodeRef::Leaf(id) => return id,
                NodeRef::Internal(id) => current = self.internal(id).children[0],
            }
        }
    }

    // ============================================================================
    // ARENA ACCESS FOR STRUCTURAL CODE
    // ============================================================================
    //
    // Every id reachable from the root is live. A miss here means a structural
    // invariant is broken, which is a bug and not a condition to recover from.

    pub(crate) fn leaf(&self, id: NodeId) -> &LeafNode<K, P> {
        match self.leaf_arena.get(id) {
            Some(leaf) => leaf,
            None => panic!("leaf {} missing from arena", id),
        }
    }

    pub(crate) fn leaf_mut(&mut self, id: NodeId) -> &mut LeafNode<K, P> {
        match self.leaf_arena.get_mut(id) {
            Some(leaf) => leaf,
            None => panic!("leaf {} missing from arena", id),
        }
    }

    pub(crate) fn internal(&self, id: NodeId) -> &InternalNode<K> {
        match self.internal_arena.get(id) {
            Some(node) => node,
            None => panic!("internal node {} missing from arena", id),
        }
    }

    pub(crate) fn internal_mut(&mut self, id: NodeId) -> &mut InternalNode<K> {
        match self.internal_arena.get_mut(id) {
            Some(node) => node,
            None => panic!("internal node {} missing from arena", id),
        }
    }

    /// Parent of either node variant.
    pub(crate) fn parent_of(&self, node: NodeRef) -> Option<NodeId> {
        match node {
            NodeRef::Leaf(id) => self.leaf(id).parent(),
            NodeRef::Internal(id) => self.internal(id).parent(),
        }
    }

    pub(crate) fn set_parent(&mut self, node: NodeRef, parent: Option<NodeId>) {
        match node {
            NodeRef::Leaf(id) => self.leaf_mut(id).set_parent(parent),
            NodeRef::Internal(id) => self.internal_mut(id).set_parent(parent),
        }
    }

    pub(crate) fn is_full(&self, node: NodeRef) -> bool {
        match node {
            NodeRef::Leaf(id) => self.leaf(id).is_full(),
            NodeRef::Internal(id) => self.internal(id).is_full(),
        }
    }
}

impl<K: Ord, P> BPlusTree<K, P> {
    // ============================================================================
    // ROUTING
    // ============================================================================

    /// Finds the leaf responsible for `key`.
    ///
    /// # Examples
    ///
    /// ```
    /// use bptree::{BPlusTree, Node};
    ///
    /// let mut tree = BPlusTree::new(4).unwrap();
    /// for (i, key) in ["a", "b", "c", "d"].into_iter().enumerate() {
    ///     tree.insert(key, i);
    /// }
    /// assert_eq!(tree.find(&"c").keys(), &["c", "d"]);
    /// assert_eq!(tree.find(&"a").keys(), &["a", "b"]);
    /// ```
    pub fn find(&self, key: &K) -> &LeafNode<K, P> {
        self.leaf(self.find_leaf_id(key))
    }

    /// Finds the ID of the leaf responsible for `key`.
    pub fn find_leaf_id(&self, key: &K) -> NodeId {
        let mut current = self.root;
        // Nearest separator bounding the current subtree on the right
        let mut upper: Option<&K> = None;
        loop {
            match current {
                NodeRef::Leaf(id) => return self.leaf(id).find(id, key, upper),
                NodeRef::Internal(id) => {
                    let node = self.internal(id);
                    let index = node.find_child_index(key);
                    if let Some(bound) = node.keys.get(index) {
                        upper = Some(bound);
                    }
                    current = node.children[index];
                }
            }
        }
    }
}

impl<K: Ord, P: PartialEq> BPlusTree<K, P> {
    // ============================================================================
    // EXACT ENTRY LOOKUP
    // ============================================================================

    /// Finds the leaf holding the exact `(key, pointer)` entry.
    ///
    /// Equal keys may straddle a leaf boundary, so the search continues along
    /// the chain while the next leaf can still hold `key`.
    pub(crate) fn locate_entry(&self, key: &K, pointer: &P) -> Option<NodeId> {
        let mut id = self.find_leaf_id(key);
        loop {
            let leaf = self.leaf(id);
            if leaf.contains(key, pointer) {
                return Some(id);
            }
            if leaf.last_key().is_some_and(|last| last > key) {
                return None;
            }
            let next = leaf.successor()?;
            if self.leaf(next).first_key().map_or(true, |first| first > key) {
                return None;
            }
            id = next;
        }
    }

    /// Returns true if the exact `(key, pointer)` entry is stored.
    ///
    /// # Examples
    ///
    /// ```
    /// use bptree::BPlusTree;
    ///
    /// let mut tree = BPlusTree::new(4).unwrap();
    /// tree.insert(10, 'x');
    /// assert!(tree.contains(&10, &'x'));
    /// assert!(!tree.contains(&10, &'y'));
    /// ```
    pub fn contains(&self, key: &K, pointer: &P) -> bool {
        self.locate_entry(key, pointer).is_some()
    }

    /// Returns every pointer stored under `key`, in chain order.
    ///
    /// # Examples
    ///
    /// ```
    /// use bptree::BPlusTree;
    ///
    /// let mut tree = BPlusTree::new(3).unwrap();
    /// tree.insert(7, 1);
    /// tree.insert(7, 2);
    /// tree.insert(8, 3);
    /// tree.insert(7, 4);
    ///
    /// let mut pointers = tree.lookup(&7);
    /// pointers.sort();
    /// assert_eq!(pointers, vec![&1, &2, &4]);
    /// assert!(tree.lookup(&9).is_empty());
    /// ```
    pub fn lookup(&self, key: &K) -> Vec<&P> {
        let mut found = Vec::new();
        let mut next = Some(self.find_leaf_id(key));
        while let Some(id) = next {
            let leaf = self.leaf(id);
            found.extend(
                leaf.entries()
                    .filter(|(k, _)| *k == key)
                    .map(|(_, p)| p),
            );
            if leaf.last_key().is_some_and(|last| last > key) {
                break;
            }
            next = leaf
                .successor()
                .filter(|&s| self.leaf(s).first_key().is_some_and(|first| first <= key));
        }
        found
    }
}
