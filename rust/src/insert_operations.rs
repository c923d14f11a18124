//! INSERT operations for BPlusTree.
//!
//! This module contains the insertion path of the B+ tree: placing an entry in
//! its leaf, splitting full leaves and internal nodes, and growing the tree
//! when the root splits.

use tracing::{debug, trace};

use crate::node::Node;
use crate::types::{BPlusTree, InternalNode, NodeId, NodeRef};

impl<K: Ord + Clone, P: PartialEq> BPlusTree<K, P> {
    /// Inserts a `(key, pointer)` entry.
    ///
    /// Returns `true` if the entry was added. Inserting an entry that is
    /// already present leaves the tree untouched and returns `false`; the same
    /// key with a different pointer is a distinct entry.
    ///
    /// # Examples
    ///
    /// ```
    /// use bptree::BPlusTree;
    ///
    /// let mut tree = BPlusTree::new(4).unwrap();
    /// assert!(tree.insert("a", 1));
    /// assert!(!tree.insert("a", 1));
    /// assert!(tree.insert("a", 2));
    /// assert_eq!(tree.len(), 2);
    /// ```
    pub fn insert(&mut self, key: K, pointer: P) -> bool {
        if self.locate_entry(&key, &pointer).is_some() {
            trace!("insert: entry already present");
            return false;
        }

        let leaf_id = self.find_leaf_id(&key);
        trace!(leaf = leaf_id, "insert: entry routed to leaf");
        let leaf = self.leaf_mut(leaf_id);
        if leaf.is_full() {
            leaf.insert(key, pointer);
            self.split_leaf(leaf_id);
        } else {
            leaf.insert(key, pointer);
        }
        self.len += 1;
        true
    }

    /// Number of entries or children kept by the left half of a split.
    fn split_point(&self) -> usize {
        self.degree.div_ceil(2)
    }

    /// Splits a leaf holding one entry more than its capacity.
    ///
    /// The leaf keeps its first `ceil(degree / 2)` entries and its identity;
    /// the rest move to a new leaf chained right after it. The new leaf's
    /// first key is copied up as the separator.
    fn split_leaf(&mut self, leaf_id: NodeId) {
        let at = self.split_point();
        let right = self.leaf_mut(leaf_id).split_off(at);
        let separator = match right.first_key() {
            Some(key) => key.clone(),
            None => unreachable!("leaf split produced an empty right half"),
        };
        let right_id = self.leaf_arena.allocate(right);
        self.leaf_mut(leaf_id).set_successor(Some(right_id));

        debug!(
            left = leaf_id,
            right = right_id,
            degree = self.degree,
            "split leaf"
        );
        self.insert_in_parent(NodeRef::Leaf(leaf_id), separator, NodeRef::Leaf(right_id));
    }

    /// Registers `right` and its separator immediately after `left` in
    /// `left`'s parent, splitting ancestors as needed.
    fn insert_in_parent(&mut self, left: NodeRef, separator: K, right: NodeRef) {
        let Some(parent_id) = self.parent_of(left) else {
            self.grow_root(left, separator, right);
            return;
        };

        if self.internal(parent_id).is_full() {
            self.split_internal(parent_id, left, separator, right);
        } else {
            let inserted = self.internal_mut(parent_id).insert_after(separator, right, left);
            assert!(inserted, "{} is not a child of its parent {}", left, parent_id);
            self.set_parent(right, Some(parent_id));
        }
    }

    /// Replaces the root with a new internal node over `left` and `right`.
    fn grow_root(&mut self, left: NodeRef, separator: K, right: NodeRef) {
        let root = InternalNode::with_children(self.degree, left, separator, right);
        let root_id = self.internal_arena.allocate(root);
        self.set_parent(left, Some(root_id));
        self.set_parent(right, Some(root_id));
        self.root = NodeRef::Internal(root_id);
        debug!(root = root_id, degree = self.degree, "tree grew a level");
    }

    /// Splits a full internal node while adding `separator` and `right` after
    /// `left`.
    ///
    /// The node keeps the first `m - 1` keys and `m` children of the
    /// overflowing sequence, `m = ceil(degree / 2)`. The key at `m - 1` moves
    /// up to the parent and is kept in neither half.
    fn split_internal(&mut self, node_id: NodeId, left: NodeRef, separator: K, right: NodeRef) {
        let m = self.split_point();

        let mut overflow = self.internal(node_id).clone();
        let inserted = overflow.insert_after(separator, right, left);
        assert!(inserted, "{} is not a child of its parent {}", left, node_id);
        let median = overflow.keys[m - 1].clone();

        let mut sibling = InternalNode::new(self.degree);
        sibling.copy_from(&overflow, m, overflow.key_count());
        sibling.set_parent(self.internal(node_id).parent());
        self.internal_mut(node_id).copy_from(&overflow, 0, m - 1);
        let sibling_id = self.internal_arena.allocate(sibling);

        self.adopt_children(node_id);
        self.adopt_children(sibling_id);

        debug!(
            left = node_id,
            right = sibling_id,
            degree = self.degree,
            "split internal node"
        );
        self.insert_in_parent(
            NodeRef::Internal(node_id),
            median,
            NodeRef::Internal(sibling_id),
        );
    }
}

impl<K, P> BPlusTree<K, P> {
    /// Points every child of `node_id` back at it.
    pub(crate) fn adopt_children(&mut self, node_id: NodeId) {
        let children = self.internal(node_id).children.clone();
        for child in children {
            self.set_parent(child, Some(node_id));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_without_split() {
        let mut tree = BPlusTree::new(4).unwrap();
        assert!(tree.insert("a", 1));
        assert!(tree.insert("b", 2));
        assert!(tree.insert("c", 3));

        let NodeRef::Leaf(root) = tree.root else {
            panic!("root should still be a leaf");
        };
        assert_eq!(tree.leaf(root).keys(), &["a", "b", "c"]);
        assert_eq!(tree.len, 3);
    }

    #[test]
    fn test_leaf_split_copies_separator_up() {
        let mut tree = BPlusTree::new(4).unwrap();
        for (i, key) in ["a", "b", "c", "d"].into_iter().enumerate() {
            tree.insert(key, i);
        }

        let NodeRef::Internal(root) = tree.root else {
            panic!("root should have split");
        };
        let root = tree.internal(root);
        assert_eq!(root.keys(), &["c"]);
        let (NodeRef::Leaf(left), NodeRef::Leaf(right)) = (root.children[0], root.children[1])
        else {
            panic!("children should be leaves");
        };
        assert_eq!(tree.leaf(left).keys(), &["a", "b"]);
        assert_eq!(tree.leaf(right).keys(), &["c", "d"]);
        assert_eq!(tree.leaf(left).successor(), Some(right));
        assert_eq!(tree.leaf(right).successor(), None);
    }

    #[test]
    fn test_internal_split_promotes_median_once() {
        // degree 3: leaves hold 2 entries, internal nodes 2 keys / 3 children
        let mut tree = BPlusTree::new(3).unwrap();
        for i in 1..=7 {
            tree.insert(i, i);
        }

        let NodeRef::Internal(root_id) = tree.root else {
            panic!("root should be internal");
        };
        let root = tree.internal(root_id);
        assert_eq!(root.keys(), &[5]);
        for child in root.children() {
            let NodeRef::Internal(child_id) = *child else {
                panic!("second level should be internal");
            };
            assert!(!tree.internal(child_id).keys().contains(&5));
            assert_eq!(tree.internal(child_id).parent(), Some(root_id));
        }
        assert!(tree.check_invariants());
    }

    #[test]
    fn test_split_reparents_moved_children() {
        let mut tree = BPlusTree::new(4).unwrap();
        for i in 0..40 {
            tree.insert(i, i * 10);
        }
        assert!(tree.check_invariants_detailed().is_ok());
    }
}
