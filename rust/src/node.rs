//! Node implementations for BPlusTree.
//!
//! This module contains the shared storage contract of both node variants and
//! the complete implementations for LeafNode and InternalNode. Nodes only ever
//! touch their own storage; everything that involves a second node (splits,
//! merges, redistribution, parent links) is driven by the tree.

use std::fmt;

use crate::types::{InternalNode, LeafNode, NodeId, NodeRef};

// ============================================================================
// SHARED STORAGE CONTRACT
// ============================================================================

/// Capacity-bounded key storage shared by leaf and internal nodes.
pub trait Node<K> {
    /// The degree this node was created with.
    fn degree(&self) -> usize;

    /// The occupied key slots, in order.
    fn keys(&self) -> &[K];

    /// The internal node holding this node as a child, `None` for the root.
    fn parent(&self) -> Option<NodeId>;

    /// Registers the internal node holding this node as a child.
    fn set_parent(&mut self, parent: Option<NodeId>);

    /// Occupancy measured the way the minimum is defined for the variant:
    /// entries for leaves, children for internal nodes.
    fn occupancy(&self) -> usize;

    /// Smallest occupancy a non-root node may have.
    fn min_occupancy(&self) -> usize;

    /// Number of currently occupied key slots.
    fn key_count(&self) -> usize {
        self.keys().len()
    }

    /// The key at `index`, if that slot is occupied.
    fn key(&self, index: usize) -> Option<&K> {
        self.keys().get(index)
    }

    /// Maximum number of keys.
    fn max_keys(&self) -> usize {
        self.degree() - 1
    }

    /// Returns true if no further key fits without a split.
    fn is_full(&self) -> bool {
        self.key_count() >= self.max_keys()
    }

    /// Returns true if a non-root node must merge or borrow.
    fn is_under_utilized(&self) -> bool {
        self.occupancy() < self.min_occupancy()
    }

    /// Returns true if this node and `other` fit together in one node.
    fn mergeable(&self, other: &Self) -> bool
    where
        Self: Sized;
}

// ============================================================================
// LEAF NODE IMPLEMENTATION
// ============================================================================

impl<K, P> Node<K> for LeafNode<K, P> {
    fn degree(&self) -> usize {
        self.degree
    }

    fn keys(&self) -> &[K] {
        &self.keys
    }

    fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    fn set_parent(&mut self, parent: Option<NodeId>) {
        self.parent = parent;
    }

    fn occupancy(&self) -> usize {
        self.keys.len()
    }

    /// `ceil((degree - 1) / 2)` entries.
    fn min_occupancy(&self) -> usize {
        (self.degree - 1).div_ceil(2)
    }

    /// Combined entries fit in `degree - 1` slots.
    fn mergeable(&self, other: &Self) -> bool {
        self.keys.len() + other.keys.len() <= self.max_keys()
    }
}

impl<K, P> LeafNode<K, P> {
    // ============================================================================
    // READ ACCESSORS
    // ============================================================================

    /// Returns the number of entries in this leaf.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Returns true if this leaf holds no entries.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Get a reference to the pointers in this leaf node.
    pub fn pointers(&self) -> &[P] {
        &self.pointers
    }

    /// The pointer paired with the key at `index`.
    pub fn pointer(&self, index: usize) -> Option<&P> {
        self.pointers.get(index)
    }

    /// Iterate over the `(key, pointer)` entries of this leaf.
    pub fn entries(&self) -> impl Iterator<Item = (&K, &P)> {
        self.keys.iter().zip(self.pointers.iter())
    }

    pub fn first_key(&self) -> Option<&K> {
        self.keys.first()
    }

    pub fn last_key(&self) -> Option<&K> {
        self.keys.last()
    }

    /// The next leaf in ascending key order.
    pub fn successor(&self) -> Option<NodeId> {
        self.successor
    }

    /// Sets the successor of this leaf, returning the previous one.
    pub fn set_successor(&mut self, successor: Option<NodeId>) -> Option<NodeId> {
        std::mem::replace(&mut self.successor, successor)
    }

    // ============================================================================
    // MUTATION
    // ============================================================================

    /// Inserts an entry at `index`, shifting later entries right.
    pub(crate) fn insert_at(&mut self, index: usize, key: K, pointer: P) {
        self.keys.insert(index, key);
        self.pointers.insert(index, pointer);
    }

    /// Removes and returns the entry at `index`.
    pub(crate) fn remove_at(&mut self, index: usize) -> (K, P) {
        (self.keys.remove(index), self.pointers.remove(index))
    }

    /// Removes and returns the last entry.
    pub(crate) fn pop_last(&mut self) -> Option<(K, P)> {
        let key = self.keys.pop()?;
        let pointer = self.pointers.pop()?;
        Some((key, pointer))
    }

    /// Appends an entry that sorts after every entry already present.
    pub(crate) fn push(&mut self, key: K, pointer: P) {
        self.keys.push(key);
        self.pointers.push(pointer);
    }

    /// Moves all entries of `other` to the end of this leaf and takes over its
    /// successor.
    pub(crate) fn merge_from(&mut self, other: &mut LeafNode<K, P>) {
        self.keys.append(&mut other.keys);
        self.pointers.append(&mut other.pointers);
        self.successor = other.successor.take();
    }

    /// Clears all entries and links of this leaf.
    pub(crate) fn clear(&mut self) {
        self.keys.clear();
        self.pointers.clear();
        self.successor = None;
        self.parent = None;
    }
}

impl<K: Ord, P> LeafNode<K, P> {
    /// Index at which a new entry for `key` belongs: before any equal keys.
    fn insertion_index(&self, key: &K) -> usize {
        self.keys.partition_point(|k| k < key)
    }

    /// Inserts the entry at its sorted position. Capacity is the caller's
    /// concern: a full leaf grows one past capacity and must then be split.
    pub fn insert(&mut self, key: K, pointer: P) {
        let index = self.insertion_index(&key);
        self.insert_at(index, key, pointer);
    }

    /// Moves the entries from `at` onward into a new right sibling. The new
    /// leaf inherits this leaf's successor; linking this leaf to it is left to
    /// the caller, who knows the new leaf's id.
    pub(crate) fn split_off(&mut self, at: usize) -> LeafNode<K, P> {
        LeafNode {
            degree: self.degree,
            keys: self.keys.split_off(at),
            pointers: self.pointers.split_off(at),
            successor: self.successor.take(),
            parent: self.parent,
        }
    }

    /// Routes a search for `key` that reached this leaf.
    ///
    /// Returns `own_id` unless the key equals the separator bounding this
    /// leaf on the right (`upper`) while every key here is smaller; then the
    /// key belongs to the successor.
    pub fn find(&self, own_id: NodeId, key: &K, upper: Option<&K>) -> NodeId {
        match (self.successor, self.last_key(), upper) {
            (Some(next), Some(last), Some(bound)) if last < key && bound <= key => next,
            _ => own_id,
        }
    }
}

impl<K: Ord, P: PartialEq> LeafNode<K, P> {
    /// Position of the exact `(key, pointer)` entry.
    pub fn position(&self, key: &K, pointer: &P) -> Option<usize> {
        let start = self.insertion_index(key);
        self.keys[start..]
            .iter()
            .zip(&self.pointers[start..])
            .take_while(|(k, _)| *k == key)
            .position(|(_, p)| p == pointer)
            .map(|offset| start + offset)
    }

    /// Returns true if this leaf holds the exact `(key, pointer)` entry.
    pub fn contains(&self, key: &K, pointer: &P) -> bool {
        self.position(key, pointer).is_some()
    }

    /// Removes the exact `(key, pointer)` entry. Absent entries are ignored.
    pub fn delete(&mut self, key: &K, pointer: &P) -> bool {
        match self.position(key, pointer) {
            Some(index) => {
                self.remove_at(index);
                true
            }
            None => false,
        }
    }
}

impl<K: fmt::Debug, P> fmt::Display for LeafNode<K, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:?}", self.keys.len(), self.keys)
    }
}

// ============================================================================
// INTERNAL NODE IMPLEMENTATION
// ============================================================================

impl<K> Node<K> for InternalNode<K> {
    fn degree(&self) -> usize {
        self.degree
    }

    fn keys(&self) -> &[K] {
        &self.keys
    }

    fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    fn set_parent(&mut self, parent: Option<NodeId>) {
        self.parent = parent;
    }

    fn occupancy(&self) -> usize {
        self.children.len()
    }

    /// `ceil(degree / 2)` children.
    fn min_occupancy(&self) -> usize {
        self.degree.div_ceil(2)
    }

    /// Combined children fit in `degree` slots; the separator pulled down
    /// from the parent takes the key slot between the two groups.
    fn mergeable(&self, other: &Self) -> bool {
        self.children.len() + other.children.len() <= self.degree
    }
}

impl<K> InternalNode<K> {
    /// Get a reference to the children of this node.
    pub fn children(&self) -> &[NodeRef] {
        &self.children
    }

    /// The child at `index`.
    pub fn child(&self, index: usize) -> Option<NodeRef> {
        self.children.get(index).copied()
    }

    /// Returns the number of children, always `key_count() + 1`.
    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    /// Index of `child` among this node's children.
    pub fn child_index(&self, child: NodeRef) -> Option<usize> {
        self.children.iter().position(|c| *c == child)
    }

    /// Inserts a key and a child at explicit positions.
    pub(crate) fn insert(&mut self, key: K, key_index: usize, child: NodeRef, child_index: usize) {
        self.keys.insert(key_index, key);
        self.children.insert(child_index, child);
    }

    /// Inserts `key` and `node` immediately after `child`. Returns false when
    /// `child` is not a child of this node.
    pub(crate) fn insert_after(&mut self, key: K, node: NodeRef, child: NodeRef) -> bool {
        match self.child_index(child) {
            Some(index) => {
                self.insert(key, index, node, index + 1);
                true
            }
            None => false,
        }
    }

    /// Removes and returns the key and child at explicit positions.
    pub(crate) fn remove_at(&mut self, key_index: usize, child_index: usize) -> (K, NodeRef) {
        (self.keys.remove(key_index), self.children.remove(child_index))
    }

    /// Moves `separator` and every key and child of `other` to the end of this
    /// node.
    pub(crate) fn merge_from(&mut self, separator: K, other: &mut InternalNode<K>) {
        self.keys.push(separator);
        self.keys.append(&mut other.keys);
        self.children.append(&mut other.children);
    }

    /// Replaces the separator between the adjacent children `left` and
    /// `right`, returning the previous separator.
    pub(crate) fn change_key(&mut self, left: NodeRef, right: NodeRef, key: K) -> Option<K> {
        let index = self.child_index(left)?;
        if self.children.get(index + 1) != Some(&right) {
            return None;
        }
        Some(std::mem::replace(&mut self.keys[index], key))
    }

    /// Clears all keys, children and links of this node.
    pub(crate) fn clear(&mut self) {
        self.keys.clear();
        self.children.clear();
        self.parent = None;
    }
}

impl<K: Clone> InternalNode<K> {
    /// Replaces this node's contents with the keys `begin..end` of `other` and
    /// the children `begin..=end`.
    pub(crate) fn copy_from(&mut self, other: &InternalNode<K>, begin: usize, end: usize) {
        self.keys.clear();
        self.children.clear();
        self.keys.extend_from_slice(&other.keys[begin..end]);
        self.children.extend_from_slice(&other.children[begin..=end]);
    }
}

impl<K: Ord> InternalNode<K> {
    /// Index of the child to descend into: the number of keys strictly less
    /// than `key`.
    pub fn find_child_index(&self, key: &K) -> usize {
        self.keys.partition_point(|k| k < key)
    }

    /// The child to descend into for `key`.
    pub fn find(&self, key: &K) -> NodeRef {
        self.children[self.find_child_index(key)]
    }

    /// Removes the separator `key` together with the child to its right.
    /// Returns false when no such pair exists.
    pub(crate) fn delete(&mut self, key: &K, child: NodeRef) -> bool {
        let found = (0..self.keys.len())
            .find(|&i| self.keys[i] == *key && self.children[i + 1] == child);
        match found {
            Some(index) => {
                self.remove_at(index, index + 1);
                true
            }
            None => false,
        }
    }
}

impl<K: fmt::Debug> fmt::Display for InternalNode<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:?}", self.keys.len(), self.keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(degree: usize, entries: &[(i32, u32)]) -> LeafNode<i32, u32> {
        let mut leaf = LeafNode::new(degree);
        for &(k, p) in entries {
            leaf.insert(k, p);
        }
        leaf
    }

    fn internal(degree: usize, keys: Vec<i32>, children: Vec<NodeRef>) -> InternalNode<i32> {
        let mut node = InternalNode::new(degree);
        node.keys = keys;
        node.children = children;
        node
    }

    #[test]
    fn test_leaf_insert_keeps_order() {
        let leaf = leaf(5, &[(30, 3), (10, 1), (20, 2)]);
        assert_eq!(leaf.keys(), &[10, 20, 30]);
        assert_eq!(leaf.pointers(), &[1, 2, 3]);
        assert_eq!(leaf.key_count(), 3);
        assert_eq!(leaf.key(1), Some(&20));
        assert_eq!(leaf.pointer(2), Some(&3));
        assert_eq!(leaf.key(3), None);
    }

    #[test]
    fn test_leaf_duplicate_keys_insert_before_equal() {
        let leaf = leaf(5, &[(10, 1), (10, 2)]);
        assert_eq!(leaf.keys(), &[10, 10]);
        assert_eq!(leaf.pointers(), &[2, 1]);
        assert!(leaf.contains(&10, &1));
        assert!(leaf.contains(&10, &2));
        assert!(!leaf.contains(&10, &3));
    }

    #[test]
    fn test_leaf_delete_exact_match_only() {
        let mut leaf = leaf(5, &[(10, 1), (10, 2), (20, 3)]);
        assert!(!leaf.delete(&10, &3));
        assert!(!leaf.delete(&15, &1));
        assert_eq!(leaf.len(), 3);

        assert!(leaf.delete(&10, &1));
        assert_eq!(leaf.keys(), &[10, 20]);
        assert_eq!(leaf.pointers(), &[2, 3]);
    }

    #[test]
    fn test_leaf_occupancy_thresholds() {
        // degree 4: 3 entries max, ceil(3 / 2) = 2 minimum
        let mut node = leaf(4, &[(1, 1), (2, 2)]);
        assert!(!node.is_under_utilized());
        assert!(!node.is_full());
        node.insert(3, 3);
        assert!(node.is_full());
        node.delete(&1, &1);
        node.delete(&2, &2);
        assert!(node.is_under_utilized());

        // degree 5: 4 entries max, ceil(4 / 2) = 2 minimum
        let node = leaf(5, &[(1, 1)]);
        assert_eq!(node.min_occupancy(), 2);
        assert!(node.is_under_utilized());

        // degree 3: 2 entries max, 1 minimum
        let node = leaf(3, &[(1, 1)]);
        assert_eq!(node.min_occupancy(), 1);
        assert!(!node.is_under_utilized());
    }

    #[test]
    fn test_leaf_mergeable() {
        let a = leaf(4, &[(1, 1)]);
        let b = leaf(4, &[(2, 2), (3, 3)]);
        let c = leaf(4, &[(4, 4), (5, 5), (6, 6)]);
        assert!(a.mergeable(&b));
        assert!(!a.mergeable(&c));
    }

    #[test]
    fn test_leaf_split_off_takes_successor() {
        let mut left = leaf(4, &[(1, 1), (2, 2), (3, 3), (4, 4)]);
        left.set_successor(Some(9));
        left.set_parent(Some(7));

        let right = left.split_off(2);
        assert_eq!(left.keys(), &[1, 2]);
        assert_eq!(right.keys(), &[3, 4]);
        assert_eq!(right.pointers(), &[3, 4]);
        assert_eq!(left.successor(), None);
        assert_eq!(right.successor(), Some(9));
        assert_eq!(right.parent(), Some(7));
    }

    #[test]
    fn test_leaf_find_routes_to_successor_only_at_bound() {
        let mut node = leaf(4, &[(1, 1), (2, 2)]);
        node.set_successor(Some(5));

        // key equals the separator bounding this leaf: belongs to the successor
        assert_eq!(node.find(0, &3, Some(&3)), 5);
        // key below the separator stays here even though it is past every key
        assert_eq!(node.find(0, &3, Some(&4)), 0);
        assert_eq!(node.find(0, &2, Some(&2)), 0);
        assert_eq!(node.find(0, &3, None), 0);

        node.set_successor(None);
        assert_eq!(node.find(0, &3, Some(&3)), 0);
    }

    #[test]
    fn test_leaf_merge_from() {
        let mut left = leaf(5, &[(1, 1)]);
        let mut right = leaf(5, &[(2, 2), (3, 3)]);
        right.set_successor(Some(4));
        left.set_successor(Some(1));

        left.merge_from(&mut right);
        assert_eq!(left.keys(), &[1, 2, 3]);
        assert_eq!(left.successor(), Some(4));
        assert!(right.is_empty());
        assert_eq!(right.successor(), None);
    }

    #[test]
    fn test_internal_routing() {
        let node = internal(
            4,
            vec![10, 20],
            vec![NodeRef::Leaf(0), NodeRef::Leaf(1), NodeRef::Leaf(2)],
        );
        assert_eq!(node.find_child_index(&5), 0);
        assert_eq!(node.find_child_index(&10), 0);
        assert_eq!(node.find_child_index(&11), 1);
        assert_eq!(node.find_child_index(&20), 1);
        assert_eq!(node.find_child_index(&25), 2);
        assert_eq!(node.find(&25), NodeRef::Leaf(2));
        assert_eq!(node.child_count(), 3);
    }

    #[test]
    fn test_internal_insert_after_and_delete() {
        let mut node = internal(5, vec![10], vec![NodeRef::Leaf(0), NodeRef::Leaf(1)]);

        assert!(node.insert_after(5, NodeRef::Leaf(2), NodeRef::Leaf(0)));
        assert_eq!(node.keys(), &[5, 10]);
        assert_eq!(
            node.children(),
            &[NodeRef::Leaf(0), NodeRef::Leaf(2), NodeRef::Leaf(1)]
        );
        assert!(!node.insert_after(7, NodeRef::Leaf(3), NodeRef::Leaf(9)));

        // key and child must both match
        assert!(!node.delete(&5, NodeRef::Leaf(1)));
        assert!(node.delete(&5, NodeRef::Leaf(2)));
        assert_eq!(node.keys(), &[10]);
        assert_eq!(node.children(), &[NodeRef::Leaf(0), NodeRef::Leaf(1)]);
    }

    #[test]
    fn test_internal_copy_from_range() {
        let wide = internal(
            4,
            vec![10, 20, 30, 40],
            (0..5).map(NodeRef::Leaf).collect(),
        );
        let mut left = InternalNode::new(4);
        let mut right = InternalNode::new(4);
        left.copy_from(&wide, 0, 1);
        right.copy_from(&wide, 2, 4);

        assert_eq!(left.keys(), &[10]);
        assert_eq!(left.children(), &[NodeRef::Leaf(0), NodeRef::Leaf(1)]);
        assert_eq!(right.keys(), &[30, 40]);
        assert_eq!(
            right.children(),
            &[NodeRef::Leaf(2), NodeRef::Leaf(3), NodeRef::Leaf(4)]
        );
    }

    #[test]
    fn test_internal_change_key() {
        let mut node = internal(
            4,
            vec![10, 20],
            vec![NodeRef::Leaf(0), NodeRef::Leaf(1), NodeRef::Leaf(2)],
        );
        assert_eq!(node.change_key(NodeRef::Leaf(1), NodeRef::Leaf(2), 15), Some(20));
        assert_eq!(node.keys(), &[10, 15]);
        assert_eq!(node.change_key(NodeRef::Leaf(0), NodeRef::Leaf(2), 1), None);
    }

    #[test]
    fn test_internal_occupancy_thresholds() {
        // degree 4: ceil(4 / 2) = 2 children minimum, 4 children maximum
        let two = internal(4, vec![10], vec![NodeRef::Leaf(0), NodeRef::Leaf(1)]);
        let one = internal(4, vec![], vec![NodeRef::Leaf(2)]);
        assert!(!two.is_under_utilized());
        assert!(one.is_under_utilized());
        assert!(two.mergeable(&one));

        let three = internal(
            4,
            vec![10, 20],
            vec![NodeRef::Leaf(3), NodeRef::Leaf(4), NodeRef::Leaf(5)],
        );
        assert!(!three.mergeable(&two));
        assert!(three.mergeable(&one));

        // degree 5: ceil(5 / 2) = 3 children minimum
        let node = internal(5, vec![10], vec![NodeRef::Leaf(0), NodeRef::Leaf(1)]);
        assert_eq!(node.min_occupancy(), 3);
        assert!(node.is_under_utilized());
    }

    #[test]
    fn test_node_display() {
        let node = leaf(4, &[(1, 1), (2, 2)]);
        assert_eq!(node.to_string(), "2 [1, 2]");
    }
}
