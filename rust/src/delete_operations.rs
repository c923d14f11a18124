//! DELETE operations for BPlusTree.
//!
//! This module contains the deletion path of the B+ tree: removing an entry
//! from its leaf, repairing under-utilized nodes by merging with or borrowing
//! from a sibling, and shrinking the tree when the root is left with a single
//! child.

use tracing::{debug, trace};

use crate::node::Node;
use crate::types::{BPlusTree, NodeId, NodeRef};

/// Which neighbour of an under-utilized node was chosen to repair it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Left,
    Right,
}

/// An under-utilized node together with the sibling chosen to repair it.
#[derive(Debug, Clone, Copy)]
struct Repair {
    node: NodeRef,
    sibling: NodeRef,
    side: Side,
    parent: NodeId,
    /// Index of the separator between `node` and `sibling` in `parent`.
    separator_index: usize,
}

impl Repair {
    /// The two nodes in key order.
    fn ordered(&self) -> (NodeRef, NodeRef) {
        match self.side {
            Side::Right => (self.node, self.sibling),
            Side::Left => (self.sibling, self.node),
        }
    }
}

impl<K: Ord + Clone, P: PartialEq> BPlusTree<K, P> {
    /// Deletes the `(key, pointer)` entry.
    ///
    /// Returns `true` if the entry was present. Deleting an absent entry
    /// leaves the tree untouched and returns `false`.
    ///
    /// # Examples
    ///
    /// ```
    /// use bptree::BPlusTree;
    ///
    /// let mut tree = BPlusTree::new(4).unwrap();
    /// tree.insert("a", 1);
    /// tree.insert("a", 2);
    /// assert!(!tree.delete(&"a", &3));
    /// assert!(tree.delete(&"a", &1));
    /// assert_eq!(tree.lookup(&"a"), vec![&2]);
    /// ```
    pub fn delete(&mut self, key: &K, pointer: &P) -> bool {
        let Some(leaf_id) = self.locate_entry(key, pointer) else {
            trace!("delete: entry not present");
            return false;
        };
        trace!(leaf = leaf_id, "delete: entry found");

        self.leaf_mut(leaf_id).delete(key, pointer);
        self.len -= 1;
        self.rebalance(NodeRef::Leaf(leaf_id));
        true
    }

    /// Removes the separator `key` and the child to its right from an
    /// internal node, then repairs that node.
    fn delete_internal_entry(&mut self, node_id: NodeId, key: &K, child: NodeRef) {
        let removed = self.internal_mut(node_id).delete(key, child);
        assert!(removed, "separator for {} missing from internal node {}", child, node_id);
        self.rebalance(NodeRef::Internal(node_id));
    }

    /// Restores the occupancy invariants after `node` lost an entry or child.
    fn rebalance(&mut self, node: NodeRef) {
        if node == self.root {
            self.collapse_root_if_needed();
            return;
        }

        let under_utilized = match node {
            NodeRef::Leaf(id) => self.leaf(id).is_under_utilized(),
            NodeRef::Internal(id) => self.internal(id).is_under_utilized(),
        };
        if !under_utilized {
            return;
        }

        let repair = self.choose_sibling(node);
        if self.mergeable(repair.node, repair.sibling) {
            self.merge(repair);
        } else {
            self.redistribute(repair);
        }
    }

    /// Replaces an internal root left with a single child by that child.
    fn collapse_root_if_needed(&mut self) {
        let NodeRef::Internal(root_id) = self.root else {
            return;
        };
        if self.internal(root_id).child_count() != 1 {
            return;
        }

        let child = self.internal(root_id).children[0];
        self.set_parent(child, None);
        self.root = child;
        self.internal_arena.deallocate(root_id);
        debug!(old_root = root_id, new_root = child.id(), "tree lost a level");
    }

    /// Picks the sibling used to repair `node`: the right neighbour, unless it
    /// is missing or already full while a left neighbour exists.
    fn choose_sibling(&self, node: NodeRef) -> Repair {
        let Some(parent) = self.parent_of(node) else {
            panic!("non-root {} has no parent", node);
        };
        let parent_node = self.internal(parent);
        let Some(index) = parent_node.child_index(node) else {
            panic!("{} is not a child of its parent {}", node, parent);
        };

        let left = index.checked_sub(1).and_then(|i| parent_node.child(i));
        let right = parent_node.child(index + 1);
        match (left, right) {
            (Some(left), Some(right)) if self.is_full(right) => Repair {
                node,
                sibling: left,
                side: Side::Left,
                parent,
                separator_index: index - 1,
            },
            (_, Some(right)) => Repair {
                node,
                sibling: right,
                side: Side::Right,
                parent,
                separator_index: index,
            },
            (Some(left), None) => Repair {
                node,
                sibling: left,
                side: Side::Left,
                parent,
                separator_index: index - 1,
            },
            (None, None) => panic!("{} is the only child of internal node {}", node, parent),
        }
    }

    fn mergeable(&self, a: NodeRef, b: NodeRef) -> bool {
        match (a, b) {
            (NodeRef::Leaf(a), NodeRef::Leaf(b)) => self.leaf(a).mergeable(self.leaf(b)),
            (NodeRef::Internal(a), NodeRef::Internal(b)) => {
                self.internal(a).mergeable(self.internal(b))
            }
            _ => panic!("siblings {} and {} are on different levels", a, b),
        }
    }

    /// Folds the right node of the pair into the left one and removes the
    /// right node's separator from the parent.
    fn merge(&mut self, repair: Repair) {
        let (left, right) = repair.ordered();
        let separator = self.internal(repair.parent).keys[repair.separator_index].clone();

        match (left, right) {
            (NodeRef::Leaf(left_id), NodeRef::Leaf(right_id)) => {
                let Some(mut discarded) = self.leaf_arena.deallocate(right_id) else {
                    panic!("leaf {} missing from arena", right_id);
                };
                let survivor = self.leaf_mut(left_id);
                assert!(
                    survivor.mergeable(&discarded),
                    "merged leaf {} would overflow",
                    left_id
                );
                survivor.merge_from(&mut discarded);
                discarded.clear();
            }
            (NodeRef::Internal(left_id), NodeRef::Internal(right_id)) => {
                let Some(mut discarded) = self.internal_arena.deallocate(right_id) else {
                    panic!("internal node {} missing from arena", right_id);
                };
                let survivor = self.internal_mut(left_id);
                assert!(
                    survivor.mergeable(&discarded),
                    "merged internal node {} would overflow",
                    left_id
                );
                survivor.merge_from(separator.clone(), &mut discarded);
                discarded.clear();
                self.adopt_children(left_id);
            }
            _ => panic!("siblings {} and {} are on different levels", left, right),
        }

        debug!(
            survivor = left.id(),
            discarded = right.id(),
            parent = repair.parent,
            "merged siblings"
        );
        self.delete_internal_entry(repair.parent, &separator, right);
    }

    /// Moves the sibling's boundary entry into the under-utilized node and
    /// updates the separator between them. Never changes the parent's
    /// occupancy.
    fn redistribute(&mut self, repair: Repair) {
        let (left, right) = repair.ordered();
        let new_separator = match (repair.node, repair.sibling) {
            (NodeRef::Leaf(node_id), NodeRef::Leaf(sibling_id)) => {
                self.borrow_leaf_entry(node_id, sibling_id, repair.side)
            }
            (NodeRef::Internal(node_id), NodeRef::Internal(sibling_id)) => {
                let separator = self.internal(repair.parent).keys[repair.separator_index].clone();
                self.borrow_child(node_id, sibling_id, separator, repair.side)
            }
            (node, sibling) => panic!("siblings {} and {} are on different levels", node, sibling),
        };

        let replaced = self
            .internal_mut(repair.parent)
            .change_key(left, right, new_separator);
        assert!(
            replaced.is_some(),
            "{} and {} are not adjacent in internal node {}",
            left,
            right,
            repair.parent
        );
        debug!(
            node = repair.node.id(),
            sibling = repair.sibling.id(),
            parent = repair.parent,
            "redistributed one entry"
        );
    }

    /// Moves one entry from a leaf sibling and returns the new separator.
    fn borrow_leaf_entry(&mut self, node_id: NodeId, sibling_id: NodeId, side: Side) -> K {
        let sibling = self.leaf_mut(sibling_id);
        assert!(
            sibling.len() > sibling.min_occupancy(),
            "leaf {} cannot spare an entry",
            sibling_id
        );
        match side {
            Side::Right => {
                let (key, pointer) = sibling.remove_at(0);
                let Some(separator) = sibling.first_key().cloned() else {
                    panic!("leaf {} emptied by redistribution", sibling_id);
                };
                self.leaf_mut(node_id).push(key, pointer);
                separator
            }
            Side::Left => {
                let Some((key, pointer)) = sibling.pop_last() else {
                    panic!("leaf {} emptied by redistribution", sibling_id);
                };
                let separator = key.clone();
                self.leaf_mut(node_id).insert_at(0, key, pointer);
                separator
            }
        }
    }

    /// Rotates one child from an internal sibling through the parent and
    /// returns the new separator.
    fn borrow_child(&mut self, node_id: NodeId, sibling_id: NodeId, separator: K, side: Side) -> K {
        let sibling = self.internal_mut(sibling_id);
        assert!(
            sibling.child_count() > sibling.min_occupancy(),
            "internal node {} cannot spare a child",
            sibling_id
        );
        let (new_separator, moved) = match side {
            Side::Right => {
                let (key, child) = sibling.remove_at(0, 0);
                let node = self.internal_mut(node_id);
                let (key_index, child_index) = (node.key_count(), node.child_count());
                node.insert(separator, key_index, child, child_index);
                (key, child)
            }
            Side::Left => {
                let (key_index, child_index) = (sibling.key_count() - 1, sibling.child_count() - 1);
                let (key, child) = sibling.remove_at(key_index, child_index);
                self.internal_mut(node_id).insert(separator, 0, child, 0);
                (key, child)
            }
        };
        self.set_parent(moved, Some(node_id));
        new_separator
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree_with(degree: usize, keys: impl IntoIterator<Item = i32>) -> BPlusTree<i32, i32> {
        let mut tree = BPlusTree::new(degree).unwrap();
        for key in keys {
            tree.insert(key, key * 10);
        }
        tree
    }

    fn leaf_keys(tree: &BPlusTree<i32, i32>) -> Vec<Vec<i32>> {
        tree.leaves().map(|(_, leaf)| leaf.keys().to_vec()).collect()
    }

    #[test]
    fn test_delete_absent_is_noop() {
        let mut tree = tree_with(4, 0..10);
        let before = leaf_keys(&tree);
        assert!(!tree.delete(&3, &31));
        assert!(!tree.delete(&99, &990));
        assert_eq!(leaf_keys(&tree), before);
        assert_eq!(tree.len(), 10);
    }

    #[test]
    fn test_merge_collapses_root() {
        let mut tree = tree_with(4, 1..=4);
        assert_eq!(leaf_keys(&tree), vec![vec![1, 2], vec![3, 4]]);

        assert!(tree.delete(&1, &10));
        assert!(tree.root().is_leaf());
        assert_eq!(leaf_keys(&tree), vec![vec![2, 3, 4]]);
        assert_eq!(tree.internal_arena.len(), 0);
        assert_eq!(tree.leaf_arena.len(), 1);
    }

    #[test]
    fn test_redistribute_from_full_right_sibling() {
        // leaves [1, 2] [3, 4, 5]
        let mut tree = tree_with(4, 1..=5);
        assert_eq!(leaf_keys(&tree), vec![vec![1, 2], vec![3, 4, 5]]);

        assert!(tree.delete(&1, &10));
        assert_eq!(leaf_keys(&tree), vec![vec![2, 3], vec![4, 5]]);
        let NodeRef::Internal(root) = tree.root() else {
            panic!("root should stay internal");
        };
        assert_eq!(tree.internal(root).keys(), &[4]);
        assert!(tree.check_invariants_detailed().is_ok());
    }

    #[test]
    fn test_redistribute_from_left_sibling() {
        // leaves [1, 2] [3, 4] [5, 6], then grow the first one to [0, 1, 2]
        let mut tree = tree_with(4, 1..=6);
        tree.insert(0, 0);
        assert_eq!(leaf_keys(&tree), vec![vec![0, 1, 2], vec![3, 4], vec![5, 6]]);

        // [3, 4] loses 4; its right sibling [5, 6] is not full, so merge wins
        assert!(tree.delete(&4, &40));
        assert_eq!(leaf_keys(&tree), vec![vec![0, 1, 2], vec![3, 5, 6]]);

        // the rightmost leaf can only repair itself from the left
        assert!(tree.delete(&5, &50));
        assert!(tree.delete(&6, &60));
        assert_eq!(leaf_keys(&tree), vec![vec![0, 1], vec![2, 3]]);
        let NodeRef::Internal(root) = tree.root() else {
            panic!("root should stay internal");
        };
        assert_eq!(tree.internal(root).keys(), &[2]);
        assert!(tree.check_invariants_detailed().is_ok());
    }

    #[test]
    fn test_internal_merge_propagates_and_shrinks() {
        let mut tree = tree_with(3, 1..=20);
        let height = tree.height();
        assert!(height >= 3);

        for key in 1..=20 {
            assert!(tree.delete(&key, &(key * 10)));
            assert!(
                tree.check_invariants_detailed().is_ok(),
                "invariants broken after deleting {}",
                key
            );
        }
        assert!(tree.is_empty());
        assert!(tree.root().is_leaf());
        assert_eq!(tree.height(), 1);
        assert_eq!(tree.internal_arena.len(), 0);
    }

    #[test]
    fn test_internal_redistribution() {
        let mut tree = tree_with(4, 1..=30);
        for key in (1..=30).rev().step_by(2) {
            assert!(tree.delete(&key, &(key * 10)));
            assert!(tree.check_invariants_detailed().is_ok());
        }
        let remaining: Vec<i32> = tree.keys().copied().collect();
        assert_eq!(remaining, (1..=30).filter(|k| k % 2 == 1).collect::<Vec<_>>());
    }
}
