//! Validation and debugging utilities for BPlusTree.
//!
//! This module contains the invariant checker and the small inspection helpers
//! tests use to look at the shape of a tree.

use crate::error::{BPlusTreeError, BTreeResult};
use crate::node::Node;
use crate::types::{BPlusTree, NodeId, NodeRef};

/// Inclusive key bounds a subtree must respect. Equal keys may sit on either
/// side of a separator.
struct Bounds<'a, K> {
    lower: Option<&'a K>,
    upper: Option<&'a K>,
}

/// State collected while walking the tree.
struct Walk {
    leaf_depth: Option<usize>,
    leaves_in_order: Vec<NodeId>,
    internal_count: usize,
}

// ============================================================================
// VALIDATION METHODS
// ============================================================================

impl<K: Ord, P: PartialEq> BPlusTree<K, P> {
    /// Check if the tree maintains B+ tree invariants.
    /// Returns true if all invariants are satisfied.
    pub fn check_invariants(&self) -> bool {
        self.check_invariants_detailed().is_ok()
    }

    /// Check invariants with detailed error reporting.
    ///
    /// Verifies ordering, capacity and minimum occupancy of every node, that
    /// every internal node has one more child than keys, parent back-links,
    /// separator bounds, uniform leaf depth, the leaf chain, the entry count
    /// and the arena bookkeeping.
    pub fn check_invariants_detailed(&self) -> BTreeResult<()> {
        let mut walk = Walk {
            leaf_depth: None,
            leaves_in_order: Vec::new(),
            internal_count: 0,
        };
        let root_bounds = Bounds {
            lower: None,
            upper: None,
        };
        if self.parent_of(self.root).is_some() {
            return Err(BPlusTreeError::corrupted_tree(
                "Root",
                &format!("{} has a parent", self.root),
            ));
        }
        self.check_node(self.root, root_bounds, 0, &mut walk)?;

        self.check_leaf_chain(&walk.leaves_in_order)?;
        self.check_arena_tree_consistency(&walk)
    }

    /// Recursively check a node and its subtree.
    fn check_node(
        &self,
        node: NodeRef,
        bounds: Bounds<'_, K>,
        depth: usize,
        walk: &mut Walk,
    ) -> BTreeResult<()> {
        let is_root = node == self.root;
        match node {
            NodeRef::Leaf(id) => {
                let Some(leaf) = self.get_leaf(id) else {
                    return Err(BPlusTreeError::arena_error(
                        "Leaf lookup",
                        &format!("{} is not allocated", node),
                    ));
                };
                if leaf.keys.len() != leaf.pointers.len() {
                    return Err(BPlusTreeError::data_integrity(
                        &node.to_string(),
                        &format!(
                            "{} keys but {} pointers",
                            leaf.keys.len(),
                            leaf.pointers.len()
                        ),
                    ));
                }
                self.check_keys(node, leaf.keys(), leaf.degree(), &bounds)?;
                if !is_root && leaf.is_under_utilized() {
                    return Err(BPlusTreeError::data_integrity(
                        &node.to_string(),
                        &format!(
                            "{} entries, minimum is {}",
                            leaf.len(),
                            leaf.min_occupancy()
                        ),
                    ));
                }

                match walk.leaf_depth {
                    None => walk.leaf_depth = Some(depth),
                    Some(expected) if expected != depth => {
                        return Err(BPlusTreeError::corrupted_tree(
                            "Leaf level",
                            &format!("{} at depth {}, expected {}", node, depth, expected),
                        ));
                    }
                    Some(_) => {}
                }
                walk.leaves_in_order.push(id);
                Ok(())
            }
            NodeRef::Internal(id) => {
                let Some(internal) = self.get_internal(id) else {
                    return Err(BPlusTreeError::arena_error(
                        "Internal node lookup",
                        &format!("{} is not allocated", node),
                    ));
                };
                walk.internal_count += 1;

                self.check_keys(node, internal.keys(), internal.degree(), &bounds)?;
                if internal.child_count() != internal.key_count() + 1 {
                    return Err(BPlusTreeError::data_integrity(
                        &node.to_string(),
                        &format!(
                            "{} keys but {} children",
                            internal.key_count(),
                            internal.child_count()
                        ),
                    ));
                }
                let minimum = if is_root { 2 } else { internal.min_occupancy() };
                if internal.child_count() < minimum {
                    return Err(BPlusTreeError::data_integrity(
                        &node.to_string(),
                        &format!("{} children, minimum is {}", internal.child_count(), minimum),
                    ));
                }

                for (index, child) in internal.children().iter().enumerate() {
                    let Some(parent) = self.child_parent(*child) else {
                        return Err(BPlusTreeError::arena_error(
                            "Child lookup",
                            &format!("{} is not allocated", child),
                        ));
                    };
                    if parent != Some(id) {
                        return Err(BPlusTreeError::corrupted_tree(
                            "Parent link",
                            &format!("{} points to {:?}, expected {}", child, parent, id),
                        ));
                    }

                    let child_bounds = Bounds {
                        lower: index.checked_sub(1).map(|i| &internal.keys[i]).or(bounds.lower),
                        upper: internal.keys.get(index).or(bounds.upper),
                    };
                    self.check_node(*child, child_bounds, depth + 1, walk)?;
                }
                Ok(())
            }
        }
    }

    /// Parent link of a node that may not be allocated.
    fn child_parent(&self, node: NodeRef) -> Option<Option<NodeId>> {
        match node {
            NodeRef::Leaf(id) => self.get_leaf(id).map(|leaf| leaf.parent()),
            NodeRef::Internal(id) => self.get_internal(id).map(|internal| internal.parent()),
        }
    }

    /// Checks order, capacity and bounds of one node's keys.
    fn check_keys(
        &self,
        node: NodeRef,
        keys: &[K],
        degree: usize,
        bounds: &Bounds<'_, K>,
    ) -> BTreeResult<()> {
        if degree != self.degree {
            return Err(BPlusTreeError::data_integrity(
                &node.to_string(),
                &format!("degree {} in a tree of degree {}", degree, self.degree),
            ));
        }
        if keys.len() > self.degree - 1 {
            return Err(BPlusTreeError::data_integrity(
                &node.to_string(),
                &format!("{} keys exceed capacity {}", keys.len(), self.degree - 1),
            ));
        }
        if let Some(index) = keys.windows(2).position(|pair| pair[0] > pair[1]) {
            return Err(BPlusTreeError::data_integrity(
                &node.to_string(),
                &format!("keys out of order at index {}", index + 1),
            ));
        }
        let below = bounds
            .lower
            .is_some_and(|lower| keys.first().is_some_and(|first| first < lower));
        let above = bounds
            .upper
            .is_some_and(|upper| keys.last().is_some_and(|last| last > upper));
        if below || above {
            return Err(BPlusTreeError::data_integrity(
                &node.to_string(),
                "keys outside the range set by the parent separators",
            ));
        }
        Ok(())
    }

    /// Check that the successor chain visits exactly the in-order leaf
    /// sequence and yields every entry once, in order.
    fn check_leaf_chain(&self, leaves_in_order: &[NodeId]) -> BTreeResult<()> {
        // Bounded so a cycle in the chain shows up as a mismatch
        let chain: Vec<NodeId> = self
            .leaves()
            .take(self.leaf_arena.len() + 1)
            .map(|(id, _)| id)
            .collect();
        if chain != leaves_in_order {
            return Err(BPlusTreeError::corrupted_tree(
                "Leaf chain",
                &format!("tree has {:?}, chain has {:?}", leaves_in_order, chain),
            ));
        }

        let entries: Vec<(&K, &P)> = self.entries().collect();
        if let Some(index) = entries.windows(2).position(|pair| pair[0].0 > pair[1].0) {
            return Err(BPlusTreeError::corrupted_tree(
                "Leaf chain",
                &format!("entries out of order at index {}", index + 1),
            ));
        }
        for (index, (key, pointer)) in entries.iter().enumerate() {
            let repeated = entries[index + 1..]
                .iter()
                .take_while(|(k, _)| k == key)
                .any(|(_, p)| p == pointer);
            if repeated {
                return Err(BPlusTreeError::data_integrity(
                    "Leaf chain",
                    &format!("entry at index {} is stored twice", index),
                ));
            }
        }

        if entries.len() != self.len {
            return Err(BPlusTreeError::data_integrity(
                "Entry count",
                &format!("chain holds {} entries but len is {}", entries.len(), self.len),
            ));
        }
        Ok(())
    }

    /// Check that arena allocation matches tree structure.
    fn check_arena_tree_consistency(&self, walk: &Walk) -> BTreeResult<()> {
        let leaf_stats = self.leaf_arena.stats();
        if walk.leaves_in_order.len() != leaf_stats.allocated_count {
            return Err(BPlusTreeError::arena_error(
                "Leaf consistency check",
                &format!(
                    "{} in tree vs {} in arena",
                    walk.leaves_in_order.len(),
                    leaf_stats.allocated_count
                ),
            ));
        }

        let internal_stats = self.internal_arena.stats();
        if walk.internal_count != internal_stats.allocated_count {
            return Err(BPlusTreeError::arena_error(
                "Internal node consistency check",
                &format!(
                    "{} in tree vs {} in arena",
                    walk.internal_count, internal_stats.allocated_count
                ),
            ));
        }
        Ok(())
    }
}

impl<K, P> BPlusTree<K, P> {
    /// Number of entries in each leaf, in chain order.
    pub fn leaf_sizes(&self) -> Vec<usize> {
        self.leaves().map(|(_, leaf)| leaf.len()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn populated(degree: usize, count: i32) -> BPlusTree<i32, i32> {
        let mut tree = BPlusTree::new(degree).unwrap();
        for key in 0..count {
            tree.insert(key, key);
        }
        tree
    }

    #[test]
    fn test_valid_trees_pass() {
        assert!(BPlusTree::<i32, i32>::new(3).unwrap().check_invariants());
        for degree in 3..=6 {
            assert_eq!(populated(degree, 40).check_invariants_detailed(), Ok(()));
        }
    }

    #[test]
    fn test_leaf_sizes() {
        let tree = populated(4, 5);
        assert_eq!(tree.leaf_sizes(), vec![2, 3]);
    }

    #[test]
    fn test_detects_out_of_order_keys() {
        let mut tree = populated(4, 3);
        let NodeRef::Leaf(root) = tree.root else {
            panic!("expected a leaf root");
        };
        tree.leaf_mut(root).keys.swap(0, 2);
        let err = tree.check_invariants_detailed().unwrap_err();
        assert!(err.is_corruption());
        assert!(err.to_string().contains("out of order"));
    }

    #[test]
    fn test_detects_broken_chain() {
        let mut tree = populated(4, 10);
        let first = tree.first_leaf_id();
        tree.leaf_mut(first).set_successor(None);
        let err = tree.check_invariants_detailed().unwrap_err();
        assert!(matches!(err, BPlusTreeError::CorruptedTree(_)));
    }

    #[test]
    fn test_detects_wrong_parent_link() {
        let mut tree = populated(4, 10);
        let first = tree.first_leaf_id();
        tree.leaf_mut(first).set_parent(None);
        assert!(!tree.check_invariants());
    }

    #[test]
    fn test_detects_under_utilized_leaf() {
        let mut tree = populated(4, 10);
        let first = tree.first_leaf_id();
        tree.leaf_mut(first).remove_at(0);
        tree.len -= 1;
        let err = tree.check_invariants_detailed().unwrap_err();
        assert!(err.to_string().contains("minimum"));
    }

    #[test]
    fn test_detects_len_mismatch() {
        let mut tree = populated(4, 10);
        tree.len += 1;
        let err = tree.check_invariants_detailed().unwrap_err();
        assert!(err.to_string().contains("len"));
    }

    #[test]
    fn test_detects_leaked_arena_node() {
        let mut tree = populated(4, 10);
        tree.leaf_arena.allocate(crate::types::LeafNode::new(4));
        let err = tree.check_invariants_detailed().unwrap_err();
        assert!(matches!(err, BPlusTreeError::ArenaError(_)));
    }
}
