//! Tree structure management operations for BPlusTree.
//!
//! This module contains the tree-level operations that look at the overall
//! structure: size queries, node counting, clearing, and the text dump used
//! to inspect a tree.

use std::fmt;

use crate::types::{BPlusTree, LeafNode, NodeRef};

// ============================================================================
// TREE STRUCTURE OPERATIONS
// ============================================================================

impl<K, P> BPlusTree<K, P> {
    /// Returns the number of entries in the tree.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if the tree holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns true if the root is a leaf node.
    pub fn is_leaf_root(&self) -> bool {
        self.root.is_leaf()
    }

    /// Number of levels, counting the leaf level. All leaves share it.
    ///
    /// # Examples
    ///
    /// ```
    /// use bptree::BPlusTree;
    ///
    /// let mut tree = BPlusTree::new(3).unwrap();
    /// assert_eq!(tree.height(), 1);
    /// for key in 0..3 {
    ///     tree.insert(key, ());
    /// }
    /// assert_eq!(tree.height(), 2);
    /// ```
    pub fn height(&self) -> usize {
        let mut height = 1;
        let mut current = self.root;
        while let NodeRef::Internal(id) = current {
            current = self.internal(id).children[0];
            height += 1;
        }
        height
    }

    /// Returns the number of leaf nodes in the tree.
    pub fn leaf_count(&self) -> usize {
        self.leaf_arena.len()
    }

    /// Returns the number of internal nodes in the tree.
    pub fn internal_count(&self) -> usize {
        self.internal_arena.len()
    }

    /// Count the leaf and internal nodes reachable from the root.
    pub fn count_nodes_in_tree(&self) -> (usize, usize) {
        self.count_nodes_recursive(self.root)
    }

    fn count_nodes_recursive(&self, node: NodeRef) -> (usize, usize) {
        match node {
            NodeRef::Leaf(_) => (1, 0),
            NodeRef::Internal(id) => self.internal(id).children.iter().fold(
                (0, 1),
                |(leaves, internals), child| {
                    let (l, i) = self.count_nodes_recursive(*child);
                    (leaves + l, internals + i)
                },
            ),
        }
    }

    /// Removes every entry, leaving a single empty root leaf.
    pub fn clear(&mut self) {
        self.leaf_arena.clear();
        self.internal_arena.clear();

        let root_id = self.leaf_arena.allocate(LeafNode::new(self.degree));
        self.root = NodeRef::Leaf(root_id);
        self.len = 0;
    }
}

// ============================================================================
// TEXT DUMP
// ============================================================================

impl<K: fmt::Debug, P: fmt::Debug> BPlusTree<K, P> {
    fn fmt_node(&self, f: &mut fmt::Formatter<'_>, node: NodeRef, depth: usize) -> fmt::Result {
        let indent = "  ".repeat(depth);
        match node {
            NodeRef::Leaf(id) => {
                let leaf = self.leaf(id);
                write!(f, "{}Leaf[id={}] {} {:?}", indent, id, leaf, leaf.pointers())?;
                match leaf.successor() {
                    Some(next) => writeln!(f, " -> {}", next),
                    None => writeln!(f),
                }
            }
            NodeRef::Internal(id) => {
                let internal = self.internal(id);
                writeln!(f, "{}Internal[id={}] {}", indent, id, internal)?;
                for child in internal.children() {
                    self.fmt_node(f, *child, depth + 1)?;
                }
                Ok(())
            }
        }
    }
}

/// Indented dump of the whole tree, one node per line, children below their
/// parent. Each node shows its key count and keys; leaves also show their
/// pointers and the id of their successor.
impl<K: fmt::Debug, P: fmt::Debug> fmt::Display for BPlusTree<K, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "BPlusTree(degree={}, entries={}, height={})",
            self.degree,
            self.len,
            self.height()
        )?;
        self.fmt_node(f, self.root, 1)
    }
}
