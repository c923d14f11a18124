//! Core types and data structures for BPlusTree.
//!
//! This module contains the fundamental data structures, type definitions,
//! and constants used throughout the B+ tree implementation.

use crate::compact_arena::CompactArena;

// ============================================================================
// CONSTANTS
// ============================================================================

/// Minimum degree (maximum slots per node) for any B+ tree.
pub const MIN_DEGREE: usize = 3;

// ============================================================================
// TYPE DEFINITIONS
// ============================================================================

/// Node ID type for arena-based allocation
pub type NodeId = u32;

// ============================================================================
// CORE DATA STRUCTURES
// ============================================================================

/// In-memory B+ tree index mapping keys to record pointers.
///
/// Every entry is a `(key, pointer)` pair. The same key may be stored with
/// several distinct pointers; the identical pair is stored at most once. All
/// entries live in leaves, and the leaves are chained left to right so the
/// whole index can be read in key order by following successor links.
///
/// # Type Parameters
///
/// * `K` - Key type, must implement `Ord + Clone`
/// * `P` - Pointer type, compared with `PartialEq` to identify an entry
///
/// # Examples
///
/// ```
/// use bptree::{BPlusTree, Node};
///
/// let mut tree = BPlusTree::new(4).unwrap();
/// tree.insert("a", 1);
/// tree.insert("b", 2);
/// tree.insert("c", 3);
/// tree.insert("d", 4);
///
/// assert_eq!(tree.height(), 2);
/// assert_eq!(tree.find(&"c").keys(), &["c", "d"]);
///
/// tree.delete(&"a", &1);
/// assert_eq!(tree.height(), 1);
/// assert_eq!(tree.len(), 3);
/// ```
///
/// # Degree
///
/// - `degree` is the maximum number of slots per node: leaves hold at most
///   `degree - 1` entries, internal nodes at most `degree - 1` keys and
///   `degree` children.
/// - Minimum degree: 3 (enforced)
#[derive(Debug, Clone)]
pub struct BPlusTree<K, P> {
    /// Maximum number of slots per node.
    pub(crate) degree: usize,
    /// The root node of the tree.
    pub(crate) root: NodeRef,
    /// Number of entries stored in the leaves.
    pub(crate) len: usize,
    /// Arena storage for leaf nodes.
    pub(crate) leaf_arena: CompactArena<LeafNode<K, P>>,
    /// Arena storage for internal nodes.
    pub(crate) internal_arena: CompactArena<InternalNode<K>>,
}

/// Leaf node containing `(key, pointer)` entries.
#[derive(Debug, Clone)]
pub struct LeafNode<K, P> {
    /// Maximum number of slots; a leaf holds at most `degree - 1` entries.
    pub(crate) degree: usize,
    /// Sorted list of keys.
    pub(crate) keys: Vec<K>,
    /// Pointers paired with `keys`.
    pub(crate) pointers: Vec<P>,
    /// Next leaf in ascending key order.
    pub(crate) successor: Option<NodeId>,
    /// Internal node holding this leaf as a child.
    pub(crate) parent: Option<NodeId>,
}

/// Internal (routing) node containing separator keys and child references.
#[derive(Debug, Clone)]
pub struct InternalNode<K> {
    /// Maximum number of children.
    pub(crate) degree: usize,
    /// Sorted list of separator keys.
    pub(crate) keys: Vec<K>,
    /// Child nodes, always one more than `keys`.
    pub(crate) children: Vec<NodeRef>,
    /// Internal node holding this node as a child.
    pub(crate) parent: Option<NodeId>,
}

// ============================================================================
// ENUMS
// ============================================================================

/// Node reference that can be either a leaf or an internal node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeRef {
    Leaf(NodeId),
    Internal(NodeId),
}

impl NodeRef {
    /// Return the raw node ID.
    pub fn id(&self) -> NodeId {
        match *self {
            NodeRef::Leaf(id) => id,
            NodeRef::Internal(id) => id,
        }
    }

    /// Returns true if this reference points to a leaf node.
    pub fn is_leaf(&self) -> bool {
        matches!(self, NodeRef::Leaf(_))
    }
}

impl std::fmt::Display for NodeRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NodeRef::Leaf(id) => write!(f, "Leaf[id={}]", id),
            NodeRef::Internal(id) => write!(f, "Internal[id={}]", id),
        }
    }
}
