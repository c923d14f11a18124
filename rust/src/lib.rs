//! B+ tree index implementation in Rust.
//!
//! This crate provides an in-memory B+ tree mapping ordered keys to opaque
//! record pointers, the way a database index maps column values to row
//! locations. An entry is a `(key, pointer)` pair: the same key may be stored
//! with several pointers, and inserting or deleting a pair is idempotent.
//!
//! Nodes live in two arenas owned by the tree and refer to each other by
//! [`NodeId`]. All entries are kept in leaves, which are chained left to right
//! so the whole index can be read in key order.
//!
//! # Examples
//!
//! ```
//! use bptree::BPlusTree;
//!
//! let mut index = BPlusTree::new(4).unwrap();
//! index.insert("carol", 12_u64);
//! index.insert("alice", 40);
//! index.insert("bob", 7);
//! index.insert("alice", 41);
//!
//! assert_eq!(index.len(), 4);
//! assert!(index.contains(&"alice", &41));
//!
//! let keys: Vec<&str> = index.keys().copied().collect();
//! assert_eq!(keys, vec!["alice", "alice", "bob", "carol"]);
//!
//! index.delete(&"alice", &40);
//! assert_eq!(index.lookup(&"alice"), vec![&41]);
//! assert!(index.check_invariants());
//! ```

mod compact_arena;
mod construction;
mod delete_operations;
mod error;
mod get_operations;
mod insert_operations;
mod iteration;
mod node;
pub mod playback;
mod tree_structure;
mod types;
mod validation;

pub use compact_arena::{CompactArena, CompactArenaStats};
pub use construction::validation as config;
pub use construction::DEFAULT_DEGREE;
pub use error::{BPlusTreeError, BTreeResult, InitResult, PlaybackError};
pub use iteration::{EntryIterator, KeyIterator, LeafChain};
pub use node::Node;
pub use types::{BPlusTree, InternalNode, LeafNode, NodeId, NodeRef, MIN_DEGREE};
