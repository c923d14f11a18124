//! Shared helpers for the integration tests.
//!
//! `RUST_LOG` controls tracing output, e.g. `RUST_LOG=bptree=debug cargo test`
//! prints every split, merge and redistribution.

#![allow(dead_code)]

use std::sync::Once;

use bptree::{BPlusTree, Node};
use tracing_subscriber::EnvFilter;

static INIT: Once = Once::new();

/// Installs the test subscriber. Only the first call takes effect.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}

/// Keys of every leaf, in chain order.
pub fn leaf_keys<K: Clone, P>(tree: &BPlusTree<K, P>) -> Vec<Vec<K>> {
    tree.leaves().map(|(_, leaf)| leaf.keys().to_vec()).collect()
}

/// Asserts the full invariant set, reporting the first violation.
pub fn assert_invariants<K: Ord, P: PartialEq>(tree: &BPlusTree<K, P>, context: &str) {
    if let Err(err) = tree.check_invariants_detailed() {
        panic!("invariants violated after {}: {}", context, err);
    }
}
