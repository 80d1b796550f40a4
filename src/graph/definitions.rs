//! Definition discovery
//!
//! A definition is a schema reached through a reference edge. Each one gets
//! its own page, except the root itself, which is the index page of its file.

use std::collections::HashSet;

use super::walk::{walk, Walk};
use super::{NodeIndex, SchemaGraph};
use crate::naming::{is_internal_ref, is_remote_ref};

/// Where a definition lives relative to the document that references it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefKind {
    /// Same document as the referencing schema
    Internal,
    /// Another local document
    External,
    /// A network-addressable document
    Remote,
}

impl RefKind {
    pub fn classify(from: &str, target: &str) -> Self {
        if is_internal_ref(from, target) {
            RefKind::Internal
        } else if is_remote_ref(target) {
            RefKind::Remote
        } else {
            RefKind::External
        }
    }
}

/// A schema that gets its own page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Definition {
    pub node: NodeIndex,
    pub kind: RefKind,
}

/// Reference targets reachable from `root`, deduplicated by location
///
/// Order follows the walk, so the first schema to reference a target decides
/// its [`RefKind`]. The root never appears in its own result.
pub fn definitions(graph: &SchemaGraph, root: NodeIndex) -> Vec<Definition> {
    let root_location = graph[root].location.as_str();
    let mut seen: HashSet<&str> = HashSet::new();
    let mut found = Vec::new();

    walk(graph, root, true, |_, node| {
        for target in [node.dynamic_reference, node.reference].into_iter().flatten() {
            let location = graph[target].location.as_str();
            if location == root_location || !seen.insert(location) {
                continue;
            }

            let kind = RefKind::classify(node.location.as_str(), location);
            tracing::debug!("found definition: {} ({:?})", location, kind);
            found.push(Definition { node: target, kind });
        }
        Walk::Continue
    });

    found
}
