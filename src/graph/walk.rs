//! Depth-first traversal of the schema graph
//!
//! Edge order is fixed: reference edges (when followed), composition lists,
//! conditional and auxiliary slots, properties, dependent schemas, pattern
//! properties, items. The first node to reach a location wins, so this order
//! decides output order whenever no source weighting is applied.

use std::collections::HashSet;

use super::{NodeIndex, SchemaGraph, SchemaNode};

/// Composition lists, walked right after reference edges
pub const COMPOSITION_KEYWORDS: &[&str] = &["anyOf", "allOf", "oneOf", "prefixItems"];

/// Single-schema slots
pub const AUXILIARY_KEYWORDS: &[&str] = &[
    "not",
    "else",
    "then",
    "contains",
    "propertyNames",
    "unevaluatedItems",
    "unevaluatedProperties",
    "if",
    "additionalProperties",
    "additionalItems",
];

/// Named sub-schema maps, in walk order
pub const MAP_KEYWORDS: &[&str] = &["properties", "dependentSchemas", "patternProperties"];

/// Array item schemas, single or tuple form
pub const ITEMS_KEYWORD: &str = "items";

/// What the visitor wants done with the current node's subtree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Walk {
    Continue,
    /// Do not descend below this node; the rest of the walk goes on
    SkipChildren,
}

/// Children of a node in walk order
pub fn children(node: &SchemaNode, follow_refs: bool) -> Vec<NodeIndex> {
    let mut out = Vec::new();

    if follow_refs {
        out.extend(node.dynamic_reference);
        out.extend(node.reference);
    }

    let keywords = COMPOSITION_KEYWORDS
        .iter()
        .chain(AUXILIARY_KEYWORDS)
        .chain(MAP_KEYWORDS)
        .chain(std::iter::once(&ITEMS_KEYWORD));
    for name in keywords {
        if let Some(keyword) = node.keyword(name) {
            out.extend(keyword.schemas());
        }
    }

    out
}

/// Visit every node reachable from `root`, including `root`, exactly once
///
/// Locations already visited are never visited again, which is what makes
/// self-referencing and mutually-referencing schemas terminate.
pub fn walk<F>(graph: &SchemaGraph, root: NodeIndex, follow_refs: bool, mut visit: F)
where
    F: FnMut(NodeIndex, &SchemaNode) -> Walk,
{
    let mut visited = HashSet::new();
    walk_inner(graph, root, follow_refs, &mut visited, &mut visit);
}

fn walk_inner<F>(
    graph: &SchemaGraph,
    idx: NodeIndex,
    follow_refs: bool,
    visited: &mut HashSet<String>,
    visit: &mut F,
) where
    F: FnMut(NodeIndex, &SchemaNode) -> Walk,
{
    let node = &graph[idx];
    if !visited.insert(node.location.as_str().to_string()) {
        return;
    }

    if visit(idx, node) == Walk::SkipChildren {
        return;
    }

    for child in children(node, follow_refs) {
        walk_inner(graph, child, follow_refs, visited, visit);
    }
}

/// Nodes reachable without following references that combine other schemas
pub fn find_type_ofs(graph: &SchemaGraph, root: NodeIndex) -> Vec<NodeIndex> {
    let mut found = Vec::new();
    walk(graph, root, false, |idx, node| {
        if node.is_composition() {
            found.push(idx);
        }
        Walk::Continue
    });
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{EdgeKind, Keyword, Location};

    fn add(graph: &mut SchemaGraph, anchor: &str) -> NodeIndex {
        graph.add(SchemaNode::new(Location::new("t.json", anchor), "t.json"))
    }

    fn set_ref(graph: &mut SchemaGraph, from: NodeIndex, to: NodeIndex) {
        graph.node_mut(from).reference = Some(to);
        graph.link(from, to, EdgeKind::Ref);
    }

    fn set_keyword(graph: &mut SchemaGraph, on: NodeIndex, name: &str, keyword: Keyword) {
        graph.node_mut(on).keywords.insert(name.to_string(), keyword);
    }

    fn collect(graph: &SchemaGraph, root: NodeIndex, follow_refs: bool) -> Vec<String> {
        let mut seen = Vec::new();
        walk(graph, root, follow_refs, |_, node| {
            seen.push(node.location.anchor().to_string());
            Walk::Continue
        });
        seen
    }

    /// root: $ref -> b, allOf/anyOf/oneOf = [c, d, e], d and e also $ref -> b
    fn composed() -> (SchemaGraph, NodeIndex) {
        let mut graph = SchemaGraph::new();
        let root = add(&mut graph, "");
        let b = add(&mut graph, "/b");
        let c = add(&mut graph, "/c");
        let d = add(&mut graph, "/d");
        let e = add(&mut graph, "/e");
        set_ref(&mut graph, root, b);
        set_ref(&mut graph, d, b);
        set_ref(&mut graph, e, b);
        for name in ["allOf", "anyOf", "oneOf"] {
            set_keyword(&mut graph, root, name, Keyword::Schemas(vec![c, d, e]));
        }
        (graph, root)
    }

    #[test]
    fn test_walk_follows_refs() {
        let (graph, root) = composed();
        assert_eq!(collect(&graph, root, true), vec!["", "/b", "/c", "/d", "/e"]);
    }

    #[test]
    fn test_walk_without_refs() {
        let (graph, root) = composed();
        assert_eq!(collect(&graph, root, false), vec!["", "/c", "/d", "/e"]);
    }

    #[test]
    fn test_walk_mutual_recursion() {
        let mut graph = SchemaGraph::new();
        let a = add(&mut graph, "/a");
        let b = add(&mut graph, "/b");
        set_ref(&mut graph, a, b);
        set_ref(&mut graph, b, a);

        assert_eq!(collect(&graph, a, true), vec!["/a", "/b"]);
    }

    #[test]
    fn test_walk_self_reference() {
        let mut graph = SchemaGraph::new();
        let a = add(&mut graph, "");
        let child = add(&mut graph, "/properties/child");
        set_keyword(&mut graph, a, "properties", Keyword::SchemaMap(vec![("child".into(), child)]));
        set_ref(&mut graph, child, a);

        assert_eq!(collect(&graph, a, true), vec!["", "/properties/child"]);
    }

    #[test]
    fn test_walk_edge_order() {
        let mut graph = SchemaGraph::new();
        let root = add(&mut graph, "");
        let target = add(&mut graph, "/ref");
        let any = add(&mut graph, "/anyOf/0");
        let not = add(&mut graph, "/not");
        let prop = add(&mut graph, "/properties/p");
        let dep = add(&mut graph, "/dependentSchemas/d");
        let pat = add(&mut graph, "/patternProperties/x");
        let items = add(&mut graph, "/items");

        set_keyword(&mut graph, root, "items", Keyword::Schema(items));
        set_keyword(&mut graph, root, "patternProperties", Keyword::SchemaMap(vec![("x".into(), pat)]));
        set_keyword(&mut graph, root, "dependentSchemas", Keyword::SchemaMap(vec![("d".into(), dep)]));
        set_keyword(&mut graph, root, "properties", Keyword::SchemaMap(vec![("p".into(), prop)]));
        set_keyword(&mut graph, root, "not", Keyword::Schema(not));
        set_keyword(&mut graph, root, "anyOf", Keyword::Schemas(vec![any]));
        set_ref(&mut graph, root, target);

        assert_eq!(
            collect(&graph, root, true),
            vec![
                "",
                "/ref",
                "/anyOf/0",
                "/not",
                "/properties/p",
                "/dependentSchemas/d",
                "/patternProperties/x",
                "/items"
            ]
        );
    }

    #[test]
    fn test_skip_children_prunes_only_that_branch() {
        let mut graph = SchemaGraph::new();
        let root = add(&mut graph, "");
        let a = add(&mut graph, "/properties/a");
        let a_child = add(&mut graph, "/properties/a/items");
        let b = add(&mut graph, "/properties/b");
        set_keyword(&mut graph, root, "properties", Keyword::SchemaMap(vec![("a".into(), a), ("b".into(), b)]));
        set_keyword(&mut graph, a, "items", Keyword::Schema(a_child));

        let mut seen = Vec::new();
        walk(&graph, root, true, |idx, node| {
            seen.push(node.location.anchor().to_string());
            if idx == a {
                Walk::SkipChildren
            } else {
                Walk::Continue
            }
        });

        assert_eq!(seen, vec!["", "/properties/a", "/properties/b"]);
    }

    #[test]
    fn test_find_type_ofs() {
        let (graph, root) = composed();
        assert_eq!(find_type_ofs(&graph, root), vec![root]);
    }
}
