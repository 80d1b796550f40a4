//! Compiled Schema Graph
//!
//! Every sub-schema of every compiled document is a node in a petgraph
//! `DiGraph`, addressed by its [`Location`]. Structural children and
//! reference targets are stored on the node as [`NodeIndex`] slots; the
//! same relations are mirrored as graph edges so cycle analysis can run on
//! the petgraph structure.
//!
//! The graph is built once per run by the [`compiler::Compiler`] and is
//! read-only afterwards.

pub mod analysis;
pub mod compiler;
pub mod definitions;
pub mod walk;

pub use analysis::reference_cycles;
pub use compiler::Compiler;
pub use definitions::{definitions, Definition, RefKind};
pub use walk::{find_type_ofs, walk, Walk};

use petgraph::graph::DiGraph;
pub use petgraph::graph::NodeIndex;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::ops::Index;
use std::path::{Path, PathBuf};

use crate::naming::{anchor_path, trim_anchor};

/// Stable identifier of a schema node: `<document>#<json-pointer>`
///
/// Two nodes with the same location are the same node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Location(String);

impl Location {
    /// Location of the value at `pointer` inside the document at `url`
    pub fn new(url: &str, pointer: &str) -> Self {
        Self(format!("{}#{}", url, pointer))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Document part, before the `#`
    pub fn document(&self) -> &str {
        trim_anchor(&self.0)
    }

    /// Pointer part, after the `#`
    pub fn anchor(&self) -> &str {
        anchor_path(&self.0)
    }

    pub fn is_root(&self) -> bool {
        self.anchor().is_empty()
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Location {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A keyword value, classified once while the graph is built
#[derive(Debug, Clone, PartialEq)]
pub enum Keyword {
    /// Any non-schema JSON value that is not an array (`type`, `minimum`, ...)
    Literal(Value),
    /// An array of non-schema values (`enum`, `required`, `type: [..]`)
    List(Vec<Value>),
    /// A single sub-schema (`not`, `contains`, object `items`, ...)
    Schema(NodeIndex),
    /// A list of sub-schemas (`allOf`, `prefixItems`, tuple `items`, ...)
    Schemas(Vec<NodeIndex>),
    /// Named sub-schemas (`properties`, `patternProperties`, ...)
    SchemaMap(Vec<(String, NodeIndex)>),
}

impl Keyword {
    /// Sub-schemas held by this keyword, in declaration order
    pub fn schemas(&self) -> Vec<NodeIndex> {
        match self {
            Keyword::Literal(_) | Keyword::List(_) => Vec::new(),
            Keyword::Schema(idx) => vec![*idx],
            Keyword::Schemas(list) => list.clone(),
            Keyword::SchemaMap(entries) => entries.iter().map(|(_, idx)| *idx).collect(),
        }
    }
}

/// Structural relation between two nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeKind {
    /// `$ref`
    Ref,
    /// `$dynamicRef` / `$recursiveRef`
    DynamicRef,
    /// Any sub-schema keyword
    Keyword,
}

/// A compiled schema
#[derive(Debug, Clone)]
pub struct SchemaNode {
    pub location: Location,
    /// Source file the node was decoded from
    pub source: PathBuf,
    pub title: Option<String>,
    pub description: Option<String>,
    /// Boolean schema (`true` / `false`)
    pub boolean: Option<bool>,
    /// `$ref` target
    pub reference: Option<NodeIndex>,
    /// `$dynamicRef` / `$recursiveRef` target, resolved statically
    pub dynamic_reference: Option<NodeIndex>,
    pub keywords: BTreeMap<String, Keyword>,
}

impl SchemaNode {
    pub fn new(location: Location, source: impl Into<PathBuf>) -> Self {
        Self {
            location,
            source: source.into(),
            title: None,
            description: None,
            boolean: None,
            reference: None,
            dynamic_reference: None,
            keywords: BTreeMap::new(),
        }
    }

    pub fn title(&self) -> &str {
        self.title.as_deref().unwrap_or("")
    }

    pub fn keyword(&self, name: &str) -> Option<&Keyword> {
        self.keywords.get(name)
    }

    /// Whether the node carries `allOf`, `anyOf` or `oneOf`
    pub fn is_composition(&self) -> bool {
        ["allOf", "anyOf", "oneOf"]
            .iter()
            .any(|k| self.keywords.contains_key(*k))
    }
}

/// The compiled schema graph
#[derive(Debug, Default)]
pub struct SchemaGraph {
    pub(crate) graph: DiGraph<SchemaNode, EdgeKind>,
    pub(crate) by_location: HashMap<String, NodeIndex>,
}

impl SchemaGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node, indexed by its location
    pub(crate) fn add(&mut self, node: SchemaNode) -> NodeIndex {
        let key = node.location.as_str().to_string();
        let idx = self.graph.add_node(node);
        self.by_location.insert(key, idx);
        idx
    }

    pub(crate) fn node_mut(&mut self, idx: NodeIndex) -> &mut SchemaNode {
        &mut self.graph[idx]
    }

    pub(crate) fn link(&mut self, from: NodeIndex, to: NodeIndex, kind: EdgeKind) {
        self.graph.add_edge(from, to, kind);
    }

    pub fn node(&self, idx: NodeIndex) -> &SchemaNode {
        &self.graph[idx]
    }

    /// Node at a location
    pub fn find(&self, location: &str) -> Option<NodeIndex> {
        self.by_location.get(location).copied()
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Source file of the document a node belongs to
    pub fn source(&self, idx: NodeIndex) -> &Path {
        &self.graph[idx].source
    }
}

impl Index<NodeIndex> for SchemaGraph {
    type Output = SchemaNode;

    fn index(&self, idx: NodeIndex) -> &SchemaNode {
        &self.graph[idx]
    }
}
