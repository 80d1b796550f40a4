//! Schema compilation
//!
//! Raw documents are registered under a URL (their `$id`, or their file
//! path) and compiled into nodes of the [`SchemaGraph`]. A node is created
//! for every sub-schema position reached from a compiled root, through
//! structural keywords or through `$ref`. Nodes are registered by location
//! before their children are built, so reference cycles terminate.
//!
//! `definitions` / `$defs` are not built eagerly: a definition only becomes
//! a node when something references it. A sub-schema carrying its own `$id`
//! is reachable under that URL but keeps its location in the enclosing
//! document.

use std::collections::{BTreeMap, HashMap};
use std::path::{Component, Path, PathBuf};

use serde_json::{Map, Value};
use url::Url;

use super::{EdgeKind, Keyword, Location, NodeIndex, SchemaGraph, SchemaNode};
use crate::error::{DocsError, Result};
use crate::naming::percent_decode;

/// Keywords holding a single sub-schema
const SCHEMA_KEYWORDS: &[&str] = &[
    "not",
    "if",
    "then",
    "else",
    "contains",
    "propertyNames",
    "unevaluatedItems",
    "unevaluatedProperties",
    "additionalProperties",
    "additionalItems",
];

/// Keywords holding a list of sub-schemas
const SCHEMA_LIST_KEYWORDS: &[&str] = &["allOf", "anyOf", "oneOf", "prefixItems"];

/// Keywords holding named sub-schemas
const SCHEMA_MAP_KEYWORDS: &[&str] = &["properties", "patternProperties", "dependentSchemas"];

/// Keywords consumed while building, never stored as [`Keyword`]s
const SKIPPED_KEYWORDS: &[&str] = &[
    "$id",
    "$schema",
    "$anchor",
    "$dynamicAnchor",
    "$recursiveAnchor",
    "$vocabulary",
    "definitions",
    "$defs",
    "title",
    "description",
];

/// A registered raw document
#[derive(Debug)]
struct Resource {
    url: String,
    source: PathBuf,
    document: Value,
    /// Plain-name anchor -> JSON pointer
    anchors: HashMap<String, String>,
    /// JSON pointer of each embedded `$id` -> the base URL it sets
    scopes: Vec<(String, String)>,
}

impl Resource {
    /// Base URL in effect at `pointer`: the innermost enclosing `$id`
    fn base_at(&self, pointer: &str) -> &str {
        self.scopes
            .iter()
            .filter(|(at, _)| {
                pointer
                    .strip_prefix(at.as_str())
                    .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
            })
            .max_by_key(|(at, _)| at.len())
            .map(|(_, base)| base.as_str())
            .unwrap_or(self.url.as_str())
    }
}

/// Registered documents and every name they can be reached by
#[derive(Debug, Default)]
struct Registry {
    resources: HashMap<String, Resource>,
    /// Normalized source path -> registered URL
    aliases: HashMap<String, String>,
    /// Embedded `$id` URL -> (registered URL, JSON pointer)
    embedded: HashMap<String, (String, String)>,
}

impl Registry {
    /// Document and pointer a URL or source path refers to
    fn locate(&self, url: &str) -> Option<(&Resource, String)> {
        if let Some(resource) = self.resources.get(url) {
            return Some((resource, String::new()));
        }
        if let Some(key) = self.aliases.get(url) {
            return self.resources.get(key).map(|r| (r, String::new()));
        }
        let (key, pointer) = self.embedded.get(url)?;
        self.resources.get(key).map(|r| (r, pointer.clone()))
    }
}

/// Builds the schema graph from registered documents
#[derive(Debug, Default)]
pub struct Compiler {
    registry: Registry,
    graph: SchemaGraph,
}

impl Compiler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a raw document under `url`, read from `source`
    pub fn add_resource(&mut self, url: &str, source: impl Into<PathBuf>, document: Value) {
        let url = normalize_url(url);
        let source = source.into();

        let mut anchors = HashMap::new();
        let mut scopes = Vec::new();
        collect_anchors(&document, &url, "", &mut anchors, &mut scopes);

        for (pointer, base) in &scopes {
            tracing::debug!("embedded resource {} at {}#{}", base, url, pointer);
            self.registry
                .embedded
                .insert(base.clone(), (url.clone(), pointer.clone()));
        }
        self.registry
            .aliases
            .insert(normalize_url(&source.to_string_lossy()), url.clone());
        self.registry.resources.insert(
            url.clone(),
            Resource {
                url,
                source,
                document,
                anchors,
                scopes,
            },
        );
    }

    /// Compile a registered document (by URL or source path) into its root node
    pub fn compile(&mut self, url: &str) -> Result<NodeIndex> {
        let (resource, pointer) = self.registry.locate(&normalize_url(url)).ok_or_else(|| {
            DocsError::Compile {
                url: url.to_string(),
                reason: "resource not registered".to_string(),
            }
        })?;
        check_draft(resource)?;

        let mut builder = Builder {
            registry: &self.registry,
            graph: &mut self.graph,
        };
        builder.node_at(resource, &pointer)
    }

    pub fn graph(&self) -> &SchemaGraph {
        &self.graph
    }

    pub fn into_graph(self) -> SchemaGraph {
        self.graph
    }
}

/// Reject documents that are not valid against their draft's meta-schema
fn check_draft(resource: &Resource) -> Result<()> {
    jsonschema::JSONSchema::compile(&resource.document)
        .map(|_| ())
        .map_err(|e| DocsError::Compile {
            url: resource.url.clone(),
            reason: e.to_string(),
        })
}

struct Builder<'a> {
    registry: &'a Registry,
    graph: &'a mut SchemaGraph,
}

impl<'a> Builder<'a> {
    /// Node for the value at `pointer` in `resource`
    fn node_at(&mut self, resource: &'a Resource, pointer: &str) -> Result<NodeIndex> {
        let location = Location::new(&resource.url, pointer);
        if let Some(idx) = self.graph.find(location.as_str()) {
            return Ok(idx);
        }

        let value = resource
            .document
            .pointer(pointer)
            .ok_or_else(|| DocsError::UnresolvedRef {
                reference: location.to_string(),
                from: resource.url.clone(),
            })?;
        self.build(resource, location, pointer, value)
    }

    fn child(&mut self, resource: &'a Resource, pointer: String, value: &'a Value) -> Result<NodeIndex> {
        let location = Location::new(&resource.url, &pointer);
        if let Some(idx) = self.graph.find(location.as_str()) {
            return Ok(idx);
        }
        self.build(resource, location, &pointer, value)
    }

    fn build(
        &mut self,
        resource: &'a Resource,
        location: Location,
        pointer: &str,
        value: &'a Value,
    ) -> Result<NodeIndex> {
        let idx = self.graph.add(SchemaNode::new(location, resource.source.clone()));

        let obj = match value {
            Value::Object(obj) => obj,
            Value::Bool(b) => {
                self.graph.node_mut(idx).boolean = Some(*b);
                return Ok(idx);
            }
            other => {
                return Err(DocsError::Compile {
                    url: resource.url.clone(),
                    reason: format!("expected a schema at #{}, found {}", pointer, other),
                })
            }
        };

        let mut keywords = BTreeMap::new();
        let mut reference = None;
        let mut dynamic_reference = None;

        for (key, v) in obj {
            let at = format!("{}/{}", pointer, escape_pointer(key));
            match (key.as_str(), v) {
                ("$ref", Value::String(r)) => {
                    let target = self.resolve(resource, pointer, r)?;
                    self.graph.link(idx, target, EdgeKind::Ref);
                    reference = Some(target);
                }
                ("$dynamicRef" | "$recursiveRef", Value::String(r)) => {
                    let target = self.resolve(resource, pointer, r)?;
                    self.graph.link(idx, target, EdgeKind::DynamicRef);
                    dynamic_reference = Some(target);
                }
                (k, _) if SKIPPED_KEYWORDS.contains(&k) => {}
                (k, Value::Object(_)) if k == "items" || SCHEMA_KEYWORDS.contains(&k) => {
                    let c = self.child(resource, at, v)?;
                    self.graph.link(idx, c, EdgeKind::Keyword);
                    keywords.insert(key.clone(), Keyword::Schema(c));
                }
                (k, Value::Array(items)) if k == "items" || SCHEMA_LIST_KEYWORDS.contains(&k) => {
                    let list = self.schema_list(idx, resource, &at, items)?;
                    keywords.insert(key.clone(), Keyword::Schemas(list));
                }
                (k, Value::Object(members)) if SCHEMA_MAP_KEYWORDS.contains(&k) => {
                    let map = self.schema_map(idx, resource, &at, members)?;
                    keywords.insert(key.clone(), Keyword::SchemaMap(map));
                }
                (_, Value::Array(items)) => {
                    keywords.insert(key.clone(), Keyword::List(items.clone()));
                }
                (_, other) => {
                    keywords.insert(key.clone(), Keyword::Literal(other.clone()));
                }
            }
        }

        let node = self.graph.node_mut(idx);
        node.title = obj.get("title").and_then(Value::as_str).map(String::from);
        node.description = obj.get("description").and_then(Value::as_str).map(String::from);
        node.reference = reference;
        node.dynamic_reference = dynamic_reference;
        node.keywords = keywords;

        Ok(idx)
    }

    fn schema_list(
        &mut self,
        parent: NodeIndex,
        resource: &'a Resource,
        at: &str,
        items: &'a [Value],
    ) -> Result<Vec<NodeIndex>> {
        let mut list = Vec::with_capacity(items.len());
        for (i, item) in items.iter().enumerate() {
            let c = self.child(resource, format!("{}/{}", at, i), item)?;
            self.graph.link(parent, c, EdgeKind::Keyword);
            list.push(c);
        }
        Ok(list)
    }

    fn schema_map(
        &mut self,
        parent: NodeIndex,
        resource: &'a Resource,
        at: &str,
        members: &'a Map<String, Value>,
    ) -> Result<Vec<(String, NodeIndex)>> {
        let mut map = Vec::with_capacity(members.len());
        for (name, member) in members {
            let c = self.child(resource, format!("{}/{}", at, escape_pointer(name)), member)?;
            self.graph.link(parent, c, EdgeKind::Keyword);
            map.push((name.clone(), c));
        }
        Ok(map)
    }

    /// Resolve a reference found at `pointer` in `resource`
    ///
    /// Relative references resolve against the innermost `$id` enclosing
    /// `pointer`, falling back to the document's source path.
    fn resolve(&mut self, resource: &'a Resource, pointer: &str, reference: &str) -> Result<NodeIndex> {
        let unresolved = || DocsError::UnresolvedRef {
            reference: reference.to_string(),
            from: resource.url.clone(),
        };

        let registry = self.registry;
        let base = resource.base_at(pointer);
        let (path, fragment) = reference.split_once('#').unwrap_or((reference, ""));
        let (target, base_pointer) = if path.is_empty() {
            registry.locate(base).unwrap_or((resource, String::new()))
        } else {
            let source = normalize_url(&resource.source.to_string_lossy());
            join_url(base, path)
                .and_then(|url| registry.locate(&url))
                .or_else(|| join_url(&source, path).and_then(|url| registry.locate(&url)))
                .ok_or_else(unresolved)?
        };

        let fragment = percent_decode(fragment);
        let pointer = if fragment.is_empty() || fragment.starts_with('/') {
            format!("{}{}", base_pointer, fragment)
        } else {
            target.anchors.get(&fragment).cloned().ok_or_else(unresolved)?
        };

        self.node_at(target, &pointer)
    }
}

/// Record plain-name anchors (`$anchor`, `$dynamicAnchor`, `"$id": "#name"`)
/// and the base URL of every embedded `$id` below the document root
fn collect_anchors(
    value: &Value,
    base: &str,
    pointer: &str,
    anchors: &mut HashMap<String, String>,
    scopes: &mut Vec<(String, String)>,
) {
    match value {
        Value::Object(obj) => {
            let mut base = base.to_string();
            for key in ["$anchor", "$dynamicAnchor"] {
                if let Some(name) = obj.get(key).and_then(Value::as_str) {
                    anchors.insert(name.to_string(), pointer.to_string());
                }
            }
            if let Some(id) = obj.get("$id").and_then(Value::as_str) {
                let (id, name) = id.split_once('#').unwrap_or((id, ""));
                if !name.is_empty() && !name.starts_with('/') {
                    anchors.insert(name.to_string(), pointer.to_string());
                }
                if !id.is_empty() && !pointer.is_empty() {
                    if let Some(url) = join_url(&base, id) {
                        scopes.push((pointer.to_string(), url.clone()));
                        base = url;
                    }
                }
            }
            for (key, child) in obj {
                let at = format!("{}/{}", pointer, escape_pointer(key));
                collect_anchors(child, &base, &at, anchors, scopes);
            }
        }
        Value::Array(items) => {
            for (i, child) in items.iter().enumerate() {
                collect_anchors(child, base, &format!("{}/{}", pointer, i), anchors, scopes);
            }
        }
        _ => {}
    }
}

/// Escape a key for use as a JSON pointer segment
fn escape_pointer(key: &str) -> String {
    key.replace('~', "~0").replace('/', "~1")
}

/// An absolute URL; single-letter schemes are drive letters, not URLs
fn parse_absolute(s: &str) -> Option<Url> {
    Url::parse(s).ok().filter(|url| url.scheme().len() > 1)
}

/// Canonical form of a registered URL or file path, without fragment
pub fn normalize_url(url: &str) -> String {
    match parse_absolute(url) {
        Some(mut parsed) => {
            parsed.set_fragment(None);
            parsed.into()
        }
        None => normalize_path(Path::new(url.split('#').next().unwrap_or(url))),
    }
}

/// Resolve `reference` against the document URL or file path `base`
///
/// `None` when `base` is a URL that cannot be joined onto, like a `urn:`.
pub fn join_url(base: &str, reference: &str) -> Option<String> {
    if let Some(absolute) = parse_absolute(reference) {
        return Some(normalize_url(absolute.as_str()));
    }

    if let Some(base) = parse_absolute(base) {
        let mut joined = base.join(reference).ok()?;
        joined.set_fragment(None);
        return Some(joined.into());
    }

    let reference = Path::new(reference);
    if reference.is_absolute() {
        return Some(normalize_path(reference));
    }
    let parent = Path::new(base).parent().unwrap_or(Path::new(""));
    Some(normalize_path(&parent.join(reference)))
}

fn normalize_path(path: &Path) -> String {
    let mut components: Vec<String> = Vec::new();
    let mut absolute = false;

    for component in path.components() {
        match component {
            Component::RootDir => absolute = true,
            Component::ParentDir => match components.last() {
                Some(last) if last != ".." => {
                    components.pop();
                }
                _ if absolute => {}
                _ => components.push("..".to_string()),
            },
            Component::Normal(s) => components.push(s.to_string_lossy().into_owned()),
            _ => {}
        }
    }

    let joined = components.join("/");
    if absolute {
        format!("/{}", joined)
    } else {
        joined
    }
}
