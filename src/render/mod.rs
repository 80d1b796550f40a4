//! Page rendering
//!
//! A [`Renderer`] turns one schema node into the text of one page. It gets
//! a [`RenderContext`] holding everything a page needs from the run: the
//! compiled graph, the pattern table, source key order and the site's
//! reference URL. Naming and linking go through the same functions the
//! converter uses to place pages, so links always resolve.

mod markdown;

pub use markdown::MarkdownRenderer;

use std::path::PathBuf;

use crate::error::Result;
use crate::graph::{find_type_ofs, NodeIndex, SchemaGraph, SchemaNode};
use crate::naming;
use crate::order::OrderIndex;
use crate::patterns::{self, PatternTable};

/// Name of the template every page is rendered with
pub const PAGE_TEMPLATE: &str = "page";

/// Renders a schema node into page content
pub trait Renderer {
    fn render(&self, template: &str, node: NodeIndex, ctx: &RenderContext<'_>) -> Result<String>;
}

/// Lookup functions available while rendering
pub struct RenderContext<'a> {
    pub graph: &'a SchemaGraph,
    pub patterns: &'a PatternTable,
    pub order: &'a OrderIndex,
    pub reference_url: &'a str,
}

impl<'a> RenderContext<'a> {
    pub fn node(&self, idx: NodeIndex) -> &'a SchemaNode {
        &self.graph[idx]
    }

    pub fn slugify(&self, s: &str) -> String {
        naming::slugify(s)
    }

    /// Display title: the schema title, else a label derived from its location
    pub fn title(&self, idx: NodeIndex) -> String {
        let node = self.node(idx);
        let fallback = naming::humanize(node.location.as_str());
        naming::first_non_empty(&[node.title(), fallback.as_str()]).to_string()
    }

    pub fn file_name(&self, idx: NodeIndex) -> String {
        let node = self.node(idx);
        naming::file_name(node.title(), node.location.as_str())
    }

    pub fn file_path(&self, idx: NodeIndex) -> PathBuf {
        naming::file_path(self.node(idx).location.as_str())
    }

    /// Original regex for a token, escaped for a table cell
    pub fn lookup_regex(&self, token: &str) -> String {
        self.patterns.lookup_regex(token)
    }

    /// 1-based position of the node in its source file, when recorded
    pub fn weight(&self, idx: NodeIndex) -> Option<usize> {
        let node = self.node(idx);
        let location = self.patterns.restore_location(node.location.as_str());
        self.order.weight(&node.source, &location)
    }

    /// Markdown link to the page a node is rendered on
    pub fn permalink(&self, idx: NodeIndex) -> String {
        let path = self
            .file_path(idx)
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join("/");
        format!(
            "[{}]({{{{<baseurl>}}}}/{}/{}/#{})",
            self.title(idx),
            self.reference_url,
            path,
            self.file_name(idx)
        )
    }

    /// Stable anchor id for a node
    pub fn ref_key(&self, idx: NodeIndex) -> String {
        patterns::ref_key(self.node(idx).location.as_str())
    }

    /// Composition nodes reachable from `idx` without following references
    pub fn type_ofs(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        find_type_ofs(self.graph, idx)
    }

    /// Named sub-schemas of a map keyword, in source order when recorded,
    /// else by name as written (regexes for `patternProperties`)
    pub fn sorted_members(&self, members: &[(String, NodeIndex)]) -> Vec<(String, NodeIndex)> {
        let mut sorted = members.to_vec();
        sorted.sort_by(|(a_name, a), (b_name, b)| {
            let a_weight = self.weight(*a).unwrap_or(usize::MAX);
            let b_weight = self.weight(*b).unwrap_or(usize::MAX);
            a_weight.cmp(&b_weight).then_with(|| {
                self.patterns
                    .member_name(a_name)
                    .cmp(self.patterns.member_name(b_name))
            })
        });
        sorted
    }
}
