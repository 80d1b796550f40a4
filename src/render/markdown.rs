//! Markdown page emitter
//!
//! Emits one Hugo page per schema: front matter, a heading carrying the
//! page anchor, the description, then tables for properties, pattern
//! properties, items and the remaining keywords, and finally a section for
//! every composition found under the schema.

use serde_json::Value;

use super::{RenderContext, Renderer, PAGE_TEMPLATE};
use crate::error::{DocsError, Result};
use crate::graph::{Keyword, NodeIndex, SchemaNode};
use crate::index::FrontMatter;
use crate::naming;

/// Keywords rendered in their own section, never in the constraints table
const SECTION_KEYWORDS: &[&str] = &[
    "type",
    "required",
    "properties",
    "patternProperties",
    "items",
    "prefixItems",
    "allOf",
    "anyOf",
    "oneOf",
];

const COMPOSITIONS: &[(&str, &str)] = &[("allOf", "All of"), ("anyOf", "Any of"), ("oneOf", "One of")];

/// Built-in renderer producing Hugo-flavoured Markdown
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownRenderer;

impl Renderer for MarkdownRenderer {
    fn render(&self, template: &str, idx: NodeIndex, ctx: &RenderContext<'_>) -> Result<String> {
        if template != PAGE_TEMPLATE {
            return Err(DocsError::Render {
                location: ctx.node(idx).location.to_string(),
                reason: format!("unknown template {}", template),
            });
        }

        let mut output = String::new();
        let title = ctx.title(idx);
        let front_matter = FrontMatter {
            title: &title,
            weight: ctx.weight(idx),
        };
        output.push_str(&front_matter.render()?);

        emit_schema(&mut output, idx, ctx);
        Ok(output)
    }
}

// =============================================================================
// Page Sections
// =============================================================================

fn emit_schema(output: &mut String, idx: NodeIndex, ctx: &RenderContext<'_>) {
    let node = ctx.node(idx);

    output.push_str(&format!("\n## {} {{#{}}}\n\n", ctx.title(idx), ctx.file_name(idx)));

    if let Some(description) = &node.description {
        output.push_str(description.trim());
        output.push_str("\n\n");
    }

    match node.boolean {
        Some(true) => output.push_str("Any value is valid.\n\n"),
        Some(false) => output.push_str("No value is valid.\n\n"),
        None => {}
    }

    if let Some(target) = node.reference {
        output.push_str(&format!("**Reference:** {}\n\n", ctx.permalink(target)));
    }
    if let Some(target) = node.dynamic_reference {
        output.push_str(&format!("**Dynamic reference:** {}\n\n", ctx.permalink(target)));
    }
    if let Some(types) = type_label(node) {
        output.push_str(&format!("**Type:** {}\n\n", types));
    }

    emit_properties(output, node, ctx);
    emit_pattern_properties(output, node, ctx);
    emit_items(output, node, ctx);
    emit_constraints(output, node, ctx);
    emit_type_ofs(output, idx, ctx);
}

fn emit_properties(output: &mut String, node: &SchemaNode, ctx: &RenderContext<'_>) {
    let Some(Keyword::SchemaMap(members)) = node.keyword("properties") else {
        return;
    };
    if members.is_empty() {
        return;
    }

    let required: Vec<&str> = match node.keyword("required") {
        Some(Keyword::List(names)) => names.iter().filter_map(Value::as_str).collect(),
        _ => Vec::new(),
    };

    output.push_str("### Properties\n\n");
    output.push_str("| Property | Type | Required | Description |\n");
    output.push_str("| --- | --- | --- | --- |\n");
    for (name, child) in ctx.sorted_members(members) {
        output.push_str(&format!(
            "| <a id=\"{}\"></a>`{}` | {} | {} | {} |\n",
            ctx.ref_key(child),
            cell_text(&name),
            with_pattern(schema_cell(child, ctx), child, ctx),
            if required.contains(&name.as_str()) { "Yes" } else { "No" },
            description_cell(child, ctx),
        ));
    }
    output.push('\n');
}

fn emit_pattern_properties(output: &mut String, node: &SchemaNode, ctx: &RenderContext<'_>) {
    let Some(Keyword::SchemaMap(members)) = node.keyword("patternProperties") else {
        return;
    };
    if members.is_empty() {
        return;
    }

    output.push_str("### Pattern Properties\n\n");
    output.push_str("| Pattern | Type | Description |\n");
    output.push_str("| --- | --- | --- |\n");
    for (token, child) in ctx.sorted_members(members) {
        output.push_str(&format!(
            "| {} | {} | {} |\n",
            ctx.lookup_regex(&token),
            schema_cell(child, ctx),
            description_cell(child, ctx),
        ));
    }
    output.push('\n');
}

fn emit_items(output: &mut String, node: &SchemaNode, ctx: &RenderContext<'_>) {
    let mut tuple: Vec<NodeIndex> = Vec::new();

    match node.keyword("items") {
        Some(Keyword::Schema(child)) => {
            output.push_str(&format!("### Items\n\n{}\n\n", schema_cell(*child, ctx)));
        }
        Some(Keyword::Schemas(children)) => tuple.extend(children),
        _ => {}
    }
    if let Some(Keyword::Schemas(children)) = node.keyword("prefixItems") {
        tuple.extend(children);
    }

    if tuple.is_empty() {
        return;
    }
    output.push_str("### Tuple Items\n\n");
    for (i, child) in tuple.into_iter().enumerate() {
        output.push_str(&format!("{}. {}\n", i + 1, schema_cell(child, ctx)));
    }
    output.push('\n');
}

fn emit_constraints(output: &mut String, node: &SchemaNode, ctx: &RenderContext<'_>) {
    let mut rows = Vec::new();

    for (name, keyword) in &node.keywords {
        if SECTION_KEYWORDS.contains(&name.as_str()) {
            continue;
        }

        let value = match keyword {
            Keyword::Literal(Value::String(token)) if name == "pattern" => ctx.lookup_regex(token),
            Keyword::Literal(value) => format_value(value),
            Keyword::List(values) => values.iter().map(format_value).collect::<Vec<_>>().join(", "),
            Keyword::Schema(child) => schema_cell(*child, ctx),
            Keyword::Schemas(children) => children
                .iter()
                .map(|c| schema_cell(*c, ctx))
                .collect::<Vec<_>>()
                .join(", "),
            Keyword::SchemaMap(members) => ctx
                .sorted_members(members)
                .into_iter()
                .map(|(key, c)| format!("`{}`: {}", cell_text(&key), schema_cell(c, ctx)))
                .collect::<Vec<_>>()
                .join(", "),
        };
        rows.push(format!("| {} | {} |\n", name, value));
    }

    if rows.is_empty() {
        return;
    }
    output.push_str("### Constraints\n\n");
    output.push_str("| Keyword | Value |\n");
    output.push_str("| --- | --- |\n");
    for row in rows {
        output.push_str(&row);
    }
    output.push('\n');
}

fn emit_type_ofs(output: &mut String, idx: NodeIndex, ctx: &RenderContext<'_>) {
    let type_ofs = ctx.type_ofs(idx);
    if type_ofs.is_empty() {
        return;
    }

    output.push_str("### Type Of\n\n");
    for composed in type_ofs {
        let node = ctx.node(composed);
        let title = ctx.title(composed);
        output.push_str(&format!(
            "#### {} {{#type-of-{}}}\n\n",
            naming::title_case(&title),
            ctx.slugify(&title)
        ));

        for (keyword, label) in COMPOSITIONS {
            let Some(Keyword::Schemas(members)) = node.keyword(keyword) else {
                continue;
            };
            output.push_str(&format!("**{}:**\n\n", label));
            for member in members {
                output.push_str(&format!("- {}\n", schema_cell(*member, ctx)));
            }
            output.push('\n');
        }
    }
}

// =============================================================================
// Cells
// =============================================================================

/// `type` as inline code, alternatives separated for a table cell
fn type_label(node: &SchemaNode) -> Option<String> {
    match node.keyword("type")? {
        Keyword::Literal(Value::String(t)) => Some(format!("`{}`", t)),
        Keyword::List(types) => Some(
            types
                .iter()
                .filter_map(Value::as_str)
                .map(|t| format!("`{}`", t))
                .collect::<Vec<_>>()
                .join(" \\| "),
        ),
        _ => None,
    }
}

/// Short description of what a sub-schema accepts: a link, a type or a label
fn schema_cell(idx: NodeIndex, ctx: &RenderContext<'_>) -> String {
    let node = ctx.node(idx);

    if let Some(target) = node.reference.or(node.dynamic_reference) {
        return ctx.permalink(target);
    }
    match node.boolean {
        Some(true) => return "any".to_string(),
        Some(false) => return "none".to_string(),
        None => {}
    }
    if let Some(types) = type_label(node) {
        return types;
    }
    for (keyword, label) in COMPOSITIONS {
        if node.keyword(keyword).is_some() {
            return label.to_lowercase();
        }
    }
    if let Some(title) = &node.title {
        return cell_text(title);
    }
    "any".to_string()
}

/// Append the node's own `pattern`, recovered from its token
fn with_pattern(cell: String, idx: NodeIndex, ctx: &RenderContext<'_>) -> String {
    match ctx.node(idx).keyword("pattern") {
        Some(Keyword::Literal(Value::String(token))) => format!("{} matching {}", cell, ctx.lookup_regex(token)),
        _ => cell,
    }
}

fn description_cell(idx: NodeIndex, ctx: &RenderContext<'_>) -> String {
    let node = ctx.node(idx);
    let description = node
        .description
        .as_deref()
        .or_else(|| node.reference.and_then(|t| ctx.node(t).description.as_deref()))
        .unwrap_or("");
    cell_text(description.trim())
}

fn format_value(value: &Value) -> String {
    format!("`{}`", value.to_string().replace('|', "\\|"))
}

/// Make text safe inside a Markdown table cell
fn cell_text(text: &str) -> String {
    text.replace("\r\n", "<br>")
        .replace('\n', "<br>")
        .replace('|', "\\|")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Compiler;
    use crate::order::OrderIndex;
    use crate::patterns::PatternTable;
    use serde_json::json;

    fn render(mut document: Value) -> String {
        let mut patterns = PatternTable::new();
        patterns.rewrite(&mut document);

        let mut compiler = Compiler::new();
        compiler.add_resource("a.schema.json", "a.schema.json", document);
        let root = compiler.compile("a.schema.json").unwrap();
        let graph = compiler.into_graph();
        let order = OrderIndex::new();

        let ctx = RenderContext {
            graph: &graph,
            patterns: &patterns,
            order: &order,
            reference_url: "reference",
        };
        MarkdownRenderer.render(PAGE_TEMPLATE, root, &ctx).unwrap()
    }

    #[test]
    fn test_render_page() {
        let page = render(json!({
            "title": "Root",
            "description": "The root schema",
            "type": "object",
            "required": ["x"],
            "properties": {
                "x": { "$ref": "#/definitions/y", "description": "An x" },
                "n": { "type": ["integer", "null"], "minimum": 1 }
            },
            "definitions": { "y": { "title": "Y" } }
        }));

        assert!(page.starts_with("---\ntitle: Root\n---\n"));
        assert!(page.contains("## Root {#root}"));
        assert!(page.contains("The root schema"));
        assert!(page.contains("**Type:** `object`"));
        assert!(page.contains("`x` | [Y]({{<baseurl>}}/reference/a-schema/definitions/#y) | Yes | An x |"));
        assert!(page.contains("`n` | `integer` \\| `null` | No |"));
        let n_row = page.find("`n`").unwrap();
        let x_row = page.find("`x`").unwrap();
        assert!(n_row < x_row);
    }

    #[test]
    fn test_render_recovers_patterns() {
        let page = render(json!({
            "type": "object",
            "properties": { "code": { "type": "string", "pattern": "^(a|b)$" } },
            "patternProperties": { "^x-": { "type": "string" } },
            "pattern": "^(?!bad)"
        }));

        assert!(page.contains("| pattern | `^(?!bad)` |"));
        assert!(page.contains("| `^x-` | `string` |"));
    }

    #[test]
    fn test_render_type_ofs_and_items() {
        let page = render(json!({
            "title": "Shape",
            "oneOf": [{ "title": "Circle" }, { "type": "null" }],
            "items": { "type": "number" },
            "additionalProperties": false
        }));

        assert!(page.contains("### Type Of\n\n#### Shape {#type-of-shape}"));
        assert!(page.contains("**One of:**\n\n- Circle\n- `null`\n"));
        assert!(page.contains("### Items\n\n`number`"));
        assert!(page.contains("| additionalProperties | `false` |"));
    }

    #[test]
    fn test_unknown_template() {
        let mut compiler = Compiler::new();
        compiler.add_resource("a.json", "a.json", json!({}));
        let root = compiler.compile("a.json").unwrap();
        let graph = compiler.into_graph();
        let patterns = PatternTable::new();
        let order = OrderIndex::new();
        let ctx = RenderContext {
            graph: &graph,
            patterns: &patterns,
            order: &order,
            reference_url: "reference",
        };

        let err = MarkdownRenderer.render("missing", root, &ctx).unwrap_err();
        assert!(matches!(err, DocsError::Render { .. }));
    }

    #[test]
    fn test_cell_text() {
        assert_eq!(cell_text("a|b\nc"), "a\\|b<br>c");
    }
}
