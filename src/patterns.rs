//! Regular expression rewriting
//!
//! Schema regex dialects accept constructs (lookaround, backreferences) the
//! compiler's regex engine rejects, and pages should show the pattern as the
//! author wrote it. Before compilation every `pattern` string and every
//! `patternProperties` key is swapped for a SHA256 hex token; the
//! [`PatternTable`] maps tokens back to the original text for rendering.

use std::collections::HashMap;

use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

/// Keywords whose value is a map of property name to sub-schema
const SCHEMA_MAP_KEYWORDS: &[&str] = &[
    "properties",
    "definitions",
    "$defs",
    "dependentSchemas",
];

/// SHA256 hex digest of a string
pub fn digest(content: &str) -> String {
    format!("{:x}", Sha256::digest(content.as_bytes()))
}

/// Short stable key for a location, used as an HTML anchor id
pub fn ref_key(location: &str) -> String {
    digest(location)[..10].to_string()
}

/// Escape a regex for display inside a Markdown table cell
pub fn escape_regex(pattern: &str) -> String {
    format!("`{}`", pattern.replace('|', "\\|"))
}

/// Token -> original regex, filled while rewriting raw schemas
#[derive(Debug, Clone, Default)]
pub struct PatternTable {
    patterns: HashMap<String, String>,
}

impl PatternTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a pattern and return its token
    pub fn insert(&mut self, pattern: &str) -> String {
        let token = digest(pattern);
        self.patterns
            .entry(token.clone())
            .or_insert_with(|| pattern.to_string());
        token
    }

    /// Original pattern for a token
    pub fn get(&self, token: &str) -> Option<&str> {
        self.patterns.get(token).map(String::as_str)
    }

    /// Escaped original pattern, or an empty string for unknown tokens
    pub fn lookup_regex(&self, token: &str) -> String {
        match self.get(token) {
            Some(pattern) => escape_regex(pattern),
            None => {
                tracing::warn!("no pattern recorded for token {}", token);
                String::new()
            }
        }
    }

    /// Original regex behind a `patternProperties` member name, else the name
    pub fn member_name<'a>(&'a self, name: &'a str) -> &'a str {
        self.get(name).unwrap_or(name)
    }

    /// Location with `patternProperties` tokens swapped back for their regex
    ///
    /// Restored segments are pointer-escaped, so the result addresses the
    /// same value in the source file as written.
    pub fn restore_location(&self, location: &str) -> String {
        let (document, anchor) = location.split_once('#').unwrap_or((location, ""));
        let mut in_pattern_properties = false;
        let segments: Vec<String> = anchor
            .split('/')
            .map(|segment| {
                let restored = match self.get(segment) {
                    Some(pattern) if in_pattern_properties => {
                        pattern.replace('~', "~0").replace('/', "~1")
                    }
                    _ => segment.to_string(),
                };
                in_pattern_properties = segment == "patternProperties";
                restored
            })
            .collect();
        format!("{}#{}", document, segments.join("/"))
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Rewrite every regex in a raw schema document, in place
    pub fn rewrite(&mut self, schema: &mut Value) {
        match schema {
            Value::Object(obj) => self.rewrite_schema(obj),
            Value::Array(items) => {
                for item in items {
                    self.rewrite(item);
                }
            }
            _ => {}
        }
    }

    fn rewrite_schema(&mut self, obj: &mut Map<String, Value>) {
        if let Some(Value::String(pattern)) = obj.get_mut("pattern") {
            *pattern = self.insert(pattern);
        }

        if let Some(Value::Object(props)) = obj.get_mut("patternProperties") {
            let original = std::mem::take(props);
            for (pattern, mut sub) in original {
                self.rewrite(&mut sub);
                props.insert(self.insert(&pattern), sub);
            }
        }

        for (key, value) in obj.iter_mut() {
            match (key.as_str(), value) {
                ("pattern" | "patternProperties", _) => {}
                (key, Value::Object(members)) if SCHEMA_MAP_KEYWORDS.contains(&key) => {
                    for sub in members.values_mut() {
                        self.rewrite(sub);
                    }
                }
                (_, value) => self.rewrite(value),
            }
        }
    }
}
