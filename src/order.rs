//! Source key order
//!
//! `serde_json::Value` sorts object keys, so pages list properties
//! alphabetically by default. When source order is requested every file is
//! decoded a second time into a [`KeyOrder`] tree that keeps keys in the
//! order they were written, and [`OrderIndex::weight`] turns an anchor into
//! the 1-based position of its last segment among its siblings.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::de::{self, Deserialize, Deserializer, MapAccess, SeqAccess, Visitor};

use crate::naming::anchor_path;

/// Key order of a decoded JSON value
#[derive(Debug, Clone, PartialEq, Default)]
pub enum KeyOrder {
    /// Object keys in source order
    Object(Vec<(String, KeyOrder)>),
    Array(Vec<KeyOrder>),
    /// Scalars carry no order
    #[default]
    Leaf,
}

impl KeyOrder {
    /// Parse raw JSON keeping object key order
    pub fn from_slice(bytes: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(bytes)
    }

    fn child(&self, segment: &str) -> Option<&KeyOrder> {
        match self {
            KeyOrder::Object(entries) => entries.iter().find(|(k, _)| k == segment).map(|(_, v)| v),
            KeyOrder::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            KeyOrder::Leaf => None,
        }
    }

    fn position(&self, segment: &str) -> Option<usize> {
        match self {
            KeyOrder::Object(entries) => entries.iter().position(|(k, _)| k == segment).map(|i| i + 1),
            KeyOrder::Array(items) => segment
                .parse::<usize>()
                .ok()
                .filter(|i| *i < items.len())
                .map(|i| i + 1),
            KeyOrder::Leaf => None,
        }
    }
}

impl<'de> Deserialize<'de> for KeyOrder {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct KeyOrderVisitor;

        impl<'de> Visitor<'de> for KeyOrderVisitor {
            type Value = KeyOrder;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("any JSON value")
            }

            fn visit_map<M>(self, mut map: M) -> Result<KeyOrder, M::Error>
            where
                M: MapAccess<'de>,
            {
                let mut entries = Vec::new();
                while let Some((key, value)) = map.next_entry::<String, KeyOrder>()? {
                    entries.push((key, value));
                }
                Ok(KeyOrder::Object(entries))
            }

            fn visit_seq<S>(self, mut seq: S) -> Result<KeyOrder, S::Error>
            where
                S: SeqAccess<'de>,
            {
                let mut items = Vec::new();
                while let Some(item) = seq.next_element::<KeyOrder>()? {
                    items.push(item);
                }
                Ok(KeyOrder::Array(items))
            }

            fn visit_bool<E: de::Error>(self, _: bool) -> Result<KeyOrder, E> {
                Ok(KeyOrder::Leaf)
            }

            fn visit_i64<E: de::Error>(self, _: i64) -> Result<KeyOrder, E> {
                Ok(KeyOrder::Leaf)
            }

            fn visit_u64<E: de::Error>(self, _: u64) -> Result<KeyOrder, E> {
                Ok(KeyOrder::Leaf)
            }

            fn visit_f64<E: de::Error>(self, _: f64) -> Result<KeyOrder, E> {
                Ok(KeyOrder::Leaf)
            }

            fn visit_str<E: de::Error>(self, _: &str) -> Result<KeyOrder, E> {
                Ok(KeyOrder::Leaf)
            }

            fn visit_unit<E: de::Error>(self) -> Result<KeyOrder, E> {
                Ok(KeyOrder::Leaf)
            }
        }

        deserializer.deserialize_any(KeyOrderVisitor)
    }
}

/// Per-file key order, keyed by source path
#[derive(Debug, Clone, Default)]
pub struct OrderIndex {
    files: HashMap<PathBuf, KeyOrder>,
}

impl OrderIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<PathBuf>, order: KeyOrder) {
        self.files.insert(path.into(), order);
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Position of the anchor's last segment among its siblings
    ///
    /// `None` when the file has no recorded order or any segment of the
    /// anchor is missing from it.
    pub fn weight(&self, path: &Path, location: &str) -> Option<usize> {
        let mut order = self.files.get(path)?;

        let anchor = anchor_path(location);
        let anchor = anchor.strip_prefix('/').unwrap_or(anchor);
        let segments: Vec<String> = anchor.split('/').map(unescape_pointer).collect();

        let (last, parents) = segments.split_last()?;
        for segment in parents {
            order = order.child(segment)?;
        }
        order.position(last)
    }
}

/// Undo JSON pointer escaping: `~1` -> `/`, `~0` -> `~`
fn unescape_pointer(segment: &str) -> String {
    segment.replace("~1", "/").replace("~0", "~")
}
