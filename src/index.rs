//! Section index files
//!
//! Hugo only lists a directory as a section when it holds an `_index.md`.
//! Every directory a page is written to gets one, as does every ancestor up
//! to (not including) the destination root.

use std::path::{Component, Path, PathBuf};

use serde::Serialize;

use crate::error::{DocsError, Result};
use crate::storage::Storage;

/// File name of a section index, without extension
pub const INDEX_NAME: &str = "_index";

/// YAML front matter of a generated page
#[derive(Debug, Serialize)]
pub struct FrontMatter<'a> {
    pub title: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<usize>,
}

impl<'a> FrontMatter<'a> {
    pub fn titled(title: &'a str) -> Self {
        Self { title, weight: None }
    }

    /// Front matter block, delimiters included
    pub fn render(&self) -> Result<String> {
        let yaml = serde_yaml::to_string(self).map_err(|e| DocsError::Render {
            location: self.title.to_string(),
            reason: e.to_string(),
        })?;
        Ok(format!("---\n{}---\n", yaml))
    }
}

/// Creates `_index.md` files below a destination root
pub struct IndexMaterializer<'s, S: Storage> {
    root: PathBuf,
    storage: &'s S,
}

impl<'s, S: Storage> IndexMaterializer<'s, S> {
    pub fn new(root: &Path, storage: &'s S) -> Self {
        Self {
            root: clean(root),
            storage,
        }
    }

    /// Ensure `dir` and its ancestors below the root each have an index
    ///
    /// Stops at the first directory that already has one; existing index
    /// files are never rewritten.
    pub fn ensure_index(&self, dir: &Path) -> Result<()> {
        let mut current = clean(dir);

        loop {
            if current == self.root || current.as_os_str().is_empty() || !current.starts_with(&self.root) {
                return Ok(());
            }

            let index = current.join(format!("{}.md", INDEX_NAME));
            if self.storage.exists(&index) {
                return Ok(());
            }

            tracing::debug!("creating index: {}", current.display());
            self.storage.create_dir_all(&current)?;

            let title = current
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();
            let front_matter = FrontMatter::titled(&title).render()?;
            self.storage.write(&index, &front_matter)?;

            if !current.pop() {
                return Ok(());
            }
        }
    }
}

/// Lexically normalize a path, without touching the filesystem
fn clean(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
