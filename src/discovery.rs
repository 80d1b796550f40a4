//! Source file discovery
//!
//! A file argument is converted as-is. A directory is searched for file
//! names matching the extension glob, either at the top level only or in
//! every sub-directory when recursive.

use std::path::{Path, PathBuf};

use ignore::overrides::{Override, OverrideBuilder};
use walkdir::WalkDir;

use crate::error::{DocsError, Result};

/// Schema files under `path` whose file name matches `pattern`
///
/// Results are sorted by path so runs are reproducible.
pub fn find_files(path: &Path, pattern: &str, recursive: bool) -> Result<Vec<PathBuf>> {
    if !path.exists() {
        return Err(DocsError::PathNotFound {
            path: path.to_path_buf(),
        });
    }

    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }

    let matcher = file_matcher(path, pattern)?;
    let max_depth = if recursive { usize::MAX } else { 1 };

    let mut files = Vec::new();
    for entry in WalkDir::new(path).max_depth(max_depth).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            let at = e.path().unwrap_or(path).to_path_buf();
            DocsError::io(at, e.into())
        })?;
        if entry.file_type().is_file()
            && matcher.matched(Path::new(entry.file_name()), false).is_whitelist()
        {
            files.push(entry.into_path());
        }
    }
    files.sort();

    if files.is_empty() {
        return Err(DocsError::NoSchemasFound {
            path: path.to_path_buf(),
            pattern: pattern.to_string(),
        });
    }

    tracing::debug!("found {} schema files in {}", files.len(), path.display());
    Ok(files)
}

fn file_matcher(root: &Path, pattern: &str) -> Result<Override> {
    let mut builder = OverrideBuilder::new(root);
    builder
        .add(pattern)
        .map_err(|e| DocsError::Pattern(e.to_string()))?;
    builder.build().map_err(|e| DocsError::Pattern(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "{}").unwrap();
    }

    fn names(root: &Path, files: &[PathBuf]) -> Vec<String> {
        files
            .iter()
            .map(|f| f.strip_prefix(root).unwrap().to_string_lossy().replace('\\', "/"))
            .collect()
    }

    fn fixture() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("b.schema.json"));
        touch(&dir.path().join("a.schema.json"));
        touch(&dir.path().join("notes.json"));
        touch(&dir.path().join("nested/c.schema.json"));
        touch(&dir.path().join("nested/deeper/d.schema.json"));
        dir
    }

    #[test]
    fn test_flat_discovery() {
        let dir = fixture();
        let files = find_files(dir.path(), "*.schema.json", false).unwrap();
        assert_eq!(names(dir.path(), &files), vec!["a.schema.json", "b.schema.json"]);
    }

    #[test]
    fn test_recursive_discovery() {
        let dir = fixture();
        let files = find_files(dir.path(), "*.schema.json", true).unwrap();
        assert_eq!(
            names(dir.path(), &files),
            vec![
                "a.schema.json",
                "b.schema.json",
                "nested/c.schema.json",
                "nested/deeper/d.schema.json"
            ]
        );
    }

    #[test]
    fn test_custom_pattern() {
        let dir = fixture();
        let files = find_files(dir.path(), "*.json", false).unwrap();
        assert_eq!(files.len(), 3);
    }

    #[test]
    fn test_single_file() {
        let dir = fixture();
        let file = dir.path().join("notes.json");
        assert_eq!(find_files(&file, "*.schema.json", false).unwrap(), vec![file]);
    }

    #[test]
    fn test_missing_path() {
        let err = find_files(Path::new("/definitely/not/here"), "*.json", false).unwrap_err();
        assert!(matches!(err, DocsError::PathNotFound { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_directory_is_fatal() {
        use std::os::unix::fs::PermissionsExt;

        let dir = fixture();
        let locked = dir.path().join("nested");
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();
        let readable = fs::read_dir(&locked).is_ok();

        let result = find_files(dir.path(), "*.schema.json", true);
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        // Permission bits do not apply to privileged users
        if readable {
            return;
        }
        let err = result.unwrap_err();
        assert!(matches!(err, DocsError::Io { ref path, .. } if path.ends_with("nested")), "{err}");
    }

    #[test]
    fn test_no_matches() {
        let dir = fixture();
        let err = find_files(dir.path(), "*.yaml", true).unwrap_err();
        assert!(matches!(err, DocsError::NoSchemasFound { .. }));
    }
}
