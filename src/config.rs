//! Configuration for documentation runs
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (schema-docs.toml)
//! - Environment variables (SCHEMA_DOCS_*)
//!
//! ## Example config file (schema-docs.toml):
//! ```toml
//! destination = "site/content/reference"
//! extension = "*.schema.json"
//! recursive = true
//! ordered = true
//! clean = false
//! ```

use config_crate::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};

use crate::error::Result;

/// Hugo content directory marker used to derive the reference URL
const CONTENT_DIR: &str = "content";

/// Reference URL used when the destination is outside a content directory
const DEFAULT_REFERENCE_URL: &str = "reference";

/// Settings for a conversion run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocsConfig {
    /// Directory pages are written to
    #[serde(default = "default_destination")]
    pub destination: PathBuf,

    /// Glob matched against schema file names
    #[serde(default = "default_extension")]
    pub extension: String,

    /// Search sub-directories for schemas
    #[serde(default)]
    pub recursive: bool,

    /// Order properties as they appear in the source files
    #[serde(default)]
    pub ordered: bool,

    /// Prefix definition page names with their source position
    #[serde(default)]
    pub ordered_file_path: bool,

    /// Remove the destination before writing
    #[serde(default)]
    pub clean: bool,

    /// Site-relative URL of the destination, derived when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_url: Option<String>,
}

fn default_destination() -> PathBuf {
    PathBuf::from(".")
}

fn default_extension() -> String {
    "*.schema.json".to_string()
}

impl Default for DocsConfig {
    fn default() -> Self {
        Self {
            destination: default_destination(),
            extension: default_extension(),
            recursive: false,
            ordered: false,
            ordered_file_path: false,
            clean: false,
            reference_url: None,
        }
    }
}

impl DocsConfig {
    /// Load configuration, layering an explicit file over the default locations
    pub fn load_from(config_path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();

        for location in ["schema-docs.toml", ".schema-docs.toml"] {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        if let Some(dirs) = directories::ProjectDirs::from("dev", "schema-docs", "schema-docs") {
            let user_config = dirs.config_dir().join("schema-docs.toml");
            if user_config.exists() {
                builder = builder.add_source(File::from(user_config).required(false));
            }
        }

        if let Some(path) = config_path {
            builder = builder.add_source(File::from(path).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix("SCHEMA_DOCS")
                .separator("__")
                .try_parsing(true),
        );

        let config: Self = builder.build()?.try_deserialize()?;
        Ok(config.normalized())
    }

    /// Apply implied settings
    pub fn normalized(mut self) -> Self {
        if self.ordered_file_path {
            self.ordered = true;
        }
        self
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, content)
    }

    /// Site-relative URL pages are published under
    ///
    /// The configured value, else the part of the destination after a
    /// `content` directory, else `reference`.
    pub fn reference_url(&self) -> String {
        if let Some(url) = &self.reference_url {
            return url.trim_matches('/').to_string();
        }

        let segments: Vec<String> = self
            .destination
            .components()
            .filter_map(|c| match c {
                Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect();

        match segments.iter().position(|s| s == CONTENT_DIR) {
            Some(i) if i + 1 < segments.len() => segments[i + 1..].join("/"),
            _ => DEFAULT_REFERENCE_URL.to_string(),
        }
    }
}
