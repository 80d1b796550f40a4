//! Conversion driver
//!
//! One run: discover source files, decode and rewrite them, register them
//! with the compiler, compile every file into a root, then write a page for
//! each root and for each definition reachable from it. All run state lives
//! on the stack of [`Converter::convert`] and is dropped when the run ends.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::config::DocsConfig;
use crate::discovery::find_files;
use crate::error::{DocsError, Result};
use crate::graph::{definitions, reference_cycles, Compiler, NodeIndex};
use crate::index::{IndexMaterializer, INDEX_NAME};
use crate::naming;
use crate::order::{KeyOrder, OrderIndex};
use crate::patterns::PatternTable;
use crate::render::{MarkdownRenderer, RenderContext, Renderer, PAGE_TEMPLATE};
use crate::storage::{LocalFs, Storage};

/// Outcome of a successful run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversionReport {
    /// Source files converted
    pub schemas: usize,
    /// Pages written, index pages of roots included
    pub pages: usize,
    /// Groups of schemas that reference each other
    pub cycles: Vec<Vec<String>>,
}

/// Converts JSON Schema files into a tree of Markdown pages
pub struct Converter<S: Storage = LocalFs, R: Renderer = MarkdownRenderer> {
    config: DocsConfig,
    storage: S,
    renderer: R,
}

impl Converter {
    pub fn new(config: DocsConfig) -> Self {
        Self::with_parts(config, LocalFs, MarkdownRenderer)
    }
}

impl<S: Storage, R: Renderer> Converter<S, R> {
    pub fn with_parts(config: DocsConfig, storage: S, renderer: R) -> Self {
        Self {
            config: config.normalized(),
            storage,
            renderer,
        }
    }

    pub fn config(&self) -> &DocsConfig {
        &self.config
    }

    /// Remove the destination tree
    pub fn clean(&self) -> Result<()> {
        let destination = &self.config.destination;
        if destination.as_os_str().is_empty() || destination == Path::new(".") {
            tracing::warn!("refusing to clean the working directory");
            return Ok(());
        }
        tracing::info!("cleaning {}", destination.display());
        self.storage.remove_dir_all(destination)
    }

    /// Convert every schema found at `path`
    pub fn convert(&self, path: &Path) -> Result<ConversionReport> {
        let files = find_files(path, &self.config.extension, self.config.recursive)?;

        if self.config.clean {
            self.clean()?;
        }

        let mut patterns = PatternTable::new();
        let mut order = OrderIndex::new();
        let mut compiler = Compiler::new();
        for file in &files {
            self.load_schema(file, &mut patterns, &mut order, &mut compiler)?;
        }

        let mut roots = Vec::with_capacity(files.len());
        for file in &files {
            tracing::debug!("compiling schema: {}", file.display());
            roots.push(compiler.compile(&file.to_string_lossy())?);
        }

        let graph = compiler.into_graph();
        let cycles = reference_cycles(&graph);
        for cycle in &cycles {
            tracing::debug!("reference cycle: {}", cycle.join(" -> "));
        }

        let reference_url = self.config.reference_url();
        let ctx = RenderContext {
            graph: &graph,
            patterns: &patterns,
            order: &order,
            reference_url: &reference_url,
        };
        let indexer = IndexMaterializer::new(&self.config.destination, &self.storage);

        let mut converted: HashSet<&str> = roots.iter().map(|r| graph[*r].location.as_str()).collect();
        let mut written: HashSet<PathBuf> = HashSet::new();
        let mut pages = 0;

        for &root in &roots {
            self.write_page(INDEX_NAME, root, &ctx, &indexer, &mut written)?;
            pages += 1;

            for definition in definitions(&graph, root) {
                let location = graph[definition.node].location.as_str();
                if !converted.insert(location) {
                    tracing::debug!("already converted: {}", location);
                    continue;
                }

                tracing::debug!("converting {:?} definition {}", definition.kind, location);
                let name = self.page_name(definition.node, &ctx);
                self.write_page(&name, definition.node, &ctx, &indexer, &mut written)?;
                pages += 1;
            }
        }

        tracing::info!("converted {} schemas into {} pages", roots.len(), pages);
        Ok(ConversionReport {
            schemas: roots.len(),
            pages,
            cycles,
        })
    }

    /// Decode one source file, rewrite its regexes and register it
    fn load_schema(
        &self,
        path: &Path,
        patterns: &mut PatternTable,
        order: &mut OrderIndex,
        compiler: &mut Compiler,
    ) -> Result<()> {
        tracing::info!("loading schema: {}", path.display());

        let bytes = fs::read(path).map_err(|e| DocsError::io(path, e))?;
        let decode = |source| DocsError::Decode {
            path: path.to_path_buf(),
            source,
        };

        let mut document: Value = serde_json::from_slice(&bytes).map_err(decode)?;
        if self.config.ordered {
            order.insert(path, KeyOrder::from_slice(&bytes).map_err(decode)?);
        }

        patterns.rewrite(&mut document);

        let source = path.to_string_lossy();
        let id = document.get("$id").and_then(Value::as_str).unwrap_or("");
        let url = naming::first_non_empty(&[id, &*source]).to_string();
        compiler.add_resource(&url, path, document);
        Ok(())
    }

    /// File name of a definition page, prefixed with its weight when asked
    fn page_name(&self, idx: NodeIndex, ctx: &RenderContext<'_>) -> String {
        let name = ctx.file_name(idx);
        match ctx.weight(idx) {
            Some(weight) if self.config.ordered_file_path => format!("{}-{}", weight, name),
            _ => name,
        }
    }

    /// Render one page into its directory
    ///
    /// A page whose path was already written this run gets the node's ref
    /// key appended to its name instead of replacing the earlier page.
    fn write_page(
        &self,
        name: &str,
        idx: NodeIndex,
        ctx: &RenderContext<'_>,
        indexer: &IndexMaterializer<'_, S>,
        written: &mut HashSet<PathBuf>,
    ) -> Result<()> {
        let dir = self.config.destination.join(ctx.file_path(idx));
        indexer.ensure_index(&dir)?;
        self.storage.create_dir_all(&dir)?;

        let mut page = dir.join(format!("{}.md", name));
        if written.contains(&page) {
            let unique = dir.join(format!("{}-{}.md", name, ctx.ref_key(idx)));
            tracing::warn!(
                "{} was already written this run, writing {} instead",
                page.display(),
                unique.display()
            );
            page = unique;
        }

        let content = self.renderer.render(PAGE_TEMPLATE, idx, ctx)?;
        self.storage.write(&page, &content)?;

        tracing::info!("wrote {}", page.display());
        written.insert(page);
        Ok(())
    }
}
