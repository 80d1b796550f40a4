//! Schema Docs
//!
//! Converts JSON Schema documents into a tree of Markdown pages for a Hugo
//! site.
//!
//! ## Features
//!
//! - **Schema Graph**: every sub-schema is a node; `$ref` cycles are safe
//! - **Definition Pages**: every referenced schema gets its own page
//! - **Pattern Recovery**: regexes are shown exactly as written in the source
//! - **Source Ordering**: properties can follow their order in the source file
//! - **Section Indexes**: every output directory gets an `_index.md`
//!
//! ## Output
//!
//! ```text
//! <destination>/
//! ├── a-schema/
//! │   ├── _index.md          # root schema of a.schema.json
//! │   ├── x.md               # #/properties/x, when referenced
//! │   └── definitions/
//! │       ├── _index.md
//! │       └── y.md           # #/definitions/y
//! └── b-schema/
//!     └── _index.md
//! ```

pub mod config;
pub mod converter;
pub mod discovery;
pub mod error;
pub mod graph;
pub mod index;
pub mod naming;
pub mod order;
pub mod patterns;
pub mod render;
pub mod storage;

pub use config::DocsConfig;
pub use converter::{ConversionReport, Converter};
pub use error::{DocsError, Result};
pub use graph::{Compiler, SchemaGraph, SchemaNode};
pub use render::{MarkdownRenderer, RenderContext, Renderer};
pub use storage::{LocalFs, Storage};
