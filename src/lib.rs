//! Marrow - distill a source tree into a single LLM-ready context document.
//!
//! Marrow walks a project directory, extracts a structural model from each
//! source file (function signatures, class definitions with typed
//! attributes, import dependencies), and assembles one deterministic text
//! document: directory tree, signatures, classes, dependencies, and
//! optionally the concatenated raw source.
//!
//! # Quick Start
//!
//! ```no_run
//! use marrow::builder::Marrow;
//!
//! let doc = Marrow::new("./my-project")
//!     .include_source(false)
//!     .build()
//!     .unwrap();
//!
//! println!("{}", doc.text);
//! println!("{} files, {} with errors", doc.file_count(), doc.error_count());
//! ```
//!
//! # Modules
//!
//! - [`walker`] - file collection with gitignore support and deterministic ordering
//! - [`extract`] - tree-sitter based structural model extraction
//! - [`tree`] - directory tree building and rendering
//! - [`report`] - document assembly (text and JSON)
//! - [`builder`] - fluent pipeline API
//! - [`tokens`] - token counting for the emitted document
//!
//! # Supported Languages
//!
//! - Python (`.py`, `.pyi`)
//! - JavaScript (`.js`, `.jsx`, `.mjs`, `.cjs`)
//! - TypeScript (`.ts`, `.tsx`)

pub mod builder;
pub mod errors;
pub mod extract;
pub mod report;
pub mod tokens;
pub mod tree;
pub mod walker;

// Re-export key types at crate root for convenience
pub use builder::{render_context, ContextDocument, Marrow};
pub use errors::MarrowError;
pub use extract::{
    extract_file, AttrType, AttributeDeclaration, ClassDefinition, FileReport, FunctionSignature,
    Language, LiteralKind, Param, ParseFailure, Scope,
};
pub use report::{render, to_json, ReportOptions};
pub use tree::{build_tree, render_tree, FileNode};
pub use walker::{collect, CollectOptions, SourceFile, WalkError};
