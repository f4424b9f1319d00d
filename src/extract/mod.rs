//! Structural model extraction using tree-sitter.
//!
//! Parses each collected file with the grammar registered for its
//! extension and walks the syntax tree into a per-file structural model:
//! function signatures, class definitions with typed attributes, and
//! import dependencies. Parsing is read-only; a failure is recorded on the
//! file's report and never aborts the run.

mod javascript;
mod python;
mod typescript;

use std::cell::RefCell;
use std::fmt;

use compact_str::CompactString;
use smallvec::SmallVec;
use tree_sitter::{Node, Parser};

use crate::walker::SourceFile;

/// A supported source grammar, keyed by file extension. Adding a language
/// means adding a variant, its extensions, and an extractor module; the
/// collector, tree renderer and assembler are untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    Python,
    JavaScript,
    Jsx,
    TypeScript,
    Tsx,
}

impl Language {
    /// All registered languages.
    pub fn all() -> &'static [Language] {
        &[
            Language::Python,
            Language::JavaScript,
            Language::Jsx,
            Language::TypeScript,
            Language::Tsx,
        ]
    }

    /// Extensions handled by this language (lowercase, no dot).
    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            Language::Python => &["py", "pyi"],
            Language::JavaScript => &["js", "mjs", "cjs"],
            Language::Jsx => &["jsx"],
            Language::TypeScript => &["ts"],
            Language::Tsx => &["tsx"],
        }
    }

    /// Look up the language registered for an extension.
    pub fn from_extension(ext: &str) -> Option<Language> {
        Language::all()
            .iter()
            .copied()
            .find(|lang| lang.extensions().contains(&ext))
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Language::Python => write!(f, "Python"),
            Language::JavaScript => write!(f, "JavaScript"),
            Language::Jsx => write!(f, "JSX"),
            Language::TypeScript => write!(f, "TypeScript"),
            Language::Tsx => write!(f, "TSX"),
        }
    }
}

// Thread-local parser caching to avoid re-initialization overhead. Parser
// construction can fail (grammar version mismatch), so initialization
// errors surface as per-file failures rather than panics.
thread_local! {
    static PYTHON_PARSER: RefCell<Option<Parser>> = const { RefCell::new(None) };
    static TS_PARSER: RefCell<Option<Parser>> = const { RefCell::new(None) };
    static TSX_PARSER: RefCell<Option<Parser>> = const { RefCell::new(None) };
}

fn init_python_parser() -> Result<Parser, ()> {
    let mut p = Parser::new();
    p.set_language(&tree_sitter_python::LANGUAGE.into())
        .map_err(|_| ())?;
    Ok(p)
}

fn init_ts_parser() -> Result<Parser, ()> {
    let mut p = Parser::new();
    p.set_language(&tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into())
        .map_err(|_| ())?;
    Ok(p)
}

fn init_tsx_parser() -> Result<Parser, ()> {
    let mut p = Parser::new();
    p.set_language(&tree_sitter_typescript::LANGUAGE_TSX.into())
        .map_err(|_| ())?;
    Ok(p)
}

fn with_cached_parser<F, R>(
    cell: &'static std::thread::LocalKey<RefCell<Option<Parser>>>,
    init: fn() -> Result<Parser, ()>,
    f: F,
) -> Result<R, ParseFailure>
where
    F: FnOnce(&mut Parser) -> Result<R, ParseFailure>,
{
    cell.with(|cell| {
        let mut slot = cell.borrow_mut();
        if slot.is_none() {
            *slot =
                Some(init().map_err(|()| ParseFailure::message("failed to initialize parser"))?);
        }
        let parser = slot
            .as_mut()
            .ok_or_else(|| ParseFailure::message("failed to initialize parser"))?;
        f(parser)
    })
}

pub(crate) fn with_python_parser<F, R>(f: F) -> Result<R, ParseFailure>
where
    F: FnOnce(&mut Parser) -> Result<R, ParseFailure>,
{
    with_cached_parser(&PYTHON_PARSER, init_python_parser, f)
}

pub(crate) fn with_ts_parser<F, R>(f: F) -> Result<R, ParseFailure>
where
    F: FnOnce(&mut Parser) -> Result<R, ParseFailure>,
{
    with_cached_parser(&TS_PARSER, init_ts_parser, f)
}

pub(crate) fn with_tsx_parser<F, R>(f: F) -> Result<R, ParseFailure>
where
    F: FnOnce(&mut Parser) -> Result<R, ParseFailure>,
{
    with_cached_parser(&TSX_PARSER, init_tsx_parser, f)
}

/// Text of a node as a slice of the original content.
pub(crate) fn node_text<'a>(node: Node, content: &'a str) -> &'a str {
    &content[node.byte_range()]
}

/// Find a direct child node by kind.
pub(crate) fn find_child_by_kind<'a>(node: Node<'a>, kind: &str) -> Option<Node<'a>> {
    node.children(&mut node.walk()).find(|c| c.kind() == kind)
}

/// Position of the first ERROR or missing node under `node`, 1-indexed.
pub(crate) fn first_error_position(node: Node) -> Option<(usize, usize)> {
    if node.is_error() || node.is_missing() {
        let p = node.start_position();
        return Some((p.row + 1, p.column + 1));
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if !child.has_error() {
            continue;
        }
        if let Some(pos) = first_error_position(child) {
            return Some(pos);
        }
    }
    None
}

/// Where a function was declared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    Module,
    /// Declared directly in the named class's body.
    Class(CompactString),
}

/// One declared parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub name: CompactString,
    /// Declared annotation, verbatim. Never guessed from call sites.
    pub ty: Option<CompactString>,
    pub has_default: bool,
}

impl Param {
    pub fn plain(name: impl Into<CompactString>) -> Self {
        Self {
            name: name.into(),
            ty: None,
            has_default: false,
        }
    }
}

/// A declared function or method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionSignature {
    pub name: CompactString,
    pub params: SmallVec<[Param; 4]>,
    /// Declared return annotation, verbatim.
    pub returns: Option<CompactString>,
    pub scope: Scope,
    pub is_async: bool,
    /// 1-indexed declaration line.
    pub line: usize,
}

impl FunctionSignature {
    /// Language-neutral prototype: `Class.name(a: int, b: str) -> bool`.
    pub fn prototype(&self) -> String {
        self.render(true)
    }

    /// Prototype without the owning-class prefix, for rendering inside a
    /// class block where the scope is already evident.
    pub fn local_prototype(&self) -> String {
        self.render(false)
    }

    fn render(&self, with_scope: bool) -> String {
        let mut out = String::with_capacity(64);
        if self.is_async {
            out.push_str("async ");
        }
        if with_scope {
            if let Scope::Class(class) = &self.scope {
                out.push_str(class);
                out.push('.');
            }
        }
        out.push_str(&self.name);
        out.push('(');
        for (i, param) in self.params.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            out.push_str(&param.name);
            if let Some(ty) = &param.ty {
                out.push_str(": ");
                out.push_str(ty);
            }
        }
        out.push(')');
        if let Some(ret) = &self.returns {
            out.push_str(" -> ");
            out.push_str(ret);
        }
        out
    }
}

/// Runtime kind of a literal, classified purely from syntax. No source is
/// ever executed to obtain these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiteralKind {
    Str,
    Int,
    Float,
    Bool,
    Seq,
    Map,
    None,
}

impl LiteralKind {
    /// Type name shown in the document, in the vocabulary of the file's
    /// own language.
    pub fn type_name(&self, language: Language) -> &'static str {
        match language {
            Language::Python => match self {
                LiteralKind::Str => "str",
                LiteralKind::Int => "int",
                LiteralKind::Float => "float",
                LiteralKind::Bool => "bool",
                LiteralKind::Seq => "list",
                LiteralKind::Map => "dict",
                LiteralKind::None => "None",
            },
            _ => match self {
                LiteralKind::Str => "string",
                LiteralKind::Int | LiteralKind::Float => "number",
                LiteralKind::Bool => "boolean",
                LiteralKind::Seq => "array",
                LiteralKind::Map => "object",
                LiteralKind::None => "null",
            },
        }
    }
}

/// How an attribute's type was determined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttrType {
    /// Explicit annotation, taken verbatim.
    Declared(CompactString),
    /// Inferred from the assigned literal's kind.
    Inferred(LiteralKind),
    Unknown,
}

impl AttrType {
    /// Type name shown in the document.
    pub fn type_name(&self, language: Language) -> &str {
        match self {
            AttrType::Declared(ty) => ty.as_str(),
            AttrType::Inferred(kind) => kind.type_name(language),
            AttrType::Unknown => "Unknown",
        }
    }
}

/// One class attribute, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeDeclaration {
    pub name: CompactString,
    pub ty: AttrType,
    pub line: usize,
}

/// A declared class (or interface) and its members.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassDefinition {
    pub name: CompactString,
    /// Base-class expressions as written, one level, unresolved.
    pub bases: SmallVec<[CompactString; 2]>,
    /// Functions declared directly in the class body, in body order.
    pub methods: Vec<FunctionSignature>,
    /// Attributes in declaration order. Duplicate names keep the first
    /// occurrence; later reassignment never wins. Deliberate, and load
    /// bearing for output determinism.
    pub attributes: Vec<AttributeDeclaration>,
    pub line: usize,
}

impl ClassDefinition {
    pub fn new(name: impl Into<CompactString>, line: usize) -> Self {
        Self {
            name: name.into(),
            bases: SmallVec::new(),
            methods: Vec::new(),
            attributes: Vec::new(),
            line,
        }
    }

    /// Record an attribute unless the name has already been seen.
    pub fn push_attribute(&mut self, attr: AttributeDeclaration) {
        if self.attributes.iter().any(|a| a.name == attr.name) {
            return;
        }
        self.attributes.push(attr);
    }
}

/// A parse (or read, or unsupported-syntax) failure for one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseFailure {
    pub message: String,
    pub line: Option<usize>,
    pub column: Option<usize>,
}

impl ParseFailure {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            line: None,
            column: None,
        }
    }

    pub fn at(message: impl Into<String>, line: usize, column: usize) -> Self {
        Self {
            message: message.into(),
            line: Some(line),
            column: Some(column),
        }
    }
}

impl fmt::Display for ParseFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.line, self.column) {
            (Some(line), Some(column)) => {
                write!(f, "{} (line {}, column {})", self.message, line, column)
            }
            (Some(line), None) => write!(f, "{} (line {})", self.message, line),
            _ => write!(f, "{}", self.message),
        }
    }
}

/// What one extractor produces for a parsed file.
pub(crate) type Extraction = (
    Vec<FunctionSignature>,
    Vec<ClassDefinition>,
    Vec<CompactString>,
);

/// The structural model of one file.
///
/// A file that failed to parse has empty collections and `error` set; it
/// still appears in the tree and is visibly marked in the document.
#[derive(Debug, Clone)]
pub struct FileReport {
    pub file: SourceFile,
    /// Module-level functions and class methods, in source order.
    pub signatures: Vec<FunctionSignature>,
    pub classes: Vec<ClassDefinition>,
    /// Imported module names, first-seen order, case-sensitively deduped.
    pub dependencies: Vec<CompactString>,
    pub error: Option<ParseFailure>,
    /// Newline count of the file's content (0 when unreadable).
    pub lines: usize,
    /// Raw text, kept only when the combined-source section was requested.
    pub source: Option<String>,
}

impl FileReport {
    pub fn empty(file: SourceFile) -> Self {
        Self {
            file,
            signatures: Vec::new(),
            classes: Vec::new(),
            dependencies: Vec::new(),
            error: None,
            lines: 0,
            source: None,
        }
    }

    pub fn with_error(file: SourceFile, error: ParseFailure) -> Self {
        Self {
            error: Some(error),
            ..Self::empty(file)
        }
    }

    /// Parsed fine but declared nothing. Distinct from a parse failure.
    pub fn is_empty(&self) -> bool {
        self.error.is_none()
            && self.signatures.is_empty()
            && self.classes.is_empty()
            && self.dependencies.is_empty()
    }
}

/// Push a dependency name, preserving first-seen order.
pub(crate) fn push_dependency(deps: &mut Vec<CompactString>, name: CompactString) {
    if name.is_empty() || deps.iter().any(|d| *d == name) {
        return;
    }
    deps.push(name);
}

/// Extract the structural model from one file's content.
///
/// Never panics and never fails the run: unsupported extensions and syntax
/// errors come back as a report carrying a [`ParseFailure`] and zero
/// declarations.
pub fn extract_file(file: &SourceFile, content: &str) -> FileReport {
    let Some(language) = file.language else {
        return FileReport::with_error(
            file.clone(),
            ParseFailure::message("unsupported file type"),
        );
    };

    let result = match language {
        Language::Python => python::extract(content),
        Language::TypeScript | Language::Tsx => typescript::extract(content, language),
        Language::JavaScript | Language::Jsx => javascript::extract(content, language),
    };

    match result {
        Ok((signatures, classes, dependencies)) => FileReport {
            file: file.clone(),
            signatures,
            classes,
            dependencies,
            error: None,
            lines: 0,
            source: None,
        },
        Err(error) => FileReport::with_error(file.clone(), error),
    }
}
