//! Document assembly.
//!
//! Formats the per-file extraction results and the directory tree into the
//! final context document: five fixed sections, grouped by file, in the
//! collector's deterministic order. The assembler never parses anything and
//! never fails; missing data renders as placeholder text. A JSON rendering
//! of the same model backs the CLI's `--json` flag.

use serde::Serialize;

use crate::extract::{ClassDefinition, FileReport, FunctionSignature, Language, Scope};
use crate::tree::{build_tree, render_tree};

pub const STRUCTURE_HEADER: &str = "# ───────────── Project Structure ─────────────";
pub const FUNCTIONS_HEADER: &str = "# ───────────── Function Signatures ─────────────";
pub const CLASSES_HEADER: &str = "# ───────────── Class Definitions ─────────────";
pub const DEPENDENCIES_HEADER: &str = "# ───────────── Dependencies ─────────────";
pub const SOURCE_HEADER: &str = "# ───────────── Combined Source ─────────────";

/// Marker prefix for a file that contributed no declarations because it
/// could not be parsed (or read). Distinct from `(none)`, which means the
/// file parsed fine and simply declares nothing for that section.
const ERROR_MARKER: &str = "!! ";

/// Options for document assembly.
#[derive(Debug, Clone, Default)]
pub struct ReportOptions {
    /// Append each file's raw text under the Combined Source header.
    pub include_source: bool,
}

/// Assemble the context document.
///
/// All five section headers are always present. On an empty project each
/// body is an explicit "no entries" placeholder rather than an omission or
/// an error.
pub fn render(root_name: &str, reports: &[FileReport], options: &ReportOptions) -> String {
    let mut out = String::with_capacity(8192);

    // 1. Project structure
    out.push_str(STRUCTURE_HEADER);
    out.push('\n');
    let tree = build_tree(root_name, reports.iter().map(|r| r.file.relative.as_str()));
    out.push_str(&render_tree(&tree));
    if reports.is_empty() {
        out.push_str("<no files>\n");
    }

    // 2. Function signatures
    out.push('\n');
    out.push_str(FUNCTIONS_HEADER);
    out.push('\n');
    render_grouped(&mut out, reports, "<no functions found>", |out, report| {
        if report.signatures.is_empty() {
            out.push_str("(none)\n");
            return;
        }
        for sig in &report.signatures {
            out.push_str(&sig.prototype());
            out.push('\n');
        }
    });

    // 3. Class definitions
    out.push('\n');
    out.push_str(CLASSES_HEADER);
    out.push('\n');
    render_grouped(&mut out, reports, "<no classes found>", |out, report| {
        if report.classes.is_empty() {
            out.push_str("(none)\n");
            return;
        }
        let language = report.file.language.unwrap_or(Language::Python);
        for class in &report.classes {
            render_class(out, class, language);
        }
    });

    // 4. Dependencies
    out.push('\n');
    out.push_str(DEPENDENCIES_HEADER);
    out.push('\n');
    render_grouped(&mut out, reports, "<none detected>", |out, report| {
        if report.dependencies.is_empty() {
            out.push_str("(none)\n");
            return;
        }
        for dep in &report.dependencies {
            out.push_str(dep);
            out.push('\n');
        }
    });

    // 5. Combined source
    out.push('\n');
    out.push_str(SOURCE_HEADER);
    out.push('\n');
    if !options.include_source {
        out.push_str("<source not included>\n");
    } else if reports.is_empty() {
        out.push_str("<no files>\n");
    } else {
        for report in reports {
            out.push_str("# === ");
            out.push_str(&report.file.relative);
            out.push_str(" ===\n");
            match &report.source {
                Some(text) => {
                    out.push_str(text);
                    if !text.ends_with('\n') {
                        out.push('\n');
                    }
                }
                None => {
                    out.push_str(ERROR_MARKER);
                    out.push_str("source unavailable\n");
                }
            }
            out.push('\n');
        }
    }

    out
}

/// Render a per-file grouped section body: `## path` headings in collector
/// order, an error marker for failed files, the section-specific body
/// otherwise.
fn render_grouped<F>(out: &mut String, reports: &[FileReport], empty: &str, body: F)
where
    F: Fn(&mut String, &FileReport),
{
    if reports.is_empty() {
        out.push_str(empty);
        out.push('\n');
        return;
    }
    for (i, report) in reports.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        out.push_str("## ");
        out.push_str(&report.file.relative);
        out.push('\n');
        match &report.error {
            Some(failure) => {
                out.push_str(ERROR_MARKER);
                out.push_str(&failure.to_string());
                out.push('\n');
            }
            None => body(out, report),
        }
    }
}

fn render_class(out: &mut String, class: &ClassDefinition, language: Language) {
    out.push_str("class ");
    out.push_str(&class.name);
    if !class.bases.is_empty() {
        out.push('(');
        for (i, base) in class.bases.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            out.push_str(base);
        }
        out.push(')');
    }
    out.push('\n');

    for method in &class.methods {
        out.push_str("    ");
        out.push_str(&method.local_prototype());
        out.push('\n');
    }
    for attr in &class.attributes {
        out.push_str("    ");
        out.push_str(&attr.name);
        out.push_str(": ");
        out.push_str(attr.ty.type_name(language));
        out.push('\n');
    }
}

// ============================================================================
// JSON rendering
// ============================================================================

#[derive(Serialize)]
struct JsonDocument<'a> {
    root: &'a str,
    files: Vec<JsonFile>,
}

#[derive(Serialize)]
struct JsonFile {
    path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    language: Option<String>,
    lines: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<JsonFailure>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    functions: Vec<JsonFunction>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    classes: Vec<JsonClass>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    dependencies: Vec<String>,
}

#[derive(Serialize)]
struct JsonFailure {
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    line: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    column: Option<usize>,
}

#[derive(Serialize)]
struct JsonFunction {
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    class: Option<String>,
    is_async: bool,
    line: usize,
    params: Vec<JsonParam>,
    #[serde(skip_serializing_if = "Option::is_none")]
    returns: Option<String>,
}

#[derive(Serialize)]
struct JsonParam {
    name: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    ty: Option<String>,
    has_default: bool,
}

#[derive(Serialize)]
struct JsonClass {
    name: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    bases: Vec<String>,
    line: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    methods: Vec<JsonFunction>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    attributes: Vec<JsonAttribute>,
}

#[derive(Serialize)]
struct JsonAttribute {
    name: String,
    #[serde(rename = "type")]
    ty: String,
    line: usize,
}

/// Serialize the structured model (not the text document) as pretty JSON.
pub fn to_json(root_name: &str, reports: &[FileReport]) -> Result<String, serde_json::Error> {
    let files = reports
        .iter()
        .map(|report| {
            let language = report.file.language;
            JsonFile {
                path: report.file.relative.clone(),
                language: language.map(|l| l.to_string()),
                lines: report.lines,
                error: report.error.as_ref().map(|e| JsonFailure {
                    message: e.message.clone(),
                    line: e.line,
                    column: e.column,
                }),
                functions: report.signatures.iter().map(function_to_json).collect(),
                classes: report
                    .classes
                    .iter()
                    .map(|c| class_to_json(c, language.unwrap_or(Language::Python)))
                    .collect(),
                dependencies: report.dependencies.iter().map(|d| d.to_string()).collect(),
            }
        })
        .collect();

    serde_json::to_string_pretty(&JsonDocument {
        root: root_name,
        files,
    })
}

fn function_to_json(sig: &FunctionSignature) -> JsonFunction {
    JsonFunction {
        name: sig.name.to_string(),
        class: match &sig.scope {
            Scope::Module => None,
            Scope::Class(name) => Some(name.to_string()),
        },
        is_async: sig.is_async,
        line: sig.line,
        params: sig
            .params
            .iter()
            .map(|p| JsonParam {
                name: p.name.to_string(),
                ty: p.ty.as_ref().map(|t| t.to_string()),
                has_default: p.has_default,
            })
            .collect(),
        returns: sig.returns.as_ref().map(|r| r.to_string()),
    }
}

fn class_to_json(class: &ClassDefinition, language: Language) -> JsonClass {
    JsonClass {
        name: class.name.to_string(),
        bases: class.bases.iter().map(|b| b.to_string()).collect(),
        line: class.line,
        methods: class.methods.iter().map(function_to_json).collect(),
        attributes: class
            .attributes
            .iter()
            .map(|a| JsonAttribute {
                name: a.name.to_string(),
                ty: a.ty.type_name(language).to_string(),
                line: a.line,
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::{extract_file, ParseFailure};
    use crate::walker::SourceFile;
    use std::path::PathBuf;

    fn py_report(relative: &str, code: &str) -> FileReport {
        let file = SourceFile {
            relative: relative.to_string(),
            path: PathBuf::from(relative),
            language: Some(Language::Python),
        };
        extract_file(&file, code)
    }

    fn failed_report(relative: &str) -> FileReport {
        let file = SourceFile {
            relative: relative.to_string(),
            path: PathBuf::from(relative),
            language: Some(Language::Python),
        };
        FileReport::with_error(file, ParseFailure::at("invalid syntax", 3, 7))
    }

    #[test]
    fn empty_project_renders_all_five_headers() {
        let text = render("empty", &[], &ReportOptions::default());

        assert!(text.contains(STRUCTURE_HEADER));
        assert!(text.contains(FUNCTIONS_HEADER));
        assert!(text.contains(CLASSES_HEADER));
        assert!(text.contains(DEPENDENCIES_HEADER));
        assert!(text.contains(SOURCE_HEADER));

        assert!(text.contains("<no files>"));
        assert!(text.contains("<no functions found>"));
        assert!(text.contains("<no classes found>"));
        assert!(text.contains("<none detected>"));
        assert!(text.contains("<source not included>"));
    }

    #[test]
    fn sections_group_by_file() {
        let reports = vec![
            py_report("a.py", "import os\n\ndef f(a: int) -> bool:\n    return True\n"),
            py_report("b.py", "class C:\n    count: int = 0\n"),
        ];
        let text = render("proj", &reports, &ReportOptions::default());

        assert!(text.contains("## a.py"));
        assert!(text.contains("f(a: int) -> bool"));
        assert!(text.contains("## b.py"));
        assert!(text.contains("class C"));
        assert!(text.contains("    count: int"));
        assert!(text.contains("os\n"));
    }

    #[test]
    fn failed_file_is_marked_in_every_section() {
        let reports = vec![failed_report("bad.py")];
        let text = render("proj", &reports, &ReportOptions::default());

        // Still in the tree.
        assert!(text.contains("└── bad.py"));
        // Marked, not silently dropped.
        let markers = text.matches("!! invalid syntax (line 3, column 7)").count();
        assert_eq!(markers, 3);
    }

    #[test]
    fn parsed_but_empty_is_distinct_from_failed() {
        let reports = vec![py_report("empty.py", "x = 1\n")];
        let text = render("proj", &reports, &ReportOptions::default());
        assert!(text.contains("(none)"));
        assert!(!text.contains("!!"));
    }

    #[test]
    fn combined_source_only_on_request() {
        let mut report = py_report("a.py", "def f():\n    pass\n");
        report.source = Some("def f():\n    pass\n".to_string());
        let reports = vec![report];

        let without = render("proj", &reports, &ReportOptions::default());
        assert!(without.contains("<source not included>"));
        assert!(!without.contains("# === a.py ==="));

        let with = render(
            "proj",
            &reports,
            &ReportOptions {
                include_source: true,
            },
        );
        assert!(with.contains("# === a.py ==="));
        assert!(with.contains("def f():\n    pass\n"));
    }

    #[test]
    fn class_block_renders_methods_then_attributes() {
        let reports = vec![py_report(
            "w.py",
            r#"
class Worker(Base):
    retries = 3

    def run(self) -> None:
        pass
"#,
        )];
        let text = render("proj", &reports, &ReportOptions::default());
        let class_at = text.find("class Worker(Base)").unwrap();
        let method_at = text.find("    run(self) -> None").unwrap();
        let attr_at = text.find("    retries: int").unwrap();
        assert!(class_at < method_at);
        assert!(method_at < attr_at);
    }

    #[test]
    fn render_is_deterministic() {
        let reports = vec![
            py_report("a.py", "import os\ndef f():\n    pass\n"),
            py_report("b.py", "class C:\n    x = 1\n"),
        ];
        let options = ReportOptions::default();
        assert_eq!(
            render("proj", &reports, &options),
            render("proj", &reports, &options)
        );
    }

    #[test]
    fn json_shape() {
        let reports = vec![py_report(
            "a.py",
            "import os\n\ndef f(a: int, b: str = \"x\") -> bool:\n    return True\n",
        )];
        let json = to_json("proj", &reports).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["root"], "proj");
        let file = &value["files"][0];
        assert_eq!(file["path"], "a.py");
        assert_eq!(file["language"], "Python");
        assert_eq!(file["dependencies"][0], "os");

        let func = &file["functions"][0];
        assert_eq!(func["name"], "f");
        assert_eq!(func["returns"], "bool");
        assert_eq!(func["params"][1]["type"], "str");
        assert_eq!(func["params"][1]["has_default"], true);
    }

    #[test]
    fn json_reports_errors() {
        let json = to_json("proj", &[failed_report("bad.py")]).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        let file = &value["files"][0];
        assert_eq!(file["error"]["message"], "invalid syntax");
        assert_eq!(file["error"]["line"], 3);
        assert!(file.get("functions").is_none());
    }
}
