//! TypeScript/TSX extraction using tree-sitter.
//!
//! Also the engine behind JavaScript extraction: the TypeScript grammar
//! parses plain JavaScript, so the JS module delegates here.

use compact_str::CompactString;
use smallvec::SmallVec;
use tree_sitter::{Node, Parser};

use super::{
    find_child_by_kind, first_error_position, node_text, push_dependency, with_ts_parser,
    with_tsx_parser, AttrType, AttributeDeclaration, ClassDefinition, Extraction,
    FunctionSignature, Language, LiteralKind, Param, ParseFailure, Scope,
};

pub(super) fn extract(content: &str, language: Language) -> Result<Extraction, ParseFailure> {
    let run = |parser: &mut Parser| {
        let tree = parser
            .parse(content, None)
            .ok_or_else(|| ParseFailure::message("parser produced no tree"))?;

        let root = tree.root_node();
        if root.has_error() {
            return Err(match first_error_position(root) {
                Some((line, column)) => ParseFailure::at("invalid syntax", line, column),
                None => ParseFailure::message("invalid syntax"),
            });
        }

        let mut signatures = Vec::new();
        let mut classes = Vec::new();
        let mut dependencies = Vec::new();

        let mut cursor = root.walk();
        for child in root.children(&mut cursor) {
            statement(child, content, &mut signatures, &mut classes, &mut dependencies);
        }

        Ok((signatures, classes, dependencies))
    };

    match language {
        Language::Tsx => with_tsx_parser(run),
        _ => with_ts_parser(run),
    }
}

fn statement(
    node: Node,
    content: &str,
    signatures: &mut Vec<FunctionSignature>,
    classes: &mut Vec<ClassDefinition>,
    dependencies: &mut Vec<CompactString>,
) {
    match node.kind() {
        "import_statement" => {
            // Bare side-effect imports (`import "polyfill"`) carry the
            // string outside the source field.
            let source = node
                .child_by_field_name("source")
                .or_else(|| find_child_by_kind(node, "string"));
            if let Some(source) = source {
                push_dependency(dependencies, string_value(source, content).into());
            }
        }
        "export_statement" => {
            if let Some(decl) = node.child_by_field_name("declaration") {
                statement(decl, content, signatures, classes, dependencies);
            } else if let Some(value) = node.child_by_field_name("value") {
                // `export default () => ...` and friends have no name.
                if is_callable(value) {
                    signatures.push(callable_signature(
                        value,
                        content,
                        "<anonymous>".into(),
                        Scope::Module,
                    ));
                }
            }
        }
        "function_declaration" | "generator_function_declaration" => {
            let name = node
                .child_by_field_name("name")
                .map(|n| node_text(n, content))
                .unwrap_or("<anonymous>");
            signatures.push(callable_signature(node, content, name.into(), Scope::Module));
        }
        "class_declaration" | "abstract_class_declaration" => {
            if let Some(class) = class_definition(node, content, signatures) {
                classes.push(class);
            }
        }
        "interface_declaration" => {
            if let Some(class) = interface_definition(node, content, signatures) {
                classes.push(class);
            }
        }
        "lexical_declaration" | "variable_declaration" => {
            let mut cursor = node.walk();
            for decl in node.named_children(&mut cursor) {
                if decl.kind() != "variable_declarator" {
                    continue;
                }
                let Some(value) = decl.child_by_field_name("value") else {
                    continue;
                };
                if is_callable(value) {
                    let name = decl
                        .child_by_field_name("name")
                        .map(|n| node_text(n, content))
                        .unwrap_or("<anonymous>");
                    signatures.push(callable_signature(
                        value,
                        content,
                        name.into(),
                        Scope::Module,
                    ));
                } else if let Some(source) = require_source(value, content) {
                    push_dependency(dependencies, source);
                }
            }
        }
        _ => {}
    }
}

fn is_callable(node: Node) -> bool {
    matches!(
        node.kind(),
        "arrow_function" | "function_expression" | "function" | "generator_function"
    )
}

fn callable_signature(
    node: Node,
    content: &str,
    name: CompactString,
    scope: Scope,
) -> FunctionSignature {
    let is_async = node.children(&mut node.walk()).any(|c| c.kind() == "async");

    let mut params: SmallVec<[Param; 4]> = SmallVec::new();
    if let Some(list) = node.child_by_field_name("parameters") {
        let mut cursor = list.walk();
        for child in list.named_children(&mut cursor) {
            match child.kind() {
                "required_parameter" | "optional_parameter" => {
                    let pattern = child
                        .child_by_field_name("pattern")
                        .map(|n| node_text(n, content))
                        .unwrap_or("_");
                    params.push(Param {
                        name: pattern.into(),
                        ty: child
                            .child_by_field_name("type")
                            .map(|n| annotation_text(n, content).into()),
                        has_default: child.child_by_field_name("value").is_some(),
                    });
                }
                // Plain identifiers show up when the grammar degrades
                // gracefully on JS-style parameter lists.
                "identifier" | "rest_pattern" => {
                    params.push(Param::plain(node_text(child, content)));
                }
                _ => {}
            }
        }
    } else if let Some(single) = node.child_by_field_name("parameter") {
        // `x => ...` single-parameter arrow shorthand.
        params.push(Param::plain(node_text(single, content)));
    }

    FunctionSignature {
        name,
        params,
        returns: node
            .child_by_field_name("return_type")
            .map(|n| annotation_text(n, content).into()),
        scope,
        is_async,
        line: node.start_position().row + 1,
    }
}

fn class_definition(
    node: Node,
    content: &str,
    signatures: &mut Vec<FunctionSignature>,
) -> Option<ClassDefinition> {
    let name: CompactString = node
        .child_by_field_name("name")
        .map(|n| node_text(n, content))
        .unwrap_or("<anonymous>")
        .into();
    let mut class = ClassDefinition::new(name.clone(), node.start_position().row + 1);

    if let Some(heritage) = find_child_by_kind(node, "class_heritage") {
        let mut cursor = heritage.walk();
        for clause in heritage.children(&mut cursor) {
            match clause.kind() {
                "extends_clause" | "implements_clause" => {
                    let mut inner = clause.walk();
                    for base in clause.named_children(&mut inner) {
                        if base.kind() == "type_arguments" {
                            continue;
                        }
                        class.bases.push(node_text(base, content).into());
                    }
                }
                _ => {}
            }
        }
    }

    if let Some(body) = node.child_by_field_name("body") {
        let mut cursor = body.walk();
        for member in body.named_children(&mut cursor) {
            match member.kind() {
                "method_definition" | "method_signature" | "abstract_method_signature" => {
                    if let Some(method_name) = member.child_by_field_name("name") {
                        let sig = callable_signature(
                            member,
                            content,
                            node_text(method_name, content).into(),
                            Scope::Class(name.clone()),
                        );
                        class.methods.push(sig.clone());
                        signatures.push(sig);
                    }
                }
                "public_field_definition" | "field_definition" => {
                    if let Some(attr) = field_attribute(member, content) {
                        class.push_attribute(attr);
                    }
                }
                _ => {}
            }
        }
    }

    Some(class)
}

/// Interfaces are recorded as attribute-bearing class definitions:
/// property signatures become attributes, method signatures methods.
fn interface_definition(
    node: Node,
    content: &str,
    signatures: &mut Vec<FunctionSignature>,
) -> Option<ClassDefinition> {
    let name: CompactString = node_text(node.child_by_field_name("name")?, content).into();
    let mut class = ClassDefinition::new(name.clone(), node.start_position().row + 1);

    if let Some(extends) = find_child_by_kind(node, "extends_type_clause") {
        let mut cursor = extends.walk();
        for base in extends.named_children(&mut cursor) {
            if base.kind() == "type_arguments" {
                continue;
            }
            class.bases.push(node_text(base, content).into());
        }
    }

    if let Some(body) = node.child_by_field_name("body") {
        let mut cursor = body.walk();
        for member in body.named_children(&mut cursor) {
            match member.kind() {
                "property_signature" => {
                    if let Some(prop_name) = member.child_by_field_name("name") {
                        let ty = member
                            .child_by_field_name("type")
                            .map(|n| AttrType::Declared(annotation_text(n, content).into()))
                            .unwrap_or(AttrType::Unknown);
                        class.push_attribute(AttributeDeclaration {
                            name: node_text(prop_name, content).into(),
                            ty,
                            line: member.start_position().row + 1,
                        });
                    }
                }
                "method_signature" => {
                    if let Some(method_name) = member.child_by_field_name("name") {
                        let sig = callable_signature(
                            member,
                            content,
                            node_text(method_name, content).into(),
                            Scope::Class(name.clone()),
                        );
                        class.methods.push(sig.clone());
                        signatures.push(sig);
                    }
                }
                _ => {}
            }
        }
    }

    Some(class)
}

fn field_attribute(node: Node, content: &str) -> Option<AttributeDeclaration> {
    let name = node.child_by_field_name("name")?;
    let ty = if let Some(annotation) = node.child_by_field_name("type") {
        AttrType::Declared(annotation_text(annotation, content).into())
    } else if let Some(value) = node.child_by_field_name("value") {
        match classify_literal(value, content) {
            Some(kind) => AttrType::Inferred(kind),
            None => AttrType::Unknown,
        }
    } else {
        AttrType::Unknown
    };
    Some(AttributeDeclaration {
        name: node_text(name, content).into(),
        ty,
        line: node.start_position().row + 1,
    })
}

fn classify_literal(node: Node, content: &str) -> Option<LiteralKind> {
    match node.kind() {
        "string" | "template_string" => Some(LiteralKind::Str),
        "number" => {
            let text = node_text(node, content);
            if text.starts_with("0x")
                || text.starts_with("0X")
                || text.starts_with("0o")
                || text.starts_with("0b")
            {
                Some(LiteralKind::Int)
            } else if text.contains(['.', 'e', 'E']) {
                Some(LiteralKind::Float)
            } else {
                Some(LiteralKind::Int)
            }
        }
        "true" | "false" => Some(LiteralKind::Bool),
        "array" => Some(LiteralKind::Seq),
        "object" => Some(LiteralKind::Map),
        "null" | "undefined" => Some(LiteralKind::None),
        "unary_expression" => node
            .child_by_field_name("argument")
            .and_then(|n| classify_literal(n, content)),
        _ => None,
    }
}

/// `": number"` annotation text without the leading colon.
fn annotation_text<'a>(node: Node, content: &'a str) -> &'a str {
    node_text(node, content).trim_start_matches(':').trim()
}

fn string_value<'a>(node: Node, content: &'a str) -> &'a str {
    node_text(node, content).trim_matches(&['"', '\'', '`'][..])
}

/// `require("module")` on a declarator initializer.
fn require_source(value: Node, content: &str) -> Option<CompactString> {
    if value.kind() != "call_expression" {
        return None;
    }
    let function = value.child_by_field_name("function")?;
    if node_text(function, content) != "require" {
        return None;
    }
    let arguments = value.child_by_field_name("arguments")?;
    let first = arguments.named_child(0)?;
    if first.kind() != "string" {
        return None;
    }
    Some(string_value(first, content).into())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract_ts(code: &str) -> Extraction {
        extract(code, Language::TypeScript).unwrap()
    }

    #[test]
    fn typed_function() {
        let code = "export function add(a: number, b: number = 1): number {\n  return a + b;\n}\n";
        let (sigs, _, _) = extract_ts(code);
        assert_eq!(sigs.len(), 1);

        let f = &sigs[0];
        assert_eq!(f.name, "add");
        assert_eq!(f.params[0].ty.as_deref(), Some("number"));
        assert!(!f.params[0].has_default);
        assert!(f.params[1].has_default);
        assert_eq!(f.returns.as_deref(), Some("number"));
        assert_eq!(f.prototype(), "add(a: number, b: number) -> number");
    }

    #[test]
    fn arrow_function_bound_to_const() {
        let code = "const handler = async (req: Request): Promise<Response> => fetch(req);\n";
        let (sigs, _, _) = extract_ts(code);
        assert_eq!(sigs.len(), 1);
        assert_eq!(sigs[0].name, "handler");
        assert!(sigs[0].is_async);
        assert_eq!(sigs[0].returns.as_deref(), Some("Promise<Response>"));
    }

    #[test]
    fn anonymous_default_export() {
        let code = "export default (x) => x * 2;\n";
        let (sigs, _, _) = extract_ts(code);
        assert_eq!(sigs.len(), 1);
        assert_eq!(sigs[0].name, "<anonymous>");
    }

    #[test]
    fn class_with_bases_fields_and_methods() {
        let code = r#"
export class Widget extends Component implements Drawable {
  width: number = 0;
  label = "empty";
  hidden = false;

  draw(ctx: Context): void {}
  resize(w: number, h: number) {}
}
"#;
        let (sigs, classes, _) = extract_ts(code);
        let class = &classes[0];
        assert_eq!(class.name, "Widget");

        let bases: Vec<&str> = class.bases.iter().map(|b| b.as_str()).collect();
        assert_eq!(bases, ["Component", "Drawable"]);

        let attrs: Vec<(&str, AttrType)> = class
            .attributes
            .iter()
            .map(|a| (a.name.as_str(), a.ty.clone()))
            .collect();
        assert_eq!(
            attrs,
            [
                ("width", AttrType::Declared("number".into())),
                ("label", AttrType::Inferred(LiteralKind::Str)),
                ("hidden", AttrType::Inferred(LiteralKind::Bool)),
            ]
        );

        let methods: Vec<&str> = class.methods.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(methods, ["draw", "resize"]);
        assert_eq!(sigs[0].prototype(), "Widget.draw(ctx: Context) -> void");
    }

    #[test]
    fn interface_members() {
        let code = r#"
interface Shape extends Base {
  area: number;
  name: string;
  scale(factor: number): Shape;
}
"#;
        let (_, classes, _) = extract_ts(code);
        let class = &classes[0];
        assert_eq!(class.name, "Shape");
        assert_eq!(class.bases.len(), 1);
        assert_eq!(class.attributes.len(), 2);
        assert_eq!(class.attributes[0].name, "area");
        assert_eq!(
            class.attributes[1].ty,
            AttrType::Declared("string".into())
        );
        assert_eq!(class.methods.len(), 1);
        assert_eq!(class.methods[0].name, "scale");
    }

    #[test]
    fn imports_and_requires() {
        let code = r#"
import { useState } from "react";
import fs from "node:fs";
const path = require("path");
"#;
        let (_, _, deps) = extract_ts(code);
        assert_eq!(deps, ["react", "node:fs", "path"]);
    }

    #[test]
    fn syntax_error_is_reported() {
        let err = extract("function broken( {", Language::TypeScript).unwrap_err();
        assert_eq!(err.message, "invalid syntax");
    }

    #[test]
    fn number_literal_kinds() {
        let code = "class N {\n  a = 1;\n  b = 1.5;\n  c = 1e3;\n  d = 0xff;\n}\n";
        let (_, classes, _) = extract_ts(code);
        let kinds: Vec<AttrType> = classes[0].attributes.iter().map(|a| a.ty.clone()).collect();
        assert_eq!(
            kinds,
            [
                AttrType::Inferred(LiteralKind::Int),
                AttrType::Inferred(LiteralKind::Float),
                AttrType::Inferred(LiteralKind::Float),
                AttrType::Inferred(LiteralKind::Int),
            ]
        );
    }
}
