//! Python extraction using tree-sitter.
//!
//! Records module-scope functions, classes declared at module scope, and
//! import statements. Functions nested inside other functions are not part
//! of the API surface and are skipped. Class attributes come from annotated
//! or literal class-body assignments, `self.*` assignments in `__init__`,
//! and `@property` methods.

use compact_str::CompactString;
use smallvec::SmallVec;
use tree_sitter::Node;

use super::{
    first_error_position, node_text, push_dependency, with_python_parser, AttrType,
    AttributeDeclaration, ClassDefinition, Extraction, FunctionSignature, LiteralKind, Param,
    ParseFailure, Scope,
};

pub(super) fn extract(content: &str) -> Result<Extraction, ParseFailure> {
    with_python_parser(|parser| {
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
            module_item(child, content, &mut signatures, &mut classes, &mut dependencies);
        }

        Ok((signatures, classes, dependencies))
    })
}

fn module_item(
    node: Node,
    content: &str,
    signatures: &mut Vec<FunctionSignature>,
    classes: &mut Vec<ClassDefinition>,
    dependencies: &mut Vec<CompactString>,
) {
    match node.kind() {
        "import_statement" => {
            let mut cursor = node.walk();
            for child in node.named_children(&mut cursor) {
                match child.kind() {
                    "dotted_name" => {
                        push_dependency(dependencies, node_text(child, content).into());
                    }
                    "aliased_import" => {
                        if let Some(name) = child.child_by_field_name("name") {
                            push_dependency(dependencies, node_text(name, content).into());
                        }
                    }
                    _ => {}
                }
            }
        }
        "import_from_statement" => {
            if let Some(module) = node.child_by_field_name("module_name") {
                push_dependency(dependencies, node_text(module, content).into());
            }
        }
        "future_import_statement" => {
            push_dependency(dependencies, "__future__".into());
        }
        "function_definition" => {
            if let Some(sig) = function_signature(node, content, Scope::Module) {
                signatures.push(sig);
            }
        }
        "class_definition" => {
            if let Some(class) = class_definition(node, content, signatures) {
                classes.push(class);
            }
        }
        "decorated_definition" => {
            if let Some(def) = node.child_by_field_name("definition") {
                module_item(def, content, signatures, classes, dependencies);
            }
        }
        _ => {}
    }
}

fn function_signature(node: Node, content: &str, scope: Scope) -> Option<FunctionSignature> {
    let name = node_text(node.child_by_field_name("name")?, content);
    let is_async = node.children(&mut node.walk()).any(|c| c.kind() == "async");

    let mut params: SmallVec<[Param; 4]> = SmallVec::new();
    if let Some(list) = node.child_by_field_name("parameters") {
        let mut cursor = list.walk();
        for child in list.named_children(&mut cursor) {
            match child.kind() {
                "identifier" | "list_splat_pattern" | "dictionary_splat_pattern" => {
                    params.push(Param::plain(node_text(child, content)));
                }
                "typed_parameter" => {
                    let pattern = child.named_child(0)?;
                    params.push(Param {
                        name: node_text(pattern, content).into(),
                        ty: child
                            .child_by_field_name("type")
                            .map(|n| node_text(n, content).into()),
                        has_default: false,
                    });
                }
                "default_parameter" => {
                    let pattern = child.child_by_field_name("name")?;
                    params.push(Param {
                        name: node_text(pattern, content).into(),
                        ty: None,
                        has_default: true,
                    });
                }
                "typed_default_parameter" => {
                    let pattern = child.child_by_field_name("name")?;
                    params.push(Param {
                        name: node_text(pattern, content).into(),
                        ty: child
                            .child_by_field_name("type")
                            .map(|n| node_text(n, content).into()),
                        has_default: true,
                    });
                }
                // Bare `*` and `/` separators carry no name.
                _ => {}
            }
        }
    }

    Some(FunctionSignature {
        name: name.into(),
        params,
        returns: node
            .child_by_field_name("return_type")
            .map(|n| node_text(n, content).into()),
        scope,
        is_async,
        line: node.start_position().row + 1,
    })
}

fn class_definition(
    node: Node,
    content: &str,
    signatures: &mut Vec<FunctionSignature>,
) -> Option<ClassDefinition> {
    let name = node_text(node.child_by_field_name("name")?, content);
    let mut class = ClassDefinition::new(name, node.start_position().row + 1);

    if let Some(superclasses) = node.child_by_field_name("superclasses") {
        let mut cursor = superclasses.walk();
        for base in superclasses.named_children(&mut cursor) {
            // `metaclass=...` and friends are keyword arguments, not bases.
            if base.kind() == "keyword_argument" || base.kind() == "comment" {
                continue;
            }
            class.bases.push(node_text(base, content).into());
        }
    }

    let class_name = class.name.clone();
    let mut instance_attrs = Vec::new();
    let mut property_attrs = Vec::new();

    if let Some(body) = node.child_by_field_name("body") {
        let mut cursor = body.walk();
        for stmt in body.named_children(&mut cursor) {
            match stmt.kind() {
                "function_definition" => {
                    class_method(stmt, content, &class_name, false, &mut class,
                        signatures, &mut instance_attrs, &mut property_attrs);
                }
                "decorated_definition" => {
                    let is_property = is_property_decorated(stmt, content);
                    if let Some(def) = stmt.child_by_field_name("definition") {
                        if def.kind() == "function_definition" {
                            class_method(def, content, &class_name, is_property,
                                &mut class, signatures, &mut instance_attrs, &mut property_attrs);
                        }
                    }
                }
                "expression_statement" => {
                    if let Some(assign) = stmt.named_child(0).filter(|n| n.kind() == "assignment") {
                        if let Some(attr) = class_body_attribute(assign, content) {
                            class.push_attribute(attr);
                        }
                    }
                }
                _ => {}
            }
        }
    }

    for attr in instance_attrs {
        class.push_attribute(attr);
    }
    for attr in property_attrs {
        class.push_attribute(attr);
    }

    Some(class)
}

#[allow(clippy::too_many_arguments)]
fn class_method(
    node: Node,
    content: &str,
    class_name: &CompactString,
    is_property: bool,
    class: &mut ClassDefinition,
    signatures: &mut Vec<FunctionSignature>,
    instance_attrs: &mut Vec<AttributeDeclaration>,
    property_attrs: &mut Vec<AttributeDeclaration>,
) {
    let Some(sig) = function_signature(node, content, Scope::Class(class_name.clone())) else {
        return;
    };

    if sig.name == "__init__" {
        if let Some(body) = node.child_by_field_name("body") {
            collect_instance_attributes(body, content, instance_attrs);
        }
    }

    if is_property {
        property_attrs.push(AttributeDeclaration {
            name: sig.name.clone(),
            ty: match &sig.returns {
                Some(ret) => AttrType::Declared(ret.clone()),
                None => AttrType::Unknown,
            },
            line: sig.line,
        });
    }

    class.methods.push(sig.clone());
    signatures.push(sig);
}

fn is_property_decorated(node: Node, content: &str) -> bool {
    node.children(&mut node.walk())
        .filter(|c| c.kind() == "decorator")
        .any(|c| {
            let text = node_text(c, content).trim_start_matches('@').trim();
            text == "property" || text.ends_with(".property")
        })
}

fn class_body_attribute(assign: Node, content: &str) -> Option<AttributeDeclaration> {
    let left = assign.child_by_field_name("left")?;
    if left.kind() != "identifier" {
        return None;
    }
    Some(AttributeDeclaration {
        name: node_text(left, content).into(),
        ty: assignment_type(assign, content),
        line: assign.start_position().row + 1,
    })
}

/// `self.<name> = ...` targets anywhere inside `__init__`.
fn collect_instance_attributes(node: Node, content: &str, out: &mut Vec<AttributeDeclaration>) {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.kind() == "assignment" {
            if let Some(attr) = instance_attribute(child, content) {
                out.push(attr);
            }
        }
        collect_instance_attributes(child, content, out);
    }
}

fn instance_attribute(assign: Node, content: &str) -> Option<AttributeDeclaration> {
    let left = assign.child_by_field_name("left")?;
    if left.kind() != "attribute" {
        return None;
    }
    let object = left.child_by_field_name("object")?;
    if object.kind() != "identifier" || node_text(object, content) != "self" {
        return None;
    }
    let name = left.child_by_field_name("attribute")?;
    Some(AttributeDeclaration {
        name: node_text(name, content).into(),
        ty: assignment_type(assign, content),
        line: assign.start_position().row + 1,
    })
}

/// Annotation wins; otherwise classify the assigned literal; otherwise
/// Unknown. Mirrors the declared-or-literal rule exactly.
fn assignment_type(assign: Node, content: &str) -> AttrType {
    if let Some(ty) = assign.child_by_field_name("type") {
        return AttrType::Declared(node_text(ty, content).into());
    }
    if let Some(value) = assign.child_by_field_name("right") {
        return match classify_literal(value) {
            Some(kind) => AttrType::Inferred(kind),
            None => AttrType::Unknown,
        };
    }
    AttrType::Unknown
}

fn classify_literal(node: Node) -> Option<LiteralKind> {
    match node.kind() {
        "string" | "concatenated_string" => Some(LiteralKind::Str),
        "integer" => Some(LiteralKind::Int),
        "float" => Some(LiteralKind::Float),
        "true" | "false" => Some(LiteralKind::Bool),
        "list" | "tuple" | "set" => Some(LiteralKind::Seq),
        "dictionary" => Some(LiteralKind::Map),
        "none" => Some(LiteralKind::None),
        "unary_operator" => node.child_by_field_name("argument").and_then(classify_literal),
        _ => None,
    }
}
