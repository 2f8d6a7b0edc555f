//! Canonical rendering of type expressions.
//!
//! Type expressions are lowered out of the tree-sitter syntax tree into
//! [`TypeExpr`], a closed tagged union, and rendered bottom-up into
//! stable strings. Lowering is the boundary of the known grammar: a node
//! kind outside the closed set aborts extraction instead of degrading
//! into an unstable rendering.

use crate::error::SurfaceError;
use crate::Result;
use tree_sitter::Node;

/// A type expression lowered out of the syntax tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeExpr {
    Pointer(Box<TypeExpr>),
    /// Arrays and slices; a slice has an `Empty` length.
    Array {
        length: Box<TypeExpr>,
        element: Box<TypeExpr>,
    },
    Map {
        key: Box<TypeExpr>,
        value: Box<TypeExpr>,
    },
    /// Struct literal; one entry per field declaration group.
    Struct(Vec<TypeExpr>),
    /// Interface literal; one signature per method.
    Interface(Vec<TypeExpr>),
    Chan(Box<TypeExpr>),
    Function {
        type_params: Vec<TypeExpr>,
        params: Vec<TypeExpr>,
        results: Vec<TypeExpr>,
    },
    Selector {
        qualifier: Box<TypeExpr>,
        name: String,
    },
    Ident(String),
    Literal(String),
    /// Generic instantiation indices. Renders the indices only; the
    /// indexed base is dropped (kept for rendering compatibility).
    Index(Vec<TypeExpr>),
    Ellipsis(Box<TypeExpr>),
    Unary {
        operator: String,
        operand: Box<TypeExpr>,
    },
    /// Renders the operator and left operand only (kept for rendering
    /// compatibility).
    Binary {
        operator: String,
        left: Box<TypeExpr>,
    },
    Paren(Box<TypeExpr>),
    Empty,
}

/// Render a type expression into its canonical string.
pub fn render(expr: &TypeExpr) -> String {
    match expr {
        TypeExpr::Pointer(inner) => format!("*{}", render(inner)),
        TypeExpr::Array { length, element } => {
            format!("[{}]{}", render(length), render(element))
        }
        TypeExpr::Map { key, value } => format!("map[{}]{}", render(key), render(value)),
        TypeExpr::Struct(fields) => format!("{{{}}}", join(fields)),
        TypeExpr::Interface(methods) => {
            let rendered: Vec<String> = methods
                .iter()
                .map(|m| format!("func {}", render(m)))
                .collect();
            format!("{{{}}}", rendered.join(","))
        }
        TypeExpr::Chan(element) => format!("chan({})", render(element)),
        TypeExpr::Function {
            type_params,
            params,
            results,
        } => {
            let mut out = String::from("func");
            if !type_params.is_empty() {
                out.push('[');
                out.push_str(&join(type_params));
                out.push(']');
            }
            out.push('(');
            out.push_str(&join(params));
            out.push(')');
            if !results.is_empty() {
                out.push(' ');
                out.push_str(&join(results));
            }
            out
        }
        TypeExpr::Selector { qualifier, name } => format!("{}.{}", render(qualifier), name),
        TypeExpr::Ident(name) => name.clone(),
        TypeExpr::Literal(text) => text.clone(),
        TypeExpr::Index(indices) => join(indices),
        TypeExpr::Ellipsis(element) => format!("...{}", render(element)),
        TypeExpr::Unary { operator, operand } => format!("{}{}", operator, render(operand)),
        TypeExpr::Binary { operator, left } => format!("{}{}", operator, render(left)),
        TypeExpr::Paren(inner) => format!("({})", render(inner)),
        TypeExpr::Empty => String::new(),
    }
}

fn join(exprs: &[TypeExpr]) -> String {
    exprs.iter().map(render).collect::<Vec<_>>().join(",")
}

pub(crate) fn node_text(node: &Node, source: &str) -> String {
    source[node.start_byte()..node.end_byte()].to_string()
}

/// Lower a syntax node into a [`TypeExpr`].
///
/// Accepts the type and constant-expression node kinds the model covers;
/// anything else is `SurfaceError::UnsupportedType`.
pub fn lower(node: Node, source: &str) -> Result<TypeExpr> {
    match node.kind() {
        "type_identifier" | "identifier" | "field_identifier" | "package_identifier" => {
            Ok(TypeExpr::Ident(node_text(&node, source)))
        }
        "qualified_type" => {
            let package = field(node, "package")?;
            let name = field(node, "name")?;
            Ok(TypeExpr::Selector {
                qualifier: Box::new(lower(package, source)?),
                name: node_text(&name, source),
            })
        }
        "selector_expression" => {
            let operand = field(node, "operand")?;
            let name = field(node, "field")?;
            Ok(TypeExpr::Selector {
                qualifier: Box::new(lower(operand, source)?),
                name: node_text(&name, source),
            })
        }
        "pointer_type" => {
            let inner = named_child(node)?;
            Ok(TypeExpr::Pointer(Box::new(lower(inner, source)?)))
        }
        "slice_type" => Ok(TypeExpr::Array {
            length: Box::new(TypeExpr::Empty),
            element: Box::new(lower(field(node, "element")?, source)?),
        }),
        "array_type" => Ok(TypeExpr::Array {
            length: Box::new(lower(field(node, "length")?, source)?),
            element: Box::new(lower(field(node, "element")?, source)?),
        }),
        "implicit_length_array_type" => Ok(TypeExpr::Array {
            length: Box::new(TypeExpr::Literal("...".to_string())),
            element: Box::new(lower(field(node, "element")?, source)?),
        }),
        "map_type" => Ok(TypeExpr::Map {
            key: Box::new(lower(field(node, "key")?, source)?),
            value: Box::new(lower(field(node, "value")?, source)?),
        }),
        "struct_type" => {
            let mut fields = Vec::new();
            let mut cursor = node.walk();
            for child in node.named_children(&mut cursor) {
                if child.kind() != "field_declaration_list" {
                    continue;
                }
                let mut list_cursor = child.walk();
                for decl in child.named_children(&mut list_cursor) {
                    if decl.kind() != "field_declaration" {
                        continue;
                    }
                    fields.push(lower(field(decl, "type")?, source)?);
                }
            }
            Ok(TypeExpr::Struct(fields))
        }
        "interface_type" => {
            let mut methods = Vec::new();
            let mut cursor = node.walk();
            for child in node.named_children(&mut cursor) {
                match child.kind() {
                    "method_elem" | "method_spec" => {
                        methods.push(lower_signature(
                            child.child_by_field_name("parameters"),
                            child.child_by_field_name("result"),
                            None,
                            source,
                        )?);
                    }
                    "type_elem" => methods.push(lower_type_elem(child, source)?),
                    "type_identifier" | "qualified_type" => {
                        methods.push(lower(child, source)?);
                    }
                    "comment" => {}
                    other => {
                        return Err(SurfaceError::UnsupportedType {
                            kind: other.to_string(),
                        })
                    }
                }
            }
            Ok(TypeExpr::Interface(methods))
        }
        "channel_type" => Ok(TypeExpr::Chan(Box::new(lower(
            field(node, "value")?,
            source,
        )?))),
        "function_type" => lower_signature(
            node.child_by_field_name("parameters"),
            node.child_by_field_name("result"),
            None,
            source,
        ),
        "generic_type" => {
            let arguments = field(node, "type_arguments")?;
            let mut indices = Vec::new();
            let mut cursor = arguments.walk();
            for child in arguments.named_children(&mut cursor) {
                if child.kind() == "comment" {
                    continue;
                }
                indices.push(lower(child, source)?);
            }
            Ok(TypeExpr::Index(indices))
        }
        "parenthesized_type" | "parenthesized_expression" => {
            let inner = named_child(node)?;
            Ok(TypeExpr::Paren(Box::new(lower(inner, source)?)))
        }
        "unary_expression" => {
            let operator = field(node, "operator")?;
            let operand = field(node, "operand")?;
            Ok(TypeExpr::Unary {
                operator: node_text(&operator, source),
                operand: Box::new(lower(operand, source)?),
            })
        }
        "binary_expression" => {
            let operator = field(node, "operator")?;
            let left = field(node, "left")?;
            Ok(TypeExpr::Binary {
                operator: node_text(&operator, source),
                left: Box::new(lower(left, source)?),
            })
        }
        "int_literal" | "float_literal" | "interpreted_string_literal" | "raw_string_literal"
        | "rune_literal" | "iota" => Ok(TypeExpr::Literal(node_text(&node, source))),
        other => Err(SurfaceError::UnsupportedType {
            kind: other.to_string(),
        }),
    }
}

/// Lower a function signature from its parameter/result/type-parameter
/// nodes. Used for function types, interface methods, and declarations.
pub(crate) fn lower_signature(
    parameters: Option<Node>,
    result: Option<Node>,
    type_parameters: Option<Node>,
    source: &str,
) -> Result<TypeExpr> {
    let params = match parameters {
        Some(list) => lower_parameter_groups(list, source)?,
        None => Vec::new(),
    };
    Ok(TypeExpr::Function {
        type_params: match type_parameters {
            Some(list) => lower_type_parameter_groups(list, source)?,
            None => Vec::new(),
        },
        params,
        results: lower_result(result, source)?,
    })
}

/// Lower a parameter list to one expression per declaration group;
/// `a, b string` yields a single entry.
pub(crate) fn lower_parameter_groups(list: Node, source: &str) -> Result<Vec<TypeExpr>> {
    let mut groups = Vec::new();
    let mut cursor = list.walk();
    for child in list.named_children(&mut cursor) {
        match child.kind() {
            "parameter_declaration" => {
                groups.push(lower(field(child, "type")?, source)?);
            }
            "variadic_parameter_declaration" => {
                let element = lower(field(child, "type")?, source)?;
                groups.push(TypeExpr::Ellipsis(Box::new(element)));
            }
            "comment" => {}
            other => {
                return Err(SurfaceError::UnsupportedType {
                    kind: other.to_string(),
                })
            }
        }
    }
    Ok(groups)
}

/// Lower a function result: absent, a bare type, or a parameter list.
pub(crate) fn lower_result(result: Option<Node>, source: &str) -> Result<Vec<TypeExpr>> {
    match result {
        None => Ok(Vec::new()),
        Some(node) if node.kind() == "parameter_list" => lower_parameter_groups(node, source),
        Some(node) => Ok(vec![lower(node, source)?]),
    }
}

/// Lower a type parameter list to one constraint expression per group.
pub(crate) fn lower_type_parameter_groups(list: Node, source: &str) -> Result<Vec<TypeExpr>> {
    let mut groups = Vec::new();
    let mut cursor = list.walk();
    for child in list.named_children(&mut cursor) {
        match child.kind() {
            "type_parameter_declaration" | "parameter_declaration" => {
                groups.push(lower(field(child, "type")?, source)?);
            }
            "comment" => {}
            other => {
                return Err(SurfaceError::UnsupportedType {
                    kind: other.to_string(),
                })
            }
        }
    }
    Ok(groups)
}

/// A type element inside an interface body: an embedded type, or a union
/// that lowers to its operator and first term.
fn lower_type_elem(node: Node, source: &str) -> Result<TypeExpr> {
    let mut terms = Vec::new();
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        if child.kind() == "comment" {
            continue;
        }
        terms.push(lower(child, source)?);
    }
    let mut terms = terms.into_iter();
    let first = terms.next().ok_or_else(|| SurfaceError::UnsupportedType {
        kind: "type_elem".to_string(),
    })?;
    if terms.next().is_some() {
        Ok(TypeExpr::Binary {
            operator: "|".to_string(),
            left: Box::new(first),
        })
    } else {
        Ok(first)
    }
}

fn field<'a>(node: Node<'a>, name: &str) -> Result<Node<'a>> {
    node.child_by_field_name(name)
        .ok_or_else(|| SurfaceError::UnsupportedType {
            kind: format!("{} without {}", node.kind(), name),
        })
}

fn named_child(node: Node) -> Result<Node> {
    node.named_child(0)
        .ok_or_else(|| SurfaceError::UnsupportedType {
            kind: format!("{} without children", node.kind()),
        })
}
