//! Package API extraction from Go source files.

use crate::config::Config;
use crate::error::SurfaceError;
use crate::model::{is_exported, ApiFunction, ApiInterface, ApiModel, ApiStruct, StructField};
use crate::render::{self, node_text, TypeExpr};
use crate::Result;
use globset::{Glob, GlobSet, GlobSetBuilder};
use regex::Regex;
use std::path::{Path, PathBuf};
use tree_sitter::{Node, Parser};

/// Options governing a single package extraction.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Exported free functions matching any pattern are not part of the
    /// surface. Matched as a search, not a full match.
    pub ignored_functions: Vec<Regex>,
    /// Files whose base name matches are skipped entirely.
    pub excluded_files: GlobSet,
    /// Rendered return type marking the configuration factory.
    pub factory_return_type: String,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            ignored_functions: Vec::new(),
            excluded_files: GlobSet::empty(),
            factory_return_type: "component.Config".to_string(),
        }
    }
}

impl ExtractOptions {
    /// Compile the matchers declared in a [`Config`].
    pub fn from_config(config: &Config) -> Result<Self> {
        let mut builder = GlobSetBuilder::new();
        for pattern in &config.ignore.files {
            builder.add(Glob::new(pattern).map_err(|e| SurfaceError::GlobPattern(e.to_string()))?);
        }
        let excluded_files = builder
            .build()
            .map_err(|e| SurfaceError::GlobPattern(e.to_string()))?;
        let ignored_functions = config
            .ignore
            .functions
            .iter()
            .map(|pattern| Regex::new(pattern))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(Self {
            ignored_functions,
            excluded_files,
            factory_return_type: config.factory.return_type.clone(),
        })
    }
}

/// Build the API model for one package from its source files.
///
/// Collection order is declaration order; callers sort before comparing.
/// A file that fails to parse aborts the whole package.
pub fn extract_package(files: &[PathBuf], options: &ExtractOptions) -> Result<ApiModel> {
    let mut model = ApiModel::default();
    for path in files {
        let base = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
        if options.excluded_files.is_match(base) {
            tracing::debug!(file = %path.display(), "skipping excluded file");
            continue;
        }
        let source = std::fs::read_to_string(path)?;
        extract_file(path, &source, options, &mut model)?;
    }
    Ok(model)
}

fn extract_file(
    path: &Path,
    source: &str,
    options: &ExtractOptions,
    model: &mut ApiModel,
) -> Result<()> {
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_go::LANGUAGE.into())
        .map_err(|e| SurfaceError::SourceParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
    let tree = parser
        .parse(source, None)
        .ok_or_else(|| SurfaceError::SourceParse {
            path: path.to_path_buf(),
            message: "tree-sitter produced no tree".to_string(),
        })?;
    let root = tree.root_node();
    if root.has_error() {
        return Err(SurfaceError::SourceParse {
            path: path.to_path_buf(),
            message: "syntax errors in source".to_string(),
        });
    }

    let mut cursor = root.walk();
    for child in root.children(&mut cursor) {
        match child.kind() {
            "var_declaration" | "const_declaration" => {
                collect_values(&child, source, &mut model.values);
            }
            "type_declaration" => collect_types(&child, source, model)?,
            "function_declaration" => collect_function(&child, source, options, model)?,
            "method_declaration" => collect_method(&child, source, model)?,
            _ => {}
        }
    }
    Ok(())
}

fn collect_values(node: &Node, source: &str, values: &mut Vec<String>) {
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        match child.kind() {
            "var_spec" | "const_spec" => collect_spec_names(&child, source, values),
            "var_spec_list" | "const_spec_list" => {
                let mut inner = child.walk();
                for spec in child.named_children(&mut inner) {
                    if matches!(spec.kind(), "var_spec" | "const_spec") {
                        collect_spec_names(&spec, source, values);
                    }
                }
            }
            _ => {}
        }
    }
}

fn collect_spec_names(spec: &Node, source: &str, values: &mut Vec<String>) {
    let mut cursor = spec.walk();
    for name in spec.children_by_field_name("name", &mut cursor) {
        let text = node_text(&name, source);
        if is_exported(&text) {
            values.push(text);
        }
    }
}

fn collect_types(node: &Node, source: &str, model: &mut ApiModel) -> Result<()> {
    let mut cursor = node.walk();
    for spec in node.named_children(&mut cursor) {
        if !matches!(spec.kind(), "type_spec" | "type_alias") {
            continue;
        }
        let Some(name_node) = spec.child_by_field_name("name") else {
            continue;
        };
        let name = node_text(&name_node, source);
        let Some(ty) = spec.child_by_field_name("type") else {
            continue;
        };
        match ty.kind() {
            "struct_type" => model.structs.push(extract_struct(name, ty, source)?),
            "interface_type" if is_exported(&name) => {
                model.interfaces.push(extract_interface(name, ty, source)?);
            }
            _ => {}
        }
    }
    Ok(())
}

fn extract_struct(name: String, node: Node, source: &str) -> Result<ApiStruct> {
    let internal = !is_exported(&name);
    let mut fields = Vec::new();
    let mut cursor = node.walk();
    for list in node.named_children(&mut cursor) {
        if list.kind() != "field_declaration_list" {
            continue;
        }
        let mut list_cursor = list.walk();
        for decl in list.named_children(&mut list_cursor) {
            if decl.kind() != "field_declaration" {
                continue;
            }
            let Some(ty_node) = decl.child_by_field_name("type") else {
                continue;
            };
            let tag = decl
                .child_by_field_name("tag")
                .map(|t| strip_tag(&node_text(&t, source)))
                .unwrap_or_default();
            let rendered = render::render(&unwrap_field_type(render::lower(ty_node, source)?));

            let mut names_cursor = decl.walk();
            let names: Vec<String> = decl
                .children_by_field_name("name", &mut names_cursor)
                .map(|n| node_text(&n, source))
                .collect();
            if names.is_empty() {
                // Embedded field
                fields.push(StructField {
                    name: String::new(),
                    field_type: rendered,
                    tag,
                    internal,
                });
            } else {
                for field_name in names {
                    fields.push(StructField {
                        name: field_name,
                        field_type: rendered.clone(),
                        tag: tag.clone(),
                        internal,
                    });
                }
            }
        }
    }
    Ok(ApiStruct { name, fields })
}

/// Strip one layer of pointer/slice/map wrapper down to the element type.
/// A pointer directly under the slice or map is stripped as well; deeper
/// nesting is left as rendered.
fn unwrap_field_type(expr: TypeExpr) -> TypeExpr {
    match expr {
        TypeExpr::Pointer(inner) => *inner,
        TypeExpr::Array { length, element } if *length == TypeExpr::Empty => {
            strip_pointer(*element)
        }
        TypeExpr::Map { value, .. } => strip_pointer(*value),
        other => other,
    }
}

fn strip_pointer(expr: TypeExpr) -> TypeExpr {
    match expr {
        TypeExpr::Pointer(inner) => *inner,
        other => other,
    }
}

fn strip_tag(raw: &str) -> String {
    let trimmed = raw.trim();
    if let Some(inner) = trimmed
        .strip_prefix('`')
        .and_then(|s| s.strip_suffix('`'))
    {
        return inner.to_string();
    }
    if let Some(inner) = trimmed
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
    {
        return inner.to_string();
    }
    trimmed.to_string()
}

fn extract_interface(name: String, node: Node, source: &str) -> Result<ApiInterface> {
    let mut methods = Vec::new();
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        // Embedded interfaces are not function-shaped and stay out of the
        // method list.
        if !matches!(child.kind(), "method_elem" | "method_spec") {
            continue;
        }
        let Some(name_node) = child.child_by_field_name("name") else {
            continue;
        };
        methods.push(ApiFunction {
            name: node_text(&name_node, source),
            receiver: String::new(),
            params: rendered_groups(child.child_by_field_name("parameters"), source)?,
            return_types: rendered_result(child.child_by_field_name("result"), source)?,
            type_params: Vec::new(),
        });
    }
    Ok(ApiInterface { name, methods })
}

fn collect_function(
    node: &Node,
    source: &str,
    options: &ExtractOptions,
    model: &mut ApiModel,
) -> Result<()> {
    let Some(name_node) = node.child_by_field_name("name") else {
        return Ok(());
    };
    let name = node_text(&name_node, source);
    if !is_exported(&name) {
        return inspect_factory(node, source, options, model);
    }
    if options.ignored_functions.iter().any(|re| re.is_match(&name)) {
        tracing::debug!(function = %name, "ignoring function by pattern");
        return Ok(());
    }
    model.functions.push(ApiFunction {
        name,
        receiver: String::new(),
        params: rendered_groups(node.child_by_field_name("parameters"), source)?,
        return_types: rendered_result(node.child_by_field_name("result"), source)?,
        type_params: rendered_type_params(node.child_by_field_name("type_parameters"), source)?,
    });
    Ok(())
}

fn collect_method(node: &Node, source: &str, model: &mut ApiModel) -> Result<()> {
    let Some(receiver) = node.child_by_field_name("receiver") else {
        return Ok(());
    };
    let Some(receiver_type) = receiver_type_node(&receiver) else {
        return Ok(());
    };
    if !is_exported(&receiver_base_name(receiver_type, source)) {
        return Ok(());
    }
    let Some(name_node) = node.child_by_field_name("name") else {
        return Ok(());
    };
    model.functions.push(ApiFunction {
        name: node_text(&name_node, source),
        receiver: render::render(&render::lower(receiver_type, source)?),
        params: rendered_groups(node.child_by_field_name("parameters"), source)?,
        return_types: rendered_result(node.child_by_field_name("result"), source)?,
        type_params: Vec::new(),
    });
    Ok(())
}

fn receiver_type_node<'a>(receiver: &Node<'a>) -> Option<Node<'a>> {
    let mut cursor = receiver.walk();
    let decl = receiver
        .named_children(&mut cursor)
        .find(|n| n.kind() == "parameter_declaration")?;
    decl.child_by_field_name("type")
}

/// Base type name of a receiver, pointer and type arguments stripped.
fn receiver_base_name(node: Node, source: &str) -> String {
    let mut current = node;
    if current.kind() == "pointer_type" {
        if let Some(inner) = current.named_child(0) {
            current = inner;
        }
    }
    if current.kind() == "generic_type" {
        if let Some(base) = current.child_by_field_name("type") {
            current = base;
        }
    }
    node_text(&current, source)
}

fn rendered_groups(list: Option<Node>, source: &str) -> Result<Vec<String>> {
    match list {
        Some(list) => Ok(render::lower_parameter_groups(list, source)?
            .iter()
            .map(render::render)
            .collect()),
        None => Ok(Vec::new()),
    }
}

fn rendered_result(node: Option<Node>, source: &str) -> Result<Vec<String>> {
    Ok(render::lower_result(node, source)?
        .iter()
        .map(render::render)
        .collect())
}

fn rendered_type_params(list: Option<Node>, source: &str) -> Result<Vec<String>> {
    match list {
        Some(list) => Ok(render::lower_type_parameter_groups(list, source)?
            .iter()
            .map(render::render)
            .collect()),
        None => Ok(Vec::new()),
    }
}

/// Recognize the unexported configuration factory: sole return type
/// renders as the sentinel, final statement returns one of the handful of
/// recognized shapes naming the configuration struct.
fn inspect_factory(
    node: &Node,
    source: &str,
    options: &ExtractOptions,
    model: &mut ApiModel,
) -> Result<()> {
    let results = render::lower_result(node.child_by_field_name("result"), source)?;
    if results.len() != 1 || render::render(&results[0]) != options.factory_return_type {
        return Ok(());
    }
    let Some(body) = node.child_by_field_name("body") else {
        return Ok(());
    };
    let mut last = None;
    let mut cursor = body.walk();
    for child in body.named_children(&mut cursor) {
        if child.kind() != "comment" {
            last = Some(child);
        }
    }
    let Some(stmt) = last else {
        return Err(SurfaceError::FactoryReturn {
            found: "empty body".to_string(),
        });
    };
    if stmt.kind() != "return_statement" {
        return Err(SurfaceError::FactoryReturn {
            found: stmt.kind().to_string(),
        });
    }
    let exprs = stmt
        .named_child(0)
        .filter(|n| n.kind() == "expression_list")
        .ok_or_else(|| SurfaceError::FactoryReturn {
            found: "return without expression".to_string(),
        })?;
    if exprs.named_child_count() != 1 {
        return Err(SurfaceError::FactoryReturn {
            found: format!("return of {} expressions", exprs.named_child_count()),
        });
    }
    let Some(expr) = exprs.named_child(0) else {
        return Err(SurfaceError::FactoryReturn {
            found: "return without expression".to_string(),
        });
    };
    model.config_struct_name = Some(resolve_config_expr(expr, source)?);
    Ok(())
}

fn resolve_config_expr(expr: Node, source: &str) -> Result<String> {
    match expr.kind() {
        "identifier" => Ok(node_text(&expr, source)),
        "unary_expression" => {
            let operator = expr
                .child_by_field_name("operator")
                .map(|op| node_text(&op, source))
                .unwrap_or_default();
            if operator != "&" {
                return Err(SurfaceError::FactoryReturn {
                    found: format!("unary {}", operator),
                });
            }
            let Some(operand) = expr.child_by_field_name("operand") else {
                return Err(SurfaceError::FactoryReturn {
                    found: "unary without operand".to_string(),
                });
            };
            match operand.kind() {
                "identifier" => Ok(node_text(&operand, source)),
                "composite_literal" => composite_type_name(operand, source),
                other => Err(SurfaceError::FactoryReturn {
                    found: format!("&{}", other),
                }),
            }
        }
        "composite_literal" => composite_type_name(expr, source),
        other => Err(SurfaceError::FactoryReturn {
            found: other.to_string(),
        }),
    }
}

/// Local name of a composite literal's type; a qualified name resolves to
/// its final segment.
fn composite_type_name(literal: Node, source: &str) -> Result<String> {
    let Some(ty) = literal.child_by_field_name("type") else {
        return Err(SurfaceError::FactoryReturn {
            found: "composite literal without type".to_string(),
        });
    };
    match ty.kind() {
        "type_identifier" => Ok(node_text(&ty, source)),
        "qualified_type" => {
            let Some(name) = ty.child_by_field_name("name") else {
                return Err(SurfaceError::FactoryReturn {
                    found: "qualified type without name".to_string(),
                });
            };
            Ok(node_text(&name, source))
        }
        other => Err(SurfaceError::FactoryReturn {
            found: format!("composite literal of {}", other),
        }),
    }
}
