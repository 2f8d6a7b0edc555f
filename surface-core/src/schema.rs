//! Configuration schema derivation and comparison.
//!
//! The schema of a configuration struct is derived from its
//! `mapstructure` field tags: squashed fields splice their struct's
//! properties into the parent, overridden type names become schema
//! references, everything else maps through the primitive table or
//! recurses into the struct table.

use crate::error::SurfaceError;
use crate::model::{ApiModel, ApiStruct};
use crate::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// A JSON-Schema-shaped description of a configuration struct.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    #[serde(rename = "type", default, skip_serializing_if = "Vec::is_empty")]
    pub types: Vec<String>,
    #[serde(rename = "$ref", default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, Schema>,
    #[serde(rename = "allOf", default, skip_serializing_if = "Vec::is_empty")]
    pub all_of: Vec<Schema>,
}

impl Schema {
    fn primitive(kinds: &[&str]) -> Schema {
        Schema {
            types: kinds.iter().map(|k| k.to_string()).collect(),
            ..Default::default()
        }
    }

    fn reference(target: &str) -> Schema {
        Schema {
            reference: Some(target.to_string()),
            ..Default::default()
        }
    }

    /// Load a committed schema file.
    pub fn load(path: &Path) -> Result<Schema> {
        if !path.exists() {
            return Err(SurfaceError::SchemaMissing(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn to_pretty_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Derive the schema of a configuration struct against the package's
/// struct table. Every derivation problem is collected; the error joins
/// all of them.
pub fn derive_schema(
    config_struct: &ApiStruct,
    model: &ApiModel,
    overrides: &BTreeMap<String, String>,
) -> Result<Schema> {
    let mut visited = Vec::new();
    let mut errors = Vec::new();
    let schema = derive_struct(config_struct, model, overrides, &mut visited, &mut errors);
    if errors.is_empty() {
        Ok(schema)
    } else {
        Err(SurfaceError::SchemaDerive(errors.join("\n")))
    }
}

fn derive_struct(
    current: &ApiStruct,
    model: &ApiModel,
    overrides: &BTreeMap<String, String>,
    visited: &mut Vec<String>,
    errors: &mut Vec<String>,
) -> Schema {
    visited.push(current.name.clone());
    let mut schema = Schema::default();
    for field in &current.fields {
        let Some(tag) = mapstructure_tag(&field.tag) else {
            continue;
        };
        if tag.squash {
            let type_name = &field.field_type;
            if let Some(target) = overrides.get(type_name) {
                schema.all_of.push(Schema::reference(target));
            } else if let Some(inner) = model.struct_named(type_name) {
                if visited.contains(&inner.name) {
                    errors.push(format!(
                        "struct {}: squash cycle through {}",
                        current.name, inner.name
                    ));
                } else {
                    let nested = derive_struct(inner, model, overrides, visited, errors);
                    schema.properties.extend(nested.properties);
                    schema.all_of.extend(nested.all_of);
                }
            } else {
                errors.push(format!(
                    "struct {}: squashed field references unknown struct {}",
                    current.name, type_name
                ));
            }
            continue;
        }

        let key = if tag.name.is_empty() {
            field.name.to_lowercase()
        } else {
            tag.name
        };
        let property = match field.field_type.as_str() {
            "string" => Schema::primitive(&["string"]),
            "bool" => Schema::primitive(&["boolean"]),
            "int" => Schema::primitive(&["integer"]),
            "[]string" => Schema::primitive(&["array", "string"]),
            other => {
                if let Some(target) = overrides.get(other) {
                    let reference = Schema::reference(target);
                    schema.all_of.push(reference.clone());
                    reference
                } else if let Some(inner) = model.struct_named(other) {
                    if visited.contains(&inner.name) {
                        errors.push(format!(
                            "struct {}: field {} cycles through {}",
                            current.name, key, inner.name
                        ));
                        Schema::default()
                    } else {
                        derive_struct(inner, model, overrides, visited, errors)
                    }
                } else {
                    errors.push(format!(
                        "struct {}: field {} has unmapped type {}",
                        current.name, key, other
                    ));
                    Schema::default()
                }
            }
        };
        schema.properties.insert(key, property);
    }
    visited.pop();
    schema
}

struct TagInfo {
    name: String,
    squash: bool,
}

/// Parse the `mapstructure` key out of a raw field tag. `None` when the
/// tag carries no mapstructure key at all.
fn mapstructure_tag(raw: &str) -> Option<TagInfo> {
    let value = raw
        .split_whitespace()
        .find_map(|part| part.strip_prefix("mapstructure:"))?;
    let value = value.trim_matches('"');
    let mut parts = value.split(',');
    let name = parts.next().unwrap_or_default().to_string();
    let squash = parts.any(|option| option == "squash");
    Some(TagInfo { name, squash })
}

/// Compare a committed schema against a freshly derived one. Every
/// mismatch is collected; nothing short-circuits.
pub fn compare_schemas(before: &Schema, after: &Schema) -> Result<()> {
    let mut mismatches = Vec::new();
    compare_inner(before, after, "", &mut mismatches);
    if mismatches.is_empty() {
        Ok(())
    } else {
        Err(SurfaceError::SchemaMismatch(mismatches.join("\n")))
    }
}

fn compare_inner(before: &Schema, after: &Schema, path: &str, out: &mut Vec<String>) {
    if before.properties.is_empty() && after.properties.is_empty() {
        return;
    }
    if before.properties.len() != after.properties.len() {
        out.push(format!(
            "{}field count mismatch: {} before, {} after",
            context(path),
            before.properties.len(),
            after.properties.len()
        ));
    }
    for (name, b) in &before.properties {
        let full = join_path(path, name);
        match after.properties.get(name) {
            None => out.push(format!("missing field {}", full)),
            Some(a) => {
                if b.types != a.types {
                    out.push(format!("field {}: type changed", full));
                }
                if b.reference != a.reference {
                    out.push(format!("field {}: reference changed", full));
                }
                compare_inner(b, a, &full, out);
            }
        }
    }
    if before.all_of.len() != after.all_of.len() {
        out.push(format!(
            "{}allOf length mismatch: {} before, {} after",
            context(path),
            before.all_of.len(),
            after.all_of.len()
        ));
    } else {
        for (index, (b, a)) in before.all_of.iter().zip(&after.all_of).enumerate() {
            if b.reference != a.reference {
                out.push(format!("{}allOf[{}]: reference changed", context(path), index));
            }
        }
    }
}

fn join_path(path: &str, name: &str) -> String {
    if path.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", path, name)
    }
}

fn context(path: &str) -> String {
    if path.is_empty() {
        String::new()
    } else {
        format!("{}: ", path)
    }
}
