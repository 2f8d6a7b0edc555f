//! Normalized model of a package's public surface.
//!
//! An [`ApiModel`] is built once by extraction (or loaded from a JSON
//! snapshot) and never mutated afterwards. The comparators defined here
//! drive both sorting and the diff partition, so their order is part of
//! the snapshot compatibility contract.

use crate::Result;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::path::Path;

/// An identifier is exported when its first character is uppercase.
pub fn is_exported(name: &str) -> bool {
    name.chars().next().map(char::is_uppercase).unwrap_or(false)
}

/// A function or method of the public surface.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiFunction {
    pub name: String,
    /// Rendered receiver type; empty for free functions.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub receiver: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub return_types: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub type_params: Vec<String>,
}

impl ApiFunction {
    /// Order: name, receiver, return types, type params, params.
    pub fn compare(&self, other: &Self) -> Ordering {
        self.name
            .cmp(&other.name)
            .then_with(|| self.receiver.cmp(&other.receiver))
            .then_with(|| self.return_types.cmp(&other.return_types))
            .then_with(|| self.type_params.cmp(&other.type_params))
            .then_with(|| self.params.cmp(&other.params))
    }

    /// Label used in diff reports.
    pub fn label(&self) -> String {
        if self.receiver.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.receiver, self.name)
        }
    }
}

/// A single struct field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructField {
    /// Empty for embedded fields.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    /// Rendered type with one layer of pointer/slice/map wrapper stripped.
    #[serde(rename = "type")]
    pub field_type: String,
    /// Raw tag content, without the surrounding backquotes.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub tag: String,
    /// True when the defining struct itself is unexported.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub internal: bool,
}

impl StructField {
    pub fn label(&self) -> String {
        format!("{} {}", self.name, self.field_type)
    }

    pub fn is_exported(&self) -> bool {
        is_exported(&self.name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiStruct {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<StructField>,
}

impl ApiStruct {
    /// Order: name, then fields element-wise as `Name Type` renders.
    pub fn compare(&self, other: &Self) -> Ordering {
        self.name
            .cmp(&other.name)
            .then_with(|| compare_by(&self.fields, &other.fields, |a, b| a.label().cmp(&b.label())))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiInterface {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub methods: Vec<ApiFunction>,
}

impl ApiInterface {
    /// Order: name, then methods element-wise.
    pub fn compare(&self, other: &Self) -> Ordering {
        self.name
            .cmp(&other.name)
            .then_with(|| compare_by(&self.methods, &other.methods, ApiFunction::compare))
    }
}

/// The extracted surface of one package.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiModel {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub structs: Vec<ApiStruct>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub functions: Vec<ApiFunction>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub interfaces: Vec<ApiInterface>,
    /// Struct returned by the package's configuration factory, when one
    /// exists. Not part of the persisted snapshot.
    #[serde(skip)]
    pub config_struct_name: Option<String>,
}

impl ApiModel {
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
            && self.structs.is_empty()
            && self.functions.is_empty()
            && self.interfaces.is_empty()
    }

    /// Sort all four collections with the diff comparators.
    pub fn sort(&mut self) {
        self.values.sort();
        self.structs.sort_by(|a, b| a.compare(b));
        self.functions.sort_by(|a, b| a.compare(b));
        self.interfaces.sort_by(|a, b| a.compare(b));
    }

    pub fn struct_named(&self, name: &str) -> Option<&ApiStruct> {
        self.structs.iter().find(|s| s.name == name)
    }

    /// Load a persisted snapshot; a missing file is the empty model.
    pub fn load_snapshot(path: &Path) -> Result<ApiModel> {
        if !path.exists() {
            return Ok(ApiModel::default());
        }
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Write the snapshot as 2-space-indented JSON.
    pub fn write_snapshot(&self, path: &Path) -> Result<()> {
        let mut json = serde_json::to_string_pretty(self)?;
        json.push('\n');
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn to_pretty_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Element-wise comparison, shorter sequence first on a common prefix.
pub(crate) fn compare_by<T>(
    left: &[T],
    right: &[T],
    cmp: impl Fn(&T, &T) -> Ordering,
) -> Ordering {
    for (a, b) in left.iter().zip(right) {
        let ord = cmp(a, b);
        if ord != Ordering::Equal {
            return ord;
        }
    }
    left.len().cmp(&right.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn func(name: &str, params: &[&str], type_params: &[&str]) -> ApiFunction {
        ApiFunction {
            name: name.to_string(),
            params: params.iter().map(|s| s.to_string()).collect(),
            type_params: type_params.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_function_order_tie_breaks() {
        let a = func("MyFn", &["foo", "bar"], &["string"]);
        let b = func("MyFn", &["foo", "bar"], &["string", "bool"]);
        // Type params break the tie before params are consulted.
        assert_eq!(a.compare(&b), Ordering::Less);
        assert_eq!(b.compare(&a), Ordering::Greater);
        assert_eq!(a.compare(&a.clone()), Ordering::Equal);
    }

    #[test]
    fn test_receiver_orders_before_return_types() {
        let mut a = func("Do", &[], &[]);
        a.receiver = "Alpha".to_string();
        a.return_types = vec!["z".to_string()];
        let mut b = func("Do", &[], &[]);
        b.receiver = "Beta".to_string();
        b.return_types = vec!["a".to_string()];
        assert_eq!(a.compare(&b), Ordering::Less);
    }

    #[test]
    fn test_struct_order_uses_field_labels() {
        let one = ApiStruct {
            name: "S".to_string(),
            fields: vec![StructField {
                name: "A".to_string(),
                field_type: "int".to_string(),
                ..Default::default()
            }],
        };
        let two = ApiStruct {
            name: "S".to_string(),
            fields: vec![StructField {
                name: "A".to_string(),
                field_type: "string".to_string(),
                ..Default::default()
            }],
        };
        assert_eq!(one.compare(&two), Ordering::Less);
    }

    #[test]
    fn test_sort_is_stable_input_order_independent() {
        let mut model = ApiModel {
            values: vec!["Zeta".to_string(), "Alpha".to_string()],
            functions: vec![func("B", &[], &[]), func("A", &[], &[])],
            ..Default::default()
        };
        model.sort();
        assert_eq!(model.values, vec!["Alpha", "Zeta"]);
        assert_eq!(model.functions[0].name, "A");
    }

    #[test]
    fn test_snapshot_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("api.json");
        let model = ApiModel {
            values: vec!["DefaultTimeout".to_string()],
            functions: vec![func("NewFactory", &[], &[])],
            config_struct_name: Some("Config".to_string()),
            ..Default::default()
        };
        model.write_snapshot(&path).unwrap();

        let loaded = ApiModel::load_snapshot(&path).unwrap();
        assert_eq!(loaded.values, model.values);
        assert_eq!(loaded.functions, model.functions);
        // The factory result is not persisted.
        assert_eq!(loaded.config_struct_name, None);
    }

    #[test]
    fn test_missing_snapshot_is_empty_model() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = ApiModel::load_snapshot(&dir.path().join("absent.json")).unwrap();
        assert!(loaded.is_empty());
    }

    #[test]
    fn test_snapshot_uses_two_space_indent() {
        let model = ApiModel {
            values: vec!["A".to_string()],
            ..Default::default()
        };
        let json = model.to_pretty_json().unwrap();
        assert!(json.contains("\n  \"values\""));
    }
}
