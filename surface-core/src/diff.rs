//! Three-way partition of two API models.

use crate::model::{ApiFunction, ApiInterface, ApiModel, ApiStruct};
use std::cmp::Ordering;

/// Result of comparing two API models. `left` holds items only present in
/// the left (previous) model, `right` items only present in the right
/// (current) one, `equal` the common surface.
#[derive(Debug, Clone, Default)]
pub struct Diff {
    pub left: ApiModel,
    pub equal: ApiModel,
    pub right: ApiModel,
}

impl Diff {
    /// Partition two models. Both sides are sorted with the model
    /// comparators before the merge walk, so input order never matters.
    pub fn compare(left: &ApiModel, right: &ApiModel) -> Diff {
        let mut left = left.clone();
        left.sort();
        let mut right = right.clone();
        right.sort();

        let (lv, ev, rv) = merge_partition(&left.values, &right.values, |a, b| a.cmp(b));
        let (ls, es, rs) = merge_partition(&left.structs, &right.structs, ApiStruct::compare);
        let (lf, ef, rf) = merge_partition(&left.functions, &right.functions, ApiFunction::compare);
        let (li, ei, ri) =
            merge_partition(&left.interfaces, &right.interfaces, ApiInterface::compare);

        Diff {
            left: ApiModel {
                values: lv,
                structs: ls,
                functions: lf,
                interfaces: li,
                config_struct_name: None,
            },
            equal: ApiModel {
                values: ev,
                structs: es,
                functions: ef,
                interfaces: ei,
                config_struct_name: None,
            },
            right: ApiModel {
                values: rv,
                structs: rs,
                functions: rf,
                interfaces: ri,
                config_struct_name: None,
            },
        }
    }

    /// True when the two models share their entire surface.
    pub fn is_unchanged(&self) -> bool {
        self.left.is_empty() && self.right.is_empty()
    }

    /// Render the policy report: `missing …` lines for left-only items
    /// when removals are errors, `new …` lines for right-only items when
    /// additions are, grouped function/struct/interface/value. `None`
    /// when the selected directions produce no lines.
    pub fn error(&self, error_on_addition: bool, error_on_removal: bool) -> Option<String> {
        let mut lines = Vec::new();
        if error_on_removal {
            report_side(&self.left, "missing", &mut lines);
        }
        if error_on_addition {
            report_side(&self.right, "new", &mut lines);
        }
        if lines.is_empty() {
            None
        } else {
            Some(lines.join("\n"))
        }
    }
}

fn report_side(model: &ApiModel, label: &str, lines: &mut Vec<String>) {
    for f in &model.functions {
        lines.push(format!("{} function {}", label, f.label()));
    }
    for s in &model.structs {
        lines.push(format!("{} struct {}", label, s.name));
    }
    for i in &model.interfaces {
        lines.push(format!("{} interface {}", label, i.name));
    }
    for v in &model.values {
        lines.push(format!("{} value {}", label, v));
    }
}

/// Merge step over two sorted sequences: equal heads collapse into the
/// common output, the smaller head goes to its own side. O(n+m).
fn merge_partition<T: Clone>(
    left: &[T],
    right: &[T],
    cmp: impl Fn(&T, &T) -> Ordering,
) -> (Vec<T>, Vec<T>, Vec<T>) {
    let mut left_only = Vec::new();
    let mut equal = Vec::new();
    let mut right_only = Vec::new();
    let mut l = 0;
    let mut r = 0;
    while l < left.len() && r < right.len() {
        match cmp(&left[l], &right[r]) {
            Ordering::Equal => {
                equal.push(left[l].clone());
                l += 1;
                r += 1;
            }
            Ordering::Less => {
                left_only.push(left[l].clone());
                l += 1;
            }
            Ordering::Greater => {
                right_only.push(right[r].clone());
                r += 1;
            }
        }
    }
    left_only.extend(left[l..].iter().cloned());
    right_only.extend(right[r..].iter().cloned());
    (left_only, equal, right_only)
}
