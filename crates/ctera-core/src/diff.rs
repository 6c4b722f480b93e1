//! Attribute differ
//!
//! Computes which desired parameters differ from the remote snapshot. The
//! equality policy decides idempotence for every module:
//!
//! - `null` in desired means "no preference" and is never reported.
//! - Lists compare as multisets, so reordering never triggers an update.
//! - Nested mappings compare key by key with the same policy; a difference
//!   anywhere reports the whole nested value.
//! - A key missing (or `null`) remotely differs from any specified value.

use serde_json::Value;

use crate::params::Parameters;

/// Subset of `desired` whose values differ from `current`.
pub fn modified_attributes(current: &Parameters, desired: &Parameters) -> Parameters {
    desired
        .iter()
        .filter(|(_, wanted)| !wanted.is_null())
        .filter(|(key, wanted)| match current.get_present(key) {
            Some(actual) => !values_equal(actual, wanted),
            None => true,
        })
        .map(|(key, wanted)| (key.clone(), wanted.clone()))
        .collect()
}

/// Whether `actual` satisfies `wanted` under the differ's policy.
///
/// The comparison is driven by `wanted`: nested keys it leaves unset (or sets
/// to `null`) are ignored.
pub fn values_equal(actual: &Value, wanted: &Value) -> bool {
    match (actual, wanted) {
        (Value::Array(a), Value::Array(w)) => multiset_equal(a, w),
        (Value::Object(a), Value::Object(w)) => w
            .iter()
            .filter(|(_, nested)| !nested.is_null())
            .all(|(key, nested)| match a.get(key) {
                Some(found) if !found.is_null() => values_equal(found, nested),
                _ => false,
            }),
        (Value::Number(a), Value::Number(w)) if a.is_f64() || w.is_f64() => {
            match (a.as_f64(), w.as_f64()) {
                (Some(x), Some(y)) => x == y,
                _ => false,
            }
        }
        _ => actual == wanted,
    }
}

/// True when the two lists are not multiset-equal.
pub fn lists_differ(left: &[Value], right: &[Value]) -> bool {
    !multiset_equal(left, right)
}

/// Elements of `left` missing from `right`, and of `right` missing from `left`,
/// counting duplicates.
///
/// Elements are paired by [`values_equal`] with `left` as the actual side. The
/// pairing is a maximum matching, so partially specified mappings in `right`
/// never steal a counterpart another element needs.
pub fn list_difference(left: &[Value], right: &[Value]) -> (Vec<Value>, Vec<Value>) {
    let mut owner: Vec<Option<usize>> = vec![None; right.len()];
    let mut matched = vec![false; left.len()];
    for index in 0..left.len() {
        let mut visited = vec![false; right.len()];
        matched[index] = assign(index, left, right, &mut visited, &mut owner);
    }
    let only_left = left
        .iter()
        .zip(&matched)
        .filter(|(_, matched)| !**matched)
        .map(|(item, _)| item.clone())
        .collect();
    let only_right = right
        .iter()
        .zip(&owner)
        .filter(|(_, owner)| owner.is_none())
        .map(|(item, _)| item.clone())
        .collect();
    (only_left, only_right)
}

/// Augmenting path step: pair `left[index]` with a free element of `right`,
/// moving earlier pairings when that frees one up.
fn assign(
    index: usize,
    left: &[Value],
    right: &[Value],
    visited: &mut [bool],
    owner: &mut [Option<usize>],
) -> bool {
    for candidate in 0..right.len() {
        if visited[candidate] || !values_equal(&left[index], &right[candidate]) {
            continue;
        }
        visited[candidate] = true;
        let free = match owner[candidate] {
            None => true,
            Some(previous) => assign(previous, left, right, visited, owner),
        };
        if free {
            owner[candidate] = Some(index);
            return true;
        }
    }
    false
}

fn multiset_equal(left: &[Value], right: &[Value]) -> bool {
    if left.len() != right.len() {
        return false;
    }
    let (only_left, only_right) = list_difference(left, right);
    only_left.is_empty() && only_right.is_empty()
}
