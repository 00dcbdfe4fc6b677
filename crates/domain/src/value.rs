//! Emptiness and change detection over form values.

use std::collections::BTreeMap;

use serde_json::Value;

/// Current values of one form keyed by field name.
pub type FormValues = BTreeMap<String, Value>;

/// Returns true when a form value counts as "not filled in".
///
/// Null, whitespace-only strings, the number zero, `false`, and empty arrays or
/// objects are empty. Anything else is filled.
#[must_use]
pub fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(flag) => !flag,
        Value::Number(number) => number.as_f64().is_some_and(|number| number == 0.0),
        Value::String(text) => text.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(entries) => entries.is_empty(),
    }
}

/// Returns true when `field` is present in `values` and holds a filled value.
#[must_use]
pub fn is_field_filled(values: &FormValues, field: &str) -> bool {
    values.get(field).is_some_and(|value| !is_empty_value(value))
}

/// Compares two form values, treating every empty representation as equal
/// and numbers by numeric value.
#[must_use]
pub fn values_equivalent(left: &Value, right: &Value) -> bool {
    if is_empty_value(left) && is_empty_value(right) {
        return true;
    }

    match (left, right) {
        (Value::Number(left), Value::Number(right)) => left.as_f64() == right.as_f64(),
        (Value::String(left), Value::String(right)) => left.trim() == right.trim(),
        _ => left == right,
    }
}

/// Compares a stored value with an edited one.
///
/// Unlike [`values_equivalent`], `null`, `0` and `false` stay distinct; only a
/// blank string matches `null`.
fn values_identical(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(left), Value::Number(right)) => left.as_f64() == right.as_f64(),
        (Value::String(left), Value::String(right)) => left.trim() == right.trim(),
        (Value::Null, Value::String(text)) | (Value::String(text), Value::Null) => {
            text.trim().is_empty()
        }
        _ => left == right,
    }
}

/// Returns the entries of `current` that differ from `baseline`.
///
/// Fields missing from `current` are not reported; fields missing from `baseline`
/// are compared against `null`.
#[must_use]
pub fn changed_values(baseline: &FormValues, current: &FormValues) -> FormValues {
    current
        .iter()
        .filter(|(field, value)| {
            let previous = baseline.get(field.as_str()).unwrap_or(&Value::Null);
            !values_identical(previous, value)
        })
        .map(|(field, value)| (field.clone(), value.clone()))
        .collect()
}
