use std::fmt::{Debug, Formatter};
use std::sync::Arc;

use serde_json::Value;
use terrasense_core::{AppResult, NonEmptyString};

use crate::value::{FormValues, is_field_filled, values_equivalent};

type ConditionFn = dyn Fn(&FormValues) -> bool + Send + Sync;

/// Boolean predicate over the full value map of a form.
#[derive(Clone)]
pub enum DependencyCondition {
    /// Always true.
    Always,
    /// Field holds a filled value.
    Filled(String),
    /// Field holds a value equivalent to the given one.
    Equals(String, Value),
    /// Negation.
    Not(Box<DependencyCondition>),
    /// Every nested condition holds; true when empty.
    All(Vec<DependencyCondition>),
    /// At least one nested condition holds; false when empty.
    Any(Vec<DependencyCondition>),
    /// Arbitrary predicate for dependencies the declarative forms cannot express.
    Custom(Arc<ConditionFn>),
}

impl DependencyCondition {
    /// Condition requiring every listed field to be filled.
    #[must_use]
    pub fn all_filled<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::All(fields.into_iter().map(|field| Self::Filled(field.into())).collect())
    }

    /// Wraps a closure as a condition.
    #[must_use]
    pub fn custom(predicate: impl Fn(&FormValues) -> bool + Send + Sync + 'static) -> Self {
        Self::Custom(Arc::new(predicate))
    }

    /// Evaluates the condition against current form values.
    #[must_use]
    pub fn evaluate(&self, values: &FormValues) -> bool {
        match self {
            Self::Always => true,
            Self::Filled(field) => is_field_filled(values, field),
            Self::Equals(field, expected) => values
                .get(field)
                .is_some_and(|value| values_equivalent(value, expected)),
            Self::Not(inner) => !inner.evaluate(values),
            Self::All(conditions) => conditions.iter().all(|condition| condition.evaluate(values)),
            Self::Any(conditions) => conditions.iter().any(|condition| condition.evaluate(values)),
            Self::Custom(predicate) => predicate(values),
        }
    }

    /// Returns the fields this condition reads, when it can tell.
    ///
    /// Custom predicates report nothing.
    #[must_use]
    pub fn referenced_fields(&self) -> Vec<&str> {
        match self {
            Self::Always | Self::Custom(_) => Vec::new(),
            Self::Filled(field) | Self::Equals(field, _) => vec![field.as_str()],
            Self::Not(inner) => inner.referenced_fields(),
            Self::All(conditions) | Self::Any(conditions) => conditions
                .iter()
                .flat_map(DependencyCondition::referenced_fields)
                .collect(),
        }
    }
}

impl Debug for DependencyCondition {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Always => formatter.write_str("Always"),
            Self::Filled(field) => formatter.debug_tuple("Filled").field(field).finish(),
            Self::Equals(field, value) => formatter
                .debug_tuple("Equals")
                .field(field)
                .field(value)
                .finish(),
            Self::Not(inner) => formatter.debug_tuple("Not").field(inner).finish(),
            Self::All(conditions) => formatter.debug_tuple("All").field(conditions).finish(),
            Self::Any(conditions) => formatter.debug_tuple("Any").field(conditions).finish(),
            Self::Custom(_) => formatter.write_str("Custom(..)"),
        }
    }
}

/// Enablement rule attached to one field.
#[derive(Debug, Clone)]
pub struct DependencyRule {
    field: NonEmptyString,
    condition: DependencyCondition,
}

impl DependencyRule {
    /// Creates a validated dependency rule.
    pub fn new(field: impl Into<String>, condition: DependencyCondition) -> AppResult<Self> {
        Ok(Self {
            field: NonEmptyString::new(field)?,
            condition,
        })
    }

    /// Returns the governed field name.
    #[must_use]
    pub fn field(&self) -> &str {
        self.field.as_str()
    }

    /// Returns the rule condition.
    #[must_use]
    pub fn condition(&self) -> &DependencyCondition {
        &self.condition
    }

    /// Returns whether the governed field is enabled for `values`.
    #[must_use]
    pub fn allows(&self, values: &FormValues) -> bool {
        self.condition.evaluate(values)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{DependencyCondition, DependencyRule};
    use crate::value::FormValues;

    fn values(entries: &[(&str, serde_json::Value)]) -> FormValues {
        entries
            .iter()
            .map(|(field, value)| ((*field).to_owned(), value.clone()))
            .collect()
    }

    #[test]
    fn all_filled_requires_every_field() {
        let condition = DependencyCondition::all_filled(["node", "devEui"]);
        assert!(!condition.evaluate(&values(&[("node", json!("N-01"))])));
        assert!(condition.evaluate(&values(&[
            ("node", json!("N-01")),
            ("devEui", json!("70B3D5"))
        ])));
    }

    #[test]
    fn combinators_compose() {
        let condition = DependencyCondition::Any(vec![
            DependencyCondition::Equals("kind".to_owned(), json!("gateway")),
            DependencyCondition::Not(Box::new(DependencyCondition::Filled("parent".to_owned()))),
        ]);

        assert!(condition.evaluate(&values(&[("kind", json!("gateway"))])));
        assert!(condition.evaluate(&values(&[])));
        assert!(!condition.evaluate(&values(&[
            ("kind", json!("leaf")),
            ("parent", json!(4))
        ])));
        assert!(!DependencyCondition::Any(Vec::new()).evaluate(&values(&[])));
    }

    #[test]
    fn custom_predicates_see_the_whole_map() {
        let rule = DependencyRule::new(
            "maximum",
            DependencyCondition::custom(|values| {
                values
                    .get("minimum")
                    .and_then(serde_json::Value::as_f64)
                    .is_some_and(|minimum| minimum >= 0.0)
            }),
        )
        .unwrap_or_else(|_| unreachable!());

        assert!(rule.allows(&values(&[("minimum", json!(2.5))])));
        assert!(!rule.allows(&values(&[("minimum", json!(-1))])));
        assert!(rule.condition().referenced_fields().is_empty());
    }
}
