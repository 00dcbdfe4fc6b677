use serde::{Deserialize, Serialize};
use serde_json::Value;
use terrasense_core::{AppError, AppResult, NonEmptyString};

/// Editing mode of a parameter screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormMode {
    /// Create one record.
    Insert,
    /// Edit one fetched record.
    Update,
    /// Stage edits for many records at once.
    Massive,
    /// Create many relationship rows from dimension selections.
    Multiple,
}

impl FormMode {
    /// Returns stable sub-tab value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Insert => "insert",
            Self::Update => "update",
            Self::Massive => "massive",
            Self::Multiple => "multiple",
        }
    }
}

/// Supported form field kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// Free text.
    Text,
    /// Numeric input.
    Number,
    /// Checkbox or toggle.
    Boolean,
    /// Selection of a row of another entity type.
    ForeignKey,
}

impl FieldKind {
    /// Returns stable storage value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::ForeignKey => "foreign_key",
        }
    }

    /// Returns the value an untouched widget of this kind holds.
    #[must_use]
    pub fn empty_value(&self) -> Value {
        match self {
            Self::Text => Value::String(String::new()),
            Self::Boolean => Value::Bool(false),
            Self::Number | Self::ForeignKey => Value::Null,
        }
    }

    fn accepts(self, value: &Value) -> bool {
        match self {
            Self::Text => value.is_string(),
            Self::Number => value.is_number() || value.is_null(),
            Self::Boolean => value.is_boolean(),
            Self::ForeignKey => value.is_null() || value.is_i64() || value.is_u64(),
        }
    }
}

/// Declaration of one editable form field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    name: NonEmptyString,
    kind: FieldKind,
    required_when_enabled: bool,
    default_value: Option<Value>,
}

impl FieldSpec {
    /// Creates a validated field declaration.
    pub fn new(
        name: impl Into<String>,
        kind: FieldKind,
        required_when_enabled: bool,
        default_value: Option<Value>,
    ) -> AppResult<Self> {
        let name = NonEmptyString::new(name)?;

        if let Some(default_value) = &default_value
            && !kind.accepts(default_value)
        {
            return Err(AppError::Validation(format!(
                "default value for field '{}' does not match kind '{}'",
                name.as_str(),
                kind.as_str()
            )));
        }

        Ok(Self {
            name,
            kind,
            required_when_enabled,
            default_value,
        })
    }

    /// Returns the field name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns the field kind.
    #[must_use]
    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    /// Returns whether the field must be filled while it is enabled.
    #[must_use]
    pub fn required_when_enabled(&self) -> bool {
        self.required_when_enabled
    }

    /// Returns the declared default value.
    #[must_use]
    pub fn default_value(&self) -> Option<&Value> {
        self.default_value.as_ref()
    }

    /// Returns the value a cleared field is reset to.
    #[must_use]
    pub fn reset_value(&self) -> Value {
        self.default_value
            .clone()
            .unwrap_or_else(|| self.kind.empty_value())
    }
}
