//! Entry point arguments and runtime parameter values.

use crate::core::error::{ValidationError, ValidationResult};
use crate::core::types::{ScalarType, ScalarValue};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Kind of an entry point argument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ArgumentKind {
    /// 3-D u8 input buffer.
    Buffer,
    /// Runtime scalar with a default value.
    Scalar { ty: ScalarType, default: ScalarValue },
}

/// A named, ordered argument of an entry point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Argument {
    pub name: String,
    #[serde(flatten)]
    pub kind: ArgumentKind,
}

impl Argument {
    /// An input buffer argument.
    pub fn buffer(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ArgumentKind::Buffer,
        }
    }

    /// A scalar argument whose type is taken from its default.
    pub fn scalar(name: impl Into<String>, default: impl Into<ScalarValue>) -> Self {
        let default = default.into();
        Self {
            name: name.into(),
            kind: ArgumentKind::Scalar {
                ty: default.scalar_type(),
                default,
            },
        }
    }

    pub fn is_buffer(&self) -> bool {
        matches!(self.kind, ArgumentKind::Buffer)
    }

    /// Scalar type, or `None` for buffers.
    pub fn scalar_type(&self) -> Option<ScalarType> {
        match &self.kind {
            ArgumentKind::Buffer => None,
            ArgumentKind::Scalar { ty, .. } => Some(*ty),
        }
    }

    pub fn default_value(&self) -> Option<ScalarValue> {
        match &self.kind {
            ArgumentKind::Buffer => None,
            ArgumentKind::Scalar { default, .. } => Some(*default),
        }
    }
}

/// Runtime scalar values keyed by parameter name, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParamSet {
    values: IndexMap<String, ScalarValue>,
}

impl ParamSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every scalar argument at its default, in declaration order.
    pub fn defaults(arguments: &[Argument]) -> Self {
        let values = arguments
            .iter()
            .filter_map(|arg| arg.default_value().map(|v| (arg.name.clone(), v)))
            .collect();
        Self { values }
    }

    /// Bind `values` to the scalar arguments by position.
    pub fn positional(arguments: &[Argument], values: &[ScalarValue]) -> ValidationResult<Self> {
        let scalars: Vec<&Argument> = arguments.iter().filter(|a| !a.is_buffer()).collect();
        if values.len() > scalars.len() {
            return Err(ValidationError::Other(format!(
                "{} scalar value(s) given, entry point takes {}",
                values.len(),
                scalars.len()
            )));
        }
        let mut set = Self::new();
        for (arg, value) in scalars.iter().zip(values) {
            set.set(arg.name.clone(), *value);
        }
        if let Some(missing) = scalars.get(values.len()) {
            return Err(ValidationError::MissingParameter {
                name: missing.name.clone(),
            });
        }
        Ok(set)
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<ScalarValue>) -> Self {
        self.set(name, value);
        self
    }

    /// Insert or replace a value. Replacing keeps the original position.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<ScalarValue>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<ScalarValue> {
        self.values.get(name).copied()
    }

    pub fn values(&self) -> &IndexMap<String, ScalarValue> {
        &self.values
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
