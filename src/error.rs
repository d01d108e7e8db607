//! Ошибки генерации дескрипторов

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DescriptorError {
    /// Отсутствующая колонка или нечисловой результат
    #[error("Evaluation error in '{name}': {reason}")]
    Evaluation { name: String, reason: String },

    #[error("Invalid expression '{expression}': {reason}")]
    Expression { expression: String, reason: String },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("No value for property '{property}' of element '{element}'")]
    Lookup { element: String, property: String },

    #[error("Structure error: {0}")]
    Structure(String),

    #[error("Name collision: {0}")]
    Composition(String),

    #[error("Shape mismatch: {0}")]
    Shape(String),
}

impl DescriptorError {
    pub(crate) fn evaluation(name: &str, reason: impl Into<String>) -> Self {
        Self::Evaluation {
            name: name.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn expression(expression: &str, reason: impl Into<String>) -> Self {
        Self::Expression {
            expression: expression.to_string(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, DescriptorError>;
