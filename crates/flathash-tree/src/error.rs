use std::fmt::Display;

use serde::de::{self, Unexpected};
use serde::ser;
use thiserror::Error;

/// Errors produced while converting between native values and trees.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TreeError {
    /// The value has a shape the tree model cannot represent.
    #[error("unsupported value: {0}")]
    Unsupported(String),

    /// A node could not be coerced to the type requested at its position.
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: String },

    /// A required struct field had no node.
    #[error("missing field `{0}`")]
    MissingField(&'static str),

    /// A type hint at a polymorphic position names no known type.
    #[error("unknown type hint `{0}`")]
    UnknownTypeHint(String),

    /// A sequence or map had the wrong number of elements.
    #[error("invalid length {len}, expected {expected}")]
    InvalidLength { len: usize, expected: String },

    /// An enum variant name was not recognized.
    #[error("unknown variant `{variant}`, expected one of {expected:?}")]
    UnknownVariant {
        variant: String,
        expected: &'static [&'static str],
    },

    /// Free-form error raised by a serde implementation.
    #[error("{0}")]
    Message(String),
}

/// Result alias for tree operations.
pub type TreeResult<T> = Result<T, TreeError>;

impl TreeError {
    pub(crate) fn mismatch(expected: impl Into<String>, found: impl Into<String>) -> Self {
        TreeError::TypeMismatch {
            expected: expected.into(),
            found: found.into(),
        }
    }

    /// Re-raise this error through another deserializer's error type.
    ///
    /// Each variant maps onto the `de::Error` constructor that [`TreeError`]
    /// decodes back into the same variant, so nested deserializations keep
    /// their error kind when they surface through a serde visitor.
    pub fn into_de_error<E: de::Error>(self) -> E {
        match self {
            TreeError::TypeMismatch { expected, found } => {
                E::invalid_type(Unexpected::Other(&found), &expected.as_str())
            }
            TreeError::MissingField(field) => E::missing_field(field),
            TreeError::UnknownTypeHint(hint) => E::unknown_variant(&hint, &[]),
            TreeError::InvalidLength { len, expected } => {
                E::invalid_length(len, &expected.as_str())
            }
            TreeError::UnknownVariant { variant, expected } => {
                E::unknown_variant(&variant, expected)
            }
            TreeError::Unsupported(msg) => E::custom(format!("unsupported value: {msg}")),
            TreeError::Message(msg) => E::custom(msg),
        }
    }
}

impl ser::Error for TreeError {
    fn custom<T: Display>(msg: T) -> Self {
        TreeError::Message(msg.to_string())
    }
}

impl de::Error for TreeError {
    fn custom<T: Display>(msg: T) -> Self {
        TreeError::Message(msg.to_string())
    }

    fn invalid_type(unexp: Unexpected<'_>, exp: &dyn de::Expected) -> Self {
        TreeError::mismatch(exp.to_string(), unexp.to_string())
    }

    fn invalid_value(unexp: Unexpected<'_>, exp: &dyn de::Expected) -> Self {
        TreeError::mismatch(exp.to_string(), unexp.to_string())
    }

    fn invalid_length(len: usize, exp: &dyn de::Expected) -> Self {
        TreeError::InvalidLength {
            len,
            expected: exp.to_string(),
        }
    }

    fn unknown_variant(variant: &str, expected: &'static [&'static str]) -> Self {
        // Real enums always list their variants; an empty list marks a type hint.
        if expected.is_empty() {
            TreeError::UnknownTypeHint(variant.to_string())
        } else {
            TreeError::UnknownVariant {
                variant: variant.to_string(),
                expected,
            }
        }
    }

    fn missing_field(field: &'static str) -> Self {
        TreeError::MissingField(field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rethrow(err: TreeError) -> TreeError {
        err.into_de_error::<TreeError>()
    }

    #[test]
    fn kinds_survive_rethrow() {
        let cases = vec![
            TreeError::mismatch("i64", "string \"x\""),
            TreeError::MissingField("age"),
            TreeError::UnknownTypeHint("com.example.Gone".into()),
            TreeError::InvalidLength {
                len: 3,
                expected: "a tuple of size 2".into(),
            },
            TreeError::UnknownVariant {
                variant: "Purple".into(),
                expected: &["Red", "Green"],
            },
            TreeError::Message("boom".into()),
        ];
        for err in cases {
            assert_eq!(rethrow(err.clone()), err);
        }
    }

    #[test]
    fn unsupported_degrades_to_message() {
        let err = rethrow(TreeError::Unsupported("cycle".into()));
        assert_eq!(err, TreeError::Message("unsupported value: cycle".into()));
    }

    #[test]
    fn display_includes_details() {
        let err = TreeError::mismatch("u32", "string \"abc\"");
        assert_eq!(
            err.to_string(),
            "type mismatch: expected u32, found string \"abc\""
        );
    }
}
