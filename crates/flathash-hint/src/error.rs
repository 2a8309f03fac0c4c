/// Errors from type registration and hint resolution.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HintError {
    /// No type is registered under the hint.
    #[error("unknown type hint `{0}`")]
    UnknownTypeHint(String),

    /// A different type already owns the hint.
    #[error("type hint `{hint}` is registered to `{existing}`, cannot register `{attempted}`")]
    ConflictingRegistration {
        hint: String,
        existing: &'static str,
        attempted: &'static str,
    },

    /// The hint is one of the builtin identifiers.
    #[error("type hint `{0}` is reserved for builtin values")]
    ReservedHint(String),
}

/// Result alias for hint operations.
pub type HintResult<T> = Result<T, HintError>;
