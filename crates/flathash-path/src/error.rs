/// Errors from path-key parsing and record (un)flattening.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    /// A key does not follow the path-key grammar.
    #[error("malformed key {key:?}: {reason}")]
    MalformedKey { key: String, reason: String },

    /// Sequence indices under a path are not contiguous from zero.
    #[error("sequence at `{path}` is missing index {missing}")]
    SequenceGap { path: String, missing: usize },

    /// The same path has both index and field children.
    #[error("`{path}` mixes sequence indices and field names")]
    MixedSegments { path: String },

    /// The same path has both a scalar value and nested keys.
    #[error("`{path}` carries both a value and nested keys")]
    ValueWithChildren { path: String },

    /// A type hint entry is not valid UTF-8.
    #[error("type hint at `{path}` is not valid UTF-8")]
    InvalidHint { path: String },

    /// The tree contains something the flat encoding cannot express.
    #[error("unsupported value at `{path}`: {reason}")]
    Unsupported { path: String, reason: String },

    /// Nesting exceeds the configured maximum depth.
    #[error("nesting at `{path}` exceeds the maximum depth of {max_depth}")]
    TooDeep { path: String, max_depth: usize },
}

/// Result alias for path operations.
pub type PathResult<T> = Result<T, PathError>;
