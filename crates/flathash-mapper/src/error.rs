use flathash_hint::HintError;
use flathash_path::PathError;
use flathash_tree::TreeError;

/// The four ways a mapping call can fail, plus configuration errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The value cannot be represented as a flat record.
    UnsupportedValue,
    /// The record does not describe a tree.
    MalformedRecord,
    /// A type hint names no registered type.
    UnknownTypeHint,
    /// A value cannot be coerced to the type declared at its position.
    TypeMismatch,
    /// The mapper configuration could not be read.
    Config,
}

/// Errors from [`FlatHashMapper`](crate::FlatHashMapper) operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MapperError {
    /// Converting the value to a tree failed.
    #[error("cannot serialize value: {0}")]
    Serialize(TreeError),

    /// Rebuilding the value from its tree failed.
    #[error("cannot reconstruct value: {0}")]
    Deserialize(TreeError),

    /// Writing the tree as a flat record failed.
    #[error("cannot flatten value: {0}")]
    Flatten(PathError),

    /// The record could not be read back as a tree.
    #[error("malformed record: {0}")]
    Record(PathError),

    /// Type registration failed.
    #[error(transparent)]
    Hint(#[from] HintError),

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl MapperError {
    /// Classifies the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            MapperError::Serialize(_) | MapperError::Flatten(_) => ErrorKind::UnsupportedValue,
            MapperError::Record(_) => ErrorKind::MalformedRecord,
            MapperError::Deserialize(err) => match err {
                TreeError::UnknownTypeHint(_) => ErrorKind::UnknownTypeHint,
                TreeError::MissingField(_) | TreeError::InvalidLength { .. } => {
                    ErrorKind::MalformedRecord
                }
                _ => ErrorKind::TypeMismatch,
            },
            MapperError::Hint(HintError::UnknownTypeHint(_)) => ErrorKind::UnknownTypeHint,
            MapperError::Hint(_) => ErrorKind::UnsupportedValue,
            MapperError::Config(_) => ErrorKind::Config,
        }
    }
}

/// Result alias for mapper operations.
pub type MapperResult<T> = Result<T, MapperError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_by_direction() {
        let unsupported = MapperError::Serialize(TreeError::Unsupported("x".into()));
        assert_eq!(unsupported.kind(), ErrorKind::UnsupportedValue);

        let gap = MapperError::Record(PathError::SequenceGap {
            path: "items".into(),
            missing: 1,
        });
        assert_eq!(gap.kind(), ErrorKind::MalformedRecord);

        let unknown = MapperError::Deserialize(TreeError::UnknownTypeHint("Gone".into()));
        assert_eq!(unknown.kind(), ErrorKind::UnknownTypeHint);

        let missing = MapperError::Deserialize(TreeError::MissingField("age"));
        assert_eq!(missing.kind(), ErrorKind::MalformedRecord);

        let message = MapperError::Deserialize(TreeError::Message("bad date".into()));
        assert_eq!(message.kind(), ErrorKind::TypeMismatch);
    }
}
