use std::io::{Error, ErrorKind};

#[derive(Debug, thiserror::Error)]
pub enum MedianError {
    #[error("{name} must be positive, got {value}")]
    InvalidArgument { name: &'static str, value: i64 },

    #[error("median requested before any value was inserted")]
    EmptyState,

    #[error("line {line}: cannot parse '{token}' as an integer")]
    Parse { line: usize, token: String },

    #[error(transparent)]
    Io(#[from] Error),
}

impl From<MedianError> for Error {
    fn from(err: MedianError) -> Error {
        match err {
            MedianError::Io(inner) => inner,
            MedianError::InvalidArgument { .. } | MedianError::Parse { .. } => {
                Error::new(ErrorKind::InvalidInput, err.to_string())
            }
            MedianError::EmptyState => Error::new(ErrorKind::Other, err.to_string()),
        }
    }
}
