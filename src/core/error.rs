use thiserror::Error;

/// Errors reported by ring buffer operations.
///
/// `Empty` and `Full` are expected, recoverable conditions. The buffer never
/// retries on its own; the caller decides whether to retry, drop or escalate.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferError {
    /// `read` found no occupied cell.
    #[error("buffer is empty")]
    Empty,

    /// `write` found no free cell.
    #[error("buffer is full")]
    Full,

    /// A buffer needs at least one cell.
    #[error("capacity must be greater than zero")]
    ZeroCapacity,
}

pub type Result<T> = std::result::Result<T, BufferError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(BufferError::Empty.to_string(), "buffer is empty");
        assert_eq!(BufferError::Full.to_string(), "buffer is full");
        assert_eq!(
            BufferError::ZeroCapacity.to_string(),
            "capacity must be greater than zero"
        );
    }
}
