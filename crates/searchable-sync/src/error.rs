//! Error types for searchable-sync

use thiserror::Error;

/// Result type alias for synchronisation operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while synchronising or reindexing.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Store, mapping or engine failure.
    #[error(transparent)]
    Core(#[from] searchable_core::Error),

    /// Progress output could not be written.
    #[error("Failed to write progress output: {0}")]
    Output(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_error_is_transparent() {
        let err: Error = searchable_core::Error::engine("unreachable").into();
        assert_eq!(err.to_string(), "Search engine error: unreachable");
    }

    #[test]
    fn test_output_error_display() {
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed");
        let err: Error = io.into();
        assert!(err.to_string().contains("closed"));
    }
}
