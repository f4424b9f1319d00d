//! Error types for marrow.
//!
//! Only a missing root is fatal; per-file parse failures live on the file's
//! report and never surface here.

use std::path::PathBuf;

use crate::walker::WalkError;

/// Top-level error type for marrow operations.
#[derive(Debug, thiserror::Error)]
pub enum MarrowError {
    #[error("root not found or not a directory: {0}")]
    RootNotFound(PathBuf),

    #[error("walk error: {0}")]
    Walk(WalkError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid pattern: {0}")]
    Pattern(#[from] glob::PatternError),
}

impl From<WalkError> for MarrowError {
    fn from(error: WalkError) -> Self {
        match error {
            // A missing or non-directory root means there is nothing to
            // summarize; both collapse into the fatal condition.
            WalkError::NotFound { path } | WalkError::NotADirectory { path } => {
                MarrowError::RootNotFound(path)
            }
            other => MarrowError::Walk(other),
        }
    }
}

/// Map an error to its process exit code.
pub fn exit_code(error: &MarrowError) -> i32 {
    match error {
        MarrowError::RootNotFound(_) => 3,
        MarrowError::Walk(_) => 2,
        MarrowError::Io(_) => 1,
        MarrowError::Json(_) => 1,
        MarrowError::Pattern(_) => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_becomes_root_not_found() {
        let walk = WalkError::NotFound {
            path: PathBuf::from("/missing"),
        };
        let error: MarrowError = walk.into();
        assert!(matches!(error, MarrowError::RootNotFound(_)));
        assert_eq!(exit_code(&error), 3);
    }

    #[test]
    fn not_a_directory_becomes_root_not_found() {
        let walk = WalkError::NotADirectory {
            path: PathBuf::from("/some/file.py"),
        };
        let error: MarrowError = walk.into();
        assert!(matches!(error, MarrowError::RootNotFound(_)));
    }
}
