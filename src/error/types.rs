//! Custom error types with exit codes

use thiserror::Error;

/// Main error type for keygit operations
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum GitOpsError {
    /// Configuration Error - invalid or missing SSH key, base path, URL or settings
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Git Error - the underlying git invocation failed
    #[error("Git operation error: {message}")]
    GitOperation { message: String },

    /// Filesystem Error - working directory cannot be created or accessed
    #[error("Filesystem error: {message}")]
    Filesystem { message: String },
}

impl GitOpsError {
    /// Get the appropriate exit code for this error type
    #[must_use]
    #[inline]
    pub const fn exit_code(&self) -> i32 {
        match *self {
            Self::Configuration { .. } => 1,
            Self::GitOperation { .. } => 2,
            Self::Filesystem { .. } => 3,
        }
    }

    /// Create a configuration error
    #[inline]
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a git operation error
    #[inline]
    pub fn git_operation<S: Into<String>>(message: S) -> Self {
        Self::GitOperation {
            message: message.into(),
        }
    }

    /// Create a filesystem error
    #[inline]
    pub fn filesystem<S: Into<String>>(message: S) -> Self {
        Self::Filesystem {
            message: message.into(),
        }
    }

    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration { .. })
    }

    #[must_use]
    pub const fn is_git_operation(&self) -> bool {
        matches!(self, Self::GitOperation { .. })
    }

    #[must_use]
    pub const fn is_filesystem(&self) -> bool {
        matches!(self, Self::Filesystem { .. })
    }
}

/// Recover the typed error from an `anyhow::Error`, if there is one
#[must_use]
pub fn classify(err: &anyhow::Error) -> Option<&GitOpsError> {
    err.downcast_ref::<GitOpsError>()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_are_distinct() {
        assert_eq!(GitOpsError::configuration("x").exit_code(), 1);
        assert_eq!(GitOpsError::git_operation("x").exit_code(), 2);
        assert_eq!(GitOpsError::filesystem("x").exit_code(), 3);
    }

    #[test]
    fn classify_sees_through_context() {
        use anyhow::Context as _;

        let err: anyhow::Result<()> = Err(GitOpsError::filesystem("boom").into());
        let err = err.context("while cloning").unwrap_err();

        let typed = classify(&err).unwrap();
        assert!(typed.is_filesystem());
        assert_eq!(typed.to_string(), "Filesystem error: boom");
    }
}
