//! Errors surfaced by the interceptor views.

use thiserror::Error;

/// Error code carried by the realpath fallback signal.
///
/// Glob engines treat a realpath failure with this code as "the fast
/// resolver cannot answer, use the slow path" rather than as a real error.
pub const FALLBACK_ERROR_CODE: &str = "ELOOP";

/// The only error that crosses the capability boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InterceptError {
    /// The realpath view was probed with a key that is not a path.
    #[error("ELOOP: realpath cache cannot resolve non-path key '{key}'")]
    UseFallback { key: String },
}

impl InterceptError {
    /// Fixed error code, for consumers that dispatch on codes.
    pub fn code(&self) -> &'static str {
        match self {
            InterceptError::UseFallback { .. } => FALLBACK_ERROR_CODE,
        }
    }

    /// The operation that raised the error.
    pub fn syscall(&self) -> &'static str {
        match self {
            InterceptError::UseFallback { .. } => "realpath",
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, InterceptError::UseFallback { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_display_and_code() {
        let err = InterceptError::UseFallback {
            key: "foo.txt".into(),
        };
        assert!(err.is_fallback());
        assert_eq!(err.code(), "ELOOP");
        assert_eq!(err.syscall(), "realpath");
        assert_eq!(
            err.to_string(),
            "ELOOP: realpath cache cannot resolve non-path key 'foo.txt'"
        );
    }
}
