//! Error classification shared by every formkit crate
//!
//! Each crate defines its own `thiserror` enum; this module supplies the
//! severity vocabulary those enums report through the [`Severity`] trait so
//! callers can decide how loudly to surface a failure.

/// Severity levels for error classification
///
/// # Severity Levels
///
/// - **Warning**: Something the user fixes by editing a value. The form stays
///   usable and nothing is lost.
/// - **Error**: An operation failed but the engine can continue, e.g. a
///   rejected submission or an undecodable image.
/// - **Critical**: A configuration or storage defect. The form cannot be
///   built or its custom fields cannot be trusted until a caller fixes it.
///
/// # Examples
///
/// ```rust
/// use formkit_common::ErrorSeverity;
///
/// // A phone number with nine digits
/// let bad_value = ErrorSeverity::Warning;
///
/// // Two descriptors named "price"
/// let duplicate = ErrorSeverity::Critical;
/// # let _ = (bad_value, duplicate);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    /// Recoverable by the user, per field
    Warning,

    /// Operation failed but the engine remains usable
    Error,

    /// Caller defect or corrupted persistent state
    Critical,
}

impl std::fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorSeverity::Warning => write!(f, "warning"),
            ErrorSeverity::Error => write!(f, "error"),
            ErrorSeverity::Critical => write!(f, "critical"),
        }
    }
}

/// Trait for error types that have severity levels
///
/// ```rust
/// use formkit_common::{ErrorSeverity, Severity};
///
/// #[derive(Debug)]
/// enum StoreProblem {
///     Corrupt,
///     Missing,
/// }
///
/// impl Severity for StoreProblem {
///     fn severity(&self) -> ErrorSeverity {
///         match self {
///             StoreProblem::Corrupt => ErrorSeverity::Critical,
///             StoreProblem::Missing => ErrorSeverity::Error,
///         }
///     }
/// }
///
/// assert_eq!(StoreProblem::Corrupt.severity(), ErrorSeverity::Critical);
/// ```
pub trait Severity {
    /// Get the severity level of this error
    fn severity(&self) -> ErrorSeverity;

    /// Whether this error indicates a caller defect that retrying cannot fix
    fn is_critical(&self) -> bool {
        self.severity() == ErrorSeverity::Critical
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(ErrorSeverity);

    impl Severity for Fixed {
        fn severity(&self) -> ErrorSeverity {
            self.0
        }
    }

    #[test]
    fn test_severity_ordering() {
        assert!(ErrorSeverity::Warning < ErrorSeverity::Error);
        assert!(ErrorSeverity::Error < ErrorSeverity::Critical);
    }

    #[test]
    fn test_is_critical_default() {
        assert!(Fixed(ErrorSeverity::Critical).is_critical());
        assert!(!Fixed(ErrorSeverity::Warning).is_critical());
    }

    #[test]
    fn test_display() {
        assert_eq!(ErrorSeverity::Critical.to_string(), "critical");
    }
}
