//! Error types for the quarry crates.
//!
//! The rewrite engine distinguishes two very different failure classes:
//!
//! * expected early exits (an ineligible query, an unmatched expression, a
//!   containment miss), which are not errors at all and never show up here;
//! * real failures, which are either collaborator failures ([`Catalog`],
//!   [`Planner`]) that abandon a single candidate, or broken internal
//!   invariants ([`Internal`]) that indicate a bug and must propagate.
//!
//! [`Catalog`]: QuarryError::Catalog
//! [`Planner`]: QuarryError::Planner
//! [`Internal`]: QuarryError::Internal

use thiserror::Error;

/// Result type used throughout the quarry crates.
pub type QuarryResult<T> = Result<T, QuarryError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuarryError {
    /// An internal invariant was violated. Always indicates a bug in quarry
    /// itself, never a legitimate rejection; callers must not swallow it.
    #[error("internal invariant violated: {0}")]
    Internal(String),

    /// The input uses a construct the engine does not handle.
    #[error("unsupported: {0}")]
    Unsupported(String),

    /// The catalog collaborator failed to resolve a view (e.g. the entry
    /// disappeared mid-scan, or its output projection could not be built).
    #[error("catalog error: {0}")]
    Catalog(String),

    /// The planning collaborator failed to produce a plan.
    #[error("planner error: {0}")]
    Planner(String),
}

impl QuarryError {
    /// True for errors that indicate a bug rather than a per-candidate
    /// failure. The rewrite scan propagates these and skips on all others.
    pub fn is_internal(&self) -> bool {
        matches!(self, QuarryError::Internal(_))
    }
}

/// Build a [`QuarryError::Internal`] without returning it.
#[macro_export]
macro_rules! internal_err {
    ($($format_args:tt)*) => {
        $crate::QuarryError::Internal(format!(
            "at {}:{}: {}",
            std::file!(),
            std::line!(),
            format!($($format_args)*),
        ))
    };
}

/// Return early with a [`QuarryError::Internal`].
#[macro_export]
macro_rules! internal {
    ($($format_args:tt)*) => {
        return Err($crate::internal_err!($($format_args)*))
    };
}

/// Build a [`QuarryError::Unsupported`] without returning it.
#[macro_export]
macro_rules! unsupported_err {
    ($($format_args:tt)*) => {
        $crate::QuarryError::Unsupported(format!($($format_args)*))
    };
}

/// Check a contract, returning [`QuarryError::Internal`] if it doesn't hold.
#[macro_export]
macro_rules! invariant {
    ($cond:expr) => {
        if !$cond {
            $crate::internal!("assertion failed: {}", stringify!($cond));
        }
    };
    ($cond:expr, $($format_args:tt)*) => {
        if !$cond {
            $crate::internal!($($format_args)*);
        }
    };
}

/// Check two values for equality, returning [`QuarryError::Internal`] with
/// both values if they differ.
#[macro_export]
macro_rules! invariant_eq {
    ($a:expr, $b:expr) => {
        if $a != $b {
            $crate::internal!(
                "assertion failed: {} == {} ({:?} != {:?})",
                stringify!($a),
                stringify!($b),
                $a,
                $b,
            );
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checked(pos: usize, len: usize) -> QuarryResult<usize> {
        invariant!(pos < len, "position {pos} out of range for length {len}");
        Ok(pos)
    }

    #[test]
    fn invariant_passes_through() {
        assert_eq!(checked(1, 4).unwrap(), 1);
    }

    #[test]
    fn invariant_reports_internal() {
        let err = checked(9, 4).unwrap_err();
        assert!(err.is_internal());
        assert!(err.to_string().contains("out of range"));
    }

    #[test]
    fn collaborator_errors_are_not_internal() {
        assert!(!QuarryError::Catalog("gone".into()).is_internal());
        assert!(!QuarryError::Planner("no plan".into()).is_internal());
    }
}
