//! Configuration validation errors shared by every config table.

use std::fmt::Display;

use thiserror::Error;

/// A config value outside the range the engine supports.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigInvalid {
    /// One field failed its range check.
    #[error("{field} must be {expected}, got {got}")]
    OutOfRange {
        /// Dotted path, e.g. `terrain.chunk_size`.
        field: &'static str,
        /// Accepted range, in words.
        expected: &'static str,
        /// Offending value.
        got: String,
    },
}

impl ConfigInvalid {
    /// Builds an [`OutOfRange`](Self::OutOfRange) error.
    #[must_use]
    pub fn out_of_range(field: &'static str, expected: &'static str, got: impl Display) -> Self {
        Self::OutOfRange {
            field,
            expected,
            got: got.to_string(),
        }
    }

    /// Dotted path of the rejected field.
    #[must_use]
    pub const fn field(&self) -> &'static str {
        match self {
            Self::OutOfRange { field, .. } => field,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_names_field_and_value() {
        let err = ConfigInvalid::out_of_range("render.workers", "at least 1", 0);
        assert_eq!(err.field(), "render.workers");
        assert_eq!(err.to_string(), "render.workers must be at least 1, got 0");
    }
}
