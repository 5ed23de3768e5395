/// Errors raised while compiling a pattern or generating from it.

/// Error type for pattern compilation and string generation.
///
/// None of these are retried internally: each one ends the `generate` call
/// that produced it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenError {
    /// The pattern could not be parsed. `position` is a char index.
    #[error("pattern syntax error at position {position}: {message}")]
    PatternSyntax { position: usize, message: String },

    /// The pattern asked for invalid output but nothing marked can be invalidated.
    #[error("pattern `{pattern}` asks for invalid output but has no invalidatable node")]
    NoInvalidatableNode { pattern: String },

    /// A character set had nothing left to choose from.
    #[error("character set has no selectable characters")]
    EmptySet,

    /// The string generated in invalid mode still matches the pattern.
    #[error("pattern `{pattern}` did not produce an invalid string: {generated:?}")]
    InvalidationFailed { pattern: String, generated: String },
}

impl GenError {
    pub(crate) fn syntax(position: usize, message: impl Into<String>) -> Self {
        GenError::PatternSyntax {
            position,
            message: message.into(),
        }
    }
}
