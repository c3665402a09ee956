use thiserror::Error;

use crate::grammar::{SpecSyntaxError, ValidationError};

/// Any of these aborts the whole schema build.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BuildError {
    #[error("unsupported spec function `{function}` for parameter `{parameter}`")]
    UnsupportedSpecFunction { parameter: String, function: String },

    #[error("spec function `{function}` for parameter `{parameter}` does not support `{constraint}`")]
    UnsupportedConstraint { parameter: String, function: String, constraint: String },

    #[error("bad spec for parameter `{parameter}`")]
    Syntax {
        parameter: String,
        #[source]
        source: SpecSyntaxError,
    },

    /// Default failed a coercion check. Passed through untouched.
    #[error(transparent)]
    Validation(#[from] ValidationError),
}
