//! Compile-time error types
//!
//! Registry and catalog operations fail with a bare [`CompileErrorKind`]; the
//! compiler attaches the [`SourcePath`] of the offending statement.

use std::fmt;
use thiserror::Error;

use crate::element::PropertyKey;

/// Position of a statement in the declarations, outermost index first
///
/// `[41, 2]` is the third statement inside the `where` block at index 41.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct SourcePath(pub Vec<usize>);

impl SourcePath {
    pub fn child(&self, index: usize) -> Self {
        let mut path = self.0.clone();
        path.push(index);
        Self(path)
    }
}

impl fmt::Display for SourcePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "statement ")?;
        for (i, index) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, " > ")?;
            }
            write!(f, "{}", index + 1)?;
        }
        Ok(())
    }
}

/// What went wrong while compiling declarations
#[derive(Clone, Debug, PartialEq, Error)]
pub enum CompileErrorKind {
    #[error("undefined relation `{0}`")]
    UndefinedRelation(String),

    #[error("unknown element `{0}`")]
    UnknownElement(String),

    #[error("element `{0}` is already defined")]
    DuplicateElement(String),

    #[error("too many elements, at most {limit} are supported")]
    TooManyElements { limit: usize },

    #[error("relation `{0}` is already defined")]
    DuplicateRelation(String),

    #[error("relation `{relation}` takes {expected} terms, got {found}")]
    ArityMismatch {
        relation: String,
        expected: usize,
        found: usize,
    },

    #[error("relation `{0}` must have an arity of at least 1")]
    InvalidArity(String),

    #[error("probability {0} is outside [0, 1]")]
    ProbabilityOutOfRange(f32),

    #[error("pattern variable `'{0}` is not bound by an enclosing where clause")]
    UnboundVariable(String),

    #[error("Empty cannot be the source of a rule")]
    EmptyReactant,

    #[error("invalid {} value {value}", .key.name())]
    InvalidProperty { key: PropertyKey, value: f32 },

    #[error("{0} declarations are not allowed inside a where block")]
    MisplacedDeclaration(&'static str),
}

/// A compile failure together with the statement that caused it
#[derive(Clone, Debug, PartialEq, Error)]
#[error("{kind} (at {at})")]
pub struct CompileError {
    pub at: SourcePath,
    pub kind: CompileErrorKind,
}

impl CompileError {
    pub fn new(at: SourcePath, kind: CompileErrorKind) -> Self {
        Self { at, kind }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_path_display() {
        let path = SourcePath(vec![41]).child(2);
        assert_eq!(path.to_string(), "statement 42 > 3");
    }

    #[test]
    fn test_compile_error_message() {
        let err = CompileError::new(
            SourcePath(vec![0]),
            CompileErrorKind::ArityMismatch {
                relation: "Source".to_string(),
                expected: 2,
                found: 1,
            },
        );
        assert_eq!(
            err.to_string(),
            "relation `Source` takes 2 terms, got 1 (at statement 1)"
        );
    }
}
