//! Error types for box-tree construction and access

use crate::model::TexMode;
use thiserror::Error;

/// Errors from building or inspecting a box tree.
///
/// Measurement and drawing never return these; they degrade and log
/// instead, so rendering keeps going on bad input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TexError {
    /// Symbol name lookup failed
    #[error("unknown symbol name: {0:?}")]
    UnknownSymbol(String),

    /// More cells supplied than the declared grid holds
    #[error("matrix of {rows}x{cols} cells was given {supplied} items")]
    MalformedMatrix {
        rows: usize,
        cols: usize,
        supplied: usize,
    },

    /// Child index out of range
    #[error("child index {index} out of range ({count} children)")]
    ChildIndex { index: usize, count: usize },

    /// Matrix cell coordinates out of range
    #[error("cell ({row}, {col}) out of range for a {rows}x{cols} matrix")]
    CellIndex {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    /// Mode-specific operation applied to the wrong node mode
    #[error("{operation} is not supported on a {mode:?} node")]
    WrongMode {
        mode: TexMode,
        operation: &'static str,
    },
}

/// Result type for box-tree operations
pub type TexResult<T> = Result<T, TexError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TexError::UnknownSymbol("frobnicate".to_string());
        assert_eq!(err.to_string(), "unknown symbol name: \"frobnicate\"");
    }

    #[test]
    fn test_matrix_error_display() {
        let err = TexError::MalformedMatrix {
            rows: 2,
            cols: 3,
            supplied: 7,
        };
        assert_eq!(err.to_string(), "matrix of 2x3 cells was given 7 items");
    }

    #[test]
    fn test_child_index_display() {
        let err = TexError::ChildIndex { index: 5, count: 2 };
        assert_eq!(err.to_string(), "child index 5 out of range (2 children)");
    }
}
