//! Core shared types and errors (renderer-agnostic).

use std::path::PathBuf;

use thiserror::Error;

pub mod diagnostics;

pub use diagnostics::Diagnostics;

/// Everything that can make a mesh load fail. Line numbers are 1-based.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot open mesh file {}: {source}", path.display())]
    FileNotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported mesh format: {}", path.display())]
    UnsupportedFormat { path: PathBuf },

    #[error("malformed count header on line {line}: '{content}'")]
    MalformedHeader { line: usize, content: String },

    #[error("malformed face corner '{corner}' on line {line}")]
    MalformedFace { line: usize, corner: String },

    #[error("binary STL is not supported (null byte on line {line})")]
    UnsupportedBinaryFormat { line: usize },

    #[error("malformed '{directive}' attribute on line {line}")]
    MalformedAttribute { line: usize, directive: String },

    #[error("reference {reference} on line {line} is out of range ({available} declared so far)")]
    IndexOutOfRange {
        line: usize,
        reference: i64,
        available: usize,
    },

    #[error("mesh has more unique vertices than fit in a u32 index")]
    TooManyVertices,

    #[error("invalid triangle list: index {index} with {vertex_count} vertices")]
    InvalidTopology { index: u32, vertex_count: usize },
}

pub type LoadResult<T> = Result<T, LoadError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_carry_location() {
        let err = LoadError::MalformedFace {
            line: 7,
            corner: "4//5/6".into(),
        };
        assert_eq!(err.to_string(), "malformed face corner '4//5/6' on line 7");

        let err = LoadError::UnsupportedFormat {
            path: PathBuf::from("model.ply"),
        };
        assert!(err.to_string().contains("model.ply"));
    }

    #[test]
    fn file_not_found_exposes_io_source() {
        use std::error::Error as _;

        let err = LoadError::FileNotFound {
            path: PathBuf::from("missing.obj"),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        assert!(err.source().is_some());
    }
}
