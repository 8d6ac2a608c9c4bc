//! Errors raised while loading scenes and writing images.
//!
//! Rendering itself never fails: misses, degenerate geometry and the
//! reflection depth bound are ordinary `Option` results.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image encoding error: {0}")]
    Image(#[from] image::ImageError),

    #[error("JSON scene error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("line {line}: `{command}` expects {expected} arguments, got {found}")]
    MissingArgument {
        line: usize,
        command: String,
        expected: usize,
        found: usize,
    },

    #[error("line {line}: vertex index {index} out of range ({count} vertices defined)")]
    VertexIndex { line: usize, index: i64, count: usize },

    #[error("line {line}: popTransform with no matching pushTransform")]
    EmptyTransformStack { line: usize },

    #[error("scene is missing a `{0}` command")]
    MissingCommand(&'static str),

    #[error("unknown shape type `{0}`")]
    UnknownShape(String),

    #[error("unknown light type `{0}`")]
    UnknownLight(String),

    #[error("invalid scene: {0}")]
    Invalid(String),

    #[error("unsupported file format: {0}")]
    UnsupportedFormat(String),
}

pub type Result<T> = std::result::Result<T, Error>;
