// src/error.rs
use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FieldIoError {
    #[error("Unsupported data type: {0}")]
    UnsupportedType(String),

    #[error("Type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: String },

    #[error("Index {index} out of range for container of length {len}")]
    OutOfRange { index: usize, len: usize },

    #[error("Calculated index {index} exceeds size {len} of data for field \"{field}\"")]
    IndexOutOfRange { field: String, index: usize, len: usize },

    #[error("Dimension not found: {0}")]
    DimensionNotFound(String),

    #[error("Variable not found: {0}")]
    VariableNotFound(String),

    #[error("Data container not found: {0}")]
    ContainerNotFound(String),

    #[error("Field not found in field set: {0}")]
    FieldNotFound(String),

    #[error("Attribute \"{attribute}\" not found on {owner}")]
    AttributeNotFound { owner: String, attribute: String },

    #[error("Field levels misconfiguration for \"{field}\": {levels} levels with no first level requested")]
    LevelMisconfiguration { field: String, levels: usize },

    #[error("Data shape mismatch: expected {expected} values, found {found}")]
    DataShapeMismatch { expected: usize, found: usize },

    #[error("Field configuration error: {0}")]
    Misconfigured(String),

    #[error("Coordinate mismatch: {0}")]
    CoordinateMismatch(String),

    #[error("No time step matches {0}")]
    TimeNotFound(String),

    #[error("Invalid date-time: {0}")]
    InvalidTime(String),

    #[error("File \"{0}\" does not exist")]
    FileMissing(PathBuf),

    #[error("No file path supplied")]
    NoFilePath,

    #[error("Field set has zero fields")]
    EmptyFieldSet,

    #[error("File has not been opened")]
    FileNotOpen,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{context}: {source}")]
    Backend {
        context: String,
        #[source]
        source: BackendError,
    },
}

impl FieldIoError {
    /// Wrap a backend failure with the name of the operation that hit it
    pub fn backend(context: impl Into<String>, source: BackendError) -> Self {
        FieldIoError::Backend {
            context: context.into(),
            source,
        }
    }
}

/// Failures raised by a file backend
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("File opened read-only: {0}")]
    ReadOnly(PathBuf),

    #[error("Variable \"{0}\" is not defined in file")]
    UndefinedVariable(String),

    #[error("Variable \"{name}\" holds {expected} values, received {found}")]
    SizeMismatch { name: String, expected: usize, found: usize },

    #[error("Variable \"{name}\" is typed {expected}, received {found}")]
    TypeMismatch { name: String, expected: String, found: String },

    #[error("Corrupt payload for \"{0}\"")]
    Corrupt(String),
}

pub type Result<T> = std::result::Result<T, FieldIoError>;
