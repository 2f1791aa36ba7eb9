use crate::context::ContextField;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid context: missing required field '{0}'")]
    InvalidContext(ContextField),

    #[error("Invalid vector dimension: expected {expected}, got {actual}")]
    InvalidDimension { expected: usize, actual: usize },

    #[error("Item {item} has emotion cluster {cluster}, but the model only knows {num_classes} clusters")]
    ClusterOutOfRange {
        item: String,
        cluster: usize,
        num_classes: usize,
    },

    #[error("Training set is empty")]
    EmptyTrainingSet,

    #[error("Invalid label {label}: expected a value below {num_classes}")]
    InvalidLabel { label: usize, num_classes: usize },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
