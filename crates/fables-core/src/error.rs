use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Process not found: {0}")]
    ProcessNotFound(String),

    #[error("Failed to open process: {0}")]
    ProcessOpenFailed(String),

    #[error("Module not loaded in target process: {0}")]
    ModuleNotLoaded(String),

    #[error("Failed to read process memory at address {address:#x}: {message}")]
    MemoryReadFailed { address: u64, message: String },

    #[error("Null pointer at step {step} of pointer chain")]
    NullPointer { step: usize },

    #[error("Size mismatch: expected {expected} bytes, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    #[error("Couldn't read {field}: {source}")]
    FieldUnreadable {
        field: String,
        #[source]
        source: Box<Error>,
    },

    #[error("No process is bound")]
    NotBound,

    #[error("Split configuration error: {0}")]
    SplitConfig(String),

    #[error("Encoding error: {0}")]
    EncodingError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
