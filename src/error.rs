use thiserror::Error;

#[derive(Error, Debug)]
pub enum DesilenceError {
    #[error("Duration probe failed: {0}")]
    Probe(String),

    #[error("Video split failed: {0}")]
    Split(String),

    #[error("Audio extraction failed: {0}")]
    AudioExtraction(String),

    #[error("Silence detection failed: {0}")]
    Detection(String),

    #[error("Interval trim failed: {0}")]
    Trim(String),

    #[error("Concatenation failed: {0}")]
    Concat(String),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DesilenceError>;
