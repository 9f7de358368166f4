use thiserror::Error;

#[derive(Error, Debug)]
pub enum ThemeError {
    #[error("theme catalog is empty")]
    EmptyCatalog,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Signal unavailable: {0}")]
    Signal(String),
}

pub type Result<T> = std::result::Result<T, ThemeError>;
