use thiserror::Error;

#[derive(Error, Debug)]
pub enum RangingError {
    #[error("FFT size must be a power of two >= 2, got {0}")]
    InvalidFftSize(usize),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid procedure data: {0}")]
    InvalidProcedure(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, RangingError>;
