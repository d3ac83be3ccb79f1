use thiserror::Error;

// Engine Error Type

#[derive(Error, Debug)]
pub enum ClassifyError {
    #[error(
        "Malformed input: a {width}x{height} RGBA bitmap needs {expected} bytes, got {actual}"
    )]
    MalformedInput {
        width: u32,
        height: u32,
        /// Computed in `u128` so oversized dimensions cannot wrap.
        expected: u128,
        actual: usize,
    },
    #[error("Invalid policy: {0}")]
    InvalidPolicy(String),
    #[error("Band worker failed: {0}")]
    Worker(String),
}

// Application Error Type

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Classification Error: {0}")]
    Classify(#[from] ClassifyError),
    #[error("Image Error: {0}")]
    Image(#[from] image::ImageError),
    #[error("Failed to read {1}: {0}")]
    Read(std::io::Error, String),
    #[error("JSON Error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T, E = ClassifyError> = std::result::Result<T, E>;
