//! Error types for fusemesh

use thiserror::Error;

/// Main error type for fusemesh operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Fusion engine error: {0}")]
    Engine(String),

    #[error("GPU error: {0}")]
    Gpu(String),
}

/// Result type alias for fusemesh operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(feature = "gpu")]
impl From<wgpu::RequestDeviceError> for Error {
    fn from(e: wgpu::RequestDeviceError) -> Self {
        Error::Gpu(e.to_string())
    }
}
