use thiserror::Error;

/// Errors raised by the simulation core.
#[derive(Debug, Error)]
pub enum WaveError {
    #[error("grid dimensions must be positive (width={width}, height={height})")]
    InvalidDimensions { width: usize, height: usize },
    #[error(transparent)]
    Shape(#[from] ndarray::ShapeError),
    #[error("backend '{backend}' is unavailable: {reason}")]
    BackendUnavailable {
        backend: &'static str,
        reason: String,
    },
}

pub type Result<T> = std::result::Result<T, WaveError>;

/// Shape error for an array that does not match the grid.
pub(crate) fn incompatible_shape() -> WaveError {
    WaveError::Shape(ndarray::ShapeError::from_kind(
        ndarray::ErrorKind::IncompatibleShape,
    ))
}
