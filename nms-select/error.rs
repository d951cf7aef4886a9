use nms_core::ShapeError;

#[derive(Debug, thiserror::Error)]
pub enum NmsError {
    #[error("Invalid threshold: {0} (must be finite)")]
    InvalidThreshold(f32),
    #[error("Invalid neighborhood size: {0} (must be finite and > 0)")]
    InvalidNeighborhoodSize(f32),
    #[error("Invalid overlap threshold: {0} (must be within 0.0..=1.0)")]
    InvalidOverlapThreshold(f32),
    #[error("Invalid thread count: {0} (must be >= 1)")]
    InvalidThreadCount(usize),
    #[error(transparent)]
    Shape(#[from] ShapeError),
    #[cfg(feature = "serde")]
    #[error("Config I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[cfg(feature = "serde")]
    #[error("JSON config error: {0}")]
    Json(#[from] serde_json::Error),
    #[cfg(feature = "serde")]
    #[error("TOML config parse error: {0}")]
    TomlDe(#[from] toml::de::Error),
    #[cfg(feature = "serde")]
    #[error("TOML config write error: {0}")]
    TomlSer(#[from] toml::ser::Error),
}

pub type NmsResult<T> = Result<T, NmsError>;
