use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnnotateError {
    // Dataset errors
    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Invalid dataset file: {0}")]
    DatasetFormat(#[from] serde_json::Error),

    #[error("Unknown count kind '{0}' (expected 'all' or 'annotated')")]
    InvalidCountKind(String),

    // IO and filesystem errors
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Working directory {path:?}: {reason}")]
    WorkDir { path: PathBuf, reason: String },

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unknown configuration key '{0}'")]
    UnknownConfigKey(String),

    #[error("Configuration file parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Configuration file write error: {0}")]
    ConfigWrite(#[from] toml::ser::Error),

    // Rendering errors
    #[error("Image error: {0}")]
    ImageError(#[from] image::ImageError),

    #[error("Render error: {0}")]
    Render(String),

    // Per-call errors
    #[error("Unsupported export format '{0}' (only 'csv' is supported)")]
    UnsupportedFormat(String),

    #[error("Could only generate {produced} of {requested} unique identifiers")]
    Generation { requested: usize, produced: usize },
}

pub type Result<T> = std::result::Result<T, AnnotateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_and_image_errors_convert() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        assert!(matches!(AnnotateError::from(io), AnnotateError::IoError(_)));

        let image = image::ImageError::Limits(image::error::LimitError::from_kind(
            image::error::LimitErrorKind::DimensionError,
        ));
        assert!(matches!(AnnotateError::from(image), AnnotateError::ImageError(_)));
    }
}
