use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DemError {
    /// The source could not be read as one of the supported DEM formats.
    #[error("unsupported or unreadable DEM {path}: {reason}")]
    FileFormat { path: PathBuf, reason: String },

    /// Coordinate reference system could not be parsed or transformed into.
    #[error("coordinate transform failed: {0}")]
    CoordinateTransform(String),

    #[error("invalid query point on line {line}: {content:?}")]
    InvalidPoint { line: usize, content: String },

    #[error("{0}")]
    Gdal(#[from] gdal::errors::GdalError),

    #[error("{0}")]
    Io(#[from] std::io::Error),
}

impl DemError {
    pub(crate) fn file_format(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        DemError::FileFormat {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Attributes a file format error to `path`.
    pub(crate) fn at(self, path: impl Into<PathBuf>) -> Self {
        match self {
            DemError::FileFormat { reason, .. } => DemError::FileFormat {
                path: path.into(),
                reason,
            },
            other => other,
        }
    }
}

pub type Result<T> = std::result::Result<T, DemError>;
