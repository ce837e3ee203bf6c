use thiserror::Error;

/// Errors originating from the core module.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Invalid configuration value or structure.
    #[error("Configuration invalide : {0}")]
    Config(String),

    /// Referenced file does not exist.
    #[error("Fichier introuvable : {path}")]
    FileNotFound {
        /// Path that was not found.
        path: String,
    },

    /// Zero-sized grid, or an area that does not fit in memory.
    #[error("Dimensions invalides : {width}×{height}")]
    InvalidDimensions {
        /// Width value.
        width: usize,
        /// Height value.
        height: usize,
    },

    /// A frame does not have the configured grid dimensions.
    #[error("Dimensions inattendues : {width}×{height} (attendu {expected_width}×{expected_height})")]
    DimensionMismatch {
        /// Configured width.
        expected_width: usize,
        /// Configured height.
        expected_height: usize,
        /// Width of the offending frame.
        width: usize,
        /// Height of the offending frame.
        height: usize,
    },

    /// A raw buffer does not hold exactly `width * height` samples.
    #[error("Taille de buffer invalide : {actual} cellules (attendu {expected})")]
    BufferLength {
        /// Expected number of cells.
        expected: usize,
        /// Received number of cells.
        actual: usize,
    },
}
