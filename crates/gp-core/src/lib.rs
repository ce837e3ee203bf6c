/// Types partagés, configuration et contrat du jeu de glyphes de glyphpack.
///
/// This crate contains the shared grid types, the fixed charset/level table,
/// the TOML configuration and the core error type used across the workspace.

pub mod charset;
pub mod config;
pub mod error;
pub mod frame;
pub mod traits;

pub use charset::{CHARSET, LEVELS, NUM_SYMBOLS, Symbol};
pub use config::EncodeConfig;
pub use error::CoreError;
pub use frame::{GrayFrame, Grid, IntensityGrid, QuantizedFrame};
