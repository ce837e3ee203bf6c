use gp_core::CoreError;
use thiserror::Error;

/// Errors originating from the frame codec.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Any failure while processing one frame, tagged with its position in the sequence.
    #[error("Frame {index} : {source}")]
    Frame {
        /// Zero-based frame index in input order.
        index: usize,
        /// Underlying failure.
        source: Box<CodecError>,
    },

    /// Grid shape error (dimensions, buffer length).
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A cell holds a value outside `0..NUM_SYMBOLS`.
    #[error("Symbole invalide : {value}")]
    InvalidSymbol {
        /// Offending value.
        value: u8,
    },

    /// A rank row is not a permutation of `0..NUM_SYMBOLS`.
    #[error("Ligne de rangs non bijective : {row:?}")]
    InvalidPermutation {
        /// Offending row.
        row: Vec<u8>,
    },

    /// A packed permutation index is not below 7!.
    #[error("Index de permutation hors bornes : {code}")]
    PermutationOutOfRange {
        /// Offending 16-bit code.
        code: u16,
    },

    /// Serialized merge tree does not describe a full binary tree over the 7 leaves.
    #[error("Arbre de Huffman invalide : {0}")]
    InvalidTree(String),

    /// Input ended before the expected data was read.
    #[error("Données tronquées : {needed} attendus, {available} disponibles")]
    Truncated {
        /// Units needed.
        needed: usize,
        /// Units available.
        available: usize,
    },
}

impl CodecError {
    /// Attach the frame index to an error (idempotent).
    #[must_use]
    pub fn at_frame(self, index: usize) -> Self {
        match self {
            Self::Frame { .. } => self,
            other => Self::Frame {
                index,
                source: Box::new(other),
            },
        }
    }
}

/// A specialized Result type for codec operations.
pub type Result<T> = std::result::Result<T, CodecError>;
