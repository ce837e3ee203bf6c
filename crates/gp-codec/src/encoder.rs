//! Encodeur de trame : tramage, modèle de rangs, Huffman, sérialisation.

use gp_core::config::EncodeConfig;
use gp_core::frame::{GrayFrame, QuantizedFrame, checked_area};
use rayon::prelude::*;

use crate::bitpack::pack_codewords;
use crate::dither::disperse;
use crate::error::{CodecError, Result};
use crate::huffman::HuffmanCode;
use crate::markov::rank_transform;
use crate::record::FrameRecord;

/// Encode une trame déjà quantifiée en un enregistrement complet.
///
/// # Errors
/// Returns `InvalidSymbol` if a cell is outside `0..7`.
///
/// # Example
/// ```
/// use gp_core::frame::Grid;
/// use gp_codec::encoder::encode_quantized;
///
/// let frame = Grid::from_rows(&[[0u8, 0], [0, 0]]).unwrap();
/// let record = encode_quantized(&frame).unwrap();
/// assert_eq!(record.len(), 21);
/// assert_eq!(record.payload, vec![0x00]);
/// ```
pub fn encode_quantized(frame: &QuantizedFrame) -> Result<FrameRecord> {
    let transform = rank_transform(frame)?;
    let code = HuffmanCode::build(&transform.histogram);
    let payload = pack_codewords(&transform.frame, &code)?;
    Ok(FrameRecord::new(&transform.ranks, code.tree(), payload))
}

/// Encodeur à dimensions fixes.
///
/// Every frame handed to it must match `width × height`; a mismatch is fatal
/// for that frame and reported with its index.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameEncoder {
    width: usize,
    height: usize,
}

impl FrameEncoder {
    /// # Errors
    /// Returns `Core(InvalidDimensions)` for a zero or overflowing area.
    pub fn new(width: usize, height: usize) -> Result<Self> {
        checked_area(width, height)?;
        Ok(Self { width, height })
    }

    /// Grid size taken from the configuration.
    ///
    /// # Errors
    /// Same as [`FrameEncoder::new`].
    pub fn from_config(config: &EncodeConfig) -> Result<Self> {
        Self::new(config.width, config.height)
    }

    /// Largeur attendue.
    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Hauteur attendue.
    #[must_use]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Vérifie les dimensions puis tramage de la trame `index`.
    ///
    /// # Errors
    /// Returns `Frame { index, .. }` wrapping `DimensionMismatch`.
    pub fn quantize(&self, index: usize, frame: &GrayFrame) -> Result<QuantizedFrame> {
        frame
            .ensure_dimensions(self.width, self.height)
            .map_err(|e| CodecError::from(e).at_frame(index))?;
        Ok(disperse(frame))
    }

    /// Encode la trame `index` de bout en bout.
    ///
    /// # Errors
    /// Any failure, tagged with `index`.
    pub fn encode(&self, index: usize, frame: &GrayFrame) -> Result<FrameRecord> {
        let quantized = self.quantize(index, frame)?;
        let record = encode_quantized(&quantized).map_err(|e| e.at_frame(index))?;
        log::debug!(
            "Frame {index} : {} octets ({} de codes)",
            record.len(),
            record.payload.len()
        );
        Ok(record)
    }

    /// Encode une séquence complète, enregistrements dans l'ordre d'entrée.
    ///
    /// Dithering runs frame-parallel on the rayon pool; the indexed collect keeps
    /// input order, then modeling and serialization run sequentially.
    ///
    /// # Errors
    /// The error of the lowest-indexed failing frame.
    pub fn encode_all(&self, frames: &[GrayFrame]) -> Result<Vec<FrameRecord>> {
        let quantized: Vec<QuantizedFrame> = frames
            .par_iter()
            .enumerate()
            .map(|(i, f)| self.quantize(i, f))
            .collect::<Vec<_>>()
            .into_iter()
            .collect::<Result<_>>()?;

        quantized
            .iter()
            .enumerate()
            .map(|(i, q)| encode_quantized(q).map_err(|e| e.at_frame(i)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::huffman::HuffmanTree;
    use crate::markov::INITIAL_SYMBOL;
    use crate::record::{HEADER_BYTES, RANK_BYTES, decode_rank_matrix};
    use gp_core::CoreError;
    use gp_core::frame::Grid;
    use proptest::prelude::*;

    /// Relit un enregistrement jusqu'à la trame de symboles d'origine.
    fn read_back(bytes: &[u8], width: usize, height: usize) -> QuantizedFrame {
        let ranks = decode_rank_matrix(bytes).unwrap();
        let tree = HuffmanTree::from_bytes(&bytes[RANK_BYTES..]).unwrap();
        let rank_cells = tree.decode(&bytes[HEADER_BYTES..], width * height).unwrap();
        let mut prev = INITIAL_SYMBOL;
        let cells = rank_cells
            .into_iter()
            .map(|r| {
                prev = ranks.symbol_at(prev, r);
                prev
            })
            .collect();
        Grid::from_vec(width, height, cells).unwrap()
    }

    fn gray(width: usize, height: usize, seed: u32) -> GrayFrame {
        let cells = (0..width * height)
            .map(|i| ((i as u32 * 37 + seed * 11) % 256) as u8)
            .collect();
        Grid::from_vec(width, height, cells).unwrap()
    }

    #[test]
    fn uniform_two_by_two_record() {
        let frame = Grid::from_rows(&[[0u8, 0], [0, 0]]).unwrap();
        let bytes = encode_quantized(&frame).unwrap().to_bytes();
        assert_eq!(bytes.len(), 21);
        // row 0 = [0,6,5,4,3,2,1] -> 5033, rows 1..7 reversed -> 5039
        assert_eq!(&bytes[..2], &[0x13, 0xA9]);
        assert!(bytes[2..RANK_BYTES].chunks(2).all(|p| p == [0x13, 0xAF]));
        assert_eq!(
            &bytes[RANK_BYTES..HEADER_BYTES],
            &[0x21, 0x43, 0x65, 0x87, 0xA9, 0x0B]
        );
        assert_eq!(bytes[HEADER_BYTES], 0x00);
    }

    #[test]
    fn dimension_mismatch_carries_frame_index() {
        let encoder = FrameEncoder::new(4, 2).unwrap();
        let frames = vec![gray(4, 2, 0), gray(4, 2, 1), gray(3, 2, 2)];
        let err = encoder.encode_all(&frames).unwrap_err();
        assert_eq!(
            err,
            CodecError::Frame {
                index: 2,
                source: Box::new(CodecError::Core(CoreError::DimensionMismatch {
                    expected_width: 4,
                    expected_height: 2,
                    width: 3,
                    height: 2,
                })),
            }
        );
        assert!(err.to_string().starts_with("Frame 2"));
    }

    #[test]
    fn zero_area_encoder_rejected() {
        assert!(matches!(
            FrameEncoder::new(0, 22),
            Err(CodecError::Core(CoreError::InvalidDimensions { .. }))
        ));
        let config = EncodeConfig::default();
        let encoder = FrameEncoder::from_config(&config).unwrap();
        assert_eq!((encoder.width(), encoder.height()), (80, 22));
    }

    #[test]
    fn parallel_batch_matches_sequential_encoding() {
        let encoder = FrameEncoder::new(16, 6).unwrap();
        let frames: Vec<GrayFrame> = (0..24).map(|s| gray(16, 6, s)).collect();
        let batch = encoder.encode_all(&frames).unwrap();
        for (i, (frame, record)) in frames.iter().zip(&batch).enumerate() {
            assert_eq!(&encoder.encode(i, frame).unwrap(), record);
        }
    }

    #[test]
    fn encoding_is_deterministic() {
        let encoder = FrameEncoder::new(80, 22).unwrap();
        let frame = gray(80, 22, 7);
        assert_eq!(encoder.encode(0, &frame), encoder.encode(0, &frame));
    }

    #[test]
    fn record_reads_back_to_quantized_frame() {
        let frame = gray(80, 22, 3);
        let quantized = disperse(&frame);
        let bytes = encode_quantized(&quantized).unwrap().to_bytes();
        assert_eq!(read_back(&bytes, 80, 22), quantized);
    }

    proptest! {
        #[test]
        fn any_gray_frame_round_trips(
            (w, h, cells) in (1usize..24, 1usize..12).prop_flat_map(|(w, h)| {
                (Just(w), Just(h), prop::collection::vec(any::<u8>(), w * h))
            })
        ) {
            let frame = Grid::from_vec(w, h, cells).unwrap();
            let encoder = FrameEncoder::new(w, h).unwrap();
            let record = encoder.encode(0, &frame).unwrap();
            prop_assert_eq!(read_back(&record.to_bytes(), w, h), disperse(&frame));
        }
    }
}
