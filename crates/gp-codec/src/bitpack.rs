//! Concaténation des codes en flux d'octets MSB-first.

use crate::error::{CodecError, Result};
use crate::huffman::{Codeword, HuffmanCode};
use crate::markov::RankFrame;

/// Accumulateur de bits, premier bit écrit = bit de poids fort du premier octet.
///
/// # Example
/// ```
/// use gp_codec::bitpack::BitWriter;
/// let mut w = BitWriter::new();
/// w.push_bits(0b101, 3);
/// w.push_bits(0b1, 1);
/// assert_eq!(w.bit_len(), 4);
/// assert_eq!(w.finish(), vec![0b1011_0000]);
/// ```
#[derive(Debug, Default)]
pub struct BitWriter {
    bytes: Vec<u8>,
    acc: u8,
    filled: u8,
}

impl BitWriter {
    /// Empty writer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-sized for `bits` bits.
    #[must_use]
    pub fn with_capacity(bits: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(bits.div_ceil(8)),
            ..Self::default()
        }
    }

    /// Ajoute les `len` bits de poids faible de `bits`, du plus fort au plus faible.
    pub fn push_bits(&mut self, bits: u32, len: u8) {
        debug_assert!(len <= 32, "at most 32 bits per push");
        for i in (0..len).rev() {
            self.acc = (self.acc << 1) | ((bits >> i) & 1) as u8;
            self.filled += 1;
            if self.filled == 8 {
                self.bytes.push(self.acc);
                self.acc = 0;
                self.filled = 0;
            }
        }
    }

    /// Append one codeword.
    #[inline(always)]
    pub fn push_codeword(&mut self, code: Codeword) {
        self.push_bits(code.bits(), code.len());
    }

    /// Bits written so far, padding excluded.
    #[must_use]
    pub fn bit_len(&self) -> usize {
        self.bytes.len() * 8 + usize::from(self.filled)
    }

    /// Complète le dernier octet avec des zéros (`(8 - len % 8) % 8` bits).
    #[must_use]
    pub fn finish(mut self) -> Vec<u8> {
        if self.filled > 0 {
            self.bytes.push(self.acc << (8 - self.filled));
        }
        self.bytes
    }
}

/// Pack every pixel's codeword in raster order.
///
/// # Errors
/// Returns `InvalidSymbol` if a cell is not a rank `0..7`.
///
/// # Example
/// ```
/// use gp_core::frame::Grid;
/// use gp_codec::bitpack::pack_codewords;
/// use gp_codec::huffman::HuffmanCode;
///
/// let ranks = Grid::from_rows(&[[0u8, 0], [0, 0]]).unwrap();
/// let code = HuffmanCode::build(&[4, 0, 0, 0, 0, 0, 0]);
/// assert_eq!(pack_codewords(&ranks, &code).unwrap(), vec![0x00]);
/// ```
pub fn pack_codewords(frame: &RankFrame, code: &HuffmanCode) -> Result<Vec<u8>> {
    let mut writer = BitWriter::with_capacity(frame.area() * 2);
    for &rank in frame.cells() {
        let cw = code
            .get(rank)
            .ok_or(CodecError::InvalidSymbol { value: rank })?;
        writer.push_codeword(cw);
    }
    log::trace!(
        "pack_codewords: {} bits pour {} pixels",
        writer.bit_len(),
        frame.area()
    );
    Ok(writer.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markov::rank_transform;
    use gp_core::NUM_SYMBOLS;
    use gp_core::frame::Grid;
    use proptest::prelude::*;

    #[test]
    fn empty_writer_yields_no_bytes() {
        assert!(BitWriter::new().finish().is_empty());
    }

    #[test]
    fn full_bytes_need_no_padding() {
        let mut w = BitWriter::new();
        w.push_bits(0xA5, 8);
        w.push_bits(0x3C, 8);
        assert_eq!(w.bit_len(), 16);
        assert_eq!(w.finish(), vec![0xA5, 0x3C]);
    }

    #[test]
    fn codewords_cross_byte_boundaries() {
        let code = HuffmanCode::build(&[10, 6, 4, 3, 2, 1, 1]);
        // 5 -> 1101, 4 -> 111, 6 -> 1100, 1 -> 10
        let ranks = Grid::from_rows(&[[5u8, 4, 6, 1]]).unwrap();
        let bytes = pack_codewords(&ranks, &code).unwrap();
        // 1101 111 1100 10 + 3 bits padding
        assert_eq!(bytes, vec![0b1101_1111, 0b1001_0000]);
    }

    #[test]
    fn out_of_range_rank_rejected() {
        let code = HuffmanCode::build(&[1; NUM_SYMBOLS]);
        let ranks = Grid::from_rows(&[[9u8]]).unwrap();
        assert_eq!(
            pack_codewords(&ranks, &code),
            Err(CodecError::InvalidSymbol { value: 9 })
        );
    }

    proptest! {
        #[test]
        fn packed_stream_decodes_to_rank_frame(
            (w, h, cells) in (1usize..16, 1usize..16).prop_flat_map(|(w, h)| {
                (Just(w), Just(h), prop::collection::vec(0u8..NUM_SYMBOLS as u8, w * h))
            })
        ) {
            let frame = Grid::from_vec(w, h, cells).unwrap();
            let t = rank_transform(&frame).unwrap();
            let code = HuffmanCode::build(&t.histogram);
            let bytes = pack_codewords(&t.frame, &code).unwrap();

            let bits = code.encoded_bits(&t.histogram);
            prop_assert_eq!(bytes.len() as u64, bits.div_ceil(8));

            let decoded = code.tree().decode(&bytes, frame.area()).unwrap();
            prop_assert_eq!(decoded.as_slice(), t.frame.cells());
        }
    }
}
