//! Sérialisation d'une trame : matrice de rangs, arbre, flux de codes.
//!
//! Layout of one record, no header and no length prefix:
//!
//! | bytes | content                                                        |
//! |-------|----------------------------------------------------------------|
//! | 14    | 7 × u16 big-endian, Lehmer code of each rank-matrix row        |
//! | 6     | internal tree nodes, `left << 4 \| right`                      |
//! | n     | codewords, MSB-first, zero-padded to a byte boundary           |

use std::io::{self, Write};

use gp_core::charset::NUM_SYMBOLS;

use crate::error::{CodecError, Result};
use crate::huffman::{HuffmanTree, INTERNAL_NODES};
use crate::markov::{RankMatrix, is_permutation};

/// Octets de la matrice de rangs.
pub const RANK_BYTES: usize = 2 * NUM_SYMBOLS;

/// Octets de l'arbre.
pub const TREE_BYTES: usize = INTERNAL_NODES;

/// Fixed part of every record.
pub const HEADER_BYTES: usize = RANK_BYTES + TREE_BYTES;

/// 7! : nombre de permutations, borne exclusive des codes.
pub const PERMUTATION_COUNT: u16 = 5040;

/// Code de Lehmer d'une ligne de rangs (`row[symbol] = rang`).
///
/// Pour chaque rang croissant, l'indice du symbole qui le porte parmi les
/// symboles restants est un chiffre en base mixte 7, 6, 5… (poids 1, 7, 42…).
///
/// # Errors
/// Returns `InvalidPermutation` if `row` is not a permutation of `0..7`.
///
/// # Example
/// ```
/// use gp_codec::record::encode_permutation;
/// assert_eq!(encode_permutation(&[0, 1, 2, 3, 4, 5, 6]).unwrap(), 0);
/// assert_eq!(encode_permutation(&[6, 5, 4, 3, 2, 1, 0]).unwrap(), 5039);
/// ```
pub fn encode_permutation(row: &[u8; NUM_SYMBOLS]) -> Result<u16> {
    if !is_permutation(row) {
        return Err(CodecError::InvalidPermutation { row: row.to_vec() });
    }
    let mut pool: Vec<u8> = (0..NUM_SYMBOLS as u8).collect();
    let mut code: u16 = 0;
    let mut base: u16 = 1;
    for rank in 0..NUM_SYMBOLS as u8 {
        let symbol = row.iter().position(|&r| r == rank).unwrap_or(0) as u8;
        let idx = pool.iter().position(|&s| s == symbol).unwrap_or(0);
        code += idx as u16 * base;
        base *= pool.len() as u16;
        pool.remove(idx);
    }
    Ok(code)
}

/// Inverse de [`encode_permutation`].
///
/// # Errors
/// Returns `PermutationOutOfRange` for `code >= 5040`.
///
/// # Example
/// ```
/// use gp_codec::record::decode_permutation;
/// assert_eq!(decode_permutation(5033).unwrap(), [0, 6, 5, 4, 3, 2, 1]);
/// assert!(decode_permutation(5040).is_err());
/// ```
pub fn decode_permutation(code: u16) -> Result<[u8; NUM_SYMBOLS]> {
    if code >= PERMUTATION_COUNT {
        return Err(CodecError::PermutationOutOfRange { code });
    }
    let mut pool: Vec<u8> = (0..NUM_SYMBOLS as u8).collect();
    let mut rest = code;
    let mut row = [0u8; NUM_SYMBOLS];
    for rank in 0..NUM_SYMBOLS as u8 {
        let radix = pool.len() as u16;
        let symbol = pool.remove(usize::from(rest % radix));
        rest /= radix;
        row[usize::from(symbol)] = rank;
    }
    Ok(row)
}

/// 7 codes de Lehmer, octet fort en premier.
#[must_use]
pub fn encode_rank_matrix(ranks: &RankMatrix) -> [u8; RANK_BYTES] {
    let mut out = [0u8; RANK_BYTES];
    for (chunk, row) in out.chunks_exact_mut(2).zip(ranks.rows()) {
        // Rows of a RankMatrix are permutations by construction.
        let code = encode_permutation(row).unwrap_or(0);
        chunk.copy_from_slice(&code.to_be_bytes());
    }
    out
}

/// Relit la matrice de rangs d'un en-tête.
///
/// # Errors
/// Returns `Truncated` for fewer than 14 bytes, `PermutationOutOfRange` for a bad code.
pub fn decode_rank_matrix(bytes: &[u8]) -> Result<RankMatrix> {
    let bytes = bytes.get(..RANK_BYTES).ok_or(CodecError::Truncated {
        needed: RANK_BYTES,
        available: bytes.len(),
    })?;
    let mut rows = [[0u8; NUM_SYMBOLS]; NUM_SYMBOLS];
    for (row, pair) in rows.iter_mut().zip(bytes.chunks_exact(2)) {
        *row = decode_permutation(u16::from_be_bytes([pair[0], pair[1]]))?;
    }
    RankMatrix::from_rows(rows)
}

/// Un octet par nœud interne : `gauche * 16 + droite`.
///
/// # Example
/// ```
/// use gp_codec::huffman::HuffmanCode;
/// use gp_codec::record::encode_tree;
/// let code = HuffmanCode::build(&[4, 0, 0, 0, 0, 0, 0]);
/// assert_eq!(encode_tree(code.tree()), [0x21, 0x43, 0x65, 0x87, 0xA9, 0x0B]);
/// ```
#[must_use]
pub fn encode_tree(tree: &HuffmanTree) -> [u8; TREE_BYTES] {
    tree.to_bytes()
}

/// Relit et valide l'arbre d'un en-tête.
///
/// # Errors
/// Returns `Truncated` for fewer than 6 bytes, `InvalidTree` for an inconsistent tree.
pub fn decode_tree(bytes: &[u8]) -> Result<HuffmanTree> {
    HuffmanTree::from_bytes(bytes)
}

/// Enregistrement complet d'une trame, prêt à être écrit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameRecord {
    /// Rank-matrix header.
    pub rank_bytes: [u8; RANK_BYTES],
    /// Tree header.
    pub tree_bytes: [u8; TREE_BYTES],
    /// Packed codewords.
    pub payload: Vec<u8>,
}

impl FrameRecord {
    /// Assemble a record from the three encoded parts.
    #[must_use]
    pub fn new(ranks: &RankMatrix, tree: &HuffmanTree, payload: Vec<u8>) -> Self {
        Self {
            rank_bytes: encode_rank_matrix(ranks),
            tree_bytes: encode_tree(tree),
            payload,
        }
    }

    /// Total size in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        HEADER_BYTES + self.payload.len()
    }

    /// Never true: the header is always present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Concaténation rangs, arbre, codes.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.len());
        out.extend_from_slice(&self.rank_bytes);
        out.extend_from_slice(&self.tree_bytes);
        out.extend_from_slice(&self.payload);
        out
    }

    /// Write the whole record with a single `write_all`.
    ///
    /// # Errors
    /// Propagates the writer's I/O error.
    pub fn write_to<W: Write + ?Sized>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_all(&self.to_bytes())
    }
}
