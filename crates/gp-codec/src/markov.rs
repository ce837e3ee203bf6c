//! Modèle de Markov d'ordre 1 et remappage par rang.
//!
//! Deux passes raster indépendantes, chacune avec un symbole précédent
//! initialisé à 0 : la première compte les transitions, la seconde remplace
//! chaque pixel par son rang de fréquence dans la ligne du symbole précédent.

use gp_core::charset::{NUM_SYMBOLS, Symbol};
use gp_core::frame::{Grid, QuantizedFrame};

use crate::error::{CodecError, Result};

/// Occurrences de chaque rang dans une trame.
pub type Histogram = [u64; NUM_SYMBOLS];

/// Trame de rangs : l'alphabet effectivement codé par Huffman.
pub type RankFrame = Grid<u8>;

/// Symbole implicite précédant le premier pixel.
pub const INITIAL_SYMBOL: Symbol = 0;

/// `counts[prev][cur]` = number of raster-adjacent pairs `prev` then `cur`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TransitionMatrix {
    counts: [[u64; NUM_SYMBOLS]; NUM_SYMBOLS],
}

impl TransitionMatrix {
    /// Première passe : compte les transitions en ordre raster.
    ///
    /// # Errors
    /// Returns `InvalidSymbol` if a cell is outside `0..NUM_SYMBOLS`.
    ///
    /// # Example
    /// ```
    /// use gp_core::frame::Grid;
    /// use gp_codec::markov::TransitionMatrix;
    ///
    /// let frame = Grid::from_rows(&[[1u8, 2], [1, 2]]).unwrap();
    /// let m = TransitionMatrix::from_frame(&frame).unwrap();
    /// assert_eq!(m.count(0, 1), 1);
    /// assert_eq!(m.count(1, 2), 2);
    /// assert_eq!(m.count(2, 1), 1);
    /// ```
    pub fn from_frame(frame: &QuantizedFrame) -> Result<Self> {
        let mut counts = [[0u64; NUM_SYMBOLS]; NUM_SYMBOLS];
        let mut prev = usize::from(INITIAL_SYMBOL);
        for &cell in frame.cells() {
            let cur = checked_symbol(cell)?;
            counts[prev][cur] += 1;
            prev = cur;
        }
        Ok(Self { counts })
    }

    /// Count of `prev` immediately followed by `cur`.
    #[must_use]
    pub fn count(&self, prev: Symbol, cur: Symbol) -> u64 {
        self.counts[usize::from(prev)][usize::from(cur)]
    }

    /// Successor counts of `prev`.
    #[must_use]
    pub fn row(&self, prev: Symbol) -> &[u64; NUM_SYMBOLS] {
        &self.counts[usize::from(prev)]
    }

    /// Sum of all counts, equal to the frame area.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.counts.iter().flatten().sum()
    }

    /// Classement par ligne : rang 0 = successeur le plus fréquent.
    #[must_use]
    pub fn ranks(&self) -> RankMatrix {
        let mut rows = [[0u8; NUM_SYMBOLS]; NUM_SYMBOLS];
        for (row, counts) in rows.iter_mut().zip(&self.counts) {
            *row = rank_row(counts);
        }
        RankMatrix { rows }
    }
}

/// Classe une ligne de comptes.
///
/// Tri stable croissant des symboles par compte, puis rang = `6 - position`.
/// À compte égal, le plus petit symbole reçoit donc le rang le plus élevé.
///
/// # Example
/// ```
/// use gp_codec::markov::rank_row;
/// assert_eq!(rank_row(&[0; 7]), [6, 5, 4, 3, 2, 1, 0]);
/// assert_eq!(rank_row(&[4, 0, 0, 0, 0, 0, 0]), [0, 6, 5, 4, 3, 2, 1]);
/// ```
#[must_use]
pub fn rank_row(counts: &[u64; NUM_SYMBOLS]) -> [u8; NUM_SYMBOLS] {
    let mut order: [usize; NUM_SYMBOLS] = std::array::from_fn(|i| i);
    order.sort_by_key(|&s| counts[s]);
    let mut ranks = [0u8; NUM_SYMBOLS];
    for (pos, &symbol) in order.iter().enumerate() {
        ranks[symbol] = (NUM_SYMBOLS - 1 - pos) as u8;
    }
    ranks
}

/// Table 7×7 : `rank(prev, cur)`. Chaque ligne est une permutation de `0..7`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RankMatrix {
    rows: [[u8; NUM_SYMBOLS]; NUM_SYMBOLS],
}

impl Default for RankMatrix {
    /// Identity ranking on every row.
    fn default() -> Self {
        Self {
            rows: [std::array::from_fn(|i| i as u8); NUM_SYMBOLS],
        }
    }
}

impl RankMatrix {
    /// Build from explicit rows, validating that each is a permutation.
    ///
    /// # Errors
    /// Returns `InvalidPermutation` for a row with a repeat or a value `>= 7`.
    pub fn from_rows(rows: [[u8; NUM_SYMBOLS]; NUM_SYMBOLS]) -> Result<Self> {
        for row in &rows {
            if !is_permutation(row) {
                return Err(CodecError::InvalidPermutation { row: row.to_vec() });
            }
        }
        Ok(Self { rows })
    }

    /// Rank of `cur` after `prev`.
    #[inline(always)]
    #[must_use]
    pub fn rank(&self, prev: Symbol, cur: Symbol) -> u8 {
        self.rows[usize::from(prev)][usize::from(cur)]
    }

    /// Symbol holding `rank` in row `prev` (inverse permutation).
    #[must_use]
    pub fn symbol_at(&self, prev: Symbol, rank: u8) -> Symbol {
        let row = &self.rows[usize::from(prev)];
        row.iter().position(|&r| r == rank).unwrap_or(0) as Symbol
    }

    /// Row `prev`, indexed by current symbol.
    #[must_use]
    pub fn row(&self, prev: Symbol) -> &[u8; NUM_SYMBOLS] {
        &self.rows[usize::from(prev)]
    }

    /// All rows, indexed by previous symbol.
    #[must_use]
    pub fn rows(&self) -> &[[u8; NUM_SYMBOLS]; NUM_SYMBOLS] {
        &self.rows
    }
}

/// `true` if `row` holds each of `0..NUM_SYMBOLS` exactly once.
#[must_use]
pub fn is_permutation(row: &[u8; NUM_SYMBOLS]) -> bool {
    let mut seen = [false; NUM_SYMBOLS];
    for &r in row {
        match seen.get_mut(usize::from(r)) {
            Some(slot) if !*slot => *slot = true,
            _ => return false,
        }
    }
    true
}

/// Sortie du modèle pour une trame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RankTransform {
    /// Per-row rankings, serialized in the record header.
    pub ranks: RankMatrix,
    /// Rang de chaque pixel, mêmes dimensions que l'entrée.
    pub frame: RankFrame,
    /// Occurrences of each rank; sums to the frame area.
    pub histogram: Histogram,
}

/// Applique les deux passes du modèle à une trame quantifiée.
///
/// # Errors
/// Returns `InvalidSymbol` if a cell is outside `0..NUM_SYMBOLS`.
///
/// # Example
/// ```
/// use gp_core::frame::Grid;
/// use gp_codec::markov::rank_transform;
///
/// let frame = Grid::from_rows(&[[0u8, 0], [0, 0]]).unwrap();
/// let t = rank_transform(&frame).unwrap();
/// assert_eq!(t.histogram, [4, 0, 0, 0, 0, 0, 0]);
/// assert!(t.frame.cells().iter().all(|&r| r == 0));
/// ```
pub fn rank_transform(frame: &QuantizedFrame) -> Result<RankTransform> {
    let ranks = TransitionMatrix::from_frame(frame)?.ranks();

    // Seconde passe, état précédent réinitialisé ; on avance sur le symbole
    // d'origine, pas sur le rang.
    let mut histogram = [0u64; NUM_SYMBOLS];
    let mut prev = INITIAL_SYMBOL;
    let ranked = frame.map(|cur| {
        let rank = ranks.rank(prev, cur);
        histogram[usize::from(rank)] += 1;
        prev = cur;
        rank
    });

    log::trace!("rank_transform: histogramme {histogram:?}");

    Ok(RankTransform {
        ranks,
        frame: ranked,
        histogram,
    })
}

#[inline(always)]
fn checked_symbol(value: u8) -> Result<usize> {
    let s = usize::from(value);
    if s < NUM_SYMBOLS {
        Ok(s)
    } else {
        Err(CodecError::InvalidSymbol { value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn uniform_frame_maps_everything_to_rank_zero() {
        let frame = Grid::from_rows(&[[0u8, 0], [0, 0]]).unwrap();
        let t = rank_transform(&frame).unwrap();
        assert_eq!(t.ranks.row(0), &[0, 6, 5, 4, 3, 2, 1]);
        for prev in 1..NUM_SYMBOLS as u8 {
            assert_eq!(t.ranks.row(prev), &[6, 5, 4, 3, 2, 1, 0]);
        }
        assert_eq!(t.histogram, [4, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn second_pass_follows_original_symbols() {
        // 1,2,1,2 : each transition is the only one seen from its row.
        let frame = Grid::from_rows(&[[1u8, 2, 1, 2]]).unwrap();
        let t = rank_transform(&frame).unwrap();
        assert_eq!(t.ranks.row(0), &[6, 0, 5, 4, 3, 2, 1]);
        assert_eq!(t.ranks.row(1), &[6, 5, 0, 4, 3, 2, 1]);
        assert_eq!(t.frame.cells(), &[0, 0, 0, 0]);
        assert_eq!(t.histogram[0], 4);
    }

    #[test]
    fn ties_rank_lower_symbol_as_less_frequent() {
        let ranks = rank_row(&[2, 5, 2, 0, 5, 1, 0]);
        // ascending stable: 3,6 (0) 5 (1) 0,2 (2) 1,4 (5)
        assert_eq!(ranks, [3, 1, 2, 6, 0, 4, 5]);
    }

    #[test]
    fn less_predictable_pixels_get_higher_ranks() {
        let frame = Grid::from_rows(&[[3u8, 3, 3, 5, 3, 3]]).unwrap();
        let t = rank_transform(&frame).unwrap();
        // row 3: 3->3 seen three times, 3->5 once.
        assert_eq!(t.ranks.rank(3, 3), 0);
        assert_eq!(t.ranks.rank(3, 5), 1);
        assert_eq!(t.frame.cells(), &[0, 0, 0, 1, 0, 0]);
        assert_eq!(t.histogram, [5, 1, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn invalid_symbol_rejected() {
        let frame = Grid::from_rows(&[[0u8, 7]]).unwrap();
        assert_eq!(
            rank_transform(&frame),
            Err(CodecError::InvalidSymbol { value: 7 })
        );
    }

    #[test]
    fn rank_matrix_validation() {
        let mut rows = RankMatrix::default().rows;
        assert!(RankMatrix::from_rows(rows).is_ok());
        rows[4] = [0, 1, 2, 3, 4, 5, 5];
        assert!(matches!(
            RankMatrix::from_rows(rows),
            Err(CodecError::InvalidPermutation { .. })
        ));
    }

    #[test]
    fn symbol_at_inverts_rank() {
        let frame = Grid::from_rows(&[[6u8, 1, 4, 4, 2, 6, 1]]).unwrap();
        let m = rank_transform(&frame).unwrap().ranks;
        for prev in 0..NUM_SYMBOLS as u8 {
            for cur in 0..NUM_SYMBOLS as u8 {
                assert_eq!(m.symbol_at(prev, m.rank(prev, cur)), cur);
            }
        }
    }

    fn arb_frame() -> impl Strategy<Value = QuantizedFrame> {
        (1usize..12, 1usize..12).prop_flat_map(|(w, h)| {
            prop::collection::vec(0u8..NUM_SYMBOLS as u8, w * h)
                .prop_map(move |cells| Grid::from_vec(w, h, cells).unwrap())
        })
    }

    proptest! {
        #[test]
        fn every_rank_row_is_a_permutation(frame in arb_frame()) {
            let t = rank_transform(&frame).unwrap();
            for row in t.ranks.rows() {
                prop_assert!(is_permutation(row));
            }
        }

        #[test]
        fn histogram_sums_to_area(frame in arb_frame()) {
            let t = rank_transform(&frame).unwrap();
            prop_assert_eq!(t.histogram.iter().sum::<u64>(), frame.area() as u64);
            prop_assert_eq!(TransitionMatrix::from_frame(&frame).unwrap().total(), frame.area() as u64);
        }

        #[test]
        fn ranks_invert_back_to_symbols(frame in arb_frame()) {
            let t = rank_transform(&frame).unwrap();
            let mut prev = INITIAL_SYMBOL;
            for (&rank, &symbol) in t.frame.cells().iter().zip(frame.cells()) {
                let decoded = t.ranks.symbol_at(prev, rank);
                prop_assert_eq!(decoded, symbol);
                prev = decoded;
            }
        }
    }
}
