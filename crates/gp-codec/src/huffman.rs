//! Construction de Huffman déterministe sur les 7 rangs.
//!
//! Pas de file de priorité : une liste triée par compte décroissant dont on
//! retire les deux dernières entrées, puis réinsertion linéaire du nœud fusionné
//! à la première position de compte `<=`. Cet ordre fixe les codes et l'arbre
//! sérialisé ; tout autre départage produit un fichier différent.

use std::fmt;

use gp_core::charset::{NUM_SYMBOLS, Symbol};

use crate::error::{CodecError, Result};
use crate::markov::Histogram;

/// Nœuds internes d'un arbre binaire complet à 7 feuilles.
pub const INTERNAL_NODES: usize = NUM_SYMBOLS - 1;

/// Identifiant de la racine : le dernier nœud créé.
pub const ROOT_ID: u8 = (NUM_SYMBOLS + INTERNAL_NODES - 1) as u8;

/// Code binaire d'un rang, lu de gauche à droite.
///
/// `bits` holds the code right-aligned: the first bit emitted is bit `len - 1`.
///
/// # Example
/// ```
/// use gp_codec::huffman::HuffmanCode;
/// let c = HuffmanCode::build(&[10, 6, 4, 3, 2, 1, 1]).get(5).unwrap();
/// assert_eq!((c.bits(), c.len()), (0b1101, 4));
/// assert_eq!(c.to_string(), "1101");
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Codeword {
    bits: u32,
    len: u8,
}

impl Codeword {
    /// Code bits, right-aligned.
    #[inline(always)]
    #[must_use]
    pub fn bits(self) -> u32 {
        self.bits
    }

    /// Length in bits.
    #[inline(always)]
    #[must_use]
    pub fn len(self) -> u8 {
        self.len
    }

    /// `true` for the zero-length code.
    #[must_use]
    pub fn is_empty(self) -> bool {
        self.len == 0
    }

    /// Ajoute un bit en tête du code.
    fn prepend(&mut self, bit: bool) {
        if bit {
            self.bits |= 1 << self.len;
        }
        self.len += 1;
    }
}

impl fmt::Display for Codeword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for i in (0..self.len).rev() {
            f.write_str(if (self.bits >> i) & 1 == 1 { "1" } else { "0" })?;
        }
        Ok(())
    }
}

/// Arbre de fusion : la liste ordonnée des nœuds internes `(gauche, droite)`.
///
/// Node ids `0..7` are the leaves (one per rank); internal node `k` of the list
/// has id `7 + k`. The last internal node is the root.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HuffmanTree {
    nodes: Vec<(u8, u8)>,
}

impl HuffmanTree {
    /// Validate an internal-node list read back from a record.
    ///
    /// The list must hold exactly 6 nodes, each child must be created before its
    /// parent, and every node except the root must be referenced exactly once.
    ///
    /// # Errors
    /// Returns `InvalidTree` describing the first violation.
    ///
    /// # Example
    /// ```
    /// use gp_codec::huffman::HuffmanTree;
    /// let tree = HuffmanTree::from_nodes(vec![(2, 1), (4, 3), (6, 5), (8, 7), (10, 9), (0, 11)]).unwrap();
    /// assert_eq!(tree.children(12), Some((0, 11)));
    /// assert!(HuffmanTree::from_nodes(vec![(0, 0)]).is_err());
    /// ```
    pub fn from_nodes(nodes: Vec<(u8, u8)>) -> Result<Self> {
        if nodes.len() != INTERNAL_NODES {
            return Err(CodecError::InvalidTree(format!(
                "{} nœuds internes, {INTERNAL_NODES} attendus",
                nodes.len()
            )));
        }
        let mut referenced = [false; NUM_SYMBOLS + INTERNAL_NODES];
        for (k, &(left, right)) in nodes.iter().enumerate() {
            let id = NUM_SYMBOLS + k;
            for child in [left, right] {
                let c = usize::from(child);
                if c >= id {
                    return Err(CodecError::InvalidTree(format!(
                        "nœud {id} référence {c}, créé après lui"
                    )));
                }
                if referenced[c] {
                    return Err(CodecError::InvalidTree(format!("nœud {c} référencé deux fois")));
                }
                referenced[c] = true;
            }
        }
        // 12 références pour 12 nœuds non-racine, sans doublon : tous couverts.
        Ok(Self { nodes })
    }

    /// Relit l'arbre depuis ses octets sérialisés (`gauche << 4 | droite`).
    ///
    /// # Errors
    /// Returns `Truncated` for fewer than 6 bytes, `InvalidTree` for an inconsistent tree.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let bytes = bytes.get(..INTERNAL_NODES).ok_or(CodecError::Truncated {
            needed: INTERNAL_NODES,
            available: bytes.len(),
        })?;
        Self::from_nodes(bytes.iter().map(|&b| (b >> 4, b & 0x0F)).collect())
    }

    /// Un octet par nœud interne : `gauche * 16 + droite`.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; INTERNAL_NODES] {
        let mut out = [0u8; INTERNAL_NODES];
        for (byte, &(left, right)) in out.iter_mut().zip(&self.nodes) {
            *byte = (left << 4) | (right & 0x0F);
        }
        out
    }

    /// Internal nodes in creation order.
    #[must_use]
    pub fn internal_nodes(&self) -> &[(u8, u8)] {
        &self.nodes
    }

    /// Root node id.
    #[must_use]
    pub fn root(&self) -> u8 {
        (NUM_SYMBOLS + self.nodes.len() - 1) as u8
    }

    /// `(left, right)` of an internal node, `None` for a leaf or unknown id.
    #[must_use]
    pub fn children(&self, node: u8) -> Option<(u8, u8)> {
        usize::from(node)
            .checked_sub(NUM_SYMBOLS)
            .and_then(|k| self.nodes.get(k))
            .copied()
    }

    /// Décode `count` rangs depuis un flux MSB-first en parcourant l'arbre.
    ///
    /// Stops as soon as `count` symbols are out; trailing padding is ignored.
    ///
    /// # Errors
    /// Returns `Truncated` if the bits run out first.
    ///
    /// # Example
    /// ```
    /// use gp_codec::huffman::HuffmanCode;
    /// let code = HuffmanCode::build(&[4, 0, 0, 0, 0, 0, 0]);
    /// // 4 × "0" then 4 padding bits.
    /// assert_eq!(code.tree().decode(&[0x00], 4).unwrap(), vec![0, 0, 0, 0]);
    /// ```
    pub fn decode(&self, bytes: &[u8], count: usize) -> Result<Vec<Symbol>> {
        let mut out = Vec::with_capacity(count);
        if count == 0 {
            return Ok(out);
        }
        let root = self.root();
        let mut node = root;
        for bit in bytes
            .iter()
            .flat_map(|&byte| (0..8).rev().map(move |i| (byte >> i) & 1 == 1))
        {
            let Some((left, right)) = self.children(node) else {
                return Err(CodecError::InvalidTree(format!("nœud {node} inconnu")));
            };
            node = if bit { right } else { left };
            if usize::from(node) < NUM_SYMBOLS {
                out.push(node);
                if out.len() == count {
                    return Ok(out);
                }
                node = root;
            }
        }
        Err(CodecError::Truncated {
            needed: count,
            available: out.len(),
        })
    }
}

/// Table des codes et arbre de fusion d'une trame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HuffmanCode {
    codewords: [Codeword; NUM_SYMBOLS],
    tree: HuffmanTree,
}

/// Entrée de la liste de travail.
struct Entry {
    count: u64,
    members: Vec<Symbol>,
    node: u8,
}

impl HuffmanCode {
    /// Construit codes et arbre à partir de l'histogramme des rangs.
    ///
    /// Tous les rangs participent, y compris ceux de compte nul : chacun reçoit
    /// un code d'au moins un bit et l'inégalité de Kraft est une égalité.
    ///
    /// # Example
    /// ```
    /// use gp_codec::huffman::HuffmanCode;
    /// let code = HuffmanCode::build(&[10, 6, 4, 3, 2, 1, 1]);
    /// assert_eq!(code.get(0).unwrap().to_string(), "00");
    /// assert_eq!(code.get(5).unwrap().to_string(), "1101");
    /// assert_eq!(code.get(7), None);
    /// ```
    #[must_use]
    pub fn build(histogram: &Histogram) -> Self {
        let mut list: Vec<Entry> = histogram
            .iter()
            .enumerate()
            .map(|(i, &count)| Entry {
                count,
                members: vec![i as Symbol],
                node: i as u8,
            })
            .collect();
        // Décroissant sur (compte, id) : à compte égal, le plus petit id en queue.
        list.sort_by(|a, b| b.count.cmp(&a.count).then(b.node.cmp(&a.node)));

        let mut codewords = [Codeword::default(); NUM_SYMBOLS];
        let mut nodes = Vec::with_capacity(INTERNAL_NODES);

        while list.len() > 1 {
            let Some(right) = list.pop() else { break };
            let Some(left) = list.pop() else { break };

            let node = (NUM_SYMBOLS + nodes.len()) as u8;
            nodes.push((left.node, right.node));

            for &s in &left.members {
                codewords[usize::from(s)].prepend(false);
            }
            for &s in &right.members {
                codewords[usize::from(s)].prepend(true);
            }

            let count = left.count + right.count;
            let mut members = left.members;
            members.extend(right.members);

            let pos = list
                .iter()
                .position(|e| e.count <= count)
                .unwrap_or(list.len());
            list.insert(
                pos,
                Entry {
                    count,
                    members,
                    node,
                },
            );
        }

        Self {
            codewords,
            tree: HuffmanTree { nodes },
        }
    }

    /// Code of a rank-symbol, `None` for an out-of-range rank.
    #[must_use]
    pub fn get(&self, rank: u8) -> Option<Codeword> {
        self.codewords.get(usize::from(rank)).copied()
    }

    /// All codes, indexed by rank.
    #[must_use]
    pub fn codewords(&self) -> &[Codeword; NUM_SYMBOLS] {
        &self.codewords
    }

    /// Merge tree.
    #[must_use]
    pub fn tree(&self) -> &HuffmanTree {
        &self.tree
    }

    /// Taille du flux codé en bits, avant padding.
    #[must_use]
    pub fn encoded_bits(&self, histogram: &Histogram) -> u64 {
        histogram
            .iter()
            .zip(&self.codewords)
            .map(|(&n, c)| n * u64::from(c.len()))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn strings(code: &HuffmanCode) -> Vec<String> {
        code.codewords().iter().map(ToString::to_string).collect()
    }

    fn kraft_holds(code: &HuffmanCode) -> bool {
        // Σ 2^-len == 1, scaled by 2^32.
        let sum: u64 = code
            .codewords()
            .iter()
            .map(|c| 1u64 << (32 - u32::from(c.len())))
            .sum();
        sum == 1u64 << 32
    }

    fn prefix_free(code: &HuffmanCode) -> bool {
        let s = strings(code);
        s.iter()
            .enumerate()
            .all(|(i, a)| s.iter().enumerate().all(|(j, b)| i == j || !b.starts_with(a.as_str())))
    }

    #[test]
    fn distinct_counts_reference_build() {
        let code = HuffmanCode::build(&[10, 6, 4, 3, 2, 1, 1]);
        assert_eq!(
            strings(&code),
            ["00", "10", "010", "011", "111", "1101", "1100"]
        );
        assert_eq!(
            code.tree().internal_nodes(),
            &[(6, 5), (7, 4), (2, 3), (1, 8), (0, 9), (11, 10)]
        );
        assert_eq!(code.tree().root(), ROOT_ID);
        assert_eq!(code.encoded_bits(&[10, 6, 4, 3, 2, 1, 1]), 20 + 12 + 12 + 9 + 6 + 4 + 4);
    }

    #[test]
    fn single_dominant_rank_gets_one_bit() {
        let code = HuffmanCode::build(&[4, 0, 0, 0, 0, 0, 0]);
        assert_eq!(
            strings(&code),
            ["0", "1011", "1010", "1001", "1000", "111", "110"]
        );
        assert_eq!(
            code.tree().internal_nodes(),
            &[(2, 1), (4, 3), (6, 5), (8, 7), (10, 9), (0, 11)]
        );
        assert!(kraft_holds(&code));
    }

    #[test]
    fn all_zero_histogram_still_builds_full_tree() {
        let code = HuffmanCode::build(&[0; NUM_SYMBOLS]);
        assert_eq!(code.tree().internal_nodes().len(), INTERNAL_NODES);
        assert!(code.codewords().iter().all(|c| !c.is_empty()));
        assert!(kraft_holds(&code));
        assert!(prefix_free(&code));
        assert!(HuffmanTree::from_nodes(code.tree().internal_nodes().to_vec()).is_ok());
    }

    #[test]
    fn equal_counts_pop_lowest_ids_first() {
        let code = HuffmanCode::build(&[1; NUM_SYMBOLS]);
        // Tail holds id 0, popped as the right child of the first merge.
        assert_eq!(code.tree().internal_nodes()[0], (1, 0));
    }

    #[test]
    fn decode_reports_truncation() {
        let code = HuffmanCode::build(&[10, 6, 4, 3, 2, 1, 1]);
        // "00" × 4 fills one byte; asking for 5 symbols runs out.
        assert_eq!(code.tree().decode(&[0x00], 4).unwrap(), vec![0; 4]);
        assert_eq!(
            code.tree().decode(&[0x00], 5),
            Err(CodecError::Truncated {
                needed: 5,
                available: 4
            })
        );
        assert!(code.tree().decode(&[], 0).unwrap().is_empty());
    }

    #[test]
    fn malformed_trees_rejected() {
        // forward reference
        assert!(HuffmanTree::from_nodes(vec![(8, 1), (2, 3), (4, 5), (6, 7), (9, 10), (11, 0)]).is_err());
        // duplicate child
        assert!(HuffmanTree::from_nodes(vec![(1, 1), (2, 3), (4, 5), (6, 7), (8, 9), (10, 11)]).is_err());
        // wrong arity
        assert!(HuffmanTree::from_nodes(vec![(1, 0), (2, 3), (4, 5), (6, 7), (8, 9)]).is_err());
    }

    #[test]
    fn codewords_accessible_by_rank() {
        let code = HuffmanCode::build(&[10, 6, 4, 3, 2, 1, 1]);
        assert_eq!(code.get(6).map(|c| (c.bits(), c.len())), Some((0b1100, 4)));
        assert_eq!(code.get(NUM_SYMBOLS as u8), None);
        assert!(Codeword::default().is_empty());
    }

    proptest! {
        #[test]
        fn kraft_equality_and_prefix_freedom(hist in prop::array::uniform7(0u64..1000)) {
            let code = HuffmanCode::build(&hist);
            prop_assert!(kraft_holds(&code));
            prop_assert!(prefix_free(&code));
            prop_assert!(code.codewords().iter().all(|c| c.len() as usize <= INTERNAL_NODES));
        }

        #[test]
        fn tree_always_validates(hist in prop::array::uniform7(0u64..50)) {
            let code = HuffmanCode::build(&hist);
            let rebuilt = HuffmanTree::from_nodes(code.tree().internal_nodes().to_vec()).unwrap();
            prop_assert_eq!(&rebuilt, code.tree());
        }

        #[test]
        fn more_frequent_never_longer(hist in prop::array::uniform7(0u64..1000)) {
            let code = HuffmanCode::build(&hist);
            for a in 0..NUM_SYMBOLS {
                for b in 0..NUM_SYMBOLS {
                    if hist[a] > hist[b] {
                        prop_assert!(code.codewords()[a].len() <= code.codewords()[b].len());
                    }
                }
            }
        }
    }
}
