//! Jeu de 7 glyphes et niveaux de luminosité de référence.
//!
//! Contrat figé partagé par l'encodeur et tout décodeur : changer un caractère
//! ou un niveau rend les fichiers produits illisibles.

/// Index d'un niveau discret, `0..NUM_SYMBOLS`.
pub type Symbol = u8;

/// Nombre de glyphes (et de niveaux de quantification).
pub const NUM_SYMBOLS: usize = 7;

/// Glyphes du plus clair au plus dense.
pub const CHARSET: &str = " ,(S#g@";

/// Same glyphs, indexable by symbol.
pub const GLYPHS: [char; NUM_SYMBOLS] = [' ', ',', '(', 'S', '#', 'g', '@'];

/// Luminosité perçue de chaque glyphe, sur l'échelle `[0.0, 6.0]`.
///
/// Non uniforme : sert de valeur de reconstruction pour la diffusion d'erreur.
pub const LEVELS: [f64; NUM_SYMBOLS] = [0.000, 1.060, 2.167, 3.036, 3.977, 4.730, 6.000];

/// Highest symbol value, as a float on the level scale.
pub const MAX_LEVEL: f64 = (NUM_SYMBOLS - 1) as f64;

/// Glyph for a symbol, `None` if the symbol is out of range.
///
/// # Example
/// ```
/// use gp_core::charset::glyph;
/// assert_eq!(glyph(0), Some(' '));
/// assert_eq!(glyph(6), Some('@'));
/// assert_eq!(glyph(7), None);
/// ```
#[inline(always)]
#[must_use]
pub fn glyph(symbol: Symbol) -> Option<char> {
    GLYPHS.get(usize::from(symbol)).copied()
}
