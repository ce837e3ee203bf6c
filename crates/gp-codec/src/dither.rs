//! Tramage par diffusion d'erreur (Floyd–Steinberg) sur 7 niveaux.
//!
//! La luminance 8 bits est ramenée sur l'échelle `[0, 6]`, puis chaque cellule,
//! en ordre raster, est tronquée vers son niveau discret. L'écart avec le
//! niveau de référence du glyphe (table `LEVELS`, non uniforme) est propagé
//! aux voisins pas encore visités, pondéré sur 16 : 7 à droite, 5 dessous,
//! 3 en bas à gauche, 1 en bas à droite.

use gp_core::charset::{LEVELS, MAX_LEVEL, NUM_SYMBOLS, Symbol};
use gp_core::frame::{GrayFrame, IntensityGrid, QuantizedFrame};

/// Right.
pub const WEIGHT_RIGHT: f64 = 7.0;
/// Below.
pub const WEIGHT_BELOW: f64 = 5.0;
/// Below-left.
pub const WEIGHT_BELOW_LEFT: f64 = 3.0;
/// Below-right.
pub const WEIGHT_BELOW_RIGHT: f64 = 1.0;

/// Ramène une luminance `[0, 255]` sur l'échelle des niveaux `[0, 6]`.
///
/// # Example
/// ```
/// use gp_codec::dither::rescale;
/// assert_eq!(rescale(0), 0.0);
/// assert_eq!(rescale(255), 6.0);
/// ```
#[inline(always)]
#[must_use]
pub fn rescale(lum: u8) -> f64 {
    f64::from(lum) * MAX_LEVEL / 255.0
}

/// Niveau discret d'un échantillon : troncature vers zéro, bornée à `[0, 6]`.
///
/// # Example
/// ```
/// use gp_codec::dither::quantize;
/// assert_eq!(quantize(2.99), 2);
/// assert_eq!(quantize(-0.4), 0);
/// assert_eq!(quantize(6.7), 6);
/// ```
#[inline(always)]
#[must_use]
pub fn quantize(value: f64) -> Symbol {
    // `as` truncates toward zero and maps NaN to 0.
    (value as i64).clamp(0, NUM_SYMBOLS as i64 - 1) as Symbol
}

/// Quantifie une trame en niveaux de gris vers 7 symboles.
///
/// The working copy of the samples is owned by this call and dropped on return;
/// the input frame is never mutated.
///
/// # Example
/// ```
/// use gp_core::frame::Grid;
/// use gp_codec::dither::disperse;
///
/// let gray = Grid::from_rows(&[[0u8, 255], [255, 0]]).unwrap();
/// let q = disperse(&gray);
/// assert_eq!(q.cells(), &[0, 6, 6, 0]);
/// ```
#[must_use]
pub fn disperse(frame: &GrayFrame) -> QuantizedFrame {
    let mut reduced: IntensityGrid = frame.map(rescale);
    let mut out: QuantizedFrame = frame.map(|_| 0);
    let (w, h) = (frame.width(), frame.height());

    for y in 0..h {
        for x in 0..w {
            let value = reduced.get(x, y);
            let level = quantize(value);
            let err16 = (value - LEVELS[usize::from(level)]) / 16.0;

            if x + 1 < w {
                diffuse(&mut reduced, x + 1, y, WEIGHT_RIGHT * err16);
            }
            if y + 1 < h {
                diffuse(&mut reduced, x, y + 1, WEIGHT_BELOW * err16);
                if x + 1 < w {
                    diffuse(&mut reduced, x + 1, y + 1, WEIGHT_BELOW_RIGHT * err16);
                }
                if x >= 1 {
                    diffuse(&mut reduced, x - 1, y + 1, WEIGHT_BELOW_LEFT * err16);
                }
            }

            out.set(x, y, level);
        }
    }

    out
}

#[inline(always)]
fn diffuse(grid: &mut IntensityGrid, x: usize, y: usize, amount: f64) {
    let v = grid.get(x, y);
    grid.set(x, y, v + amount);
}

#[cfg(test)]
mod tests {
    use super::*;
    use gp_core::frame::Grid;

    #[test]
    fn weights_split_the_whole_error() {
        let total = WEIGHT_RIGHT + WEIGHT_BELOW + WEIGHT_BELOW_LEFT + WEIGHT_BELOW_RIGHT;
        assert!((total - 16.0).abs() < f64::EPSILON);
    }

    #[test]
    fn uniform_extremes_need_no_diffusion() {
        let black: GrayFrame = Grid::new(5, 3).unwrap();
        assert!(disperse(&black).cells().iter().all(|&s| s == 0));

        let white = black.map(|_| 255);
        assert!(disperse(&white).cells().iter().all(|&s| s == 6));
    }

    #[test]
    fn error_pushes_right_neighbour_over_threshold() {
        // 125 alone quantizes to 2; the error carried from 60 lifts it to 3.
        assert_eq!(quantize(rescale(125)), 2);
        let gray = Grid::from_rows(&[[60u8, 125]]).unwrap();
        assert_eq!(disperse(&gray).cells(), &[1, 3]);
    }

    #[test]
    fn below_left_reaches_first_column() {
        // (1, 0) diffuses 3/16 of its error into (0, 1), which crosses into level 1.
        assert_eq!(quantize(rescale(42)), 0);
        let gray = Grid::from_rows(&[[0u8, 200], [42, 0]]).unwrap();
        assert_eq!(disperse(&gray).cells(), &[0, 4, 1, 0]);
    }

    #[test]
    fn input_frame_is_not_mutated() {
        let gray = Grid::from_rows(&[[60u8, 125], [10, 250]]).unwrap();
        let before = gray.clone();
        let _ = disperse(&gray);
        assert_eq!(gray, before);
    }

    #[test]
    fn degenerate_shapes_do_not_panic() {
        for (w, h) in [(1, 1), (1, 7), (7, 1)] {
            let gray: GrayFrame = Grid::<u8>::new(w, h).unwrap().map(|_| 140);
            let q = disperse(&gray);
            assert_eq!((q.width(), q.height()), (w, h));
            assert!(q.cells().iter().all(|&s| usize::from(s) < NUM_SYMBOLS));
        }
    }

    #[test]
    fn mean_brightness_is_preserved() {
        let gray: GrayFrame = Grid::<u8>::new(64, 64).unwrap().map(|_| 128);
        let q = disperse(&gray);
        let mean: f64 =
            q.cells().iter().map(|&s| LEVELS[usize::from(s)]).sum::<f64>() / q.area() as f64;
        assert!((mean - rescale(128)).abs() < 0.05, "mean {mean}");
    }

    #[test]
    fn output_covers_full_range_on_gradient() {
        let cells: Vec<u8> = (0..=255u8).collect();
        let gray = Grid::from_vec(16, 16, cells).unwrap();
        let q = disperse(&gray);
        assert!(q.cells().iter().all(|&s| usize::from(s) < NUM_SYMBOLS));
        assert_eq!(q.cells()[0], 0);
        assert!(q.cells().contains(&6));
    }
}
