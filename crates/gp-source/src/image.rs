use std::path::Path;

use anyhow::{Context, Result};
use gp_core::frame::{GrayFrame, Grid};

/// Charge une image et la convertit en luminance 8 bits.
///
/// # Errors
/// Returns an error if the image cannot be opened or decoded.
///
/// # Example
/// ```no_run
/// use gp_source::image::load_gray;
/// use std::path::Path;
/// let frame = load_gray(Path::new("frame_0001.png")).unwrap();
/// ```
pub fn load_gray(path: &Path) -> Result<GrayFrame> {
    let img = image::open(path)
        .with_context(|| format!("Impossible de charger {}", path.display()))?;
    let luma = img.to_luma8();
    let (w, h) = luma.dimensions();
    let frame = Grid::from_vec(w as usize, h as usize, luma.into_raw())
        .with_context(|| format!("Image vide : {}", path.display()))?;
    Ok(frame)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn png_is_read_as_luma() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("g.png");
        image::GrayImage::from_fn(3, 2, |x, y| image::Luma([(x * 10 + y) as u8]))
            .save(&path)
            .unwrap();

        let frame = load_gray(&path).unwrap();
        assert_eq!((frame.width(), frame.height()), (3, 2));
        assert_eq!(frame.cells(), &[0, 10, 20, 1, 11, 21]);
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_gray(&dir.path().join("absent.png")).is_err());
    }
}
