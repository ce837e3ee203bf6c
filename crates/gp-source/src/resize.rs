use anyhow::{Context, Result};
use fast_image_resize::images::Image;
use fast_image_resize::{FilterType, PixelType, ResizeAlg, ResizeOptions, Resizer as FirResizer};
use gp_core::frame::{GrayFrame, Grid};

/// Resizer niveaux de gris réutilisable, wrappant fast_image_resize.
///
/// Interpolation bilinéaire, un octet par pixel. Le resizer interne et le
/// tampon source sont conservés d'un appel à l'autre.
///
/// # Example
/// ```
/// use gp_source::resize::Resizer;
/// let r = Resizer::new();
/// ```
pub struct Resizer {
    inner: FirResizer,
    options: ResizeOptions,
    /// Scratch copy of the source (the resize API takes `&mut` on both images).
    src_buf: Vec<u8>,
}

impl Resizer {
    /// Create a new bilinear resizer.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: FirResizer::new(),
            options: ResizeOptions::new().resize_alg(ResizeAlg::Convolution(FilterType::Bilinear)),
            src_buf: Vec::new(),
        }
    }

    /// Resize `src` into `dst`. Dimensions of `dst` determine output size.
    ///
    /// # Errors
    /// Returns an error if a dimension does not fit in `u32` or the resize fails.
    ///
    /// # Example
    /// ```
    /// use gp_core::frame::Grid;
    /// use gp_source::resize::Resizer;
    /// let mut r = Resizer::new();
    /// let src = Grid::<u8>::new(100, 100).unwrap();
    /// let mut dst = Grid::<u8>::new(80, 22).unwrap();
    /// r.resize_into(&src, &mut dst).unwrap();
    /// ```
    pub fn resize_into(&mut self, src: &GrayFrame, dst: &mut GrayFrame) -> Result<()> {
        if src.width() == dst.width() && src.height() == dst.height() {
            dst.cells_mut().copy_from_slice(src.cells());
            return Ok(());
        }

        let (sw, sh) = (to_u32(src.width())?, to_u32(src.height())?);
        let (dw, dh) = (to_u32(dst.width())?, to_u32(dst.height())?);

        self.src_buf.clear();
        self.src_buf.extend_from_slice(src.cells());

        let src_image = Image::from_slice_u8(sw, sh, &mut self.src_buf, PixelType::U8)
            .context("Dimensions source invalides")?;
        let mut dst_image = Image::from_slice_u8(dw, dh, dst.cells_mut(), PixelType::U8)
            .context("Dimensions destination invalides")?;

        self.inner
            .resize(&src_image, &mut dst_image, Some(&self.options))
            .context("Échec du redimensionnement")?;

        Ok(())
    }

    /// Resize into a freshly allocated `width × height` frame.
    ///
    /// # Errors
    /// Returns an error for a zero-sized target or a failed resize.
    pub fn resize(&mut self, src: &GrayFrame, width: usize, height: usize) -> Result<GrayFrame> {
        let mut dst = Grid::new(width, height)?;
        self.resize_into(src, &mut dst)?;
        Ok(dst)
    }
}

impl Default for Resizer {
    fn default() -> Self {
        Self::new()
    }
}

fn to_u32(v: usize) -> Result<u32> {
    u32::try_from(v).with_context(|| format!("Dimension trop grande : {v}"))
}
