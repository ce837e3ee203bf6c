use anyhow::Result;

use crate::frame::GrayFrame;

/// Fournit des trames en niveaux de gris déjà aux dimensions de la grille.
///
/// Implémenté par : `VideoReader`, `ImageFolderSource`.
///
/// # Example
/// ```
/// use gp_core::traits::FrameSource;
/// use gp_core::frame::GrayFrame;
///
/// struct Empty;
/// impl FrameSource for Empty {
///     fn next_frame(&mut self) -> anyhow::Result<Option<GrayFrame>> { Ok(None) }
///     fn grid_size(&self) -> (usize, usize) { (80, 22) }
/// }
///
/// let frames = gp_core::traits::collect_frames(&mut Empty).unwrap();
/// assert!(frames.is_empty());
/// ```
pub trait FrameSource {
    /// Retourne la prochaine trame, `None` quand la source est épuisée.
    ///
    /// # Errors
    /// Returns an error on a decode failure; the source should not be polled again.
    fn next_frame(&mut self) -> Result<Option<GrayFrame>>;

    /// Dimensions (width, height) of every frame produced.
    fn grid_size(&self) -> (usize, usize);
}

/// Interval between "loading" progress messages.
pub const PROGRESS_INTERVAL: usize = 500;

/// Charge toutes les trames d'une source en mémoire.
///
/// # Errors
/// Propagates the first error returned by the source.
pub fn collect_frames<S: FrameSource + ?Sized>(source: &mut S) -> Result<Vec<GrayFrame>> {
    let mut frames = Vec::new();
    while let Some(frame) = source.next_frame()? {
        if frames.len() % PROGRESS_INTERVAL == 0 {
            log::info!("Chargement frame {}", frames.len());
        }
        frames.push(frame);
    }
    Ok(frames)
}
