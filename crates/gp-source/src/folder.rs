use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use gp_core::frame::GrayFrame;
use gp_core::traits::FrameSource;

use crate::image::load_gray;
use crate::resize::Resizer;

/// Extensions image reconnues.
const IMAGE_EXTS: &[&str] = &["png", "jpg", "jpeg", "bmp", "gif"];

/// Source qui parcourt un dossier d'images, triées par chemin, une frame par image.
///
/// # Example
/// ```no_run
/// use gp_core::traits::{FrameSource, collect_frames};
/// use gp_source::folder::ImageFolderSource;
/// use std::path::Path;
///
/// let mut source = ImageFolderSource::new(Path::new("frames/"), 80, 22).unwrap();
/// let frames = collect_frames(&mut source).unwrap();
/// ```
pub struct ImageFolderSource {
    files: Vec<PathBuf>,
    current_idx: usize,
    width: usize,
    height: usize,
    resizer: Resizer,
}

impl ImageFolderSource {
    /// Scanne `folder_path` (récursivement) et prépare la lecture.
    ///
    /// # Errors
    /// Retourne une erreur si le dossier ne peut être lu ou ne contient aucune image.
    pub fn new(folder_path: &Path, width: usize, height: usize) -> Result<Self> {
        if !folder_path.is_dir() {
            anyhow::bail!("Dossier introuvable : {}", folder_path.display());
        }
        let mut files = Vec::new();
        Self::scan_dir(folder_path, &mut files)?;
        if files.is_empty() {
            anyhow::bail!("Aucune image dans {}", folder_path.display());
        }
        files.sort();
        log::info!(
            "ImageFolderSource: {} images dans {}",
            files.len(),
            folder_path.display()
        );

        Ok(Self {
            files,
            current_idx: 0,
            width,
            height,
            resizer: Resizer::new(),
        })
    }

    /// Extrait récursivement les images reconnues.
    fn scan_dir(dir: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
        let entries =
            fs::read_dir(dir).with_context(|| format!("Lecture impossible : {}", dir.display()))?;
        for entry in entries {
            let path = entry?.path();
            if path.is_dir() {
                Self::scan_dir(&path, files)?;
            } else if path
                .extension()
                .and_then(|s| s.to_str())
                .is_some_and(|ext| IMAGE_EXTS.contains(&ext.to_lowercase().as_str()))
            {
                files.push(path);
            }
        }
        Ok(())
    }

    /// Images found, in read order.
    #[must_use]
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }
}

impl FrameSource for ImageFolderSource {
    fn next_frame(&mut self) -> Result<Option<GrayFrame>> {
        let Some(path) = self.files.get(self.current_idx) else {
            return Ok(None);
        };
        let gray = load_gray(path)?;
        self.current_idx += 1;
        self.resizer.resize(&gray, self.width, self.height).map(Some)
    }

    fn grid_size(&self) -> (usize, usize) {
        (self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gp_core::traits::collect_frames;

    fn write_png(path: &Path, value: u8) {
        image::GrayImage::from_pixel(16, 9, image::Luma([value]))
            .save(path)
            .unwrap();
    }

    #[test]
    fn images_are_read_in_sorted_order_and_resized() {
        let dir = tempfile::tempdir().unwrap();
        write_png(&dir.path().join("b.png"), 200);
        write_png(&dir.path().join("a.png"), 10);
        fs::create_dir(dir.path().join("sub")).unwrap();
        write_png(&dir.path().join("sub").join("c.png"), 120);
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let mut source = ImageFolderSource::new(dir.path(), 8, 3).unwrap();
        assert_eq!(source.files().len(), 3);
        assert_eq!(source.grid_size(), (8, 3));

        let frames = collect_frames(&mut source).unwrap();
        let firsts: Vec<u8> = frames.iter().map(|f| f.cells()[0]).collect();
        assert_eq!(frames.len(), 3);
        assert!(frames.iter().all(|f| (f.width(), f.height()) == (8, 3)));
        assert!(firsts[0].abs_diff(10) <= 1);
        assert!(firsts[1].abs_diff(200) <= 1);
        assert!(firsts[2].abs_diff(120) <= 1);
        assert!(source.next_frame().unwrap().is_none());
    }

    #[test]
    fn empty_folder_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(ImageFolderSource::new(dir.path(), 8, 3).is_err());
        assert!(ImageFolderSource::new(&dir.path().join("absent"), 8, 3).is_err());
    }
}
