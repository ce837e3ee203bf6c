/// Sources de trames pour glyphpack : vidéo (ffmpeg), dossier d'images.
///
/// Every source yields greyscale frames already resized to the output grid.

pub mod folder;
pub mod image;
pub mod resize;
pub mod video;

pub use folder::ImageFolderSource;
pub use video::{Decimator, VideoReader};
