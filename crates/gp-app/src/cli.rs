use std::path::PathBuf;

use clap::Parser;
use gp_core::config::{EncodeConfig, derive_height};

/// glyphpack : encodeur vidéo ASCII 7 glyphes, une table de Huffman par frame.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Source : chemin vers une vidéo (décodée par ffmpeg).
    #[arg(long)]
    pub video: Option<PathBuf>,

    /// Source : dossier d'images (PNG, JPEG, BMP, GIF), lues par ordre de nom.
    #[arg(long)]
    pub frames_dir: Option<PathBuf>,

    /// Fichier binaire de sortie. Défaut : valeur de la config (`data`).
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Caractères par ligne.
    #[arg(long)]
    pub width: Option<usize>,

    /// Lignes par frame. Dérivée de la largeur si absente.
    #[arg(long)]
    pub height: Option<usize>,

    /// Fichier de configuration TOML. Défaut : config/default.toml.
    #[arg(short, long, default_value = "config/default.toml")]
    pub config: PathBuf,

    /// Cadence source forcée (sinon celle annoncée par ffprobe).
    #[arg(long)]
    pub src_fps: Option<f64>,

    /// Cadence de sortie.
    #[arg(long)]
    pub dest_fps: Option<f64>,

    /// Threads de l'encodeur (0 = un par cœur).
    #[arg(long)]
    pub threads: Option<usize>,

    /// Affiche la frame N en ASCII sur stdout avant l'encodage.
    #[arg(long, value_name = "N")]
    pub preview: Option<usize>,

    /// Niveau de log : error, warn, info, debug, trace.
    #[arg(long, default_value = "warn")]
    pub log_level: String,
}

impl Cli {
    /// Validate that exactly one frame source is provided.
    ///
    /// # Errors
    /// Returns an error if zero or both sources are specified.
    pub fn validate_source(&self) -> anyhow::Result<()> {
        match (&self.video, &self.frames_dir) {
            (None, None) => anyhow::bail!(
                "Aucune source spécifiée. Utilisez --video ou --frames-dir."
            ),
            (Some(_), Some(_)) => anyhow::bail!(
                "Une seule source à la fois. Spécifiez --video OU --frames-dir."
            ),
            _ => Ok(()),
        }
    }

    /// Applique les surcharges CLI sur la configuration chargée, puis la borne.
    pub fn apply_overrides(&self, config: &mut EncodeConfig) {
        if let Some(width) = self.width {
            config.width = width;
            if self.height.is_none() {
                config.height = derive_height(width, config.aspect_ratio);
            }
        }
        if let Some(height) = self.height {
            config.height = height;
        }
        if let Some(ref output) = self.output {
            config.output.clone_from(output);
        }
        if self.src_fps.is_some() {
            config.src_fps = self.src_fps;
        }
        if let Some(fps) = self.dest_fps {
            config.dest_fps = fps;
        }
        if let Some(threads) = self.threads {
            config.threads = threads;
        }
        config.clamp_all();
    }
}
