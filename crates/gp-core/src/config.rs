use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Largeur par défaut de la sortie, en caractères terminal.
pub const DEFAULT_WIDTH: usize = 80;

/// Ratio d'aspect par défaut de la vidéo source.
pub const DEFAULT_ASPECT_RATIO: f32 = 16.0 / 9.0;

/// Configuration complète d'un encodage.
///
/// Sérialisable en TOML. Chaque champ a une valeur par défaut saine.
///
/// # Example
/// ```
/// use gp_core::config::EncodeConfig;
/// let config = EncodeConfig::default();
/// assert_eq!((config.width, config.height), (80, 22));
/// assert_eq!(config.frame_step(30.0), 2);
/// ```
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct EncodeConfig {
    // === Grille ===
    /// Caractères par ligne.
    pub width: usize,
    /// Lignes par frame.
    pub height: usize,
    /// Aspect ratio of the source, used to derive `height` when only `width` is given.
    pub aspect_ratio: f32,

    // === Cadence ===
    /// Source frame rate. `None` = use the rate reported by ffprobe.
    pub src_fps: Option<f64>,
    /// Cadence de sortie.
    pub dest_fps: f64,

    // === Sortie ===
    /// Fichier binaire produit.
    pub output: PathBuf,

    // === Pipeline ===
    /// Worker threads for the frame pool. 0 = rayon default.
    pub threads: usize,
    /// Bound of the in-flight encoded-frame channel.
    pub queue_depth: usize,
}

impl Default for EncodeConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: derive_height(DEFAULT_WIDTH, DEFAULT_ASPECT_RATIO),
            aspect_ratio: DEFAULT_ASPECT_RATIO,
            src_fps: None,
            dest_fps: 15.0,
            output: PathBuf::from("data"),
            threads: 0,
            queue_depth: 64,
        }
    }
}

/// Hauteur en caractères pour une largeur donnée.
///
/// Les glyphes terminal sont environ deux fois plus hauts que larges.
///
/// # Example
/// ```
/// use gp_core::config::derive_height;
/// assert_eq!(derive_height(80, 16.0 / 9.0), 22);
/// assert_eq!(derive_height(1, 16.0 / 9.0), 1);
/// ```
#[must_use]
pub fn derive_height(width: usize, aspect_ratio: f32) -> usize {
    let h = (width as f32 / (2.0 * aspect_ratio.max(0.01))) as usize;
    h.max(1)
}

impl EncodeConfig {
    /// Clamp all numeric fields to their valid ranges.
    /// Called after TOML deserialization to prevent out-of-range values.
    pub fn clamp_all(&mut self) {
        self.width = self.width.clamp(1, 4096);
        self.height = self.height.clamp(1, 4096);
        self.aspect_ratio = self.aspect_ratio.clamp(0.1, 10.0);
        self.dest_fps = self.dest_fps.clamp(0.1, 240.0);
        self.src_fps = self.src_fps.map(|fps| fps.clamp(0.1, 240.0));
        self.threads = self.threads.min(1024);
        self.queue_depth = self.queue_depth.clamp(1, 4096);
    }

    /// Nombre de frames source consommées par frame de sortie.
    ///
    /// Troncature entière de `src_fps / dest_fps`, jamais moins de 1.
    ///
    /// # Example
    /// ```
    /// use gp_core::config::EncodeConfig;
    /// let config = EncodeConfig::default();
    /// assert_eq!(config.frame_step(30.0), 2);
    /// assert_eq!(config.frame_step(24.0), 1);
    /// assert_eq!(config.frame_step(10.0), 1);
    /// ```
    #[must_use]
    pub fn frame_step(&self, src_fps: f64) -> usize {
        let ratio = src_fps / self.dest_fps;
        if ratio.is_finite() && ratio >= 1.0 {
            ratio as usize
        } else {
            1
        }
    }
}

/// Structure TOML intermédiaire pour désérialisation avec valeurs optionnelles.
#[derive(Deserialize, Default)]
struct ConfigFile {
    grid: Option<GridSection>,
    video: Option<VideoSection>,
    output: Option<OutputSection>,
    pipeline: Option<PipelineSection>,
}

#[derive(Deserialize)]
struct GridSection {
    width: Option<usize>,
    height: Option<usize>,
    aspect_ratio: Option<f32>,
}

#[derive(Deserialize)]
struct VideoSection {
    src_fps: Option<f64>,
    dest_fps: Option<f64>,
}

#[derive(Deserialize)]
struct OutputSection {
    path: Option<PathBuf>,
}

#[derive(Deserialize)]
struct PipelineSection {
    threads: Option<usize>,
    queue_depth: Option<usize>,
}

/// Clés reconnues, par section.
const KNOWN_KEYS: &[(&str, &[&str])] = &[
    ("grid", &["width", "height", "aspect_ratio"]),
    ("video", &["src_fps", "dest_fps"]),
    ("output", &["path"]),
    ("pipeline", &["threads", "queue_depth"]),
];

/// Chemins `section.clé` (ou `section`) absents du schéma, dans l'ordre du document trié.
fn unknown_keys(table: &toml::Table) -> Vec<String> {
    let mut unknown = Vec::new();
    for (section, value) in table {
        let Some((_, keys)) = KNOWN_KEYS.iter().find(|(name, _)| *name == section.as_str()) else {
            unknown.push(section.clone());
            continue;
        };
        if let Some(inner) = value.as_table() {
            unknown.extend(
                inner
                    .keys()
                    .filter(|k| !keys.contains(&k.as_str()))
                    .map(|k| format!("{section}.{k}")),
            );
        }
    }
    unknown
}

/// Parse a TOML document and merge it over the defaults.
///
/// Unknown sections or keys are ignored with a warning.
///
/// # Errors
/// Returns an error if the document is not valid TOML for this schema.
///
/// # Example
/// ```
/// use gp_core::config::parse_config;
/// let config = parse_config("[grid]\nwidth = 40\n").unwrap();
/// assert_eq!((config.width, config.height), (40, 11));
/// ```
pub fn parse_config(content: &str) -> Result<EncodeConfig> {
    let table: toml::Table =
        toml::from_str(content).map_err(|e| CoreError::Config(e.message().to_string()))?;
    for key in unknown_keys(&table) {
        log::warn!("Clé de config inconnue ignorée : {key}");
    }
    let file: ConfigFile = toml::Value::Table(table)
        .try_into()
        .map_err(|e: toml::de::Error| CoreError::Config(e.message().to_string()))?;

    let mut config = EncodeConfig::default();

    if let Some(g) = file.grid {
        if let Some(v) = g.aspect_ratio {
            config.aspect_ratio = v;
        }
        if let Some(v) = g.width {
            config.width = v;
        }
        config.height = match g.height {
            Some(v) => v,
            None => derive_height(config.width, config.aspect_ratio),
        };
    }
    if let Some(v) = file.video {
        if v.src_fps.is_some() {
            config.src_fps = v.src_fps;
        }
        if let Some(fps) = v.dest_fps {
            config.dest_fps = fps;
        }
    }
    if let Some(path) = file.output.and_then(|o| o.path) {
        config.output = path;
    }
    if let Some(p) = file.pipeline {
        if let Some(v) = p.threads {
            config.threads = v;
        }
        if let Some(v) = p.queue_depth {
            config.queue_depth = v;
        }
    }

    config.clamp_all();
    Ok(config)
}

/// Charge un fichier TOML et fusionne avec les valeurs par défaut.
///
/// # Errors
/// Returns an error if the file cannot be read or parsed.
///
/// # Example
/// ```no_run
/// use gp_core::config::load_config;
/// use std::path::Path;
/// let config = load_config(Path::new("config/default.toml")).unwrap();
/// ```
pub fn load_config(path: &Path) -> Result<EncodeConfig> {
    if !path.is_file() {
        return Err(CoreError::FileNotFound {
            path: path.display().to_string(),
        }
        .into());
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Impossible de lire {}", path.display()))?;
    let config =
        parse_config(&content).with_context(|| format!("Config invalide : {}", path.display()))?;
    log::debug!("Config chargée depuis {} : {config:?}", path.display());
    Ok(config)
}
