// Décodage vidéo via ffmpeg en sous-processus (std::process::Command).
// Prérequis : `ffmpeg` et `ffprobe` accessibles dans PATH.
//
// Architecture :
//   - `probe_video`       : interroge ffprobe pour obtenir width/height/fps
//   - `spawn_ffmpeg_pipe` : lance ffmpeg → flux raw gris 8 bits sur stdout
//   - `Decimator`         : garde la dernière frame de chaque groupe de `step`
//   - `VideoReader`       : FrameSource, lit, décime et redimensionne
//
// stderr de ffmpeg est relayé en `warn` par un thread dédié ; un code de
// sortie non nul à l'EOF est une erreur, pas une fin de flux.

use std::collections::VecDeque;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use std::process::{Child, ChildStderr, Command, Stdio};
use std::thread::{self, JoinHandle};

use anyhow::{Context, Result};
use gp_core::config::EncodeConfig;
use gp_core::frame::{GrayFrame, Grid};
use gp_core::traits::FrameSource;

use crate::resize::Resizer;

/// Métadonnées extraites via ffprobe.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VideoInfo {
    pub width: u32,
    pub height: u32,
    /// Images par seconde (ex: 23.976, 24.0, 30.0, 60.0).
    pub fps: f64,
}

/// Interroge `ffprobe` pour obtenir les métadonnées du flux vidéo principal.
///
/// # Errors
/// Retourne une erreur si `ffprobe` est introuvable ou si le fichier
/// ne contient aucun flux vidéo décodable.
///
/// # Example
/// ```no_run
/// use gp_source::video::probe_video;
/// use std::path::Path;
/// let info = probe_video(Path::new("video.mp4")).unwrap();
/// println!("{}x{} @ {}", info.width, info.height, info.fps);
/// ```
pub fn probe_video(path: &Path) -> Result<VideoInfo> {
    let path_str = path.to_str().context("Chemin vidéo invalide (non-UTF8)")?;

    let output = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-select_streams",
            "v:0",
            "-show_entries",
            "stream=width,height,r_frame_rate",
            "-of",
            "default=noprint_wrappers=1",
            "-i",
            path_str,
        ])
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .context(
            "Impossible de lancer ffprobe. Vérifiez que ffprobe est installé et dans le PATH.",
        )?;

    for line in String::from_utf8_lossy(&output.stderr).lines() {
        log::warn!("ffprobe : {line}");
    }
    let info = parse_probe_output(&String::from_utf8_lossy(&output.stdout));
    if info.width == 0 || info.height == 0 {
        anyhow::bail!(
            "ffprobe n'a trouvé aucun flux vidéo dans {}",
            path.display()
        );
    }

    log::info!(
        "probe_video: {}x{} @ {:.3}fps ({})",
        info.width,
        info.height,
        info.fps,
        path.display()
    );
    Ok(info)
}

/// Lit les lignes `clé=valeur` de ffprobe. Champs absents : 0×0 @ 30 fps.
fn parse_probe_output(text: &str) -> VideoInfo {
    let mut info = VideoInfo {
        width: 0,
        height: 0,
        fps: 30.0,
    };
    for line in text.lines() {
        if let Some(val) = line.strip_prefix("width=") {
            info.width = val.trim().parse().unwrap_or(0);
        } else if let Some(val) = line.strip_prefix("height=") {
            info.height = val.trim().parse().unwrap_or(0);
        } else if let Some(val) = line.strip_prefix("r_frame_rate=") {
            // Format: "24/1" ou "30000/1001"
            let mut parts = val.trim().splitn(2, '/');
            let num: f64 = parts.next().and_then(|s| s.parse().ok()).unwrap_or(30.0);
            let den: f64 = parts.next().and_then(|s| s.parse().ok()).unwrap_or(1.0);
            if den > 0.0 && num > 0.0 {
                info.fps = num / den;
            }
        }
    }
    info
}

/// Lance un processus `ffmpeg` qui écrit des frames grises brutes sur stdout.
///
/// Chaque frame = `width × height` octets (un par pixel, row-major, sans padding),
/// à la résolution et à la cadence natives du fichier.
///
/// # Errors
/// Returns an error if the path is not UTF-8 or ffmpeg cannot be spawned.
pub fn spawn_ffmpeg_pipe(path: &Path) -> Result<Child> {
    let path_str = path.to_str().context("Chemin vidéo invalide (non-UTF8)")?;

    let child = Command::new("ffmpeg")
        .args([
            "-i",
            path_str,
            "-f",
            "rawvideo",
            "-pix_fmt",
            "gray", // 1 octet/pixel
            "-an",
            "-hide_banner",
            "-loglevel",
            "error",
            "pipe:1",
        ])
        .stdout(Stdio::piped())
        .stdin(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()
        .context("Impossible de lancer ffmpeg. Vérifiez que ffmpeg est installé et dans le PATH.")?;

    log::debug!("ffmpeg spawné pour {}", path.display());
    Ok(child)
}

/// Lit exactement `buf.len()` bytes depuis `reader`.
///
/// # Errors
/// Retourne `Ok(true)` si lu avec succès, `Ok(false)` sur EOF avant complétion,
/// `Err` sur erreur I/O fatale.
///
/// # Example
/// ```
/// use gp_source::video::read_exact_or_eof;
/// let mut input: &[u8] = &[1, 2, 3];
/// let mut buf = [0u8; 2];
/// assert!(read_exact_or_eof(&mut input, &mut buf).unwrap());
/// assert!(!read_exact_or_eof(&mut input, &mut buf).unwrap());
/// ```
pub fn read_exact_or_eof<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<bool> {
    let mut total = 0usize;
    while total < buf.len() {
        match reader.read(&mut buf[total..]) {
            Ok(0) => return Ok(false), // EOF
            Ok(n) => total += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e.into()),
        }
    }
    Ok(true)
}

/// Lignes de stderr conservées pour le message d'erreur final.
const STDERR_TAIL: usize = 8;

/// Relaie chaque ligne de `stderr` en `warn` et rend les dernières à la fin du flux.
fn drain_stderr(stderr: ChildStderr) -> Result<JoinHandle<String>> {
    thread::Builder::new()
        .name("gp-ffmpeg-stderr".into())
        .spawn(move || {
            let mut tail = VecDeque::with_capacity(STDERR_TAIL);
            for line in BufReader::new(stderr).lines().map_while(std::io::Result::ok) {
                log::warn!("ffmpeg : {line}");
                if tail.len() == STDERR_TAIL {
                    tail.pop_front();
                }
                tail.push_back(line);
            }
            Vec::from(tail).join("\n")
        })
        .context("Impossible de lancer le thread stderr de ffmpeg")
}

/// Réduction de cadence : sur chaque groupe de `step` frames lues, seule la
/// dernière est gardée. Un groupe incomplet en fin de flux est abandonné.
///
/// # Example
/// ```
/// use gp_source::video::Decimator;
/// let mut d = Decimator::new(2);
/// let kept: Vec<bool> = (0..5).map(|_| d.keep()).collect();
/// assert_eq!(kept, [false, true, false, true, false]);
/// ```
#[derive(Clone, Copy, Debug)]
pub struct Decimator {
    step: usize,
    pos: usize,
}

impl Decimator {
    /// `step` source frames per output frame, at least 1.
    #[must_use]
    pub fn new(step: usize) -> Self {
        Self {
            step: step.max(1),
            pos: 0,
        }
    }

    /// Frames consumed per kept frame.
    #[must_use]
    pub fn step(&self) -> usize {
        self.step
    }

    /// Signale une frame lue ; `true` si elle doit être gardée.
    pub fn keep(&mut self) -> bool {
        self.pos += 1;
        if self.pos == self.step {
            self.pos = 0;
            true
        } else {
            false
        }
    }
}

/// Source vidéo : ffmpeg → décimation → redimensionnement à la grille.
pub struct VideoReader {
    child: Child,
    stderr: Option<JoinHandle<String>>,
    info: VideoInfo,
    decimator: Decimator,
    resizer: Resizer,
    raw: GrayFrame,
    grid: (usize, usize),
    read: usize,
}

impl VideoReader {
    /// Probe `path`, then start decoding at the configured grid size.
    ///
    /// The source rate is `config.src_fps` when set, otherwise the probed rate.
    ///
    /// # Errors
    /// Returns an error if probing or spawning ffmpeg fails.
    pub fn open(path: &Path, config: &EncodeConfig) -> Result<Self> {
        let info = probe_video(path)?;
        let src_fps = config.src_fps.unwrap_or(info.fps);
        let step = config.frame_step(src_fps);
        log::info!(
            "Décimation : {src_fps:.3} → {:.3} fps, 1 frame sur {step}",
            config.dest_fps
        );

        let child = spawn_ffmpeg_pipe(path)?;
        Self::from_child(child, info, step, (config.width, config.height))
    }

    /// Wrap an already spawned decoder writing `info`-sized gray frames on stdout.
    fn from_child(
        mut child: Child,
        info: VideoInfo,
        step: usize,
        grid: (usize, usize),
    ) -> Result<Self> {
        let raw = Grid::new(info.width as usize, info.height as usize)?;
        let stderr = child.stderr.take().map(drain_stderr).transpose()?;
        Ok(Self {
            child,
            stderr,
            info,
            decimator: Decimator::new(step),
            resizer: Resizer::new(),
            raw,
            grid,
            read: 0,
        })
    }

    /// Attend la fin de ffmpeg ; un code non nul devient une erreur.
    fn finish(&mut self) -> Result<()> {
        drop(self.child.stdout.take());
        let status = self.child.wait().context("Attente de ffmpeg impossible")?;
        let stderr = self
            .stderr
            .take()
            .and_then(|h| h.join().ok())
            .unwrap_or_default();
        if !status.success() {
            let code = status
                .code()
                .map_or_else(|| "signal".to_string(), |c| c.to_string());
            anyhow::bail!(
                "ffmpeg a échoué (code {code}) après {} frames source : {}",
                self.read,
                stderr.trim()
            );
        }
        Ok(())
    }

    /// Stream metadata.
    #[must_use]
    pub fn info(&self) -> VideoInfo {
        self.info
    }

    /// Source frames decoded so far, kept or not.
    #[must_use]
    pub fn frames_read(&self) -> usize {
        self.read
    }
}

impl FrameSource for VideoReader {
    fn next_frame(&mut self) -> Result<Option<GrayFrame>> {
        loop {
            let Some(stdout) = self.child.stdout.as_mut() else {
                return Ok(None);
            };
            if !read_exact_or_eof(stdout, self.raw.cells_mut())? {
                log::info!("Vidéo : EOF après {} frames source", self.read);
                self.finish()?;
                return Ok(None);
            }
            self.read += 1;
            if self.decimator.keep() {
                let (w, h) = self.grid;
                return self.resizer.resize(&self.raw, w, h).map(Some);
            }
        }
    }

    fn grid_size(&self) -> (usize, usize) {
        self.grid
    }
}

impl Drop for VideoReader {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}
