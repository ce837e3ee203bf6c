use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use gp_codec::FrameRecord;

/// Écrit des enregistrements complets, bout à bout, sans en-tête ni index.
///
/// Each record is fully built before the single `write_all`, so a failing
/// frame never leaves a partial record behind.
///
/// # Example
/// ```
/// use gp_codec::encode_quantized;
/// use gp_core::frame::Grid;
/// use gp_export::writer::RecordWriter;
///
/// let record = encode_quantized(&Grid::from_rows(&[[0u8, 0], [0, 0]]).unwrap()).unwrap();
/// let mut writer = RecordWriter::new(Vec::new());
/// writer.write_record(&record).unwrap();
/// assert_eq!(writer.bytes_written(), 21);
/// assert_eq!(writer.into_inner().unwrap().len(), 21);
/// ```
pub struct RecordWriter<W: Write> {
    inner: W,
    frames: usize,
    bytes: u64,
}

impl RecordWriter<BufWriter<File>> {
    /// Crée (ou tronque) le fichier de sortie.
    ///
    /// # Errors
    /// Retourne une erreur si le fichier ne peut être créé.
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path)
            .with_context(|| format!("Impossible de créer {}", path.display()))?;
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write> RecordWriter<W> {
    /// Wrap any writer.
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            frames: 0,
            bytes: 0,
        }
    }

    /// Ajoute un enregistrement à la suite des précédents.
    ///
    /// # Errors
    /// Retourne une erreur I/O si l'écriture échoue.
    pub fn write_record(&mut self, record: &FrameRecord) -> Result<()> {
        record
            .write_to(&mut self.inner)
            .with_context(|| format!("Écriture de la frame {} impossible", self.frames))?;
        self.frames += 1;
        self.bytes += record.len() as u64;
        Ok(())
    }

    /// Records written so far.
    #[must_use]
    pub fn frames_written(&self) -> usize {
        self.frames
    }

    /// Bytes written so far.
    #[must_use]
    pub fn bytes_written(&self) -> u64 {
        self.bytes
    }

    /// Vide les tampons et rend le writer sous-jacent.
    ///
    /// # Errors
    /// Retourne une erreur si le flush échoue.
    pub fn into_inner(mut self) -> Result<W> {
        self.inner.flush().context("Flush de la sortie impossible")?;
        Ok(self.inner)
    }

    /// Flush, then return the total byte count.
    ///
    /// # Errors
    /// Retourne une erreur si le flush échoue.
    pub fn finish(mut self) -> Result<u64> {
        self.inner.flush().context("Flush de la sortie impossible")?;
        log::debug!(
            "RecordWriter: {} frames, {} octets",
            self.frames,
            self.bytes
        );
        Ok(self.bytes)
    }
}
