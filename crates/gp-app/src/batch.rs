use std::io::Write;
use std::thread;

use anyhow::{Context, Result};
use flume::{Receiver, Sender};
use gp_codec::{CodecError, FrameEncoder, FrameRecord};
use gp_core::config::EncodeConfig;
use gp_core::frame::GrayFrame;
use gp_core::traits::{FrameSource, collect_frames};
use gp_export::{RecordWriter, ReorderBuffer, format_size};
use rayon::prelude::*;

/// Résultat d'une frame, étiqueté par son index d'entrée.
type Indexed = (usize, Result<FrameRecord, CodecError>);

/// Bilan d'un encodage terminé.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeSummary {
    /// Records written.
    pub frames: usize,
    /// Output size in bytes.
    pub bytes: u64,
}

/// Point d'entrée de l'encodage par lots : chargement, encodage, écriture.
///
/// # Errors
/// Retourne une erreur si la source, l'encodage d'une frame, ou l'écriture échoue.
pub fn run_batch_encode(
    source: &mut dyn FrameSource,
    config: &EncodeConfig,
    preview: Option<usize>,
) -> Result<EncodeSummary> {
    let (w, h) = source.grid_size();
    if (w, h) != (config.width, config.height) {
        anyhow::bail!(
            "La source produit des frames {w}x{h}, la grille attend {}x{}",
            config.width,
            config.height
        );
    }

    // === Étape 1 : Chargement complet des frames ===
    log::info!(
        "Étape 1/3 : Chargement des frames ({}x{})",
        config.width,
        config.height
    );
    let frames = collect_frames(source)?;
    log::info!("{} frames chargées", frames.len());

    let encoder = FrameEncoder::from_config(config)?;

    if let Some(n) = preview {
        print_preview(&encoder, &frames, n)?;
    }

    // === Étape 2/3 : Encodage parallèle + écriture ordonnée ===
    log::info!("Étape 2/3 : Encodage vers {}", config.output.display());
    let mut writer = RecordWriter::create(&config.output)?;
    encode_frames(&encoder, &frames, config, &mut writer)?;

    // === Étape 3/3 : Finalisation ===
    let frames_written = writer.frames_written();
    let bytes = writer.finish()?;
    log::info!(
        "Étape 3/3 : {frames_written} frames écrites, {}",
        format_size(bytes)
    );
    Ok(EncodeSummary {
        frames: frames_written,
        bytes,
    })
}

/// Encode `frames` sur un pool rayon et écrit les enregistrements dans l'ordre.
///
/// Frames are dispatched to the pool in input order, each against a credit;
/// the writer hands a credit back per record written. At most `queue_depth`
/// frames are therefore encoding, queued or waiting in the `ReorderBuffer`.
/// The first failing frame (in input order) aborts the run; every record
/// before it is already written.
///
/// Retourne le pic d'occupation du tampon de réordonnancement.
///
/// # Errors
/// Retourne la première erreur d'encodage ou d'écriture.
pub fn encode_frames<W: Write>(
    encoder: &FrameEncoder,
    frames: &[GrayFrame],
    config: &EncodeConfig,
    writer: &mut RecordWriter<W>,
) -> Result<usize> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.threads)
        .thread_name(|i| format!("gp-encode-{i}"))
        .build()
        .context("Impossible de créer le pool d'encodage")?;

    let depth = config.queue_depth.max(1);
    let (tx, rx) = flume::bounded::<Indexed>(depth);
    let (credit_tx, credit_rx) = flume::bounded::<()>(depth);
    for _ in 0..depth {
        credit_tx
            .send(())
            .context("Canal de crédits fermé avant le démarrage")?;
    }

    thread::scope(|s| {
        let pool = &pool;
        let producer = s.spawn(move || {
            pool.in_place_scope(|scope| {
                for (i, frame) in frames.iter().enumerate() {
                    // Err = writer gone: stop dispatching.
                    if credit_rx.recv().is_err() {
                        break;
                    }
                    let tx = tx.clone();
                    scope.spawn(move |_| {
                        let _ = tx.send((i, encoder.encode(i, frame)));
                    });
                }
            });
        });

        let written = write_in_order(rx, credit_tx, writer, frames.len());
        if producer.join().is_err() {
            anyhow::bail!("Le thread d'encodage a paniqué");
        }
        written
    })
}

/// Consomme le canal, rétablit l'ordre et écrit, un crédit rendu par record.
/// `rx` et `credits` sont libérés au retour, ce qui arrête le producteur.
fn write_in_order<W: Write>(
    rx: Receiver<Indexed>,
    credits: Sender<()>,
    writer: &mut RecordWriter<W>,
    expected: usize,
) -> Result<usize> {
    let mut reorder = ReorderBuffer::new();
    let mut peak = 0;
    for (index, result) in rx.iter() {
        reorder.push(index, result)?;
        peak = peak.max(reorder.pending());
        while let Some(result) = reorder.pop_ready() {
            let record = result?;
            writer.write_record(&record)?;
            // Err = everything is dispatched already.
            let _ = credits.send(());
            let done = writer.frames_written();
            if done % gp_core::traits::PROGRESS_INTERVAL == 0 {
                log::info!("Encodage frame {done}/{expected}");
            }
        }
    }
    if reorder.next_index() != expected {
        anyhow::bail!(
            "Encodage incomplet : {} frames sur {expected}",
            reorder.next_index()
        );
    }
    log::debug!("Tampon de réordonnancement : pic à {peak} frames");
    Ok(peak)
}

/// Affiche la frame `index` tramée, une ligne par rangée de la grille.
fn print_preview(encoder: &FrameEncoder, frames: &[GrayFrame], index: usize) -> Result<()> {
    let Some(frame) = frames.get(index) else {
        log::warn!(
            "Aperçu : frame {index} hors limites ({} frames)",
            frames.len()
        );
        return Ok(());
    };
    let quantized = encoder.quantize(index, frame)?;
    print!("{}", quantized.to_ascii());
    Ok(())
}
