use anyhow::Result;
use clap::Parser;
use gp_core::config::EncodeConfig;
use gp_core::traits::FrameSource;
use gp_export::format_size;
use gp_source::{ImageFolderSource, VideoReader};

pub mod batch;
pub mod cli;

fn main() -> Result<()> {
    // 1. Parser CLI
    let cli = cli::Cli::parse();

    // 2. Initialiser le logging
    env_logger::Builder::new()
        .filter_level(cli.log_level.parse().unwrap_or(log::LevelFilter::Warn))
        .init();

    // 3. Valider la source
    cli.validate_source()?;

    // 4. Charger la config, appliquer les overrides CLI
    let mut config = resolve_config(&cli)?;
    cli.apply_overrides(&mut config);
    log::debug!("Configuration effective : {config:?}");

    // 5. Ouvrir la source
    let mut source = open_source(&cli, &config)?;

    // 6. Encoder
    let summary = batch::run_batch_encode(source.as_mut(), &config, cli.preview)?;
    println!(
        "{} : {} frames, {}",
        config.output.display(),
        summary.frames,
        format_size(summary.bytes)
    );
    Ok(())
}

/// Ouvre la source désignée par la CLI (validée au préalable).
fn open_source(cli: &cli::Cli, config: &EncodeConfig) -> Result<Box<dyn FrameSource>> {
    if let Some(ref path) = cli.video {
        log::info!("Source vidéo : {}", path.display());
        Ok(Box::new(VideoReader::open(path, config)?))
    } else if let Some(ref dir) = cli.frames_dir {
        log::info!("Source dossier : {}", dir.display());
        Ok(Box::new(ImageFolderSource::new(
            dir,
            config.width,
            config.height,
        )?))
    } else {
        anyhow::bail!("Aucune source spécifiée. Utilisez --video ou --frames-dir.")
    }
}

/// Resolve config: a missing file falls back to defaults.
fn resolve_config(cli: &cli::Cli) -> Result<EncodeConfig> {
    if cli.config.exists() {
        gp_core::config::load_config(&cli.config)
    } else {
        log::warn!(
            "Config introuvable : {}. Utilisation des défauts.",
            cli.config.display()
        );
        Ok(EncodeConfig::default())
    }
}
