//! multitrack CLI: headless playback and WAV export of a project document.
//!
//! Usage:
//!   mt-cli project.json --assets path/to/assets
//!   mt-cli project.json --assets path/to/assets --wav output.wav
//!
//! Each asset is read from `<assets>/<fileId>.wav`.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;

use anyhow::{Context, Result};
use clap::Parser;
use mt_ir::{format_time, FileId};
use mt_master::{
    open_default_output, run_realtime, AudioOutput, Controller, ControllerError, EngineConfig, ProjectDocument,
};
use serde::Deserialize;

#[derive(Parser)]
#[command(name = "mt-cli", about = "Render or play a multitrack project")]
struct Cli {
    /// Project document (JSON)
    project: PathBuf,

    /// Directory holding `<fileId>.wav` assets
    #[arg(short, long)]
    assets: Option<PathBuf>,

    /// Render to this WAV file instead of playing
    #[arg(long)]
    wav: Option<PathBuf>,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Start position in seconds
    #[arg(long, default_value_t = 0.0)]
    start: f64,

    /// Output sample rate in Hz (overrides the config file)
    #[arg(long)]
    sample_rate: Option<u32>,
}

/// Layout of the optional TOML configuration file.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileConfig {
    engine: EngineConfig,
    assets: Option<PathBuf>,
}

fn load_config(path: Option<&Path>) -> Result<FileConfig> {
    let Some(path) = path else {
        return Ok(FileConfig::default());
    };
    let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    toml::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let file_config = load_config(cli.config.as_deref())?;
    let mut config = file_config.engine;

    let json = fs::read_to_string(&cli.project)
        .with_context(|| format!("reading {}", cli.project.display()))?;
    let doc = ProjectDocument::parse(&json).with_context(|| format!("parsing {}", cli.project.display()))?;

    // Realtime playback follows the device rate unless one is forced.
    let mut output = None;
    if let Some(rate) = cli.sample_rate {
        config.sample_rate = rate;
    } else if cli.wav.is_none() {
        let device = open_default_output().context("opening audio output")?;
        config.sample_rate = device.sample_rate();
        output = Some(device);
    }

    let mut ctrl = Controller::new(config);
    let assets_dir = cli.assets.or(file_config.assets);
    if let Some(dir) = &assets_dir {
        load_assets(&mut ctrl, &doc, dir);
    }

    let report = ctrl.restore_project(&doc)?;
    println!("Project:  {}", ctrl.project_name());
    println!("Tracks:   {}", report.tracks);
    println!("Clips:    {}", report.clips);
    println!("Duration: {}", format_time(ctrl.duration()));
    if !report.missing_assets.is_empty() {
        println!("Missing:  {} assets", report.missing_assets.len());
    }
    println!();

    match cli.wav {
        Some(path) => render_to_wav(&mut ctrl, &path, cli.start),
        None => {
            let mut device = match output {
                Some(device) => device,
                None => open_default_output().context("opening audio output")?,
            };
            play_audio(&mut ctrl, &mut device, cli.start)
        }
    }
}

/// Decode every asset the document mentions. Failures are logged and skipped;
/// the restore reports the clips that lost their asset.
fn load_assets(ctrl: &mut Controller, doc: &ProjectDocument, dir: &Path) {
    let mut wanted: Vec<(FileId, String, String)> = doc
        .audio_files
        .iter()
        .map(|m| (m.id.clone(), m.name.clone(), m.category.clone()))
        .collect();
    for clip in doc.tracks.iter().flat_map(|t| &t.clips) {
        if !wanted.iter().any(|(id, _, _)| id == &clip.file_id) {
            wanted.push((clip.file_id.clone(), clip.file_id.to_string(), String::new()));
        }
    }

    for (id, name, category) in wanted {
        let path = dir.join(format!("{}.wav", id));
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) => {
                log::warn!("{}: {}", path.display(), e);
                continue;
            }
        };
        match ctrl.assets_mut().load_wav(id, &name, &category, &bytes) {
            Ok(meta) => log::debug!("loaded {} ({:.3}s)", meta.id, meta.duration),
            Err(e @ ControllerError::DecodeFailure { .. }) => log::error!("{}", e),
            Err(e) => log::error!("{}: {}", path.display(), e),
        }
    }
}

fn play_audio(ctrl: &mut Controller, output: &mut impl AudioOutput, start: f64) -> Result<()> {
    ctrl.seek(start);
    println!("Playing...");

    let stop = AtomicBool::new(false);
    run_realtime(ctrl, output, &stop, |report| {
        print!("\r{} / {}", format_time(report.current_time), format_time(report.duration));
        let _ = std::io::stdout().flush();
    })?;

    println!("\rDone.                    ");
    Ok(())
}

fn render_to_wav(ctrl: &mut Controller, path: &Path, start: f64) -> Result<()> {
    println!("Rendering to {} at {} Hz...", path.display(), ctrl.config().sample_rate);

    let wav = ctrl.render_to_wav(start);
    println!("Rendered {} bytes", wav.len());

    fs::write(path, &wav).with_context(|| format!("writing {}", path.display()))?;
    println!("Done.");
    Ok(())
}
