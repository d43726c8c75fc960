mod audio;
mod cli;
mod config;
mod error;

use anyhow::{Context, Result};
use clap::Parser;

use audio::features::OnsetReport;
use cli::Cli;
use config::{Config, OutputFormat};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let cli = Cli::parse();

    let mut cfg = Config::default();
    if let Some(path) = config::find_config(cli.config.clone()) {
        match config::load_config(&path) {
            Some(loaded) => {
                log::info!("Loaded config from {}", path.display());
                cfg = loaded;
            }
            None if cli.config.is_some() => {
                anyhow::bail!("Failed to load config from {}", path.display());
            }
            None => log::warn!("Failed to load config from {}", path.display()),
        }
    }

    // CLI flags override the config file
    let analysis = &mut cfg.analysis;
    if let Some(threshold) = cli.threshold {
        analysis.threshold = threshold;
    }
    if let Some(min_gap_ms) = cli.min_gap_ms {
        analysis.min_gap_ms = min_gap_ms;
    }
    if let Some(smoothing) = cli.smoothing {
        analysis.smoothing = smoothing;
    }
    if let Some(window) = cli.window {
        analysis.window = window;
    }
    if cli.header_rate {
        analysis.use_header_sample_rate = true;
    }
    if cli.sequential {
        analysis.parallel = false;
    }
    if let Some(format) = cli.format {
        cfg.output.format = format;
    }
    if cli.scalars {
        cfg.output.show_scalars = true;
    }

    if !cli.input.exists() {
        anyhow::bail!("Input file not found: {}", cli.input.display());
    }
    log::info!("Input: {}", cli.input.display());

    let audio_data = audio::decode::decode_audio(&cli.input)?;
    log::info!(
        "Duration: {:.1}s at {}Hz",
        audio_data.duration_secs(),
        audio_data.header.sample_rate
    );

    let report = audio::analysis::analyze(&audio_data, &cfg.analysis)
        .context("Onset analysis failed")?;
    log::info!("Detected {} onsets", report.onset_count());

    match cfg.output.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Text => print_text(&report, cfg.output.show_scalars),
    }

    Ok(())
}

fn print_text(report: &OnsetReport, show_scalars: bool) {
    println!("{}", join(&report.gaps_ms));
    if show_scalars {
        println!("{}", join(&report.scalars));
    }
}

fn join<T: ToString>(values: &[T]) -> String {
    values
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
