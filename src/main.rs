//! Box-score OCR
//!
//! Reads a screenshot of a basketball game's box-score screen and prints
//! one player's stat line as JSON, optionally appending it to a CSV log.

mod batch;
mod boxscore;
mod config;
mod export;
mod ocr;
mod paths;
mod remote;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use boxscore::{BoxScoreExtractor, BoxScoreSource};
use config::AppConfig;
use ocr::TesseractEngine;
use remote::RemoteExtractor;

/// Logs a message to both stderr and log file with timestamp.
pub fn log(msg: &str) {
    let timestamp = Local::now().format("%H:%M:%S%.3f");
    let line = format!("[{}] {}\n", timestamp, msg);
    eprint!("{}", line);
    let log_path = paths::get_logs_dir().join("boxscore_ocr.log");
    if let Ok(mut file) = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
    {
        let _ = file.write_all(line.as_bytes());
    }
}

/// Reads one player's stat line from a basketball box-score screenshot.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None, arg_required_else_help = true)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// config.json to load (default: next to the executable)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Send screenshots to a remote parser instead of local OCR
    #[arg(long, global = true, value_name = "URL")]
    remote: Option<String>,

    /// Append successful rows to a CSV file (boxscores.csv next to the
    /// executable when no path is given)
    #[arg(long, global = true, value_name = "PATH")]
    csv: Option<Option<PathBuf>>,

    /// Game date (YYYY-MM-DD) for screenshots that show none; defaults to today
    #[arg(long, global = true, value_parser = parse_date)]
    date: Option<NaiveDate>,
}

#[derive(Subcommand, Debug, PartialEq)]
enum Command {
    /// Extract one player's stat line from a screenshot
    Extract { image: PathBuf, username: String },
    /// Extract the same player from several screenshots
    Batch {
        username: String,
        #[arg(required = true)]
        images: Vec<PathBuf>,
    },
}

fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|e| format!("expected YYYY-MM-DD ({})", e))
}

/// Local OCR pipeline, or the remote parser when a URL is configured.
fn build_source(config: &AppConfig, remote_override: Option<&str>) -> Result<Box<dyn BoxScoreSource + Sync>> {
    if let Some(url) = remote_override.or(config.remote_url.as_deref()) {
        let remote = RemoteExtractor::new(url, Duration::from_secs(config.remote_timeout_secs))?;
        log(&format!("Using remote parser at {}", remote.endpoint()));
        return Ok(Box::new(remote));
    }

    let tesseract = ocr::resolve_tesseract(
        config.tesseract_path.as_deref().map(Path::new),
        config.tessdata_dir.as_deref().map(Path::new),
    )?;
    let engine = TesseractEngine::new(
        tesseract,
        config.tesseract_psm,
        config.preprocess_options(),
        config.ocr_layout,
    );
    Ok(Box::new(BoxScoreExtractor::new(engine, config.extractor_settings())))
}

fn run(cli: Cli) -> Result<ExitCode> {
    paths::ensure_directories()?;

    let config_path = cli.config.clone().unwrap_or_else(paths::get_config_path);
    config::init_config(&config_path);
    let config = config::get_config();

    let source = match build_source(config, cli.remote.as_deref()) {
        Ok(source) => source,
        Err(e) => {
            let err = boxscore::ExtractError::OcrUnavailable {
                reason: format!("{:#}", e),
            };
            log(&err.to_string());
            eprintln!("{}", err);
            return Ok(ExitCode::FAILURE);
        }
    };

    let csv = cli
        .csv
        .map(|path| path.unwrap_or_else(paths::get_default_csv_path));
    if let Some(csv) = &csv {
        export::init_csv(csv)?;
    }
    let default_date = cli.date.unwrap_or_else(|| Local::now().date_naive());

    match cli.command {
        Command::Extract { image, username } => {
            let bytes = std::fs::read(&image)
                .with_context(|| format!("Failed to read {}", image.display()))?;

            match source.extract(&bytes, &username) {
                Ok(stats) => {
                    let stats = stats.with_default_date(default_date);
                    if let Some(csv) = &csv {
                        export::append_stats(csv, &image, &stats)?;
                    }
                    println!("{}", export::to_json(&stats)?);
                    Ok(ExitCode::SUCCESS)
                }
                Err(e) => {
                    log(&format!("Extraction failed ({}): {}", e.kind(), e));
                    eprintln!("{}", e);
                    Ok(ExitCode::FAILURE)
                }
            }
        }
        Command::Batch { username, images } => {
            let items = images
                .into_iter()
                .enumerate()
                .map(|(i, path)| batch::BatchItem::new(i, path, username.as_str()))
                .collect();
            let results = batch::run_batch(
                items,
                source.as_ref(),
                config.batch_workers,
                csv.as_deref(),
                default_date,
            );

            let mut all_ok = true;
            for result in results {
                match result.outcome {
                    boxscore::Extraction::Success(stats) => {
                        println!("{}", serde_json::to_string(&stats)?);
                    }
                    failure => {
                        all_ok = false;
                        eprintln!(
                            "{}: {}",
                            result.item.image_path.display(),
                            failure.message().unwrap_or("failed")
                        );
                    }
                }
            }

            Ok(if all_ok {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
    }
}

fn main() -> ExitCode {
    // Set up panic hook to log panics
    std::panic::set_hook(Box::new(|panic_info| {
        let msg = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };
        let location = if let Some(loc) = panic_info.location() {
            format!(" at {}:{}:{}", loc.file(), loc.line(), loc.column())
        } else {
            String::new()
        };
        log(&format!("[PANIC]{} {}", location, msg));
    }));

    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            log(&format!("Error: {:#}", e));
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
