use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use log::{debug, info};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use voice_analyzer::error::GENERIC_FAILURE_MESSAGE;
use voice_analyzer::{
    AnalysisConfig, AnalysisError, AnalysisReport, AnalysisRequest, Purpose, ShareCard, VoiceAnalyzer,
};

#[derive(Parser)]
#[command(name = "voice-analyzer")]
#[command(about = "Score a voice recording and write a personalised diagnosis")]
struct Args {
    /// Recording to analyze (WAV or MP3, first 30 seconds are used)
    #[arg()]
    audio_file: PathBuf,

    /// Name used in the diagnosis text
    #[arg(short, long)]
    name: String,

    /// Analysis purpose: singing, speaking or presentation
    #[arg(short, long)]
    purpose: Purpose,

    /// Output format: 'text' or 'json'
    #[arg(long, default_value = "text")]
    format: String,

    /// Seed for template selection (random when omitted)
    #[arg(long)]
    seed: Option<u64>,

    /// JSON file overriding analysis parameters
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write the share card layout as JSON to this path
    #[arg(long)]
    share_card: Option<PathBuf>,
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            debug!("Analysis failed: {:?}", err);
            let message = match err.downcast_ref::<AnalysisError>() {
                Some(analysis_err) => analysis_err.user_message(),
                None => GENERIC_FAILURE_MESSAGE,
            };
            eprintln!("{}", message);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<()> {
    let config = match &args.config {
        Some(path) => AnalysisConfig::from_json_file(path)?,
        None => AnalysisConfig::default(),
    };
    let analyzer = VoiceAnalyzer::new(config)?;

    info!("Analyzing {}", args.audio_file.display());
    let bytes = std::fs::read(&args.audio_file)
        .with_context(|| format!("failed to read {}", args.audio_file.display()))?;

    let request = AnalysisRequest {
        bytes,
        filename: file_name(&args.audio_file),
        purpose: Some(args.purpose),
        name: args.name.clone(),
    };

    let report = match args.seed {
        Some(seed) => analyzer.analyze(&request, &mut StdRng::seed_from_u64(seed))?,
        None => analyzer.analyze(&request, &mut rand::thread_rng())?,
    };

    if args.format.to_lowercase() == "json" {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    if let Some(path) = &args.share_card {
        let card = ShareCard::from_report(&report, Local::now().date_naive());
        std::fs::write(path, serde_json::to_string_pretty(&card)?)
            .with_context(|| format!("failed to write {}", path.display()))?;
        info!("Share card layout saved to {}", path.display());
    }

    Ok(())
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn print_report(report: &AnalysisReport) {
    let diagnosis = &report.diagnosis;

    println!("{} ({}, {:.1}s)", report.name, report.purpose, report.duration_secs);
    println!();
    for (key, score) in report.metrics.iter() {
        let bar = "#".repeat((score / 5) as usize);
        println!("{:<18} {:>3}  {}", key.label(), score, bar);
    }
    println!();
    println!("Total score: {}/594", diagnosis.total_score);
    println!("Level: {} - {}", diagnosis.level, diagnosis.level_description);
    println!();
    println!("{}", diagnosis.text);
}
