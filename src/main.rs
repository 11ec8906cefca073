use clap::Parser;
use std::fs;
use std::path::PathBuf;

mod runner;

use runner::DetectorKind;

#[derive(Parser)]
#[command(name = "markscan")]
#[command(about = "Find markers, arrows and bars in game-map screenshots")]
#[command(version)]
struct Cli {
    /// Detector to run
    #[arg(value_enum)]
    detector: DetectorKind,

    /// Path to the input image
    #[arg(long)]
    image: PathBuf,

    /// JSON file overriding detector parameters
    #[arg(long)]
    config: Option<PathBuf>,

    /// Template image for the template detector
    #[arg(long)]
    template: Option<PathBuf>,

    /// Write the report here instead of stdout
    #[arg(long)]
    out: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = runner::load_config(cli.config.as_deref())?;
    let detector = runner::build_detector(cli.detector, &config, cli.template.as_deref())?;
    let report = runner::run(detector.as_ref(), &cli.image)?;

    let json = report.to_json()?;
    match cli.out {
        Some(path) => fs::write(&path, json)?,
        None => println!("{}", json),
    }
    Ok(())
}
