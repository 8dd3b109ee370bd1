use clap::Parser;
use env_logger::Env;
use log::*;
use opennsfw::config::{DEFAULT_IMAGE_DIR, DEFAULT_MODEL_PATH};
use opennsfw::{Config, Mode, OnnxModel, OutputFormat};
use std::io::{self, Write};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "opennsfw", version, about = "Score a folder of images for NSFW content")]
struct Args {
    /// Directory with .jpg/.png files
    #[arg(default_value = DEFAULT_IMAGE_DIR)]
    dir: PathBuf,
    /// Path to the ONNX model
    #[arg(long, default_value = DEFAULT_MODEL_PATH)]
    model: PathBuf,
    /// Also pick up .JPG, .Png, ...
    #[arg(long)]
    ignore_case: bool,
    /// Re-encode the resized image as JPEG before cropping
    #[arg(long)]
    jpeg_roundtrip: bool,
    /// Print one JSON object per scored file
    #[arg(long)]
    json: bool,
    /// More verbose logging, repeat for debug output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Args {
    fn config(&self) -> Config {
        Config {
            model_path: self.model.clone(),
            ignore_case: self.ignore_case,
            mode: if self.jpeg_roundtrip {
                Mode::JpegRoundTrip
            } else {
                Mode::Simple
            },
            format: if self.json {
                OutputFormat::Json
            } else {
                OutputFormat::Text
            },
            ..Default::default()
        }
    }
}

fn main() -> Result<(), failure::Error> {
    let args = Args::parse();

    let level = match args.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(Env::default().default_filter_or(level)).init();

    let config = args.config();
    debug!("using config {:?}", config);

    let model = OnnxModel::load(&config.model_path)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let report = opennsfw::batch::run(&args.dir, &model, &config, &mut out)?;
    out.flush()?;

    if !report.failed.is_empty() {
        warn!(
            "{} of {} images could not be scored",
            report.failed.len(),
            report.total()
        );
    }

    Ok(())
}
