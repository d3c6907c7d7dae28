use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use herbarium_specimens::app::App;
use herbarium_specimens::config::{ConfigLoader, ConfigOverrides};
use herbarium_specimens::error::SpecimenError;
use herbarium_specimens::fetcher::HttpImageClient;
use herbarium_specimens::output::{JsonOutput, OutputMode, TextOutput};

#[derive(Parser)]
#[command(name = "herbarium-fetch")]
#[command(about = "Clean a herbarium barcode export and download its specimen images")]
#[command(version, author)]
struct Cli {
    #[arg(long, help = "Raw barcode export (CSV)")]
    meta_path: Option<PathBuf>,

    #[arg(long, help = "Directory receiving metadata.csv and images/")]
    save_dir: Option<PathBuf>,

    #[arg(
        long = "check-quality",
        help = "Decode downloaded images afterwards and write bad-images.txt"
    )]
    check_quality: bool,

    #[arg(long)]
    timeout_secs: Option<u64>,

    #[arg(long)]
    config: Option<String>,

    #[arg(long, help = "Print the run summary as JSON")]
    json: bool,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(error) = report.downcast_ref::<SpecimenError>() {
            return ExitCode::from(map_exit_code(error));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &SpecimenError) -> u8 {
    match error {
        SpecimenError::ConfigRead(_)
        | SpecimenError::ConfigParse(_)
        | SpecimenError::MetadataRead(_)
        | SpecimenError::MetadataParse { .. } => 2,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output_mode = if cli.json {
        OutputMode::Json
    } else {
        OutputMode::Text
    };

    let overrides = ConfigOverrides {
        meta_path: cli.meta_path,
        save_dir: cli.save_dir,
        check_quality: cli.check_quality,
        timeout_secs: cli.timeout_secs,
    };
    let config = ConfigLoader::resolve(cli.config.as_deref(), overrides)?;
    let client = HttpImageClient::with_timeout(config.timeout)?;
    let app = App::new(client);

    match output_mode {
        OutputMode::Json => {
            let result = app.run(&config, &JsonOutput)?;
            JsonOutput::print_run(&result).into_diagnostic()?;
        }
        OutputMode::Text => {
            let result = app.run(&config, &TextOutput)?;
            TextOutput::print_run(&result);
        }
    }
    Ok(())
}
