use anyhow::Result;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::Level;
use tracing_subscriber::fmt::format::FmtSpan;

use psexport_aws::{load_sdk_config, SsoAdminClient};
use psexport_core::{ExportReport, Exporter};

mod config;
use config::{FileConfig, FilterType, Overrides, Settings};

/// Exit status for argument and config errors; nothing has touched the network or disk yet.
const EXIT_USAGE: u8 = 2;

#[derive(Parser, Debug)]
#[command(author, version, about="Retrieve AWS SSO Permission Sets with filters")]
struct Cli {
    /// Type of filter to apply (prefix, suffix, or regex)
    #[arg(long, value_enum)]
    filter_type: Option<FilterType>,

    /// Pattern to match (prefix, suffix, or regex pattern)
    #[arg(long)]
    pattern: Option<String>,

    /// Output directory [default: out]
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// AWS region of the Identity Center instance
    #[arg(long)]
    region: Option<String>,

    /// Named AWS profile
    #[arg(long)]
    profile: Option<String>,

    /// YAML file with defaults for the options above
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log verbosity on stderr (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[arg(long, value_enum, default_value_t=LogFormat::Json)]
    log_format: LogFormat,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, ValueEnum)]
enum LogFormat { Text, Json }

fn init_tracing(verbose: u8, format: LogFormat) {
    let level = match verbose { 0 => Level::WARN, 1 => Level::INFO, _ => Level::DEBUG };
    let builder = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_span_events(FmtSpan::CLOSE);
    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
}

fn settings(cli: &Cli) -> Result<Settings> {
    let file = match &cli.config {
        Some(p) => FileConfig::load(p)?,
        None => FileConfig::default(),
    };
    let overrides = Overrides {
        out: cli.out.clone(),
        region: cli.region.clone(),
        profile: cli.profile.clone(),
        filter_type: cli.filter_type,
        pattern: cli.pattern.clone(),
    };
    Settings::resolve(overrides, file)
}

/// Stdout handle that takes the lock per write, not for the whole export.
fn console() -> std::io::Stdout { std::io::stdout() }

async fn run(settings: Settings) -> Result<ExportReport> {
    let sdk = load_sdk_config(settings.region, settings.profile).await;
    let exporter = Exporter::new(SsoAdminClient::new(&sdk), settings.out);
    let mut stdout = console();
    exporter.export(&settings.filter, &mut stdout).await
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_format);

    let settings = match settings(&cli) {
        Ok(s) => s,
        Err(e) => {
            println!("Error: {e:#}");
            return ExitCode::from(EXIT_USAGE);
        }
    };

    match run(settings).await {
        Ok(report) => {
            tracing::info!(
                instance = %report.instance_arn,
                exported = report.exported.len(),
                skipped = report.skipped.len(),
                failures = report.failures.len(),
                "export finished"
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            println!("An error occurred: {e:#}");
            ExitCode::FAILURE
        }
    }
}
