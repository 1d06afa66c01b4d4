use std::process::ExitCode;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use cid_metadata::config::{ConfigLoader, ResolvedConfig};
use cid_metadata::error::CidError;
use cid_metadata::output::{DataUriResult, JsonOutput};
use cid_metadata::session::CidServiceBuilder;
use cid_metadata::transport::HttpTransport;
use cid_metadata::PLUGIN_INFO;

const PASSWORD_ENV: &str = "CID_PASSWORD";

#[derive(Parser)]
#[command(name = "cid-md")]
#[command(about = "Read experiment metadata from a CID database")]
#[command(version, author)]
struct Cli {
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Experiment metadata")]
    Experiment(ExperimentArgs),
    #[command(about = "Print the workspace path for a data name and format")]
    DataUri(DataUriArgs),
    #[command(about = "Print the plugin descriptor")]
    Plugin,
}

#[derive(Args)]
struct ExperimentArgs {
    #[command(subcommand)]
    command: ExperimentCommand,
}

#[derive(Subcommand)]
enum ExperimentCommand {
    #[command(about = "Fetch one experiment by its md_uri")]
    Get { md_uri: String },
}

#[derive(Args)]
struct DataUriArgs {
    name: String,
    format: String,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(cid) = report.downcast_ref::<CidError>() {
            return ExitCode::from(map_exit_code(cid));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &CidError) -> u8 {
    match error {
        CidError::NotFound { .. } | CidError::MissingConfig => 2,
        CidError::Connect(_)
        | CidError::Status { .. }
        | CidError::Http(_)
        | CidError::InvalidResponse(_) => 3,
        CidError::NotImplemented(_) => 4,
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
    match cli.command {
        Commands::Plugin => JsonOutput::print_plugin(&PLUGIN_INFO).into_diagnostic(),
        Commands::DataUri(args) => {
            let config = ConfigLoader::resolve(cli.config.as_deref())?;
            run_data_uri(args, &config)
        }
        Commands::Experiment(args) => {
            let config = ConfigLoader::resolve(cli.config.as_deref())?;
            match args.command {
                ExperimentCommand::Get { md_uri } => run_experiment_get(&md_uri, config),
            }
        }
    }
}

fn run_data_uri(args: DataUriArgs, config: &ResolvedConfig) -> miette::Result<()> {
    let uri = config
        .workspace
        .locate(&config.formats, &args.name, &args.format)?;
    JsonOutput::print_data_uri(&DataUriResult {
        name: args.name,
        format: args.format,
        uri: uri.into_string(),
    })
    .into_diagnostic()
}

fn run_experiment_get(md_uri: &str, config: ResolvedConfig) -> miette::Result<()> {
    let credentials = config.credentials(std::env::var(PASSWORD_ENV).ok())?;
    let transport = HttpTransport::new(config.timeout)?;
    let builder = CidServiceBuilder::new(transport, config.workspace, Arc::new(config.formats));
    let service = builder.build(
        &credentials.host,
        &credentials.username,
        &credentials.password,
    )?;
    let experiment = service.get_experiment(md_uri)?;
    JsonOutput::print_experiment(&experiment).into_diagnostic()
}
