use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use annotate::config::{
    load_config_file, write_default_config_file, AnnotateConfig, AnnotateConfigBuilder,
};
use annotate::{AnnotateError, Data, Result};

/// Deploy dataset images for manual labelling and register the results.
#[derive(Parser, Debug)]
#[command(name = "annotate", version, about)]
struct Cli {
    /// Deploy data to the working directory
    #[arg(short, long)]
    deploy: bool,

    /// Register annotation results to the datafile
    #[arg(short, long)]
    register: bool,

    /// Deploy results (all annotated images)
    #[arg(long)]
    deploy_result: bool,

    /// Export an id,label CSV to PATH
    #[arg(long, value_name = "PATH")]
    export: Option<PathBuf>,

    /// Print verbose messages
    #[arg(short, long)]
    verbose: bool,

    /// Dataset file path (JSON rows, `.gz` for compressed)
    #[arg(short, long, value_name = "FILE")]
    file: Option<PathBuf>,

    /// Working directory path
    #[arg(short, long, value_name = "DIR")]
    workdir: Option<PathBuf>,

    /// Configuration file path
    #[arg(long, default_value = "./config.toml", value_name = "FILE")]
    config_file: PathBuf,

    /// Configuration section name
    #[arg(long, default_value = "annotation")]
    config_section: String,

    /// Create a default configuration file
    #[arg(long)]
    create_config_file: bool,

    /// Create a sample datafile (sample.json next to the datafile)
    #[arg(long, value_name = "ROWS", num_args = 0..=1, default_missing_value = "100")]
    create_sample_datafile: Option<usize>,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "annotate=debug" } else { "annotate=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn run(cli: Cli, loaded: Result<AnnotateConfig>) -> Result<()> {
    if cli.create_config_file {
        return write_default_config_file(&cli.config_file, &cli.config_section);
    }

    if cli.deploy && cli.register {
        return Err(AnnotateError::Config(
            "both --deploy and --register are active".to_string(),
        ));
    }

    let loaded = loaded?;
    let verbose = loaded.verbose || cli.verbose;
    let mut builder = AnnotateConfigBuilder::from_config(loaded).verbose(verbose);
    if let Some(file) = cli.file {
        builder = builder.datafile(file);
    }
    if let Some(workdir) = cli.workdir {
        builder = builder.workdir(workdir);
    }
    let mut config = builder.build()?;
    if cli.deploy_result {
        config = config.for_deploy_result();
    }

    let mut data = Data::new(config.clone());

    if let Some(rows) = cli.create_sample_datafile {
        let parent = config.datafile.parent().unwrap_or_else(|| std::path::Path::new("."));
        return data.create_sample_dataset(&parent.join("sample.json"), rows, None);
    }

    data.load()?;

    if cli.deploy || cli.deploy_result {
        data.deploy(None)?;
    } else if cli.register {
        if let Some(report) = data.register(true, None)? {
            println!("{report}");
        }
    }

    if let Some(path) = cli.export {
        data.export(&path, "csv")?;
    }

    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let loaded = load_config_file(&cli.config_file, &cli.config_section, true);
    init_tracing(cli.verbose || loaded.as_ref().is_ok_and(|c| c.verbose));

    match run(cli, loaded) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
