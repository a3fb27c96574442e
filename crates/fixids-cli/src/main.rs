mod cmd;
mod output;

use clap::{Parser, ValueEnum};
use fixids_core::config::MigrationConfig;
use fixids_core::paths;
use fixids_core::remote::DemistoSdk;
use fixids_core::FixidsError;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "fixids",
    about = "Staged migration of automation ids to match their display names",
    version
)]
struct Cli {
    /// Stage to execute
    #[arg(short, long, value_enum)]
    stage: StageArg,

    /// Content pack root
    #[arg(long, env = "FIXIDS_ROOT", default_value = paths::DEFAULT_PACK_ROOT)]
    root: PathBuf,

    /// Checkpoint file bridging stage invocations
    #[arg(long, default_value = paths::CHECKPOINT_FILE)]
    checkpoint: PathBuf,

    /// Temporary display-name suffix
    #[arg(long, default_value = paths::NAME_SUFFIX)]
    suffix: String,

    /// Output as JSON
    #[arg(long, short = 'j')]
    json: bool,

    /// Enable more verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum StageArg {
    /// Run all three stages in order
    All,
    /// Stage 1: tag divergent automations and write the checkpoint
    #[value(name = "s1-add-suffixes")]
    AddSuffixes,
    /// Stage 2: converge ids and rewrite cross-references
    #[value(name = "s2-fix-content")]
    FixContent,
    /// Stage 3: validate a fresh server download
    #[value(name = "s3-validate")]
    Validate,
}

impl StageArg {
    fn sequence(self) -> &'static [StageArg] {
        match self {
            StageArg::All => &[
                StageArg::AddSuffixes,
                StageArg::FixContent,
                StageArg::Validate,
            ],
            StageArg::AddSuffixes => &[StageArg::AddSuffixes],
            StageArg::FixContent => &[StageArg::FixContent],
            StageArg::Validate => &[StageArg::Validate],
        }
    }
}

fn main() {
    // Usage errors are the invalid-argument failure class (exit 1); clap's
    // default usage code overlaps with the invalid-path code. Help and
    // version requests still exit 0.
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            std::process::exit(if e.use_stderr() { 1 } else { 0 });
        }
    };

    let default_level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let mut config = MigrationConfig::new(cli.root);
    config.checkpoint_path = cli.checkpoint;
    config.name_suffix = cli.suffix;
    let remote = DemistoSdk::new();

    for stage in cli.stage.sequence() {
        let result = match stage {
            StageArg::AddSuffixes => cmd::tag::run(&config, &remote, cli.json),
            StageArg::FixContent => cmd::rewrite::run(&config, &remote, cli.json),
            StageArg::Validate => cmd::validate::run(&config, &remote, cli.json),
            StageArg::All => unreachable!("sequence never yields All"),
        };
        if let Err(e) = result {
            // Print the full error chain (anyhow's alternate Display)
            eprintln!("error: {e:#}");
            let code = e
                .downcast_ref::<FixidsError>()
                .map(FixidsError::exit_code)
                .unwrap_or(1);
            std::process::exit(code);
        }
    }
}
