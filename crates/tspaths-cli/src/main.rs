#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::needless_pass_by_value)]

mod commands;
mod logging;

use clap::Parser;
use miette::Result;
use std::path::PathBuf;
use tspaths_core::Config;
use tspaths_util::path::normalize;

#[derive(Parser, Debug)]
#[command(name = "tspaths")]
#[command(author, version, about = "Inspect module path alias resolution", long_about = None)]
struct Cli {
    /// Increase logging verbosity (-v for DEBUG, -vv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Emit JSON formatted output (stable, machine-readable)
    #[arg(long, global = true)]
    json: bool,

    /// Override the working directory
    #[arg(long, global = true, value_name = "PATH")]
    cwd: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Print version information
    Version,

    /// Resolve a module request through the configured aliases
    Match {
        /// The module request, e.g. "@app/utils"
        request: String,

        /// Path-mapping file (JSON with baseUrl, paths, mainFields, addMatchAll)
        #[arg(short, long, value_name = "FILE")]
        config: PathBuf,

        /// Manifest field to try for directories, in order (repeatable)
        #[arg(long = "main-field", value_name = "FIELD")]
        main_fields: Vec<String>,

        /// Extra extension to try first, e.g. ".vue" (repeatable)
        #[arg(long = "ext", value_name = "EXT")]
        extensions: Vec<String>,

        /// Print every step taken while matching
        #[arg(long)]
        trace: bool,
    },

    /// Print the normalized mapping in matching priority order
    Mappings {
        /// Path-mapping file (JSON with baseUrl, paths, mainFields, addMatchAll)
        #[arg(short, long, value_name = "FILE")]
        config: PathBuf,
    },
}

/// Working directory for the run. A relative `--cwd` is taken from the
/// process directory so every path built from it is absolute.
fn absolute_cwd(cwd: Option<PathBuf>) -> PathBuf {
    let current = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    match cwd {
        Some(dir) => normalize(&current.join(dir)),
        None => current,
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let cwd = absolute_cwd(cli.cwd);

    let config = Config::new(cwd.clone())
        .with_verbosity(cli.verbose)
        .with_json_logs(cli.json);

    logging::init(config.verbosity, config.json_logs);

    match cli.command {
        Some(Commands::Version) | None => commands::version::run(),
        Some(Commands::Match {
            request,
            config: file,
            main_fields,
            extensions,
            trace,
        }) => {
            let span = tracing::info_span!("match", cmd = "match", cwd = %cwd.display());
            let _guard = span.enter();
            commands::match_cmd::run(
                &config,
                &file,
                &request,
                &main_fields,
                &extensions,
                trace,
            )
        }
        Some(Commands::Mappings { config: file }) => {
            let span = tracing::info_span!("mappings", cmd = "mappings", cwd = %cwd.display());
            let _guard = span.enter();
            commands::mappings::run(&config, &file)
        }
    }
}
