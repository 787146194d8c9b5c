mod commands;
mod error;
mod logging;

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use polynode_core::PolynodeConfig;

use error::Result;

/// Install and switch between local Node.js versions.
#[derive(Debug, Parser)]
#[command(name = "polynode", version)]
struct Cli {
    /// Print debug logging to stderr.
    #[arg(long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Download a version into the repository.
    Install {
        /// X.Y.Z, `latest`, `lts` or `lts/<codename>`.
        version: String,
    },
    /// Make an installed version the active one.
    Use {
        version: String,
        /// Overwrite an active runtime that polynode did not install.
        #[arg(long)]
        force: bool,
    },
    /// List installed versions.
    #[command(alias = "ls")]
    List,
    /// Print the active version.
    Version,
    /// Remove an installed version.
    #[command(alias = "rm")]
    Uninstall { version: String },
    /// Create the install root and a PATH setup script.
    Init,
    /// Zip the active slot and the repository into the install root.
    Backup,
    /// Open a shell with the active version first on PATH.
    Shell,
    /// Set the HTTP proxy used for downloads; an empty URL removes it.
    Proxy { url: String },
    /// Check which node executable PATH resolves to.
    Check,
}

async fn run(cli: Cli) -> Result<()> {
    let config = PolynodeConfig::from_env()?;
    logging::init_logging(&config.layout.log_file(), cli.verbose);
    log::debug!("Install root {}", config.layout.root.display());

    match cli.command {
        Command::Install { version } => commands::install(&config, &version).await,
        Command::Use { version, force } => commands::use_version(&config, &version, force),
        Command::List => commands::list(&config),
        Command::Version => commands::version(&config),
        Command::Uninstall { version } => commands::uninstall(&config, &version),
        Command::Init => commands::init(&config),
        Command::Backup => commands::backup(&config),
        Command::Shell => commands::shell(&config).await,
        Command::Proxy { url } => commands::proxy(&config, &url),
        Command::Check => commands::check(&config),
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            log::error!("{error}");
            eprintln!("polynode: {error}");
            error.exit_code()
        }
    }
}
