//! CLI entry point - the composition root.

use std::process::ExitCode;

use clap::{CommandFactory, Parser};

use gwhost_cli::error::exit_code_for;
use gwhost_cli::logging::init_tracing;
use gwhost_cli::{Cli, CliConfig, CliError, Commands, handlers};
use gwhost_runtime::DesktopHostControl;

#[tokio::main]
async fn main() -> ExitCode {
    // Load environment variables before clap reads GWHOST_* defaults
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = CliConfig::from_cli(&cli);
    let _log_guard = init_tracing(&config.logs_dir_or_fallback(), cli.verbose);

    match dispatch(cli, &config).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            exit_code_for(&e)
        }
    }
}

async fn dispatch(cli: Cli, config: &CliConfig) -> anyhow::Result<ExitCode> {
    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(ExitCode::SUCCESS);
    };

    let paths = config.resolve_paths().map_err(CliError::from)?;

    match command {
        Commands::Run(args) => {
            let control = DesktopHostControl::with_relaunch_args(handlers::run::relaunch_args(
                std::env::args_os().skip(1),
            ));
            return handlers::run::execute(paths, &args, &control).await;
        }
        Commands::Migrate => handlers::migrate::execute(&paths)?,
        Commands::Token => handlers::token::execute(&paths)?,
        Commands::Paths => handlers::paths::execute(&paths)?,
        Commands::OpenLogs => {
            handlers::open_logs::execute(&DesktopHostControl::new(), &paths)?;
        }
    }

    Ok(ExitCode::SUCCESS)
}
