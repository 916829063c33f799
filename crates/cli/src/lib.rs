pub mod commands;
pub mod console;
pub mod logging;

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use stockroom_core::config::{AppConfig, ConfigOverrides, LoadOptions};

use crate::commands::CommandResult;
use crate::console::Console;

#[derive(Debug, Parser)]
#[command(
    name = "stockroom",
    about = "Stockroom inventory and billing terminal",
    long_about = "Manage a product catalog, adjust stock, ring up bills, and list low-stock items behind a single admin login.",
    after_help = "Examples:\n  stockroom\n  stockroom --products-file shop.txt\n  stockroom doctor --json\n  stockroom config"
)]
pub struct Cli {
    #[arg(long, global = true, help = "Read configuration from this TOML file")]
    config: Option<PathBuf>,
    #[arg(long, global = true, help = "Products file to load and save")]
    products_file: Option<PathBuf>,
    #[arg(long, global = true, help = "Credentials file used by signup and login")]
    credentials_file: Option<PathBuf>,
    #[arg(long, global = true, help = "File that finished bills are appended to")]
    bills_file: Option<PathBuf>,
    #[arg(long, global = true, help = "Log level written to stderr (trace|debug|info|warn|error)")]
    log_level: Option<String>,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Start the interactive signup/login and inventory menu (default)")]
    Session,
    #[command(
        about = "Inspect effective configuration values with source attribution"
    )]
    Config,
    #[command(about = "Check configuration, data files, and stored credentials")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
}

impl Cli {
    fn load_options(&self) -> LoadOptions {
        LoadOptions {
            config_path: self.config.clone(),
            require_file: self.config.is_some(),
            overrides: ConfigOverrides {
                products_path: self.products_file.clone(),
                credentials_path: self.credentials_file.clone(),
                bills_path: self.bills_file.clone(),
                log_level: self.log_level.clone(),
            },
        }
    }
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    let options = cli.load_options();

    let result = match cli.command.unwrap_or(Command::Session) {
        Command::Session => {
            let stdin = io::stdin();
            let mut console = Console::new(stdin.lock(), io::stdout());
            session(options, &mut console)
        }
        Command::Config => CommandResult::text(commands::config::run(options)),
        Command::Doctor { json } => CommandResult::text(commands::doctor::run(options, json)),
    };

    if !result.output.is_empty() {
        println!("{}", result.output);
    }
    ExitCode::from(result.exit_code)
}

/// Runs the interactive session. Menu output goes to the console, so a
/// successful run carries no output of its own.
pub fn session<R: io::BufRead, W: io::Write>(
    options: LoadOptions,
    console: &mut Console<R, W>,
) -> CommandResult {
    let config = match AppConfig::load(options) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "session",
                "config_validation",
                format!("configuration issue: {error}"),
                2,
            );
        }
    };
    logging::init_logging(&config);

    match commands::session::run(&config, console) {
        Ok(()) => CommandResult::text(String::new()),
        Err(error) => CommandResult::failure(
            "session",
            "terminal_io",
            format!("terminal input/output failed: {error}"),
            1,
        ),
    }
}
