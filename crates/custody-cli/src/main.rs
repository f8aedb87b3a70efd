//! Custody CLI binary entrypoint.

use std::io;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use custody_cli::cli::{Cli, Commands};
use custody_cli::commands::{
    AccountCommand, ConfigCommand, DistributeCommand, InitCommand, LockCommand, MarketCommand,
    StatusCommand, WalletCommand,
};
use custody_cli::output::OutputFormat;
use custody_cli::state::Session;
use custody_core::{Clock, SystemClock};

fn main() -> ExitCode {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), custody_cli::CliError> {
    let format = OutputFormat::new(cli.format);
    let now = cli.now.unwrap_or_else(|| SystemClock.now());
    let session = Session::new(cli.state, now, cli.events);
    let mut stdout = io::stdout().lock();

    match cli.command {
        Commands::Init(args) => InitCommand::new(&session).execute(&mut stdout, &format, &args),
        Commands::Status => StatusCommand::new(&session).execute(&mut stdout, &format),
        Commands::Deposit { principal, amount } => {
            AccountCommand::new(&session).deposit(&mut stdout, &format, &principal, amount)
        }
        Commands::Withdraw { principal, amount } => {
            AccountCommand::new(&session).withdraw(&mut stdout, &format, &principal, amount)
        }
        Commands::Balance { principal } => {
            AccountCommand::new(&session).balance(&mut stdout, &format, &principal)
        }
        Commands::Lock { principal, amount } => {
            LockCommand::new(&session).lock(&mut stdout, &format, &principal, amount)
        }
        Commands::Unlock { principal } => {
            LockCommand::new(&session).unlock(&mut stdout, &format, &principal)
        }
        Commands::LockStatus { principal } => {
            LockCommand::new(&session).status(&mut stdout, &format, &principal)
        }
        Commands::Fund { caller, amount } => {
            LockCommand::new(&session).fund(&mut stdout, &format, &caller, amount)
        }
        Commands::Distribute {
            caller,
            pool,
            recipients,
        } => DistributeCommand::new(&session).execute(
            &mut stdout,
            &format,
            &caller,
            pool,
            &recipients,
        ),
        Commands::List { seller, price } => {
            MarketCommand::new(&session).list(&mut stdout, &format, &seller, price)
        }
        Commands::Purchase { buyer, id, value } => {
            MarketCommand::new(&session).purchase(&mut stdout, &format, &buyer, id, value)
        }
        Commands::Listing { id } => MarketCommand::new(&session).show(&mut stdout, &format, id),
        Commands::Config { command } => {
            ConfigCommand::new(&session).execute(&mut stdout, &format, &command)
        }
        Commands::Reject { principal, undo } => {
            WalletCommand::new(&session).reject(&mut stdout, &format, &principal, undo)
        }
    }
}
