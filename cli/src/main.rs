use std::process::ExitCode;

use clap::Parser;
use taskr_cli::Outcome;
use taskr_cli::TaskrCli;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let cli = TaskrCli::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_filter()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let mut stdout = std::io::stdout().lock();
    match taskr_cli::run(&cli, &mut stdout) {
        Ok(Outcome::Denied) => ExitCode::from(1),
        Ok(Outcome::Allowed | Outcome::Done) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(2)
        }
    }
}
