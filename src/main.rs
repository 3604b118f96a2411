//! Assess deploying a multi-series charm into a fresh Juju environment.

use colored::Colorize;
use juju_assess::{cli, Error};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    match cli::main(std::env::args_os().skip(1)).await {
        Ok(()) => {}
        Err(Error::Usage(e)) => e.exit(),
        Err(Error::Interrupted) => {
            eprintln!("{} interrupted, environment cleaned up", "Error:".red().bold());
            std::process::exit(130);
        }
        Err(e) => {
            eprintln!("{} {e}", "Error:".red().bold());
            std::process::exit(1);
        }
    }
}
