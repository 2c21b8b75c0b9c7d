use std::process::{ExitCode, Termination};

use clap::Parser;

#[derive(clap::Subcommand, Debug)]
pub enum Command {
    Api(vulndex_api::Run),
    Walker(vulndex_walker::Run),
}

#[derive(clap::Parser, Debug)]
#[command(
    author,
    version = env!("CARGO_PKG_VERSION"),
    about = "Vulndex",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub(crate) command: Command,
}

impl Cli {
    async fn run(self) -> ExitCode {
        match self.run_command().await {
            Ok(code) => code,
            Err(err) => {
                eprintln!("Error: {err}");
                for (n, err) in err.chain().skip(1).enumerate() {
                    if n == 0 {
                        eprintln!("Caused by:");
                    }
                    eprintln!("\t{err}");
                }

                ExitCode::FAILURE
            }
        }
    }

    async fn run_command(self) -> anyhow::Result<ExitCode> {
        match self.command {
            Command::Api(run) => run.run().await,
            Command::Walker(run) => run.run().await,
        }
    }
}

#[tokio::main]
async fn main() -> impl Termination {
    env_logger::init();
    Cli::parse().run().await
}
