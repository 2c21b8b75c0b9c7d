use std::process::ExitCode;

use vulndex_source::ContentConfig;
use vulndex_store::StoreConfig;

pub mod endpoints;
mod error;
mod feed;
mod server;

pub use error::Error;
pub use server::{AppState, SharedState};

#[cfg(test)]
pub(crate) mod testing;

#[derive(clap::Args, Debug)]
#[command(about = "Run the api server", args_conflicts_with_subcommands = true)]
pub struct Run {
    #[arg(short, long, default_value = "0.0.0.0")]
    pub bind: String,

    #[arg(short = 'p', long = "port", default_value_t = 8080)]
    pub port: u16,

    /// TTL of the remote content memo cache
    #[arg(long = "cache-ttl-seconds", default_value_t = 60)]
    pub cache_ttl_seconds: u64,

    #[command(flatten)]
    pub store: StoreConfig,

    #[command(flatten)]
    pub content: ContentConfig,
}

impl Run {
    pub async fn run(self) -> anyhow::Result<ExitCode> {
        let server = server::Server::new(self);
        server.run().await?;
        Ok(ExitCode::SUCCESS)
    }
}
