use crate::generator::workflow::launch;
use anyhow::Result;
use clap::Parser;

mod cli;
mod config;
mod generator;
mod llm;
mod logging;
mod search;
mod types;
mod utils;

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Args::parse();
    let config = args.into_config()?;
    logging::init(config.verbose);

    let job = args.into_job()?;
    match launch(&config, job).await {
        Ok(true) => Ok(()),
        Ok(false) => {
            tracing::error!("❌ 部分任务失败");
            std::process::exit(1);
        }
        Err(e) => {
            tracing::error!("❌ {:#}", e);
            std::process::exit(1);
        }
    }
}
