use clap::Parser;
use log::info;
use userfetch::{build_client, config::Config, run, AppError};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let config = Config::parse();
    env_logger::init();

    info!("Target base URL: {}", config.base_url);

    let client = build_client(&config)?;
    run(&client, &config).await?;

    println!("Combined result written to {}", config.output.display());
    Ok(())
}
