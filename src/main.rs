use clap::Parser;
use oi_monitor::config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::parse();
    oi_monitor::run(config).await?;
    Ok(())
}
