use poet_relay::{init_tracing, AppConfig, Exchange};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    init_tracing(&config.logging.level)?;

    let mut exchange = Exchange::from_config(&config)?;
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    exchange.run(&mut out).await?;
    Ok(())
}
