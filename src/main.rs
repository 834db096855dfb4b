mod telemetry;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Values may come from the real environment; a missing .env is fine.
    let dotenv = dotenvy::dotenv();

    telemetry::init()?;
    if let Err(err) = dotenv {
        tracing::debug!(error = %err, "no .env file loaded");
    }

    api::start().await?;
    Ok(())
}
