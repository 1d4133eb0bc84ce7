use anyhow::{Context, Result};
use skypost::Session;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let identifier = std::env::var("BSKY_IDENTIFIER")?;
    let password = std::env::var("BSKY_PASSWORD")?;
    let rkey = std::env::args().nth(1).context("usage: delete RKEY")?;

    let session = Session::login(&identifier, &password).await?;
    session.delete_post(&rkey).await?;

    Ok(())
}
