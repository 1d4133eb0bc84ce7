#![deny(elided_lifetimes_in_paths)]
#![warn(clippy::pedantic)]

use anyhow::Result;
use skypost::{publish, Client, PublishRequest};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let request = PublishRequest {
        identifier: std::env::var("BSKY_IDENTIFIER")?,
        password: std::env::var("BSKY_PASSWORD")?,
        text: std::env::var("BSKY_POST_TEXT")?,
        image_url: std::env::var("BSKY_IMAGE_URL").ok(),
        image_content_type: std::env::var("BSKY_IMAGE_MIME_TYPE")
            .unwrap_or_else(|_| "image/jpeg".into()),
        alt_text: std::env::var("BSKY_IMAGE_ALT").ok(),
    };

    let mut client = Client::new();
    if let Ok(pds) = std::env::var("BSKY_PDS_URL") {
        client = client.with_base_url(pds);
    }

    let outcome = publish(client, &request).await;
    println!("{}", serde_json::to_string_pretty(&outcome)?);

    if !outcome.is_success() {
        std::process::exit(1);
    }
    Ok(())
}
