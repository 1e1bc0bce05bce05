use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    focusfeed_cli::cli::app::run().await
}
