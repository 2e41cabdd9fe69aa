use crate::client::ApiClient;
use anyhow::Result;
use console::style;

pub async fn run(server: &str) -> Result<()> {
    let client = ApiClient::new(server)?;
    let message = client.status().await?;
    println!("{} {} ({})", style("✅").green(), message, server);
    Ok(())
}
