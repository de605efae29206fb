use std::sync::Arc;

use anyhow::{Context, Result};
use app_settings::Purpose;
use product_assistant::bootstrap;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let cfg = bootstrap::load_settings()?;
    let address = cfg.server.address.clone();

    let components = bootstrap::build(cfg, Purpose::Serving)?;
    let chain = bootstrap::chain(&components)?;

    let state = api::AppState::new(Arc::new(chain), components.llm.clone());
    info!(%address, "starting chat server");
    api::start(state, &address)
        .await
        .context("serving HTTP")?;

    Ok(())
}
