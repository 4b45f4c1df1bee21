use anyhow::Result;

use crate::config::EditorConfig;

/// Loads `.env` and installs logging as configured.
pub fn init(config: &EditorConfig) -> Result<()> {
    dotenv::dotenv().ok();
    common::log_setup::setup_logging(&config.log_filter, &config.log_dir)?;
    tracing::info!("Flow editor logging initialized");
    Ok(())
}
