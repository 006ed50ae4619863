use crate::{api, config::Settings, email::EmailWorkerConfig};
use anyhow::Result;
use tracing::debug;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub dsn: String,
    pub settings: Settings,
    pub email_config: EmailWorkerConfig,
}

/// Execute the server action.
/// # Errors
/// Returns an error if the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    // Secrets are redacted by the Settings Debug impl.
    debug!("Settings: {:?}", args.settings);

    api::new(args.port, args.dsn, args.settings, args.email_config).await
}
