//! Accommodation service binary.

use accommodation_server::{Application, Config, init_tracing, install_metrics};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    init_tracing(&config.server.log_level);

    info!(env = %config.server.env, "Starting accommodation server");

    install_metrics(&config.server)?;
    let app = Application::build(&config).await?;
    app.run().await?;

    info!("Shutdown complete");
    Ok(())
}
