use axum_helpers::server::create_app;
use core_config::tracing::{init_tracing, install_color_eyre};
use tracing::info;

mod api;
mod config;
mod state;

use config::Config;
use state::AppState;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    // Install color-eyre first for colored error output (before any fallible operations)
    install_color_eyre();

    let config = Config::from_env()?;

    init_tracing(&config.environment);

    // Every facade resolves its provider here; a bad discriminant or missing
    // credentials stops start-up.
    let state = AppState::from_config(config)?;
    let server = state.config.server.clone();

    let app = api::router(state);

    create_app(app, &server)
        .await
        .map_err(|e| eyre::eyre!("Server error: {}", e))?;

    info!("Cedar API shutdown complete");
    Ok(())
}
