use std::path::Path;
use std::sync::Arc;

use heroes_infra::{AppConfig, Profile};
use heroes_observability::LogFormat;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let profile = Profile::from_env()?;
    // Before tracing, so RUST_LOG from the env file takes effect.
    let env_file = profile.apply_env_file(Path::new("configs"));
    heroes_observability::init(match profile {
        Profile::Dev => LogFormat::Pretty,
        Profile::Prod => LogFormat::Json,
    });
    if let Err(e) = env_file {
        tracing::warn!(error = %e, "profile env file not loaded");
    }

    let config = AppConfig::from_env(profile)?;
    let services = heroes_api::app::services::build_services(&config).await?;
    let app = heroes_api::app::build_app(&config, Arc::new(services));

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port)).await?;
    tracing::info!(
        addr = %listener.local_addr()?,
        profile = profile.as_str(),
        persistent = config.use_persistent_stores,
        "listening"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
