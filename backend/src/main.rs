use std::sync::Arc;
use backend::{
    build_rocket,
    catalog::Catalog,
    config::AppConfig,
    connection::{ConnectionResolver, ConnectionResult},
    generator::PoemGenerator,
    routes::AppState,
};
use shuttle_runtime::CustomError;
use tracing::{info, warn};

#[shuttle_runtime::main]
async fn rocket(
    #[shuttle_runtime::Secrets] secret_store: shuttle_runtime::SecretStore,
) -> shuttle_rocket::ShuttleRocket {
    info!("🎂 Starting party poll server");

    let config = AppConfig::from_figment(&rocket::Config::figment())
        .map_err(CustomError::new)?
        .with_secrets(|key| secret_store.get(key));

    let resolver = Arc::new(ConnectionResolver::with_default_connector(
        config.textkey.clone(),
        config.store_timeout(),
    ));

    match resolver.resolve().await {
        ConnectionResult::Connected(_) => info!("🟢 Online (cloud store)"),
        ConnectionResult::Unavailable(reason) => {
            warn!("🔴 Offline ({}) - votes are kept in memory and lost on restart", reason)
        }
    }

    let catalog = Catalog::load(&config.catalog_path);

    let generator = PoemGenerator::new(
        config.openai_endpoint.clone(),
        config.openai_model.clone(),
        config.temperature,
        config.openai_api_key.clone(),
        config.generation_timeout(),
    )
    .map_err(CustomError::new)?;

    if !generator.has_api_key() {
        warn!("OPENAI_API_KEY not found - the host must enter a key to generate poems");
    }

    let state = AppState::new(&config, resolver, catalog, generator);
    Ok(build_rocket(state, &config).into())
}
