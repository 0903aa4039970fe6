use clap::Parser;
use deck_gateway::utils::{logger, validation::Validate};
use deck_gateway::{
    service_router, AppDataDir, AuthState, FileConfigStore, FirebaseTokenVerifier, ServiceArgs,
};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = ServiceArgs::parse();

    let (settings, file) = match args.load() {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("❌ Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    let verbose = args.verbose || file.logging.verbose.unwrap_or(false);
    logger::init_logger(verbose, args.json_logs || file.logging.json.unwrap_or(false));

    tracing::info!("Starting user config service");

    if let Err(e) = settings.validate() {
        tracing::error!(category = ?e.category(), "❌ Configuration validation failed: {}", e);
        eprintln!("❌ {}", e);
        std::process::exit(1);
    }

    let app_data = match settings.app_data_directory() {
        Some(dir) => AppDataDir::new(dir),
        None => AppDataDir::from_env(),
    };
    app_data.ensure().await?;
    tracing::info!("📁 App data directory: {}", app_data.root().display());

    let verifier = FirebaseTokenVerifier::new(
        settings.project_id()?,
        settings.jwks_url.clone(),
        settings.jwks_timeout(),
    )?
    .with_key_ttl(settings.key_ttl())
    .with_refetch_interval(settings.refetch_interval());
    tracing::info!(project_id = %verifier.project_id(), "Verifying Firebase ID tokens");

    let auth = AuthState::new(Arc::new(verifier), settings.auth_policy());
    let app = service_router(FileConfigStore::in_app_data(&app_data), auth);

    deck_gateway::server::serve(settings.listen_addr()?, app).await?;
    Ok(())
}
