use clap::Parser;
use deck_gateway::utils::{logger, validation::Validate};
use deck_gateway::{gateway_router, GatewayArgs, HttpUpstream, UserConfigProxy};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = GatewayArgs::parse();

    let (settings, file) = match args.load() {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("❌ Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    let verbose = args.verbose || file.logging.verbose.unwrap_or(false);
    logger::init_logger(verbose, args.json_logs || file.logging.json.unwrap_or(false));

    tracing::info!("Starting deck-gateway");
    tracing::debug!("Gateway settings: {:?}", settings);

    if let Err(e) = settings.validate() {
        tracing::error!(category = ?e.category(), "❌ Configuration validation failed: {}", e);
        eprintln!("❌ {}", e);
        std::process::exit(1);
    }

    let upstream = HttpUpstream::new(&settings.upstream_url, settings.timeout())?;
    tracing::info!("Proxying user config to {}", upstream.endpoint());

    let app = gateway_router(UserConfigProxy::new(upstream));
    deck_gateway::server::serve(settings.listen_addr()?, app).await?;

    Ok(())
}
