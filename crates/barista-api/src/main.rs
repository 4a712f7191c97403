use barista_api::setup;
use barista_core::Config;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    // Load configuration
    let config = Config::load();

    // Initialize the application (telemetry, database, metrics, routes)
    let app = setup::initialize_app(&config).await?;

    // Start the server
    setup::server::start_server(&config, app).await?;

    Ok(())
}
