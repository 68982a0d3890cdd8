use consign_server::{AppState, Config, Server, init_logger};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Environment (.env is optional in production)
    let _ = dotenv::dotenv();

    // 2. Load configuration
    let config = Config::from_env();

    // 3. Logging (console + daily rolling file under the work dir)
    init_logger(&config.work_dir)?;

    tracing::info!("Consign server starting...");

    // 4. Initialize application state
    let state = AppState::initialize(&config).await?;

    // 5. Run the HTTP server until ctrl-c
    let server = Server::with_state(config, state);
    if let Err(e) = server.run().await {
        tracing::error!("Server error: {}", e);
        return Err(e.into());
    }

    Ok(())
}
