use earshot_core::Config;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let config = Config::from_env()?;

    earshot_api::telemetry::init_telemetry()?;

    let (_state, router) = earshot_api::setup::initialize_app(config.clone()).await?;

    earshot_api::setup::server::start_server(&config, router).await?;

    Ok(())
}
