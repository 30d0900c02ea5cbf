use entitlement_service::{config::Config, startup::Application};
use service_core::observability::logging::init_tracing;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // RUST_LOG wins over the default filter.
    init_tracing("info,entitlement_service=debug");

    let config = Config::from_env()?;
    let application = Application::build(config).await?;
    application.run_until_stopped().await?;

    Ok(())
}
