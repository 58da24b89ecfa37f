use anyhow::Context;
use weather_subscriptions::{
    configuration::get_configuration,
    startup::Application,
    telemetry::{get_subscriber, init_subscriber},
};

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let subscriber = get_subscriber(
        "weather_subscriptions".into(),
        "info".into(),
        std::io::stdout,
    );
    init_subscriber(subscriber)?;

    let config = get_configuration().context("Failed to read configuration")?;
    let application = Application::build(config).await?;
    application.run_until_stopped().await?;

    Ok(())
}
