use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Missing configuration and an absent sensor are the only fatal
    // startup paths; both exit nonzero with a diagnostic.
    let config = aqm_core::config::load_from_env()?;

    aqm_core::runtime::run(config)
        .await
        .map_err(|e| color_eyre::eyre::eyre!(e))
}
