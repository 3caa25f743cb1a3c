use anyhow::Context;

use bazaar_infra::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    bazaar_observability::init();

    let config = AppConfig::from_env().context("invalid configuration")?;

    let app = bazaar_api::app::build_app(&config)
        .await
        .context("failed to wire services")?;

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!(
        addr = %listener.local_addr()?,
        upload_dir = %config.upload_dir.display(),
        "listening"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
