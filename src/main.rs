/// API сервер для генераторов дескрипторов

use descriptor_kit::api::{create_router, AppState};
use descriptor_kit::config::ServiceConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Инициализация логирования
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = ServiceConfig::from_env()?;
    let elements = config.load_elements()?;
    tracing::info!("Loaded properties for {} elements", elements.len());

    let app = create_router(AppState::new(elements));

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Server listening on http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
