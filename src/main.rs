use std::net::SocketAddr;
use std::sync::Arc;
use taskboard::api::{self, AppState};
use taskboard::settings::Settings;
use taskboard::store::Store;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = Settings::load().expect("Failed to load settings");
    let store = Store::open(&settings.db_path).expect("Failed to open database");

    let state = Arc::new(AppState { store });
    let app = api::router(state);

    let addr: SocketAddr = format!("{}:{}", settings.bind_address, settings.port)
        .parse()
        .expect("Invalid bind address");

    tracing::info!(%addr, db = %settings.db_path, "taskboard listening");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind");
    axum::serve(listener, app).await.expect("Server error");
}
