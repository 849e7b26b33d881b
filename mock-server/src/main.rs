use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let port = std::env::var("PORT").unwrap_or_else(|_| "8001".to_string());
    let addr = format!("0.0.0.0:{port}");
    let listener = TcpListener::bind(&addr).await?;
    if std::env::var("MOCK_FAILING").is_ok_and(|v| v == "1") {
        tracing::warn!(%addr, "listening in failing mode");
        mock_server::run_failing(listener).await
    } else {
        tracing::info!(%addr, "listening");
        mock_server::run(listener).await
    }
}
