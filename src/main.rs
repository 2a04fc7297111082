use abnt_formatter::api::middleware::request_id::X_REQUEST_ID;
use abnt_formatter::config::ServerConfig;
use abnt_formatter::services::formatter::create_formatter;
use abnt_formatter::{AppState, create_app};
use axum::http::{Request, Response};
use dotenvy::dotenv;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tower_http::trace::TraceLayer;
use tracing::{Span, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    // Initialize tracing with EnvFilter
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "abnt_formatter=info,tower_http=info,metrics=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("🚀 Starting ABNT formatter...");

    let config = ServerConfig::from_env();
    info!(
        "🛡️  Upload Config: Max Size={}MB, Processing Delay={:?}, Formatter={}",
        config.max_file_size / 1024 / 1024,
        config.processing_delay,
        config.formatter_type
    );

    let formatter = create_formatter(&config.formatter_type, config.processing_delay);
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;

    let state = AppState {
        formatter: Arc::from(formatter),
        config,
    };

    // Only caller-supplied ids are visible here; generated ones are added further in
    let app = create_app(state).layer(
        TraceLayer::new_for_http()
            .make_span_with(|request: &Request<_>| {
                let request_id = request
                    .headers()
                    .get(&X_REQUEST_ID)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("-");
                tracing::info_span!(
                    "upload_server",
                    method = %request.method(),
                    path = %request.uri().path(),
                    request_id = %request_id,
                )
            })
            .on_response(|response: &Response<_>, latency: Duration, _span: &Span| {
                info!("📤 {} in {:?}", response.status(), latency);
            }),
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("✅ Server ready at http://{}", listener.local_addr()?);
    info!("📖 Swagger UI: http://{}/swagger-ui", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("🛑 Server shut down gracefully.");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("⌨️  Ctrl+C received, starting graceful shutdown...");
        },
        _ = terminate => {
            info!("💤 SIGTERM received, starting graceful shutdown...");
        },
    }
}
