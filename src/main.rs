use docs2md_backend::config::ConvertConfig;
use docs2md_backend::services::cache::SessionStore;
use docs2md_backend::services::converter::{DocumentConverter, create_converter};
use docs2md_backend::services::pipeline::ConversionService;
use docs2md_backend::{AppState, create_app};
use dotenvy::dotenv;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    // Initialize tracing with EnvFilter
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "docs2md_backend=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("🚀 Starting Docs-to-Markdown Backend...");

    let config = ConvertConfig::from_env();
    info!(
        "⚙️  Config: Hard Cap={}MB, Warn={}MB, Chunk={}MB, Converter={}",
        config.max_file_size / 1024 / 1024,
        config.warn_threshold / 1024 / 1024,
        config.chunk_size / 1024 / 1024,
        config.converter_type
    );

    let converter: Arc<dyn DocumentConverter> =
        Arc::from(create_converter(&config.converter_type, &config.converter_command));
    if !converter.health_check().await {
        tracing::warn!(
            "Converter '{}' failed its health check; conversions may fail",
            config.converter_type
        );
    }

    let state = AppState {
        sessions: Arc::new(SessionStore::new()),
        pipeline: Arc::new(ConversionService::new(converter, config.clone())),
        config: config.clone(),
    };

    let app = create_app(state)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    let session_id = request
                        .headers()
                        .get("x-session-id")
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("anonymous");
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        session_id = %session_id,
                    )
                })
                .on_request(|request: &axum::http::Request<_>, _span: &tracing::Span| {
                    info!("📥 {} {}", request.method(), request.uri());
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     _span: &tracing::Span| {
                        info!(
                            "📤 Finished in {:?} with status {}",
                            latency,
                            response.status()
                        );
                    },
                ),
        )
        .layer(CorsLayer::permissive());

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3000);
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    info!("✅ Server ready at http://{}", addr);
    info!("📖 Swagger UI: http://{}/swagger-ui", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

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
