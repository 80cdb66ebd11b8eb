use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;

use crate::Result;
use crate::api;
use crate::assistant::TravelAssistant;

/// Longer than any single upstream call, itinerary generation included
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

#[allow(deprecated)]
fn timeout_layer() -> TimeoutLayer {
    TimeoutLayer::new(REQUEST_TIMEOUT)
}

pub fn app(assistant: Arc<TravelAssistant>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .nest("/api", api::router(assistant))
        .layer(timeout_layer())
        .layer(cors)
}

pub async fn run(addr: SocketAddr, assistant: Arc<TravelAssistant>) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Web server running at http://{}", listener.local_addr()?);
    axum::serve(listener, app(assistant))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("Web server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::PlaceCatalog;
    use crate::config::{DefaultsConfig, WeatherConfig};
    use crate::weather::WeatherApiClient;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn assistant() -> Arc<TravelAssistant> {
        Arc::new(TravelAssistant::new(
            PlaceCatalog::builtin().unwrap(),
            WeatherApiClient::new(WeatherConfig::default()).unwrap(),
            DefaultsConfig::default(),
        ))
    }

    #[tokio::test]
    async fn test_api_is_nested_and_allows_cors() {
        let response = app(assistant())
            .oneshot(
                Request::builder()
                    .uri("/api/categories")
                    .header("origin", "http://localhost:5173")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["access-control-allow-origin"], "*");
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let response = app(assistant())
            .oneshot(Request::builder().uri("/categories").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
