use std::net::SocketAddr;
use std::sync::Arc;
use anyhow::Context;
use axum::Router;
use reqwest::header::{HeaderName, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Method;
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tracing::info;
use crate::config::Config;
use crate::helpers::handler_404::page_not_found_handler;
use crate::helpers::session::SESSION_USER_HEADER;
use crate::providers::PlacesProvider;
use crate::repositories::ReviewRepo;
use crate::services::card_service::CardService;

pub mod health_check;
pub mod restaurant_controller;
pub mod user_review_controller;

#[derive(Clone)]
pub struct AppState {
    pub places_provider: Arc<dyn PlacesProvider>,
    pub review_repo: Arc<dyn ReviewRepo>,
    pub card_service: Arc<dyn CardService>,
    pub search_radius_m: u32,
}

pub async fn serve(
    app_state: AppState,
    config: &Config,
) -> anyhow::Result<()> {
    let origins = config.allowed_origins()?;

    let application = router_endpoints(app_state)
        .layer(
            ServiceBuilder::new()
                .layer(
                    CorsLayer::new()
                        .allow_methods([
                            Method::GET,
                            Method::POST,
                            Method::OPTIONS
                        ])
                        .allow_origin(origins)
                        .allow_headers([
                            AUTHORIZATION,
                            CONTENT_TYPE,
                            HeaderName::from_static(SESSION_USER_HEADER),
                        ])
                )
                .layer(CompressionLayer::new())
        );

    let address = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("API server listening on: {} ({})", address, config.environment);
    axum::Server::bind(&address)
        .serve(application.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Error spinning up the API server")
}

pub fn router_endpoints(app_state: AppState) -> Router {
    let restaurants = restaurant_controller::router(app_state.clone())
        .merge(user_review_controller::router(app_state));

    health_check::router()
        .nest("/restaurants", restaurants)
        .fallback(page_not_found_handler)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::warn!("Failed to listen for Ctrl+C due to: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::warn!("Failed to install SIGTERM handler due to: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutting down API server");
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, Response};
    use axum::body::BoxBody;
    use serde_json::Value;
    use time::OffsetDateTime;
    use tower::ServiceExt;

    use super::{router_endpoints, AppState};
    use crate::errors::SearchError;
    use crate::models::review::{NewReview, Review};
    use crate::providers::PlacesProvider;
    use crate::repositories::ReviewRepo;
    use crate::services::card_service::CardService;

    #[derive(Default)]
    pub(crate) struct InMemoryReviewRepo {
        pub rows: Mutex<Vec<Review>>,
    }

    #[async_trait]
    impl ReviewRepo for InMemoryReviewRepo {
        async fn add_review(&self, review: NewReview) -> anyhow::Result<Review> {
            let mut rows = self.rows.lock().unwrap();
            let stored = Review {
                id: rows.len() as i64 + 1,
                user_id: review.user_id,
                restaurant_id: review.restaurant_id,
                rating: review.rating,
                comment: review.comment,
                created_at: OffsetDateTime::now_utc(),
            };
            rows.push(stored.clone());
            Ok(stored)
        }

        async fn restaurant_reviews(&self, restaurant_id: &str) -> anyhow::Result<Vec<Review>> {
            let rows = self.rows.lock().unwrap();
            Ok(rows
                .iter()
                .rev()
                .filter(|r| r.restaurant_id == restaurant_id)
                .cloned()
                .collect())
        }
    }

    pub(crate) struct StaticCardService(pub Result<Value, SearchError>);

    #[async_trait]
    impl CardService for StaticCardService {
        async fn draw_card(&self) -> Result<Value, SearchError> {
            self.0.clone()
        }
    }

    pub(crate) fn app_state(
        places_provider: Arc<dyn PlacesProvider>,
        review_repo: Arc<InMemoryReviewRepo>,
        card: Result<Value, SearchError>,
    ) -> AppState {
        AppState {
            places_provider,
            review_repo,
            card_service: Arc::new(StaticCardService(card)),
            search_radius_m: 1000,
        }
    }

    pub(crate) async fn send(state: AppState, request: Request<Body>) -> Response<BoxBody> {
        router_endpoints(state).oneshot(request).await.unwrap()
    }

    pub(crate) async fn json_body(response: Response<BoxBody>) -> Value {
        let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }
}
