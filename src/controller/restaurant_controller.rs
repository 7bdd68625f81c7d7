use axum::{Extension, Json, Router};
use axum::extract::Query;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};
use crate::controller::AppState;
use crate::errors::AppError;
use crate::models::restaurant::SearchResult;
use crate::services::restaurant_search::{find_restaurants, SearchRequest};

const DEFAULT_CITY: &str = "Dublin";
const DEFAULT_BUDGET: &str = "medium";
const SEARCH_LIMIT: u32 = 10;
const RECOMMENDATION_LIMIT: u32 = 5;

pub fn router(app_state: AppState) -> Router {
    Router::new()
        .route("/search", get(search_restaurants))
        .route("/recommendations", get(recommend_restaurants))
        .route("/draw-card", get(draw_random_card))
        .route_layer(Extension(app_state))
}

fn default_city() -> String {
    DEFAULT_CITY.to_string()
}

fn default_budget() -> String {
    DEFAULT_BUDGET.to_string()
}

#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct SearchParams {
    #[serde(default = "default_city")]
    pub city: String,
    #[serde(default)]
    pub cuisine: String,
    #[serde(default = "default_budget")]
    pub budget: String,
    /// Kept as text so a bad value is reported in the body instead of rejecting the request.
    pub limit: Option<String>,
}

impl SearchParams {
    fn into_request(self, default_limit: u32) -> Result<SearchRequest, SearchResult> {
        let limit = match self.limit.as_deref().map(str::trim) {
            None | Some("") => default_limit,
            Some(raw) => match raw.parse::<u32>() {
                Ok(limit) => limit,
                Err(_) => {
                    warn!("Rejecting search with invalid limit: {}", raw);
                    let message = format!("Invalid limit: {}", raw);
                    return Err(SearchResult::empty(&self.city, &self.cuisine, &self.budget).failed(message));
                }
            },
        };

        Ok(SearchRequest {
            city: self.city,
            cuisine: self.cuisine,
            budget: self.budget,
            limit,
        })
    }
}

async fn run_search(app_state: &AppState, query: SearchParams, default_limit: u32) -> SearchResult {
    match query.into_request(default_limit) {
        Ok(request) => {
            find_restaurants(
                app_state.places_provider.as_ref(),
                app_state.search_radius_m,
                &request,
            ).await
        }
        Err(result) => result,
    }
}

/// Always 200: upstream failures are reported in the body's `error` field.
pub async fn search_restaurants(
    Extension(app_state): Extension<AppState>,
    Query(query): Query<SearchParams>,
) -> impl IntoResponse {
    let result = run_search(&app_state, query, SEARCH_LIMIT).await;

    (StatusCode::OK, Json(result)).into_response()
}

pub async fn recommend_restaurants(
    Extension(app_state): Extension<AppState>,
    Query(query): Query<SearchParams>,
) -> impl IntoResponse {
    let result = run_search(&app_state, query, RECOMMENDATION_LIMIT).await;

    (StatusCode::OK, Json(result)).into_response()
}

#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct DrawCardParams {
    #[serde(default = "default_city")]
    pub city: String,
}

/// Unlike search, a failing card service fails the whole request.
pub async fn draw_random_card(
    Extension(app_state): Extension<AppState>,
    Query(query): Query<DrawCardParams>,
) -> Result<impl IntoResponse, AppError> {
    let card = app_state.card_service.draw_card().await.map_err(|e| {
        warn!("Something went wrong drawing a card due to: {}", e);
        e
    })?;

    let request = SearchRequest {
        city: query.city,
        cuisine: String::new(),
        budget: DEFAULT_BUDGET.to_string(),
        limit: 1,
    };
    let result = find_restaurants(
        app_state.places_provider.as_ref(),
        app_state.search_radius_m,
        &request,
    ).await;

    let restaurant = result.restaurants.into_iter().next();
    if restaurant.is_none() {
        info!("No restaurant to pair with the card for {}", request.city);
    }

    Ok((
        StatusCode::OK,
        Json(json!({
            "card": card,
            "restaurant": restaurant,
        })),
    ))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::json;

    use crate::controller::test_support::*;
    use crate::errors::{SearchError, Stage};
    use crate::models::restaurant::Coordinates;
    use crate::providers::Category;
    use crate::services::restaurant_search::tests::{place, MockProvider};

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn search_defaults_to_dublin_with_base_category() {
        let provider = Arc::new(MockProvider::dublin(vec![Ok(vec![
            place(Some("The Woollen Mills")),
            place(Some("Queen of Tarts")),
        ])]));
        let state = app_state(provider.clone(), Arc::new(InMemoryReviewRepo::default()), Ok(json!({})));

        let response = send(state, get("/restaurants/search")).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(body["city"], json!("Dublin"));
        assert_eq!(body["cuisine"], json!(""));
        assert_eq!(body["budget"], json!("medium"));
        assert_eq!(body["count"], json!(2));
        assert_eq!(body["restaurants"][0]["price_level"], json!(0));
        assert_eq!(body["restaurants"][0]["source"], json!("geoapify"));
        assert!(body.get("error").is_none());

        let queries = provider.queries.lock().unwrap();
        assert_eq!(queries.len(), 1);
        assert_eq!(queries[0].category, Category::Base);
        assert_eq!(queries[0].limit, 10);
    }

    #[tokio::test]
    async fn geocode_failure_is_still_200() {
        let provider = Arc::new(MockProvider::new(
            Err(SearchError::UpstreamHttp { stage: Stage::Geocode, status: 403 }),
            vec![],
        ));
        let state = app_state(provider, Arc::new(InMemoryReviewRepo::default()), Ok(json!({})));

        let response = send(state, get("/restaurants/search?city=Cork&budget=high")).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(body["count"], json!(0));
        assert_eq!(body["restaurants"], json!([]));
        assert_eq!(body["error"], json!("Geocode error: 403"));
        assert_eq!(body["budget"], json!("high"));
    }

    #[tokio::test]
    async fn bad_limit_is_reported_in_a_200_body() {
        for raw in ["abc", "-1", "2.5"] {
            let provider = Arc::new(MockProvider::dublin(vec![Ok(vec![place(Some("Unreached"))])]));
            let state = app_state(provider.clone(), Arc::new(InMemoryReviewRepo::default()), Ok(json!({})));

            let uri = format!("/restaurants/search?city=Galway&limit={}", raw);
            let response = send(state, get(&uri)).await;
            assert_eq!(response.status(), StatusCode::OK);

            let body = json_body(response).await;
            assert_eq!(body["city"], json!("Galway"));
            assert_eq!(body["count"], json!(0));
            assert_eq!(body["restaurants"], json!([]));
            assert_eq!(body["error"], json!(format!("Invalid limit: {}", raw)));
            assert!(provider.queries.lock().unwrap().is_empty());
        }
    }

    #[tokio::test]
    async fn explicit_limit_is_forwarded() {
        let provider = Arc::new(MockProvider::dublin(vec![Ok(Vec::new())]));
        let state = app_state(provider.clone(), Arc::new(InMemoryReviewRepo::default()), Ok(json!({})));

        let response = send(state, get("/restaurants/recommendations?limit=3")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(provider.queries.lock().unwrap()[0].limit, 3);
    }

    #[tokio::test]
    async fn recommendations_use_a_smaller_default_limit() {
        let provider = Arc::new(MockProvider::dublin(vec![Ok(Vec::new()), Ok(Vec::new())]));
        let state = app_state(provider.clone(), Arc::new(InMemoryReviewRepo::default()), Ok(json!({})));

        let response = send(state, get("/restaurants/recommendations?cuisine=vegan")).await;
        assert_eq!(response.status(), StatusCode::OK);

        let queries = provider.queries.lock().unwrap();
        assert_eq!(queries.len(), 2);
        assert_eq!(queries[0].limit, 5);
        assert_eq!(queries[0].category, Category::Cuisine("vegan".into()));
        assert_eq!(queries[1].category, Category::Base);
    }

    #[tokio::test]
    async fn draw_card_pairs_card_with_first_restaurant() {
        let provider = Arc::new(MockProvider::new(
            Ok(Coordinates { lat: 51.8985, lon: -8.4756 }),
            vec![Ok(vec![place(Some("Cafe Paradiso"))])],
        ));
        let card = json!({ "id": 12, "title": "Try something new" });
        let state = app_state(provider.clone(), Arc::new(InMemoryReviewRepo::default()), Ok(card.clone()));

        let response = send(state, get("/restaurants/draw-card?city=Cork")).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(body["card"], card);
        assert_eq!(body["restaurant"]["name"], json!("Cafe Paradiso"));
        assert_eq!(body["restaurant"]["city"], json!("Cork"));
        assert_eq!(provider.queries.lock().unwrap()[0].limit, 1);
    }

    #[tokio::test]
    async fn draw_card_without_restaurants_returns_null() {
        let provider = Arc::new(MockProvider::new(Err(SearchError::NotFound { city: "Nowhere".into() }), vec![]));
        let state = app_state(provider, Arc::new(InMemoryReviewRepo::default()), Ok(json!({ "id": 1 })));

        let body = json_body(send(state, get("/restaurants/draw-card?city=Nowhere")).await).await;
        assert_eq!(body["restaurant"], json!(null));
        assert_eq!(body["card"]["id"], json!(1));
    }

    #[tokio::test]
    async fn card_service_failure_is_a_hard_failure() {
        let provider = Arc::new(MockProvider::dublin(vec![]));
        let state = app_state(
            provider.clone(),
            Arc::new(InMemoryReviewRepo::default()),
            Err(SearchError::UpstreamHttp { stage: Stage::Card, status: 500 }),
        );

        let response = send(state, get("/restaurants/draw-card")).await;
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert!(provider.queries.lock().unwrap().is_empty());
    }
}
