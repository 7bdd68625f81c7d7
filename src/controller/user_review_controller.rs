use axum::{Extension, Json, Router};
use axum::extract::Path;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use serde_json::Value;
use tracing::{info, warn};
use crate::controller::AppState;
use crate::errors::AppError;
use crate::helpers::session::SessionUser;
use crate::models::review::NewReview;

pub fn router(app_state: AppState) -> Router {
    Router::new()
        .route("/:restaurant_id/reviews", get(retrieve_restaurant_reviews).post(add_review))
        .route_layer(Extension(app_state))
}

pub async fn add_review(
    Extension(app_state): Extension<AppState>,
    SessionUser(user_id): SessionUser,
    Path(restaurant_id): Path<String>,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, AppError> {
    let review = NewReview::from_submission(body, &user_id, &restaurant_id).map_err(|errors| {
        info!("Rejected review from user: {} for restaurant: {}", user_id, restaurant_id);
        AppError::Validation(errors)
    })?;

    let stored = app_state.review_repo.add_review(review).await.map_err(|e| {
        warn!("Something went wrong adding review for restaurant due to: {}", e);
        AppError::Internal(e)
    })?;

    Ok((StatusCode::CREATED, Json(stored)))
}

pub async fn retrieve_restaurant_reviews(
    Extension(app_state): Extension<AppState>,
    Path(restaurant_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let reviews = app_state.review_repo.restaurant_reviews(&restaurant_id).await.map_err(|e| {
        warn!("Something went wrong retrieving reviews for restaurant due to: {}", e);
        AppError::Internal(e)
    })?;

    Ok((StatusCode::OK, Json(reviews)))
}
