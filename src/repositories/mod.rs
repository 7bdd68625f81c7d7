use async_trait::async_trait;

use crate::models::review::{NewReview, Review};

pub mod postgres_repo;

#[async_trait]
pub trait ReviewRepo: Send + Sync {
    async fn add_review(&self, review: NewReview) -> anyhow::Result<Review>;

    /// Newest first.
    async fn restaurant_reviews(&self, restaurant_id: &str) -> anyhow::Result<Vec<Review>>;
}
