use anyhow::{anyhow, Context};
use async_trait::async_trait;
use bb8_postgres::bb8::{Pool, PooledConnection};
use bb8_postgres::PostgresConnectionManager;
use bb8_postgres::tokio_postgres::{NoTls, Row};
use tracing::warn;

use crate::models::review::{NewReview, Review};
use crate::repositories::ReviewRepo;

pub const RETRY_LIMIT: usize = 5;

const CREATE_REVIEWS_TABLE: &str = include_str!("../../migrations/001_create_reviews.sql");

pub struct PostgresConnectionRepo {
    postgres_connection: Pool<PostgresConnectionManager<NoTls>>,
}

impl PostgresConnectionRepo {
    pub fn new(
        postgres_connection: Pool<PostgresConnectionManager<NoTls>>,
    ) -> Self {
        Self {
            postgres_connection
        }
    }

    async fn get_postgres_connection(
        &self,
    ) -> anyhow::Result<PooledConnection<'_, PostgresConnectionManager<NoTls>>> {
        for _ in 0..RETRY_LIMIT {
            match self.postgres_connection.get().await {
                Ok(conn) => return Ok(conn),
                Err(e) => {
                    warn!("Failed to retrieve postgres connection due to: {}, retrying in 3s", e);
                    tokio::time::sleep(tokio::time::Duration::from_secs(3)).await;
                    continue;
                }
            }
        }

        Err(anyhow!("Failed to retrieve a valid connection from postgres pool, BAILING"))
    }

    pub async fn ensure_schema(&self) -> anyhow::Result<()> {
        let conn = self.get_postgres_connection().await?;
        conn.batch_execute(CREATE_REVIEWS_TABLE)
            .await
            .context("Failed to create reviews table")
    }
}

#[async_trait]
impl ReviewRepo for PostgresConnectionRepo {
    async fn add_review(
        &self,
        review: NewReview,
    ) -> anyhow::Result<Review> {
        let conn = self.get_postgres_connection().await?;
        let stmt = "INSERT INTO reviews (user_id, restaurant_id, rating, comment) \
            VALUES ($1, $2, $3, $4) \
            RETURNING id, user_id, restaurant_id, rating, comment, created_at;";

        let row = conn
            .query_one(
                stmt,
                &[&review.user_id, &review.restaurant_id, &review.rating, &review.comment],
            )
            .await
            .map_err(|e| {
                warn!("Failed to add review to restaurant: {} for user: {}, due to: {}", review.restaurant_id, review.user_id, e);
                e
            })?;

        parse_row_into_review(&row)
    }

    async fn restaurant_reviews(
        &self,
        restaurant_id: &str,
    ) -> anyhow::Result<Vec<Review>> {
        let conn = self.get_postgres_connection().await?;
        let stmt = "SELECT id, user_id, restaurant_id, rating, comment, created_at \
            FROM reviews WHERE restaurant_id = $1 ORDER BY created_at DESC, id DESC;";

        let rows = conn
            .query(stmt, &[&restaurant_id])
            .await
            .map_err(|e| {
                warn!("Failed to retrieve reviews for restaurant: {} due to: {}", restaurant_id, e);
                e
            })?;

        rows.iter().map(parse_row_into_review).collect()
    }
}

fn parse_row_into_review(
    row: &Row,
) -> anyhow::Result<Review> {
    Ok(Review {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        restaurant_id: row.try_get("restaurant_id")?,
        rating: row.try_get("rating")?,
        comment: row.try_get("comment")?,
        created_at: row.try_get("created_at")?,
    })
}
