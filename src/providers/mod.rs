use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::warn;

use crate::errors::{SearchError, Stage};
use crate::models::restaurant::{Coordinates, PlaceRecord, Source};

pub mod geoapify;
pub mod opentripmap;

/// Category filter sent with a places query.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Category {
    Base,
    Cuisine(String),
}

impl Category {
    /// Cuisine is reduced to `[a-z0-9_]` so it cannot smuggle a second category
    /// into the upstream filter. Nothing left means no refinement.
    pub fn for_cuisine(cuisine: &str) -> Self {
        let cuisine: String = cuisine
            .trim()
            .to_lowercase()
            .chars()
            .map(|c| if c.is_whitespace() { '_' } else { c })
            .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '_')
            .collect();
        if cuisine.is_empty() {
            Category::Base
        } else {
            Category::Cuisine(cuisine)
        }
    }

    pub fn is_specific(&self) -> bool {
        matches!(self, Category::Cuisine(_))
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct PlacesQuery {
    pub center: Coordinates,
    pub radius_m: u32,
    pub category: Category,
    pub limit: u32,
}

#[async_trait]
pub trait PlacesProvider: Send + Sync {
    fn source(&self) -> Source;

    fn base_category(&self) -> &str;

    fn cuisine_category(&self, cuisine: &str) -> String;

    /// Upstream filter value for a category.
    fn category_filter(&self, category: &Category) -> String {
        match category {
            Category::Base => self.base_category().to_string(),
            Category::Cuisine(cuisine) => self.cuisine_category(cuisine),
        }
    }

    async fn geocode(&self, city: &str) -> Result<Coordinates, SearchError>;

    async fn search_places(&self, query: &PlacesQuery) -> Result<Vec<PlaceRecord>, SearchError>;
}

pub fn build_http_client(timeout: Duration) -> anyhow::Result<Client> {
    let client = Client::builder()
        .timeout(timeout)
        .connect_timeout(timeout)
        .build()?;
    Ok(client)
}

/// Single GET with no retry. Non-2xx, transport and decode failures are kept apart
/// so callers can decide which ones are worth a category fallback.
pub async fn get_json(
    client: &Client,
    url: &str,
    params: &[(&str, String)],
    stage: Stage,
) -> Result<Value, SearchError> {
    let response = client
        .get(url)
        .query(params)
        .send()
        .await
        .map_err(|e| SearchError::from_reqwest(stage, e))?;

    let status = response.status();
    if !status.is_success() {
        warn!("{} upstream responded with status: {}", stage, status);
        return Err(SearchError::UpstreamHttp {
            stage,
            status: status.as_u16(),
        });
    }

    response
        .json::<Value>()
        .await
        .map_err(|e| SearchError::MalformedResponse {
            stage,
            detail: e.to_string(),
        })
}

pub(crate) fn str_field(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(Value::as_str).map(String::from)
}

pub(crate) fn number_field(value: &Value, key: &str) -> Option<f64> {
    value.get(key).and_then(Value::as_f64)
}
