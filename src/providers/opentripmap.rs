use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::info;

use crate::errors::{SearchError, Stage};
use crate::models::restaurant::{Coordinates, PlaceRecord, Source};
use crate::providers::{get_json, number_field, str_field, PlacesProvider, PlacesQuery};

const BASE_URL: &str = "https://api.opentripmap.com/0.1/en/places";
const BASE_KIND: &str = "foods";
/// Only places at least this popular are returned.
const MIN_RATE: &str = "2";

pub struct OpenTripMapClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl OpenTripMapClient {
    pub fn new(client: Client, api_key: String) -> Self {
        Self::with_base_url(client, api_key, BASE_URL)
    }

    pub fn with_base_url(client: Client, api_key: String, base_url: &str) -> Self {
        Self {
            client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl PlacesProvider for OpenTripMapClient {
    fn source(&self) -> Source {
        Source::Opentripmap
    }

    fn base_category(&self) -> &str {
        BASE_KIND
    }

    /// OpenTripMap kinds are flat, so the cuisine is the kind itself.
    fn cuisine_category(&self, cuisine: &str) -> String {
        cuisine.to_string()
    }

    async fn geocode(&self, city: &str) -> Result<Coordinates, SearchError> {
        let url = format!("{}/geoname", self.base_url);
        let params = [("name", city.to_string()), ("apikey", self.api_key.clone())];

        let body = get_json(&self.client, &url, &params, Stage::Geocode).await?;
        parse_geoname(&body).ok_or_else(|| SearchError::NotFound {
            city: city.to_string(),
        })
    }

    async fn search_places(&self, query: &PlacesQuery) -> Result<Vec<PlaceRecord>, SearchError> {
        let url = format!("{}/radius", self.base_url);
        let params = [
            ("radius", query.radius_m.to_string()),
            ("lon", query.center.lon.to_string()),
            ("lat", query.center.lat.to_string()),
            ("kinds", self.category_filter(&query.category)),
            ("rate", MIN_RATE.to_string()),
            ("format", "json".to_string()),
            ("limit", query.limit.to_string()),
            ("apikey", self.api_key.clone()),
        ];

        let body = get_json(&self.client, &url, &params, Stage::Places).await?;
        let places = parse_radius_list(&body)?;
        info!("OpenTripMap returned {} places for kinds {:?}", places.len(), query.category);
        Ok(places)
    }
}

fn parse_geoname(body: &Value) -> Option<Coordinates> {
    Some(Coordinates {
        lat: number_field(body, "lat")?,
        lon: number_field(body, "lon")?,
    })
}

/// `format=json` makes the radius endpoint answer with a bare list.
fn parse_radius_list(body: &Value) -> Result<Vec<PlaceRecord>, SearchError> {
    let items = body.as_array().ok_or_else(|| SearchError::MalformedResponse {
        stage: Stage::Places,
        detail: "expected a list of places".to_string(),
    })?;

    Ok(items
        .iter()
        .filter(|item| item.is_object())
        .map(|item| {
            let point = item.get("point").cloned().unwrap_or(Value::Null);
            PlaceRecord {
                id: str_field(item, "xid"),
                name: str_field(item, "name"),
                lat: number_field(&point, "lat"),
                lon: number_field(&point, "lon"),
                rating: number_field(item, "rate"),
                ..Default::default()
            }
        })
        .collect())
}
