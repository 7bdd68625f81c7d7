use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::info;

use crate::errors::{SearchError, Stage};
use crate::models::restaurant::{Coordinates, PlaceRecord, Source};
use crate::providers::{get_json, number_field, str_field, PlacesProvider, PlacesQuery};

const BASE_URL: &str = "https://api.geoapify.com";
const BASE_CATEGORY: &str = "catering.restaurant";

pub struct GeoapifyClient {
    client: Client,
    api_key: String,
    geocode_url: String,
    places_url: String,
}

impl GeoapifyClient {
    pub fn new(client: Client, api_key: String) -> Self {
        Self::with_base_url(client, api_key, BASE_URL)
    }

    pub fn with_base_url(client: Client, api_key: String, base_url: &str) -> Self {
        let base_url = base_url.trim_end_matches('/');
        Self {
            client,
            api_key,
            geocode_url: format!("{}/v1/geocode/search", base_url),
            places_url: format!("{}/v2/places", base_url),
        }
    }
}

#[async_trait]
impl PlacesProvider for GeoapifyClient {
    fn source(&self) -> Source {
        Source::Geoapify
    }

    fn base_category(&self) -> &str {
        BASE_CATEGORY
    }

    fn cuisine_category(&self, cuisine: &str) -> String {
        format!("{}.{}", BASE_CATEGORY, cuisine)
    }

    async fn geocode(&self, city: &str) -> Result<Coordinates, SearchError> {
        let params = [
            ("text", city.to_string()),
            ("type", "city".to_string()),
            ("format", "json".to_string()),
            ("limit", "1".to_string()),
            ("apiKey", self.api_key.clone()),
        ];

        let body = get_json(&self.client, &self.geocode_url, &params, Stage::Geocode).await?;
        parse_geocode(&body).ok_or_else(|| SearchError::NotFound {
            city: city.to_string(),
        })
    }

    async fn search_places(&self, query: &PlacesQuery) -> Result<Vec<PlaceRecord>, SearchError> {
        let params = [
            ("categories", self.category_filter(&query.category)),
            (
                "filter",
                format!("circle:{},{},{}", query.center.lon, query.center.lat, query.radius_m),
            ),
            ("limit", query.limit.to_string()),
            ("apiKey", self.api_key.clone()),
        ];

        let body = get_json(&self.client, &self.places_url, &params, Stage::Places).await?;
        let places = parse_feature_collection(&body)?;
        info!("Geoapify returned {} places for {:?}", places.len(), query.category);
        Ok(places)
    }
}

fn parse_geocode(body: &Value) -> Option<Coordinates> {
    let first = body.get("results")?.as_array()?.first()?;
    Some(Coordinates {
        lat: number_field(first, "lat")?,
        lon: number_field(first, "lon")?,
    })
}

fn parse_feature_collection(body: &Value) -> Result<Vec<PlaceRecord>, SearchError> {
    let features = body
        .get("features")
        .and_then(Value::as_array)
        .ok_or_else(|| SearchError::MalformedResponse {
            stage: Stage::Places,
            detail: "expected a feature collection".to_string(),
        })?;

    Ok(features.iter().filter_map(parse_feature).collect())
}

fn parse_feature(feature: &Value) -> Option<PlaceRecord> {
    let properties = feature.get("properties")?;

    // GeoJSON order is [lon, lat]
    let coordinates = feature
        .pointer("/geometry/coordinates")
        .and_then(Value::as_array);
    let geometry_at = |i: usize| coordinates.and_then(|c| c.get(i)).and_then(Value::as_f64);

    Some(PlaceRecord {
        id: str_field(properties, "place_id"),
        name: str_field(properties, "name"),
        address_line1: str_field(properties, "address_line1"),
        street: str_field(properties, "street"),
        formatted: str_field(properties, "formatted"),
        lat: number_field(properties, "lat").or_else(|| geometry_at(1)),
        lon: number_field(properties, "lon").or_else(|| geometry_at(0)),
        rating: properties.pointer("/rank/popularity").and_then(Value::as_f64),
    })
}
