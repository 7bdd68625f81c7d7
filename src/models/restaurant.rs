use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;

/// Upstream that produced a restaurant record.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Opentripmap,
    Geoapify,
}

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

/// Provider-neutral shape every places adapter parses into.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PlaceRecord {
    pub id: Option<String>,
    pub name: Option<String>,
    pub address_line1: Option<String>,
    pub street: Option<String>,
    pub formatted: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub rating: Option<f64>,
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct RestaurantResult {
    pub id: Option<String>,
    pub name: String,
    pub city: String,
    pub address: String,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub cuisine: String,
    pub rating: f64,
    /// No provider exposes pricing, so this stays 0.
    pub price_level: i32,
    pub source: Source,
}

impl RestaurantResult {
    /// Returns `None` for records without a usable name.
    pub fn from_place(record: PlaceRecord, city: &str, cuisine: &str, source: Source) -> Option<Self> {
        let name = record.name.filter(|n| !n.trim().is_empty())?;

        let address = [record.address_line1, record.street, record.formatted]
            .into_iter()
            .flatten()
            .find(|a| !a.trim().is_empty())
            .unwrap_or_default();

        let cuisine = if cuisine.trim().is_empty() {
            "unknown".to_string()
        } else {
            cuisine.to_string()
        };

        Some(RestaurantResult {
            id: record.id,
            name,
            city: city.to_string(),
            address,
            lat: record.lat,
            lon: record.lon,
            cuisine,
            rating: record.rating.unwrap_or(0.0),
            price_level: 0,
            source,
        })
    }
}

#[skip_serializing_none]
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct SearchResult {
    pub city: String,
    pub cuisine: String,
    pub budget: String,
    pub count: usize,
    pub restaurants: Vec<RestaurantResult>,
    pub error: Option<String>,
}

impl SearchResult {
    pub fn empty(city: &str, cuisine: &str, budget: &str) -> Self {
        SearchResult {
            city: city.to_string(),
            cuisine: cuisine.to_string(),
            budget: budget.to_string(),
            count: 0,
            restaurants: Vec::new(),
            error: None,
        }
    }

    pub fn failed(mut self, error: impl ToString) -> Self {
        self.count = 0;
        self.restaurants.clear();
        self.error = Some(error.to_string());
        self
    }

    pub fn with_restaurants(mut self, restaurants: Vec<RestaurantResult>) -> Self {
        self.count = restaurants.len();
        self.restaurants = restaurants;
        self
    }
}
