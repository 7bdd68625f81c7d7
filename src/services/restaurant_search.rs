use tracing::{info, warn};

use crate::errors::SearchError;
use crate::models::restaurant::{PlaceRecord, RestaurantResult, SearchResult};
use crate::providers::{Category, PlacesProvider, PlacesQuery};

#[derive(Clone, Debug)]
pub struct SearchRequest {
    pub city: String,
    pub cuisine: String,
    /// Echoed back only, nothing filters on it.
    pub budget: String,
    pub limit: u32,
}

/// Geocode the city, query nearby places and normalise them. Failures never
/// escape: they end up in `SearchResult::error` with no restaurants attached.
pub async fn find_restaurants(
    provider: &dyn PlacesProvider,
    radius_m: u32,
    request: &SearchRequest,
) -> SearchResult {
    let result = SearchResult::empty(&request.city, &request.cuisine, &request.budget);

    match lookup(provider, radius_m, request).await {
        Ok(places) => {
            let restaurants: Vec<RestaurantResult> = places
                .into_iter()
                .filter_map(|place| {
                    RestaurantResult::from_place(place, &request.city, &request.cuisine, provider.source())
                })
                .take(request.limit as usize)
                .collect();
            info!("Found {} restaurants in {}", restaurants.len(), request.city);
            result.with_restaurants(restaurants)
        }
        Err(e) => {
            warn!("Restaurant lookup for {} failed due to: {}", request.city, e);
            result.failed(e)
        }
    }
}

async fn lookup(
    provider: &dyn PlacesProvider,
    radius_m: u32,
    request: &SearchRequest,
) -> Result<Vec<PlaceRecord>, SearchError> {
    let center = provider.geocode(&request.city).await?;
    info!("Geocoded {} to ({}, {})", request.city, center.lat, center.lon);

    let mut query = PlacesQuery {
        center,
        radius_m,
        category: Category::for_cuisine(&request.cuisine),
        limit: request.limit,
    };

    let places = provider.search_places(&query).await;
    if !query.category.is_specific() || !needs_fallback(&places) {
        return places;
    }

    warn!(
        "No usable places for {:?} in {}, retrying with the base category",
        query.category, request.city
    );
    query.category = Category::Base;
    provider.search_places(&query).await
}

/// Only an upstream status error or an empty list is worth broadening once.
fn needs_fallback(places: &Result<Vec<PlaceRecord>, SearchError>) -> bool {
    match places {
        Ok(records) => records.is_empty(),
        Err(SearchError::UpstreamHttp { .. }) => true,
        Err(_) => false,
    }
}
