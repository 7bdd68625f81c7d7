pub mod card_service;
pub mod restaurant_search;
