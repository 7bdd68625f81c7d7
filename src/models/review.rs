use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use time::OffsetDateTime;

use crate::errors::ValidationErrors;

pub const MIN_RATING: i64 = 1;
pub const MAX_RATING: i64 = 5;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Review {
    pub id: i64,
    #[serde(rename = "user")]
    pub user_id: String,
    #[serde(rename = "restaurant")]
    pub restaurant_id: String,
    pub rating: i32,
    pub comment: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// A validated review that has not been persisted yet.
#[derive(Clone, Debug, PartialEq)]
pub struct NewReview {
    pub user_id: String,
    pub restaurant_id: String,
    pub rating: i32,
    pub comment: String,
}

impl NewReview {
    /// Overwrites `user` and `restaurant` in the submitted payload with the
    /// session identity and path id, then validates the rest.
    pub fn from_submission(
        payload: Value,
        user_id: &str,
        restaurant_id: &str,
    ) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::default();

        let mut data = match payload {
            Value::Object(map) => map,
            _ => {
                errors.add("non_field_errors", "Invalid data. Expected a dictionary.");
                return Err(errors);
            }
        };
        data.insert("user".to_string(), Value::String(user_id.to_string()));
        data.insert("restaurant".to_string(), Value::String(restaurant_id.to_string()));

        let rating = validate_rating(&data, &mut errors);
        let comment = validate_comment(&data, &mut errors);

        let restaurant_id = data
            .get("restaurant")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        if restaurant_id.trim().is_empty() {
            errors.add("restaurant", "This field may not be blank.");
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(NewReview {
            user_id: user_id.to_string(),
            restaurant_id,
            rating: rating.unwrap_or_default(),
            comment: comment.unwrap_or_default(),
        })
    }
}

fn validate_rating(data: &Map<String, Value>, errors: &mut ValidationErrors) -> Option<i32> {
    let value = match data.get("rating") {
        None | Some(Value::Null) => {
            errors.add("rating", "This field is required.");
            return None;
        }
        Some(v) => v,
    };

    let rating = match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };

    match rating {
        Some(r) if (MIN_RATING..=MAX_RATING).contains(&r) => Some(r as i32),
        Some(_) => {
            errors.add(
                "rating",
                format!("Ensure this value is between {} and {}.", MIN_RATING, MAX_RATING),
            );
            None
        }
        None => {
            errors.add("rating", "A valid integer is required.");
            None
        }
    }
}

fn validate_comment(data: &Map<String, Value>, errors: &mut ValidationErrors) -> Option<String> {
    match data.get("comment") {
        None | Some(Value::Null) => Some(String::new()),
        Some(Value::String(s)) => Some(s.clone()),
        Some(_) => {
            errors.add("comment", "Not a valid string.");
            None
        }
    }
}
