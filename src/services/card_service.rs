use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use crate::errors::{SearchError, Stage};
use crate::providers::get_json;

/// Source of the random card handed out by the draw-card endpoint.
#[async_trait]
pub trait CardService: Send + Sync {
    async fn draw_card(&self) -> Result<Value, SearchError>;
}

pub struct HttpCardService {
    client: Client,
    card_api_url: String,
}

impl HttpCardService {
    pub fn new(client: Client, card_api_url: String) -> Self {
        Self {
            client,
            card_api_url,
        }
    }
}

#[async_trait]
impl CardService for HttpCardService {
    async fn draw_card(&self) -> Result<Value, SearchError> {
        get_json(&self.client, &self.card_api_url, &[], Stage::Card).await
    }
}
