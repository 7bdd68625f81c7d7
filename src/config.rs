use anyhow::{anyhow, Context};
use axum::http::HeaderValue;
use clap::{Parser, ValueEnum};

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProviderKind {
    Opentripmap,
    Geoapify,
}

#[derive(Parser, Clone, Debug)]
pub struct Config {
    #[clap(env, long, default_value = "development")]
    pub environment: String,

    #[clap(env, long, default_value_t = 3000)]
    pub port: u16,

    /// Comma separated list of origins allowed by CORS
    #[clap(env, long, default_value = "http://localhost:3000")]
    pub origin_urls: String,

    #[clap(env, long)]
    pub database_url: String,

    #[clap(env, long, default_value_t = default_pool_size())]
    pub database_pool_size: u32,

    #[clap(env, long, value_enum, default_value_t = ProviderKind::Geoapify)]
    pub places_provider: ProviderKind,

    #[clap(env, long, hide_env_values = true)]
    pub opentripmap_api_key: Option<String>,

    #[clap(env, long, hide_env_values = true)]
    pub geoapify_api_key: Option<String>,

    #[clap(env, long)]
    pub card_api_url: String,

    #[clap(env, long, default_value_t = 5)]
    pub upstream_timeout_secs: u64,

    #[clap(env, long, default_value_t = 3)]
    pub card_timeout_secs: u64,

    /// Metres around the geocoded city centre
    #[clap(env, long, default_value_t = 1000)]
    pub search_radius_m: u32,
}

fn default_pool_size() -> u32 {
    (num_cpus::get() * 2) as u32
}

impl Config {
    /// API key for whichever places provider is selected.
    pub fn provider_api_key(&self) -> anyhow::Result<String> {
        let (key, name) = match self.places_provider {
            ProviderKind::Opentripmap => (&self.opentripmap_api_key, "OPENTRIPMAP_API_KEY"),
            ProviderKind::Geoapify => (&self.geoapify_api_key, "GEOAPIFY_API_KEY"),
        };

        key.clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| anyhow!("{} must be set for the selected places provider", name))
    }

    pub fn allowed_origins(&self) -> anyhow::Result<Vec<HeaderValue>> {
        self.origin_urls
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| {
                s.parse::<HeaderValue>()
                    .with_context(|| format!("Invalid CORS origin: {}", s))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(extra: &[&str]) -> Config {
        let mut args = vec![
            "restaurant-finder",
            "--database-url",
            "postgres://localhost/restaurants",
            "--card-api-url",
            "http://cards.local/cards/random",
        ];
        args.extend_from_slice(extra);
        Config::try_parse_from(args).unwrap()
    }

    #[test]
    fn defaults_apply() {
        let config = parse(&[]);
        assert_eq!(config.port, 3000);
        assert_eq!(config.places_provider, ProviderKind::Geoapify);
        assert_eq!(config.upstream_timeout_secs, 5);
        assert_eq!(config.card_timeout_secs, 3);
        assert_eq!(config.search_radius_m, 1000);
        assert!(config.database_pool_size >= 2);
    }

    #[test]
    fn missing_key_for_selected_provider_is_an_error() {
        let config = parse(&["--places-provider", "opentripmap", "--geoapify-api-key", "abc"]);
        assert!(config.provider_api_key().is_err());

        let config = parse(&["--places-provider", "opentripmap", "--opentripmap-api-key", "xyz"]);
        assert_eq!(config.provider_api_key().unwrap(), "xyz");
    }

    #[test]
    fn blank_key_is_rejected() {
        let config = parse(&["--geoapify-api-key", "  "]);
        assert!(config.provider_api_key().is_err());
    }

    #[test]
    fn origins_are_split_and_trimmed() {
        let config = parse(&["--origin-urls", "http://a.test, http://b.test,"]);
        let origins = config.allowed_origins().unwrap();
        assert_eq!(origins.len(), 2);
        assert_eq!(origins[1], "http://b.test");
    }
}
