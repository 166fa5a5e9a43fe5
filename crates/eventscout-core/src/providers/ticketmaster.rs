// Ticketmaster provider - bridges the API client with the SearchProvider trait
use async_trait::async_trait;
use eventscout_api::{RetryConfig, TicketmasterClient, TicketmasterEvent};

use crate::{
    config::TicketmasterConfig,
    models::{Item, ItemBuilder},
    search::SearchProvider,
    Error, Result,
};

/// Wrapper around TicketmasterClient that implements SearchProvider
pub struct TicketmasterProvider {
    client: TicketmasterClient,
    radius: u32,
}

impl TicketmasterProvider {
    /// Build from config. No API key means no provider.
    pub fn from_config(config: &TicketmasterConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| Error::ConfigError("Ticketmaster API key is not set".into()))?;

        let client = TicketmasterClient::with_base_url(api_key, config.base_url.clone())
            .map_err(|e| Error::ApiError(e.to_string()))?
            .with_retry_config(RetryConfig {
                max_retries: config.max_retries,
                ..RetryConfig::default()
            });

        Ok(Self {
            client,
            radius: config.radius,
        })
    }
}

#[async_trait]
impl SearchProvider for TicketmasterProvider {
    async fn search(&self, lat: f64, lon: f64, term: &str) -> Result<Vec<Item>> {
        let events = self
            .client
            .search_events(lat, lon, term, self.radius)
            .await
            .map_err(|e| Error::ApiError(e.to_string()))?;

        Ok(events.into_iter().map(event_to_item).collect())
    }
}

/// Convert a Ticketmaster event to our internal Item model
fn event_to_item(event: TicketmasterEvent) -> Item {
    ItemBuilder::new(event.id)
        .name(event.name)
        .rating(event.rating)
        .address(event.address)
        .categories(event.categories)
        .image_url(event.image_url)
        .url(event.url)
        .distance(event.distance)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_to_item() {
        let event = TicketmasterEvent {
            id: "vvG1".into(),
            name: "Jazz Night".into(),
            url: "https://tm.example.com/jazz".into(),
            image_url: "https://img.example.com/jazz.jpg".into(),
            address: "131 W 3rd St, New York".into(),
            rating: 0.0,
            distance: 2.5,
            categories: vec!["Music".into(), "Arts & Theatre".into()],
        };

        let item = event_to_item(event);
        assert_eq!(item.item_id, "vvG1");
        assert_eq!(item.address, "131 W 3rd St, New York");
        assert_eq!(item.distance, 2.5);
        assert!(item.categories.contains("Music"));
        assert!(item.categories.contains("Arts & Theatre"));
    }

    #[test]
    fn test_from_config_requires_api_key() {
        let config = TicketmasterConfig::default();
        assert!(matches!(
            TicketmasterProvider::from_config(&config),
            Err(Error::ConfigError(_))
        ));

        let config = TicketmasterConfig {
            api_key: Some("   ".into()),
            ..TicketmasterConfig::default()
        };
        assert!(TicketmasterProvider::from_config(&config).is_err());

        let config = TicketmasterConfig {
            api_key: Some("abc123".into()),
            ..TicketmasterConfig::default()
        };
        assert!(TicketmasterProvider::from_config(&config).is_ok());
    }
}
