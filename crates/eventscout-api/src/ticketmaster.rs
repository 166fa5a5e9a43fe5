use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::geohash;
use crate::retry::{is_retryable_status, with_retry, RetryConfig};

const TICKETMASTER_API_BASE: &str = "https://app.ticketmaster.com/discovery/v2";

/// Ticketmaster rejects empty keywords, so a blank search becomes this
pub const DEFAULT_KEYWORD: &str = "event";

/// Search radius in miles when the caller doesn't pick one
pub const DEFAULT_RADIUS: u32 = 50;

#[derive(Error, Debug)]
pub enum TicketmasterError {
    #[error("API request failed with status {status}: {body}")]
    RequestFailed { status: u16, body: String },

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Invalid or missing API key")]
    AuthRequired,

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("JSON parsing failed: {0}")]
    ParseError(#[from] serde_json::Error),
}

impl TicketmasterError {
    /// Whether another attempt has any chance of going differently
    pub fn is_retryable(&self) -> bool {
        match self {
            TicketmasterError::RateLimitExceeded => true,
            TicketmasterError::RequestFailed { status, .. } => {
                reqwest::StatusCode::from_u16(*status)
                    .map(is_retryable_status)
                    .unwrap_or(false)
            }
            TicketmasterError::NetworkError(e) => e.is_timeout() || e.is_connect(),
            TicketmasterError::AuthRequired | TicketmasterError::ParseError(_) => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, TicketmasterError>;

/// A flattened Ticketmaster event - just the bits we cache
#[derive(Debug, Clone, PartialEq)]
pub struct TicketmasterEvent {
    pub id: String,
    pub name: String,
    pub url: String,
    pub image_url: String,
    pub address: String,
    pub rating: f64,
    pub distance: f64,
    pub categories: Vec<String>,
}

pub struct TicketmasterClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    retry_config: RetryConfig,
}

impl TicketmasterClient {
    pub fn new(api_key: String) -> Result<Self> {
        Self::with_base_url(api_key, TICKETMASTER_API_BASE.to_string())
    }

    /// Point the client somewhere else (staging, a local mock server)
    pub fn with_base_url(api_key: String, base_url: String) -> Result<Self> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::USER_AGENT,
            reqwest::header::HeaderValue::from_static("EventScout/0.1.0"),
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            retry_config: RetryConfig::default(),
        })
    }

    pub fn with_retry_config(mut self, retry_config: RetryConfig) -> Self {
        self.retry_config = retry_config;
        self
    }

    /// Search events around a point
    ///
    /// A blank keyword falls back to [`DEFAULT_KEYWORD`]. A response without
    /// any events is an empty list, not an error.
    pub async fn search_events(
        &self,
        lat: f64,
        lon: f64,
        keyword: &str,
        radius: u32,
    ) -> Result<Vec<TicketmasterEvent>> {
        let url = format!("{}/events.json", self.base_url);
        let keyword = match keyword.trim() {
            "" => DEFAULT_KEYWORD,
            k => k,
        };
        let geo_point = geohash::encode(lat, lon, geohash::DEFAULT_PRECISION);
        let radius = radius.to_string();

        debug!("Ticketmaster search: keyword={} geoPoint={}", keyword, geo_point);

        with_retry(&self.retry_config, TicketmasterError::is_retryable, || async {
            let response = self
                .client
                .get(&url)
                .query(&[
                    ("apikey", self.api_key.as_str()),
                    ("geoPoint", geo_point.as_str()),
                    ("keyword", keyword),
                    ("radius", radius.as_str()),
                ])
                .send()
                .await?;

            let status = response.status();
            if status == reqwest::StatusCode::UNAUTHORIZED {
                return Err(TicketmasterError::AuthRequired);
            }
            if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                return Err(TicketmasterError::RateLimitExceeded);
            }
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(TicketmasterError::RequestFailed {
                    status: status.as_u16(),
                    body,
                });
            }

            let body = response.text().await?;
            parse_events(&body)
        })
        .await
    }
}

/// Turn a Discovery API `events.json` body into flat events
pub fn parse_events(body: &str) -> Result<Vec<TicketmasterEvent>> {
    let page: SearchPage = serde_json::from_str(body)?;
    let events = page
        .embedded
        .map(|e| e.events)
        .unwrap_or_default()
        .into_iter()
        .map(TicketmasterEvent::from)
        .collect();
    Ok(events)
}

impl From<RawEvent> for TicketmasterEvent {
    fn from(raw: RawEvent) -> Self {
        let image_url = raw
            .images
            .into_iter()
            .find_map(|img| img.url)
            .unwrap_or_default();

        let address = raw
            .embedded
            .and_then(|e| e.venues.into_iter().next())
            .map(|venue| venue.address_line())
            .unwrap_or_default();

        let mut categories: Vec<String> = Vec::new();
        for c in raw.classifications {
            if let Some(name) = c.segment.and_then(|s| s.name) {
                if !name.is_empty() && !categories.contains(&name) {
                    categories.push(name);
                }
            }
        }

        TicketmasterEvent {
            id: raw.id,
            name: raw.name,
            url: raw.url,
            image_url,
            address,
            rating: raw.rating,
            distance: raw.distance,
            categories,
        }
    }
}

// Raw response shapes. Ticketmaster leaves out whatever it feels like, so
// nearly everything defaults.

#[derive(Debug, Deserialize)]
struct SearchPage {
    #[serde(rename = "_embedded")]
    embedded: Option<EmbeddedEvents>,
}

#[derive(Debug, Deserialize)]
struct EmbeddedEvents {
    #[serde(default)]
    events: Vec<RawEvent>,
}

#[derive(Debug, Deserialize)]
struct RawEvent {
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    rating: f64,
    #[serde(default)]
    distance: f64,
    #[serde(default)]
    images: Vec<RawImage>,
    #[serde(default)]
    classifications: Vec<RawClassification>,
    #[serde(rename = "_embedded")]
    embedded: Option<EmbeddedVenues>,
}

#[derive(Debug, Deserialize)]
struct RawImage {
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawClassification {
    segment: Option<NamedThing>,
}

#[derive(Debug, Deserialize)]
struct NamedThing {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EmbeddedVenues {
    #[serde(default)]
    venues: Vec<RawVenue>,
}

#[derive(Debug, Deserialize)]
struct RawVenue {
    address: Option<RawAddress>,
    city: Option<NamedThing>,
}

#[derive(Debug, Deserialize)]
struct RawAddress {
    line1: Option<String>,
    line2: Option<String>,
    line3: Option<String>,
}

impl RawVenue {
    /// "line1, line2, line3, city" with the blanks dropped
    fn address_line(self) -> String {
        let mut parts = Vec::new();
        if let Some(addr) = self.address {
            parts.extend([addr.line1, addr.line2, addr.line3].into_iter().flatten());
        }
        if let Some(city) = self.city.and_then(|c| c.name) {
            parts.push(city);
        }
        parts
            .into_iter()
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .collect::<Vec<_>>()
            .join(", ")
    }
}
