//! Address ⇄ coordinate resolution against a Mapbox-style geocoding API.
//!
//! Forward lookups never surface errors to the caller: a failed request is
//! logged and reported as "no result", which the forms already handle.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::AppConfig;
use crate::debounce::{Debounced, Debouncer};
use crate::models::{Address, Coordinates, GeocodeResult};

const REQUEST_TIMEOUT_SECS: u64 = 10;
const PLACES_PATH: [&str; 3] = ["geocoding", "v5", "mapbox.places"];

#[derive(Debug, Error)]
pub enum GeocodingError {
    #[error("no geocoding token configured")]
    MissingToken,
    #[error("bad geocoding url: {0}")]
    Url(String),
    #[error("http error: {0}")]
    Http(String),
    #[error("status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("parse error: {0}")]
    Parse(String),
}

#[derive(Debug, Deserialize)]
struct FeatureCollection {
    #[serde(default)]
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    center: [f64; 2],
    #[serde(default)]
    relevance: f64,
    #[serde(default)]
    text: String,
    address: Option<String>,
    #[serde(default)]
    context: Vec<ContextEntry>,
}

#[derive(Debug, Deserialize)]
struct ContextEntry {
    id: String,
    text: String,
}

/// Fields recovered from a reverse lookup. Missing levels stay `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReverseAddress {
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub locality: Option<String>,
}

/// Human-readable query: non-empty parts in order, joined with ", ".
pub fn search_text(address: &Address) -> String {
    let cross_1 = address.cross_street_1.trim();
    let cross_2 = address.cross_street_2.trim();
    let cross = match (cross_1.is_empty(), cross_2.is_empty()) {
        (false, false) => format!("between {cross_1} and {cross_2}"),
        (false, true) => cross_1.to_string(),
        (true, false) => cross_2.to_string(),
        (true, true) => String::new(),
    };

    [
        address.address.trim(),
        cross.as_str(),
        address.locality.trim(),
        address.city.trim(),
        address.state.trim(),
        address.country.trim(),
    ]
    .iter()
    .filter(|part| !part.is_empty())
    .copied()
    .collect::<Vec<_>>()
    .join(", ")
}

pub struct GeocodingClient {
    client: Client,
    base_url: Url,
    token: String,
}

impl GeocodingClient {
    pub fn new(base_url: &str, token: impl Into<String>) -> Result<Self, GeocodingError> {
        let base_url = Url::parse(base_url).map_err(|err| GeocodingError::Url(err.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(GeocodingError::Url(format!("{base_url} cannot be a base")));
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent(concat!("seekart/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|err| GeocodingError::Http(err.to_string()))?;
        Ok(Self {
            client,
            base_url,
            token: token.into(),
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, GeocodingError> {
        Self::new(
            &config.geocoding_url,
            config.mapbox_token.clone().unwrap_or_default(),
        )
    }

    /// Forward lookup; failures are logged and collapse into `None`.
    pub async fn resolve(&self, address: &Address) -> Option<GeocodeResult> {
        let query = search_text(address);
        match self.lookup(&query).await {
            Ok(result) => result,
            Err(err) => {
                warn!(%query, "geocoding failed: {err}");
                None
            }
        }
    }

    pub async fn lookup(&self, query: &str) -> Result<Option<GeocodeResult>, GeocodingError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(None);
        }

        let url = self.places_url(query, &[("types", "address"), ("autocomplete", "false")])?;
        let payload = self.fetch(url).await?;

        let result = payload.features.into_iter().next().map(|feature| GeocodeResult {
            longitude: feature.center[0],
            latitude: feature.center[1],
            precision: feature.relevance.clamp(0.0, 1.0),
        });
        debug!(%query, found = result.is_some(), "geocoding lookup");
        Ok(result)
    }

    /// Reverse lookup; failures are logged and collapse into `None`.
    pub async fn reverse(&self, at: Coordinates) -> Option<ReverseAddress> {
        match self.reverse_lookup(at).await {
            Ok(result) => result,
            Err(err) => {
                warn!(lat = at.latitude, lng = at.longitude, "reverse geocoding failed: {err}");
                None
            }
        }
    }

    pub async fn reverse_lookup(
        &self,
        at: Coordinates,
    ) -> Result<Option<ReverseAddress>, GeocodingError> {
        let query = format!("{},{}", at.longitude, at.latitude);
        let url = self.places_url(&query, &[("types", "address")])?;
        let payload = self.fetch(url).await?;
        Ok(payload.features.into_iter().next().map(reverse_fields))
    }

    fn places_url(&self, query: &str, extra: &[(&str, &str)]) -> Result<Url, GeocodingError> {
        if self.token.trim().is_empty() {
            return Err(GeocodingError::MissingToken);
        }
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| GeocodingError::Url(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(PLACES_PATH)
            .push(&format!("{query}.json"));
        {
            let mut pairs = url.query_pairs_mut();
            pairs
                .append_pair("access_token", &self.token)
                .append_pair("limit", "1");
            for (key, value) in extra {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    async fn fetch(&self, url: Url) -> Result<FeatureCollection, GeocodingError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|err| GeocodingError::Http(err.to_string()))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|err| GeocodingError::Http(err.to_string()))?;

        if !status.is_success() {
            return Err(GeocodingError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        serde_json::from_str(&text).map_err(|err| GeocodingError::Parse(err.to_string()))
    }
}

/// Forward lookups behind the 1-second quiet period. Shared by every form
/// that edits an address.
#[derive(Clone)]
pub struct AddressResolver {
    client: Arc<GeocodingClient>,
    debouncer: Debouncer,
}

impl AddressResolver {
    pub fn new(client: GeocodingClient, debouncer: Debouncer) -> Self {
        Self {
            client: Arc::new(client),
            debouncer,
        }
    }

    /// Uses the fixed geocoding quiet period.
    pub fn from_config(config: &AppConfig) -> Result<Self, GeocodingError> {
        Ok(Self::new(GeocodingClient::from_config(config)?, Debouncer::default()))
    }

    /// Same debounce generation, new client. Edits pending on the old
    /// client are superseded by the next edit as usual.
    pub fn with_client(&self, client: GeocodingClient) -> Self {
        Self::new(client, self.debouncer.clone())
    }

    pub fn client(&self) -> &GeocodingClient {
        &self.client
    }

    pub fn debouncer(&self) -> &Debouncer {
        &self.debouncer
    }

    /// `Superseded` when a newer edit arrived before this one settled.
    /// A blank address still takes a turn so it cancels older pending edits.
    pub async fn resolve(&self, address: Address) -> Debounced<Option<GeocodeResult>> {
        let client = self.client.clone();
        self.debouncer
            .run(move || async move { client.resolve(&address).await })
            .await
    }
}

fn reverse_fields(feature: Feature) -> ReverseAddress {
    let street = feature.text.trim();
    let address = match feature.address.as_deref().map(str::trim) {
        Some(number) if !number.is_empty() && !street.is_empty() => {
            Some(format!("{street} {number}"))
        }
        _ if !street.is_empty() => Some(street.to_string()),
        _ => None,
    };

    let mut out = ReverseAddress {
        address,
        ..ReverseAddress::default()
    };
    for entry in feature.context {
        let slot = if entry.id.starts_with("place.") {
            &mut out.city
        } else if entry.id.starts_with("region.") {
            &mut out.state
        } else if entry.id.starts_with("country.") {
            &mut out.country
        } else if entry.id.starts_with("neighborhood.") {
            &mut out.locality
        } else {
            continue;
        };
        if slot.is_none() {
            *slot = Some(entry.text);
        }
    }
    out
}
