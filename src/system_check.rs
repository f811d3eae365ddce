use anyhow::{anyhow, Context, Result};
use reqwest::Url;
use serde::Serialize;
use tracing::warn;

use crate::config::AppConfig;
use crate::db::Store;

pub trait Probe {
    fn name(&self) -> &'static str;
    fn run(&self) -> Result<String>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Check {
    pub name: String,
    pub ok: bool,
    pub detail: String,
}

struct StoreProbe<'a>(&'a Store);

impl Probe for StoreProbe<'_> {
    fn name(&self) -> &'static str {
        "store"
    }

    fn run(&self) -> Result<String> {
        self.0.ping().context("store did not answer")?;
        let artists = self.0.list_artists().context("listing artists")?;
        Ok(format!("{} artists", artists.len()))
    }
}

struct TokenProbe<'a>(&'a AppConfig);

impl Probe for TokenProbe<'_> {
    fn name(&self) -> &'static str {
        "geocoding token"
    }

    fn run(&self) -> Result<String> {
        if self.0.has_geocoding_token() {
            Ok("configured".to_string())
        } else {
            Err(anyhow!("missing; set SEEKART_MAPBOX_TOKEN"))
        }
    }
}

struct EndpointProbe<'a>(&'a AppConfig);

impl Probe for EndpointProbe<'_> {
    fn name(&self) -> &'static str {
        "geocoding endpoint"
    }

    fn run(&self) -> Result<String> {
        let url = Url::parse(&self.0.geocoding_url)
            .with_context(|| format!("bad url {}", self.0.geocoding_url))?;
        match url.scheme() {
            "http" | "https" => Ok(url.to_string()),
            other => Err(anyhow!("unsupported scheme {other}")),
        }
    }
}

pub fn run_probes(probes: &[&dyn Probe]) -> Vec<Check> {
    probes
        .iter()
        .map(|probe| match probe.run() {
            Ok(detail) => Check {
                name: probe.name().to_string(),
                ok: true,
                detail,
            },
            Err(err) => {
                warn!(check = probe.name(), "system check failed: {err:#}");
                Check {
                    name: probe.name().to_string(),
                    ok: false,
                    detail: format!("{err:#}"),
                }
            }
        })
        .collect()
}

pub fn run_all(store: &Store, config: &AppConfig) -> Vec<Check> {
    run_probes(&[
        &StoreProbe(store),
        &TokenProbe(config),
        &EndpointProbe(config),
    ])
}
