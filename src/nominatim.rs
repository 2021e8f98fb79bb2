use anyhow::{ensure, Context, Result};
use geo::Point;
use serde::Deserialize;
use ureq::{Agent, AgentBuilder};

use crate::Config;

pub const ENDPOINT: &str = "https://nominatim.openstreetmap.org";
pub const USER_AGENT: &str = "donde-ayudo-cl";

/// Free-text address lookup.
///
/// `Ok(None)` means the provider had no match. Any `Err` is treated as a
/// transient provider failure by the caller.
pub trait Geocoder: Sync {
    fn geocode(&self, query: &str) -> Result<Option<Point>>;
}

impl<G: Geocoder + ?Sized> Geocoder for &G {
    fn geocode(&self, query: &str) -> Result<Option<Point>> {
        (**self).geocode(query)
    }
}

pub struct Nominatim {
    agent: Agent,
    endpoint: String,
}

impl Nominatim {
    pub fn new(config: &Config) -> Self {
        let agent = AgentBuilder::new()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .build();
        Self {
            agent,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
        }
    }
}

impl Geocoder for Nominatim {
    fn geocode(&self, query: &str) -> Result<Option<Point>> {
        let places: Vec<Place> = self
            .agent
            .get(&format!("{}/search", self.endpoint))
            .query("q", query)
            .query("format", "json")
            .query("limit", "1")
            .call()?
            .into_json()?;

        match places.first() {
            Some(place) => Ok(Some(place.point()?)),
            None => Ok(None),
        }
    }
}

// nominatim sends coordinates as strings
#[derive(Debug, Deserialize)]
struct Place {
    lat: String,
    lon: String,
}

impl Place {
    fn point(&self) -> Result<Point> {
        let lat: f64 = self
            .lat
            .parse()
            .with_context(|| format!("invalid latitude: {}", self.lat))?;
        let lon: f64 = self
            .lon
            .parse()
            .with_context(|| format!("invalid longitude: {}", self.lon))?;
        // also rejects NaN and infinities, which parse fine as f64
        ensure!((-90.0..=90.0).contains(&lat), "latitude out of range: {}", self.lat);
        ensure!((-180.0..=180.0).contains(&lon), "longitude out of range: {}", self.lon);
        Ok(Point::new(lon, lat))
    }
}
