//! Best-effort address resolution in front of a [`Geocoder`].
//!
//! Every provider call goes through one [`RateGate`] per [`Resolver`], so the
//! provider's request ceiling holds however many workers share the resolver.

use std::{
    sync::{Mutex, PoisonError},
    thread,
    time::{Duration, Instant},
};

use anyhow::{anyhow, Error};
use geo::Point;
use tracing::{debug, info, warn};

use crate::{nominatim::Geocoder, utils::round_to, Config};

const DECIMALS: i32 = 6;

#[derive(Debug)]
pub enum Resolution {
    Located(Point),
    NotFound,
    Failed(Error),
    /// Empty address, or geocoding switched off. The provider was not called.
    Skipped,
}

impl Resolution {
    pub fn coordinates(&self) -> Option<Point> {
        match self {
            Self::Located(point) => Some(*point),
            _ => None,
        }
    }
}

/// Serializes calls and keeps at least `interval` between the end of one call
/// and the start of the next.
pub struct RateGate {
    interval: Duration,
    last: Mutex<Option<Instant>>,
}

impl RateGate {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: Mutex::new(None),
        }
    }

    pub fn run<T>(&self, f: impl FnOnce() -> T) -> T {
        // the guarded value is a single Instant, poisoning cannot corrupt it
        let mut last = self.last.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(prev) = *last {
            let elapsed = prev.elapsed();
            if elapsed < self.interval {
                thread::sleep(self.interval - elapsed);
            }
        }
        let output = f();
        *last = Some(Instant::now());
        output
    }
}

pub struct Resolver<G> {
    geocoder: G,
    country: String,
    enabled: bool,
    gate: RateGate,
}

impl<G: Geocoder> Resolver<G> {
    pub fn new(geocoder: G, config: &Config) -> Self {
        Self {
            geocoder,
            country: config.country.trim().to_string(),
            enabled: !config.skip_geocoding,
            gate: RateGate::new(config.rate),
        }
    }

    /// Appends the country unless the address already names it.
    pub fn query(&self, address: &str) -> String {
        let address = address.trim();
        if self.country.is_empty()
            || address
                .to_lowercase()
                .contains(&self.country.to_lowercase())
        {
            address.to_string()
        } else {
            format!("{address}, {}", self.country)
        }
    }

    pub fn resolve(&self, address: &str) -> Resolution {
        let address = address.trim();
        if address.is_empty() || !self.enabled {
            return Resolution::Skipped;
        }

        let query = self.query(address);
        debug!(%query, "geocoding");
        let result = self.gate.run(|| self.geocoder.geocode(&query));
        let result = result.and_then(|found| match found {
            Some(point) if !(point.x().is_finite() && point.y().is_finite()) => {
                Err(anyhow!("non-finite coordinates: {:?}", point.x_y()))
            }
            found => Ok(found),
        });
        match result {
            Ok(Some(point)) => Resolution::Located(Point::new(
                round_to(point.x(), DECIMALS),
                round_to(point.y(), DECIMALS),
            )),
            Ok(None) => {
                info!(%address, "no coordinates found");
                Resolution::NotFound
            }
            Err(err) => {
                warn!(%address, "geocoding failed: {err:#}");
                Resolution::Failed(err)
            }
        }
    }
}
