use std::time::Duration;

use crate::nominatim::{ENDPOINT, USER_AGENT};

/// Runtime settings shared by the resolver and the converter.
#[derive(Clone, Debug)]
pub struct Config {
    /// Appended to every query that doesn't already mention it. Empty disables it.
    pub country: String,
    /// Minimum gap between two geocoding requests.
    pub rate: Duration,
    pub timeout: Duration,
    pub workers: usize,
    pub skip_geocoding: bool,
    pub endpoint: String,
    pub user_agent: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            country: "Chile".to_string(),
            rate: Duration::from_millis(1100),
            timeout: Duration::from_secs(10),
            workers: 1,
            skip_geocoding: false,
            endpoint: ENDPOINT.to_string(),
            user_agent: USER_AGENT.to_string(),
        }
    }
}
