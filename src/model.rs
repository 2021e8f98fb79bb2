use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One input row keyed by header name.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RawRow(BTreeMap<String, String>);

impl RawRow {
    /// Missing columns read as an empty string.
    pub fn get(&self, column: &str) -> &str {
        self.0.get(column).map(String::as_str).unwrap_or_default()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RawRow {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    pub start: String,
    pub end: String,
    pub days: String,
}

/// An aid point as written to the catalog. Field order is the output order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub city: String,
    pub address: String,
    pub place: String,
    pub status: String,
    pub capacity_status: String,
    pub supplies_needed: Vec<String>,
    pub info: String,
    pub schedule: Schedule,
    pub created_at: String,
    pub updated_at: String,
    pub contact: String,
    pub verified: bool,
    pub verificator: String,
}
