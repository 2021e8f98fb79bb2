//! Converts a spreadsheet export of aid points into a geolocated JSON catalog.
//!
//! The pipeline is `convert::read_rows` -> [`Converter::convert`] ->
//! `convert::write_records`. Each row's address is resolved through a
//! [`Resolver`], which owns the single rate gate in front of the geocoder.

pub mod config;
pub mod convert;
pub mod model;
pub mod nominatim;
pub mod normalize;
pub mod resolver;
pub mod utils;

pub use config::Config;
pub use convert::{Converter, Summary};
pub use model::{RawRow, Record, Schedule};
pub use nominatim::{Geocoder, Nominatim};
pub use resolver::{RateGate, Resolution, Resolver};
