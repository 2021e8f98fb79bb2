//! Maps a raw spreadsheet row onto a [`Record`].

use chrono::{DateTime, Utc};
use geo::Point;

use crate::model::{RawRow, Record, Schedule};

pub const NAME: &str = "Espacio";
pub const TYPE: &str = "TIPO";
pub const CITY: &str = "COMUNA";
pub const ADDRESS: &str = "DIRECCIÓN";
pub const INFO: &str = "MÁS INFO";
pub const START: &str = "Horario de Inicio";
pub const END: &str = "Horario de fin";
pub const DAYS: &str = "Dias (ordenar columnas) (Semana del 19)";
pub const CONTACT: &str = "CONTACTO";

const STATUS: &str = "active";

/// Builds the record for the `index`th row (1-based), stamped with the current time.
pub fn normalize(row: &RawRow, index: usize, coordinates: Option<Point>) -> Record {
    normalize_at(row, index, coordinates, Utc::now())
}

pub fn normalize_at(
    row: &RawRow,
    index: usize,
    coordinates: Option<Point>,
    now: DateTime<Utc>,
) -> Record {
    let field = |column: &str| row.get(column).trim().to_string();
    let name = field(NAME);
    let info = field(INFO);
    let stamp = timestamp(now);

    Record {
        id: index.to_string(),
        name: name.clone(),
        kind: field(TYPE).to_lowercase(),
        lat: coordinates.map(|p| p.y()),
        lng: coordinates.map(|p| p.x()),
        city: field(CITY),
        address: field(ADDRESS),
        place: name,
        status: STATUS.to_string(),
        capacity_status: String::new(),
        supplies_needed: supplies(&info),
        info,
        schedule: Schedule {
            start: field(START),
            end: field(END),
            days: field(DAYS),
        },
        created_at: stamp.clone(),
        updated_at: stamp,
        contact: field(CONTACT),
        verified: false,
        verificator: String::new(),
    }
}

/// Comma separated supplies, trimmed, with empty entries dropped.
pub fn supplies(info: &str) -> Vec<String> {
    info.split(',')
        .map(str::trim)
        .filter(|x| !x.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn timestamp(now: DateTime<Utc>) -> String {
    now.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}
