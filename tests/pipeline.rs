//! End-to-end conversion against a scripted geocoder.

use std::{
    collections::BTreeMap,
    fs,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    },
    thread,
    time::Duration,
};

use aid_points::{
    convert::{read_rows, write_records},
    normalize::{ADDRESS, INFO, NAME, TYPE},
    Config, Converter, Geocoder, RawRow, Record, Resolver,
};
use anyhow::{bail, Result};
use geo::Point;
use serde_json::Value;

#[derive(Default)]
struct Scripted {
    answers: BTreeMap<String, Option<(f64, f64)>>,
    queries: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl Scripted {
    fn answer(mut self, query: &str, lat_lng: Option<(f64, f64)>) -> Self {
        self.answers.insert(query.to_string(), lat_lng);
        self
    }

    fn calls(&self) -> usize {
        self.queries.lock().unwrap().len()
    }
}

impl Geocoder for Scripted {
    fn geocode(&self, query: &str) -> Result<Option<Point>> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        thread::sleep(Duration::from_millis(2));
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        self.queries.lock().unwrap().push(query.to_string());
        match self.answers.get(query) {
            Some(Some((lat, lng))) => Ok(Some(Point::new(*lng, *lat))),
            Some(None) => Ok(None),
            None => bail!("operation timed out"),
        }
    }
}

fn config() -> Config {
    Config {
        rate: Duration::ZERO,
        ..Config::default()
    }
}

fn row(name: &str, address: &str) -> RawRow {
    [(NAME, name), (TYPE, "Acopio"), (ADDRESS, address), (INFO, "agua")]
        .into_iter()
        .collect()
}

fn without_timestamps(records: &[Record]) -> Vec<Record> {
    records
        .iter()
        .cloned()
        .map(|mut x| {
            x.created_at.clear();
            x.updated_at.clear();
            x
        })
        .collect()
}

#[test]
fn two_row_scenario() {
    let geocoder =
        Scripted::default().answer("Av. Siempre Viva 123, Chile", Some((-33.45, -70.66)));
    let converter = Converter::new(Resolver::new(&geocoder, &config()), 1);

    let rows = vec![row("Sede Norte", "Av. Siempre Viva 123"), row("Sede Sur", "  ")];
    let (records, summary) = converter.convert(&rows).unwrap();

    assert_eq!(geocoder.calls(), 1);
    assert_eq!(summary.to_string(), "1/2");
    assert_eq!(summary.skipped, 1);

    let json: Value = serde_json::to_value(&records).unwrap();
    assert_eq!(json[0]["id"], "1");
    assert_eq!(json[0]["lat"], -33.45);
    assert_eq!(json[0]["lng"], -70.66);
    assert_eq!(json[1]["id"], "2");
    assert!(json[1]["lat"].is_null());
    assert!(json[1]["lng"].is_null());
}

#[test]
fn provider_failures_do_not_abort() {
    let geocoder = Scripted::default()
        .answer("Calle Falsa 1, Chile", None)
        .answer("Plaza 2, Chile", Some((-36.82, -73.05)));
    let converter = Converter::new(Resolver::new(&geocoder, &config()), 1);

    let rows = vec![
        row("A", "Calle Falsa 1"),
        row("B", "Camino sin respuesta"),
        row("C", "Plaza 2"),
    ];
    let (records, summary) = converter.convert(&rows).unwrap();

    assert_eq!(records.len(), 3);
    assert_eq!(summary.not_found, 1);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.resolved, 1);
    for record in &records {
        assert_eq!(record.lat.is_some(), record.lng.is_some());
    }
    assert_eq!(records[1].lat, None);
    assert_eq!(records[2].lat, Some(-36.82));
}

#[test]
fn reruns_match_except_timestamps() {
    let geocoder = Scripted::default().answer("Plaza 2, Chile", Some((-36.82, -73.05)));
    let converter = Converter::new(Resolver::new(&geocoder, &config()), 1);
    let rows = vec![row("A", "Plaza 2"), row("B", "")];

    let (first, _) = converter.convert(&rows).unwrap();
    let (second, _) = converter.convert(&rows).unwrap();
    assert_eq!(without_timestamps(&first), without_timestamps(&second));
}

#[test]
fn workers_keep_order_and_one_request_in_flight() {
    let mut geocoder = Scripted::default();
    let mut rows = Vec::new();
    for i in 0..24 {
        let address = format!("Pasaje {i}");
        geocoder = geocoder.answer(&format!("{address}, Chile"), Some((-33.0 - i as f64, -71.0)));
        rows.push(row(&format!("Punto {i}"), &address));
    }
    let converter = Converter::new(
        Resolver::new(
            &geocoder,
            &Config {
                rate: Duration::from_millis(1),
                workers: 4,
                ..config()
            },
        ),
        4,
    );

    let (records, summary) = converter.convert(&rows).unwrap();

    assert_eq!(summary.resolved, 24);
    assert_eq!(geocoder.peak.load(Ordering::SeqCst), 1);
    for (i, record) in records.iter().enumerate() {
        assert_eq!(record.id, (i + 1).to_string());
        assert_eq!(record.name, format!("Punto {i}"));
        assert_eq!(record.lat, Some(-33.0 - i as f64));
    }
}

#[test]
fn csv_to_json_file() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("data1.csv");
    let output = dir.path().join("data1.json");
    fs::write(
        &input,
        "Espacio,TIPO,COMUNA,DIRECCIÓN,MÁS INFO,CONTACTO\n\
         Sede Ñuñoa ,Albergue ,Ñuñoa,Irarrázaval 3000,\"agua, abrigo,, frazadas \",\n\
         Bodega,Acopio,Talca,,,\n",
    )
    .unwrap();

    let geocoder = Scripted::default().answer("Irarrázaval 3000, Chile", Some((-33.4541, -70.5973)));
    let converter = Converter::new(Resolver::new(&geocoder, &config()), 1);
    let (records, _) = converter.convert(&read_rows(&input).unwrap()).unwrap();
    write_records(&output, &records).unwrap();

    let text = fs::read_to_string(&output).unwrap();
    assert!(text.contains("\"name\": \"Sede Ñuñoa\""));
    assert!(text.starts_with("[\n  {\n    \"id\": \"1\""));
    assert!(text.ends_with("]\n"));

    let json: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(json[0]["type"], "albergue");
    assert_eq!(json[0]["supplies_needed"], serde_json::json!(["agua", "abrigo", "frazadas"]));
    assert_eq!(json[1]["supplies_needed"], serde_json::json!([]));
    assert!(json[1]["lat"].is_null());
}

#[test]
fn unreadable_input_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    assert!(read_rows(&dir.path().join("missing.csv")).is_err());
    assert!(write_records(&dir.path().join("no/such/dir/out.json"), &[]).is_err());
}
