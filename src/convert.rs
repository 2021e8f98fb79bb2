use std::{
    fmt,
    fs::{self, File},
    io::Read,
    path::Path,
};

use anyhow::{bail, Context, Result};
use indicatif::ProgressBar;
use rayon::{prelude::*, ThreadPoolBuilder};
use tracing::info;

use crate::{
    model::{RawRow, Record},
    nominatim::{Geocoder, Nominatim},
    normalize::{self, ADDRESS, NAME},
    resolver::{Resolution, Resolver},
    utils::{progress_bar, truncate},
    Config,
};

/// Rejects inputs that don't exist or aren't `.csv` files.
pub fn validate_input(path: &Path) -> Result<()> {
    if !path.exists() {
        bail!("input file does not exist: {}", path.display());
    }
    match path.extension().and_then(|x| x.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("csv") => Ok(()),
        Some(ext) => bail!("input must be a CSV file (got .{ext})"),
        None => bail!("input must be a CSV file: {}", path.display()),
    }
}

pub fn read_rows(path: &Path) -> Result<Vec<RawRow>> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    read_rows_from(file).with_context(|| format!("reading {}", path.display()))
}

pub fn read_rows_from(reader: impl Read) -> Result<Vec<RawRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(reader);
    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|x| x.trim_start_matches('\u{feff}').to_string())
        .collect();

    let mut rows: Vec<RawRow> = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(headers.iter().cloned().zip(record.iter()).collect());
    }
    Ok(rows)
}

pub fn write_records(path: &Path, records: &[Record]) -> Result<()> {
    let mut output = serde_json::to_string_pretty(records)?;
    output.push('\n');
    fs::write(path, output).with_context(|| format!("writing {}", path.display()))
}

/// Reads `input`, geocodes against Nominatim and writes the catalog to `output`.
pub fn run(input: &Path, output: &Path, config: &Config) -> Result<Summary> {
    validate_input(input)?;
    let rows = read_rows(input)?;
    info!(rows = rows.len(), input = %input.display(), "loaded rows");

    let resolver = Resolver::new(Nominatim::new(config), config);
    let converter = Converter::new(resolver, config.workers)
        .with_progress(progress_bar(rows.len() as u64));
    let (records, summary) = converter.convert(&rows)?;

    write_records(output, &records)?;
    info!(output = %output.display(), "wrote {} records", records.len());
    Ok(summary)
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Summary {
    pub total: usize,
    /// Records that ended up with coordinates.
    pub resolved: usize,
    pub not_found: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl Summary {
    fn add(&mut self, record: &Record, resolution: &Resolution) {
        self.total += 1;
        if record.lat.is_some() {
            self.resolved += 1;
        }
        match resolution {
            Resolution::Located(_) => {}
            Resolution::NotFound => self.not_found += 1,
            Resolution::Failed(_) => self.failed += 1,
            Resolution::Skipped => self.skipped += 1,
        }
    }

    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.resolved as f64 / self.total as f64 * 100.0
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.resolved, self.total)
    }
}

pub struct Converter<G> {
    resolver: Resolver<G>,
    workers: usize,
    progress: ProgressBar,
}

impl<G: Geocoder> Converter<G> {
    pub fn new(resolver: Resolver<G>, workers: usize) -> Self {
        Self {
            resolver,
            workers,
            progress: ProgressBar::hidden(),
        }
    }

    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = progress;
        self
    }

    /// Converts every row, in order. Row `n` (0-based) gets id `n + 1`.
    pub fn convert(&self, rows: &[RawRow]) -> Result<(Vec<Record>, Summary)> {
        let processed: Vec<(Record, Resolution)> = if self.workers <= 1 {
            rows.iter()
                .enumerate()
                .map(|(i, row)| self.process(i + 1, row))
                .collect()
        } else {
            // collect on an indexed iterator keeps input order
            ThreadPoolBuilder::new()
                .num_threads(self.workers)
                .build()?
                .install(|| {
                    rows.par_iter()
                        .enumerate()
                        .map(|(i, row)| self.process(i + 1, row))
                        .collect()
                })
        };
        self.progress.finish_and_clear();

        let mut summary = Summary::default();
        let mut records = Vec::with_capacity(processed.len());
        for (record, resolution) in processed {
            summary.add(&record, &resolution);
            records.push(record);
        }
        Ok((records, summary))
    }

    fn process(&self, index: usize, row: &RawRow) -> (Record, Resolution) {
        self.progress.suspend(|| {
            info!("[{index}] geocoding: {}...", truncate(row.get(NAME).trim(), 40))
        });
        let resolution = self.resolver.resolve(row.get(ADDRESS));
        let record = normalize::normalize(row, index, resolution.coordinates());
        self.progress.inc(1);
        (record, resolution)
    }
}
