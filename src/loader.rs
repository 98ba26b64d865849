use crate::error::LoadError;
use crate::types::{Column, Dataset, MeterRecord, RawRow};
use crate::util::{normalize_units, parse_f64_safe};
use csv::ReaderBuilder;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadReport {
    pub total_rows: usize,
    pub loaded_rows: usize,
    pub parse_errors: usize,
    pub blank_rows: usize,
    /// Consumption cells that were blank or unparseable and became zero.
    pub zeroed_values: usize,
    pub derived_differences: usize,
}

pub fn load_and_clean(path: impl AsRef<Path>) -> Result<(Dataset, LoadReport), LoadError> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let (dataset, report) = load_from_reader(file)?;
    info!(
        path = %path.display(),
        total_rows = report.total_rows,
        loaded_rows = report.loaded_rows,
        parse_errors = report.parse_errors,
        "dataset loaded"
    );
    Ok((dataset, report))
}

pub fn load_from_reader<R: Read>(reader: R) -> Result<(Dataset, LoadReport), LoadError> {
    // Names are kept exactly as stored: selections match them byte for byte.
    let mut rdr = ReaderBuilder::new().flexible(true).from_reader(reader);

    let headers = rdr.headers()?.clone();
    for column in Column::SHEET {
        if !headers.iter().any(|h| h == column.header()) {
            return Err(LoadError::MissingColumn(column.header().to_string()));
        }
    }

    let mut report = LoadReport::default();
    let mut records: Vec<MeterRecord> = Vec::new();

    for result in rdr.deserialize::<RawRow>() {
        report.total_rows += 1;
        let row = match result {
            Ok(r) => r,
            Err(e) => {
                debug!(row = report.total_rows, error = %e, "skipping unparseable row");
                report.parse_errors += 1;
                continue;
            }
        };

        let is_blank = |s: &Option<String>| s.as_deref().map_or(true, |v| v.trim().is_empty());
        if is_blank(&row.substation_name) && is_blank(&row.feeder_name) {
            report.blank_rows += 1;
            continue;
        }

        let consumption = normalize_units(row.consumption.as_deref()).unwrap_or_else(|| {
            report.zeroed_values += 1;
            0
        });
        let corrected_consumption = normalize_units(row.corrected_consumption.as_deref())
            .unwrap_or_else(|| {
                report.zeroed_values += 1;
                0
            });

        let opening_reading = parse_f64_safe(row.opening_reading.as_deref());
        let closing_reading = parse_f64_safe(row.closing_reading.as_deref());
        let difference = match parse_f64_safe(row.difference.as_deref()) {
            Some(d) => Some(d),
            None => match (opening_reading, closing_reading) {
                (Some(open), Some(close)) => {
                    report.derived_differences += 1;
                    Some(close - open)
                }
                _ => None,
            },
        };

        records.push(MeterRecord {
            substation_name: row.substation_name.unwrap_or_default(),
            feeder_name: row.feeder_name.unwrap_or_default(),
            nocs: row.nocs.unwrap_or_default(),
            cf: parse_f64_safe(row.cf.as_deref()),
            opening_reading,
            closing_reading,
            difference,
            omf: parse_f64_safe(row.omf.as_deref()),
            consumption,
            corrected_consumption,
        });
    }

    report.loaded_rows = records.len();
    Ok((Dataset::new(records), report))
}
