use crate::util::{format_int, format_reading};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tabled::Tabled;

/// One row of the meter sheet exactly as the CSV reader sees it.
#[derive(Debug, Deserialize)]
pub struct RawRow {
    #[serde(rename = "Substation_Name")]
    pub substation_name: Option<String>,
    #[serde(rename = "Feeder_Name")]
    pub feeder_name: Option<String>,
    #[serde(rename = "NOCS")]
    pub nocs: Option<String>,
    #[serde(rename = "CF")]
    pub cf: Option<String>,
    #[serde(rename = "Opening_Reading")]
    pub opening_reading: Option<String>,
    #[serde(rename = "Closing_Reading")]
    pub closing_reading: Option<String>,
    #[serde(rename = "Difference")]
    pub difference: Option<String>,
    #[serde(rename = "OMF")]
    pub omf: Option<String>,
    #[serde(rename = "Consumption")]
    pub consumption: Option<String>,
    #[serde(rename = "Corrected_Consumption")]
    pub corrected_consumption: Option<String>,
}

/// A normalized feeder reading.
///
/// `consumption` and `corrected_consumption` are whole energy units; the other
/// numeric fields are display-only and stay optional.
#[derive(Debug, Clone, PartialEq)]
pub struct MeterRecord {
    pub substation_name: String,
    pub feeder_name: String,
    pub nocs: String,
    pub cf: Option<f64>,
    pub opening_reading: Option<f64>,
    pub closing_reading: Option<f64>,
    pub difference: Option<f64>,
    pub omf: Option<f64>,
    pub consumption: i64,
    pub corrected_consumption: i64,
}

impl MeterRecord {
    /// Display cell for `column`, or `None` for columns the sheet does not carry.
    pub fn cell(&self, column: Column) -> Option<Cell> {
        let cell = match column {
            Column::SubstationName => Cell::Text(self.substation_name.clone()),
            Column::FeederName => Cell::Text(self.feeder_name.clone()),
            Column::Nocs => Cell::Text(self.nocs.clone()),
            Column::Cf => Cell::Reading(self.cf),
            Column::OpeningReading => Cell::Reading(self.opening_reading),
            Column::ClosingReading => Cell::Reading(self.closing_reading),
            Column::Difference => Cell::Reading(self.difference),
            Column::Omf => Cell::Reading(self.omf),
            Column::Consumption => Cell::Units(self.consumption),
            Column::CorrectedConsumption => Cell::Units(self.corrected_consumption),
            Column::Circle | Column::Zone => return None,
        };
        Some(cell)
    }
}

/// Logical columns of the meter sheet plus the two hierarchy columns added by
/// enrichment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Column {
    #[serde(rename = "Substation_Name")]
    SubstationName,
    #[serde(rename = "Feeder_Name")]
    FeederName,
    #[serde(rename = "NOCS")]
    Nocs,
    #[serde(rename = "CF")]
    Cf,
    #[serde(rename = "Opening_Reading")]
    OpeningReading,
    #[serde(rename = "Closing_Reading")]
    ClosingReading,
    #[serde(rename = "Difference")]
    Difference,
    #[serde(rename = "OMF")]
    Omf,
    #[serde(rename = "Consumption")]
    Consumption,
    #[serde(rename = "Corrected_Consumption")]
    CorrectedConsumption,
    #[serde(rename = "Circle")]
    Circle,
    #[serde(rename = "Zone")]
    Zone,
}

impl Column {
    /// Columns every dataset must provide, in sheet order.
    pub const SHEET: [Column; 10] = [
        Column::SubstationName,
        Column::FeederName,
        Column::Nocs,
        Column::Cf,
        Column::OpeningReading,
        Column::ClosingReading,
        Column::Difference,
        Column::Omf,
        Column::Consumption,
        Column::CorrectedConsumption,
    ];

    pub fn header(self) -> &'static str {
        match self {
            Column::SubstationName => "Substation_Name",
            Column::FeederName => "Feeder_Name",
            Column::Nocs => "NOCS",
            Column::Cf => "CF",
            Column::OpeningReading => "Opening_Reading",
            Column::ClosingReading => "Closing_Reading",
            Column::Difference => "Difference",
            Column::Omf => "OMF",
            Column::Consumption => "Consumption",
            Column::CorrectedConsumption => "Corrected_Consumption",
            Column::Circle => "Circle",
            Column::Zone => "Zone",
        }
    }

    pub fn parse(name: &str) -> Option<Column> {
        Column::SHEET
            .iter()
            .chain([Column::Circle, Column::Zone].iter())
            .copied()
            .find(|c| c.header() == name)
    }

    pub fn is_text(self) -> bool {
        matches!(
            self,
            Column::SubstationName
                | Column::FeederName
                | Column::Nocs
                | Column::Circle
                | Column::Zone
        )
    }

    /// Only the normalized consumption figures can be summed.
    pub fn holds_units(self) -> bool {
        matches!(self, Column::Consumption | Column::CorrectedConsumption)
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.header())
    }
}

/// A rendered report value.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Reading(Option<f64>),
    Units(i64),
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Text(s) => f.write_str(s),
            Cell::Reading(Some(v)) => f.write_str(&format_reading(*v)),
            Cell::Reading(None) => Ok(()),
            Cell::Units(v) => f.write_str(&format_int(*v)),
        }
    }
}

/// Immutable snapshot of the loaded sheet.
///
/// Cloning is cheap; a reload builds a new snapshot instead of touching the
/// rows of an existing one.
#[derive(Debug, Clone)]
pub struct Dataset {
    records: Arc<[MeterRecord]>,
    loaded_at: DateTime<Local>,
}

impl Dataset {
    pub fn new(records: Vec<MeterRecord>) -> Self {
        Self {
            records: records.into(),
            loaded_at: Local::now(),
        }
    }

    pub fn records(&self) -> &[MeterRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn loaded_at(&self) -> DateTime<Local> {
        self.loaded_at
    }
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct KpiRow {
    #[serde(rename = "TotalConsumption")]
    #[tabled(rename = "Total Consumption")]
    pub total_consumption: String,
    #[serde(rename = "TotalCorrectedConsumption")]
    #[tabled(rename = "Total Corrected Consumption")]
    pub total_corrected_consumption: String,
    #[serde(rename = "Records")]
    #[tabled(rename = "Records")]
    pub records: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn columns_parse_from_sheet_headers() {
        assert_eq!(Column::parse("Corrected_Consumption"), Some(Column::CorrectedConsumption));
        assert_eq!(Column::parse("Zone"), Some(Column::Zone));
        assert_eq!(Column::parse("corrected_consumption"), None);
        for column in Column::SHEET {
            assert_eq!(Column::parse(column.header()), Some(column));
        }
    }

    #[test]
    fn cells_render_for_display() {
        assert_eq!(Cell::Units(1234567).to_string(), "1,234,567");
        assert_eq!(Cell::Reading(Some(2.5)).to_string(), "2.5");
        assert_eq!(Cell::Reading(None).to_string(), "");
        assert_eq!(Cell::Text("Dapa 33/11 kV".into()).to_string(), "Dapa 33/11 kV");
    }
}
