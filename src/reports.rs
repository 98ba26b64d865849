use crate::aggregate::{aggregate, aggregate_values, filter, total, AggregateRow, Row};
use crate::error::{ReportError, Result};
use crate::hierarchy::Hierarchy;
use crate::types::{Cell, Column, KpiRow, MeterRecord};
use crate::util::{format_int, format_number, format_units, percent_change};
use chrono::{DateTime, Local};
use serde::Serialize;
use std::fmt;
use tracing::{debug, info, warn};

/// Column layout of the substation drill-down.
pub const SUBSTATION_COLUMNS: [Column; 10] = [
    Column::SubstationName,
    Column::FeederName,
    Column::Cf,
    Column::OpeningReading,
    Column::ClosingReading,
    Column::Difference,
    Column::Omf,
    Column::Consumption,
    Column::CorrectedConsumption,
    Column::Nocs,
];

/// Column layout of the NOCS drill-down.
pub const NOCS_COLUMNS: [Column; 5] = [
    Column::Nocs,
    Column::SubstationName,
    Column::FeederName,
    Column::Consumption,
    Column::CorrectedConsumption,
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Scope {
    All,
    BySubstation(String),
    ByNocs(String),
}

impl Scope {
    fn filter_key(&self) -> Option<(Column, &str)> {
        match self {
            Scope::All => None,
            Scope::BySubstation(name) => Some((Column::SubstationName, name.as_str())),
            Scope::ByNocs(code) => Some((Column::Nocs, code.as_str())),
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::All => write!(f, "all records"),
            Scope::BySubstation(name) => write!(f, "substation {name:?}"),
            Scope::ByNocs(code) => write!(f, "NOCS {code:?}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum Loss {
    Percent(f64),
    /// Raw consumption summed to zero.
    Undefined,
}

/// `(corrected - consumption) / consumption * 100`.
pub fn substation_loss(total_consumption: i64, total_corrected_consumption: i64) -> Loss {
    match percent_change(total_consumption, total_corrected_consumption) {
        Some(p) => Loss::Percent(p),
        None => Loss::Undefined,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub record_count: usize,
    pub total_consumption: Option<i64>,
    pub total_corrected_consumption: Option<i64>,
    pub loss: Option<Loss>,
}

/// An immutable, self-contained report. Nothing in it points back into the
/// dataset it was built from.
#[derive(Debug, Clone)]
pub struct Report {
    pub title: String,
    pub scope: Scope,
    pub columns: Vec<Column>,
    pub rows: Vec<Vec<Cell>>,
    pub summary: Summary,
    pub generated_at: DateTime<Local>,
}

impl Report {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn headers(&self) -> Vec<&'static str> {
        self.columns.iter().map(|c| c.header()).collect()
    }

    /// Total of a unit column, provided the report shows that column.
    pub fn total(&self, column: Column) -> Result<i64> {
        if !self.columns.contains(&column) {
            return Err(ReportError::MissingColumn(column));
        }
        let value = match column {
            Column::Consumption => self.summary.total_consumption,
            Column::CorrectedConsumption => self.summary.total_corrected_consumption,
            other => return Err(ReportError::NotAggregatable(other)),
        };
        value.ok_or(ReportError::MissingColumn(column))
    }

    /// `Ok(None)` when the scope has no loss figure.
    pub fn loss_percent(&self) -> Result<Option<f64>> {
        match self.summary.loss {
            None => Ok(None),
            Some(Loss::Percent(p)) => Ok(Some(p)),
            Some(Loss::Undefined) => Err(ReportError::LossUndefined {
                scope: self.scope.to_string(),
            }),
        }
    }

    /// Summary block shown under the table. Totals for columns the report
    /// does not show are left out.
    pub fn summary_lines(&self) -> Vec<String> {
        let mut lines = vec![format!("Records: {}", format_int(self.summary.record_count))];
        for (column, label) in [
            (Column::Consumption, "Total Consumption"),
            (Column::CorrectedConsumption, "Total Corrected Consumption"),
        ] {
            match self.total(column) {
                Ok(v) => lines.push(format!("{label}: {}", format_units(v))),
                Err(e) => debug!(error = %e, "omitting summary line"),
            }
        }
        match self.loss_percent() {
            Ok(Some(p)) => lines.push(format!("Substation Loss: {}%", format_number(p, 2))),
            Ok(None) => {}
            Err(_) => lines.push("Substation Loss: undefined (total consumption is zero)".to_string()),
        }
        lines
    }
}

/// Records in `scope`, laid out as `columns`, with totals over the scope.
///
/// Columns the meter sheet does not carry are dropped with a warning. An
/// empty scope is not an error: the report has no rows and zero totals.
pub fn build_report(records: &[MeterRecord], scope: &Scope, columns: &[Column]) -> Result<Report> {
    let selected = match scope.filter_key() {
        Some((key, value)) => filter(records, key, value)?,
        None => records.to_vec(),
    };
    if selected.is_empty() {
        info!(scope = %scope, "scope matched no records");
    }

    let columns: Vec<Column> = columns
        .iter()
        .copied()
        .filter(|c| {
            let carried = !matches!(c, Column::Circle | Column::Zone);
            if !carried {
                warn!(column = %c, "dropping column the meter sheet does not carry");
            }
            carried
        })
        .collect();

    let rows = selected
        .iter()
        .map(|r| columns.iter().filter_map(|c| r.cell(*c)).collect::<Vec<Cell>>())
        .collect();

    let total_consumption = total(&selected, Column::Consumption)?;
    let total_corrected_consumption = total(&selected, Column::CorrectedConsumption)?;
    let loss = match scope {
        Scope::BySubstation(_) => Some(substation_loss(total_consumption, total_corrected_consumption)),
        _ => None,
    };

    let title = match scope {
        Scope::All => "Energy Balance Report".to_string(),
        Scope::BySubstation(name) => format!("Substation Report: {}", name.trim()),
        Scope::ByNocs(code) => format!("NOCS Report: {}", code.trim()),
    };

    Ok(Report {
        title,
        scope: scope.clone(),
        columns,
        rows,
        summary: Summary {
            record_count: selected.len(),
            total_consumption: Some(total_consumption),
            total_corrected_consumption: Some(total_corrected_consumption),
            loss,
        },
        generated_at: Local::now(),
    })
}

/// How a summary report folds the rows of one group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum Measure {
    #[default]
    Sum,
    /// Sum divided by the group's row count, truncated toward zero.
    Mean,
}

/// Unit columns folded per value of `group_key`.
///
/// The summary block always carries whole-dataset sums, whichever measure
/// fills the rows.
pub fn summary_report(
    records: &[MeterRecord],
    group_key: Column,
    value_keys: &[Column],
    measure: Measure,
) -> Result<Report> {
    let grouped = aggregate_values(records, &[group_key], value_keys)?;

    let mut columns = vec![group_key];
    columns.extend_from_slice(value_keys);
    let rows = grouped
        .iter()
        .map(|g| {
            let values = match measure {
                Measure::Sum => g.values.clone(),
                Measure::Mean => g.means(),
            };
            let mut cells = vec![Cell::Text(g.key().to_string())];
            cells.extend(values.into_iter().map(|(_, v)| Cell::Units(v)));
            cells
        })
        .collect();

    let total_if_shown = |column: Column| -> Result<Option<i64>> {
        if value_keys.contains(&column) {
            total(records, column).map(Some)
        } else {
            Ok(None)
        }
    };

    let title = match measure {
        Measure::Sum => format!("Consumption by {}", group_key.header()),
        Measure::Mean => format!("Average Consumption per Feeder by {}", group_key.header()),
    };

    Ok(Report {
        title,
        scope: Scope::All,
        columns,
        rows,
        summary: Summary {
            record_count: records.len(),
            total_consumption: total_if_shown(Column::Consumption)?,
            total_corrected_consumption: total_if_shown(Column::CorrectedConsumption)?,
            loss: None,
        },
        generated_at: Local::now(),
    })
}

/// Corrected consumption per NOCS, the data behind the dashboard bar chart.
pub fn consumption_by_nocs(records: &[MeterRecord]) -> Result<Report> {
    summary_report(records, Column::Nocs, &[Column::CorrectedConsumption], Measure::Sum)
}

pub fn generate_kpis(records: &[MeterRecord]) -> Result<KpiRow> {
    Ok(KpiRow {
        total_consumption: format_units(total(records, Column::Consumption)?),
        total_corrected_consumption: format_units(total(records, Column::CorrectedConsumption)?),
        records: format_int(records.len()),
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NocsTotal {
    pub nocs: String,
    pub total: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CircleRollup {
    pub circle: String,
    pub total: i64,
    pub nocs: Vec<NocsTotal>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZoneRollup {
    pub zone: String,
    pub total: i64,
    pub circles: Vec<CircleRollup>,
}

/// Zone → Circle → NOCS totals. Every total is an aggregate of the level
/// below, so parents always equal the sum of their children.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rollup {
    pub value_key: Column,
    pub zones: Vec<ZoneRollup>,
    pub grand_total: i64,
    /// Meter records the totals were built from.
    pub record_count: usize,
}

pub fn build_rollup(
    records: &[MeterRecord],
    hierarchy: &Hierarchy,
    value_key: Column,
) -> Result<Rollup> {
    let by_nocs = aggregate(records, &[Column::Nocs], value_key)?;
    let mut enriched = hierarchy.enrich(&by_nocs)?;
    enriched.sort_by_key(|r| {
        (
            hierarchy.rank(Column::Zone, r.text(Column::Zone).unwrap_or_default()),
            hierarchy.rank(Column::Circle, r.text(Column::Circle).unwrap_or_default()),
            hierarchy.rank(Column::Nocs, r.text(Column::Nocs).unwrap_or_default()),
        )
    });

    let zone_totals = aggregate(&enriched, &[Column::Zone], value_key)?;
    let circle_totals = aggregate(&enriched, &[Column::Zone, Column::Circle], value_key)?;
    let nocs_totals = aggregate(&enriched, &[Column::Zone, Column::Circle, Column::Nocs], value_key)?;
    let grand_total = total(&zone_totals, value_key)?;

    let zones = zone_totals
        .iter()
        .map(|z| {
            let zone = z.key();
            let circles = circle_totals
                .iter()
                .filter(|c| in_zone(c, zone))
                .map(|c| {
                    let circle = c.text(Column::Circle).unwrap_or_default();
                    let nocs = nocs_totals
                        .iter()
                        .filter(|n| in_zone(n, zone) && n.text(Column::Circle) == Some(circle))
                        .map(|n| NocsTotal {
                            nocs: n.text(Column::Nocs).unwrap_or_default().to_string(),
                            total: n.value(),
                        })
                        .collect();
                    CircleRollup {
                        circle: circle.to_string(),
                        total: c.value(),
                        nocs,
                    }
                })
                .collect();
            ZoneRollup {
                zone: zone.to_string(),
                total: z.value(),
                circles,
            }
        })
        .collect();

    Ok(Rollup {
        value_key,
        zones,
        grand_total,
        record_count: records.len(),
    })
}

fn in_zone(row: &AggregateRow, zone: &str) -> bool {
    row.text(Column::Zone) == Some(zone)
}

impl Rollup {
    pub fn zone_total(&self, zone: &str) -> Option<i64> {
        self.zones.iter().find(|z| z.zone == zone).map(|z| z.total)
    }

    /// Total of every circle named `circle`, across zones. `None` when no
    /// circle matches or the sum leaves the `i64` range.
    pub fn circle_total(&self, circle: &str) -> Option<i64> {
        let mut matching = self
            .zones
            .iter()
            .flat_map(|z| z.circles.iter())
            .filter(|c| c.circle == circle)
            .map(|c| c.total)
            .peekable();
        matching.peek()?;
        matching.try_fold(0i64, |acc, v| acc.checked_add(v))
    }

    /// Flatten into a table: NOCS rows, then a total row per circle, a total
    /// row per zone, and a closing grand total.
    pub fn to_report(&self) -> Report {
        let text = |s: &str| Cell::Text(s.to_string());
        let mut rows = Vec::new();
        for z in &self.zones {
            for c in &z.circles {
                for n in &c.nocs {
                    rows.push(vec![text(&z.zone), text(&c.circle), text(&n.nocs), Cell::Units(n.total)]);
                }
                rows.push(vec![text(&z.zone), text(&c.circle), text("Circle Total"), Cell::Units(c.total)]);
            }
            rows.push(vec![text(&z.zone), text("Zone Total"), text(""), Cell::Units(z.total)]);
        }
        rows.push(vec![text("Grand Total"), text(""), text(""), Cell::Units(self.grand_total)]);

        let (total_consumption, total_corrected_consumption) = match self.value_key {
            Column::Consumption => (Some(self.grand_total), None),
            _ => (None, Some(self.grand_total)),
        };

        Report {
            title: format!("Zone / Circle / NOCS {}", self.value_key.header()),
            scope: Scope::All,
            columns: vec![Column::Zone, Column::Circle, Column::Nocs, self.value_key],
            rows,
            summary: Summary {
                record_count: self.record_count,
                total_consumption,
                total_corrected_consumption,
                loss: None,
            },
            generated_at: Local::now(),
        }
    }
}
