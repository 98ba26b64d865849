//! Group-by/sum over meter records and previously aggregated rows.
//!
//! Everything here is a pure function of its inputs. Sums are over whole
//! energy units, so they do not depend on input order.

use crate::error::{ReportError, Result};
use crate::types::{Column, MeterRecord};
use serde::Serialize;
use std::collections::HashMap;

/// Column access shared by raw records and aggregate rows, so rollups can
/// re-aggregate their own output.
pub trait Row {
    /// Value of a text column, or `None` if the row does not carry it.
    fn text(&self, column: Column) -> Option<&str>;

    /// Value of a unit column, or `None` if the row does not carry it.
    fn units(&self, column: Column) -> Option<i64>;
}

impl Row for MeterRecord {
    fn text(&self, column: Column) -> Option<&str> {
        match column {
            Column::SubstationName => Some(&self.substation_name),
            Column::FeederName => Some(&self.feeder_name),
            Column::Nocs => Some(&self.nocs),
            _ => None,
        }
    }

    fn units(&self, column: Column) -> Option<i64> {
        match column {
            Column::Consumption => Some(self.consumption),
            Column::CorrectedConsumption => Some(self.corrected_consumption),
            _ => None,
        }
    }
}

/// One distinct key tuple and its sums.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AggregateRow {
    pub keys: Vec<(Column, String)>,
    pub values: Vec<(Column, i64)>,
    /// Input rows folded into this group.
    pub count: usize,
}

impl AggregateRow {
    /// The first summed value; the whole value for single-column aggregates.
    pub fn value(&self) -> i64 {
        self.values.first().map_or(0, |(_, v)| *v)
    }

    pub fn key(&self) -> &str {
        self.keys.first().map_or("", |(_, k)| k.as_str())
    }

    /// Per-row mean of each sum, truncated toward zero like every other unit
    /// figure.
    pub fn means(&self) -> Vec<(Column, i64)> {
        let count = self.count.max(1) as i64;
        self.values.iter().map(|(c, v)| (*c, v / count)).collect()
    }
}

impl Row for AggregateRow {
    fn text(&self, column: Column) -> Option<&str> {
        self.keys
            .iter()
            .find(|(c, _)| *c == column)
            .map(|(_, v)| v.as_str())
    }

    fn units(&self, column: Column) -> Option<i64> {
        self.values.iter().find(|(c, _)| *c == column).map(|(_, v)| *v)
    }
}

/// Sum `value_key` per distinct tuple of `group_keys`.
pub fn aggregate<R: Row>(
    rows: &[R],
    group_keys: &[Column],
    value_key: Column,
) -> Result<Vec<AggregateRow>> {
    aggregate_values(rows, group_keys, &[value_key])
}

/// Sum several unit columns at once. Output rows follow the first appearance
/// of each key tuple in `rows`.
pub fn aggregate_values<R: Row>(
    rows: &[R],
    group_keys: &[Column],
    value_keys: &[Column],
) -> Result<Vec<AggregateRow>> {
    if group_keys.is_empty() {
        return Err(ReportError::EmptyGroupKeys);
    }
    if let Some(c) = group_keys.iter().find(|c| !c.is_text()) {
        return Err(ReportError::NotFilterable(*c));
    }
    if let Some(c) = value_keys.iter().find(|c| !c.holds_units()) {
        return Err(ReportError::NotAggregatable(*c));
    }

    let mut index: HashMap<Vec<String>, usize> = HashMap::new();
    let mut out: Vec<AggregateRow> = Vec::new();
    for row in rows {
        let mut tuple = Vec::with_capacity(group_keys.len());
        for c in group_keys {
            let k = row.text(*c).ok_or(ReportError::MissingColumn(*c))?;
            tuple.push(k.to_string());
        }
        let mut amounts = Vec::with_capacity(value_keys.len());
        for c in value_keys {
            amounts.push(row.units(*c).ok_or(ReportError::MissingColumn(*c))?);
        }

        let slot = match index.get(&tuple).copied() {
            Some(i) => i,
            None => {
                out.push(AggregateRow {
                    keys: group_keys.iter().copied().zip(tuple.iter().cloned()).collect(),
                    values: value_keys.iter().map(|c| (*c, 0)).collect(),
                    count: 0,
                });
                index.insert(tuple, out.len() - 1);
                out.len() - 1
            }
        };
        let group = &mut out[slot];
        group.count += 1;
        for (acc, amount) in group.values.iter_mut().zip(amounts) {
            acc.1 = acc
                .1
                .checked_add(amount)
                .ok_or(ReportError::Overflow(acc.0))?;
        }
    }
    Ok(out)
}

/// Rows whose `key` equals `value` exactly (case and whitespace included).
pub fn filter<R: Row + Clone>(rows: &[R], key: Column, value: &str) -> Result<Vec<R>> {
    if !key.is_text() {
        return Err(ReportError::NotFilterable(key));
    }
    Ok(rows
        .iter()
        .filter(|r| r.text(key) == Some(value))
        .cloned()
        .collect())
}

/// Sum of a unit column; zero for no rows.
pub fn total<R: Row>(rows: &[R], column: Column) -> Result<i64> {
    if !column.holds_units() {
        return Err(ReportError::NotAggregatable(column));
    }
    rows.iter().try_fold(0i64, |acc, r| {
        let v = r.units(column).ok_or(ReportError::MissingColumn(column))?;
        acc.checked_add(v).ok_or(ReportError::Overflow(column))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(substation: &str, nocs: &str, consumption: i64, corrected: i64) -> MeterRecord {
        MeterRecord {
            substation_name: substation.to_string(),
            feeder_name: format!("{substation} feeder"),
            nocs: nocs.to_string(),
            cf: Some(1.0),
            opening_reading: None,
            closing_reading: None,
            difference: None,
            omf: None,
            consumption,
            corrected_consumption: corrected,
        }
    }

    fn sample() -> Vec<MeterRecord> {
        vec![
            rec("Dapa 33/11 kV", "Fatullah", 100, 110),
            rec("Kazla  33/11KV S/S", "Kazla", 40, 45),
            rec("Dapa 33/11 kV", "Fatullah", 60, 61),
            rec("Demra 33/11KV S/S", "Demra", 0, 7),
            rec("Kazla  33/11KV S/S", "Kazla", 5, 5),
        ]
    }

    #[test]
    fn groups_in_first_appearance_order() {
        let rows = aggregate(&sample(), &[Column::Nocs], Column::CorrectedConsumption).unwrap();
        let keys: Vec<&str> = rows.iter().map(|r| r.key()).collect();
        assert_eq!(keys, ["Fatullah", "Kazla", "Demra"]);
        let values: Vec<i64> = rows.iter().map(|r| r.value()).collect();
        assert_eq!(values, [171, 50, 7]);
    }

    #[test]
    fn conserves_totals_for_every_key_set() {
        let data = sample();
        let expected = total(&data, Column::Consumption).unwrap();
        for keys in [
            vec![Column::Nocs],
            vec![Column::SubstationName],
            vec![Column::FeederName],
            vec![Column::Nocs, Column::SubstationName],
            vec![Column::SubstationName, Column::FeederName, Column::Nocs],
        ] {
            let rows = aggregate(&data, &keys, Column::Consumption).unwrap();
            let sum: i64 = rows.iter().map(|r| r.value()).sum();
            assert_eq!(sum, expected, "keys {keys:?}");
        }
    }

    #[test]
    fn sums_do_not_depend_on_row_order() {
        let data = sample();
        let mut reversed = data.clone();
        reversed.reverse();

        let mut a = aggregate(&data, &[Column::Nocs], Column::Consumption).unwrap();
        let mut b = aggregate(&reversed, &[Column::Nocs], Column::Consumption).unwrap();
        a.sort_by(|x, y| x.key().cmp(y.key()));
        b.sort_by(|x, y| x.key().cmp(y.key()));
        assert_eq!(a, b);
    }

    #[test]
    fn repeated_aggregation_is_identical() {
        let data = sample();
        let keys = [Column::SubstationName, Column::Nocs];
        let first = aggregate_values(&data, &keys, &[Column::Consumption, Column::CorrectedConsumption]);
        let second = aggregate_values(&data, &keys, &[Column::Consumption, Column::CorrectedConsumption]);
        assert_eq!(first, second);
    }

    #[test]
    fn multi_value_rows_carry_each_sum() {
        let rows = aggregate_values(
            &sample(),
            &[Column::SubstationName],
            &[Column::Consumption, Column::CorrectedConsumption],
        )
        .unwrap();
        assert_eq!(rows[0].units(Column::Consumption), Some(160));
        assert_eq!(rows[0].units(Column::CorrectedConsumption), Some(171));
        assert_eq!(rows[0].text(Column::SubstationName), Some("Dapa 33/11 kV"));
    }

    #[test]
    fn aggregate_rows_can_be_reaggregated() {
        let by_sub = aggregate(
            &sample(),
            &[Column::Nocs, Column::SubstationName],
            Column::CorrectedConsumption,
        )
        .unwrap();
        let by_nocs = aggregate(&by_sub, &[Column::Nocs], Column::CorrectedConsumption).unwrap();
        assert_eq!(by_nocs.len(), 3);
        assert_eq!(by_nocs[1].value(), 50);
    }

    #[test]
    fn empty_input_sums_to_zero() {
        let empty: Vec<MeterRecord> = Vec::new();
        assert!(aggregate(&empty, &[Column::Nocs], Column::Consumption).unwrap().is_empty());
        assert_eq!(total(&empty, Column::CorrectedConsumption).unwrap(), 0);
    }

    #[test]
    fn rejects_bad_keys() {
        let data = sample();
        assert_eq!(
            aggregate(&data, &[], Column::Consumption),
            Err(ReportError::EmptyGroupKeys)
        );
        assert_eq!(
            aggregate(&data, &[Column::Nocs], Column::Omf),
            Err(ReportError::NotAggregatable(Column::Omf))
        );
        assert_eq!(
            aggregate(&data, &[Column::Cf], Column::Consumption),
            Err(ReportError::NotFilterable(Column::Cf))
        );
        assert_eq!(
            aggregate(&data, &[Column::Zone], Column::Consumption),
            Err(ReportError::MissingColumn(Column::Zone))
        );
    }

    #[test]
    fn sums_past_i64_range_are_reported() {
        let data = vec![
            rec("Dapa 33/11 kV", "Fatullah", i64::MAX, 1),
            rec("Dapa 33/11 kV", "Fatullah", i64::MAX, 1),
        ];
        assert_eq!(
            total(&data, Column::Consumption),
            Err(ReportError::Overflow(Column::Consumption))
        );
        assert_eq!(
            aggregate(&data, &[Column::Nocs], Column::Consumption),
            Err(ReportError::Overflow(Column::Consumption))
        );
        assert_eq!(total(&data, Column::CorrectedConsumption), Ok(2));
    }

    #[test]
    fn groups_count_rows_and_average_them() {
        let rows = aggregate_values(
            &sample(),
            &[Column::Nocs],
            &[Column::Consumption, Column::CorrectedConsumption],
        )
        .unwrap();
        let counts: Vec<usize> = rows.iter().map(|r| r.count).collect();
        assert_eq!(counts, [2, 2, 1]);
        assert_eq!(
            rows[0].means(),
            [(Column::Consumption, 80), (Column::CorrectedConsumption, 85)]
        );
        assert_eq!(
            rows[1].means(),
            [(Column::Consumption, 22), (Column::CorrectedConsumption, 25)]
        );
    }

    #[test]
    fn filter_is_exact() {
        let data = sample();
        let kazla = filter(&data, Column::SubstationName, "Kazla  33/11KV S/S").unwrap();
        assert_eq!(kazla.len(), 2);
        assert!(filter(&data, Column::SubstationName, "Kazla 33/11KV S/S").unwrap().is_empty());
        assert!(filter(&data, Column::Nocs, "kazla").unwrap().is_empty());
        assert!(filter(&data, Column::SubstationName, "NonExistent").unwrap().is_empty());
        assert_eq!(
            filter(&data, Column::Consumption, "100"),
            Err(ReportError::NotFilterable(Column::Consumption))
        );
    }
}
