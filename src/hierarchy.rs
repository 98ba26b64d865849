//! NOCS → Circle → Zone mapping.
//!
//! The built-in table covers every NOCS code in [`crate::catalog::NOCS_CODES`].
//! Config entries can extend or override it; the result is still built once
//! and then only read.

use crate::aggregate::{AggregateRow, Row};
use crate::error::{ReportError, Result};
use crate::types::Column;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::warn;

/// Circle and zone reported for codes missing from the table.
pub const UNKNOWN: &str = "Unknown";

// (nocs, circle, zone), in presentation order.
const BUILTIN_TABLE: [(&str, &str, &str); 36] = [
    ("Dhanmondi", "Dhanmondi", "North"),
    ("Jigatola", "Dhanmondi", "North"),
    ("Satmasjid", "Dhanmondi", "North"),
    ("Azimpur", "Dhanmondi", "North"),
    ("Tejgaon", "Tejgaon", "North"),
    ("Shere b.nagar", "Tejgaon", "North"),
    ("Shyamoli", "Tejgaon", "North"),
    ("Adabor", "Tejgaon", "North"),
    ("Lalbag", "Lalbag", "North"),
    ("Kamrangirchar", "Lalbag", "North"),
    ("Bangshal", "Lalbag", "North"),
    ("Banglabazar", "Lalbag", "North"),
    ("Motijheel", "Motijheel", "Central"),
    ("Mugdapara", "Motijheel", "Central"),
    ("Bashabo", "Motijheel", "Central"),
    ("Rajarbag", "Motijheel", "Central"),
    ("Khilgaon", "Motijheel", "Central"),
    ("Ramna", "Ramna", "Central"),
    ("Kakrail", "Ramna", "Central"),
    ("Paribag", "Ramna", "Central"),
    ("Moghbazar", "Ramna", "Central"),
    ("Banosree", "Ramna", "Central"),
    ("Narinda", "Narinda", "South"),
    ("Swamibag", "Narinda", "South"),
    ("Maniknagar", "Narinda", "South"),
    ("Jurain", "Narinda", "South"),
    ("Shyampur", "Narinda", "South"),
    ("Demra", "Demra", "South"),
    ("Matuail", "Demra", "South"),
    ("Siddirgonj", "Demra", "South"),
    ("Sytalakhya", "Demra", "South"),
    ("N.Gonj (West)", "Narayanganj", "South"),
    ("N.Gonj (East)", "Narayanganj", "South"),
    ("Fatullah", "Narayanganj", "South"),
    ("Postogola", "Narayanganj", "South"),
    ("Kazla", "Narayanganj", "South"),
];

static BUILTIN: Lazy<Hierarchy> = Lazy::new(|| {
    Hierarchy::from_entries(BUILTIN_TABLE.iter().map(|(nocs, circle, zone)| HierarchyEntry {
        nocs: nocs.to_string(),
        circle: circle.to_string(),
        zone: zone.to_string(),
    }))
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HierarchyEntry {
    pub nocs: String,
    pub circle: String,
    pub zone: String,
}

#[derive(Debug, Clone, Default)]
pub struct Hierarchy {
    entries: Vec<HierarchyEntry>,
    index: HashMap<String, usize>,
}

impl Hierarchy {
    pub fn builtin() -> &'static Hierarchy {
        &BUILTIN
    }

    /// Later entries for the same NOCS replace earlier ones in place.
    pub fn from_entries(entries: impl IntoIterator<Item = HierarchyEntry>) -> Self {
        let mut h = Hierarchy::default();
        h.extend(entries);
        h
    }

    /// The built-in table with `overrides` applied on top.
    pub fn with_overrides(&self, overrides: &[HierarchyEntry]) -> Self {
        let mut h = self.clone();
        h.extend(overrides.iter().cloned());
        h
    }

    fn extend(&mut self, entries: impl IntoIterator<Item = HierarchyEntry>) {
        for entry in entries {
            match self.index.get(&entry.nocs).copied() {
                Some(i) => self.entries[i] = entry,
                None => {
                    self.index.insert(entry.nocs.clone(), self.entries.len());
                    self.entries.push(entry);
                }
            }
        }
    }

    pub fn entries(&self) -> &[HierarchyEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Strict lookup.
    pub fn lookup(&self, nocs: &str) -> Result<&HierarchyEntry> {
        self.index
            .get(nocs)
            .map(|&i| &self.entries[i])
            .ok_or_else(|| ReportError::UnknownHierarchyEntry(nocs.to_string()))
    }

    /// `(circle, zone)` for `nocs`, falling back to `("Unknown", "Unknown")`.
    pub fn resolve(&self, nocs: &str) -> (&str, &str) {
        match self.lookup(nocs) {
            Ok(entry) => (entry.circle.as_str(), entry.zone.as_str()),
            Err(e) => {
                warn!(error = %e, "falling back to unknown circle and zone");
                (UNKNOWN, UNKNOWN)
            }
        }
    }

    /// Append `Circle` and `Zone` keys to rows grouped by NOCS.
    pub fn enrich(&self, rows: &[AggregateRow]) -> Result<Vec<AggregateRow>> {
        rows.iter()
            .map(|row| {
                let nocs = row
                    .text(Column::Nocs)
                    .ok_or(ReportError::MissingColumn(Column::Nocs))?;
                let (circle, zone) = self.resolve(nocs);
                let mut enriched = row.clone();
                enriched.keys.push((Column::Circle, circle.to_string()));
                enriched.keys.push((Column::Zone, zone.to_string()));
                Ok(enriched)
            })
            .collect()
    }

    /// Presentation position of a key in `column`; unmapped values sort last.
    pub fn rank(&self, column: Column, value: &str) -> usize {
        let position = match column {
            Column::Nocs => self.index.get(value).copied(),
            Column::Circle => self.entries.iter().position(|e| e.circle == value),
            Column::Zone => self.entries.iter().position(|e| e.zone == value),
            _ => None,
        };
        position.unwrap_or(usize::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::NOCS_CODES;

    #[test]
    fn builtin_covers_every_catalog_code() {
        let h = Hierarchy::builtin();
        assert_eq!(h.len(), NOCS_CODES.len());
        for code in NOCS_CODES {
            assert!(h.lookup(code).is_ok(), "{code} unmapped");
        }
    }

    #[test]
    fn resolves_known_codes() {
        let h = Hierarchy::builtin();
        assert_eq!(h.resolve("Motijheel"), ("Motijheel", "Central"));
        assert_eq!(h.resolve("Mugdapara"), ("Motijheel", "Central"));
        assert_eq!(h.resolve("Kazla"), ("Narayanganj", "South"));
    }

    #[test]
    fn unknown_codes_fall_back() {
        let h = Hierarchy::builtin();
        assert_eq!(h.resolve("Atlantis"), (UNKNOWN, UNKNOWN));
        assert_eq!(h.resolve("motijheel"), (UNKNOWN, UNKNOWN));
        assert_eq!(
            h.lookup("Atlantis"),
            Err(ReportError::UnknownHierarchyEntry("Atlantis".to_string()))
        );
    }

    #[test]
    fn overrides_replace_and_extend() {
        let h = Hierarchy::builtin().with_overrides(&[
            HierarchyEntry {
                nocs: "Kazla".into(),
                circle: "Kazla".into(),
                zone: "East".into(),
            },
            HierarchyEntry {
                nocs: "Uttara".into(),
                circle: "Uttara".into(),
                zone: "North".into(),
            },
        ]);
        assert_eq!(h.resolve("Kazla"), ("Kazla", "East"));
        assert_eq!(h.resolve("Uttara"), ("Uttara", "North"));
        assert_eq!(h.len(), NOCS_CODES.len() + 1);
        assert_eq!(Hierarchy::builtin().resolve("Kazla"), ("Narayanganj", "South"));
    }

    #[test]
    fn enrich_requires_nocs_key() {
        let h = Hierarchy::builtin();
        let row = AggregateRow {
            keys: vec![(Column::SubstationName, "Dapa 33/11 kV".into())],
            values: vec![(Column::Consumption, 1)],
            count: 1,
        };
        assert_eq!(
            h.enrich(&[row]),
            Err(ReportError::MissingColumn(Column::Nocs))
        );
    }

    #[test]
    fn ranks_follow_table_order() {
        let h = Hierarchy::builtin();
        assert!(h.rank(Column::Zone, "North") < h.rank(Column::Zone, "Central"));
        assert!(h.rank(Column::Zone, "Central") < h.rank(Column::Zone, "South"));
        assert_eq!(h.rank(Column::Zone, UNKNOWN), usize::MAX);
        assert!(h.rank(Column::Circle, "Motijheel") < h.rank(Column::Circle, "Ramna"));
    }
}
