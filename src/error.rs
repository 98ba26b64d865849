//! Error types for dataset loading and report building.

use crate::types::Column;
use thiserror::Error;

/// Result type for report operations.
pub type Result<T> = std::result::Result<T, ReportError>;

/// Errors raised while aggregating data or building a report.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ReportError {
    /// Aggregation was asked to group by nothing.
    #[error("at least one group key is required")]
    EmptyGroupKeys,

    /// The value column does not hold normalized energy units.
    #[error("column {0} cannot be summed")]
    NotAggregatable(Column),

    /// Grouping and filtering are only defined on text columns.
    #[error("column {0} is not a text key column")]
    NotFilterable(Column),

    /// A column was requested from a report or row that does not carry it.
    #[error("column {0} is not present")]
    MissingColumn(Column),

    /// A unit sum left the `i64` range.
    #[error("sum of {0} overflows")]
    Overflow(Column),

    /// NOCS code absent from the hierarchy table.
    #[error("no hierarchy entry for NOCS {0:?}")]
    UnknownHierarchyEntry(String),

    /// Loss percentage over a scope whose raw consumption sums to zero.
    #[error("substation loss is undefined for {scope}: total consumption is zero")]
    LossUndefined { scope: String },
}

/// Fatal problems with the source dataset.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A required header is missing from the sheet.
    #[error("dataset is missing required column {0:?}")]
    MissingColumn(String),
}
