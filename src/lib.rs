//! Energy balance reporting over substation meter readings.
//!
//! A loaded [`Dataset`] is an immutable snapshot. Every report is rebuilt from
//! it on demand: filter by scope, aggregate, enrich through the NOCS → Circle
//! → Zone [`Hierarchy`], then preview on the console or export as PDF.

pub mod aggregate;
pub mod catalog;
pub mod config;
pub mod error;
pub mod hierarchy;
pub mod loader;
pub mod observability;
pub mod output;
pub mod pdf;
pub mod reports;
pub mod types;
pub mod util;

pub use aggregate::{aggregate, aggregate_values, filter, total, AggregateRow, Row};
pub use error::{LoadError, ReportError};
pub use hierarchy::{Hierarchy, HierarchyEntry};
pub use pdf::{export, render, ExportRequest, ExportedDocument, Orientation};
pub use reports::{build_report, build_rollup, Loss, Measure, Report, Rollup, Scope};
pub use types::{Cell, Column, Dataset, MeterRecord};
