use crate::pdf::ExportedDocument;
use crate::reports::Report;
use anyhow::Result;
use serde::Serialize;
use serde_json::json;
use std::fs;
use std::path::Path;
use tabled::{builder::Builder, settings::Style, Table, Tabled};
use tracing::info;

pub fn write_report_csv(path: impl AsRef<Path>, report: &Report) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record(report.headers())?;
    for row in &report.rows {
        wtr.write_record(row.iter().map(|c| c.to_string()))?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_json<T: Serialize>(path: impl AsRef<Path>, value: &T) -> Result<()> {
    let s = serde_json::to_string_pretty(value)?;
    fs::write(path, s)?;
    Ok(())
}

pub fn report_json(report: &Report) -> serde_json::Value {
    let rows: Vec<Vec<String>> = report
        .rows
        .iter()
        .map(|row| row.iter().map(|c| c.to_string()).collect())
        .collect();
    json!({
        "title": report.title,
        "scope": report.scope.to_string(),
        "generated_at": report.generated_at.to_rfc3339(),
        "columns": report.headers(),
        "rows": rows,
        "summary": report.summary,
        "summary_lines": report.summary_lines(),
    })
}

/// Write the decoded PDF next to its base64 envelope.
pub fn write_pdf(dir: impl AsRef<Path>, doc: &ExportedDocument) -> Result<()> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir)?;
    let pdf_path = dir.join(&doc.filename);
    fs::write(&pdf_path, doc.decode()?)?;
    write_json(pdf_path.with_extension("json"), doc)?;
    info!(path = %pdf_path.display(), bytes = doc.byte_len, "wrote PDF export");
    Ok(())
}

pub fn render_report_table(report: &Report, max_rows: usize) -> String {
    if report.is_empty() {
        return "(no rows)".to_string();
    }
    let mut builder = Builder::default();
    builder.push_record(report.headers().into_iter().map(String::from));
    for row in report.rows.iter().take(max_rows) {
        builder.push_record(row.iter().map(|c| c.to_string()));
    }
    builder.build().with(Style::markdown()).to_string()
}

pub fn preview_report(report: &Report, max_rows: usize) {
    println!("{}\n", report.title);
    println!("{}\n", render_report_table(report, max_rows));
    if report.rows.len() > max_rows {
        println!("({} more rows not shown)", report.rows.len() - max_rows);
    }
    for line in report.summary_lines() {
        println!("{}", line);
    }
    println!();
}

pub fn preview_table_rows<T>(rows: &[T], max_rows: usize)
where
    T: Tabled + Clone,
{
    let slice: Vec<T> = rows.iter().cloned().take(max_rows).collect();
    if slice.is_empty() {
        println!("(no rows)\n");
        return;
    }
    let table_str = Table::new(slice).with(Style::markdown()).to_string();
    println!("{}\n", table_str);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reports::{build_report, Scope, NOCS_COLUMNS};
    use crate::types::MeterRecord;

    fn records() -> Vec<MeterRecord> {
        ["F1", "F2", "F3"]
            .iter()
            .map(|f| MeterRecord {
                substation_name: "Dapa 33/11 kV".into(),
                feeder_name: f.to_string(),
                nocs: "Fatullah".into(),
                cf: None,
                opening_reading: None,
                closing_reading: None,
                difference: None,
                omf: None,
                consumption: 1500,
                corrected_consumption: 1600,
            })
            .collect()
    }

    #[test]
    fn markdown_table_honours_row_limit() {
        let report = build_report(&records(), &Scope::All, &NOCS_COLUMNS).unwrap();
        let table = render_report_table(&report, 2);
        assert!(table.contains("Feeder_Name"));
        assert!(table.contains("F2"));
        assert!(!table.contains("F3"));
        assert!(table.contains("1,500"));
    }

    #[test]
    fn json_carries_rows_and_summary() {
        let report = build_report(&records(), &Scope::ByNocs("Fatullah".into()), &NOCS_COLUMNS).unwrap();
        let value = report_json(&report);
        assert_eq!(value["rows"].as_array().map(|r| r.len()), Some(3));
        assert_eq!(value["summary"]["total_consumption"], 4500);
        assert_eq!(value["columns"][0], "NOCS");
    }
}
