// Entry point and high-level CLI flow.
//
// A numbered menu stands in for the dashboard:
// - Option [1] loads the meter sheet and prints load diagnostics.
// - Options [2]-[5] build a report from the loaded snapshot and preview it.
// - Option [6] exports the last report as PDF (plus CSV and JSON).
use anyhow::Result;
use energy_balance_report::{
    catalog,
    config::AppConfig,
    loader, observability, output,
    pdf::{self, ExportedDocument},
    reports::{self, Measure, Scope, NOCS_COLUMNS, SUBSTATION_COLUMNS},
    util, Column, Dataset, Hierarchy, Report,
};
use std::io::{self, Write};
use tracing::error;

const PREVIEW_ROWS: usize = 15;

/// Everything one interactive run works with. The dataset is replaced as a
/// whole on reload, never edited.
struct Session {
    config: AppConfig,
    hierarchy: Hierarchy,
    data: Option<Dataset>,
    last_report: Option<Report>,
}

/// Print `prompt` and read one line with the line ending removed, or `None`
/// once stdin is closed.
///
/// Inner whitespace is kept because substation names are matched verbatim.
fn read_line(prompt: &str) -> Option<String> {
    print!("{}", prompt);
    let _ = io::stdout().flush();
    let mut buf = String::new();
    match io::stdin().read_line(&mut buf) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(buf.trim_end_matches(&['\r', '\n'][..]).to_string()),
    }
}

/// Closed stdin reads as the exit choice.
fn read_choice() -> String {
    read_line("Enter choice: ").map_or_else(|| "0".to_string(), |s| s.trim().to_string())
}

/// Let the user pick from a closed list by number, or type a value directly.
fn pick(label: &str, options: &[&str]) -> String {
    for (i, option) in options.iter().enumerate() {
        println!("[{:>2}] {}", i + 1, option);
    }
    let input = read_line(&format!("Pick one {} (number or name): ", label)).unwrap_or_default();
    match input.trim().parse::<usize>() {
        Ok(n) if (1..=options.len()).contains(&n) => options[n - 1].to_string(),
        _ => input,
    }
}

fn handle_load(session: &mut Session) {
    let path = session.config.dataset.path.clone();
    match loader::load_and_clean(&path) {
        Ok((data, load_report)) => {
            println!(
                "Processing dataset... ({} rows read, {} records loaded)",
                util::format_int(load_report.total_rows),
                util::format_int(load_report.loaded_rows)
            );
            println!("Snapshot taken at {}", data.loaded_at().format("%Y-%m-%d %H:%M:%S"));
            if load_report.parse_errors > 0 {
                println!(
                    "Note: {} rows skipped due to parse errors.",
                    util::format_int(load_report.parse_errors)
                );
            }
            if load_report.zeroed_values > 0 {
                println!(
                    "Info: {} blank or non-numeric consumption values counted as zero.",
                    util::format_int(load_report.zeroed_values)
                );
            }
            println!();
            session.data = Some(data);
            session.last_report = None;
        }
        Err(e) => {
            eprintln!("Failed to load {}: {}\n", path.display(), e);
        }
    }
}

fn loaded(session: &Session) -> Option<Dataset> {
    if session.data.is_none() {
        println!("Error: No data loaded. Please load the dataset first (option 1).\n");
    }
    session.data.clone()
}

fn handle_dashboard(session: &mut Session) -> Result<()> {
    let Some(data) = loaded(session) else {
        return Ok(());
    };
    let records = data.records();

    println!("Energy Balance Dashboard\n");
    output::preview_table_rows(&[reports::generate_kpis(records)?], 1);

    let by_nocs = reports::consumption_by_nocs(records)?;
    output::preview_report(&by_nocs, PREVIEW_ROWS);

    let both = [Column::Consumption, Column::CorrectedConsumption];
    let mean = Measure::Mean;
    output::preview_report(&reports::summary_report(records, Column::Nocs, &both, mean)?, PREVIEW_ROWS);
    let by_substation = reports::summary_report(records, Column::SubstationName, &both, mean)?;
    output::preview_report(&by_substation, PREVIEW_ROWS);

    session.last_report = Some(by_nocs);
    Ok(())
}

fn handle_scoped(session: &mut Session, scope: Scope, columns: &[Column]) -> Result<()> {
    let Some(data) = loaded(session) else {
        return Ok(());
    };
    catalog::check_scope(&scope);
    let report = reports::build_report(data.records(), &scope, columns)?;
    output::preview_report(&report, PREVIEW_ROWS);
    session.last_report = Some(report);
    Ok(())
}

fn handle_rollup(session: &mut Session) -> Result<()> {
    let Some(data) = loaded(session) else {
        return Ok(());
    };
    let rollup = reports::build_rollup(data.records(), &session.hierarchy, Column::CorrectedConsumption)?;
    let report = rollup.to_report();
    output::preview_report(&report, usize::MAX);
    session.last_report = Some(report);
    Ok(())
}

fn handle_export(session: &Session) -> Result<()> {
    let Some(report) = &session.last_report else {
        println!("Error: No report to export yet. Build one first (options 2-5).\n");
        return Ok(());
    };
    let export_cfg = &session.config.export;
    let mut doc: ExportedDocument = pdf::export(&report.title, report, export_cfg.orientation);
    doc.filename = export_cfg.filename.clone();
    output::write_pdf(&export_cfg.output_dir, &doc)?;

    let stem = export_cfg.output_dir.join(&doc.filename);
    output::write_report_csv(stem.with_extension("csv"), report)?;
    output::write_json(stem.with_extension("report.json"), &output::report_json(report))?;

    println!(
        "Exported {} ({} pages, {} bytes) to {}\n",
        doc.filename,
        doc.pages,
        util::format_int(doc.byte_len),
        export_cfg.output_dir.display()
    );
    Ok(())
}

fn main() -> Result<()> {
    observability::init_tracing();

    let config = AppConfig::load()?;
    let hierarchy = Hierarchy::builtin().with_overrides(&config.hierarchy);
    let mut session = Session {
        config,
        hierarchy,
        data: None,
        last_report: None,
    };

    loop {
        println!("Energy Balance Reports:");
        println!("[1] Load the dataset");
        println!("[2] Dashboard summary");
        println!("[3] Substation report");
        println!("[4] NOCS report");
        println!("[5] Zone / Circle rollup");
        println!("[6] Export last report");
        println!("[0] Exit\n");
        let outcome = match read_choice().as_str() {
            "1" => {
                handle_load(&mut session);
                Ok(())
            }
            "2" => handle_dashboard(&mut session),
            "3" => {
                let name = pick("Substation", &catalog::SUBSTATIONS);
                handle_scoped(&mut session, Scope::BySubstation(name), &SUBSTATION_COLUMNS)
            }
            "4" => {
                let code = pick("NOCS", &catalog::NOCS_CODES);
                handle_scoped(&mut session, Scope::ByNocs(code), &NOCS_COLUMNS)
            }
            "5" => handle_rollup(&mut session),
            "6" => handle_export(&session),
            "0" => {
                println!("Exiting the program.");
                break;
            }
            _ => {
                println!("Invalid choice. Please enter 0-6.\n");
                Ok(())
            }
        };
        if let Err(e) = outcome {
            error!(error = %e, "request failed");
            eprintln!("Error: {}\n", e);
        }
    }
    Ok(())
}
