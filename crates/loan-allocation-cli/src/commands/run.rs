use clap::Args;
use serde_json::{json, Value};
use std::fs::{self, File};
use std::path::{Path, PathBuf};

use loan_allocation_core::allocation::{AllocationSession, FacilityRejection, FacilityYield};
use loan_allocation_core::dataset::build_lenders;

use crate::config::RunConfig;
use crate::input::dataset::{self as dataset_io, LOANS_FILE};

pub const ASSIGNMENTS_FILE: &str = "assignments.csv";
pub const YIELDS_FILE: &str = "yields.csv";

/// Arguments for a streaming dataset run
#[derive(Args)]
pub struct RunArgs {
    /// Directory containing banks.csv, facilities.csv, covenants.csv and loans.csv
    #[arg(long)]
    pub dataset: Option<PathBuf>,

    /// Directory for assignments.csv and yields.csv (defaults to the dataset directory)
    #[arg(long)]
    pub out_dir: Option<PathBuf>,

    /// Also write every facility rejection to this CSV file
    #[arg(long)]
    pub diagnostics: Option<PathBuf>,
}

pub fn run_dataset(args: RunArgs, config: &RunConfig) -> Result<Value, Box<dyn std::error::Error>> {
    let dataset_dir = config.dataset_dir(args.dataset);
    let out_dir = config.output_dir(args.out_dir, &dataset_dir);
    let diagnostics_path = config.diagnostics(args.diagnostics);

    let reference = dataset_io::load_reference_data(&dataset_dir)?;
    let book = build_lenders(&reference.banks, &reference.facilities, &reference.covenants)?;
    let mut session = AllocationSession::new(book);

    fs::create_dir_all(&out_dir)
        .map_err(|e| format!("Failed to create '{}': {}", out_dir.display(), e))?;
    let assignments_path = out_dir.join(ASSIGNMENTS_FILE);
    let yields_path = out_dir.join(YIELDS_FILE);

    let mut assignments = headered_writer(&assignments_path, &["loan_id", "facility_id"])?;
    let mut diagnostics = match diagnostics_path {
        Some(ref path) => Some(headered_writer(
            path,
            &["loan_id", "facility_id", "kind", "reason"],
        )?),
        None => None,
    };

    for loan in dataset_io::open_loan_stream(&dataset_dir.join(LOANS_FILE))? {
        let loan = loan?;
        let outcome = session.process(&loan)?;

        if let Some(record) = outcome.assignment {
            assignments.write_record([record.loan_id.to_string(), record.facility_id.to_string()])?;
        }
        if let Some(ref mut writer) = diagnostics {
            write_rejections(writer, &outcome.rejections)?;
        }
    }
    assignments.flush()?;
    if let Some(ref mut writer) = diagnostics {
        writer.flush()?;
    }

    let summary = session.finish();
    write_yields(&yields_path, &summary.yields)?;

    Ok(json!({
        "result": {
            "loans_processed": summary.loans_processed,
            "assigned_count": summary.assigned_count,
            "unassigned_count": summary.unassigned_count,
            "facilities_used": summary.yields.len(),
            "idle_facilities": summary.idle_facility_ids.len(),
            "total_expected_yield": summary.total_expected_yield,
            "assignments_file": assignments_path.display().to_string(),
            "yields_file": yields_path.display().to_string(),
            "yields": summary.yields,
        },
        "methodology": "Greedy first-fit loan allocation with covenant screening",
        "warnings": summary
            .idle_facility_ids
            .iter()
            .map(|id| format!("Facility {} accepted no loans.", id))
            .collect::<Vec<_>>(),
    }))
}

fn headered_writer(path: &Path, header: &[&str]) -> Result<csv::Writer<File>, Box<dyn std::error::Error>> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .map_err(|e| format!("Failed to create '{}': {}", path.display(), e))?;
    writer.write_record(header)?;
    Ok(writer)
}

fn write_rejections(
    writer: &mut csv::Writer<File>,
    rejections: &[FacilityRejection],
) -> Result<(), Box<dyn std::error::Error>> {
    for rejection in rejections {
        writer.serialize(rejection)?;
    }
    Ok(())
}

fn write_yields(path: &Path, yields: &[FacilityYield]) -> Result<(), Box<dyn std::error::Error>> {
    let mut writer = headered_writer(path, &["facility_id", "expected_yield"])?;
    for y in yields {
        writer.write_record([y.facility_id.to_string(), y.expected_yield.to_string()])?;
    }
    writer.flush()?;
    Ok(())
}
