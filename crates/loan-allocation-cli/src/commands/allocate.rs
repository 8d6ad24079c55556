use clap::Args;
use serde_json::Value;
use std::path::PathBuf;

use loan_allocation_core::allocation::{self, AllocationInput};

use crate::input;

/// Arguments for a one-shot JSON allocation
#[derive(Args)]
pub struct AllocateArgs {
    /// Path to JSON input file with banks, facilities, covenants and loans
    /// (reads piped stdin when omitted)
    #[arg(long)]
    pub input: Option<PathBuf>,

    /// Include every facility rejection in the result
    #[arg(long)]
    pub include_rejections: bool,
}

pub fn run_allocate(args: AllocateArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut allocation_input: AllocationInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        data
    } else {
        return Err("--input file is required (or pipe JSON on stdin)".into());
    };

    if args.include_rejections {
        allocation_input.include_rejections = true;
    }

    let result = allocation::allocate(&allocation_input)?;
    Ok(serde_json::to_value(result)?)
}
