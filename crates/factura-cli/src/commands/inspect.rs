//! Inspect command - validate a ZIP bundle without processing it.

use std::fs;
use std::path::PathBuf;

use clap::Args;
use console::style;

use factura_core::{CYCLE_LIMIT, archive};

/// Arguments for the inspect command.
#[derive(Args)]
pub struct InspectArgs {
    /// ZIP archive to inspect
    #[arg(required = true)]
    archive: PathBuf,
}

pub async fn run(args: InspectArgs) -> anyhow::Result<()> {
    let bytes = fs::read(&args.archive)?;
    let valid = archive::inspect_archive(&bytes)?;

    println!(
        "{} {} valid document(s) found in {}",
        style("ℹ").blue(),
        valid,
        args.archive.display()
    );

    if valid > CYCLE_LIMIT {
        println!(
            "{} the archive exceeds the per-cycle limit of {} documents",
            style("!").yellow(),
            CYCLE_LIMIT
        );
    }

    Ok(())
}
