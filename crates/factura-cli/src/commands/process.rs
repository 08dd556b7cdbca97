//! Process command - run the extraction pipeline and export spreadsheets.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;

use factura_core::{
    EventSink, ExtractedRow, GeminiExtractor, LINE_ITEM_FIELDS, MediaType, Pipeline,
    PipelineEvent, ProcessingResult, SourceFile, archive,
};

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Standalone invoice file (image or PDF)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// ZIP archive of invoice files
    #[arg(short, long)]
    zip: Option<PathBuf>,

    /// Output directory for the generated spreadsheets
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// Gemini API key (defaults to the GEMINI_API_KEY environment variable)
    #[arg(long)]
    api_key: Option<String>,

    /// Gemini model name
    #[arg(long)]
    model: Option<String>,
}

/// Renders pipeline progress on the terminal: one status line per
/// item around an overall progress bar.
struct ConsoleSink {
    bar: ProgressBar,
}

impl EventSink for ConsoleSink {
    fn on_event(&self, event: PipelineEvent) {
        match event {
            PipelineEvent::ItemStarted { name } => {
                self.bar.set_message(name);
            }
            PipelineEvent::ItemCompleted { name, rows } => {
                self.bar
                    .println(format!("{} {} ({} line items)", style("✓").green(), name, rows));
                self.bar.inc(1);
            }
            PipelineEvent::ItemFailed { name, reason } => {
                self.bar
                    .println(format!("{} {}: {}", style("✗").red(), name, reason));
                self.bar.inc(1);
            }
            PipelineEvent::CycleCount(count) => {
                debug!(count, "cycle count updated");
            }
            PipelineEvent::LockedOut { cooldown } => {
                self.bar.println(format!(
                    "{} cycle limit reached, locked for {}s",
                    style("!").yellow(),
                    cooldown.as_secs()
                ));
            }
            PipelineEvent::CooldownExpired => {
                self.bar
                    .println(format!("{} cooldown finished, cycle reopened", style("ℹ").blue()));
            }
        }
    }
}

pub async fn run(args: ProcessArgs) -> anyhow::Result<()> {
    let start = Instant::now();

    if args.input.is_none() && args.zip.is_none() {
        anyhow::bail!("Select at least one input: --input and/or --zip");
    }

    let api_key = args
        .api_key
        .clone()
        .or_else(|| std::env::var("GEMINI_API_KEY").ok())
        .ok_or_else(|| anyhow::anyhow!("No API key: pass --api-key or set GEMINI_API_KEY"))?;

    let extractor = match &args.model {
        Some(model) => GeminiExtractor::with_model(api_key, model),
        None => GeminiExtractor::new(api_key),
    };

    let standalone = match &args.input {
        Some(path) => Some(load_standalone(path)?),
        None => None,
    };

    let archive_bytes = match &args.zip {
        Some(path) => Some(fs::read(path)?),
        None => None,
    };

    let mut expected = usize::from(standalone.is_some());

    let bar = ProgressBar::new(0);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap()
            .progress_chars("=>-"),
    );

    let mut pipeline = Pipeline::with_sink(extractor, Arc::new(ConsoleSink { bar: bar.clone() }));

    // Reject oversized or unreadable bundles before any queueing.
    if let Some(bytes) = &archive_bytes {
        let valid = pipeline.validate_archive(bytes)?;
        println!(
            "{} {} valid document(s) found in the archive",
            style("ℹ").blue(),
            valid
        );
        expected += valid;
    }

    bar.set_length(expected as u64);

    fs::create_dir_all(&args.output_dir)?;

    let results = pipeline.process(standalone, archive_bytes.as_deref()).await?;

    bar.finish_and_clear();

    let mut successful = 0usize;
    let mut failed = Vec::new();

    for result in &results {
        match result {
            ProcessingResult::Success { items, source_name } => {
                let path = write_workbook(items, source_name, &args.output_dir)?;
                debug!("wrote workbook to {}", path.display());
                successful += 1;
            }
            ProcessingResult::Failure { reason, source_name } => {
                failed.push((source_name.as_str(), reason.as_str()));
            }
        }
    }

    println!();
    println!(
        "{} Processed {} file(s) in {:?}",
        style("✓").green(),
        results.len(),
        start.elapsed()
    );
    println!(
        "   {} successful, {} failed",
        style(successful).green(),
        style(failed.len()).red()
    );

    if !failed.is_empty() {
        println!();
        println!("{}", style("Failed files:").red());
        for (name, reason) in &failed {
            println!("  - {}: {}", name, reason);
        }
    }

    Ok(())
}

fn load_standalone(path: &Path) -> anyhow::Result<SourceFile> {
    let name = path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("invoice")
        .to_string();

    if !archive::is_supported_name(&name) {
        anyhow::bail!("Unsupported file format: {}", name);
    }

    Ok(SourceFile {
        bytes: fs::read(path)?,
        media_type: MediaType::from_name(&name),
        name,
    })
}

/// Write one `<stem>_Articulos.csv` workbook for a processed document:
/// the canonical column names as the header, one record per line item.
fn write_workbook(
    rows: &[ExtractedRow],
    source_name: &str,
    output_dir: &Path,
) -> anyhow::Result<PathBuf> {
    let stem = Path::new(source_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("factura");
    let path = output_dir.join(format!("{}_Articulos.csv", stem));

    let mut wtr = csv::Writer::from_path(&path)?;
    wtr.write_record(LINE_ITEM_FIELDS)?;
    for row in rows {
        wtr.write_record(row.columns())?;
    }
    wtr.flush()?;

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_write_workbook_names_and_contents() {
        let dir = tempdir().unwrap();
        let rows = vec![ExtractedRow {
            code: "AB 12".into(),
            name: "Arandela".into(),
            unit_price: "1250,00".into(),
            quantity: "4".into(),
            discount_percent: "0".into(),
            discount_amount: "0".into(),
            notes: "0".into(),
        }];

        let path = write_workbook(&rows, "scans/factura_07.pdf", dir.path()).unwrap();
        assert_eq!(
            path.file_name().and_then(|s| s.to_str()),
            Some("factura_07_Articulos.csv")
        );

        let content = fs::read_to_string(&path).unwrap();
        let mut lines = content.lines();
        assert_eq!(
            lines.next().unwrap(),
            "codigo_articulo,nombre_articulo,precio_unitario (NETO),cantidad,prc_descuento,monto_descuento,notas"
        );
        assert_eq!(lines.next().unwrap(), "AB 12,Arandela,\"1250,00\",4,0,0,0");
    }
}
