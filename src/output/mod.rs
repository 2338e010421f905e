use anyhow::Result;
use console::style;
use std::path::Path;

use crate::pipeline::{BatchReport, DatasetSummary, RunOutcome};
use crate::utils::format_duration;

/// Render the end-of-run summary
pub fn format_summary(summary: &DatasetSummary) -> String {
    format!(
        "=== Dataset creation complete ===\nTotal clips: {}\nTotal duration: {:.2}s ({})\nMean duration: {:.2}s",
        summary.clips,
        summary.total_duration,
        format_duration(summary.total_duration),
        summary.mean_duration
    )
}

/// Print the outcome of a single run to the console
pub fn print_outcome(outcome: &RunOutcome) {
    match outcome {
        RunOutcome::Written {
            summary,
            manifest_path,
        } => {
            println!();
            println!("{}", style(format_summary(summary)).green());
            println!("Manifest: {}", manifest_path.display());
        }
        RunOutcome::Discarded { produced, required } => {
            eprintln!(
                "{} too few clips were produced ({} < {}), manifest not updated",
                style("Warning:").yellow().bold(),
                produced,
                required
            );
        }
    }
}

/// Print the tally of a batch run
pub fn print_batch_report(report: &BatchReport) {
    println!();
    println!("{}", style("=== Batch complete ===").bold());
    println!("URLs processed: {}", report.total());
    println!("  Written:   {}", style(report.written).green());
    println!("  Discarded: {}", style(report.discarded).yellow());
    println!("  Failed:    {}", style(report.failed.len()).red());
    for (url, error) in &report.failed {
        println!("    • {}: {}", url, error);
    }
}

/// Print playlist URLs, one per line
pub fn print_urls(urls: &[String]) {
    for url in urls {
        println!("{}", url);
    }
}

/// Save playlist URLs as a JSON array usable as batch input
pub fn save_urls(urls: &[String], path: &Path) -> Result<()> {
    let content = serde_json::to_string_pretty(urls)?;
    fs_err::write(path, content)?;
    Ok(())
}
