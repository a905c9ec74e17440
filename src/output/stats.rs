//! Run statistics display

use crate::output::traits::RunSummary;

/// Prints a run summary to stdout in a formatted manner
///
/// # Arguments
///
/// * `summary` - The summary to display
pub fn print_summary(summary: &RunSummary) {
    println!("=== Scrape Summary ===\n");

    println!("Overview:");
    println!("  Started: {}", summary.started_at.to_rfc3339());
    println!("  Finished: {}", summary.finished_at.to_rfc3339());
    println!("  Duration: {:.1}s", summary.duration_seconds());
    println!();

    println!("Pages:");
    println!("  Scheduled: {}", summary.pages_total);
    println!("  Succeeded: {}", summary.pages_succeeded);
    println!("  Failed: {}", summary.failed_pages.len());
    println!();

    if !summary.failed_pages.is_empty() {
        println!("Failed Pages ({}):", summary.failed_pages.len());
        for index in &summary.failed_pages {
            println!("  - page {}", index);
        }
        println!();
    }

    println!(
        "Success Rate: {:.1}% ({} / {} pages)",
        summary.success_rate(),
        summary.pages_succeeded,
        summary.pages_total
    );
    println!("Total products scraped: {}", summary.records);
}
