use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

use feed_merge::pipeline::ingestion::read_records;
use feed_merge::pipeline::processing::normalize::NormalizationRegistry;
use feed_merge::pipeline::processing::quality_gate::check_units;

/// Report proximate values that are not plausible percentages.
#[derive(Parser, Debug)]
#[command(name = "check-units", version, about = "Check unit consistency of an ingredient file")]
struct Cli {
    /// Ingredient JSON file to check
    path: PathBuf,
}

fn main() -> Result<()> {
    let args = Cli::parse();
    let records = read_records(&args.path, &NormalizationRegistry::new())
        .with_context(|| format!("Failed to read {}", args.path.display()))?;

    println!("Total ingredients: {}", records.len());
    println!("\n{}", "=".repeat(80));
    println!("CHECKING UNIT CONSISTENCY (All values should be in %)");
    println!("{}\n", "=".repeat(80));

    let issues: Vec<_> = records.iter().flat_map(check_units).collect();
    if issues.is_empty() {
        println!("✓ All ingredients have consistent units (percentages)");
        println!("✓ No values exceed 100%");
        println!("✓ No totals exceed 105%");
    } else {
        println!("Found {} UNIT ISSUES:\n", issues.len());
        for issue in &issues {
            let id = issue
                .ingredient_id
                .map(|id| format!("{:3}", id))
                .unwrap_or_else(|| "  ?".to_string());
            println!("ID {} | {}", id, issue.description);
        }
    }

    println!("\n{}", "=".repeat(80));
    println!("SUMMARY");
    println!("{}", "=".repeat(80));
    println!("Total ingredients checked: {}", records.len());
    println!("Issues found: {}", issues.len());
    Ok(())
}
