use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing::{error, info};

use feed_merge::config::{Config, MatchPolicyKind, SeparationMode, SourceFile};
use feed_merge::logging;
use feed_merge::observability::metrics;
use feed_merge::pipeline::storage::FileStorage;
use feed_merge::pipeline::Pipeline;
use feed_merge::rules::RuleSet;

#[derive(Parser)]
#[command(name = "feed_merge")]
#[command(about = "Merge, deduplicate, standardize and validate feed ingredient tables")]
#[command(version = "0.1.0")]
struct Cli {
    /// TOML configuration file
    #[arg(long, global = true, default_value = "feed_merge.toml")]
    config: PathBuf,

    /// JSON rule file replacing the built-in lookup tables
    #[arg(long, global = true)]
    rules: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum PolicyArg {
    FuzzyName,
    StandardName,
}

impl From<PolicyArg> for MatchPolicyKind {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::FuzzyName => MatchPolicyKind::FuzzyName,
            PolicyArg::StandardName => MatchPolicyKind::StandardName,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Merge the source tables into one deduplicated list
    Merge {
        /// Source as TAG=PATH, repeatable, in load order. Replaces the configured sources
        #[arg(long = "source", value_parser = parse_source)]
        sources: Vec<SourceFile>,
        #[arg(long)]
        output: Option<PathBuf>,
        #[arg(long)]
        report: Option<PathBuf>,
        #[arg(long, value_enum)]
        policy: Option<PolicyArg>,
        #[arg(long)]
        threshold: Option<f64>,
    },
    /// Apply name corrections and separate conflated grades
    Remediate {
        #[arg(long)]
        input: Option<PathBuf>,
        #[arg(long)]
        output: Option<PathBuf>,
        #[arg(long)]
        report: Option<PathBuf>,
        /// Emit only the variants whose condition holds
        #[arg(long)]
        conditional: bool,
    },
    /// Run the quality gate over an ingredient file
    Validate {
        input: PathBuf,
        /// Also write the report to this path
        #[arg(long)]
        report: Option<PathBuf>,
    },
    /// Tag every ingredient with its region
    TagRegions {
        input: PathBuf,
        /// Defaults to rewriting the input file
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

fn parse_source(raw: &str) -> std::result::Result<SourceFile, String> {
    let (tag, path) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected TAG=PATH, got '{}'", raw))?;
    if tag.trim().is_empty() {
        return Err(format!("empty tag in '{}'", raw));
    }
    Ok(SourceFile {
        tag: tag.trim().to_string(),
        path: PathBuf::from(path.trim()),
    })
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;
    if cli.rules.is_some() {
        config.rules.path = cli.rules.clone();
    }

    let _guard = logging::init_logging(&config.logging.directory);
    let metrics_handle = match &config.metrics.snapshot {
        Some(_) => Some(metrics::init()?),
        None => None,
    };

    let rules = RuleSet::from_config(&config.rules).context("Failed to load rule tables")?;
    let storage = FileStorage;
    let pipeline = Pipeline::new(&rules, &storage);

    let outcome = run(cli.command, &mut config, &pipeline);
    if let Err(e) = &outcome {
        error!("Run failed: {:#}", e);
        println!("❌ Run failed: {:#}", e);
    }

    match (&metrics_handle, &config.metrics.snapshot) {
        (Some(handle), Some(path)) => metrics::finish_run(outcome, handle, path),
        _ => outcome,
    }
}

fn run(command: Commands, config: &mut Config, pipeline: &Pipeline) -> Result<()> {
    match command {
        Commands::Merge {
            sources,
            output,
            report,
            policy,
            threshold,
        } => {
            let merge = &mut config.merge;
            if !sources.is_empty() {
                merge.sources = sources;
            }
            if let Some(output) = output {
                merge.output = output;
            }
            if let Some(report) = report {
                merge.report = report;
            }
            if let Some(policy) = policy {
                merge.policy = policy.into();
            }
            if let Some(threshold) = threshold {
                if !(0.0..=1.0).contains(&threshold) {
                    anyhow::bail!("--threshold must be within 0..=1, got {}", threshold);
                }
                merge.similarity_threshold = threshold;
            }
            if merge.sources.is_empty() {
                anyhow::bail!("No sources configured; add [merge].sources or pass --source TAG=PATH");
            }

            println!("🔄 Merging {} ingredient sources...", merge.sources.len());
            let result = pipeline.run_merge(merge)?;
            let dataset = &result.dataset;

            println!("\n📊 Merge Results:");
            println!("   Loaded records: {}", dataset.loaded);
            println!("   Unique ingredients: {}", dataset.records.len());
            println!("   Duplicates merged: {}", dataset.merges);
            println!("   Standards-based names: {}", dataset.standards_based);
            println!("   Validation warnings: {}", dataset.validation.range_warnings().len());
            println!("   Output file: {}", result.output.display());
            println!("   Report: {}", result.report.display());
            info!("Merge command finished");
        }
        Commands::Remediate {
            input,
            output,
            report,
            conditional,
        } => {
            let remediate = &mut config.remediate;
            if let Some(input) = input {
                remediate.input = input;
            }
            if let Some(output) = output {
                remediate.output = output;
            }
            if let Some(report) = report {
                remediate.report = report;
            }
            if conditional {
                remediate.separation_mode = SeparationMode::Conditional;
            }

            println!("🔨 Remediating {}...", remediate.input.display());
            let result = pipeline.run_remediation(remediate)?;
            let outcome = &result.outcome;

            println!("\n📊 Remediation Results:");
            println!("   Original ingredients: {}", outcome.original_count);
            println!("   Remediated ingredients: {}", outcome.records.len());
            println!("   Name corrections: {}", outcome.corrections.len());
            println!("   Separations: {}", outcome.separations.len());
            println!("   Net increase: {}", outcome.net_increase());
            println!("   Output file: {}", result.output.display());
            println!("   Report: {}", result.report.display());
        }
        Commands::Validate { input, report } => {
            println!("🔍 Validating {}...", input.display());
            let result = pipeline.run_validation(&input, report.as_deref())?;

            println!("{}", result.report_text);
            if let Some(path) = &result.report {
                println!("\n✅ Report saved to: {}", path.display());
            }
        }
        Commands::TagRegions { input, output } => {
            let output = output.unwrap_or_else(|| input.clone());
            let result = pipeline.run_tag_regions(&input, &output)?;

            println!("✅ Tagging complete! Updated {} ingredients with regional tags.", result.tagged);
            println!("\nSample regional assignments:");
            for record in result.records.iter().take(5) {
                println!(
                    "  {:40} → {}",
                    record.name,
                    record.region.as_deref().unwrap_or_default()
                );
            }
        }
    }
    Ok(())
}
