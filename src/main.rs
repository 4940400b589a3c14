//! otx-checker CLI - checks an OTX document and writes the checker bundle result

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use otx_checker::config::Config;
use otx_checker::engine::Engine;
use otx_checker::output::{formatter_for, MarkdownFormatter, OutputFormatter, MARKDOWN_FILE_NAME};
use otx_checker::report::{Report, Status};
use std::path::PathBuf;

const BUNDLE_DESCRIPTION: &str = "OTX checker bundle";

#[derive(Parser)]
#[command(
    name = "otx-checker",
    version,
    about = "OTX Document Validator",
    long_about = "Checks an OTX document against the OTX document and semantic rules."
)]
struct Cli {
    /// Configuration file path (.xml, .yaml or .json)
    #[arg(short = 'c', long = "config", alias = "config_path")]
    config: PathBuf,

    /// Write checker documentation to generated_checker_bundle_doc.md
    #[arg(short = 'g', long = "generate_markdown")]
    generate_markdown: bool,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    if let Err(e) = run(&cli) {
        eprintln!("{}: {:#}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    let config = Config::load(&cli.config)
        .with_context(|| format!("Failed to load config {}", cli.config.display()))?;

    log::info!("Checking {}", config.input_file.display());

    let mut report = Report::new(
        &config.bundle_name,
        env!("CARGO_PKG_VERSION"),
        BUNDLE_DESCRIPTION,
    );
    report.copy_params(&config.params);

    Engine::new()
        .check_file(&config.input_file, &mut report)
        .with_context(|| format!("Failed to check {}", config.input_file.display()))?;
    report.generate_summary();

    let formatted = formatter_for(&config.result_file).format(&report)?;
    std::fs::write(&config.result_file, formatted)
        .with_context(|| format!("Failed to write {}", config.result_file.display()))?;

    if cli.generate_markdown {
        let doc = MarkdownFormatter::new().format(&report)?;
        std::fs::write(MARKDOWN_FILE_NAME, doc)
            .with_context(|| format!("Failed to write {}", MARKDOWN_FILE_NAME))?;
    }

    print_summary(&report);
    println!(
        "{} Result written to {}",
        "done".green().bold(),
        config.result_file.display()
    );
    Ok(())
}

fn print_summary(report: &Report) {
    for checker in &report.checkers {
        let status = match checker.status {
            Status::Completed if checker.issues.is_empty() => "COMPLETED".green(),
            Status::Completed => "COMPLETED".yellow(),
            Status::Skipped => "SKIPPED".dimmed(),
            Status::Error => "ERROR".red().bold(),
            Status::NotRun => "NOT_RUN".normal(),
        };
        let issues = match (checker.error_count(), checker.warning_count()) {
            (0, 0) => String::new(),
            (errors, warnings) => format!(" ({} errors, {} warnings)", errors, warnings),
        };
        println!("{:>9}  {}{}", status, checker.checker_id, issues);
    }
    println!();
    println!("{}", report.summary.bold());
}
