use clap::{Parser, ValueEnum};
use csz_common::language::LanguageVersion;
use std::path::PathBuf;

/// CLI arguments for `csz-probe`.
#[derive(Parser, Debug)]
#[command(
    name = "csz-probe",
    version,
    about = "Analyse collection literals and lock statements described by JSON fixtures"
)]
pub struct ProbeArgs {
    /// Fixture files to analyse.
    #[arg(required = true)]
    pub fixtures: Vec<PathBuf>,

    /// Override the fixture's language version (`10`..`13`, `latest`, `preview`).
    #[arg(long = "langversion", alias = "lang-version", value_parser = parse_language_version)]
    pub language_version: Option<LanguageVersion>,

    /// Force the nullable context on.
    #[arg(long)]
    pub nullable: bool,

    /// Report format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Print the lowering plan of every literal and lock statement.
    #[arg(long)]
    pub plans: bool,

    /// Print target, verdict, conversion and element types of every literal.
    #[arg(long)]
    pub facts: bool,

    /// Print solver cache counters after each fixture.
    #[arg(long)]
    pub stats: bool,

    /// Analyse bodies one at a time instead of in parallel.
    #[arg(long)]
    pub sequential: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

fn parse_language_version(text: &str) -> Result<LanguageVersion, String> {
    LanguageVersion::parse(text)
        .ok_or_else(|| format!("unknown language version '{text}' (expected 10..13, latest or preview)"))
}

#[cfg(test)]
#[path = "../tests/args_tests.rs"]
mod tests;
