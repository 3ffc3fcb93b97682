use anyhow::Result;
use clap::Parser;
use std::io::Write;

use csz_cli::args::{OutputFormat, ProbeArgs};
use csz_cli::driver::{self, ProbeSettings};
use csz_cli::render::{FixtureReport, render_json, render_text};

const EXIT_SUCCESS: i32 = 0;
/// At least one error diagnostic was reported.
const EXIT_DIAGNOSTICS: i32 = 1;

fn main() -> Result<()> {
    // Only installs a subscriber when CSZ_LOG or RUST_LOG is set.
    csz_cli::tracing_config::init_tracing();

    let args = ProbeArgs::parse();
    let settings = ProbeSettings::from(&args);
    let reports = args
        .fixtures
        .iter()
        .map(|path| driver::probe_path(&settings, path))
        .collect::<Result<Vec<_>>>()?;

    let mut stdout = std::io::stdout().lock();
    match args.format {
        OutputFormat::Text => {
            for report in &reports {
                stdout.write_all(render_text(report).as_bytes())?;
            }
        }
        OutputFormat::Json => writeln!(stdout, "{}", render_json(&reports)?)?,
    }
    stdout.flush()?;

    let errors: usize = reports.iter().map(FixtureReport::error_count).sum();
    std::process::exit(if errors > 0 { EXIT_DIAGNOSTICS } else { EXIT_SUCCESS });
}
