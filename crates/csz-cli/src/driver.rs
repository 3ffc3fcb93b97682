//! Fixture in, report out.

use crate::args::ProbeArgs;
use crate::fixture::{self, Fixture};
use crate::render::{FixtureReport, ParamsReport, Renderer, Sections};
use anyhow::{Context, Result};
use csz_checker::Compilation;
use csz_common::language::LanguageVersion;
use std::path::Path;
use tracing::{debug, info_span};

/// Command-line overrides and report sections.
#[derive(Clone, Copy, Debug, Default)]
pub struct ProbeSettings {
    pub language_version: Option<LanguageVersion>,
    pub nullable: bool,
    pub sections: Sections,
    pub stats: bool,
    pub sequential: bool,
}

impl From<&ProbeArgs> for ProbeSettings {
    fn from(args: &ProbeArgs) -> Self {
        Self {
            language_version: args.language_version,
            nullable: args.nullable,
            sections: Sections {
                facts: args.facts,
                plans: args.plans,
            },
            stats: args.stats,
            sequential: args.sequential,
        }
    }
}

pub fn probe_path(settings: &ProbeSettings, path: &Path) -> Result<FixtureReport> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read fixture {}", path.display()))?;
    let fixture: Fixture = serde_json::from_str(&text)
        .with_context(|| format!("failed to parse fixture {}", path.display()))?;
    probe(settings, &path.display().to_string(), &fixture)
}

pub fn probe(settings: &ProbeSettings, label: &str, fixture: &Fixture) -> Result<FixtureReport> {
    let _span = info_span!("probe", fixture = label).entered();
    let loaded = fixture::load(fixture).with_context(|| format!("invalid fixture {label}"))?;

    let mut options = loaded.options.clone();
    if let Some(version) = settings.language_version {
        options.language_version = version;
    }
    if settings.nullable {
        options.nullable_context = true;
    }
    debug!(?options, bodies = loaded.bodies.len(), "analysing fixture");

    let compilation = Compilation::new(&loaded.store, options);
    let analyses = if settings.sequential {
        loaded
            .bodies
            .iter()
            .map(|body| compilation.analyze_body(body))
            .collect::<Result<Vec<_>, _>>()?
    } else {
        compilation.analyze_bodies(&loaded.bodies)?
    };

    let renderer = Renderer::new(&loaded.store);
    let bodies = loaded
        .body_names
        .iter()
        .zip(&loaded.bodies)
        .zip(&analyses)
        .map(|((name, body), analysis)| renderer.body(name, body, analysis, settings.sections))
        .collect();
    let params = loaded
        .params
        .iter()
        .map(|check| ParamsReport {
            name: check.name.clone(),
            param_type: renderer.type_name(check.ty),
            diagnostics: compilation
                .check_params_declaration(check.ty, check.within, check.span)
                .iter()
                .map(|d| renderer.diagnostic(d))
                .collect(),
        })
        .collect();

    Ok(FixtureReport {
        fixture: label.to_string(),
        bodies,
        params,
        stats: settings.stats.then(|| compilation.caches().stats()),
    })
}
