//! Human and JSON renderings of an analysis.
//!
//! The checker hands back structured diagnostics, facts and plans; this is
//! the only place they turn into text.

use csz_checker::{Body, BodyAnalysis, LiteralFacts, PlanPrinter};
use csz_solver::constructibility::ConstructibilityVerdict;
use csz_solver::{CacheStats, PendingDiagnostic, TypeDatabase, TypeFormatter, TypeId};
use serde::Serialize;
use std::fmt::Write as _;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FixtureReport {
    pub fixture: String,
    pub bodies: Vec<BodyReport>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<ParamsReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<CacheStats>,
}

impl FixtureReport {
    fn diagnostics(&self) -> impl Iterator<Item = &DiagnosticReport> {
        self.bodies
            .iter()
            .flat_map(|b| &b.diagnostics)
            .chain(self.params.iter().flat_map(|p| &p.diagnostics))
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics().filter(|d| d.category == "error").count()
    }

    pub fn warning_count(&self) -> usize {
        self.diagnostics().filter(|d| d.category == "warning").count()
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BodyReport {
    pub name: String,
    pub diagnostics: Vec<DiagnosticReport>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub literals: Vec<LiteralReport>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub plans: Vec<PlanReport>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub nullability: Vec<NullabilityReport>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticReport {
    pub code: String,
    pub category: &'static str,
    pub start: u32,
    pub end: u32,
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub related: Vec<DiagnosticReport>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LiteralReport {
    pub node: String,
    pub target: Option<String>,
    pub verdict: String,
    pub conversion: &'static str,
    pub element_types: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanReport {
    pub node: String,
    pub text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NullabilityReport {
    pub node: String,
    pub start: u32,
    pub end: u32,
    pub target: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParamsReport {
    pub name: String,
    pub param_type: String,
    pub diagnostics: Vec<DiagnosticReport>,
}

/// Which optional sections a body report carries.
#[derive(Clone, Copy, Debug, Default)]
pub struct Sections {
    pub facts: bool,
    pub plans: bool,
}

pub struct Renderer<'a> {
    db: &'a dyn TypeDatabase,
    formatter: TypeFormatter<'a>,
}

impl<'a> Renderer<'a> {
    pub fn new(db: &'a dyn TypeDatabase) -> Self {
        Self {
            db,
            formatter: TypeFormatter::new(db),
        }
    }

    pub fn type_name(&self, ty: TypeId) -> String {
        self.formatter.format(ty)
    }

    pub fn diagnostic(&self, diagnostic: &PendingDiagnostic) -> DiagnosticReport {
        DiagnosticReport {
            code: diagnostic.label(),
            category: diagnostic.category.as_str(),
            start: diagnostic.span.start,
            end: diagnostic.span.end,
            message: diagnostic.render_message(&self.formatter, |atom| self.db.resolve_atom(atom)),
            related: diagnostic.related.iter().map(|r| self.diagnostic(r)).collect(),
        }
    }

    pub fn body(&self, name: &str, body: &Body, analysis: &BodyAnalysis, sections: Sections) -> BodyReport {
        let literals = if sections.facts {
            analysis
                .facts
                .literals()
                .into_iter()
                .map(|((_, expr), facts)| self.literal(format!("expr#{}", expr.0), facts))
                .collect()
        } else {
            Vec::new()
        };

        let plans = if sections.plans {
            let literal_plans = analysis
                .facts
                .literal_plans()
                .into_iter()
                .map(|((_, expr), plan)| (format!("expr#{}", expr.0), plan));
            let lock_plans = analysis
                .facts
                .lock_plans()
                .into_iter()
                .map(|((_, stmt), plan)| (format!("stmt#{}", stmt.0), plan));
            literal_plans
                .chain(lock_plans)
                .map(|(node, plan)| PlanReport {
                    node,
                    text: PlanPrinter::new(self.db).with_body(body).print(plan),
                })
                .collect()
        } else {
            Vec::new()
        };

        BodyReport {
            name: name.to_string(),
            diagnostics: analysis.diagnostics.iter().map(|d| self.diagnostic(d)).collect(),
            literals,
            plans,
            nullability: analysis
                .nullability
                .iter()
                .map(|fact| NullabilityReport {
                    node: format!("expr#{}", fact.expr.0),
                    start: fact.span.start,
                    end: fact.span.end,
                    target: self.formatter.format(fact.target),
                })
                .collect(),
        }
    }

    fn literal(&self, node: String, facts: &LiteralFacts) -> LiteralReport {
        LiteralReport {
            node,
            target: facts.target.map(|ty| self.formatter.format(ty)),
            verdict: facts
                .verdict
                .as_ref()
                .map_or_else(|| "none".to_string(), |v| self.verdict(v)),
            conversion: facts.conversion.as_str(),
            element_types: facts
                .element_types
                .iter()
                .map(|&ty| self.formatter.format(ty))
                .collect(),
        }
    }

    fn verdict(&self, verdict: &ConstructibilityVerdict) -> String {
        match verdict {
            ConstructibilityVerdict::NotConstructible(reason) => {
                format!("not_constructible({})", reason.as_str())
            }
            ConstructibilityVerdict::Array { rank, .. } => format!("array(rank {rank})"),
            ConstructibilityVerdict::Span { readonly: true, .. } => "readonly_span".to_string(),
            ConstructibilityVerdict::Span { .. } => "span".to_string(),
            ConstructibilityVerdict::InterfaceBackedByDefault { concrete, .. } => {
                format!("interface_backed({})", self.formatter.format(*concrete))
            }
            ConstructibilityVerdict::UserDefinedCollection { concrete, .. } => {
                format!("user_defined({})", self.formatter.format(*concrete))
            }
            ConstructibilityVerdict::CollectionBuilder { concrete, .. } => {
                format!("builder({})", self.formatter.format(*concrete))
            }
        }
    }
}

// =============================================================================
// Text
// =============================================================================

fn write_diagnostic(out: &mut String, diagnostic: &DiagnosticReport, indent: &str) {
    let _ = writeln!(
        out,
        "{indent}{} {} [{}..{}]: {}",
        diagnostic.category, diagnostic.code, diagnostic.start, diagnostic.end, diagnostic.message
    );
    for related in &diagnostic.related {
        write_diagnostic(out, related, &format!("{indent}  "));
    }
}

fn write_block(out: &mut String, text: &str, indent: &str) {
    for line in text.lines() {
        let _ = writeln!(out, "{indent}{line}");
    }
}

pub fn render_text(report: &FixtureReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "== {}", report.fixture);
    for body in &report.bodies {
        let _ = writeln!(out, "body {}", body.name);
        for diagnostic in &body.diagnostics {
            write_diagnostic(&mut out, diagnostic, "  ");
        }
        for fact in &body.nullability {
            let _ = writeln!(
                out,
                "  nullable {} [{}..{}] -> {}",
                fact.node, fact.start, fact.end, fact.target
            );
        }
        for literal in &body.literals {
            let _ = writeln!(
                out,
                "  literal {}: target={} verdict={} conversion={} elements=[{}]",
                literal.node,
                literal.target.as_deref().unwrap_or("none"),
                literal.verdict,
                literal.conversion,
                literal.element_types.join(", ")
            );
        }
        for plan in &body.plans {
            let _ = writeln!(out, "  plan {}:", plan.node);
            write_block(&mut out, &plan.text, "    ");
        }
    }
    for params in &report.params {
        let _ = writeln!(out, "params {}: {}", params.name, params.param_type);
        for diagnostic in &params.diagnostics {
            write_diagnostic(&mut out, diagnostic, "  ");
        }
    }
    if let Some(stats) = &report.stats {
        let _ = writeln!(
            out,
            "cache hits={} misses={} member_tables={} shapes={} verdicts={}",
            stats.hits, stats.misses, stats.member_tables, stats.shapes, stats.verdicts
        );
    }
    let _ = writeln!(
        out,
        "{} error(s), {} warning(s)",
        report.error_count(),
        report.warning_count()
    );
    out
}

pub fn render_json(reports: &[FixtureReport]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(reports)
}

#[cfg(test)]
#[path = "../tests/render_tests.rs"]
mod tests;
