//! End-to-end runs of the probe driver over inline and on-disk fixtures.

use csz_cli::driver::{ProbeSettings, probe, probe_path};
use csz_cli::fixture::Fixture;
use csz_cli::render::{FixtureReport, Sections, render_text};
use csz_common::language::LanguageVersion;
use std::path::Path;

fn run(settings: ProbeSettings, json: &str) -> FixtureReport {
    let fixture: Fixture = serde_json::from_str(json).expect("fixture json");
    probe(&settings, "inline", &fixture).expect("probe succeeds")
}

fn with_plans() -> ProbeSettings {
    ProbeSettings {
        sections: Sections {
            facts: true,
            plans: true,
        },
        ..ProbeSettings::default()
    }
}

fn codes(report: &FixtureReport) -> Vec<&str> {
    report
        .bodies
        .iter()
        .flat_map(|b| &b.diagnostics)
        .map(|d| d.code.as_str())
        .collect()
}

const LOCK_BODIES: &str = r#"{
  "bodies": [
    { "name": "Scoped",
      "statements": [{ "lock": { "resource": { "local": { "name": "gate", "type": "Lock" } }, "body": [] } }] },
    { "name": "Monitor",
      "statements": [{ "lock": { "resource": { "local": { "name": "o", "type": "object" } }, "body": [] } }] }
  ]
}"#;

#[test]
fn lock_statements_pick_their_protocol() {
    let report = run(with_plans(), LOCK_BODIES);
    assert!(codes(&report).is_empty(), "{:?}", codes(&report));

    let scoped = &report.bodies[0];
    assert_eq!(scoped.name, "Scoped");
    assert_eq!(scoped.plans.len(), 1);
    assert!(scoped.plans[0].node.starts_with("stmt#"));
    assert!(scoped.plans[0].text.starts_with("scope_enter_dispose"), "{}", scoped.plans[0].text);

    let monitor = &report.bodies[1];
    assert!(monitor.plans[0].text.starts_with("monitor_fallback object"), "{}", monitor.plans[0].text);
}

#[test]
fn language_version_override_gates_lock_objects() {
    let settings = ProbeSettings {
        language_version: Some(LanguageVersion::CSharp12),
        ..ProbeSettings::default()
    };
    let report = run(settings, LOCK_BODIES);
    assert_eq!(codes(&report), vec!["CS8652"]);
    assert_eq!(report.error_count(), 1);
}

#[test]
fn untyped_literal_and_mismatched_element() {
    let report = run(
        ProbeSettings::default(),
        r#"{ "bodies": [{ "statements": [
          { "local": { "name": "x", "init": { "list": [{ "int": 1 }] } } },
          { "local": { "name": "a", "type": "int[]", "init": { "list": [{ "string": "s" }] } } }
        ] }] }"#,
    );
    assert_eq!(codes(&report), vec!["CS9176", "CS0029"]);
    let text = render_text(&report);
    assert!(text.ends_with("2 error(s), 0 warning(s)\n"), "{text}");
}

#[test]
fn sequential_and_parallel_runs_agree() {
    let json = r#"{
      "types": [{ "name": "IntBag", "interfaces": ["IEnumerable<int>"],
                  "methods": [{ "name": "Add", "params": [{ "type": "int" }] }] }],
      "bodies": [
        { "statements": [{ "local": { "name": "b", "type": "IntBag",
            "init": { "list": [{ "int": 1 }, { "spread": { "local": { "name": "xs", "type": "List<int>" } } }] } } }] },
        { "statements": [{ "local": { "name": "r", "type": "ReadOnlySpan<int>", "init": { "list": [] } } }] }
      ]
    }"#;
    let parallel = run(with_plans(), json);
    let sequential = run(
        ProbeSettings {
            sequential: true,
            ..with_plans()
        },
        json,
    );
    assert_eq!(render_text(&parallel), render_text(&sequential));
    assert_eq!(parallel.bodies[0].literals[0].verdict, "user_defined(IntBag)");
    assert_eq!(parallel.bodies[1].literals[0].verdict, "readonly_span");
}

#[test]
fn params_declarations_are_checked() {
    let report = run(
        ProbeSettings::default(),
        r#"{ "params": [
          { "name": "ok", "type": "IEnumerable<int>" },
          { "name": "bad", "type": "int" }
        ] }"#,
    );
    assert_eq!(report.params.len(), 2);
    assert!(report.params[0].diagnostics.is_empty());
    assert_eq!(report.params[1].param_type, "int");
    assert_eq!(report.params[1].diagnostics[0].code, "CS0225");
    assert_eq!(report.error_count(), 1);
}

#[test]
fn stats_are_reported_on_request() {
    let settings = ProbeSettings {
        stats: true,
        ..ProbeSettings::default()
    };
    let report = run(
        settings,
        r#"{ "bodies": [{ "statements": [
          { "local": { "name": "l", "type": "List<int>", "init": { "list": [{ "int": 1 }] } } }
        ] }] }"#,
    );
    let stats = report.stats.as_ref().expect("stats requested");
    assert!(stats.misses > 0);
    assert!(render_text(&report).contains("cache hits="));
}

#[test]
fn invalid_fixtures_are_errors() {
    let fixture: Fixture =
        serde_json::from_str(r#"{ "bodies": [{ "statements": [{ "expr": { "spread": { "int": 1 } } }] }] }"#)
            .expect("fixture json");
    let err = probe(&ProbeSettings::default(), "broken", &fixture).expect_err("rejected");
    assert!(err.to_string().contains("invalid fixture broken"), "{err:#}");
}

#[test]
fn bundled_fixtures_probe_cleanly() {
    let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures");
    for name in ["literals.json", "lock.json"] {
        let report = probe_path(&with_plans(), &dir.join(name)).expect("probe succeeds");
        assert_eq!(report.error_count(), 0, "{}", render_text(&report));
        assert!(report.bodies.iter().any(|b| !b.plans.is_empty()), "{name}");
    }
    assert!(probe_path(&ProbeSettings::default(), &dir.join("missing.json")).is_err());
}

#[test]
fn builder_collections_report_their_create_call() {
    let report = run(
        with_plans(),
        r#"{
          "options": { "languageVersion": "preview" },
          "types": [
            { "name": "IntSet", "interfaces": ["IEnumerable<int>"],
              "collectionBuilder": { "type": "IntSetBuilder", "method": "Create" } },
            { "name": "IntSetBuilder", "static": true, "methods": [
              { "name": "Create", "static": true, "returns": "IntSet",
                "params": [{ "name": "items", "type": "ReadOnlySpan<int>" }] }
            ] }
          ],
          "bodies": [
            { "statements": [{ "local": { "name": "s", "type": "IntSet", "init": { "list": [{ "int": 1 }] } } }] },
            { "statements": [{ "local": { "name": "t", "type": "IntSet",
                "init": { "literal": { "elements": [], "with": [{ "int": 3 }] } } } }] }
          ]
        }"#,
    );
    assert_eq!(codes(&report), vec!["CS9405"]);
    let created = &report.bodies[0];
    assert_eq!(created.literals[0].verdict, "builder(IntSet)");
    assert!(
        created.plans[0]
            .text
            .starts_with("builder_call IntSet\n  create IntSetBuilder.Create(ReadOnlySpan<int>)\n"),
        "{}",
        created.plans[0].text
    );
    assert!(report.bodies[1].plans.is_empty());
}
