use clap::Parser;

use super::*;

#[test]
fn parses_defaults() {
    let args = ProbeArgs::try_parse_from(["csz-probe", "a.json"]).expect("default args should parse");

    assert_eq!(args.fixtures, vec![PathBuf::from("a.json")]);
    assert_eq!(args.language_version, None);
    assert_eq!(args.format, OutputFormat::Text);
    assert!(!args.nullable);
    assert!(!args.plans);
    assert!(!args.facts);
    assert!(!args.stats);
    assert!(!args.sequential);
}

#[test]
fn parses_common_flags() {
    let args = ProbeArgs::try_parse_from([
        "csz-probe",
        "--langversion",
        "12.0",
        "--format",
        "json",
        "--nullable",
        "--plans",
        "--facts",
        "--sequential",
        "a.json",
        "b.json",
    ])
    .expect("flagged args should parse");

    assert_eq!(args.language_version, Some(LanguageVersion::CSharp12));
    assert_eq!(args.format, OutputFormat::Json);
    assert!(args.nullable);
    assert!(args.plans);
    assert!(args.facts);
    assert!(args.sequential);
    assert_eq!(args.fixtures.len(), 2);
}

#[test]
fn accepts_named_versions() {
    for (text, expected) in [
        ("latest", LanguageVersion::CSharp13),
        ("preview", LanguageVersion::Preview),
        ("11", LanguageVersion::CSharp11),
    ] {
        let args = ProbeArgs::try_parse_from(["csz-probe", "--langversion", text, "a.json"])
            .expect("version should parse");
        assert_eq!(args.language_version, Some(expected), "{text}");
    }
}

#[test]
fn rejects_unknown_version_and_missing_fixture() {
    assert!(ProbeArgs::try_parse_from(["csz-probe", "--langversion", "9", "a.json"]).is_err());
    assert!(ProbeArgs::try_parse_from(["csz-probe"]).is_err());
}
