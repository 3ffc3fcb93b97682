use super::*;

#[test]
fn test_versions_are_ordered() {
    assert!(LanguageVersion::CSharp11 < LanguageVersion::CSharp12);
    assert!(LanguageVersion::CSharp13 < LanguageVersion::Preview);
}

#[test]
fn test_feature_gates() {
    assert!(!LanguageVersion::CSharp11.supports(Feature::CollectionExpressions));
    assert!(LanguageVersion::CSharp12.supports(Feature::CollectionExpressions));
    assert!(!LanguageVersion::CSharp12.supports(Feature::LockObject));
    assert!(LanguageVersion::CSharp13.supports(Feature::ParamsCollections));
    assert!(!LanguageVersion::CSharp13.supports(Feature::CollectionArguments));
    assert!(LanguageVersion::Preview.supports(Feature::CollectionArguments));
}

#[test]
fn test_parse_command_line_spellings() {
    assert_eq!(LanguageVersion::parse("12"), Some(LanguageVersion::CSharp12));
    assert_eq!(LanguageVersion::parse("12.0"), Some(LanguageVersion::CSharp12));
    assert_eq!(LanguageVersion::parse("latest"), Some(LanguageVersion::LATEST));
    assert_eq!(LanguageVersion::parse("Preview"), Some(LanguageVersion::Preview));
    assert_eq!(LanguageVersion::parse("7.3"), None);
}

#[test]
fn test_deserialize_from_json() {
    let v: LanguageVersion = serde_json::from_str("\"11\"").unwrap();
    assert_eq!(v, LanguageVersion::CSharp11);
    let v: LanguageVersion = serde_json::from_str("\"preview\"").unwrap();
    assert_eq!(v, LanguageVersion::Preview);
}
