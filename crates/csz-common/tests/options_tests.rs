use super::*;

#[test]
fn test_empty_object_uses_defaults() {
    let options: AnalysisOptions = serde_json::from_str("{}").unwrap();
    assert_eq!(options, AnalysisOptions::default());
    assert_eq!(options.language_version, LanguageVersion::LATEST);
    assert!(!options.nullable_context);
}

#[test]
fn test_camel_case_fields() {
    let options: AnalysisOptions = serde_json::from_str(
        r#"{ "languageVersion": "12", "definedSymbols": ["DEBUG"], "nullableContext": true }"#,
    )
    .unwrap();
    assert_eq!(options.language_version, LanguageVersion::CSharp12);
    assert!(options.is_symbol_defined("DEBUG"));
    assert!(!options.is_symbol_defined("TRACE"));
    assert!(options.nullable_context);
    assert!(options.supports(Feature::CollectionExpressions));
    assert!(!options.supports(Feature::LockObject));
}
