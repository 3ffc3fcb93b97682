use super::*;

#[test]
fn test_intrinsic_ids_are_fixed() {
    for kind in IntrinsicKind::ALL {
        assert!(kind.type_id().is_intrinsic(), "{kind:?}");
    }
    assert!(!TypeId(TypeId::FIRST_USER).is_intrinsic());
    assert!(!TypeId::NONE.is_intrinsic());
}

#[test]
fn test_keyword_round_trip_excludes_pseudo_types() {
    assert_eq!(IntrinsicKind::from_keyword("int"), Some(IntrinsicKind::Int));
    assert_eq!(IntrinsicKind::from_keyword("dynamic"), Some(IntrinsicKind::Dynamic));
    assert_eq!(IntrinsicKind::from_keyword("<null>"), None);
    assert_eq!(IntrinsicKind::from_keyword("?"), None);
}

#[test]
fn test_constant_narrowing_respects_range() {
    let small = ConstantValue::Int(200);
    assert_eq!(small.convert_to(IntrinsicKind::Byte), Some(ConstantValue::Int(200)));
    assert_eq!(small.convert_to(IntrinsicKind::SByte), None);
    assert_eq!(ConstantValue::Int(-1).convert_to(IntrinsicKind::UInt), None);
    assert_eq!(
        ConstantValue::Int(7).convert_to(IntrinsicKind::Long),
        Some(ConstantValue::Long(7))
    );
}

#[test]
fn test_int_constant_never_becomes_char_or_bool() {
    assert_eq!(ConstantValue::Int(65).convert_to(IntrinsicKind::Char), None);
    assert_eq!(ConstantValue::Int(1).convert_to(IntrinsicKind::Bool), None);
}

#[test]
fn test_write_le_packs_little_endian() {
    let mut bytes = Vec::new();
    assert!(ConstantValue::Int(3).write_le(IntrinsicKind::Int, &mut bytes));
    assert!(ConstantValue::Int(-2).write_le(IntrinsicKind::Short, &mut bytes));
    assert!(ConstantValue::Bool(true).write_le(IntrinsicKind::Bool, &mut bytes));
    assert_eq!(bytes, vec![3, 0, 0, 0, 0xfe, 0xff, 1]);
}

#[test]
fn test_write_le_rejects_out_of_range() {
    let mut bytes = Vec::new();
    assert!(!ConstantValue::Int(300).write_le(IntrinsicKind::Byte, &mut bytes));
    assert!(bytes.is_empty());
}

#[test]
fn test_null_has_no_natural_type() {
    assert_eq!(ConstantValue::Null.natural_type(), None);
    assert_eq!(ConstantValue::Long(1).natural_type(), Some(TypeId::LONG));
}
