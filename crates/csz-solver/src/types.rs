//! Core type representation.
//!
//! Types are interned: a `TypeId` is a `u32` handle into the `TypeInterner`,
//! and two ids are equal iff they denote the same constructed type.

use crate::def::DefId;
use bitflags::bitflags;
use csz_common::interner::Atom;
use csz_common::language::Feature;
use serde::Serialize;
use smallvec::SmallVec;
use std::sync::Arc;

// =============================================================================
// TypeId
// =============================================================================

/// Interned type handle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TypeId(pub u32);

impl TypeId {
    pub const NONE: TypeId = TypeId(0);
    pub const ERROR: TypeId = TypeId(1);
    pub const OBJECT: TypeId = TypeId(2);
    pub const DYNAMIC: TypeId = TypeId(3);
    pub const STRING: TypeId = TypeId(4);
    pub const VOID: TypeId = TypeId(5);
    pub const BOOL: TypeId = TypeId(6);
    pub const CHAR: TypeId = TypeId(7);
    pub const SBYTE: TypeId = TypeId(8);
    pub const BYTE: TypeId = TypeId(9);
    pub const SHORT: TypeId = TypeId(10);
    pub const USHORT: TypeId = TypeId(11);
    pub const INT: TypeId = TypeId(12);
    pub const UINT: TypeId = TypeId(13);
    pub const LONG: TypeId = TypeId(14);
    pub const ULONG: TypeId = TypeId(15);
    pub const FLOAT: TypeId = TypeId(16);
    pub const DOUBLE: TypeId = TypeId(17);
    pub const DECIMAL: TypeId = TypeId(18);
    /// Type of the `null` literal. Never the natural type of an expression.
    pub const NULL: TypeId = TypeId(19);

    /// First id handed out for non-intrinsic types.
    pub const FIRST_USER: u32 = 32;

    #[inline]
    pub const fn is_intrinsic(self) -> bool {
        self.0 > 0 && self.0 < Self::FIRST_USER
    }

    #[inline]
    pub const fn is_error(self) -> bool {
        self.0 == Self::ERROR.0
    }
}

/// Built-in types with a fixed `TypeId`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum IntrinsicKind {
    Error,
    Object,
    Dynamic,
    String,
    Void,
    Bool,
    Char,
    SByte,
    Byte,
    Short,
    UShort,
    Int,
    UInt,
    Long,
    ULong,
    Float,
    Double,
    Decimal,
    Null,
}

impl IntrinsicKind {
    pub const ALL: [IntrinsicKind; 19] = [
        IntrinsicKind::Error,
        IntrinsicKind::Object,
        IntrinsicKind::Dynamic,
        IntrinsicKind::String,
        IntrinsicKind::Void,
        IntrinsicKind::Bool,
        IntrinsicKind::Char,
        IntrinsicKind::SByte,
        IntrinsicKind::Byte,
        IntrinsicKind::Short,
        IntrinsicKind::UShort,
        IntrinsicKind::Int,
        IntrinsicKind::UInt,
        IntrinsicKind::Long,
        IntrinsicKind::ULong,
        IntrinsicKind::Float,
        IntrinsicKind::Double,
        IntrinsicKind::Decimal,
        IntrinsicKind::Null,
    ];

    pub const fn type_id(self) -> TypeId {
        match self {
            IntrinsicKind::Error => TypeId::ERROR,
            IntrinsicKind::Object => TypeId::OBJECT,
            IntrinsicKind::Dynamic => TypeId::DYNAMIC,
            IntrinsicKind::String => TypeId::STRING,
            IntrinsicKind::Void => TypeId::VOID,
            IntrinsicKind::Bool => TypeId::BOOL,
            IntrinsicKind::Char => TypeId::CHAR,
            IntrinsicKind::SByte => TypeId::SBYTE,
            IntrinsicKind::Byte => TypeId::BYTE,
            IntrinsicKind::Short => TypeId::SHORT,
            IntrinsicKind::UShort => TypeId::USHORT,
            IntrinsicKind::Int => TypeId::INT,
            IntrinsicKind::UInt => TypeId::UINT,
            IntrinsicKind::Long => TypeId::LONG,
            IntrinsicKind::ULong => TypeId::ULONG,
            IntrinsicKind::Float => TypeId::FLOAT,
            IntrinsicKind::Double => TypeId::DOUBLE,
            IntrinsicKind::Decimal => TypeId::DECIMAL,
            IntrinsicKind::Null => TypeId::NULL,
        }
    }

    /// Keyword spelling used by the formatter and fixture files.
    pub const fn keyword(self) -> &'static str {
        match self {
            IntrinsicKind::Error => "?",
            IntrinsicKind::Object => "object",
            IntrinsicKind::Dynamic => "dynamic",
            IntrinsicKind::String => "string",
            IntrinsicKind::Void => "void",
            IntrinsicKind::Bool => "bool",
            IntrinsicKind::Char => "char",
            IntrinsicKind::SByte => "sbyte",
            IntrinsicKind::Byte => "byte",
            IntrinsicKind::Short => "short",
            IntrinsicKind::UShort => "ushort",
            IntrinsicKind::Int => "int",
            IntrinsicKind::UInt => "uint",
            IntrinsicKind::Long => "long",
            IntrinsicKind::ULong => "ulong",
            IntrinsicKind::Float => "float",
            IntrinsicKind::Double => "double",
            IntrinsicKind::Decimal => "decimal",
            IntrinsicKind::Null => "<null>",
        }
    }

    pub fn from_keyword(text: &str) -> Option<IntrinsicKind> {
        IntrinsicKind::ALL
            .into_iter()
            .filter(|k| !matches!(k, IntrinsicKind::Error | IntrinsicKind::Null))
            .find(|k| k.keyword() == text)
    }

    pub const fn is_numeric(self) -> bool {
        matches!(
            self,
            IntrinsicKind::Char
                | IntrinsicKind::SByte
                | IntrinsicKind::Byte
                | IntrinsicKind::Short
                | IntrinsicKind::UShort
                | IntrinsicKind::Int
                | IntrinsicKind::UInt
                | IntrinsicKind::Long
                | IntrinsicKind::ULong
                | IntrinsicKind::Float
                | IntrinsicKind::Double
                | IntrinsicKind::Decimal
        )
    }

    pub const fn is_value_type(self) -> bool {
        self.is_numeric() || matches!(self, IntrinsicKind::Bool)
    }

    pub const fn is_reference_type(self) -> bool {
        matches!(
            self,
            IntrinsicKind::Object | IntrinsicKind::Dynamic | IntrinsicKind::String
        )
    }

    /// Primitive types whose constants can be packed into a metadata blob.
    pub const fn blittable_size(self) -> Option<usize> {
        match self {
            IntrinsicKind::Bool | IntrinsicKind::SByte | IntrinsicKind::Byte => Some(1),
            IntrinsicKind::Char | IntrinsicKind::Short | IntrinsicKind::UShort => Some(2),
            IntrinsicKind::Int | IntrinsicKind::UInt | IntrinsicKind::Float => Some(4),
            IntrinsicKind::Long | IntrinsicKind::ULong | IntrinsicKind::Double => Some(8),
            _ => None,
        }
    }
}

// =============================================================================
// TypeData
// =============================================================================

pub type TypeArgs = SmallVec<[TypeId; 2]>;

/// Structural description of an interned type.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeData {
    Intrinsic(IntrinsicKind),
    /// A class, struct, interface, enum or delegate applied to type arguments.
    Named { def: DefId, args: TypeArgs },
    Array { element: TypeId, rank: u8 },
    Pointer(TypeId),
    FunctionPointer { params: TypeArgs, ret: TypeId },
    /// `T?` where `T` is a value type.
    Nullable(TypeId),
    /// `T?` where `T` is a reference type. Advisory only.
    NullableRef(TypeId),
    TypeParameter(TypeParamId),
}

// =============================================================================
// Members
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct MethodId(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct PropertyId(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TypeParamId(pub u32);

/// Declared accessibility of a type or member.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Default)]
pub enum Accessibility {
    #[default]
    Public,
    Internal,
    Protected,
    ProtectedInternal,
    PrivateProtected,
    Private,
}

impl Accessibility {
    pub fn parse(text: &str) -> Option<Accessibility> {
        Some(match text {
            "public" => Accessibility::Public,
            "internal" => Accessibility::Internal,
            "protected" => Accessibility::Protected,
            "protected internal" => Accessibility::ProtectedInternal,
            "private protected" => Accessibility::PrivateProtected,
            "private" => Accessibility::Private,
            _ => return None,
        })
    }
}

bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct MethodFlags: u16 {
        const STATIC = 1 << 0;
        const VIRTUAL = 1 << 1;
        const OVERRIDE = 1 << 2;
        const ABSTRACT = 1 << 3;
        /// Declared with `new`: hides every inherited member of the same name.
        const NEW = 1 << 4;
        /// `static` method whose first parameter is `this`.
        const EXTENSION = 1 << 5;
        const EXPLICIT_INTERFACE_IMPL = 1 << 6;
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MethodKind {
    Ordinary,
    Constructor,
    /// User-defined `implicit operator` / `explicit operator`.
    Conversion { implicit: bool },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum ParamKind {
    #[default]
    Normal,
    /// Has a default value.
    Optional,
    /// `params` array or collection.
    Params,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ParamInfo {
    pub name: Atom,
    pub ty: TypeId,
    pub kind: ParamKind,
    pub by_ref: bool,
}

impl ParamInfo {
    pub fn new(name: Atom, ty: TypeId) -> Self {
        Self {
            name,
            ty,
            kind: ParamKind::Normal,
            by_ref: false,
        }
    }

    #[inline]
    pub fn is_required(&self) -> bool {
        self.kind == ParamKind::Normal
    }
}

/// A method, constructor or conversion operator declared on a type.
#[derive(Clone, Debug)]
pub struct MethodInfo {
    pub name: Atom,
    pub declaring: DefId,
    pub kind: MethodKind,
    pub accessibility: Accessibility,
    pub flags: MethodFlags,
    pub type_params: Vec<TypeParamId>,
    pub params: Vec<ParamInfo>,
    pub return_type: TypeId,
    /// Interface whose member this explicitly implements.
    pub explicit_interface: Option<TypeId>,
    /// `[Conditional("SYMBOL")]`.
    pub conditional: Option<Atom>,
    /// Language feature a caller must have enabled to use this member.
    pub required_feature: Option<Feature>,
}

impl MethodInfo {
    #[inline]
    pub fn is_static(&self) -> bool {
        self.flags.contains(MethodFlags::STATIC)
    }

    #[inline]
    pub fn is_extension(&self) -> bool {
        self.flags.contains(MethodFlags::EXTENSION)
    }

    #[inline]
    pub fn generic_arity(&self) -> usize {
        self.type_params.len()
    }

    /// Number of parameters that must be supplied.
    pub fn required_param_count(&self) -> usize {
        self.params.iter().filter(|p| p.is_required()).count()
    }
}

#[derive(Clone, Debug)]
pub struct PropertyInfo {
    pub name: Atom,
    pub declaring: DefId,
    pub ty: TypeId,
    pub accessibility: Accessibility,
    pub is_static: bool,
    pub has_getter: bool,
    pub is_new: bool,
}

/// Who declares a type parameter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TypeParamOwner {
    Type(DefId),
    Method(MethodId),
    /// Allocated but not yet attached (method type parameters are created
    /// before their method).
    Pending,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TypeParamConstraints {
    /// `new()`
    pub constructor: bool,
    /// `class`
    pub reference_type: bool,
    /// `struct`
    pub value_type: bool,
    /// Base class and interface constraints.
    pub types: Vec<TypeId>,
}

impl TypeParamConstraints {
    pub fn is_unconstrained(&self) -> bool {
        !self.constructor && !self.reference_type && !self.value_type && self.types.is_empty()
    }
}

#[derive(Clone, Debug)]
pub struct TypeParamInfo {
    pub name: Atom,
    pub owner: TypeParamOwner,
    pub index: u32,
    pub constraints: TypeParamConstraints,
}

// =============================================================================
// Constants
// =============================================================================

/// A compile-time constant value.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum ConstantValue {
    Null,
    Bool(bool),
    Char(char),
    Int(i32),
    UInt(u32),
    Long(i64),
    ULong(u64),
    Float(f32),
    Double(f64),
    String(Arc<str>),
}

impl ConstantValue {
    /// The type the constant has on its own (the `null` literal has none).
    pub fn natural_type(&self) -> Option<TypeId> {
        Some(match self {
            ConstantValue::Null => return None,
            ConstantValue::Bool(_) => TypeId::BOOL,
            ConstantValue::Char(_) => TypeId::CHAR,
            ConstantValue::Int(_) => TypeId::INT,
            ConstantValue::UInt(_) => TypeId::UINT,
            ConstantValue::Long(_) => TypeId::LONG,
            ConstantValue::ULong(_) => TypeId::ULONG,
            ConstantValue::Float(_) => TypeId::FLOAT,
            ConstantValue::Double(_) => TypeId::DOUBLE,
            ConstantValue::String(_) => TypeId::STRING,
        })
    }

    /// Integral value, when the constant is integral (chars included).
    pub fn as_integer(&self) -> Option<i128> {
        match *self {
            ConstantValue::Char(c) => Some(c as u32 as i128),
            ConstantValue::Int(v) => Some(v as i128),
            ConstantValue::UInt(v) => Some(v as i128),
            ConstantValue::Long(v) => Some(v as i128),
            ConstantValue::ULong(v) => Some(v as i128),
            _ => None,
        }
    }

    /// Convert to the given primitive, following implicit constant conversions.
    ///
    /// Returns `None` when the value does not fit or the conversion is not
    /// implicit for constants.
    pub fn convert_to(&self, kind: IntrinsicKind) -> Option<ConstantValue> {
        if let ConstantValue::Bool(b) = *self {
            return (kind == IntrinsicKind::Bool).then_some(ConstantValue::Bool(b));
        }
        if let ConstantValue::Float(f) = *self {
            return match kind {
                IntrinsicKind::Float => Some(ConstantValue::Float(f)),
                IntrinsicKind::Double => Some(ConstantValue::Double(f as f64)),
                _ => None,
            };
        }
        if let ConstantValue::Double(d) = *self {
            return (kind == IntrinsicKind::Double).then_some(ConstantValue::Double(d));
        }
        let value = self.as_integer()?;
        let is_char = matches!(self, ConstantValue::Char(_));
        let fits = |lo: i128, hi: i128| value >= lo && value <= hi;
        match kind {
            IntrinsicKind::Char => match *self {
                ConstantValue::Char(c) => Some(ConstantValue::Char(c)),
                _ => None,
            },
            IntrinsicKind::SByte if !is_char && fits(i8::MIN as i128, i8::MAX as i128) => {
                Some(ConstantValue::Int(value as i32))
            }
            IntrinsicKind::Byte if !is_char && fits(0, u8::MAX as i128) => {
                Some(ConstantValue::Int(value as i32))
            }
            IntrinsicKind::Short if !is_char && fits(i16::MIN as i128, i16::MAX as i128) => {
                Some(ConstantValue::Int(value as i32))
            }
            IntrinsicKind::UShort if fits(0, u16::MAX as i128) => {
                Some(ConstantValue::Int(value as i32))
            }
            IntrinsicKind::Int if fits(i32::MIN as i128, i32::MAX as i128) => {
                Some(ConstantValue::Int(value as i32))
            }
            IntrinsicKind::UInt if fits(0, u32::MAX as i128) => {
                Some(ConstantValue::UInt(value as u32))
            }
            IntrinsicKind::Long if fits(i64::MIN as i128, i64::MAX as i128) => {
                Some(ConstantValue::Long(value as i64))
            }
            IntrinsicKind::ULong if fits(0, u64::MAX as i128) => {
                Some(ConstantValue::ULong(value as u64))
            }
            IntrinsicKind::Float => Some(ConstantValue::Float(value as f32)),
            IntrinsicKind::Double => Some(ConstantValue::Double(value as f64)),
            _ => None,
        }
    }

    /// Append the little-endian encoding of this value as `kind`.
    ///
    /// Returns `false` when the value cannot be represented as `kind`.
    pub fn write_le(&self, kind: IntrinsicKind, out: &mut Vec<u8>) -> bool {
        let Some(converted) = self.convert_to(kind) else {
            return false;
        };
        match (kind, converted) {
            (IntrinsicKind::Bool, ConstantValue::Bool(b)) => out.push(u8::from(b)),
            (IntrinsicKind::Char, ConstantValue::Char(c)) => {
                let Ok(unit) = u16::try_from(c as u32) else {
                    return false;
                };
                out.extend_from_slice(&unit.to_le_bytes());
            }
            (IntrinsicKind::SByte, ConstantValue::Int(v)) => out.push(v as i8 as u8),
            (IntrinsicKind::Byte, ConstantValue::Int(v)) => out.push(v as u8),
            (IntrinsicKind::Short, ConstantValue::Int(v)) => {
                out.extend_from_slice(&(v as i16).to_le_bytes());
            }
            (IntrinsicKind::UShort, ConstantValue::Int(v)) => {
                out.extend_from_slice(&(v as u16).to_le_bytes());
            }
            (IntrinsicKind::Int, ConstantValue::Int(v)) => out.extend_from_slice(&v.to_le_bytes()),
            (IntrinsicKind::UInt, ConstantValue::UInt(v)) => {
                out.extend_from_slice(&v.to_le_bytes());
            }
            (IntrinsicKind::Long, ConstantValue::Long(v)) => {
                out.extend_from_slice(&v.to_le_bytes());
            }
            (IntrinsicKind::ULong, ConstantValue::ULong(v)) => {
                out.extend_from_slice(&v.to_le_bytes());
            }
            (IntrinsicKind::Float, ConstantValue::Float(v)) => {
                out.extend_from_slice(&v.to_le_bytes());
            }
            (IntrinsicKind::Double, ConstantValue::Double(v)) => {
                out.extend_from_slice(&v.to_le_bytes());
            }
            _ => return false,
        }
        true
    }
}

#[cfg(test)]
#[path = "../tests/types_tests.rs"]
mod tests;
