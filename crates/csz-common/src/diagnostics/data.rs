use super::{DiagnosticCategory, DiagnosticMessage};

pub mod diagnostic_codes {
    pub const CANNOT_IMPLICITLY_CONVERT_TYPE: u32 = 29;
    pub const CANNOT_CONVERT_TYPE: u32 = 30;
    pub const AMBIGUOUS_CALL: u32 = 121;
    pub const LOCK_NEEDS_REFERENCE_TYPE: u32 = 185;
    pub const PARAMS_MUST_BE_COLLECTION: u32 = 225;
    pub const MISSING_PREDEFINED_MEMBER: u32 = 656;
    pub const NO_DEFINITION_FOR_MEMBER: u32 = 1061;
    pub const ARGUMENT_CANNOT_CONVERT: u32 = 1503;
    pub const FOREACH_CANNOT_OPERATE_ON_TYPE: u32 = 1579;
    pub const NO_CONSTRUCTOR_TAKES_ARGUMENTS: u32 = 1729;
    pub const COLLECTION_INIT_REQUIRES_ENUMERABLE: u32 = 1922;
    pub const BAD_ARG_TYPES_FOR_COLLECTION_ADD: u32 = 1950;
    pub const BAD_AWAIT_IN_LOCK: u32 = 1996;
    pub const POSSIBLE_NULL_REFERENCE_ASSIGNMENT: u32 = 8601;
    pub const FEATURE_NOT_AVAILABLE: u32 = 8652;
    pub const COLLECTION_EXPRESSION_TARGET_NOT_CONSTRUCTIBLE: u32 = 9174;
    pub const EXPRESSION_TREE_CONTAINS_COLLECTION_EXPRESSION: u32 = 9175;
    pub const COLLECTION_EXPRESSION_NO_TARGET_TYPE: u32 = 9176;
    pub const COLLECTION_BUILDER_METHOD_NOT_FOUND: u32 = 9187;
    pub const COLLECTION_BUILDER_NO_ELEMENT_TYPE: u32 = 9188;
    pub const CONVERTING_LOCK_TO_OTHER_TYPE: u32 = 9214;
    pub const COLLECTION_ARGUMENTS_NOT_SUPPORTED_FOR_TYPE: u32 = 9335;
    pub const COLLECTION_ARGUMENTS_MUST_BE_EMPTY: u32 = 9336;
    pub const BAD_COLLECTION_ARGUMENTS_ARG_COUNT: u32 = 9405;
}

use diagnostic_codes as codes;

pub static DIAGNOSTIC_MESSAGES: &[DiagnosticMessage] = &[
    DiagnosticMessage {
        code: codes::CANNOT_IMPLICITLY_CONVERT_TYPE,
        category: DiagnosticCategory::Error,
        message: "Cannot implicitly convert type '{0}' to '{1}'",
    },
    DiagnosticMessage {
        code: codes::CANNOT_CONVERT_TYPE,
        category: DiagnosticCategory::Error,
        message: "Cannot convert type '{0}' to '{1}'",
    },
    DiagnosticMessage {
        code: codes::AMBIGUOUS_CALL,
        category: DiagnosticCategory::Error,
        message: "The call is ambiguous between the following methods or properties: '{0}' and '{1}'",
    },
    DiagnosticMessage {
        code: codes::LOCK_NEEDS_REFERENCE_TYPE,
        category: DiagnosticCategory::Error,
        message: "'{0}' is not a reference type as required by the lock statement",
    },
    DiagnosticMessage {
        code: codes::PARAMS_MUST_BE_COLLECTION,
        category: DiagnosticCategory::Error,
        message: "The params parameter must have a valid collection type",
    },
    DiagnosticMessage {
        code: codes::MISSING_PREDEFINED_MEMBER,
        category: DiagnosticCategory::Error,
        message: "Missing compiler required member '{0}.{1}'",
    },
    DiagnosticMessage {
        code: codes::NO_DEFINITION_FOR_MEMBER,
        category: DiagnosticCategory::Error,
        message: "'{0}' does not contain a definition for '{1}' and no accessible extension method '{1}' accepting a first argument of type '{0}' could be found",
    },
    DiagnosticMessage {
        code: codes::ARGUMENT_CANNOT_CONVERT,
        category: DiagnosticCategory::Error,
        message: "Argument {0}: cannot convert from '{1}' to '{2}'",
    },
    DiagnosticMessage {
        code: codes::FOREACH_CANNOT_OPERATE_ON_TYPE,
        category: DiagnosticCategory::Error,
        message: "foreach statement cannot operate on variables of type '{0}' because '{0}' does not contain a public instance or extension definition for 'GetEnumerator'",
    },
    DiagnosticMessage {
        code: codes::NO_CONSTRUCTOR_TAKES_ARGUMENTS,
        category: DiagnosticCategory::Error,
        message: "'{0}' does not contain a constructor that takes {1} arguments",
    },
    DiagnosticMessage {
        code: codes::COLLECTION_INIT_REQUIRES_ENUMERABLE,
        category: DiagnosticCategory::Error,
        message: "Cannot initialize type '{0}' with a collection initializer because it does not implement 'System.Collections.IEnumerable'",
    },
    DiagnosticMessage {
        code: codes::BAD_ARG_TYPES_FOR_COLLECTION_ADD,
        category: DiagnosticCategory::Error,
        message: "The best overloaded Add method '{0}' for the collection initializer has some invalid arguments",
    },
    DiagnosticMessage {
        code: codes::BAD_AWAIT_IN_LOCK,
        category: DiagnosticCategory::Error,
        message: "Cannot await in the body of a lock statement",
    },
    DiagnosticMessage {
        code: codes::POSSIBLE_NULL_REFERENCE_ASSIGNMENT,
        category: DiagnosticCategory::Warning,
        message: "Possible null reference assignment.",
    },
    DiagnosticMessage {
        code: codes::FEATURE_NOT_AVAILABLE,
        category: DiagnosticCategory::Error,
        message: "'{0}' requires the language feature '{1}'. Please use language version {2} or greater.",
    },
    DiagnosticMessage {
        code: codes::COLLECTION_EXPRESSION_TARGET_NOT_CONSTRUCTIBLE,
        category: DiagnosticCategory::Error,
        message: "Cannot initialize type '{0}' with a collection expression because the type is not constructible ({1}).",
    },
    DiagnosticMessage {
        code: codes::EXPRESSION_TREE_CONTAINS_COLLECTION_EXPRESSION,
        category: DiagnosticCategory::Error,
        message: "An expression tree may not contain a collection expression.",
    },
    DiagnosticMessage {
        code: codes::COLLECTION_EXPRESSION_NO_TARGET_TYPE,
        category: DiagnosticCategory::Error,
        message: "There is no target type for the collection expression.",
    },
    DiagnosticMessage {
        code: codes::COLLECTION_BUILDER_METHOD_NOT_FOUND,
        category: DiagnosticCategory::Error,
        message: "Could not find an accessible '{0}' method with the expected signature: a static method with a single parameter of type 'ReadOnlySpan<{1}>' and return type '{2}'.",
    },
    DiagnosticMessage {
        code: codes::COLLECTION_BUILDER_NO_ELEMENT_TYPE,
        category: DiagnosticCategory::Error,
        message: "'{0}' has a CollectionBuilderAttribute but no element type.",
    },
    DiagnosticMessage {
        code: codes::CONVERTING_LOCK_TO_OTHER_TYPE,
        category: DiagnosticCategory::Warning,
        message: "A value of type '{0}' converted to a different type will use likely unintended monitor-based locking in 'lock' statement.",
    },
    DiagnosticMessage {
        code: codes::COLLECTION_ARGUMENTS_NOT_SUPPORTED_FOR_TYPE,
        category: DiagnosticCategory::Error,
        message: "Collection arguments are not supported for type '{0}'.",
    },
    DiagnosticMessage {
        code: codes::COLLECTION_ARGUMENTS_MUST_BE_EMPTY,
        category: DiagnosticCategory::Error,
        message: "Collection arguments must be empty for read-only interface '{0}'.",
    },
    DiagnosticMessage {
        code: codes::BAD_COLLECTION_ARGUMENTS_ARG_COUNT,
        category: DiagnosticCategory::Error,
        message: "No overload for method '{0}' takes {1} 'with(...)' element arguments",
    },
];
