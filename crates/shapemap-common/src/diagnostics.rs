use serde::Serialize;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticCategory {
    Info,
    Warning,
    Error,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct DiagnosticMessage {
    pub code: u32,
    pub category: DiagnosticCategory,
    pub message: &'static str,
}

/// Stable numeric codes. Rendered as `SM0001` etc.
pub mod diagnostic_codes {
    pub const COULD_NOT_CREATE_MAPPING: u32 = 1;
    pub const NO_PARAMETERLESS_CONSTRUCTOR_FOUND: u32 = 2;
    pub const NO_CONSTRUCTOR_FOUND: u32 = 3;
    pub const CONFIGURED_SOURCE_MEMBER_NOT_FOUND: u32 = 4;
    pub const CONFIGURED_TARGET_MEMBER_NOT_FOUND: u32 = 5;
    pub const COULD_NOT_MAP_MEMBER: u32 = 6;
    pub const UNMAPPED_TARGET_MEMBER: u32 = 7;
    pub const UNMAPPED_SOURCE_MEMBER: u32 = 8;
    pub const IGNORED_SOURCE_MEMBER_NOT_FOUND: u32 = 9;
    pub const IGNORED_TARGET_MEMBER_NOT_FOUND: u32 = 10;
    pub const CANNOT_MAP_TO_READ_ONLY_MEMBER: u32 = 11;
    pub const DERIVED_SOURCE_TYPE_DUPLICATED: u32 = 12;
    pub const DERIVED_SOURCE_TYPE_NOT_ASSIGNABLE: u32 = 13;
    pub const DERIVED_TARGET_TYPE_NOT_ASSIGNABLE: u32 = 14;
    pub const REFERENCE_LOOP_IN_PROJECTION: u32 = 15;
    pub const MAPPING_DEPTH_EXCEEDED: u32 = 16;
    pub const SOURCE_ENUM_VALUE_NOT_MAPPED: u32 = 17;
    pub const UNKNOWN_USER_MAPPING_TYPE: u32 = 18;
    pub const MAPPING_BUDGET_EXCEEDED: u32 = 19;
    pub const DERIVED_TYPES_IN_PROJECTION: u32 = 20;
}

use self::DiagnosticCategory::{Error, Info, Warning};
use self::diagnostic_codes as codes;

/// Message templates; `{0}`, `{1}` … are positional arguments.
pub static DIAGNOSTIC_MESSAGES: &[DiagnosticMessage] = &[
    DiagnosticMessage {
        code: codes::COULD_NOT_CREATE_MAPPING,
        category: Error,
        message: "Could not create mapping from {0} to {1}",
    },
    DiagnosticMessage {
        code: codes::NO_PARAMETERLESS_CONSTRUCTOR_FOUND,
        category: Error,
        message: "{0} has no accessible parameterless constructor",
    },
    DiagnosticMessage {
        code: codes::NO_CONSTRUCTOR_FOUND,
        category: Error,
        message: "{0} has no accessible constructor with mappable arguments",
    },
    DiagnosticMessage {
        code: codes::CONFIGURED_SOURCE_MEMBER_NOT_FOUND,
        category: Error,
        message: "Specified member {0} on source type {1} was not found",
    },
    DiagnosticMessage {
        code: codes::CONFIGURED_TARGET_MEMBER_NOT_FOUND,
        category: Error,
        message: "Specified member {0} on target type {1} was not found",
    },
    DiagnosticMessage {
        code: codes::COULD_NOT_MAP_MEMBER,
        category: Warning,
        message: "Could not map member {0} of {1} to member {2} of {3}",
    },
    DiagnosticMessage {
        code: codes::UNMAPPED_TARGET_MEMBER,
        category: Warning,
        message: "The member {0} on the mapping target type {1} was not found on the mapping source type {2}",
    },
    DiagnosticMessage {
        code: codes::UNMAPPED_SOURCE_MEMBER,
        category: Info,
        message: "The member {0} on the mapping source type {1} is not mapped to any member on the mapping target type {2}",
    },
    DiagnosticMessage {
        code: codes::IGNORED_SOURCE_MEMBER_NOT_FOUND,
        category: Warning,
        message: "Ignored source member {0} on {1} was not found",
    },
    DiagnosticMessage {
        code: codes::IGNORED_TARGET_MEMBER_NOT_FOUND,
        category: Warning,
        message: "Ignored target member {0} on {1} was not found",
    },
    DiagnosticMessage {
        code: codes::CANNOT_MAP_TO_READ_ONLY_MEMBER,
        category: Info,
        message: "Cannot map {0} to read only member {1} on {2}",
    },
    DiagnosticMessage {
        code: codes::DERIVED_SOURCE_TYPE_DUPLICATED,
        category: Error,
        message: "Derived source type {0} is specified multiple times, a derived source type may only be specified once",
    },
    DiagnosticMessage {
        code: codes::DERIVED_SOURCE_TYPE_NOT_ASSIGNABLE,
        category: Error,
        message: "Derived source type {0} is not assignable to the source type {1}",
    },
    DiagnosticMessage {
        code: codes::DERIVED_TARGET_TYPE_NOT_ASSIGNABLE,
        category: Error,
        message: "Derived target type {0} is not assignable to the target type {1}",
    },
    DiagnosticMessage {
        code: codes::REFERENCE_LOOP_IN_PROJECTION,
        category: Error,
        message: "The mapping from {0} to {1} is referenced by itself inside a projection, which cannot be expressed",
    },
    DiagnosticMessage {
        code: codes::MAPPING_DEPTH_EXCEEDED,
        category: Error,
        message: "Resolving the mapping from {0} to {1} exceeded the maximum nesting depth of {2}",
    },
    DiagnosticMessage {
        code: codes::SOURCE_ENUM_VALUE_NOT_MAPPED,
        category: Warning,
        message: "Enum member {0} of {1} has no member with the same name on {2}",
    },
    DiagnosticMessage {
        code: codes::UNKNOWN_USER_MAPPING_TYPE,
        category: Error,
        message: "User mapping {0} refers to a type that does not belong to the type universe",
    },
    DiagnosticMessage {
        code: codes::MAPPING_BUDGET_EXCEEDED,
        category: Error,
        message: "Resolving the mapping from {0} to {1} exceeded the budget of {2} resolutions per mapper",
    },
    DiagnosticMessage {
        code: codes::DERIVED_TYPES_IN_PROJECTION,
        category: Error,
        message: "Derived types of the mapping from {0} to {1} cannot be dispatched inside a projection",
    },
];

pub fn get_message(code: u32) -> Option<&'static DiagnosticMessage> {
    DIAGNOSTIC_MESSAGES.iter().find(|m| m.code == code)
}

pub fn get_message_template(code: u32) -> Option<&'static str> {
    get_message(code).map(|m| m.message)
}

pub fn format_message(message: &str, args: &[&str]) -> String {
    let mut result = message.to_string();
    for (i, arg) in args.iter().enumerate() {
        result = result.replace(&format!("{{{i}}}"), arg);
    }
    result
}

/// Render a code the way diagnostics are displayed, e.g. `SM0012`.
pub fn display_code(code: u32) -> String {
    format!("SM{code:04}")
}
