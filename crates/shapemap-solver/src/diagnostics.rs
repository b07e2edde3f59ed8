//! Diagnostics collected during plan resolution.
//!
//! Findings are recorded lazily: the sink stores the kind, the subject types
//! and raw message arguments, and only formats text when a consumer asks for
//! it at the end of the run.

use crate::db::TypeDatabase;
use crate::types::TypeId;
use serde::Serialize;
use shapemap_common::diagnostics::{display_code, get_message};
use shapemap_common::{DiagnosticCategory, format_message};
use smallvec::SmallVec;
use std::sync::Arc;

pub use shapemap_common::diagnostics::diagnostic_codes as codes;

/// What went wrong. Each kind has a stable code and a catalog template.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    CouldNotCreateMapping,
    NoParameterlessConstructorFound,
    NoConstructorFound,
    ConfiguredSourceMemberNotFound,
    ConfiguredTargetMemberNotFound,
    CouldNotMapMember,
    UnmappedTargetMember,
    UnmappedSourceMember,
    IgnoredSourceMemberNotFound,
    IgnoredTargetMemberNotFound,
    CannotMapToReadOnlyMember,
    DerivedSourceTypeDuplicated,
    DerivedSourceTypeNotAssignable,
    DerivedTargetTypeNotAssignable,
    ReferenceLoopInProjection,
    MappingDepthExceeded,
    SourceEnumValueNotMapped,
    UnknownUserMappingType,
    MappingBudgetExceeded,
    DerivedTypesInProjection,
}

impl DiagnosticKind {
    pub const fn code(self) -> u32 {
        match self {
            Self::CouldNotCreateMapping => codes::COULD_NOT_CREATE_MAPPING,
            Self::NoParameterlessConstructorFound => codes::NO_PARAMETERLESS_CONSTRUCTOR_FOUND,
            Self::NoConstructorFound => codes::NO_CONSTRUCTOR_FOUND,
            Self::ConfiguredSourceMemberNotFound => codes::CONFIGURED_SOURCE_MEMBER_NOT_FOUND,
            Self::ConfiguredTargetMemberNotFound => codes::CONFIGURED_TARGET_MEMBER_NOT_FOUND,
            Self::CouldNotMapMember => codes::COULD_NOT_MAP_MEMBER,
            Self::UnmappedTargetMember => codes::UNMAPPED_TARGET_MEMBER,
            Self::UnmappedSourceMember => codes::UNMAPPED_SOURCE_MEMBER,
            Self::IgnoredSourceMemberNotFound => codes::IGNORED_SOURCE_MEMBER_NOT_FOUND,
            Self::IgnoredTargetMemberNotFound => codes::IGNORED_TARGET_MEMBER_NOT_FOUND,
            Self::CannotMapToReadOnlyMember => codes::CANNOT_MAP_TO_READ_ONLY_MEMBER,
            Self::DerivedSourceTypeDuplicated => codes::DERIVED_SOURCE_TYPE_DUPLICATED,
            Self::DerivedSourceTypeNotAssignable => codes::DERIVED_SOURCE_TYPE_NOT_ASSIGNABLE,
            Self::DerivedTargetTypeNotAssignable => codes::DERIVED_TARGET_TYPE_NOT_ASSIGNABLE,
            Self::ReferenceLoopInProjection => codes::REFERENCE_LOOP_IN_PROJECTION,
            Self::MappingDepthExceeded => codes::MAPPING_DEPTH_EXCEEDED,
            Self::SourceEnumValueNotMapped => codes::SOURCE_ENUM_VALUE_NOT_MAPPED,
            Self::UnknownUserMappingType => codes::UNKNOWN_USER_MAPPING_TYPE,
            Self::MappingBudgetExceeded => codes::MAPPING_BUDGET_EXCEEDED,
            Self::DerivedTypesInProjection => codes::DERIVED_TYPES_IN_PROJECTION,
        }
    }

    pub fn severity(self) -> DiagnosticCategory {
        get_message(self.code()).map_or(DiagnosticCategory::Error, |m| m.category)
    }
}

/// Argument for a message template, formatted at render time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DiagnosticArg {
    Type(TypeId),
    String(Arc<str>),
    Number(u32),
}

impl From<TypeId> for DiagnosticArg {
    fn from(v: TypeId) -> Self {
        Self::Type(v)
    }
}

impl From<&str> for DiagnosticArg {
    fn from(s: &str) -> Self {
        Self::String(s.into())
    }
}

impl From<String> for DiagnosticArg {
    fn from(s: String) -> Self {
        Self::String(s.into())
    }
}

impl From<u32> for DiagnosticArg {
    fn from(v: u32) -> Self {
        Self::Number(v)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub severity: DiagnosticCategory,
    pub args: Vec<DiagnosticArg>,
    /// Types the finding is about, in message order.
    pub subjects: SmallVec<[TypeId; 2]>,
    /// Member path the finding is about, if any.
    pub member: Option<Arc<str>>,
    /// Name of the request (mapper method) being resolved.
    pub context: Option<Arc<str>>,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, args: Vec<DiagnosticArg>) -> Self {
        let subjects = args
            .iter()
            .filter_map(|arg| match arg {
                DiagnosticArg::Type(ty) => Some(*ty),
                _ => None,
            })
            .collect();
        Self {
            kind,
            severity: kind.severity(),
            args,
            subjects,
            member: None,
            context: None,
        }
    }

    pub fn with_member(mut self, member: impl Into<Arc<str>>) -> Self {
        self.member = Some(member.into());
        self
    }

    pub fn code(&self) -> u32 {
        self.kind.code()
    }

    pub fn is_error(&self) -> bool {
        self.severity == DiagnosticCategory::Error
    }

    pub fn message(&self, db: &dyn TypeDatabase) -> String {
        let Some(template) = get_message(self.code()) else {
            return format!("{:?}", self.kind);
        };
        let args: Vec<String> = self
            .args
            .iter()
            .map(|arg| match arg {
                DiagnosticArg::Type(ty) => db.name(*ty).to_string(),
                DiagnosticArg::String(s) => s.to_string(),
                DiagnosticArg::Number(n) => n.to_string(),
            })
            .collect();
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        format_message(template.message, &args)
    }

    pub fn render(&self, db: &dyn TypeDatabase) -> RenderedDiagnostic {
        RenderedDiagnostic {
            code: display_code(self.code()),
            severity: self.severity,
            message: self.message(db),
            member: self.member.as_deref().map(str::to_string),
            context: self.context.as_deref().map(str::to_string),
        }
    }
}

/// Formatted diagnostic, ready for display or JSON output.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RenderedDiagnostic {
    pub code: String,
    pub severity: DiagnosticCategory,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub member: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

/// Append-only collection of findings for one mapper.
#[derive(Clone, Debug, Default)]
pub struct DiagnosticSink {
    items: Vec<Diagnostic>,
    context: Option<Arc<str>>,
}

impl DiagnosticSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the request name attached to subsequently reported findings.
    pub fn set_context(&mut self, context: Option<Arc<str>>) {
        self.context = context;
    }

    pub fn push(&mut self, mut diagnostic: Diagnostic) {
        if diagnostic.context.is_none() {
            diagnostic.context = self.context.clone();
        }
        tracing::debug!(
            code = %display_code(diagnostic.code()),
            kind = ?diagnostic.kind,
            "diagnostic reported"
        );
        self.items.push(diagnostic);
    }

    pub fn report(&mut self, kind: DiagnosticKind, args: Vec<DiagnosticArg>) {
        self.push(Diagnostic::new(kind, args));
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn has_errors(&self) -> bool {
        self.items.iter().any(Diagnostic::is_error)
    }

    pub fn count_of(&self, kind: DiagnosticKind) -> usize {
        self.items.iter().filter(|d| d.kind == kind).count()
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.items
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::TypeStore;

    #[test]
    fn test_message_formats_type_names_lazily() {
        let mut store = TypeStore::new();
        let car = store.class("Car");
        let dto = store.class("CarDto");
        let diagnostic = Diagnostic::new(
            DiagnosticKind::CouldNotCreateMapping,
            vec![car.into(), dto.into()],
        );
        assert_eq!(
            diagnostic.message(&store),
            "Could not create mapping from Car to CarDto"
        );
        assert_eq!(diagnostic.subjects.as_slice(), &[car, dto]);
        assert!(diagnostic.is_error());
    }

    #[test]
    fn test_sink_attaches_context_and_counts() {
        let mut sink = DiagnosticSink::new();
        sink.set_context(Some("MapCar".into()));
        sink.report(DiagnosticKind::UnmappedSourceMember, vec!["Ident".into()]);
        sink.report(DiagnosticKind::UnmappedSourceMember, vec!["Other".into()]);
        assert_eq!(sink.count_of(DiagnosticKind::UnmappedSourceMember), 2);
        assert!(!sink.has_errors());
        assert_eq!(
            sink.iter().next().and_then(|d| d.context.as_deref()),
            Some("MapCar")
        );
    }

    #[test]
    fn test_rendered_code_is_displayed_with_prefix() {
        let store = TypeStore::new();
        let rendered = Diagnostic::new(DiagnosticKind::MappingDepthExceeded, vec![
            TypeId::INT.into(),
            TypeId::STRING.into(),
            128u32.into(),
        ])
        .render(&store);
        assert_eq!(rendered.code, "SM0016");
        assert!(rendered.message.ends_with("depth of 128"));
    }
}
