//! Mapper defaults, per-request directives and the effective configuration
//! a builder sees.
//!
//! `MapperConfig::for_request` and `MappingConfiguration::descend` are pure
//! functions over plain data; nothing here touches the type universe except
//! through the `TypeId`s carried by derived-type pairs.

use crate::types::{NameComparison, TypeId};
use bitflags::bitflags;
use serde::{Deserialize, Deserializer};
use std::collections::BTreeSet;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EnumMappingStrategy {
    #[default]
    ByValue,
    ByName,
}

bitflags! {
    /// Conversion families a mapper may use.
    #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
    pub struct MappingConversions: u32 {
        const IMPLICIT_CAST = 1 << 0;
        const EXPLICIT_CAST = 1 << 1;
        const PARSE = 1 << 2;
        const TO_STRING = 1 << 3;
        const CONSTRUCTOR = 1 << 4;
        const ENUM_TO_STRING = 1 << 5;
        const STRING_TO_ENUM = 1 << 6;
        const ENUM_TO_ENUM = 1 << 7;
        const DATE_TIME = 1 << 8;
        const QUERYABLE = 1 << 9;
        const ENUMERABLE = 1 << 10;
        const DICTIONARY = 1 << 11;
    }
}

/// Serialized names of the conversion families.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MappingConversionType {
    ImplicitCast,
    ExplicitCast,
    Parse,
    ToString,
    Constructor,
    EnumToString,
    StringToEnum,
    EnumToEnum,
    DateTime,
    Queryable,
    Enumerable,
    Dictionary,
}

impl From<MappingConversionType> for MappingConversions {
    fn from(value: MappingConversionType) -> Self {
        match value {
            MappingConversionType::ImplicitCast => Self::IMPLICIT_CAST,
            MappingConversionType::ExplicitCast => Self::EXPLICIT_CAST,
            MappingConversionType::Parse => Self::PARSE,
            MappingConversionType::ToString => Self::TO_STRING,
            MappingConversionType::Constructor => Self::CONSTRUCTOR,
            MappingConversionType::EnumToString => Self::ENUM_TO_STRING,
            MappingConversionType::StringToEnum => Self::STRING_TO_ENUM,
            MappingConversionType::EnumToEnum => Self::ENUM_TO_ENUM,
            MappingConversionType::DateTime => Self::DATE_TIME,
            MappingConversionType::Queryable => Self::QUERYABLE,
            MappingConversionType::Enumerable => Self::ENUMERABLE,
            MappingConversionType::Dictionary => Self::DICTIONARY,
        }
    }
}

fn deserialize_conversions<'de, D>(deserializer: D) -> Result<MappingConversions, D::Error>
where
    D: Deserializer<'de>,
{
    let names = Vec::<MappingConversionType>::deserialize(deserializer)?;
    Ok(names
        .into_iter()
        .fold(MappingConversions::empty(), |acc, name| acc | name.into()))
}

/// Mapper-wide defaults.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MapperConfig {
    pub enum_mapping_strategy: EnumMappingStrategy,
    pub enum_mapping_ignore_case: bool,
    /// Clone every reference-typed value instead of sharing it.
    pub use_deep_cloning: bool,
    #[serde(deserialize_with = "deserialize_conversions")]
    pub enabled_conversions: MappingConversions,
    /// A null source mapped to a non-nullable target throws instead of
    /// yielding the target's default value.
    pub throw_on_mapping_null_mismatch: bool,
    pub member_name_comparison: NameComparison,
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            enum_mapping_strategy: EnumMappingStrategy::ByValue,
            enum_mapping_ignore_case: false,
            use_deep_cloning: false,
            enabled_conversions: MappingConversions::all(),
            throw_on_mapping_null_mismatch: true,
            member_name_comparison: NameComparison::Exact,
        }
    }
}

/// Source path to target path rename, each a sequence of member names.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct MemberRename {
    pub source: Vec<String>,
    pub target: Vec<String>,
}

impl MemberRename {
    /// Builds a rename from dotted paths (`"Manufacturer.Name"`).
    pub fn new(source: &str, target: &str) -> Self {
        Self {
            source: split_path(source),
            target: split_path(target),
        }
    }

    pub fn source_name(&self) -> String {
        self.source.join(".")
    }

    pub fn target_name(&self) -> String {
        self.target.join(".")
    }
}

pub fn split_path(path: &str) -> Vec<String> {
    path.split('.')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct DerivedTypePair {
    pub source: TypeId,
    pub target: TypeId,
}

/// Overrides declared on one mapping request.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RequestDirectives {
    pub enum_mapping_strategy: Option<EnumMappingStrategy>,
    pub enum_mapping_ignore_case: Option<bool>,
    pub ignore_source: Vec<String>,
    pub ignore_target: Vec<String>,
    /// Deprecated single-purpose ignore; applies to target members.
    pub ignore: Vec<String>,
    pub renames: Vec<MemberRename>,
    pub derived_types: Vec<DerivedTypePair>,
}

/// Effective configuration seen by the builder chain for one type pair.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct MappingConfiguration {
    pub enum_strategy: EnumMappingStrategy,
    pub enum_ignore_case: bool,
    pub ignored_source: BTreeSet<String>,
    pub ignored_target: BTreeSet<String>,
    pub renames: Vec<MemberRename>,
    /// Declaration order; duplicates are kept so they can be reported.
    pub derived_types: Vec<DerivedTypePair>,
    /// The request pair the derived types were declared for.
    pub declared: Option<(TypeId, TypeId)>,
}

impl MapperConfig {
    /// Configuration used for pairs no request directive applies to.
    pub fn default_configuration(&self) -> MappingConfiguration {
        MappingConfiguration {
            enum_strategy: self.enum_mapping_strategy,
            enum_ignore_case: self.enum_mapping_ignore_case,
            ..MappingConfiguration::default()
        }
    }

    /// Merges mapper defaults with the directives of one request.
    pub fn for_request(
        &self,
        directives: &RequestDirectives,
        source: TypeId,
        target: TypeId,
    ) -> MappingConfiguration {
        MappingConfiguration {
            enum_strategy: directives
                .enum_mapping_strategy
                .unwrap_or(self.enum_mapping_strategy),
            enum_ignore_case: directives
                .enum_mapping_ignore_case
                .unwrap_or(self.enum_mapping_ignore_case),
            ignored_source: directives.ignore_source.iter().cloned().collect(),
            ignored_target: directives
                .ignore_target
                .iter()
                .chain(&directives.ignore)
                .cloned()
                .collect(),
            renames: directives.renames.clone(),
            derived_types: directives.derived_types.clone(),
            declared: Some((source, target)),
        }
    }

    #[inline]
    pub fn allows(&self, conversions: MappingConversions) -> bool {
        self.enabled_conversions.contains(conversions)
    }
}

impl MappingConfiguration {
    /// Scopes the configuration to a nested member pair.
    ///
    /// Ignore entries under `source_path.` / `target_path.` lose that prefix,
    /// every other entry is dropped. Renames and derived pairs never carry
    /// over, so nested scopes without ignores intern to the same
    /// configuration whichever request they were reached from.
    pub fn descend(&self, source_path: &str, target_path: &str) -> MappingConfiguration {
        MappingConfiguration {
            enum_strategy: self.enum_strategy,
            enum_ignore_case: self.enum_ignore_case,
            ignored_source: strip_prefix(&self.ignored_source, source_path),
            ignored_target: strip_prefix(&self.ignored_target, target_path),
            renames: Vec::new(),
            derived_types: Vec::new(),
            declared: None,
        }
    }

    /// Derived pairs apply only to the pair they were declared for.
    pub fn derived_types_for(&self, source: TypeId, target: TypeId) -> &[DerivedTypePair] {
        if self.declared == Some((source, target)) {
            &self.derived_types
        } else {
            &[]
        }
    }

    /// Ignored source names that address a member of the current level.
    pub fn root_ignored_source(&self) -> impl Iterator<Item = &str> {
        self.ignored_source
            .iter()
            .filter(|entry| !entry.contains('.'))
            .map(String::as_str)
    }

    pub fn is_source_ignored(&self, name: &str) -> bool {
        self.ignored_source.contains(name)
    }

    pub fn is_target_ignored(&self, name: &str) -> bool {
        self.ignored_target.contains(name)
    }
}

fn strip_prefix(entries: &BTreeSet<String>, path: &str) -> BTreeSet<String> {
    let prefix = format!("{path}.");
    entries
        .iter()
        .filter_map(|entry| entry.strip_prefix(&prefix))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
#[path = "../tests/config_tests.rs"]
mod config_tests;
