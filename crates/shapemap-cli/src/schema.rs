//! JSON input: the type universe plus mapper declarations.
//!
//! Types are declared in two passes so members, bases and constructor
//! parameters may refer to types declared later in the file. Type
//! references use the usual surface syntax: `List<Car>`, `int?`, `Car[]`,
//! `Dictionary<string, List<int>>`.

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use shapemap_solver::config::{
    DerivedTypePair, EnumMappingStrategy, MapperConfig, MemberRename, RequestDirectives,
};
use shapemap_solver::types::TypeKind;
use shapemap_solver::{MapperDeclaration, MappingMethod, TypeDatabase, TypeId, TypeStore, UserMapping};
use std::path::Path;
use tracing::{debug, warn};

/// Stand-in for a user mapping type that does not resolve. It is never a
/// valid store index, so the engine reports it instead of failing the load.
pub const UNKNOWN_TYPE: TypeId = TypeId(u32::MAX);

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SchemaFile {
    /// Whether generated code may call `Enumerable.TryGetNonEnumeratedCount`.
    pub non_enumerated_count: bool,
    pub types: Vec<TypeDecl>,
    pub mappers: Vec<MapperDecl>,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TypeDeclKind {
    #[default]
    Class,
    Struct,
    Interface,
    Enum,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeDecl {
    pub name: String,
    #[serde(default)]
    pub kind: TypeDeclKind,
    #[serde(default)]
    pub base: Option<String>,
    #[serde(default)]
    pub interfaces: Vec<String>,
    #[serde(default)]
    pub members: Vec<MemberDecl>,
    /// Absent: the implicit parameterless constructor. Empty: none at all.
    #[serde(default)]
    pub constructors: Option<Vec<Vec<ParamDecl>>>,
    #[serde(default)]
    pub values: Vec<EnumValueDecl>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberDecl {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
    #[serde(default)]
    pub read_only: bool,
}

#[derive(Debug, Deserialize)]
pub struct ParamDecl {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
}

#[derive(Debug, Deserialize)]
pub struct EnumValueDecl {
    pub name: String,
    /// Defaults to the declaration index.
    #[serde(default)]
    pub value: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapperDecl {
    pub name: String,
    #[serde(default)]
    pub config: MapperConfig,
    #[serde(default)]
    pub methods: Vec<MethodDecl>,
    #[serde(default)]
    pub user_mappings: Vec<UserMappingDecl>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodDecl {
    pub name: String,
    pub source: String,
    pub target: String,
    #[serde(default)]
    pub existing_target: bool,
    #[serde(default)]
    pub directives: DirectivesDecl,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DirectivesDecl {
    pub enum_mapping_strategy: Option<EnumMappingStrategy>,
    pub enum_mapping_ignore_case: Option<bool>,
    pub ignore_source: Vec<String>,
    pub ignore_target: Vec<String>,
    pub ignore: Vec<String>,
    pub renames: Vec<PairDecl>,
    pub derived_types: Vec<PairDecl>,
}

/// `{ "source": ..., "target": ... }`: member paths for renames, type
/// references for derived types.
#[derive(Debug, Deserialize)]
pub struct PairDecl {
    pub source: String,
    pub target: String,
}

#[derive(Debug, Deserialize)]
pub struct UserMappingDecl {
    pub name: String,
    pub source: String,
    pub target: String,
}

/// A loaded input: the populated store and every mapper declaration.
pub struct Workspace {
    pub store: TypeStore,
    pub mappers: Vec<MapperDeclaration>,
}

pub fn load(path: &Path) -> Result<Workspace> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    parse(&text).with_context(|| format!("invalid mapper description in {}", path.display()))
}

pub fn parse(text: &str) -> Result<Workspace> {
    let schema: SchemaFile = serde_json::from_str(text).context("malformed JSON")?;
    build(schema)
}

pub fn build(schema: SchemaFile) -> Result<Workspace> {
    let mut store = TypeStore::new();
    store.set_non_enumerated_count(schema.non_enumerated_count);

    let mut declared = Vec::with_capacity(schema.types.len());
    for decl in &schema.types {
        declared.push(declare(&mut store, decl)?);
    }
    for (decl, &id) in schema.types.iter().zip(&declared) {
        define(&mut store, decl, id).with_context(|| format!("in type `{}`", decl.name))?;
    }

    let mut mappers = Vec::with_capacity(schema.mappers.len());
    for decl in schema.mappers {
        let name = decl.name.clone();
        mappers.push(mapper(&mut store, decl).with_context(|| format!("in mapper `{name}`"))?);
    }
    debug!(types = store.len(), mappers = mappers.len(), "schema loaded");
    Ok(Workspace { store, mappers })
}

fn declare(store: &mut TypeStore, decl: &TypeDecl) -> Result<TypeId> {
    if store.by_name(&decl.name).is_some() {
        bail!("type `{}` is declared more than once", decl.name);
    }
    if decl.kind != TypeDeclKind::Enum && !decl.values.is_empty() {
        bail!("type `{}` has enum values but is not an enum", decl.name);
    }
    Ok(match decl.kind {
        TypeDeclKind::Class => store.class(&decl.name),
        TypeDeclKind::Struct => store.struct_type(&decl.name),
        TypeDeclKind::Interface => store.interface(&decl.name),
        TypeDeclKind::Enum => {
            let values: Vec<(&str, i64)> = decl
                .values
                .iter()
                .enumerate()
                .map(|(i, v)| (v.name.as_str(), v.value.unwrap_or(i as i64)))
                .collect();
            store.enumeration(&decl.name, &values)
        }
    })
}

fn define(store: &mut TypeStore, decl: &TypeDecl, id: TypeId) -> Result<()> {
    if let Some(base) = &decl.base {
        let base = resolve_type(store, base)?;
        store.extend(id, base);
    }
    for interface in &decl.interfaces {
        let interface = resolve_type(store, interface)?;
        store.implement(id, interface);
    }
    for member in &decl.members {
        let ty = resolve_type(store, &member.ty)
            .with_context(|| format!("in member `{}`", member.name))?;
        if member.read_only {
            store.read_only_property(id, &member.name, ty);
        } else {
            store.property(id, &member.name, ty);
        }
    }
    match &decl.constructors {
        None => {}
        Some(constructors) if constructors.is_empty() => {
            store.without_constructors(id);
        }
        Some(constructors) => {
            for params in constructors {
                let mut resolved = Vec::with_capacity(params.len());
                for param in params {
                    let ty = resolve_type(store, &param.ty)
                        .with_context(|| format!("in constructor parameter `{}`", param.name))?;
                    resolved.push((param.name.as_str(), ty));
                }
                store.constructor(id, &resolved);
            }
        }
    }
    Ok(())
}

fn mapper(store: &mut TypeStore, decl: MapperDecl) -> Result<MapperDeclaration> {
    let mut methods = Vec::with_capacity(decl.methods.len());
    for method in decl.methods {
        let context = || format!("in method `{}`", method.name);
        let source = resolve_type(store, &method.source).with_context(context)?;
        let target = resolve_type(store, &method.target).with_context(context)?;
        let directives = directives(store, &method.directives).with_context(context)?;
        methods.push(MappingMethod {
            directives,
            existing_target: method.existing_target,
            ..MappingMethod::new(&method.name, source, target)
        });
    }

    let user_mappings = decl
        .user_mappings
        .into_iter()
        .map(|user| UserMapping {
            source: resolve_lenient(store, &user.name, &user.source),
            target: resolve_lenient(store, &user.name, &user.target),
            name: user.name,
        })
        .collect();

    Ok(MapperDeclaration {
        name: decl.name,
        config: decl.config,
        methods,
        user_mappings,
    })
}

fn directives(store: &mut TypeStore, decl: &DirectivesDecl) -> Result<RequestDirectives> {
    let mut derived_types = Vec::with_capacity(decl.derived_types.len());
    for pair in &decl.derived_types {
        derived_types.push(DerivedTypePair {
            source: resolve_type(store, &pair.source)?,
            target: resolve_type(store, &pair.target)?,
        });
    }
    Ok(RequestDirectives {
        enum_mapping_strategy: decl.enum_mapping_strategy,
        enum_mapping_ignore_case: decl.enum_mapping_ignore_case,
        ignore_source: decl.ignore_source.clone(),
        ignore_target: decl.ignore_target.clone(),
        ignore: decl.ignore.clone(),
        renames: decl
            .renames
            .iter()
            .map(|pair| MemberRename::new(&pair.source, &pair.target))
            .collect(),
        derived_types,
    })
}

/// User mappings may name types the input never declares; the engine
/// reports those.
fn resolve_lenient(store: &mut TypeStore, method: &str, text: &str) -> TypeId {
    match resolve_type(store, text) {
        Ok(id) => id,
        Err(err) => {
            warn!(method, ty = text, error = %err, "unresolved user mapping type");
            UNKNOWN_TYPE
        }
    }
}

/// Resolves a type reference, instantiating generics, arrays and nullables
/// as needed.
pub fn resolve_type(store: &mut TypeStore, text: &str) -> Result<TypeId> {
    let mut parser = TypeRefParser { text, pos: 0 };
    let id = parser.parse(store)?;
    parser.skip_whitespace();
    if parser.pos != text.len() {
        bail!("unexpected `{}` in type `{text}`", &text[parser.pos..]);
    }
    Ok(id)
}

struct TypeRefParser<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> TypeRefParser<'a> {
    fn parse(&mut self, store: &mut TypeStore) -> Result<TypeId> {
        self.skip_whitespace();
        let name = self.identifier();
        if name.is_empty() {
            bail!("expected a type name in `{}`", self.text);
        }
        let Some(mut id) = store.by_name(name) else {
            bail!("unknown type `{name}`");
        };

        if self.eat('<') {
            let mut args = vec![self.parse(store)?];
            while self.eat(',') {
                args.push(self.parse(store)?);
            }
            if !self.eat('>') {
                bail!("unclosed type arguments in `{}`", self.text);
            }
            let TypeKind::GenericDefinition { arity } = *store.kind(id) else {
                bail!("`{name}` is not generic");
            };
            if usize::from(arity) != args.len() {
                bail!("`{name}` takes {arity} type argument(s), got {}", args.len());
            }
            id = store.instantiate(id, &args);
        } else if matches!(store.kind(id), TypeKind::GenericDefinition { .. }) {
            bail!("`{name}` needs type arguments");
        }

        loop {
            if self.eat('?') {
                id = store.nullable(id);
            } else if self.eat('[') {
                if !self.eat(']') {
                    bail!("expected `]` in `{}`", self.text);
                }
                id = store.array(id);
            } else {
                return Ok(id);
            }
        }
    }

    fn identifier(&mut self) -> &'a str {
        let text = self.text;
        let start = self.pos;
        let rest = &text[start..];
        let len = rest
            .find(|c: char| !(c.is_alphanumeric() || c == '_' || c == '.'))
            .unwrap_or(rest.len());
        self.pos += len;
        &text[start..self.pos]
    }

    fn eat(&mut self, expected: char) -> bool {
        self.skip_whitespace();
        if self.text[self.pos..].starts_with(expected) {
            self.pos += expected.len_utf8();
            true
        } else {
            false
        }
    }

    fn skip_whitespace(&mut self) {
        let rest = &self.text[self.pos..];
        self.pos += rest.len() - rest.trim_start().len();
    }
}

#[cfg(test)]
#[path = "../tests/schema_tests.rs"]
mod schema_tests;
