//! In-memory type universe.
//!
//! `TypeStore` is an arena of [`TypeData`] that implements [`TypeDatabase`].
//! It comes pre-populated with the primitives, the date/time types and the
//! well-known collection catalog; callers add their own classes, structs,
//! interfaces and enums on top.
//!
//! Generic definitions are stored as templates and instantiated on demand.
//! Instantiations, nullable wrappers and array types are interned, so the
//! same structural type always has the same `TypeId`.

use crate::db::TypeDatabase;
use crate::types::{
    ConstructorInfo, EnumMember, EnumShape, MemberInfo, MethodInfo, ParameterInfo, PrimitiveKind,
    TypeData, TypeId, TypeKind, WellKnownType,
};
use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;
use std::sync::Arc;
use tracing::trace;

/// A type expression inside a generic definition.
#[derive(Clone, Debug)]
enum TypeTemplate {
    Param(u8),
    Concrete(TypeId),
    Generic(TypeId, Vec<TypeTemplate>),
}

const T: TypeTemplate = TypeTemplate::Param(0);
const K: TypeTemplate = TypeTemplate::Param(0);
const V: TypeTemplate = TypeTemplate::Param(1);
const INT: TypeTemplate = TypeTemplate::Concrete(TypeId::INT);
const BOOL: TypeTemplate = TypeTemplate::Concrete(TypeId::BOOL);

fn generic(definition: TypeId, args: Vec<TypeTemplate>) -> TypeTemplate {
    TypeTemplate::Generic(definition, args)
}

#[derive(Clone, Debug)]
struct GenericTemplate {
    kind: TypeKind,
    interfaces: Vec<TypeTemplate>,
    members: Vec<(Arc<str>, TypeTemplate, bool)>,
    methods: Vec<(Arc<str>, Vec<TypeTemplate>, Option<TypeTemplate>)>,
    constructors: Vec<Vec<(Arc<str>, TypeTemplate)>>,
}

impl GenericTemplate {
    fn new(kind: TypeKind) -> Self {
        Self {
            kind,
            interfaces: Vec::new(),
            members: Vec::new(),
            methods: Vec::new(),
            constructors: Vec::new(),
        }
    }

    fn interface() -> Self {
        Self::new(TypeKind::Interface)
    }

    fn class() -> Self {
        Self::new(TypeKind::Class)
    }

    fn implements(mut self, interfaces: impl IntoIterator<Item = TypeTemplate>) -> Self {
        self.interfaces.extend(interfaces);
        self
    }

    fn property(mut self, name: &str, ty: TypeTemplate, writable: bool) -> Self {
        self.members.push((name.into(), ty, writable));
        self
    }

    fn method(mut self, name: &str, params: Vec<TypeTemplate>, returns: Option<TypeTemplate>) -> Self {
        self.methods.push((name.into(), params, returns));
        self
    }

    fn constructor(mut self, params: Vec<(&str, TypeTemplate)>) -> Self {
        self.constructors
            .push(params.into_iter().map(|(n, t)| (n.into(), t)).collect());
        self
    }

    /// Mutable sequence shape: `Count`, an insertion method, an optional
    /// `EnsureCapacity(int) -> int` and a parameterless constructor.
    fn mutable_sequence(self, insert: &str, insert_returns: Option<TypeTemplate>, ensure_capacity: bool) -> Self {
        let template = self
            .property("Count", INT, false)
            .method(insert, vec![T], insert_returns)
            .constructor(Vec::new());
        if ensure_capacity {
            template.method("EnsureCapacity", vec![INT], Some(INT))
        } else {
            template
        }
    }
}

/// Arena-backed [`TypeDatabase`] implementation.
pub struct TypeStore {
    types: Vec<TypeData>,
    templates: FxHashMap<TypeId, GenericTemplate>,
    instances: FxHashMap<(TypeId, SmallVec<[TypeId; 2]>), TypeId>,
    nullables: FxHashMap<TypeId, TypeId>,
    arrays: FxHashMap<TypeId, TypeId>,
    well_known: FxHashMap<WellKnownType, TypeId>,
    by_name: FxHashMap<Arc<str>, TypeId>,
    /// Types whose constructor list is still the implicit default one.
    implicit_constructor: FxHashSet<TypeId>,
    non_enumerated_count: bool,
}

impl Default for TypeStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeStore {
    pub fn new() -> Self {
        let mut store = Self {
            types: Vec::with_capacity(128),
            templates: FxHashMap::default(),
            instances: FxHashMap::default(),
            nullables: FxHashMap::default(),
            arrays: FxHashMap::default(),
            well_known: FxHashMap::default(),
            by_name: FxHashMap::default(),
            implicit_constructor: FxHashSet::default(),
            non_enumerated_count: false,
        };
        store.register_primitives();
        store.register_catalog();
        store.register_scalar_helpers();
        store
    }

    /// Number of types in the arena.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Looks up a declared type, primitive or generic definition by name.
    pub fn by_name(&self, name: &str) -> Option<TypeId> {
        self.by_name.get(name).copied()
    }

    /// Controls whether generated code may use `TryGetNonEnumeratedCount`.
    pub fn set_non_enumerated_count(&mut self, available: bool) {
        self.non_enumerated_count = available;
    }

    // ------------------------------------------------------------------
    // Declarations
    // ------------------------------------------------------------------

    /// Declares a class with an implicit parameterless constructor.
    pub fn class(&mut self, name: &str) -> TypeId {
        let id = self.declare(name, TypeKind::Class);
        self.types[id.index()].constructors.push(ConstructorInfo::default());
        self.implicit_constructor.insert(id);
        id
    }

    pub fn struct_type(&mut self, name: &str) -> TypeId {
        self.declare(name, TypeKind::Struct)
    }

    pub fn interface(&mut self, name: &str) -> TypeId {
        self.declare(name, TypeKind::Interface)
    }

    pub fn enumeration(&mut self, name: &str, members: &[(&str, i64)]) -> TypeId {
        let shape = EnumShape {
            underlying: PrimitiveKind::Int32,
            members: members
                .iter()
                .map(|(name, value)| EnumMember {
                    name: (*name).into(),
                    value: *value,
                })
                .collect(),
        };
        self.declare(name, TypeKind::Enum(shape))
    }

    fn declare(&mut self, name: &str, kind: TypeKind) -> TypeId {
        let id = self.push(TypeData::new(name, kind));
        self.by_name.insert(name.into(), id);
        id
    }

    fn push(&mut self, data: TypeData) -> TypeId {
        let id = TypeId(self.types.len() as u32);
        self.types.push(data);
        id
    }

    /// Adds a readable and writable member.
    pub fn property(&mut self, owner: TypeId, name: &str, ty: TypeId) -> &mut Self {
        self.add_member(owner, name, ty, true)
    }

    /// Adds a get-only member.
    pub fn read_only_property(&mut self, owner: TypeId, name: &str, ty: TypeId) -> &mut Self {
        self.add_member(owner, name, ty, false)
    }

    fn add_member(&mut self, owner: TypeId, name: &str, ty: TypeId, writable: bool) -> &mut Self {
        self.types[owner.index()].members.push(MemberInfo {
            name: name.into(),
            ty,
            declaring: owner,
            readable: true,
            writable,
        });
        self
    }

    pub fn method(&mut self, owner: TypeId, method: MethodInfo) -> &mut Self {
        self.types[owner.index()].methods.push(method);
        self
    }

    /// Adds an accessible constructor. The first explicit constructor
    /// replaces the implicit parameterless one.
    pub fn constructor(&mut self, owner: TypeId, params: &[(&str, TypeId)]) -> &mut Self {
        if self.implicit_constructor.remove(&owner) {
            self.types[owner.index()].constructors.clear();
        }
        self.types[owner.index()].constructors.push(ConstructorInfo {
            params: params
                .iter()
                .map(|(name, ty)| ParameterInfo {
                    name: (*name).into(),
                    ty: *ty,
                })
                .collect(),
        });
        self
    }

    /// Removes every constructor (abstract classes, factories only).
    pub fn without_constructors(&mut self, owner: TypeId) -> &mut Self {
        self.implicit_constructor.remove(&owner);
        self.types[owner.index()].constructors.clear();
        self
    }

    pub fn extend(&mut self, ty: TypeId, base: TypeId) -> &mut Self {
        self.types[ty.index()].base = Some(base);
        self
    }

    pub fn implement(&mut self, ty: TypeId, interface: TypeId) -> &mut Self {
        self.types[ty.index()].interfaces.push(interface);
        self
    }

    // ------------------------------------------------------------------
    // Interned constructed types
    // ------------------------------------------------------------------

    pub fn nullable(&mut self, ty: TypeId) -> TypeId {
        if self.is_nullable(ty) {
            return ty;
        }
        if let Some(&id) = self.nullables.get(&ty) {
            return id;
        }
        let name = format!("{}?", self.name(ty));
        let id = self.push(TypeData::new(name, TypeKind::Nullable(ty)));
        self.nullables.insert(ty, id);
        id
    }

    pub fn array(&mut self, element: TypeId) -> TypeId {
        if let Some(&id) = self.arrays.get(&element) {
            return id;
        }
        let interfaces = [
            WellKnownType::IList,
            WellKnownType::Collection,
            WellKnownType::ReadOnlyList,
            WellKnownType::ReadOnlyCollection,
            WellKnownType::Enumerable,
        ]
        .into_iter()
        .map(|which| self.generic(which, &[element]))
        .collect();
        let name = format!("{}[]", self.name(element));
        let mut data = TypeData::new(name, TypeKind::Array(element));
        data.interfaces = interfaces;
        let id = self.push(data);
        self.add_member(id, "Length", TypeId::INT, false);
        self.arrays.insert(element, id);
        id
    }

    /// Instantiates a well-known generic definition.
    pub fn generic(&mut self, which: WellKnownType, args: &[TypeId]) -> TypeId {
        let definition = self.well_known[&which];
        self.instantiate(definition, args)
    }

    /// Instantiates a generic definition with concrete arguments.
    pub fn instantiate(&mut self, definition: TypeId, args: &[TypeId]) -> TypeId {
        let key = (definition, args.iter().copied().collect::<SmallVec<[TypeId; 2]>>());
        if let Some(&id) = self.instances.get(&key) {
            return id;
        }
        let Some(template) = self.templates.get(&definition).cloned() else {
            debug_assert!(false, "{} is not a generic definition", self.name(definition));
            return definition;
        };

        let arg_names: Vec<&str> = args.iter().map(|&a| self.name(a)).collect();
        let name = format!("{}<{}>", self.name(definition), arg_names.join(", "));
        let mut data = TypeData::new(name, template.kind.clone());
        data.definition = Some(definition);
        data.type_args = key.1.clone();
        let id = self.push(data);
        self.instances.insert(key, id);
        trace!(id = id.0, name = %self.name(id), "instantiated generic");

        let interfaces = template
            .interfaces
            .iter()
            .map(|t| self.substitute(t, args))
            .collect();
        let members = template
            .members
            .iter()
            .map(|(name, ty, writable)| MemberInfo {
                name: name.clone(),
                ty: self.substitute(ty, args),
                declaring: id,
                readable: true,
                writable: *writable,
            })
            .collect();
        let methods = template
            .methods
            .iter()
            .map(|(name, params, returns)| MethodInfo {
                name: name.clone(),
                params: params.iter().map(|p| self.substitute(p, args)).collect(),
                returns: returns.as_ref().map(|r| self.substitute(r, args)),
                is_static: false,
            })
            .collect();
        let constructors = template
            .constructors
            .iter()
            .map(|params| ConstructorInfo {
                params: params
                    .iter()
                    .map(|(name, ty)| ParameterInfo {
                        name: name.clone(),
                        ty: self.substitute(ty, args),
                    })
                    .collect(),
            })
            .collect();

        let data = &mut self.types[id.index()];
        data.interfaces = interfaces;
        data.members = members;
        data.methods = methods;
        data.constructors = constructors;
        id
    }

    fn substitute(&mut self, template: &TypeTemplate, args: &[TypeId]) -> TypeId {
        match template {
            TypeTemplate::Param(index) => args
                .get(usize::from(*index))
                .copied()
                .unwrap_or(TypeId::OBJECT),
            TypeTemplate::Concrete(id) => *id,
            TypeTemplate::Generic(definition, inner) => {
                let resolved: SmallVec<[TypeId; 2]> =
                    inner.iter().map(|t| self.substitute(t, args)).collect();
                self.instantiate(*definition, &resolved)
            }
        }
    }

    // ------------------------------------------------------------------
    // Built-in registration
    // ------------------------------------------------------------------

    fn register_primitives(&mut self) {
        for kind in PrimitiveKind::ALL {
            self.declare(kind.name(), TypeKind::Primitive(kind));
        }
        debug_assert_eq!(self.types.len() as u32, TypeId::PRIMITIVE_COUNT);
    }

    fn define(&mut self, which: WellKnownType, name: &str, arity: u8, template: GenericTemplate) -> TypeId {
        let id = self.declare(name, TypeKind::GenericDefinition { arity });
        self.templates.insert(id, template);
        self.well_known.insert(which, id);
        id
    }

    fn register_catalog(&mut self) {
        use WellKnownType as W;

        let enumerable = self.define(W::Enumerable, "IEnumerable", 1, GenericTemplate::interface());
        let seq = |def: TypeId| generic(def, vec![T]);

        let ro_collection = self.define(
            W::ReadOnlyCollection,
            "IReadOnlyCollection",
            1,
            GenericTemplate::interface()
                .implements([seq(enumerable)])
                .property("Count", INT, false),
        );
        let collection = self.define(
            W::Collection,
            "ICollection",
            1,
            GenericTemplate::interface()
                .implements([seq(enumerable)])
                .property("Count", INT, false)
                .method("Add", vec![T], None),
        );
        let ilist = self.define(
            W::IList,
            "IList",
            1,
            GenericTemplate::interface().implements([seq(collection), seq(enumerable)]),
        );
        let ro_list = self.define(
            W::ReadOnlyList,
            "IReadOnlyList",
            1,
            GenericTemplate::interface().implements([seq(ro_collection), seq(enumerable)]),
        );
        let iset = self.define(
            W::ISet,
            "ISet",
            1,
            GenericTemplate::interface()
                .implements([seq(collection), seq(enumerable)])
                .method("Add", vec![T], Some(BOOL)),
        );
        let ro_set = self.define(
            W::ReadOnlySet,
            "IReadOnlySet",
            1,
            GenericTemplate::interface().implements([seq(ro_collection), seq(enumerable)]),
        );

        self.define(
            W::List,
            "List",
            1,
            GenericTemplate::class()
                .implements([
                    seq(ilist),
                    seq(collection),
                    seq(ro_list),
                    seq(ro_collection),
                    seq(enumerable),
                ])
                .mutable_sequence("Add", None, true)
                .constructor(vec![("capacity", INT)]),
        );
        self.define(
            W::Stack,
            "Stack",
            1,
            GenericTemplate::class()
                .implements([seq(ro_collection), seq(enumerable)])
                .mutable_sequence("Push", None, true),
        );
        self.define(
            W::Queue,
            "Queue",
            1,
            GenericTemplate::class()
                .implements([seq(ro_collection), seq(enumerable)])
                .mutable_sequence("Enqueue", None, true),
        );
        let set_interfaces = [
            seq(iset),
            seq(ro_set),
            seq(collection),
            seq(ro_collection),
            seq(enumerable),
        ];
        self.define(
            W::HashSet,
            "HashSet",
            1,
            GenericTemplate::class()
                .implements(set_interfaces.clone())
                .mutable_sequence("Add", Some(BOOL), true),
        );
        self.define(
            W::SortedSet,
            "SortedSet",
            1,
            GenericTemplate::class()
                .implements(set_interfaces)
                .mutable_sequence("Add", Some(BOOL), false),
        );

        let pair_def = self.define(
            W::KeyValuePair,
            "KeyValuePair",
            2,
            GenericTemplate::new(TypeKind::Struct)
                .property("Key", K, false)
                .property("Value", V, false)
                .constructor(vec![("key", K), ("value", V)]),
        );
        let pair = || generic(pair_def, vec![K, V]);
        let entries = |def: TypeId| generic(def, vec![pair()]);
        let map = |def: TypeId| generic(def, vec![K, V]);

        let idictionary = self.define(
            W::IDictionary,
            "IDictionary",
            2,
            GenericTemplate::interface()
                .implements([entries(collection), entries(enumerable)])
                .property("Count", INT, false)
                .method("Add", vec![K, V], None)
                .method("set_Item", vec![K, V], None),
        );
        let ro_dictionary = self.define(
            W::ReadOnlyDictionary,
            "IReadOnlyDictionary",
            2,
            GenericTemplate::interface()
                .implements([entries(ro_collection), entries(enumerable)])
                .property("Count", INT, false),
        );
        self.define(
            W::Dictionary,
            "Dictionary",
            2,
            GenericTemplate::class()
                .implements([
                    map(idictionary),
                    map(ro_dictionary),
                    entries(collection),
                    entries(ro_collection),
                    entries(enumerable),
                ])
                .property("Count", INT, false)
                .method("Add", vec![K, V], None)
                .method("set_Item", vec![K, V], None)
                .method("EnsureCapacity", vec![INT], Some(INT))
                .constructor(Vec::new()),
        );

        let iimmutable_list = self.define(
            W::IImmutableList,
            "IImmutableList",
            1,
            GenericTemplate::interface().implements([
                seq(ro_list),
                seq(ro_collection),
                seq(enumerable),
            ]),
        );
        let list_like = [
            seq(iimmutable_list),
            seq(ilist),
            seq(ro_list),
            seq(collection),
            seq(ro_collection),
            seq(enumerable),
        ];
        self.define(
            W::ImmutableArray,
            "ImmutableArray",
            1,
            GenericTemplate::new(TypeKind::Struct)
                .implements(list_like.clone())
                .property("Length", INT, false),
        );
        self.define(
            W::ImmutableList,
            "ImmutableList",
            1,
            GenericTemplate::class()
                .implements(list_like)
                .property("Count", INT, false),
        );
        let iimmutable_set = self.define(
            W::IImmutableSet,
            "IImmutableSet",
            1,
            GenericTemplate::interface().implements([seq(ro_collection), seq(enumerable)]),
        );
        self.define(
            W::ImmutableHashSet,
            "ImmutableHashSet",
            1,
            GenericTemplate::class()
                .implements([
                    seq(iimmutable_set),
                    seq(ro_set),
                    seq(iset),
                    seq(collection),
                    seq(ro_collection),
                    seq(enumerable),
                ])
                .property("Count", INT, false),
        );
        self.define(
            W::ImmutableSortedSet,
            "ImmutableSortedSet",
            1,
            GenericTemplate::class()
                .implements([
                    seq(iimmutable_set),
                    seq(ilist),
                    seq(ro_list),
                    seq(iset),
                    seq(ro_set),
                    seq(collection),
                    seq(ro_collection),
                    seq(enumerable),
                ])
                .property("Count", INT, false),
        );
        let iimmutable_queue = self.define(
            W::IImmutableQueue,
            "IImmutableQueue",
            1,
            GenericTemplate::interface().implements([seq(enumerable)]),
        );
        self.define(
            W::ImmutableQueue,
            "ImmutableQueue",
            1,
            GenericTemplate::class().implements([seq(iimmutable_queue), seq(enumerable)]),
        );
        let iimmutable_stack = self.define(
            W::IImmutableStack,
            "IImmutableStack",
            1,
            GenericTemplate::interface().implements([seq(enumerable)]),
        );
        self.define(
            W::ImmutableStack,
            "ImmutableStack",
            1,
            GenericTemplate::class().implements([seq(iimmutable_stack), seq(enumerable)]),
        );
        let iimmutable_dictionary = self.define(
            W::IImmutableDictionary,
            "IImmutableDictionary",
            2,
            GenericTemplate::interface().implements([
                map(ro_dictionary),
                entries(ro_collection),
                entries(enumerable),
            ]),
        );
        self.define(
            W::ImmutableDictionary,
            "ImmutableDictionary",
            2,
            GenericTemplate::class()
                .implements([
                    map(iimmutable_dictionary),
                    map(idictionary),
                    map(ro_dictionary),
                    entries(collection),
                    entries(ro_collection),
                    entries(enumerable),
                ])
                .property("Count", INT, false),
        );
        self.define(
            W::ImmutableSortedDictionary,
            "ImmutableSortedDictionary",
            2,
            GenericTemplate::class()
                .implements([
                    map(iimmutable_dictionary),
                    map(ro_dictionary),
                    entries(ro_collection),
                    entries(enumerable),
                ])
                .property("Count", INT, false),
        );

        self.define(
            W::Queryable,
            "IQueryable",
            1,
            GenericTemplate::interface().implements([seq(enumerable)]),
        );
    }

    /// `Parse`, `FromDateTime` and string's character sequence.
    fn register_scalar_helpers(&mut self) {
        let chars = self.generic(WellKnownType::Enumerable, &[TypeId::CHAR]);
        self.implement(TypeId::STRING, chars);
        self.read_only_property(TypeId::STRING, "Length", TypeId::INT);

        for kind in PrimitiveKind::ALL {
            let id = TypeId(kind as u32);
            if kind.is_value_type() {
                self.method(id, MethodInfo::static_method("Parse", &[TypeId::STRING], Some(id)));
            }
        }
        self.method(
            TypeId::DATE_ONLY,
            MethodInfo::static_method("FromDateTime", &[TypeId::DATE_TIME], Some(TypeId::DATE_ONLY)),
        );
        self.method(
            TypeId::TIME_ONLY,
            MethodInfo::static_method("FromDateTime", &[TypeId::DATE_TIME], Some(TypeId::TIME_ONLY)),
        );
    }
}

impl TypeDatabase for TypeStore {
    fn lookup(&self, id: TypeId) -> &TypeData {
        &self.types[id.index()]
    }

    fn contains(&self, id: TypeId) -> bool {
        id.index() < self.types.len()
    }

    fn well_known(&self, which: WellKnownType) -> Option<TypeId> {
        self.well_known.get(&which).copied()
    }

    fn has_non_enumerated_count(&self) -> bool {
        self.non_enumerated_count
    }
}

#[cfg(test)]
#[path = "../tests/store_tests.rs"]
mod store_tests;
