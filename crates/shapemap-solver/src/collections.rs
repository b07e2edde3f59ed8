//! Collection shape classification.
//!
//! [`classify`] turns one type into a [`CollectionInfo`]: the catalog kind
//! it was declared as, every catalog shape it satisfies, its element type and
//! the capabilities the strategy selector cares about. Classification is a
//! pure function of the type and never fails; a type that is not enumerable
//! (or is a string) simply has no collection info.

use crate::db::TypeDatabase;
use crate::types::{TypeId, WellKnownType};
use bitflags::bitflags;

/// Catalog tag of a collection type.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum CollectionKind {
    /// Enumerable, but not one of the catalog shapes.
    Custom,
    Array,
    Enumerable,
    List,
    Stack,
    Queue,
    ReadOnlyCollection,
    IList,
    ReadOnlyList,
    Collection,
    HashSet,
    SortedSet,
    ISet,
    ReadOnlySet,
    IDictionary,
    ReadOnlyDictionary,
    Dictionary,
    ImmutableArray,
    ImmutableList,
    IImmutableList,
    ImmutableHashSet,
    IImmutableSet,
    ImmutableSortedSet,
    ImmutableQueue,
    IImmutableQueue,
    ImmutableStack,
    IImmutableStack,
    IImmutableDictionary,
    ImmutableDictionary,
    ImmutableSortedDictionary,
}

bitflags! {
    /// Set of catalog shapes a type satisfies.
    #[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
    pub struct CollectionKinds: u32 {
        const ARRAY = 1 << 0;
        const ENUMERABLE = 1 << 1;
        const LIST = 1 << 2;
        const STACK = 1 << 3;
        const QUEUE = 1 << 4;
        const READ_ONLY_COLLECTION = 1 << 5;
        const ILIST = 1 << 6;
        const READ_ONLY_LIST = 1 << 7;
        const COLLECTION = 1 << 8;
        const HASH_SET = 1 << 9;
        const SORTED_SET = 1 << 10;
        const ISET = 1 << 11;
        const READ_ONLY_SET = 1 << 12;
        const IDICTIONARY = 1 << 13;
        const READ_ONLY_DICTIONARY = 1 << 14;
        const DICTIONARY = 1 << 15;
        const IMMUTABLE_ARRAY = 1 << 16;
        const IMMUTABLE_LIST = 1 << 17;
        const IIMMUTABLE_LIST = 1 << 18;
        const IMMUTABLE_HASH_SET = 1 << 19;
        const IIMMUTABLE_SET = 1 << 20;
        const IMMUTABLE_SORTED_SET = 1 << 21;
        const IMMUTABLE_QUEUE = 1 << 22;
        const IIMMUTABLE_QUEUE = 1 << 23;
        const IMMUTABLE_STACK = 1 << 24;
        const IIMMUTABLE_STACK = 1 << 25;
        const IIMMUTABLE_DICTIONARY = 1 << 26;
        const IMMUTABLE_DICTIONARY = 1 << 27;
        const IMMUTABLE_SORTED_DICTIONARY = 1 << 28;

        /// Shapes that carry key/value entries.
        const ANY_DICTIONARY = Self::IDICTIONARY.bits()
            | Self::READ_ONLY_DICTIONARY.bits()
            | Self::DICTIONARY.bits()
            | Self::IIMMUTABLE_DICTIONARY.bits()
            | Self::IMMUTABLE_DICTIONARY.bits()
            | Self::IMMUTABLE_SORTED_DICTIONARY.bits();
    }
}

bitflags! {
    #[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
    pub struct CollectionCapabilities: u8 {
        /// Size is available without enumerating.
        const COUNT_KNOWN = 1 << 0;
        /// Exposes a single-element insertion operation.
        const SINGLE_INSERT = 1 << 1;
        const IMMUTABLE = 1 << 2;
    }
}

/// Catalog of known shapes, in match order.
const CATALOG: [(CollectionKind, WellKnownType, bool); 28] = {
    use CollectionKind as C;
    use WellKnownType as W;
    [
        (C::Enumerable, W::Enumerable, false),
        (C::List, W::List, false),
        (C::Stack, W::Stack, false),
        (C::Queue, W::Queue, false),
        (C::ReadOnlyCollection, W::ReadOnlyCollection, false),
        (C::IList, W::IList, false),
        (C::ReadOnlyList, W::ReadOnlyList, false),
        (C::Collection, W::Collection, false),
        (C::HashSet, W::HashSet, false),
        (C::SortedSet, W::SortedSet, false),
        (C::ISet, W::ISet, false),
        (C::ReadOnlySet, W::ReadOnlySet, false),
        (C::IDictionary, W::IDictionary, false),
        (C::ReadOnlyDictionary, W::ReadOnlyDictionary, false),
        (C::Dictionary, W::Dictionary, false),
        (C::ImmutableArray, W::ImmutableArray, true),
        (C::ImmutableList, W::ImmutableList, true),
        (C::IImmutableList, W::IImmutableList, true),
        (C::ImmutableHashSet, W::ImmutableHashSet, true),
        (C::IImmutableSet, W::IImmutableSet, true),
        (C::ImmutableSortedSet, W::ImmutableSortedSet, true),
        (C::ImmutableQueue, W::ImmutableQueue, true),
        (C::IImmutableQueue, W::IImmutableQueue, true),
        (C::ImmutableStack, W::ImmutableStack, true),
        (C::IImmutableStack, W::IImmutableStack, true),
        (C::IImmutableDictionary, W::IImmutableDictionary, true),
        (C::ImmutableDictionary, W::ImmutableDictionary, true),
        (C::ImmutableSortedDictionary, W::ImmutableSortedDictionary, true),
    ]
};

impl CollectionKind {
    /// The single-bit flag of this kind; `Custom` has none.
    pub const fn flag(self) -> CollectionKinds {
        use CollectionKinds as F;
        match self {
            Self::Custom => F::empty(),
            Self::Array => F::ARRAY,
            Self::Enumerable => F::ENUMERABLE,
            Self::List => F::LIST,
            Self::Stack => F::STACK,
            Self::Queue => F::QUEUE,
            Self::ReadOnlyCollection => F::READ_ONLY_COLLECTION,
            Self::IList => F::ILIST,
            Self::ReadOnlyList => F::READ_ONLY_LIST,
            Self::Collection => F::COLLECTION,
            Self::HashSet => F::HASH_SET,
            Self::SortedSet => F::SORTED_SET,
            Self::ISet => F::ISET,
            Self::ReadOnlySet => F::READ_ONLY_SET,
            Self::IDictionary => F::IDICTIONARY,
            Self::ReadOnlyDictionary => F::READ_ONLY_DICTIONARY,
            Self::Dictionary => F::DICTIONARY,
            Self::ImmutableArray => F::IMMUTABLE_ARRAY,
            Self::ImmutableList => F::IMMUTABLE_LIST,
            Self::IImmutableList => F::IIMMUTABLE_LIST,
            Self::ImmutableHashSet => F::IMMUTABLE_HASH_SET,
            Self::IImmutableSet => F::IIMMUTABLE_SET,
            Self::ImmutableSortedSet => F::IMMUTABLE_SORTED_SET,
            Self::ImmutableQueue => F::IMMUTABLE_QUEUE,
            Self::IImmutableQueue => F::IIMMUTABLE_QUEUE,
            Self::ImmutableStack => F::IMMUTABLE_STACK,
            Self::IImmutableStack => F::IIMMUTABLE_STACK,
            Self::IImmutableDictionary => F::IIMMUTABLE_DICTIONARY,
            Self::ImmutableDictionary => F::IMMUTABLE_DICTIONARY,
            Self::ImmutableSortedDictionary => F::IMMUTABLE_SORTED_DICTIONARY,
        }
    }

    /// Shapes every value of this catalog kind satisfies.
    fn implemented(self) -> CollectionKinds {
        use CollectionKinds as F;
        let shapes = match self {
            Self::Custom => F::empty(),
            Self::Array => {
                F::ILIST | F::READ_ONLY_LIST | F::COLLECTION | F::READ_ONLY_COLLECTION
            }
            Self::Enumerable => F::empty(),
            Self::List => {
                F::ILIST | F::READ_ONLY_LIST | F::COLLECTION | F::READ_ONLY_COLLECTION
            }
            Self::Stack | Self::Queue | Self::ReadOnlyCollection => F::READ_ONLY_COLLECTION,
            Self::IList => F::COLLECTION,
            Self::ReadOnlyList => F::READ_ONLY_COLLECTION,
            Self::Collection => F::empty(),
            Self::HashSet | Self::SortedSet => {
                F::ISET | F::READ_ONLY_SET | F::COLLECTION | F::READ_ONLY_COLLECTION
            }
            Self::ISet => F::COLLECTION,
            Self::ReadOnlySet => F::READ_ONLY_COLLECTION,
            Self::IDictionary => F::COLLECTION,
            Self::ReadOnlyDictionary => F::READ_ONLY_COLLECTION,
            Self::Dictionary => {
                F::IDICTIONARY | F::READ_ONLY_DICTIONARY | F::COLLECTION | F::READ_ONLY_COLLECTION
            }
            Self::ImmutableArray | Self::ImmutableList => {
                F::IIMMUTABLE_LIST
                    | F::ILIST
                    | F::READ_ONLY_LIST
                    | F::COLLECTION
                    | F::READ_ONLY_COLLECTION
            }
            Self::IImmutableList => F::READ_ONLY_LIST | F::READ_ONLY_COLLECTION,
            Self::ImmutableHashSet => {
                F::IIMMUTABLE_SET
                    | F::READ_ONLY_SET
                    | F::ISET
                    | F::COLLECTION
                    | F::READ_ONLY_COLLECTION
            }
            Self::IImmutableSet => F::READ_ONLY_COLLECTION,
            Self::ImmutableSortedSet => {
                F::IIMMUTABLE_SET
                    | F::ILIST
                    | F::READ_ONLY_LIST
                    | F::ISET
                    | F::READ_ONLY_SET
                    | F::COLLECTION
                    | F::READ_ONLY_COLLECTION
            }
            Self::ImmutableQueue => F::IIMMUTABLE_QUEUE,
            Self::IImmutableQueue => F::empty(),
            Self::ImmutableStack => F::IIMMUTABLE_STACK,
            Self::IImmutableStack => F::empty(),
            Self::ImmutableDictionary => {
                F::IIMMUTABLE_DICTIONARY
                    | F::IDICTIONARY
                    | F::READ_ONLY_DICTIONARY
                    | F::COLLECTION
                    | F::READ_ONLY_COLLECTION
            }
            Self::IImmutableDictionary => F::READ_ONLY_DICTIONARY | F::READ_ONLY_COLLECTION,
            Self::ImmutableSortedDictionary => {
                F::IIMMUTABLE_DICTIONARY | F::READ_ONLY_DICTIONARY | F::READ_ONLY_COLLECTION
            }
        };
        shapes | self.flag() | F::ENUMERABLE
    }

    fn has_single_insert(self) -> bool {
        matches!(
            self,
            Self::Collection
                | Self::IList
                | Self::List
                | Self::ISet
                | Self::HashSet
                | Self::SortedSet
        )
    }
}

/// Classification of one collection type.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct CollectionInfo {
    pub ty: TypeId,
    pub kind: CollectionKind,
    pub implemented: CollectionKinds,
    pub element: TypeId,
    pub capabilities: CollectionCapabilities,
    /// Key type when the elements are key/value entries.
    pub key: Option<TypeId>,
    pub value: Option<TypeId>,
}

impl CollectionInfo {
    #[inline]
    pub fn implements(&self, shapes: CollectionKinds) -> bool {
        self.implemented.intersects(shapes)
    }

    #[inline]
    pub fn is_count_known(&self) -> bool {
        self.capabilities.contains(CollectionCapabilities::COUNT_KNOWN)
    }

    #[inline]
    pub fn can_insert(&self) -> bool {
        self.capabilities.contains(CollectionCapabilities::SINGLE_INSERT)
    }

    #[inline]
    pub fn is_immutable(&self) -> bool {
        self.capabilities.contains(CollectionCapabilities::IMMUTABLE)
    }

    /// Dictionary shape with resolved key and value types.
    pub fn dictionary_entry(&self) -> Option<(TypeId, TypeId)> {
        if !self.implements(CollectionKinds::ANY_DICTIONARY) {
            return None;
        }
        Some((self.key?, self.value?))
    }

    /// Key/value types of the entries, whether or not the type is itself a
    /// dictionary (`List<KeyValuePair<K, V>>` qualifies).
    pub fn entry(&self) -> Option<(TypeId, TypeId)> {
        Some((self.key?, self.value?))
    }
}

/// Classifies `ty`. Strings and non-enumerable types yield `None`.
pub fn classify(db: &dyn TypeDatabase, ty: TypeId) -> Option<CollectionInfo> {
    let ty = db.non_nullable(ty);
    if db.is_string(ty) {
        return None;
    }
    let element = db.enumerated_type(ty)?;

    let (kind, immutable) = if db.array_element(ty).is_some() {
        (CollectionKind::Array, false)
    } else {
        catalog_entry(db, ty).unwrap_or((CollectionKind::Custom, false))
    };

    let implemented = if kind == CollectionKind::Custom {
        implemented_by_hierarchy(db, ty)
    } else {
        kind.implemented()
    };

    let mut capabilities = CollectionCapabilities::empty();
    capabilities.set(CollectionCapabilities::COUNT_KNOWN, is_count_known(db, ty, kind));
    capabilities.set(CollectionCapabilities::SINGLE_INSERT, has_single_insert(db, ty, kind));
    capabilities.set(CollectionCapabilities::IMMUTABLE, immutable);

    let (key, value) = match db.type_args(element) {
        [key, value] if db.is_instance_of(element, WellKnownType::KeyValuePair) => {
            (Some(*key), Some(*value))
        }
        _ => (None, None),
    };

    Some(CollectionInfo {
        ty,
        kind,
        implemented,
        element,
        capabilities,
        key,
        value,
    })
}

fn catalog_entry(db: &dyn TypeDatabase, ty: TypeId) -> Option<(CollectionKind, bool)> {
    let definition = db.definition_of(ty)?;
    CATALOG
        .iter()
        .find(|(_, which, _)| db.well_known(*which) == Some(definition))
        .map(|(kind, _, immutable)| (*kind, *immutable))
}

fn implemented_by_hierarchy(db: &dyn TypeDatabase, ty: TypeId) -> CollectionKinds {
    CATALOG
        .iter()
        .filter(|(_, which, _)| db.implements_well_known(ty, *which).is_some())
        .fold(CollectionKinds::empty(), |acc, (kind, _, _)| acc | kind.flag())
}

fn is_count_known(db: &dyn TypeDatabase, ty: TypeId, kind: CollectionKind) -> bool {
    match kind {
        CollectionKind::Enumerable => false,
        CollectionKind::Custom => db
            .accessible_members(ty)
            .iter()
            .any(|m| matches!(&*m.name, "Count" | "Length") && m.ty == TypeId::INT),
        _ => true,
    }
}

fn has_single_insert(db: &dyn TypeDatabase, ty: TypeId, kind: CollectionKind) -> bool {
    match kind {
        CollectionKind::Custom => db.find_method(ty, "Add", 1).is_some_and(|m| !m.is_static),
        _ => kind.has_single_insert(),
    }
}

#[cfg(test)]
#[path = "../tests/collections_tests.rs"]
mod collections_tests;
