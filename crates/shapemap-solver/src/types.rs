//! Type descriptor data.
//!
//! A `TypeId` is an opaque handle into the host's type universe. The data
//! behind it (`TypeData`) is read-only for the whole resolution run; the
//! engine only ever queries it through [`TypeDatabase`](crate::TypeDatabase).

use smallvec::SmallVec;
use std::fmt;
use std::sync::Arc;

/// Handle to a type descriptor.
///
/// The first ids are reserved for the built-in primitives so that they can be
/// named without a lookup (`TypeId::INT`, `TypeId::STRING`, ...).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(pub u32);

impl TypeId {
    pub const OBJECT: Self = Self(0);
    pub const BOOL: Self = Self(1);
    pub const CHAR: Self = Self(2);
    pub const BYTE: Self = Self(3);
    pub const SHORT: Self = Self(4);
    pub const INT: Self = Self(5);
    pub const LONG: Self = Self(6);
    pub const FLOAT: Self = Self(7);
    pub const DOUBLE: Self = Self(8);
    pub const DECIMAL: Self = Self(9);
    pub const STRING: Self = Self(10);
    pub const DATE_TIME: Self = Self(11);
    pub const DATE_ONLY: Self = Self(12);
    pub const TIME_ONLY: Self = Self(13);
    pub const GUID: Self = Self(14);

    /// Number of reserved primitive ids.
    pub const PRIMITIVE_COUNT: u32 = 15;

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Built-in scalar shapes.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Object,
    Bool,
    Char,
    Byte,
    Int16,
    Int32,
    Int64,
    Single,
    Double,
    Decimal,
    String,
    DateTime,
    DateOnly,
    TimeOnly,
    Guid,
}

impl PrimitiveKind {
    /// Primitive kinds in `TypeId` order.
    pub const ALL: [PrimitiveKind; 15] = [
        Self::Object,
        Self::Bool,
        Self::Char,
        Self::Byte,
        Self::Int16,
        Self::Int32,
        Self::Int64,
        Self::Single,
        Self::Double,
        Self::Decimal,
        Self::String,
        Self::DateTime,
        Self::DateOnly,
        Self::TimeOnly,
        Self::Guid,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Self::Object => "object",
            Self::Bool => "bool",
            Self::Char => "char",
            Self::Byte => "byte",
            Self::Int16 => "short",
            Self::Int32 => "int",
            Self::Int64 => "long",
            Self::Single => "float",
            Self::Double => "double",
            Self::Decimal => "decimal",
            Self::String => "string",
            Self::DateTime => "DateTime",
            Self::DateOnly => "DateOnly",
            Self::TimeOnly => "TimeOnly",
            Self::Guid => "Guid",
        }
    }

    pub const fn is_numeric(self) -> bool {
        matches!(
            self,
            Self::Char
                | Self::Byte
                | Self::Int16
                | Self::Int32
                | Self::Int64
                | Self::Single
                | Self::Double
                | Self::Decimal
        )
    }

    pub const fn is_integral(self) -> bool {
        matches!(
            self,
            Self::Char | Self::Byte | Self::Int16 | Self::Int32 | Self::Int64
        )
    }

    pub const fn is_value_type(self) -> bool {
        !matches!(self, Self::Object | Self::String)
    }

    /// Whether values of this kind can be shared instead of cloned.
    pub const fn is_immutable(self) -> bool {
        !matches!(self, Self::Object)
    }

    /// Implicit (lossless) numeric conversion table.
    pub fn converts_implicitly_to(self, target: PrimitiveKind) -> bool {
        use PrimitiveKind::*;
        if self == target {
            return true;
        }
        match self {
            Byte => matches!(target, Int16 | Int32 | Int64 | Single | Double | Decimal),
            Int16 => matches!(target, Int32 | Int64 | Single | Double | Decimal),
            Char => matches!(target, Int32 | Int64 | Single | Double | Decimal),
            Int32 => matches!(target, Int64 | Single | Double | Decimal),
            Int64 => matches!(target, Single | Double | Decimal),
            Single => matches!(target, Double),
            _ => false,
        }
    }

    /// Explicit (possibly lossy) conversion table.
    pub fn converts_explicitly_to(self, target: PrimitiveKind) -> bool {
        self.is_numeric() && target.is_numeric()
    }
}

/// A named constant of an enum type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EnumMember {
    pub name: Arc<str>,
    pub value: i64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EnumShape {
    pub underlying: PrimitiveKind,
    pub members: Vec<EnumMember>,
}

impl EnumShape {
    pub fn member_named(&self, name: &str, ignore_case: bool) -> Option<&EnumMember> {
        self.members.iter().find(|m| {
            if ignore_case {
                m.name.eq_ignore_ascii_case(name)
            } else {
                &*m.name == name
            }
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TypeKind {
    Primitive(PrimitiveKind),
    Enum(EnumShape),
    /// Single-dimensional array of the element type.
    Array(TypeId),
    /// Nullable annotation around the underlying type.
    Nullable(TypeId),
    Class,
    Struct,
    Interface,
    /// Open generic definition (`List<T>`); instantiations point back to it.
    GenericDefinition { arity: u8 },
}

/// A readable and/or writable slot on a type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MemberInfo {
    pub name: Arc<str>,
    pub ty: TypeId,
    /// The type declaring this member.
    pub declaring: TypeId,
    pub readable: bool,
    pub writable: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MethodInfo {
    pub name: Arc<str>,
    pub params: SmallVec<[TypeId; 2]>,
    pub returns: Option<TypeId>,
    pub is_static: bool,
}

impl MethodInfo {
    pub fn instance(name: &str, params: &[TypeId], returns: Option<TypeId>) -> Self {
        Self {
            name: name.into(),
            params: params.iter().copied().collect(),
            returns,
            is_static: false,
        }
    }

    pub fn static_method(name: &str, params: &[TypeId], returns: Option<TypeId>) -> Self {
        Self {
            is_static: true,
            ..Self::instance(name, params, returns)
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParameterInfo {
    pub name: Arc<str>,
    pub ty: TypeId,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConstructorInfo {
    pub params: Vec<ParameterInfo>,
}

impl ConstructorInfo {
    pub fn is_parameterless(&self) -> bool {
        self.params.is_empty()
    }
}

/// Structural facts about one type.
#[derive(Clone, Debug)]
pub struct TypeData {
    pub name: Arc<str>,
    pub kind: TypeKind,
    /// Originating generic definition for instantiated generics.
    pub definition: Option<TypeId>,
    pub type_args: SmallVec<[TypeId; 2]>,
    pub base: Option<TypeId>,
    /// Directly implemented interfaces (already instantiated).
    pub interfaces: Vec<TypeId>,
    pub members: Vec<MemberInfo>,
    pub methods: Vec<MethodInfo>,
    pub constructors: Vec<ConstructorInfo>,
}

impl TypeData {
    pub fn new(name: impl Into<Arc<str>>, kind: TypeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            definition: None,
            type_args: SmallVec::new(),
            base: None,
            interfaces: Vec::new(),
            members: Vec::new(),
            methods: Vec::new(),
            constructors: Vec::new(),
        }
    }
}

/// Types the engine needs to recognize by identity.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum WellKnownType {
    Enumerable,
    Collection,
    ReadOnlyCollection,
    IList,
    ReadOnlyList,
    List,
    Stack,
    Queue,
    ISet,
    ReadOnlySet,
    HashSet,
    SortedSet,
    IDictionary,
    ReadOnlyDictionary,
    Dictionary,
    KeyValuePair,
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
    ImmutableDictionary,
    IImmutableDictionary,
    ImmutableSortedDictionary,
    Queryable,
}

/// Member name comparison used by path resolution.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NameComparison {
    #[default]
    Exact,
    IgnoreCase,
}

impl NameComparison {
    #[inline]
    pub fn matches(self, a: &str, b: &str) -> bool {
        match self {
            Self::Exact => a == b,
            Self::IgnoreCase => a.eq_ignore_ascii_case(b),
        }
    }
}
