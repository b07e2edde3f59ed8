//! Collection and dictionary strategy selection.
//!
//! Selection is a pure function of the two classified shapes plus a handful
//! of flags (element mapping is identity, expression-only context, deep
//! cloning). It never resolves sub-plans and never reports diagnostics; the
//! builders do that around it.

use crate::collections::{CollectionInfo, CollectionKind, CollectionKinds};
use crate::db::TypeDatabase;
use crate::syntax::{BinaryOp, Expr, NameScope, Stmt, TypeRef};
use crate::types::{TypeId, WellKnownType};
use tracing::trace;

/// Terminal operation applied after the element-wise transform.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum CollectOp {
    ToArray,
    ToList,
    ToImmutableArray,
    ToImmutableList,
    ToImmutableHashSet,
    ToImmutableSortedSet,
    ToImmutableQueue,
    ToImmutableStack,
}

impl CollectOp {
    /// Static owner and method of the terminal call.
    pub const fn call_target(self) -> (&'static str, &'static str) {
        match self {
            Self::ToArray => ("Enumerable", "ToArray"),
            Self::ToList => ("Enumerable", "ToList"),
            Self::ToImmutableArray => ("ImmutableArray", "ToImmutableArray"),
            Self::ToImmutableList => ("ImmutableList", "ToImmutableList"),
            Self::ToImmutableHashSet => ("ImmutableHashSet", "ToImmutableHashSet"),
            Self::ToImmutableSortedSet => ("ImmutableSortedSet", "ToImmutableSortedSet"),
            Self::ToImmutableQueue => ("ImmutableQueue", "CreateRange"),
            Self::ToImmutableStack => ("ImmutableStack", "CreateRange"),
        }
    }

    pub fn apply(self, sequence: Expr) -> Expr {
        let (owner, method) = self.call_target();
        Expr::static_call(owner, method, vec![sequence])
    }

    fn for_immutable(kind: CollectionKind) -> Option<Self> {
        Some(match kind {
            CollectionKind::ImmutableArray => Self::ToImmutableArray,
            CollectionKind::ImmutableList | CollectionKind::IImmutableList => Self::ToImmutableList,
            CollectionKind::ImmutableHashSet | CollectionKind::IImmutableSet => {
                Self::ToImmutableHashSet
            }
            CollectionKind::ImmutableSortedSet => Self::ToImmutableSortedSet,
            CollectionKind::ImmutableQueue | CollectionKind::IImmutableQueue => {
                Self::ToImmutableQueue
            }
            CollectionKind::ImmutableStack | CollectionKind::IImmutableStack => {
                Self::ToImmutableStack
            }
            _ => return None,
        })
    }
}

/// Single-element insertion operation, in probe order.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum InsertOp {
    Push,
    Enqueue,
    Add,
}

impl InsertOp {
    pub const fn method(self) -> &'static str {
        match self {
            Self::Push => "Push",
            Self::Enqueue => "Enqueue",
            Self::Add => "Add",
        }
    }

    fn probe(target: &CollectionInfo) -> Option<Self> {
        if target.implements(CollectionKinds::STACK) {
            Some(Self::Push)
        } else if target.implements(CollectionKinds::QUEUE) {
            Some(Self::Enqueue)
        } else if target.implements(CollectionKinds::COLLECTION) || target.can_insert() {
            Some(Self::Add)
        } else {
            None
        }
    }
}

/// How a reservation call learns the source size.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum CapacityPresize {
    /// `target.EnsureCapacity(source.Count + target.Count)`
    Simple {
        source_count: &'static str,
        target_count: &'static str,
    },
    /// `if (Enumerable.TryGetNonEnumeratedCount(source, out var n)) ...`
    NonEnumerated { target_count: &'static str },
    /// `if (source is ICollection<T> c) ... else if (source is IReadOnlyCollection<T> r) ...`
    RuntimeTypeTest {
        target_count: &'static str,
        element: TypeId,
    },
}

impl CapacityPresize {
    pub fn build(&self, db: &dyn TypeDatabase, source: &Expr, target: &Expr, names: &mut NameScope) -> Stmt {
        let ensure = |count: Expr, target_count: &str| {
            let sum = Expr::binary(BinaryOp::Add, count, target.clone().member(target_count));
            Stmt::Expr(target.clone().call("EnsureCapacity", vec![sum]))
        };
        match self {
            Self::Simple {
                source_count,
                target_count,
            } => ensure(source.clone().member(source_count), *target_count),
            Self::NonEnumerated { target_count } => {
                let count = names.fresh("sourceCount");
                let probe = Expr::static_call(
                    "Enumerable",
                    "TryGetNonEnumeratedCount",
                    vec![source.clone(), Expr::OutVar(count.clone())],
                );
                Stmt::if_then(probe, vec![ensure(Expr::Ident(count), *target_count)])
            }
            Self::RuntimeTypeTest {
                target_count,
                element,
            } => {
                let mut test = |base: &str, which: WellKnownType| {
                    let binding = names.fresh(base);
                    let ty = match db.well_known(which) {
                        Some(definition) => TypeRef::Constructed {
                            definition,
                            args: [*element].into_iter().collect(),
                        },
                        None => TypeRef::Id(TypeId::OBJECT),
                    };
                    let condition = source.clone().is_type(ty, Some(&*binding));
                    let count = Expr::Ident(binding).member("Count");
                    (condition, ensure(count, *target_count))
                };
                let (collection, reserve_collection) = test("collection", WellKnownType::Collection);
                let (readonly, reserve_readonly) =
                    test("readonlyCollection", WellKnownType::ReadOnlyCollection);
                Stmt::If {
                    condition: collection,
                    then: vec![reserve_collection],
                    otherwise: vec![Stmt::if_then(readonly, vec![reserve_readonly])],
                }
            }
        }
    }
}

/// Chosen sequence strategy.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum CollectionStrategy {
    /// `(T)source`; the source already is the target shape.
    Cast,
    /// `(T[])source.Clone()`
    ArrayClone,
    /// Pre-sized array filled by an index loop.
    ArrayLoop,
    /// Optional `Select` followed by an optional terminal operation.
    Collect {
        select: bool,
        collect: Option<CollectOp>,
    },
    /// New target filled by a `foreach` insertion loop.
    Insert {
        op: InsertOp,
        capacity: Option<CapacityPresize>,
    },
}

impl CollectionStrategy {
    /// Strategies that need statements (and therefore a method).
    pub fn is_block(&self) -> bool {
        matches!(self, Self::ArrayLoop | Self::Insert { .. })
    }
}

/// Why no strategy applies.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Unsupported {
    /// Only an insertion loop would work, and loops cannot be expressed.
    ExpressionContext,
    NoParameterlessConstructor,
    NoInsertOperation,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct SelectionFlags {
    pub element_identity: bool,
    pub expression: bool,
    pub deep_cloning: bool,
}

/// Selects the strategy for a sequence mapping.
///
/// Decision order: cast to a bare sequence, array fast paths, collect with a
/// terminal chosen by the target kind, insertion loop.
pub fn select_collection_strategy(
    db: &dyn TypeDatabase,
    source: &CollectionInfo,
    target: &CollectionInfo,
    flags: SelectionFlags,
) -> Result<CollectionStrategy, Unsupported> {
    let strategy = select(db, source, target, flags);
    trace!(
        source = ?source.kind,
        target = ?target.kind,
        identity = flags.element_identity,
        ?strategy,
        "collection strategy"
    );
    strategy
}

fn select(
    db: &dyn TypeDatabase,
    source: &CollectionInfo,
    target: &CollectionInfo,
    flags: SelectionFlags,
) -> Result<CollectionStrategy, Unsupported> {
    if flags.element_identity && target.kind == CollectionKind::Enumerable {
        return Ok(CollectionStrategy::Cast);
    }

    if !flags.expression
        && source.kind == CollectionKind::Array
        && matches!(target.kind, CollectionKind::Array | CollectionKind::ReadOnlyCollection)
    {
        return Ok(if !flags.element_identity {
            CollectionStrategy::ArrayLoop
        } else if flags.deep_cloning {
            CollectionStrategy::ArrayClone
        } else {
            CollectionStrategy::Cast
        });
    }

    if let Some(collect) = collect_op(source, target) {
        return Ok(CollectionStrategy::Collect {
            select: !flags.element_identity,
            collect,
        });
    }

    if flags.expression {
        return Err(Unsupported::ExpressionContext);
    }
    if !db.has_parameterless_constructor(target.ty) {
        return Err(Unsupported::NoParameterlessConstructor);
    }
    let op = InsertOp::probe(target).ok_or(Unsupported::NoInsertOperation)?;
    Ok(CollectionStrategy::Insert {
        op,
        capacity: capacity_presize(db, source, target),
    })
}

/// Terminal operation for the target kind. The outer `None` means the kind
/// has none; `Some(None)` means the transformed sequence is used as is.
fn collect_op(source: &CollectionInfo, target: &CollectionInfo) -> Option<Option<CollectOp>> {
    match target.kind {
        CollectionKind::Array => Some(Some(CollectOp::ToArray)),
        CollectionKind::Enumerable => Some(None),
        CollectionKind::ReadOnlyCollection if source_count_known(source) => {
            Some(Some(CollectOp::ToArray))
        }
        CollectionKind::ReadOnlyCollection
        | CollectionKind::ReadOnlyList
        | CollectionKind::IList
        | CollectionKind::List
        | CollectionKind::Collection => Some(Some(CollectOp::ToList)),
        kind => CollectOp::for_immutable(kind).map(Some),
    }
}

fn source_count_known(source: &CollectionInfo) -> bool {
    source.kind == CollectionKind::Array
        || source.implements(CollectionKinds::READ_ONLY_COLLECTION | CollectionKinds::COLLECTION)
}

/// Insertion strategy into an already constructed target.
pub fn select_existing_target_strategy(
    db: &dyn TypeDatabase,
    source: &CollectionInfo,
    target: &CollectionInfo,
) -> Option<CollectionStrategy> {
    let op = InsertOp::probe(target)?;
    Some(CollectionStrategy::Insert {
        op,
        capacity: capacity_presize(db, source, target),
    })
}

/// Capacity reservation for an insertion loop.
///
/// Requires a non-static `EnsureCapacity(int) -> int` on the target and a
/// target size readable without enumeration. The source size is then read
/// statically when possible, else through `TryGetNonEnumeratedCount` when
/// the host has it, else through runtime type tests.
pub fn capacity_presize(
    db: &dyn TypeDatabase,
    source: &CollectionInfo,
    target: &CollectionInfo,
) -> Option<CapacityPresize> {
    let reserve = db.find_method(target.ty, "EnsureCapacity", 1)?;
    if reserve.is_static || reserve.params[0] != TypeId::INT || reserve.returns != Some(TypeId::INT) {
        return None;
    }
    let target_count = count_accessor(target)?;

    Some(match count_accessor(source) {
        Some(source_count) => CapacityPresize::Simple {
            source_count,
            target_count,
        },
        None if db.has_non_enumerated_count() => CapacityPresize::NonEnumerated { target_count },
        None => CapacityPresize::RuntimeTypeTest {
            target_count,
            element: source.element,
        },
    })
}

fn count_accessor(info: &CollectionInfo) -> Option<&'static str> {
    if info.kind == CollectionKind::Array {
        Some("Length")
    } else if info.implements(CollectionKinds::COLLECTION | CollectionKinds::READ_ONLY_COLLECTION) {
        Some("Count")
    } else {
        None
    }
}

// ----------------------------------------------------------------------
// Dictionaries
// ----------------------------------------------------------------------

/// How entries are written into a new dictionary.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum EntryWrite {
    /// `target[key] = value`
    Indexer,
    /// `target.Add(key, value)`
    Add,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum DictionaryStrategy {
    Cast,
    /// `ImmutableDictionary.ToImmutableDictionary(source, x => key, x => value)`
    ToImmutable { sorted: bool },
    /// `Enumerable.ToDictionary(source, x => key, x => value)`
    ToDictionary,
    /// New target filled by a `foreach` loop.
    Loop {
        write: EntryWrite,
        capacity: Option<CapacityPresize>,
    },
}

impl DictionaryStrategy {
    pub fn is_block(&self) -> bool {
        matches!(self, Self::Loop { .. })
    }
}

/// Selects the strategy for a key/value mapping.
///
/// `entry_identity` is true when both the key and the value mapping are
/// identity.
pub fn select_dictionary_strategy(
    db: &dyn TypeDatabase,
    source: &CollectionInfo,
    target: &CollectionInfo,
    entry_identity: bool,
    expression: bool,
) -> Result<DictionaryStrategy, Unsupported> {
    let interface_target = matches!(
        target.kind,
        CollectionKind::IDictionary | CollectionKind::ReadOnlyDictionary
    );
    if entry_identity && interface_target && source.implements(target.kind.flag()) {
        return Ok(DictionaryStrategy::Cast);
    }

    match target.kind {
        CollectionKind::ImmutableDictionary | CollectionKind::IImmutableDictionary => {
            return Ok(DictionaryStrategy::ToImmutable { sorted: false });
        }
        CollectionKind::ImmutableSortedDictionary => {
            return Ok(DictionaryStrategy::ToImmutable { sorted: true });
        }
        _ => {}
    }

    if expression {
        return if interface_target || target.kind == CollectionKind::Dictionary {
            Ok(DictionaryStrategy::ToDictionary)
        } else {
            Err(Unsupported::ExpressionContext)
        };
    }
    if interface_target {
        return Ok(DictionaryStrategy::ToDictionary);
    }

    if !db.has_parameterless_constructor(target.ty) {
        return Err(Unsupported::NoParameterlessConstructor);
    }
    let write = if db.find_method(target.ty, "set_Item", 2).is_some() {
        EntryWrite::Indexer
    } else if db.find_method(target.ty, "Add", 2).is_some() {
        EntryWrite::Add
    } else {
        return Err(Unsupported::NoInsertOperation);
    };
    Ok(DictionaryStrategy::Loop {
        write,
        capacity: capacity_presize(db, source, target),
    })
}

/// Entry-write strategy into an already constructed dictionary.
pub fn select_existing_dictionary_strategy(
    db: &dyn TypeDatabase,
    source: &CollectionInfo,
    target: &CollectionInfo,
) -> Option<DictionaryStrategy> {
    let write = if db.find_method(target.ty, "set_Item", 2).is_some() {
        EntryWrite::Indexer
    } else if db.find_method(target.ty, "Add", 2).is_some() {
        EntryWrite::Add
    } else {
        return None;
    };
    Some(DictionaryStrategy::Loop {
        write,
        capacity: capacity_presize(db, source, target),
    })
}

#[cfg(test)]
#[path = "../tests/strategy_tests.rs"]
mod strategy_tests;
