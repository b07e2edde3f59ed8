//! Type descriptor facade.
//!
//! The engine never owns type facts. Everything it knows about a type comes
//! through [`TypeDatabase`]; the required methods are the minimal surface a
//! host has to provide, everything else is derived from them.

use crate::types::{
    ConstructorInfo, EnumShape, MemberInfo, MethodInfo, NameComparison, PrimitiveKind, TypeData,
    TypeId, TypeKind, WellKnownType,
};
use rustc_hash::FxHashSet;

/// Read-only view of the host's type universe.
///
/// Implementations must be `Sync`: independent mappers are resolved in
/// parallel against one shared database.
pub trait TypeDatabase: Sync {
    /// Structural data for `id`.
    ///
    /// # Panics
    ///
    /// May panic when `id` does not belong to this database.
    fn lookup(&self, id: TypeId) -> &TypeData;

    /// Whether `id` was issued by this database.
    fn contains(&self, id: TypeId) -> bool;

    /// Generic definition (or plain type) registered for a well-known shape.
    fn well_known(&self, which: WellKnownType) -> Option<TypeId>;

    /// Whether `Enumerable.TryGetNonEnumeratedCount` is available to the
    /// generated code.
    fn has_non_enumerated_count(&self) -> bool {
        false
    }

    // ------------------------------------------------------------------
    // Derived queries
    // ------------------------------------------------------------------

    fn name(&self, id: TypeId) -> &str {
        &self.lookup(id).name
    }

    fn kind(&self, id: TypeId) -> &TypeKind {
        &self.lookup(id).kind
    }

    fn is_nullable(&self, id: TypeId) -> bool {
        matches!(self.kind(id), TypeKind::Nullable(_))
    }

    /// The type without its nullable annotation.
    fn non_nullable(&self, id: TypeId) -> TypeId {
        match self.kind(id) {
            TypeKind::Nullable(inner) => *inner,
            _ => id,
        }
    }

    fn primitive(&self, id: TypeId) -> Option<PrimitiveKind> {
        match self.kind(id) {
            TypeKind::Primitive(kind) => Some(*kind),
            _ => None,
        }
    }

    fn is_string(&self, id: TypeId) -> bool {
        self.primitive(id) == Some(PrimitiveKind::String)
    }

    fn enum_shape(&self, id: TypeId) -> Option<&EnumShape> {
        match self.kind(id) {
            TypeKind::Enum(shape) => Some(shape),
            _ => None,
        }
    }

    fn is_enum(&self, id: TypeId) -> bool {
        self.enum_shape(id).is_some()
    }

    fn array_element(&self, id: TypeId) -> Option<TypeId> {
        match self.kind(id) {
            TypeKind::Array(element) => Some(*element),
            _ => None,
        }
    }

    fn is_value_type(&self, id: TypeId) -> bool {
        match self.kind(id) {
            TypeKind::Primitive(kind) => kind.is_value_type(),
            TypeKind::Enum(_) | TypeKind::Struct => true,
            TypeKind::Nullable(inner) => self.is_value_type(*inner),
            _ => false,
        }
    }

    /// Values that may be shared instead of deep-cloned.
    fn is_immutable(&self, id: TypeId) -> bool {
        match self.kind(id) {
            TypeKind::Primitive(kind) => kind.is_immutable(),
            TypeKind::Enum(_) => true,
            TypeKind::Nullable(inner) => self.is_immutable(*inner),
            _ => false,
        }
    }

    /// Originating generic definition of an instantiated generic.
    fn definition_of(&self, id: TypeId) -> Option<TypeId> {
        self.lookup(id).definition
    }

    fn type_args(&self, id: TypeId) -> &[TypeId] {
        &self.lookup(id).type_args
    }

    /// True when `id` is an instantiation of the given well-known definition.
    fn is_instance_of(&self, id: TypeId, which: WellKnownType) -> bool {
        match (self.definition_of(id), self.well_known(which)) {
            (Some(def), Some(known)) => def == known,
            _ => false,
        }
    }

    /// Accessible members including inherited ones, most-derived first.
    /// A member shadowed by a more derived declaration is skipped. Interfaces
    /// inherit the members of the interfaces they extend.
    fn accessible_members(&self, id: TypeId) -> Vec<&MemberInfo> {
        let mut result: Vec<&MemberInfo> = Vec::new();
        let mut queue = std::collections::VecDeque::from([self.non_nullable(id)]);
        let mut seen = FxHashSet::default();
        while let Some(ty) = queue.pop_front() {
            if !seen.insert(ty) {
                continue;
            }
            let data = self.lookup(ty);
            for member in &data.members {
                if !result.iter().any(|m| m.name == member.name) {
                    result.push(member);
                }
            }
            queue.extend(data.base);
            if data.kind == TypeKind::Interface {
                queue.extend(data.interfaces.iter().copied());
            }
        }
        result
    }

    /// First accessible member with the given name.
    fn find_member(&self, id: TypeId, name: &str, comparison: NameComparison) -> Option<&MemberInfo> {
        self.accessible_members(id)
            .into_iter()
            .find(|m| comparison.matches(&m.name, name))
    }

    /// Instance and static methods declared on the type, its bases and its
    /// interfaces.
    fn find_method(&self, id: TypeId, name: &str, arity: usize) -> Option<&MethodInfo> {
        let mut stack = vec![self.non_nullable(id)];
        let mut seen = FxHashSet::default();
        while let Some(ty) = stack.pop() {
            if !seen.insert(ty) {
                continue;
            }
            let data = self.lookup(ty);
            if let Some(method) = data
                .methods
                .iter()
                .find(|m| &*m.name == name && m.params.len() == arity)
            {
                return Some(method);
            }
            stack.extend(data.interfaces.iter().rev().copied());
            stack.extend(data.base);
        }
        None
    }

    fn constructors(&self, id: TypeId) -> &[ConstructorInfo] {
        &self.lookup(id).constructors
    }

    fn has_parameterless_constructor(&self, id: TypeId) -> bool {
        match self.kind(id) {
            TypeKind::Struct => true,
            TypeKind::Class => self.constructors(id).iter().any(ConstructorInfo::is_parameterless),
            _ => false,
        }
    }

    /// Finds the instantiation of `definition` implemented by `id`, walking
    /// the type itself, its base chain and all implemented interfaces.
    fn implements_generic(&self, id: TypeId, definition: TypeId) -> Option<TypeId> {
        let mut stack = vec![self.non_nullable(id)];
        let mut seen = FxHashSet::default();
        while let Some(ty) = stack.pop() {
            if !seen.insert(ty) {
                continue;
            }
            let data = self.lookup(ty);
            if data.definition == Some(definition) {
                return Some(ty);
            }
            stack.extend(data.interfaces.iter().rev().copied());
            stack.extend(data.base);
        }
        None
    }

    fn implements_well_known(&self, id: TypeId, which: WellKnownType) -> Option<TypeId> {
        let definition = self.well_known(which)?;
        self.implements_generic(id, definition)
    }

    /// Element type of any enumerable type (arrays, catalog and custom
    /// collections alike).
    fn enumerated_type(&self, id: TypeId) -> Option<TypeId> {
        let enumerable = self.implements_well_known(id, WellKnownType::Enumerable)?;
        self.type_args(enumerable).first().copied()
    }

    /// Reference/identity assignability of `from` to `to`.
    fn is_assignable(&self, from: TypeId, to: TypeId) -> bool {
        if from == to || to == TypeId::OBJECT {
            return true;
        }
        if let TypeKind::Nullable(inner) = *self.kind(to) {
            return self.is_assignable(self.non_nullable(from), inner);
        }
        if self.is_nullable(from) {
            return false;
        }
        let mut stack = vec![from];
        let mut seen = FxHashSet::default();
        while let Some(ty) = stack.pop() {
            if ty == to {
                return true;
            }
            if !seen.insert(ty) {
                continue;
            }
            let data = self.lookup(ty);
            stack.extend(data.interfaces.iter().copied());
            stack.extend(data.base);
        }
        false
    }

    fn has_implicit_conversion(&self, from: TypeId, to: TypeId) -> bool {
        match (self.primitive(from), self.primitive(to)) {
            (Some(a), Some(b)) => a != b && a.converts_implicitly_to(b),
            _ => false,
        }
    }

    fn has_explicit_conversion(&self, from: TypeId, to: TypeId) -> bool {
        match (self.primitive(from), self.primitive(to)) {
            (Some(a), Some(b)) => a != b && a.converts_explicitly_to(b),
            _ => false,
        }
    }
}
