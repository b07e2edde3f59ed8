//! Member paths: ordered member chains anchored at a root type.
//!
//! Two ways to resolve one:
//! - [`MemberPath::find`] walks explicit dotted segments (`Manufacturer.Name`).
//! - [`MemberPath::find_flattened`] reconstructs a path from a single
//!   PascalCase token (`ManufacturerName`), preferring the flattest match.
//!
//! Each member's declaring type is the (nullable-unwrapped) type of the
//! member before it; the constructors below are the only way to build a
//! path, so that invariant holds for every value.

use crate::db::TypeDatabase;
use crate::syntax::Expr;
use crate::types::{MemberInfo, NameComparison, TypeId};
use shapemap_common::limits::MAX_FLATTENING_SPLITS;
use smallvec::SmallVec;
use std::collections::BTreeSet;
use tracing::trace;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MemberPath {
    root: TypeId,
    members: SmallVec<[MemberInfo; 2]>,
}

/// Type of the last member, with the nullability of the whole path.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct EffectiveType {
    pub ty: TypeId,
    /// True when the member itself or any object on the way is nullable.
    pub nullable: bool,
}

impl MemberPath {
    pub fn single(root: TypeId, member: MemberInfo) -> Self {
        Self {
            root,
            members: SmallVec::from_iter([member]),
        }
    }

    pub fn root(&self) -> TypeId {
        self.root
    }

    pub fn members(&self) -> &[MemberInfo] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Last member of the path.
    pub fn member(&self) -> &MemberInfo {
        &self.members[self.members.len() - 1]
    }

    /// Members leading up to (excluding) the last one.
    pub fn object_path(&self) -> &[MemberInfo] {
        &self.members[..self.members.len() - 1]
    }

    /// Dotted name, e.g. `Manufacturer.Name`.
    pub fn full_name(&self) -> String {
        let mut name = String::new();
        for (i, member) in self.members.iter().enumerate() {
            if i > 0 {
                name.push('.');
            }
            name.push_str(&member.name);
        }
        name
    }

    pub fn member_type(&self, db: &dyn TypeDatabase) -> EffectiveType {
        let ty = self.member().ty;
        EffectiveType {
            ty: db.non_nullable(ty),
            nullable: self.is_any_nullable(db),
        }
    }

    pub fn is_any_nullable(&self, db: &dyn TypeDatabase) -> bool {
        self.members.iter().any(|m| db.is_nullable(m.ty))
    }

    pub fn is_any_object_path_nullable(&self, db: &dyn TypeDatabase) -> bool {
        self.object_path().iter().any(|m| db.is_nullable(m.ty))
    }

    /// One prefix of the object path per nullable member on it.
    pub fn nullable_object_sub_paths(&self, db: &dyn TypeDatabase) -> Vec<&[MemberInfo]> {
        let object_path = self.object_path();
        object_path
            .iter()
            .enumerate()
            .filter(|(_, m)| db.is_nullable(m.ty))
            .map(|(i, _)| &object_path[..=i])
            .collect()
    }

    /// `base.A.B.C`, or `base.A?.B.C` when `null_conditional` is set and `A`
    /// is nullable.
    pub fn build_access(&self, db: &dyn TypeDatabase, base: Expr, null_conditional: bool) -> Expr {
        let mut access = base;
        let mut previous_nullable = false;
        for member in &self.members {
            access = if null_conditional && previous_nullable {
                access.conditional_member(&member.name)
            } else {
                access.member(&member.name)
            };
            previous_nullable = db.is_nullable(member.ty);
        }
        access
    }

    /// Condition under which every nullable part of the path (up to the last
    /// nullable member) is non-null; `None` when nothing is nullable.
    pub fn non_null_condition(&self, db: &dyn TypeDatabase, base: Expr) -> Option<Expr> {
        let end = self
            .members
            .iter()
            .rposition(|m| db.is_nullable(m.ty))
            .map_or(0, |i| i + 1);
        Self::condition_over(db, base, &self.members[..end])
    }

    /// Like [`non_null_condition`](Self::non_null_condition) but only over
    /// the object path, which is what guards a member read.
    pub fn object_path_condition(&self, db: &dyn TypeDatabase, base: Expr) -> Option<Expr> {
        Self::condition_over(db, base, self.object_path())
    }

    fn condition_over(db: &dyn TypeDatabase, base: Expr, members: &[MemberInfo]) -> Option<Expr> {
        let mut access = base;
        let mut conditions = Vec::new();
        for member in members {
            access = access.member(&member.name);
            if db.is_nullable(member.ty) {
                conditions.push(access.clone().is_not_null());
            }
        }
        Expr::and_all(conditions)
    }

    // ------------------------------------------------------------------
    // Resolution
    // ------------------------------------------------------------------

    /// Resolves explicit segments in order. Fails when any segment is
    /// missing or the list is empty.
    pub fn find<S: AsRef<str>>(
        db: &dyn TypeDatabase,
        root: TypeId,
        segments: &[S],
        comparison: NameComparison,
    ) -> Option<MemberPath> {
        if segments.is_empty() {
            return None;
        }
        let mut members = SmallVec::new();
        let mut ty = root;
        for segment in segments {
            let member = db.find_member(ty, segment.as_ref(), comparison)?.clone();
            ty = member.ty;
            members.push(member);
        }
        Some(MemberPath { root, members })
    }

    /// Resolves a flattened PascalCase name against `root`.
    ///
    /// At each level the whole remaining suffix is tried as one member name
    /// first; then successively shorter prefixes (longest first) are tried
    /// as a segment, recursing into the member's type with the rest. The
    /// `ignored` names exclude candidates only at the outermost level.
    pub fn find_flattened(
        db: &dyn TypeDatabase,
        root: TypeId,
        name: &str,
        ignored: &BTreeSet<String>,
        comparison: NameComparison,
    ) -> Option<MemberPath> {
        if name.is_empty() {
            return None;
        }
        let splits = split_indices(name);
        let mut members = SmallVec::new();
        let search = FlattenedSearch {
            db,
            source: name,
            splits: &splits,
            comparison,
        };
        if search.recurse(root, 0, Some(ignored), &mut members) {
            trace!(name, path = ?members.iter().map(|m: &MemberInfo| &*m.name).collect::<Vec<_>>(), "flattened path resolved");
            Some(MemberPath { root, members })
        } else {
            None
        }
    }
}

/// Byte offsets of every uppercase letter after the first character.
fn split_indices(name: &str) -> SmallVec<[usize; MAX_FLATTENING_SPLITS]> {
    name.char_indices()
        .skip(1)
        .filter(|(_, c)| c.is_uppercase())
        .map(|(i, _)| i)
        .take(MAX_FLATTENING_SPLITS)
        .collect()
}

struct FlattenedSearch<'a> {
    db: &'a dyn TypeDatabase,
    source: &'a str,
    splits: &'a [usize],
    comparison: NameComparison,
}

impl FlattenedSearch<'_> {
    fn candidate(&self, ty: TypeId, name: &str, ignored: Option<&BTreeSet<String>>) -> Option<MemberInfo> {
        let member = self.db.find_member(ty, name, self.comparison)?;
        if ignored.is_some_and(|set| set.contains(&*member.name)) {
            return None;
        }
        Some(member.clone())
    }

    fn recurse(
        &self,
        ty: TypeId,
        i: usize,
        ignored: Option<&BTreeSet<String>>,
        stack: &mut SmallVec<[MemberInfo; 2]>,
    ) -> bool {
        let start = if i == 0 { 0 } else { self.splits[i - 1] };

        if let Some(member) = self.candidate(ty, &self.source[start..], ignored) {
            stack.push(member);
            return true;
        }

        for j in (i..self.splits.len()).rev() {
            let Some(member) = self.candidate(ty, &self.source[start..self.splits[j]], ignored) else {
                continue;
            };
            let member_ty = member.ty;
            stack.push(member);
            if self.recurse(member_ty, j + 1, None, stack) {
                return true;
            }
            stack.pop();
        }
        false
    }
}

#[cfg(test)]
#[path = "../tests/member_path_tests.rs"]
mod member_path_tests;
