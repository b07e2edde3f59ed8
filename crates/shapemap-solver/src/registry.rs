//! Plan registry: deduplicates plans by [`PlanKey`] and tracks plans that
//! are still being built.
//!
//! The lifecycle of one key:
//!
//! ```text
//! Missing --register_shell--> InProgress --finalize--> Ready
//!                                        \--fail-----> Failed
//! ```
//!
//! A lookup that hits an in-progress key is a cycle. The caller decides what
//! to do with it (promote the shell to a method, or report a loop).

use crate::config::MappingConfiguration;
use crate::plan::{MappingPlan, PlanId, PlanKey, PlanKind, ScopeId};
use indexmap::IndexSet;
use rustc_hash::{FxHashMap, FxHashSet};
use std::sync::Arc;

/// Outcome of [`PlanRegistry::lookup`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Lookup {
    Ready(PlanId),
    InProgress(PlanId),
    Failed,
    Missing,
}

#[derive(Debug)]
pub struct PlanRegistry {
    plans: Vec<MappingPlan>,
    index: FxHashMap<PlanKey, PlanId>,
    in_progress: FxHashSet<PlanId>,
    /// Interned configurations; index 0 is the mapper default.
    scopes: IndexSet<Arc<MappingConfiguration>>,
}

impl PlanRegistry {
    pub fn new(default_config: MappingConfiguration) -> Self {
        let mut scopes = IndexSet::new();
        scopes.insert(Arc::new(default_config));
        Self {
            plans: Vec::new(),
            index: FxHashMap::default(),
            in_progress: FxHashSet::default(),
            scopes,
        }
    }

    /// Interns `config`, returning the id of an equal configuration when one
    /// exists.
    pub fn intern_scope(&mut self, config: MappingConfiguration) -> ScopeId {
        let (index, _) = self.scopes.insert_full(Arc::new(config));
        ScopeId(index as u32)
    }

    pub fn scope(&self, id: ScopeId) -> Arc<MappingConfiguration> {
        self.scopes
            .get_index(id.0 as usize)
            .or_else(|| self.scopes.first())
            .cloned()
            .unwrap_or_default()
    }

    pub fn lookup(&self, key: &PlanKey) -> Lookup {
        let Some(&id) = self.index.get(key) else {
            return Lookup::Missing;
        };
        if self.in_progress.contains(&id) {
            return Lookup::InProgress(id);
        }
        match self.plans[id.index()].kind {
            PlanKind::Failed => Lookup::Failed,
            _ => Lookup::Ready(id),
        }
    }

    /// Registers a [`PlanKind::Pending`] node for `key` so re-entrant
    /// lookups find it.
    pub fn register_shell(&mut self, key: PlanKey) -> PlanId {
        debug_assert!(!self.index.contains_key(&key), "shell registered twice");
        let id = PlanId(self.plans.len() as u32);
        self.plans.push(MappingPlan {
            key,
            kind: PlanKind::Pending,
            promoted: false,
        });
        self.index.insert(key, id);
        self.in_progress.insert(id);
        id
    }

    pub fn finalize(&mut self, id: PlanId, kind: PlanKind) {
        self.in_progress.remove(&id);
        self.plans[id.index()].kind = kind;
    }

    /// Marks the shell as failed. The key keeps pointing at it so the same
    /// pair is not retried (and not re-reported).
    pub fn fail(&mut self, id: PlanId) {
        self.finalize(id, PlanKind::Failed);
    }

    /// Marks a plan that was re-entered while in progress.
    pub fn promote(&mut self, id: PlanId) {
        self.plans[id.index()].promoted = true;
    }

    pub fn plan(&self, id: PlanId) -> &MappingPlan {
        &self.plans[id.index()]
    }

    pub fn kind(&self, id: PlanId) -> &PlanKind {
        &self.plans[id.index()].kind
    }

    pub fn plans(&self) -> &[MappingPlan] {
        &self.plans
    }

    pub fn into_plans(self) -> Vec<MappingPlan> {
        self.plans
    }

    pub fn len(&self) -> usize {
        self.plans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plans.is_empty()
    }
}

#[cfg(test)]
#[path = "../tests/registry_tests.rs"]
mod registry_tests;
