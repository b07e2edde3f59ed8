//! Mapping plans and their lowering into the emission IR.
//!
//! A plan is a node in the plan graph owned by the
//! [`PlanRegistry`](crate::registry::PlanRegistry). Child plans are referenced
//! by [`PlanId`], so a self-referential type graph produces a cyclic plan
//! graph instead of an infinitely deep tree.
//!
//! Lowering happens only after a whole mapper is resolved: [`RenderContext`]
//! knows which plans became named methods and inlines everything else.

use crate::collections::classify;
use crate::db::TypeDatabase;
use crate::member_path::MemberPath;
use crate::strategy::{CollectionStrategy, DictionaryStrategy, EntryWrite};
use crate::syntax::{
    BinaryOp, Body, Expr, Interpolation, Literal, Name, NameScope, Stmt, SwitchArm, SwitchPattern,
};
use crate::types::TypeId;
use rustc_hash::FxHashMap;

/// Handle to a plan inside one registry.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PlanId(pub u32);

impl PlanId {
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Interned [`MappingConfiguration`](crate::config::MappingConfiguration).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(pub u32);

impl ScopeId {
    /// The mapper default configuration.
    pub const DEFAULT: Self = Self(0);
}

/// Identity of a plan. Identical keys share one node.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct PlanKey {
    pub source: TypeId,
    pub target: TypeId,
    /// Built for an expression-only context (query projections).
    pub expression: bool,
    /// Maps into an already constructed target instead of creating one.
    pub existing_target: bool,
    pub scope: ScopeId,
}

/// What a null source turns into when the target cannot hold null.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum NullFallback {
    Throw,
    Default,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct DerivedArm {
    pub source: TypeId,
    pub target: TypeId,
    pub plan: PlanId,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum DateTimeComponent {
    Date,
    Time,
}

/// A value read through a source member path and converted by a child plan.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MemberValue {
    pub source: MemberPath,
    pub plan: PlanId,
    /// Declared type of the receiving parameter or member.
    pub target_ty: TypeId,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MemberAssignment {
    pub target: Name,
    pub value: MemberValue,
}

/// Object construction: constructor arguments, then member writes, then
/// in-place mappings into get-only members.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ObjectPlan {
    pub constructor_args: Vec<MemberValue>,
    pub assignments: Vec<MemberAssignment>,
    /// Get-only target members filled by an existing-target plan.
    pub existing: Vec<MemberAssignment>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PlanKind {
    /// Shell registered, builders still running.
    Pending,
    /// No builder applied.
    Failed,
    Direct,
    /// `(T)source`, lossless or not.
    Cast { explicit: bool },
    Nullable {
        inner: PlanId,
        source_nullable: bool,
        target_nullable: bool,
        fallback: NullFallback,
    },
    Derived { arms: Vec<DerivedArm> },
    /// `Queryable.Select` with an inlined element projection.
    Projection { element: PlanId },
    Collection {
        element: PlanId,
        strategy: CollectionStrategy,
    },
    Dictionary {
        key: PlanId,
        value: PlanId,
        strategy: DictionaryStrategy,
    },
    Parse,
    ToString,
    /// `new T(source)`
    Constructor,
    StringToEnum { by_name: bool, ignore_case: bool },
    EnumToString,
    EnumByValue,
    /// Source member name to target member name.
    EnumByName { arms: Vec<(Name, Name)> },
    DateTimeComponent(DateTimeComponent),
    Object(ObjectPlan),
    /// Hand-written mapping method.
    User { method: Name },
}

impl PlanKind {
    /// Short tag for logs.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Failed => "failed",
            Self::Direct => "direct",
            Self::Cast { explicit: false } => "implicit-cast",
            Self::Cast { explicit: true } => "explicit-cast",
            Self::Nullable { .. } => "nullable",
            Self::Derived { .. } => "derived",
            Self::Projection { .. } => "projection",
            Self::Collection { .. } => "collection",
            Self::Dictionary { .. } => "dictionary",
            Self::Parse => "parse",
            Self::ToString => "to-string",
            Self::Constructor => "constructor",
            Self::StringToEnum { .. } => "string-to-enum",
            Self::EnumToString => "enum-to-string",
            Self::EnumByValue => "enum-by-value",
            Self::EnumByName { .. } => "enum-by-name",
            Self::DateTimeComponent(_) => "date-time-component",
            Self::Object(_) => "object",
            Self::User { .. } => "user",
        }
    }

    pub fn is_identity(&self) -> bool {
        matches!(self, Self::Direct)
    }

    /// Child plans, in the order they are lowered.
    pub fn children(&self) -> Vec<PlanId> {
        match self {
            Self::Nullable { inner, .. } => vec![*inner],
            Self::Derived { arms } => arms.iter().map(|arm| arm.plan).collect(),
            Self::Projection { element } | Self::Collection { element, .. } => vec![*element],
            Self::Dictionary { key, value, .. } => vec![*key, *value],
            Self::Object(object) => object
                .constructor_args
                .iter()
                .chain(object.assignments.iter().map(|a| &a.value))
                .chain(object.existing.iter().map(|a| &a.value))
                .map(|value| value.plan)
                .collect(),
            _ => Vec::new(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MappingPlan {
    pub key: PlanKey,
    pub kind: PlanKind,
    /// Re-entered while under construction; lowered as a named method so
    /// the emitted code recurses instead of inlining forever.
    pub promoted: bool,
}

impl MappingPlan {
    pub fn source(&self) -> TypeId {
        self.key.source
    }

    pub fn target(&self) -> TypeId {
        self.key.target
    }

    /// Whether the lowered form is a statement block.
    pub fn is_block(&self) -> bool {
        if self.key.expression {
            return false;
        }
        if self.key.existing_target {
            return true;
        }
        match &self.kind {
            PlanKind::Object(_) => true,
            PlanKind::Collection { strategy, .. } => strategy.is_block(),
            PlanKind::Dictionary { strategy, .. } => strategy.is_block(),
            _ => false,
        }
    }

    /// Whether the plan has to become a method of its own when another plan
    /// refers to it.
    pub fn needs_method(&self) -> bool {
        !matches!(self.kind, PlanKind::User { .. }) && (self.is_block() || self.promoted)
    }

    /// Children that are spliced into this plan's body rather than called.
    pub fn inlined_children(&self) -> Vec<PlanId> {
        match self.kind {
            PlanKind::Nullable { inner, .. } if self.key.existing_target => vec![inner],
            _ => Vec::new(),
        }
    }
}

/// Base name of a generated method for `target` (`MapToListOfCarDto`).
pub fn method_base_name(db: &dyn TypeDatabase, target: TypeId) -> String {
    let raw = db.name(db.non_nullable(target));
    let mut name = String::from("MapTo");
    let mut upper_next = true;
    let mut rest = raw;
    while let Some(c) = rest.chars().next() {
        if let Some(stripped) = rest.strip_prefix("[]") {
            name.push_str("Array");
            rest = stripped;
            continue;
        }
        rest = &rest[c.len_utf8()..];
        match c {
            '<' => {
                name.push_str("Of");
                upper_next = true;
            }
            ',' => {
                name.push_str("And");
                upper_next = true;
            }
            '>' | '?' | ' ' => {}
            c if c.is_alphanumeric() || c == '_' => {
                if upper_next {
                    name.extend(c.to_uppercase());
                } else {
                    name.push(c);
                }
                upper_next = false;
            }
            _ => {}
        }
    }
    name
}

// =============================================================================
// Lowering
// =============================================================================

/// Lowers finished plans into [`Body`]/[`Expr`] nodes.
///
/// One context is used per emitted method; [`reset`](Self::reset) clears the
/// local name scope between methods.
pub struct RenderContext<'a> {
    db: &'a dyn TypeDatabase,
    plans: &'a [MappingPlan],
    methods: &'a FxHashMap<PlanId, Name>,
    names: NameScope,
}

impl<'a> RenderContext<'a> {
    pub fn new(
        db: &'a dyn TypeDatabase,
        plans: &'a [MappingPlan],
        methods: &'a FxHashMap<PlanId, Name>,
    ) -> Self {
        Self {
            db,
            plans,
            methods,
            names: NameScope::new(),
        }
    }

    /// Starts a new method whose parameters are `params`.
    pub fn reset(&mut self, params: &[&str]) {
        self.names = NameScope::new();
        for param in params {
            self.names.reserve(param);
        }
    }

    /// Expression applying plan `id` to `source`: a method call when the
    /// plan is a method, otherwise the plan inlined.
    pub fn apply(&mut self, id: PlanId, source: Expr) -> Expr {
        let plans = self.plans;
        let plan = &plans[id.index()];
        if let PlanKind::User { method } = &plan.kind {
            return Expr::invoke(method, vec![source]);
        }
        if let Some(method) = self.methods.get(&id) {
            return Expr::invoke(method, vec![source]);
        }
        match self.body(id, source.clone(), None) {
            Body::Expr(expr) => expr,
            Body::Block(_) => {
                debug_assert!(false, "block plan {id:?} has no method");
                Expr::invoke(&method_base_name(self.db, plan.target()), vec![source])
            }
        }
    }

    /// Statement applying existing-target plan `id`.
    pub fn apply_existing(&mut self, id: PlanId, source: Expr, target: Expr) -> Vec<Stmt> {
        match self.methods.get(&id) {
            Some(method) => vec![Stmt::Expr(Expr::invoke(method, vec![source, target]))],
            None => self.body(id, source, Some(target)).statements(),
        }
    }

    /// Lowers the body of plan `id`. `target` is set for existing-target
    /// plans.
    pub fn body(&mut self, id: PlanId, source: Expr, target: Option<Expr>) -> Body {
        let plans = self.plans;
        let plan = &plans[id.index()];
        let db = self.db;
        let key = plan.key;
        match &plan.kind {
            PlanKind::Pending | PlanKind::Failed => Body::Expr(Expr::throw(
                "NotImplementedException",
                vec![Expr::str(&format!(
                    "No mapping from {} to {}",
                    db.name(key.source),
                    db.name(key.target)
                ))],
            )),
            PlanKind::Direct => Body::Expr(source),
            PlanKind::Cast { .. } | PlanKind::EnumByValue => Body::Expr(source.cast(key.target)),
            PlanKind::User { method } => Body::Expr(Expr::invoke(method, vec![source])),
            PlanKind::Nullable {
                inner,
                source_nullable,
                target_nullable,
                fallback,
            } => match target {
                Some(target) => self.nullable_existing(*inner, source, target, *source_nullable),
                None => Body::Expr(self.nullable(
                    key,
                    *inner,
                    source,
                    *source_nullable,
                    *target_nullable,
                    *fallback,
                )),
            },
            PlanKind::Derived { arms } => Body::Expr(self.derived(key, arms, source)),
            PlanKind::Projection { element } => {
                let param = self.names.fresh("x");
                let projected = self.apply(*element, Expr::Ident(param.clone()));
                Body::Expr(Expr::static_call(
                    "Queryable",
                    "Select",
                    vec![
                        source,
                        Expr::Lambda {
                            param,
                            body: Box::new(projected),
                        },
                    ],
                ))
            }
            PlanKind::Collection { element, strategy } => {
                self.collection(key, *element, strategy, source, target)
            }
            PlanKind::Dictionary {
                key: key_plan,
                value,
                strategy,
            } => self.dictionary(key, *key_plan, *value, strategy, source, target),
            PlanKind::Parse => Body::Expr(Expr::static_call(
                db.name(key.target),
                "Parse",
                vec![source],
            )),
            PlanKind::ToString => Body::Expr(source.call("ToString", Vec::new())),
            PlanKind::Constructor => Body::Expr(Expr::new_object(key.target, vec![source])),
            PlanKind::StringToEnum {
                by_name,
                ignore_case,
            } => Body::Expr(self.string_to_enum(key, source, *by_name, *ignore_case)),
            PlanKind::EnumToString => Body::Expr(self.enum_to_string(key, source)),
            PlanKind::EnumByName { arms } => Body::Expr(self.enum_by_name(key, arms, source)),
            PlanKind::DateTimeComponent(_) => Body::Expr(Expr::static_call(
                db.name(key.target),
                "FromDateTime",
                vec![source],
            )),
            PlanKind::Object(object) => self.object(key, object, source, target),
        }
    }

    fn nullable(
        &mut self,
        key: PlanKey,
        inner: PlanId,
        source: Expr,
        source_nullable: bool,
        target_nullable: bool,
        fallback: NullFallback,
    ) -> Expr {
        if !source_nullable {
            return self.apply(inner, source);
        }
        let inner_source = self.plans[inner.index()].source();
        let unwrapped = if self.db.is_value_type(inner_source) {
            source.clone().member("Value")
        } else {
            source.clone()
        };
        let mapped = self.apply(inner, unwrapped);
        let when_null = if target_nullable {
            Expr::null()
        } else {
            match fallback {
                NullFallback::Throw => Expr::throw(
                    "ArgumentNullException",
                    vec![Expr::NameOf(Box::new(source.clone()))],
                ),
                NullFallback::Default => Expr::default_of(key.target),
            }
        };
        Expr::conditional(source.is_null(), when_null, mapped)
    }

    fn nullable_existing(&mut self, inner: PlanId, source: Expr, target: Expr, source_nullable: bool) -> Body {
        let mut stmts = Vec::new();
        if source_nullable {
            stmts.push(Stmt::if_then(source.clone().is_null(), vec![Stmt::Return(None)]));
        }
        stmts.extend(self.apply_existing(inner, source, target));
        Body::Block(stmts)
    }

    fn derived(&mut self, key: PlanKey, arms: &[DerivedArm], source: Expr) -> Expr {
        let db = self.db;
        let binding = self.names.fresh("x");
        let mut switch_arms: Vec<SwitchArm> = arms
            .iter()
            .map(|arm| SwitchArm {
                pattern: SwitchPattern::Type {
                    ty: arm.source,
                    binding: binding.clone(),
                },
                result: self.apply(arm.plan, Expr::Ident(binding.clone())),
            })
            .collect();
        let message = Expr::Interpolated(vec![
            Interpolation::Text("Cannot map ".into()),
            Interpolation::Value(source.clone().call("GetType", Vec::new())),
            Interpolation::Text(
                format!(
                    " to {} as there is no known derived type mapping",
                    db.name(key.target)
                )
                .into(),
            ),
        ]);
        switch_arms.push(SwitchArm {
            pattern: SwitchPattern::Discard,
            result: Expr::throw(
                "ArgumentException",
                vec![message, Expr::NameOf(Box::new(source.clone()))],
            ),
        });
        Expr::Switch {
            scrutinee: Box::new(source),
            arms: switch_arms,
        }
    }

    fn element_of(&self, ty: TypeId) -> TypeId {
        classify(self.db, ty).map_or(TypeId::OBJECT, |info| info.element)
    }

    fn lambda(&mut self, plan: PlanId, project: impl FnOnce(Expr) -> Expr) -> Expr {
        let param = self.names.fresh("x");
        let body = self.apply(plan, project(Expr::Ident(param.clone())));
        Expr::Lambda {
            param,
            body: Box::new(body),
        }
    }

    fn collection(
        &mut self,
        key: PlanKey,
        element: PlanId,
        strategy: &CollectionStrategy,
        source: Expr,
        target: Option<Expr>,
    ) -> Body {
        match strategy {
            CollectionStrategy::Cast => Body::Expr(source.cast(key.target)),
            CollectionStrategy::ArrayClone => {
                Body::Expr(source.call("Clone", Vec::new()).cast(key.target))
            }
            CollectionStrategy::ArrayLoop => {
                let element_ty = self.element_of(key.target);
                let target = self.names.fresh("target");
                let index = self.names.fresh("i");
                let length = source.clone().member("Length");
                let mapped = self.apply(element, source.clone().index(Expr::Ident(index.clone())));
                Body::Block(vec![
                    Stmt::local(
                        &target,
                        Expr::NewArray {
                            element: element_ty,
                            length: Box::new(length.clone()),
                        },
                    ),
                    Stmt::For {
                        counter: index.clone(),
                        bound: length,
                        body: vec![Stmt::assign(
                            Expr::Ident(target.clone()).index(Expr::Ident(index)),
                            mapped,
                        )],
                    },
                    Stmt::Return(Some(Expr::Ident(target))),
                ])
            }
            CollectionStrategy::Collect { select, collect } => {
                let sequence = if *select {
                    let projection = self.lambda(element, |x| x);
                    Expr::static_call("Enumerable", "Select", vec![source, projection])
                } else {
                    source
                };
                Body::Expr(match collect {
                    Some(op) => op.apply(sequence),
                    None => sequence,
                })
            }
            CollectionStrategy::Insert { op, capacity } => {
                let (target, mut stmts, fresh) = match target {
                    Some(target) => (target, Vec::new(), false),
                    None => {
                        let name = self.names.fresh("target");
                        let local = Stmt::local(&name, Expr::new_object(key.target, Vec::new()));
                        (Expr::Ident(name), vec![local], true)
                    }
                };
                if let Some(capacity) = capacity {
                    stmts.push(capacity.build(self.db, &source, &target, &mut self.names));
                }
                let item = self.names.fresh("item");
                let mapped = self.apply(element, Expr::Ident(item.clone()));
                stmts.push(Stmt::ForEach {
                    item,
                    source,
                    body: vec![Stmt::Expr(target.clone().call(op.method(), vec![mapped]))],
                });
                if fresh {
                    stmts.push(Stmt::Return(Some(target)));
                }
                Body::Block(stmts)
            }
        }
    }

    fn dictionary(
        &mut self,
        key: PlanKey,
        key_plan: PlanId,
        value_plan: PlanId,
        strategy: &DictionaryStrategy,
        source: Expr,
        target: Option<Expr>,
    ) -> Body {
        match strategy {
            DictionaryStrategy::Cast => Body::Expr(source.cast(key.target)),
            DictionaryStrategy::ToImmutable { .. } | DictionaryStrategy::ToDictionary => {
                let key_selector = self.lambda(key_plan, |x| x.member("Key"));
                let value_selector = self.lambda(value_plan, |x| x.member("Value"));
                let (owner, method) = match strategy {
                    DictionaryStrategy::ToImmutable { sorted: true } => {
                        ("ImmutableSortedDictionary", "ToImmutableSortedDictionary")
                    }
                    DictionaryStrategy::ToImmutable { sorted: false } => {
                        ("ImmutableDictionary", "ToImmutableDictionary")
                    }
                    _ => ("Enumerable", "ToDictionary"),
                };
                Body::Expr(Expr::static_call(
                    owner,
                    method,
                    vec![source, key_selector, value_selector],
                ))
            }
            DictionaryStrategy::Loop { write, capacity } => {
                let (target, mut stmts, fresh) = match target {
                    Some(target) => (target, Vec::new(), false),
                    None => {
                        let name = self.names.fresh("target");
                        let local = Stmt::local(&name, Expr::new_object(key.target, Vec::new()));
                        (Expr::Ident(name), vec![local], true)
                    }
                };
                if let Some(capacity) = capacity {
                    stmts.push(capacity.build(self.db, &source, &target, &mut self.names));
                }
                let item = self.names.fresh("item");
                let entry = Expr::Ident(item.clone());
                let mapped_key = self.apply(key_plan, entry.clone().member("Key"));
                let mapped_value = self.apply(value_plan, entry.member("Value"));
                let write = match write {
                    EntryWrite::Indexer => {
                        Stmt::assign(target.clone().index(mapped_key), mapped_value)
                    }
                    EntryWrite::Add => {
                        Stmt::Expr(target.clone().call("Add", vec![mapped_key, mapped_value]))
                    }
                };
                stmts.push(Stmt::ForEach {
                    item,
                    source,
                    body: vec![write],
                });
                if fresh {
                    stmts.push(Stmt::Return(Some(target)));
                }
                Body::Block(stmts)
            }
        }
    }

    fn enum_member(&self, ty: TypeId, member: &str) -> Expr {
        Expr::ident(self.db.name(ty)).member(member)
    }

    fn string_to_enum(&mut self, key: PlanKey, source: Expr, by_name: bool, ignore_case: bool) -> Expr {
        let db = self.db;
        let parse = Expr::static_call(
            "Enum",
            &format!("Parse<{}>", db.name(key.target)),
            vec![source.clone(), Expr::Literal(Literal::Bool(ignore_case))],
        );
        let Some(shape) = db.enum_shape(key.target) else {
            return parse;
        };
        if !by_name || ignore_case || key.expression {
            return parse;
        }
        let mut arms: Vec<SwitchArm> = shape
            .members
            .iter()
            .map(|member| SwitchArm {
                pattern: SwitchPattern::Constant(Expr::str(&member.name)),
                result: self.enum_member(key.target, &member.name),
            })
            .collect();
        arms.push(SwitchArm {
            pattern: SwitchPattern::Discard,
            result: parse,
        });
        Expr::Switch {
            scrutinee: Box::new(source),
            arms,
        }
    }

    fn enum_to_string(&mut self, key: PlanKey, source: Expr) -> Expr {
        let fallback = source.clone().call("ToString", Vec::new());
        let Some(shape) = self.db.enum_shape(key.source) else {
            return fallback;
        };
        if key.expression {
            return fallback;
        }
        let mut arms: Vec<SwitchArm> = shape
            .members
            .iter()
            .map(|member| {
                let constant = self.enum_member(key.source, &member.name);
                SwitchArm {
                    pattern: SwitchPattern::Constant(constant.clone()),
                    result: Expr::NameOf(Box::new(constant)),
                }
            })
            .collect();
        arms.push(SwitchArm {
            pattern: SwitchPattern::Discard,
            result: fallback,
        });
        Expr::Switch {
            scrutinee: Box::new(source),
            arms,
        }
    }

    fn enum_by_name(&mut self, key: PlanKey, arms: &[(Name, Name)], source: Expr) -> Expr {
        if key.expression {
            return arms.iter().rev().fold(source.clone().cast(key.target), |otherwise, (from, to)| {
                let condition = Expr::binary(
                    BinaryOp::Eq,
                    source.clone(),
                    self.enum_member(key.source, from),
                );
                Expr::conditional(condition, self.enum_member(key.target, to), otherwise)
            });
        }
        let mut switch_arms: Vec<SwitchArm> = arms
            .iter()
            .map(|(from, to)| SwitchArm {
                pattern: SwitchPattern::Constant(self.enum_member(key.source, from)),
                result: self.enum_member(key.target, to),
            })
            .collect();
        switch_arms.push(SwitchArm {
            pattern: SwitchPattern::Discard,
            result: Expr::throw(
                "ArgumentOutOfRangeException",
                vec![
                    Expr::NameOf(Box::new(source.clone())),
                    source.clone(),
                    Expr::str(&format!(
                        "The value of enum {} is not supported",
                        self.db.name(key.source)
                    )),
                ],
            ),
        });
        Expr::Switch {
            scrutinee: Box::new(source),
            arms: switch_arms,
        }
    }

    /// Reads `value` from `source`; a nullable object path yields null (or
    /// the default) instead of dereferencing.
    fn member_value(&mut self, source: &Expr, value: &MemberValue) -> Expr {
        let access = value.source.build_access(self.db, source.clone(), false);
        let mapped = self.apply(value.plan, access);
        match value.source.object_path_condition(self.db, source.clone()) {
            Some(condition) => {
                let fallback = if self.db.is_nullable(value.target_ty) {
                    Expr::null()
                } else {
                    Expr::default_of(value.target_ty)
                };
                Expr::conditional(condition, mapped, fallback)
            }
            None => mapped,
        }
    }

    /// `target.Member = value;`, guarded when the source object path is
    /// nullable.
    fn assignment(&mut self, source: &Expr, target: &Expr, assignment: &MemberAssignment) -> Stmt {
        let value = &assignment.value;
        let access = value.source.build_access(self.db, source.clone(), false);
        let mapped = self.apply(value.plan, access);
        let write = Stmt::assign(target.clone().member(&assignment.target), mapped);
        match value.source.object_path_condition(self.db, source.clone()) {
            Some(condition) => Stmt::if_then(condition, vec![write]),
            None => write,
        }
    }

    fn existing_member(&mut self, source: &Expr, target: &Expr, assignment: &MemberAssignment) -> Vec<Stmt> {
        let value = &assignment.value;
        let access = value.source.build_access(self.db, source.clone(), false);
        let stmts = self.apply_existing(value.plan, access, target.clone().member(&assignment.target));
        match value.source.object_path_condition(self.db, source.clone()) {
            Some(condition) => vec![Stmt::if_then(condition, stmts)],
            None => stmts,
        }
    }

    fn object(&mut self, key: PlanKey, object: &ObjectPlan, source: Expr, target: Option<Expr>) -> Body {
        if let Some(target) = target {
            let mut stmts = Vec::new();
            for assignment in &object.assignments {
                stmts.push(self.assignment(&source, &target, assignment));
            }
            for assignment in &object.existing {
                stmts.extend(self.existing_member(&source, &target, assignment));
            }
            return Body::Block(stmts);
        }

        let args = object
            .constructor_args
            .iter()
            .map(|value| self.member_value(&source, value))
            .collect();

        if key.expression {
            let initializers = object
                .assignments
                .iter()
                .map(|a| (a.target.clone(), self.member_value(&source, &a.value)))
                .collect();
            return Body::Expr(Expr::New {
                ty: key.target,
                args,
                initializers,
            });
        }

        let name = self.names.fresh("target");
        let target = Expr::Ident(name.clone());
        let mut stmts = vec![Stmt::local(&name, Expr::new_object(key.target, args))];
        for assignment in &object.assignments {
            stmts.push(self.assignment(&source, &target, assignment));
        }
        for assignment in &object.existing {
            stmts.extend(self.existing_member(&source, &target, assignment));
        }
        stmts.push(Stmt::Return(Some(target)));
        Body::Block(stmts)
    }
}
