//! Neutral emission IR.
//!
//! Plans build into these nodes; a backend renders them as source text.
//! The shapes mirror what a C#-like target needs (member access, static
//! calls, object creation with initializers, type switches, `foreach`)
//! without committing to any concrete syntax.

use crate::types::TypeId;
use rustc_hash::FxHashSet;
use smallvec::SmallVec;
use std::sync::Arc;

pub type Name = Arc<str>;

/// Type named in emitted code. `Constructed` closes a generic definition
/// over arguments without requiring the instantiation to exist in the type
/// universe (runtime tests such as `source is ICollection<T>`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TypeRef {
    Id(TypeId),
    Constructed {
        definition: TypeId,
        args: SmallVec<[TypeId; 2]>,
    },
}

impl From<TypeId> for TypeRef {
    fn from(id: TypeId) -> Self {
        Self::Id(id)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Literal {
    Null,
    /// `default(T)`
    Default(TypeId),
    Bool(bool),
    Int(i64),
    Str(Name),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Eq,
    NotEq,
    And,
    Less,
}

impl BinaryOp {
    pub const fn token(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Eq => "==",
            Self::NotEq => "!=",
            Self::And => "&&",
            Self::Less => "<",
        }
    }
}

/// Piece of an interpolated string.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Interpolation {
    Text(Name),
    Value(Expr),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SwitchPattern {
    /// `Derived x => ...`
    Type { ty: TypeId, binding: Name },
    /// `Color.Red => ...`
    Constant(Expr),
    /// `_ => ...`
    Discard,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SwitchArm {
    pub pattern: SwitchPattern,
    pub result: Expr,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Expr {
    Ident(Name),
    Literal(Literal),
    Member {
        target: Box<Expr>,
        name: Name,
        /// `target?.name`
        conditional: bool,
    },
    Index {
        target: Box<Expr>,
        index: Box<Expr>,
    },
    /// Instance call when `receiver` is set, otherwise a call to a method of
    /// the mapper itself.
    Call {
        receiver: Option<Box<Expr>>,
        method: Name,
        args: Vec<Expr>,
    },
    /// Call on a named static owner (`Enumerable.ToList(x)`, `int.Parse(x)`).
    StaticCall {
        owner: Name,
        method: Name,
        args: Vec<Expr>,
    },
    New {
        ty: TypeId,
        args: Vec<Expr>,
        initializers: Vec<(Name, Expr)>,
    },
    NewArray {
        element: TypeId,
        length: Box<Expr>,
    },
    Cast {
        ty: TypeId,
        expr: Box<Expr>,
    },
    Lambda {
        param: Name,
        body: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Conditional {
        condition: Box<Expr>,
        then: Box<Expr>,
        otherwise: Box<Expr>,
    },
    /// `value ?? fallback`
    Coalesce {
        value: Box<Expr>,
        fallback: Box<Expr>,
    },
    IsType {
        expr: Box<Expr>,
        ty: TypeRef,
        binding: Option<Name>,
    },
    Switch {
        scrutinee: Box<Expr>,
        arms: Vec<SwitchArm>,
    },
    /// `throw new Exception(args)` in expression position.
    Throw {
        exception: Name,
        args: Vec<Expr>,
    },
    Interpolated(Vec<Interpolation>),
    /// `out var name`
    OutVar(Name),
    TypeOf(TypeId),
    NameOf(Box<Expr>),
}

impl Expr {
    pub fn ident(name: &str) -> Self {
        Self::Ident(name.into())
    }

    pub fn null() -> Self {
        Self::Literal(Literal::Null)
    }

    pub fn int(value: i64) -> Self {
        Self::Literal(Literal::Int(value))
    }

    pub fn str(value: &str) -> Self {
        Self::Literal(Literal::Str(value.into()))
    }

    pub fn default_of(ty: TypeId) -> Self {
        Self::Literal(Literal::Default(ty))
    }

    pub fn member(self, name: &str) -> Self {
        Self::Member {
            target: Box::new(self),
            name: name.into(),
            conditional: false,
        }
    }

    pub fn conditional_member(self, name: &str) -> Self {
        Self::Member {
            target: Box::new(self),
            name: name.into(),
            conditional: true,
        }
    }

    pub fn index(self, index: Expr) -> Self {
        Self::Index {
            target: Box::new(self),
            index: Box::new(index),
        }
    }

    pub fn call(self, method: &str, args: Vec<Expr>) -> Self {
        Self::Call {
            receiver: Some(Box::new(self)),
            method: method.into(),
            args,
        }
    }

    /// Call of a generated mapper method.
    pub fn invoke(method: &str, args: Vec<Expr>) -> Self {
        Self::Call {
            receiver: None,
            method: method.into(),
            args,
        }
    }

    pub fn static_call(owner: &str, method: &str, args: Vec<Expr>) -> Self {
        Self::StaticCall {
            owner: owner.into(),
            method: method.into(),
            args,
        }
    }

    pub fn new_object(ty: TypeId, args: Vec<Expr>) -> Self {
        Self::New {
            ty,
            args,
            initializers: Vec::new(),
        }
    }

    pub fn cast(self, ty: TypeId) -> Self {
        Self::Cast {
            ty,
            expr: Box::new(self),
        }
    }

    pub fn lambda(param: &str, body: Expr) -> Self {
        Self::Lambda {
            param: param.into(),
            body: Box::new(body),
        }
    }

    pub fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Self {
        Self::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    pub fn is_null(self) -> Self {
        Self::binary(BinaryOp::Eq, self, Self::null())
    }

    pub fn is_not_null(self) -> Self {
        Self::binary(BinaryOp::NotEq, self, Self::null())
    }

    pub fn conditional(condition: Expr, then: Expr, otherwise: Expr) -> Self {
        Self::Conditional {
            condition: Box::new(condition),
            then: Box::new(then),
            otherwise: Box::new(otherwise),
        }
    }

    pub fn coalesce(self, fallback: Expr) -> Self {
        Self::Coalesce {
            value: Box::new(self),
            fallback: Box::new(fallback),
        }
    }

    /// `self is T binding`
    pub fn is_type(self, ty: impl Into<TypeRef>, binding: Option<&str>) -> Self {
        Self::IsType {
            expr: Box::new(self),
            ty: ty.into(),
            binding: binding.map(Into::into),
        }
    }

    pub fn throw(exception: &str, args: Vec<Expr>) -> Self {
        Self::Throw {
            exception: exception.into(),
            args,
        }
    }

    /// Joins conditions with `&&`; `None` for an empty list.
    pub fn and_all(conditions: impl IntoIterator<Item = Expr>) -> Option<Expr> {
        conditions
            .into_iter()
            .reduce(|acc, next| Self::binary(BinaryOp::And, acc, next))
    }

    /// Replaces every occurrence of identifier `name` with `replacement`.
    /// Lambdas that rebind `name` are left alone.
    pub fn substitute(&self, name: &str, replacement: &Expr) -> Expr {
        let sub = |e: &Expr| e.substitute(name, replacement);
        let sub_box = |e: &Expr| Box::new(e.substitute(name, replacement));
        let sub_all = |args: &[Expr]| args.iter().map(sub).collect::<Vec<_>>();
        match self {
            Self::Ident(id) if &**id == name => replacement.clone(),
            Self::Ident(_)
            | Self::Literal(_)
            | Self::OutVar(_)
            | Self::TypeOf(_) => self.clone(),
            Self::Member {
                target,
                name: member,
                conditional,
            } => Self::Member {
                target: sub_box(target),
                name: member.clone(),
                conditional: *conditional,
            },
            Self::Index { target, index } => Self::Index {
                target: sub_box(target),
                index: sub_box(index),
            },
            Self::Call {
                receiver,
                method,
                args,
            } => Self::Call {
                receiver: receiver.as_deref().map(sub_box),
                method: method.clone(),
                args: sub_all(args),
            },
            Self::StaticCall {
                owner,
                method,
                args,
            } => Self::StaticCall {
                owner: owner.clone(),
                method: method.clone(),
                args: sub_all(args),
            },
            Self::New {
                ty,
                args,
                initializers,
            } => Self::New {
                ty: *ty,
                args: sub_all(args),
                initializers: initializers
                    .iter()
                    .map(|(n, e)| (n.clone(), sub(e)))
                    .collect(),
            },
            Self::NewArray { element, length } => Self::NewArray {
                element: *element,
                length: sub_box(length),
            },
            Self::Cast { ty, expr } => Self::Cast {
                ty: *ty,
                expr: sub_box(expr),
            },
            Self::Lambda { param, .. } if &**param == name => self.clone(),
            Self::Lambda { param, body } => Self::Lambda {
                param: param.clone(),
                body: sub_box(body),
            },
            Self::Binary { op, lhs, rhs } => Self::Binary {
                op: *op,
                lhs: sub_box(lhs),
                rhs: sub_box(rhs),
            },
            Self::Conditional {
                condition,
                then,
                otherwise,
            } => Self::Conditional {
                condition: sub_box(condition),
                then: sub_box(then),
                otherwise: sub_box(otherwise),
            },
            Self::Coalesce { value, fallback } => Self::Coalesce {
                value: sub_box(value),
                fallback: sub_box(fallback),
            },
            Self::IsType { expr, ty, binding } => Self::IsType {
                expr: sub_box(expr),
                ty: ty.clone(),
                binding: binding.clone(),
            },
            Self::Switch { scrutinee, arms } => Self::Switch {
                scrutinee: sub_box(scrutinee),
                arms: arms
                    .iter()
                    .map(|arm| SwitchArm {
                        pattern: arm.pattern.clone(),
                        result: sub(&arm.result),
                    })
                    .collect(),
            },
            Self::Throw { exception, args } => Self::Throw {
                exception: exception.clone(),
                args: sub_all(args),
            },
            Self::Interpolated(parts) => Self::Interpolated(
                parts
                    .iter()
                    .map(|part| match part {
                        Interpolation::Text(t) => Interpolation::Text(t.clone()),
                        Interpolation::Value(e) => Interpolation::Value(sub(e)),
                    })
                    .collect(),
            ),
            Self::NameOf(expr) => Self::NameOf(sub_box(expr)),
        }
    }

    /// True for expressions that are safe to evaluate more than once.
    pub fn is_simple(&self) -> bool {
        match self {
            Self::Ident(_) | Self::Literal(_) => true,
            Self::Member {
                target,
                conditional: false,
                ..
            } => target.is_simple(),
            _ => false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Stmt {
    /// `var name = value;`
    Local { name: Name, value: Expr },
    Assign { target: Expr, value: Expr },
    Expr(Expr),
    If {
        condition: Expr,
        then: Vec<Stmt>,
        otherwise: Vec<Stmt>,
    },
    /// `for (var counter = 0; counter < bound; counter++)`
    For {
        counter: Name,
        bound: Expr,
        body: Vec<Stmt>,
    },
    ForEach {
        item: Name,
        source: Expr,
        body: Vec<Stmt>,
    },
    Return(Option<Expr>),
}

impl Stmt {
    pub fn local(name: &str, value: Expr) -> Self {
        Self::Local {
            name: name.into(),
            value,
        }
    }

    pub fn assign(target: Expr, value: Expr) -> Self {
        Self::Assign { target, value }
    }

    pub fn if_then(condition: Expr, then: Vec<Stmt>) -> Self {
        Self::If {
            condition,
            then,
            otherwise: Vec::new(),
        }
    }
}

/// Output of building a plan: a single expression or a statement block that
/// ends in `return` (or, for existing-target plans, just mutates).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Body {
    Expr(Expr),
    Block(Vec<Stmt>),
}

impl Body {
    pub fn statements(&self) -> Vec<Stmt> {
        match self {
            Self::Expr(expr) => vec![Stmt::Return(Some(expr.clone()))],
            Self::Block(stmts) => stmts.clone(),
        }
    }
}

/// Allocates unique identifiers within one scope (`target`, `target1`, ...).
#[derive(Clone, Debug, Default)]
pub struct NameScope {
    used: FxHashSet<Name>,
}

impl NameScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `name` as taken without allocating.
    pub fn reserve(&mut self, name: &str) {
        self.used.insert(name.into());
    }

    pub fn is_used(&self, name: &str) -> bool {
        self.used.contains(name)
    }

    pub fn fresh(&mut self, base: &str) -> Name {
        let mut candidate: Name = base.into();
        let mut suffix = 1u32;
        while self.used.contains(&candidate) {
            candidate = format!("{base}{suffix}").into();
            suffix += 1;
        }
        self.used.insert(candidate.clone());
        candidate
    }
}

#[cfg(test)]
#[path = "../tests/syntax_tests.rs"]
mod syntax_tests;
