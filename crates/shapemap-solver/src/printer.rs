//! Debug renderer for the emission IR.
//!
//! Produces C#-flavoured text. It is what the tests assert against and what
//! the inspection CLI prints; a real backend would walk the same IR.

use crate::db::TypeDatabase;
use crate::syntax::{Body, Expr, Interpolation, Literal, Stmt, SwitchPattern, TypeRef};
use crate::types::TypeId;
use std::fmt::Write;

const INDENT: &str = "    ";

pub struct SyntaxPrinter<'a> {
    db: &'a dyn TypeDatabase,
    out: String,
    indent: usize,
}

impl<'a> SyntaxPrinter<'a> {
    pub fn new(db: &'a dyn TypeDatabase) -> Self {
        Self {
            db,
            out: String::new(),
            indent: 0,
        }
    }

    pub fn finish(self) -> String {
        self.out
    }

    /// Renders a single expression.
    pub fn expr(db: &dyn TypeDatabase, expr: &Expr) -> String {
        let mut printer = SyntaxPrinter::new(db);
        printer.write_expr(expr);
        printer.finish()
    }

    /// Renders a body as a statement block.
    pub fn body(db: &dyn TypeDatabase, body: &Body) -> String {
        let mut printer = SyntaxPrinter::new(db);
        printer.write_stmts(&body.statements());
        printer.finish()
    }

    /// Renders a full method with the given signature.
    pub fn write_method(&mut self, name: &str, params: &[(TypeId, &str)], returns: Option<TypeId>, body: &Body) {
        self.line_start();
        let db = self.db;
        let returns = returns.map_or("void", |ty| db.name(ty));
        let params = params
            .iter()
            .map(|(ty, name)| format!("{} {}", db.name(*ty), name))
            .collect::<Vec<_>>()
            .join(", ");
        let _ = writeln!(self.out, "{returns} {name}({params})");
        self.line_start();
        self.out.push_str("{\n");
        self.indent += 1;
        self.write_stmts(&body.statements());
        self.indent -= 1;
        self.line_start();
        self.out.push_str("}\n");
    }

    fn line_start(&mut self) {
        for _ in 0..self.indent {
            self.out.push_str(INDENT);
        }
    }

    pub fn write_stmts(&mut self, stmts: &[Stmt]) {
        for stmt in stmts {
            self.write_stmt(stmt);
        }
    }

    fn write_block(&mut self, stmts: &[Stmt]) {
        self.line_start();
        self.out.push_str("{\n");
        self.indent += 1;
        self.write_stmts(stmts);
        self.indent -= 1;
        self.line_start();
        self.out.push_str("}\n");
    }

    fn write_stmt(&mut self, stmt: &Stmt) {
        self.line_start();
        match stmt {
            Stmt::Local { name, value } => {
                let _ = write!(self.out, "var {name} = ");
                self.write_expr(value);
                self.out.push_str(";\n");
            }
            Stmt::Assign { target, value } => {
                self.write_expr(target);
                self.out.push_str(" = ");
                self.write_expr(value);
                self.out.push_str(";\n");
            }
            Stmt::Expr(expr) => {
                self.write_expr(expr);
                self.out.push_str(";\n");
            }
            Stmt::If {
                condition,
                then,
                otherwise,
            } => {
                self.out.push_str("if (");
                self.write_expr(condition);
                self.out.push_str(")\n");
                self.write_block(then);
                if !otherwise.is_empty() {
                    self.line_start();
                    self.out.push_str("else\n");
                    self.write_block(otherwise);
                }
            }
            Stmt::For {
                counter,
                bound,
                body,
            } => {
                let _ = write!(self.out, "for (var {counter} = 0; {counter} < ");
                self.write_expr(bound);
                let _ = writeln!(self.out, "; {counter}++)");
                self.write_block(body);
            }
            Stmt::ForEach { item, source, body } => {
                let _ = write!(self.out, "foreach (var {item} in ");
                self.write_expr(source);
                self.out.push_str(")\n");
                self.write_block(body);
            }
            Stmt::Return(value) => {
                self.out.push_str("return");
                if let Some(value) = value {
                    self.out.push(' ');
                    self.write_expr(value);
                }
                self.out.push_str(";\n");
            }
        }
    }

    fn write_args(&mut self, args: &[Expr]) {
        self.out.push('(');
        for (i, arg) in args.iter().enumerate() {
            if i > 0 {
                self.out.push_str(", ");
            }
            self.write_expr(arg);
        }
        self.out.push(')');
    }

    /// Writes `expr`, parenthesized unless it binds tighter than postfix
    /// operators.
    fn write_operand(&mut self, expr: &Expr) {
        let atomic = matches!(
            expr,
            Expr::Ident(_)
                | Expr::Literal(_)
                | Expr::Member { .. }
                | Expr::Index { .. }
                | Expr::Call { .. }
                | Expr::StaticCall { .. }
                | Expr::New { .. }
                | Expr::TypeOf(_)
                | Expr::NameOf(_)
                | Expr::Interpolated(_)
        );
        if atomic {
            self.write_expr(expr);
        } else {
            self.out.push('(');
            self.write_expr(expr);
            self.out.push(')');
        }
    }

    pub fn write_expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Ident(name) => self.out.push_str(name),
            Expr::Literal(literal) => match literal {
                Literal::Null => self.out.push_str("null"),
                Literal::Default(ty) => {
                    let _ = write!(self.out, "default({})", self.db.name(*ty));
                }
                Literal::Bool(value) => {
                    let _ = write!(self.out, "{value}");
                }
                Literal::Int(value) => {
                    let _ = write!(self.out, "{value}");
                }
                Literal::Str(value) => {
                    let _ = write!(self.out, "\"{}\"", value.escape_default());
                }
            },
            Expr::Member {
                target,
                name,
                conditional,
            } => {
                self.write_operand(target);
                self.out.push_str(if *conditional { "?." } else { "." });
                self.out.push_str(name);
            }
            Expr::Index { target, index } => {
                self.write_operand(target);
                self.out.push('[');
                self.write_expr(index);
                self.out.push(']');
            }
            Expr::Call {
                receiver,
                method,
                args,
            } => {
                if let Some(receiver) = receiver {
                    self.write_operand(receiver);
                    self.out.push('.');
                }
                self.out.push_str(method);
                self.write_args(args);
            }
            Expr::StaticCall {
                owner,
                method,
                args,
            } => {
                let _ = write!(self.out, "{owner}.{method}");
                self.write_args(args);
            }
            Expr::New {
                ty,
                args,
                initializers,
            } => {
                let _ = write!(self.out, "new {}", self.db.name(*ty));
                self.write_args(args);
                if !initializers.is_empty() {
                    self.out.push_str(" { ");
                    for (i, (name, value)) in initializers.iter().enumerate() {
                        if i > 0 {
                            self.out.push_str(", ");
                        }
                        let _ = write!(self.out, "{name} = ");
                        self.write_expr(value);
                    }
                    self.out.push_str(" }");
                }
            }
            Expr::NewArray { element, length } => {
                let _ = write!(self.out, "new {}[", self.db.name(*element));
                self.write_expr(length);
                self.out.push(']');
            }
            Expr::Cast { ty, expr } => {
                let _ = write!(self.out, "({})", self.db.name(*ty));
                self.write_operand(expr);
            }
            Expr::Lambda { param, body } => {
                let _ = write!(self.out, "{param} => ");
                self.write_expr(body);
            }
            Expr::Binary { op, lhs, rhs } => {
                self.write_binary_operand(lhs);
                let _ = write!(self.out, " {} ", op.token());
                self.write_binary_operand(rhs);
            }
            Expr::Conditional {
                condition,
                then,
                otherwise,
            } => {
                self.write_binary_operand(condition);
                self.out.push_str(" ? ");
                self.write_expr(then);
                self.out.push_str(" : ");
                self.write_expr(otherwise);
            }
            Expr::Coalesce { value, fallback } => {
                self.write_binary_operand(value);
                self.out.push_str(" ?? ");
                self.write_expr(fallback);
            }
            Expr::IsType { expr, ty, binding } => {
                self.write_operand(expr);
                self.out.push_str(" is ");
                self.write_type_ref(ty);
                if let Some(binding) = binding {
                    let _ = write!(self.out, " {binding}");
                }
            }
            Expr::Switch { scrutinee, arms } => {
                self.write_operand(scrutinee);
                self.out.push_str(" switch { ");
                for (i, arm) in arms.iter().enumerate() {
                    if i > 0 {
                        self.out.push_str(", ");
                    }
                    match &arm.pattern {
                        SwitchPattern::Type { ty, binding } => {
                            let _ = write!(self.out, "{} {binding}", self.db.name(*ty));
                        }
                        SwitchPattern::Constant(value) => self.write_expr(value),
                        SwitchPattern::Discard => self.out.push('_'),
                    }
                    self.out.push_str(" => ");
                    self.write_expr(&arm.result);
                }
                self.out.push_str(" }");
            }
            Expr::Throw { exception, args } => {
                let _ = write!(self.out, "throw new {exception}");
                self.write_args(args);
            }
            Expr::Interpolated(parts) => {
                self.out.push_str("$\"");
                for part in parts {
                    match part {
                        Interpolation::Text(text) => self.out.push_str(text),
                        Interpolation::Value(value) => {
                            self.out.push('{');
                            self.write_expr(value);
                            self.out.push('}');
                        }
                    }
                }
                self.out.push('"');
            }
            Expr::OutVar(name) => {
                let _ = write!(self.out, "out var {name}");
            }
            Expr::TypeOf(ty) => {
                let _ = write!(self.out, "typeof({})", self.db.name(*ty));
            }
            Expr::NameOf(expr) => {
                self.out.push_str("nameof(");
                self.write_expr(expr);
                self.out.push(')');
            }
        }
    }

    fn write_type_ref(&mut self, ty: &TypeRef) {
        match ty {
            TypeRef::Id(id) => self.out.push_str(self.db.name(*id)),
            TypeRef::Constructed { definition, args } => {
                let db = self.db;
                let args = args.iter().map(|a| db.name(*a)).collect::<Vec<_>>().join(", ");
                let _ = write!(self.out, "{}<{args}>", db.name(*definition));
            }
        }
    }

    fn write_binary_operand(&mut self, expr: &Expr) {
        if matches!(
            expr,
            Expr::Conditional { .. } | Expr::Coalesce { .. } | Expr::Lambda { .. } | Expr::Switch { .. }
        ) {
            self.out.push('(');
            self.write_expr(expr);
            self.out.push(')');
        } else {
            self.write_expr(expr);
        }
    }
}

#[cfg(test)]
#[path = "../tests/printer_tests.rs"]
mod printer_tests;
