//! Method bodies as the checker consumes them.
//!
//! Parsing is somebody else's job: a host (the probe CLI, tests) builds a
//! [`Body`] through [`BodyBuilder`] with every name already resolved to a
//! `TypeId`. Nodes are stored in flat arenas and addressed by index; the
//! checker never mutates them and records its results in `SemanticFacts`.

use csz_common::interner::Atom;
use csz_common::span::Span;
use csz_solver::TypeId;
use csz_solver::def::DefId;
use csz_solver::types::ConstantValue;
use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct BodyId(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ExprId(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct StmtId(pub u32);

/// One element of a collection literal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CollectionElement {
    Expr(ExprId),
    /// `..source`
    Spread(ExprId),
}

impl CollectionElement {
    pub fn expr(self) -> ExprId {
        match self {
            CollectionElement::Expr(e) | CollectionElement::Spread(e) => e,
        }
    }

    pub fn is_spread(self) -> bool {
        matches!(self, CollectionElement::Spread(_))
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ExprKind {
    Constant(ConstantValue),
    /// A local or parameter of a known type.
    Local { name: Atom, ty: TypeId },
    /// A call the host already bound; only its result type matters here.
    Call {
        callee: Atom,
        args: Vec<ExprId>,
        result: TypeId,
    },
    /// `[e1, ..e2]`, optionally with `with(args)` as the first element.
    CollectionLiteral {
        elements: Vec<CollectionElement>,
        with_args: Option<Vec<ExprId>>,
    },
    /// `new T(args)` with an optional collection initializer `{ e1, e2 }`.
    ObjectCreation {
        ty: TypeId,
        args: Vec<ExprId>,
        initializer: Option<Vec<ExprId>>,
    },
    Cast { target: TypeId, operand: ExprId },
    Await(ExprId),
    /// A lambda whose body is a single expression.
    Lambda {
        body: ExprId,
        return_type: Option<TypeId>,
        /// Converted to an expression tree rather than a delegate.
        expression_tree: bool,
    },
    Error,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq)]
pub enum StmtKind {
    /// `T name = init;` or `var name = init;` (`declared` is `None`).
    Local {
        name: Atom,
        declared: Option<TypeId>,
        init: Option<ExprId>,
    },
    Expr(ExprId),
    Return(Option<ExprId>),
    YieldReturn(ExprId),
    Lock { resource: ExprId, body: Vec<StmtId> },
    Block(Vec<StmtId>),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

/// A method, accessor or lambda body together with its arenas.
#[derive(Clone, Debug)]
pub struct Body {
    pub id: BodyId,
    /// Type whose member this body is; drives accessibility.
    pub within: Option<DefId>,
    pub return_type: Option<TypeId>,
    pub is_async: bool,
    exprs: Vec<Expr>,
    stmts: Vec<Stmt>,
    statements: Vec<StmtId>,
}

impl Body {
    pub fn expr(&self, id: ExprId) -> &Expr {
        &self.exprs[id.0 as usize]
    }

    pub fn stmt(&self, id: StmtId) -> &Stmt {
        &self.stmts[id.0 as usize]
    }

    pub fn get_expr(&self, id: ExprId) -> Option<&Expr> {
        self.exprs.get(id.0 as usize)
    }

    /// Top-level statements in source order.
    pub fn statements(&self) -> &[StmtId] {
        &self.statements
    }

    pub fn expr_count(&self) -> usize {
        self.exprs.len()
    }

    pub fn is_collection_literal(&self, id: ExprId) -> bool {
        matches!(self.expr(id).kind, ExprKind::CollectionLiteral { .. })
    }

    /// Does the statement list contain `await` or `yield return` outside of
    /// nested lambdas?
    pub fn contains_suspension(&self, stmts: &[StmtId]) -> bool {
        !self.suspensions(stmts).is_empty()
    }

    /// The first `await` in the statement list, outside of nested lambdas.
    pub fn first_await(&self, stmts: &[StmtId]) -> Option<ExprId> {
        self.suspensions(stmts).into_iter().find_map(|s| match s {
            Suspension::Await(e) => Some(e),
            Suspension::Yield(_) => None,
        })
    }

    /// Suspension points in source order.
    pub fn suspensions(&self, stmts: &[StmtId]) -> Vec<Suspension> {
        let mut out = Vec::new();
        for &s in stmts {
            self.stmt_suspensions(s, &mut out);
        }
        out
    }

    fn stmt_suspensions(&self, id: StmtId, out: &mut Vec<Suspension>) {
        match &self.stmt(id).kind {
            StmtKind::Local { init, .. } => {
                if let Some(e) = *init {
                    self.expr_suspensions(e, out);
                }
            }
            StmtKind::Expr(e) => self.expr_suspensions(*e, out),
            StmtKind::Return(e) => {
                if let Some(e) = *e {
                    self.expr_suspensions(e, out);
                }
            }
            StmtKind::YieldReturn(e) => {
                self.expr_suspensions(*e, out);
                out.push(Suspension::Yield(id));
            }
            StmtKind::Lock { resource, body } => {
                self.expr_suspensions(*resource, out);
                for &s in body {
                    self.stmt_suspensions(s, out);
                }
            }
            StmtKind::Block(body) => {
                for &s in body {
                    self.stmt_suspensions(s, out);
                }
            }
        }
    }

    fn expr_suspensions(&self, id: ExprId, out: &mut Vec<Suspension>) {
        match &self.expr(id).kind {
            ExprKind::Await(inner) => {
                self.expr_suspensions(*inner, out);
                out.push(Suspension::Await(id));
            }
            ExprKind::Call { args, .. } => {
                for &a in args {
                    self.expr_suspensions(a, out);
                }
            }
            ExprKind::CollectionLiteral {
                elements,
                with_args,
            } => {
                for &a in with_args.iter().flatten() {
                    self.expr_suspensions(a, out);
                }
                for e in elements {
                    self.expr_suspensions(e.expr(), out);
                }
            }
            ExprKind::ObjectCreation {
                args, initializer, ..
            } => {
                for &a in args.iter().chain(initializer.iter().flatten()) {
                    self.expr_suspensions(a, out);
                }
            }
            ExprKind::Cast { operand, .. } => self.expr_suspensions(*operand, out),
            // A lambda suspends its own body, not this one.
            ExprKind::Constant(_)
            | ExprKind::Local { .. }
            | ExprKind::Lambda { .. }
            | ExprKind::Error => {}
        }
    }
}

/// Where a body can suspend.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Suspension {
    Await(ExprId),
    Yield(StmtId),
}

/// Builds a [`Body`]. Every node gets a distinct span in allocation order
/// unless one is given explicitly with [`BodyBuilder::at`].
pub struct BodyBuilder {
    body: Body,
    next_offset: u32,
    pending_span: Option<Span>,
}

impl BodyBuilder {
    pub fn new(id: BodyId) -> Self {
        Self {
            body: Body {
                id,
                within: None,
                return_type: None,
                is_async: false,
                exprs: Vec::new(),
                stmts: Vec::new(),
                statements: Vec::new(),
            },
            next_offset: 0,
            pending_span: None,
        }
    }

    pub fn within(mut self, def: DefId) -> Self {
        self.body.within = Some(def);
        self
    }

    pub fn returns(mut self, ty: TypeId) -> Self {
        self.body.return_type = Some(ty);
        self
    }

    pub fn async_body(mut self) -> Self {
        self.body.is_async = true;
        self
    }

    /// Use `span` for the next allocated node.
    pub fn at(&mut self, span: Span) -> &mut Self {
        self.pending_span = Some(span);
        self
    }

    fn next_span(&mut self) -> Span {
        if let Some(span) = self.pending_span.take() {
            return span;
        }
        let start = self.next_offset;
        self.next_offset += 10;
        Span::new(start, start + 5)
    }

    pub fn expr(&mut self, kind: ExprKind) -> ExprId {
        let span = self.next_span();
        let id = ExprId(self.body.exprs.len() as u32);
        self.body.exprs.push(Expr { kind, span });
        id
    }

    pub fn constant(&mut self, value: ConstantValue) -> ExprId {
        self.expr(ExprKind::Constant(value))
    }

    pub fn int(&mut self, value: i32) -> ExprId {
        self.constant(ConstantValue::Int(value))
    }

    pub fn string(&mut self, value: &str) -> ExprId {
        self.constant(ConstantValue::String(value.into()))
    }

    pub fn null(&mut self) -> ExprId {
        self.constant(ConstantValue::Null)
    }

    pub fn local(&mut self, name: Atom, ty: TypeId) -> ExprId {
        self.expr(ExprKind::Local { name, ty })
    }

    pub fn call(&mut self, callee: Atom, args: Vec<ExprId>, result: TypeId) -> ExprId {
        self.expr(ExprKind::Call {
            callee,
            args,
            result,
        })
    }

    pub fn literal(&mut self, elements: Vec<CollectionElement>) -> ExprId {
        self.expr(ExprKind::CollectionLiteral {
            elements,
            with_args: None,
        })
    }

    /// A literal of plain elements only.
    pub fn list(&mut self, items: &[ExprId]) -> ExprId {
        self.literal(items.iter().copied().map(CollectionElement::Expr).collect())
    }

    pub fn literal_with(&mut self, args: Vec<ExprId>, elements: Vec<CollectionElement>) -> ExprId {
        self.expr(ExprKind::CollectionLiteral {
            elements,
            with_args: Some(args),
        })
    }

    pub fn new_object(
        &mut self,
        ty: TypeId,
        args: Vec<ExprId>,
        initializer: Option<Vec<ExprId>>,
    ) -> ExprId {
        self.expr(ExprKind::ObjectCreation {
            ty,
            args,
            initializer,
        })
    }

    pub fn cast(&mut self, target: TypeId, operand: ExprId) -> ExprId {
        self.expr(ExprKind::Cast { target, operand })
    }

    pub fn await_expr(&mut self, operand: ExprId) -> ExprId {
        self.expr(ExprKind::Await(operand))
    }

    pub fn lambda(&mut self, body: ExprId, return_type: Option<TypeId>, expression_tree: bool) -> ExprId {
        self.expr(ExprKind::Lambda {
            body,
            return_type,
            expression_tree,
        })
    }

    fn alloc_stmt(&mut self, kind: StmtKind) -> StmtId {
        let span = self.next_span();
        let id = StmtId(self.body.stmts.len() as u32);
        self.body.stmts.push(Stmt { kind, span });
        id
    }

    /// A statement nested in a block or lock body (not added to the top level).
    pub fn nested(&mut self, kind: StmtKind) -> StmtId {
        self.alloc_stmt(kind)
    }

    /// A top-level statement.
    pub fn stmt(&mut self, kind: StmtKind) -> StmtId {
        let id = self.alloc_stmt(kind);
        self.body.statements.push(id);
        id
    }

    pub fn declare(&mut self, name: Atom, declared: Option<TypeId>, init: ExprId) -> StmtId {
        self.stmt(StmtKind::Local {
            name,
            declared,
            init: Some(init),
        })
    }

    pub fn expr_stmt(&mut self, expr: ExprId) -> StmtId {
        self.stmt(StmtKind::Expr(expr))
    }

    pub fn lock(&mut self, resource: ExprId, body: Vec<StmtId>) -> StmtId {
        self.stmt(StmtKind::Lock { resource, body })
    }

    pub fn finish(self) -> Body {
        self.body
    }
}

#[cfg(test)]
#[path = "../tests/ast_tests.rs"]
mod tests;
