//! Flattened syntax tree.
//!
//! Expressions live in an [`ExprArena`] and refer to each other by
//! [`ExprId`]. Statements are plain vectors; closures are stored in the arena
//! alongside expressions so closure values can point back at their body.

use std::fmt;
use std::sync::Arc;

use strand_ir::Span;

/// Index of an expression in the arena.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ExprId(u32);

/// Index of a closure body in the arena.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ClosureId(u32);

#[derive(Clone, Debug, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Expr { kind, span }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ExprKind {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(Arc<str>),
    Ident(String),
    List(Vec<ExprId>),
    /// Map literal; identifier keys are already turned into strings.
    Map(Vec<(ExprId, ExprId)>),
    Unary {
        op: UnaryOp,
        operand: ExprId,
    },
    Binary {
        op: BinaryOp,
        left: ExprId,
        right: ExprId,
    },
    /// `receiver.name`
    Property {
        receiver: ExprId,
        name: String,
    },
    /// `receiver.method(args)`
    MethodCall {
        receiver: ExprId,
        method: String,
        args: Vec<ExprId>,
    },
    /// Unqualified `name(args)`.
    Call {
        name: String,
        args: Vec<ExprId>,
    },
    /// Any other callee: `(expr)(args)`, `fns[0](args)`.
    CallValue {
        callee: ExprId,
        args: Vec<ExprId>,
    },
    Index {
        receiver: ExprId,
        index: ExprId,
    },
    Closure(ClosureId),
    Assign {
        target: AssignTarget,
        value: ExprId,
    },
}

/// Left-hand side of an assignment.
#[derive(Clone, Debug, PartialEq)]
pub enum AssignTarget {
    Name(String),
    /// `name[index] = value`
    Index { name: String, index: ExprId },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

impl BinaryOp {
    /// Precedence level (lower binds tighter).
    pub fn precedence(self) -> u8 {
        match self {
            BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => 1,
            BinaryOp::Add | BinaryOp::Sub => 2,
            BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => 3,
            BinaryOp::Eq | BinaryOp::Ne => 4,
            BinaryOp::And => 5,
            BinaryOp::Or => 6,
        }
    }

    pub fn as_symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_symbol())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Stmt {
    Expr(ExprId),
    Var {
        name: String,
        init: ExprId,
    },
    Return(Option<ExprId>),
    If {
        cond: ExprId,
        then_block: Block,
        else_block: Option<Block>,
    },
    While {
        cond: ExprId,
        body: Block,
    },
    For {
        var: String,
        iterable: ExprId,
        body: Block,
    },
}

pub type Block = Vec<Stmt>;

/// A top-level `def`.
#[derive(Clone, Debug, PartialEq)]
pub struct FunctionDef {
    pub name: String,
    pub params: Vec<String>,
    pub body: Block,
    pub span: Span,
}

/// A closure literal's parameters and body.
#[derive(Clone, Debug, PartialEq)]
pub struct ClosureDef {
    /// `None` when declared without `->`; the closure then binds `it`.
    pub params: Option<Vec<String>>,
    pub body: Block,
    pub span: Span,
}

/// Arena owning every expression and closure of one script.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ExprArena {
    exprs: Vec<Expr>,
    closures: Vec<ClosureDef>,
}

impl ExprArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc(&mut self, expr: Expr) -> ExprId {
        let id = ExprId(u32::try_from(self.exprs.len()).unwrap_or(u32::MAX));
        self.exprs.push(expr);
        id
    }

    pub fn get(&self, id: ExprId) -> &Expr {
        &self.exprs[id.0 as usize]
    }

    pub fn alloc_closure(&mut self, closure: ClosureDef) -> ClosureId {
        let id = ClosureId(u32::try_from(self.closures.len()).unwrap_or(u32::MAX));
        self.closures.push(closure);
        id
    }

    pub fn closure(&self, id: ClosureId) -> &ClosureDef {
        &self.closures[id.0 as usize]
    }

    pub fn len(&self) -> usize {
        self.exprs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exprs.is_empty()
    }
}

/// A parsed script: top-level statements plus hoisted functions.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Script {
    pub arena: ExprArena,
    pub body: Block,
    pub functions: Vec<FunctionDef>,
}

impl Script {
    pub fn function(&self, name: &str) -> Option<(usize, &FunctionDef)> {
        self.functions
            .iter()
            .enumerate()
            .find(|(_, def)| def.name == name)
    }
}
