//! Expression tree types.

use meld_core::{CollectionKind, Value};
use std::fmt;

/// An expression of the declarative language.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Constant value
    Literal(Value),
    /// The implicit `self`
    SelfRef,
    /// Let-bound, iterator-bound or parameter variable
    Var(String),
    /// Property navigation: source.property
    Nav { source: Box<Expr>, property: String },
    /// Operation invocation: source.op(args)
    Call {
        source: Box<Expr>,
        op: String,
        args: Vec<Expr>,
    },
    /// Iterator expression: source->kind(var | body)
    Iterate {
        source: Box<Expr>,
        kind: IterKind,
        var: String,
        body: Box<Expr>,
    },
    /// Collection operation: source->op(args)
    CollectionOp {
        source: Box<Expr>,
        op: CollectionOp,
        args: Vec<Expr>,
    },
    /// Collection literal: Set{a, b}
    CollectionLit {
        kind: CollectionKind,
        items: Vec<Expr>,
    },
    /// Binary operation
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
    /// Unary operation
    Unary(UnaryOp, Box<Expr>),
    /// if cond then a else b endif
    If {
        cond: Box<Expr>,
        then_branch: Box<Expr>,
        else_branch: Box<Expr>,
    },
    /// let var = value in body
    Let {
        var: String,
        value: Box<Expr>,
        body: Box<Expr>,
    },
    /// oclIsKindOf (exact = false) / oclIsTypeOf (exact = true)
    TypeTest {
        expr: Box<Expr>,
        type_name: String,
        exact: bool,
    },
    /// oclAsType
    Cast { expr: Box<Expr>, type_name: String },
    /// Qualified-name lookup in the loaded library
    Global(String),
    /// Direct call into the native procedure table; the first argument is `self`
    Native { name: String, args: Vec<Expr> },
    /// oclIsUndefined
    IsNull(Box<Expr>),
}

/// Iterator kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IterKind {
    Select,
    Reject,
    Collect,
    Exists,
    ForAll,
    Closure,
    Any,
    One,
    IsUnique,
    SortedBy,
}

impl IterKind {
    pub fn name(&self) -> &'static str {
        match self {
            IterKind::Select => "select",
            IterKind::Reject => "reject",
            IterKind::Collect => "collect",
            IterKind::Exists => "exists",
            IterKind::ForAll => "forAll",
            IterKind::Closure => "closure",
            IterKind::Any => "any",
            IterKind::One => "one",
            IterKind::IsUnique => "isUnique",
            IterKind::SortedBy => "sortedBy",
        }
    }

    /// Iterators whose body must evaluate to a Boolean.
    pub fn is_predicate(&self) -> bool {
        matches!(
            self,
            IterKind::Select
                | IterKind::Reject
                | IterKind::Exists
                | IterKind::ForAll
                | IterKind::Any
                | IterKind::One
        )
    }
}

/// Non-iterating collection operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionOp {
    Union,
    Intersection,
    Including,
    Excluding,
    Includes,
    Excludes,
    IncludesAll,
    ExcludesAll,
    AsSet,
    AsOrderedSet,
    AsSequence,
    AsBag,
    Size,
    IsEmpty,
    NotEmpty,
    First,
    Last,
    At,
    Flatten,
    Sum,
    IndexOf,
}

impl CollectionOp {
    pub fn name(&self) -> &'static str {
        match self {
            CollectionOp::Union => "union",
            CollectionOp::Intersection => "intersection",
            CollectionOp::Including => "including",
            CollectionOp::Excluding => "excluding",
            CollectionOp::Includes => "includes",
            CollectionOp::Excludes => "excludes",
            CollectionOp::IncludesAll => "includesAll",
            CollectionOp::ExcludesAll => "excludesAll",
            CollectionOp::AsSet => "asSet",
            CollectionOp::AsOrderedSet => "asOrderedSet",
            CollectionOp::AsSequence => "asSequence",
            CollectionOp::AsBag => "asBag",
            CollectionOp::Size => "size",
            CollectionOp::IsEmpty => "isEmpty",
            CollectionOp::NotEmpty => "notEmpty",
            CollectionOp::First => "first",
            CollectionOp::Last => "last",
            CollectionOp::At => "at",
            CollectionOp::Flatten => "flatten",
            CollectionOp::Sum => "sum",
            CollectionOp::IndexOf => "indexOf",
        }
    }

    /// Number of arguments the operation takes.
    pub fn arity(&self) -> usize {
        match self {
            CollectionOp::Union
            | CollectionOp::Intersection
            | CollectionOp::Including
            | CollectionOp::Excluding
            | CollectionOp::Includes
            | CollectionOp::Excludes
            | CollectionOp::IncludesAll
            | CollectionOp::ExcludesAll
            | CollectionOp::At
            | CollectionOp::IndexOf => 1,
            _ => 0,
        }
    }
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    // Comparison
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    // Logical
    And,
    Or,
    Xor,
    Implies,
    // String
    Concat,
}

impl BinaryOp {
    /// Logical operators short-circuit and recover errors in their operands.
    pub fn is_logical(&self) -> bool {
        matches!(
            self,
            BinaryOp::And | BinaryOp::Or | BinaryOp::Xor | BinaryOp::Implies
        )
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BinaryOp::Add => write!(f, "+"),
            BinaryOp::Sub => write!(f, "-"),
            BinaryOp::Mul => write!(f, "*"),
            BinaryOp::Div => write!(f, "/"),
            BinaryOp::Mod => write!(f, "mod"),
            BinaryOp::Eq => write!(f, "="),
            BinaryOp::NotEq => write!(f, "<>"),
            BinaryOp::Lt => write!(f, "<"),
            BinaryOp::LtEq => write!(f, "<="),
            BinaryOp::Gt => write!(f, ">"),
            BinaryOp::GtEq => write!(f, ">="),
            BinaryOp::And => write!(f, "and"),
            BinaryOp::Or => write!(f, "or"),
            BinaryOp::Xor => write!(f, "xor"),
            BinaryOp::Implies => write!(f, "implies"),
            BinaryOp::Concat => write!(f, "concat"),
        }
    }
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Neg,
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnaryOp::Not => write!(f, "not "),
            UnaryOp::Neg => write!(f, "-"),
        }
    }
}

fn write_args(f: &mut fmt::Formatter<'_>, args: &[Expr]) -> fmt::Result {
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", arg)?;
    }
    Ok(())
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Literal(value) => write!(f, "{}", value),
            Expr::SelfRef => write!(f, "self"),
            Expr::Var(name) => write!(f, "{}", name),
            Expr::Nav { source, property } => write!(f, "{}.{}", source, property),
            Expr::Call { source, op, args } => {
                write!(f, "{}.{}(", source, op)?;
                write_args(f, args)?;
                write!(f, ")")
            }
            Expr::Iterate {
                source,
                kind,
                var,
                body,
            } => write!(f, "{}->{}({} | {})", source, kind.name(), var, body),
            Expr::CollectionOp { source, op, args } => {
                write!(f, "{}->{}(", source, op.name())?;
                write_args(f, args)?;
                write!(f, ")")
            }
            Expr::CollectionLit { kind, items } => {
                write!(f, "{}{{", kind.name())?;
                write_args(f, items)?;
                write!(f, "}}")
            }
            Expr::Binary(op, left, right) => write!(f, "({} {} {})", left, op, right),
            Expr::Unary(op, operand) => write!(f, "{}{}", op, operand),
            Expr::If {
                cond,
                then_branch,
                else_branch,
            } => write!(
                f,
                "if {} then {} else {} endif",
                cond, then_branch, else_branch
            ),
            Expr::Let { var, value, body } => write!(f, "let {} = {} in {}", var, value, body),
            Expr::TypeTest {
                expr,
                type_name,
                exact,
            } => {
                let op = if *exact { "oclIsTypeOf" } else { "oclIsKindOf" };
                write!(f, "{}.{}({})", expr, op, type_name)
            }
            Expr::Cast { expr, type_name } => write!(f, "{}.oclAsType({})", expr, type_name),
            Expr::Global(name) => write!(f, "{}", name),
            Expr::Native { name, args } => {
                write!(f, "native {}(", name)?;
                write_args(f, args)?;
                write!(f, ")")
            }
            Expr::IsNull(expr) => write!(f, "{}.oclIsUndefined()", expr),
        }
    }
}
