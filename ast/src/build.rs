//! Construction helpers.
//!
//! ```
//! use meld_ast::build::*;
//!
//! // self.ownedSpecialization->reject(s | s.isImplied).general
//! let expr = this()
//!     .nav("ownedSpecialization")
//!     .reject("s", var("s").nav("isImplied"))
//!     .nav("general");
//! assert_eq!(
//!     expr.to_string(),
//!     "self.ownedSpecialization->reject(s | s.isImplied).general"
//! );
//! ```

use crate::{BinaryOp, CollectionOp, Expr, IterKind, UnaryOp};
use meld_core::{CollectionKind, Value};

/// `self`
pub fn this() -> Expr {
    Expr::SelfRef
}

/// A variable reference.
pub fn var(name: &str) -> Expr {
    Expr::Var(name.to_string())
}

/// A literal.
pub fn lit(value: impl Into<Value>) -> Expr {
    Expr::Literal(value.into())
}

/// The null literal.
pub fn null() -> Expr {
    Expr::Literal(Value::Null)
}

/// A qualified-name lookup in the library.
pub fn global(qualified_name: &str) -> Expr {
    Expr::Global(qualified_name.to_string())
}

/// A native procedure call.
pub fn native(name: &str, args: Vec<Expr>) -> Expr {
    Expr::Native {
        name: name.to_string(),
        args,
    }
}

/// A collection literal.
pub fn collection(kind: CollectionKind, items: Vec<Expr>) -> Expr {
    Expr::CollectionLit { kind, items }
}

pub fn set_of(items: Vec<Expr>) -> Expr {
    collection(CollectionKind::Set, items)
}

pub fn ordered_set_of(items: Vec<Expr>) -> Expr {
    collection(CollectionKind::OrderedSet, items)
}

pub fn sequence_of(items: Vec<Expr>) -> Expr {
    collection(CollectionKind::Sequence, items)
}

/// `if cond then a else b endif`
pub fn if_then_else(cond: Expr, then_branch: Expr, else_branch: Expr) -> Expr {
    Expr::If {
        cond: Box::new(cond),
        then_branch: Box::new(then_branch),
        else_branch: Box::new(else_branch),
    }
}

/// `let name = value in body`
pub fn let_in(name: &str, value: Expr, body: Expr) -> Expr {
    Expr::Let {
        var: name.to_string(),
        value: Box::new(value),
        body: Box::new(body),
    }
}

pub fn not(expr: Expr) -> Expr {
    Expr::Unary(UnaryOp::Not, Box::new(expr))
}

pub fn neg(expr: Expr) -> Expr {
    Expr::Unary(UnaryOp::Neg, Box::new(expr))
}

pub fn binary(op: BinaryOp, left: Expr, right: Expr) -> Expr {
    Expr::Binary(op, Box::new(left), Box::new(right))
}

impl Expr {
    /// `self.property`
    pub fn nav(self, property: &str) -> Expr {
        Expr::Nav {
            source: Box::new(self),
            property: property.to_string(),
        }
    }

    /// `self.op(args)`
    pub fn call(self, op: &str, args: Vec<Expr>) -> Expr {
        Expr::Call {
            source: Box::new(self),
            op: op.to_string(),
            args,
        }
    }

    pub fn iterate(self, kind: IterKind, var: &str, body: Expr) -> Expr {
        Expr::Iterate {
            source: Box::new(self),
            kind,
            var: var.to_string(),
            body: Box::new(body),
        }
    }

    pub fn select(self, var: &str, body: Expr) -> Expr {
        self.iterate(IterKind::Select, var, body)
    }

    pub fn reject(self, var: &str, body: Expr) -> Expr {
        self.iterate(IterKind::Reject, var, body)
    }

    pub fn collect(self, var: &str, body: Expr) -> Expr {
        self.iterate(IterKind::Collect, var, body)
    }

    pub fn exists(self, var: &str, body: Expr) -> Expr {
        self.iterate(IterKind::Exists, var, body)
    }

    pub fn for_all(self, var: &str, body: Expr) -> Expr {
        self.iterate(IterKind::ForAll, var, body)
    }

    pub fn closure(self, var: &str, body: Expr) -> Expr {
        self.iterate(IterKind::Closure, var, body)
    }

    pub fn any(self, var: &str, body: Expr) -> Expr {
        self.iterate(IterKind::Any, var, body)
    }

    pub fn sorted_by(self, var: &str, body: Expr) -> Expr {
        self.iterate(IterKind::SortedBy, var, body)
    }

    /// `self->op(args)`
    pub fn coll(self, op: CollectionOp, args: Vec<Expr>) -> Expr {
        Expr::CollectionOp {
            source: Box::new(self),
            op,
            args,
        }
    }

    pub fn union(self, other: Expr) -> Expr {
        self.coll(CollectionOp::Union, vec![other])
    }

    pub fn including(self, item: Expr) -> Expr {
        self.coll(CollectionOp::Including, vec![item])
    }

    pub fn excluding(self, item: Expr) -> Expr {
        self.coll(CollectionOp::Excluding, vec![item])
    }

    pub fn includes(self, item: Expr) -> Expr {
        self.coll(CollectionOp::Includes, vec![item])
    }

    pub fn excludes(self, item: Expr) -> Expr {
        self.coll(CollectionOp::Excludes, vec![item])
    }

    pub fn size(self) -> Expr {
        self.coll(CollectionOp::Size, vec![])
    }

    pub fn is_empty(self) -> Expr {
        self.coll(CollectionOp::IsEmpty, vec![])
    }

    pub fn not_empty(self) -> Expr {
        self.coll(CollectionOp::NotEmpty, vec![])
    }

    pub fn first(self) -> Expr {
        self.coll(CollectionOp::First, vec![])
    }

    pub fn as_set(self) -> Expr {
        self.coll(CollectionOp::AsSet, vec![])
    }

    pub fn as_ordered_set(self) -> Expr {
        self.coll(CollectionOp::AsOrderedSet, vec![])
    }

    pub fn flatten(self) -> Expr {
        self.coll(CollectionOp::Flatten, vec![])
    }

    pub fn and(self, other: Expr) -> Expr {
        binary(BinaryOp::And, self, other)
    }

    pub fn or(self, other: Expr) -> Expr {
        binary(BinaryOp::Or, self, other)
    }

    pub fn implies(self, other: Expr) -> Expr {
        binary(BinaryOp::Implies, self, other)
    }

    pub fn equals(self, other: Expr) -> Expr {
        binary(BinaryOp::Eq, self, other)
    }

    pub fn not_equals(self, other: Expr) -> Expr {
        binary(BinaryOp::NotEq, self, other)
    }

    /// `oclIsKindOf(type_name)`
    pub fn is_kind_of(self, type_name: &str) -> Expr {
        Expr::TypeTest {
            expr: Box::new(self),
            type_name: type_name.to_string(),
            exact: false,
        }
    }

    /// `oclIsTypeOf(type_name)`
    pub fn is_type_of(self, type_name: &str) -> Expr {
        Expr::TypeTest {
            expr: Box::new(self),
            type_name: type_name.to_string(),
            exact: true,
        }
    }

    /// `oclAsType(type_name)`
    pub fn as_type(self, type_name: &str) -> Expr {
        Expr::Cast {
            expr: Box::new(self),
            type_name: type_name.to_string(),
        }
    }

    /// `oclIsUndefined()`
    pub fn is_null(self) -> Expr {
        Expr::IsNull(Box::new(self))
    }
}
