//! Expression evaluation.

use std::collections::HashSet;

use meld_ast::{BinaryOp, Expr, IterKind, UnaryOp};
use meld_core::{Collection, CollectionKind, Value};

use crate::bindings::Bindings;
use crate::collection::{apply_collection_op, as_collection};
use crate::context::EvalContext;
use crate::error::{EvalError, EvalResult};

impl<'a> EvalContext<'a> {
    /// Evaluate an expression with the given `self` and bindings.
    pub(crate) fn eval(
        &mut self,
        expr: &Expr,
        this: &Value,
        bindings: &Bindings,
    ) -> EvalResult<Value> {
        match expr {
            Expr::Literal(value) => Ok(value.clone()),
            Expr::SelfRef => Ok(this.clone()),
            Expr::Var(name) => bindings
                .get(name)
                .cloned()
                .ok_or_else(|| EvalError::unresolved_name(name.as_str())),
            Expr::Nav { source, property } => {
                let source = self.eval(source, this, bindings)?;
                let result = self.navigate(&source, property);
                Ok(self.recover(result)?.unwrap_or(Value::Null))
            }
            Expr::Call { source, op, args } => {
                let source = self.eval(source, this, bindings)?;
                let args = self.eval_all(args, this, bindings)?;
                let result = self.call(&source, op, args);
                Ok(self.recover(result)?.unwrap_or(Value::Null))
            }
            Expr::Iterate {
                source,
                kind,
                var,
                body,
            } => {
                let source = self.eval(source, this, bindings)?;
                self.eval_iterate(source, *kind, var, body, this, bindings)
            }
            Expr::CollectionOp { source, op, args } => {
                let source = self.eval(source, this, bindings)?;
                if args.len() != op.arity() {
                    return Err(EvalError::arity_mismatch(
                        op.name(),
                        op.arity().to_string(),
                        args.len(),
                    ));
                }
                let args = self.eval_all(args, this, bindings)?;
                apply_collection_op(*op, as_collection(source), args)
            }
            Expr::CollectionLit { kind, items } => {
                let mut collection = Collection::new(*kind);
                for item in items {
                    let value = self.eval(item, this, bindings)?;
                    if !value.is_null() {
                        collection.push(value);
                    }
                }
                Ok(Value::Collection(collection))
            }
            Expr::Binary(op, left, right) if op.is_logical() => {
                self.eval_logical(*op, left, right, this, bindings)
            }
            Expr::Binary(op, left, right) => {
                let left = self.eval(left, this, bindings)?;
                let right = self.eval(right, this, bindings)?;
                eval_binary(*op, &left, &right)
            }
            Expr::Unary(op, operand) => {
                let value = self.eval(operand, this, bindings)?;
                eval_unary(*op, value)
            }
            Expr::If {
                cond,
                then_branch,
                else_branch,
            } => match self.eval(cond, this, bindings)? {
                Value::Bool(true) => self.eval(then_branch, this, bindings),
                Value::Bool(false) => self.eval(else_branch, this, bindings),
                other => Err(EvalError::type_error(format!(
                    "if condition must be Boolean, got {}",
                    other.type_name()
                ))),
            },
            Expr::Let { var, value, body } => {
                let value = self.eval(value, this, bindings)?;
                self.eval(body, this, &bindings.with(var.as_str(), value))
            }
            Expr::TypeTest {
                expr,
                type_name,
                exact,
            } => {
                let value = self.eval(expr, this, bindings)?;
                Ok(Value::Bool(self.conforms(&value, type_name, *exact)))
            }
            Expr::Cast { expr, type_name } => {
                let value = self.eval(expr, this, bindings)?;
                if value.is_null() || self.conforms(&value, type_name, false) {
                    Ok(value)
                } else {
                    Err(EvalError::type_error(format!(
                        "cannot cast {} to {}",
                        value, type_name
                    )))
                }
            }
            Expr::Global(name) => self.resolve_global(name),
            Expr::Native { name, args } => {
                let mut args = self.eval_all(args, this, bindings)?;
                if args.is_empty() {
                    return Err(EvalError::arity_mismatch(name.as_str(), "1..", 0));
                }
                let self_value = args.remove(0);
                self.call_native(name, &self_value, &args)
            }
            Expr::IsNull(inner) => {
                let result = self.eval(inner, this, bindings);
                Ok(Value::Bool(match self.recover(result)? {
                    Some(value) => value.is_null(),
                    None => true,
                }))
            }
        }
    }

    fn eval_all(
        &mut self,
        exprs: &[Expr],
        this: &Value,
        bindings: &Bindings,
    ) -> EvalResult<Vec<Value>> {
        exprs.iter().map(|e| self.eval(e, this, bindings)).collect()
    }

    /// Navigate a property. On a collection, navigates every element and
    /// flattens the results.
    fn navigate(&mut self, source: &Value, property: &str) -> EvalResult<Value> {
        match source {
            Value::Instance(id) => self.property(*id, property),
            Value::Collection(c) => {
                let mut result = Collection::new(c.kind().collected());
                for item in c.iter() {
                    let value = self.navigate(item, property);
                    if let Some(value) = self.recover(value)? {
                        for v in value.into_items() {
                            result.push(v);
                        }
                    }
                }
                Ok(Value::Collection(result))
            }
            Value::Null => Err(EvalError::type_error(format!(
                "cannot navigate '{}' on null",
                property
            ))),
            other => Err(EvalError::type_error(format!(
                "cannot navigate '{}' on {}",
                property,
                other.type_name()
            ))),
        }
    }

    /// Invoke an operation. On a collection, invokes it on every element and
    /// flattens the results.
    fn call(&mut self, source: &Value, op: &str, args: Vec<Value>) -> EvalResult<Value> {
        match source {
            Value::Collection(c) => {
                let mut result = Collection::new(c.kind().collected());
                for item in c.iter() {
                    let value = self.call(item, op, args.clone());
                    if let Some(value) = self.recover(value)? {
                        for v in value.into_items() {
                            result.push(v);
                        }
                    }
                }
                Ok(Value::Collection(result))
            }
            Value::Null => Err(EvalError::type_error(format!(
                "cannot invoke '{}' on null",
                op
            ))),
            _ => self.invoke(source, op, args),
        }
    }

    /// Evaluate a Boolean iterator body. `None` when the body's error was
    /// recovered or it produced null.
    fn predicate(
        &mut self,
        body: &Expr,
        this: &Value,
        bindings: &Bindings,
    ) -> EvalResult<Option<bool>> {
        let result = self.eval(body, this, bindings);
        match self.recover(result)? {
            Some(Value::Bool(b)) => Ok(Some(b)),
            Some(Value::Null) | None => Ok(None),
            Some(other) => {
                let err = EvalError::type_error(format!(
                    "iterator body must be Boolean, got {}",
                    other.type_name()
                ));
                self.recover(Err(err))?;
                Ok(None)
            }
        }
    }

    /// Evaluate a non-Boolean iterator body. `None` when the error was recovered.
    fn body_value(
        &mut self,
        body: &Expr,
        this: &Value,
        bindings: &Bindings,
    ) -> EvalResult<Option<Value>> {
        let result = self.eval(body, this, bindings);
        self.recover(result)
    }

    fn eval_iterate(
        &mut self,
        source: Value,
        kind: IterKind,
        var: &str,
        body: &Expr,
        this: &Value,
        bindings: &Bindings,
    ) -> EvalResult<Value> {
        let source = as_collection(source);
        let source_kind = source.kind();

        match kind {
            IterKind::Select | IterKind::Reject => {
                let keep = kind == IterKind::Select;
                let mut result = Collection::new(source_kind);
                for item in source.into_items() {
                    let scope = bindings.with(var, item.clone());
                    if let Some(b) = self.predicate(body, this, &scope)? {
                        if b == keep {
                            result.push(item);
                        }
                    }
                }
                Ok(Value::Collection(result))
            }
            IterKind::Collect => {
                let mut result = Collection::new(source_kind.collected());
                for item in source.into_items() {
                    let scope = bindings.with(var, item);
                    if let Some(value) = self.body_value(body, this, &scope)? {
                        for v in value.into_items() {
                            result.push(v);
                        }
                    }
                }
                Ok(Value::Collection(result))
            }
            IterKind::Exists => {
                for item in source.into_items() {
                    let scope = bindings.with(var, item);
                    if self.predicate(body, this, &scope)? == Some(true) {
                        return Ok(Value::Bool(true));
                    }
                }
                Ok(Value::Bool(false))
            }
            IterKind::ForAll => {
                for item in source.into_items() {
                    let scope = bindings.with(var, item);
                    if self.predicate(body, this, &scope)? != Some(true) {
                        return Ok(Value::Bool(false));
                    }
                }
                Ok(Value::Bool(true))
            }
            IterKind::Closure => {
                let result_kind = if source_kind.is_ordered() {
                    CollectionKind::OrderedSet
                } else {
                    CollectionKind::Set
                };
                let mut result = Collection::new(result_kind);
                let mut frontier = source.into_items();
                while !frontier.is_empty() {
                    let mut next = Vec::new();
                    for item in frontier {
                        let scope = bindings.with(var, item);
                        let Some(value) = self.body_value(body, this, &scope)? else {
                            continue;
                        };
                        for reached in value.into_items() {
                            if !reached.is_null() && result.push(reached.clone()) {
                                next.push(reached);
                            }
                        }
                    }
                    frontier = next;
                }
                Ok(Value::Collection(result))
            }
            IterKind::Any => {
                for item in source.into_items() {
                    let scope = bindings.with(var, item.clone());
                    if self.predicate(body, this, &scope)? == Some(true) {
                        return Ok(item);
                    }
                }
                Ok(Value::Null)
            }
            IterKind::One => {
                let mut count = 0;
                for item in source.into_items() {
                    let scope = bindings.with(var, item);
                    if self.predicate(body, this, &scope)? == Some(true) {
                        count += 1;
                    }
                }
                Ok(Value::Bool(count == 1))
            }
            IterKind::IsUnique => {
                let mut seen = HashSet::new();
                for item in source.into_items() {
                    let scope = bindings.with(var, item);
                    let key = self.body_value(body, this, &scope)?.unwrap_or(Value::Null);
                    if !seen.insert(key) {
                        return Ok(Value::Bool(false));
                    }
                }
                Ok(Value::Bool(true))
            }
            IterKind::SortedBy => {
                let mut keyed = Vec::with_capacity(source.len());
                for item in source.into_items() {
                    let scope = bindings.with(var, item.clone());
                    let key = self.body_value(body, this, &scope)?.unwrap_or(Value::Null);
                    keyed.push((key, item));
                }
                keyed.sort_by(|(a, _), (b, _)| a.cmp_sortable(b));
                let result_kind = if source_kind.is_unique() {
                    CollectionKind::OrderedSet
                } else {
                    CollectionKind::Sequence
                };
                Ok(Value::collection(
                    result_kind,
                    keyed.into_iter().map(|(_, item)| item),
                ))
            }
        }
    }

    /// Logical operators. Operands whose evaluation fails recoverably, or
    /// that are null, count as false.
    fn eval_logical(
        &mut self,
        op: BinaryOp,
        left: &Expr,
        right: &Expr,
        this: &Value,
        bindings: &Bindings,
    ) -> EvalResult<Value> {
        let l = self.operand(left, this, bindings)?;
        let short_circuit = match op {
            BinaryOp::And if !l => Some(false),
            BinaryOp::Or if l => Some(true),
            BinaryOp::Implies if !l => Some(true),
            _ => None,
        };
        if let Some(b) = short_circuit {
            return Ok(Value::Bool(b));
        }
        let r = self.operand(right, this, bindings)?;
        Ok(Value::Bool(match op {
            BinaryOp::And => l && r,
            BinaryOp::Or => l || r,
            BinaryOp::Xor => l != r,
            _ => !l || r,
        }))
    }

    fn operand(&mut self, expr: &Expr, this: &Value, bindings: &Bindings) -> EvalResult<bool> {
        let result = match self.eval(expr, this, bindings) {
            Ok(Value::Bool(b)) => Ok(Value::Bool(b)),
            Ok(Value::Null) => Ok(Value::Bool(false)),
            Ok(other) => Err(EvalError::type_error(format!(
                "logical operand must be Boolean, got {}",
                other.type_name()
            ))),
            Err(err) => Err(err),
        };
        Ok(matches!(self.recover(result)?, Some(Value::Bool(true))))
    }
}

fn eval_unary(op: UnaryOp, value: Value) -> EvalResult<Value> {
    match (op, value) {
        (UnaryOp::Not, Value::Bool(b)) => Ok(Value::Bool(!b)),
        (UnaryOp::Not, Value::Null) => Ok(Value::Null),
        (UnaryOp::Neg, Value::Int(i)) => i
            .checked_neg()
            .map(Value::Int)
            .ok_or_else(|| EvalError::type_error(format!("integer overflow negating {i}"))),
        (UnaryOp::Neg, Value::Real(r)) => Ok(Value::Real(-r)),
        (op, value) => Err(EvalError::type_error(format!(
            "cannot apply {:?} to {}",
            op,
            value.type_name()
        ))),
    }
}

fn eval_binary(op: BinaryOp, left: &Value, right: &Value) -> EvalResult<Value> {
    match op {
        BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Mod => {
            eval_arithmetic(op, left, right)
        }
        BinaryOp::Div => {
            let (Some(l), Some(r)) = (left.as_real(), right.as_real()) else {
                return Err(type_mismatch(op, left, right));
            };
            if r == 0.0 {
                return Err(EvalError::DivisionByZero);
            }
            Ok(Value::Real(l / r))
        }
        BinaryOp::Eq => Ok(Value::Bool(values_equal(left, right))),
        BinaryOp::NotEq => Ok(Value::Bool(!values_equal(left, right))),
        BinaryOp::Lt | BinaryOp::LtEq | BinaryOp::Gt | BinaryOp::GtEq => {
            let ordering = compare(left, right).ok_or_else(|| type_mismatch(op, left, right))?;
            Ok(Value::Bool(match op {
                BinaryOp::Lt => ordering.is_lt(),
                BinaryOp::LtEq => ordering.is_le(),
                BinaryOp::Gt => ordering.is_gt(),
                _ => ordering.is_ge(),
            }))
        }
        BinaryOp::Concat => match (left, right) {
            (Value::String(l), Value::String(r)) => Ok(Value::String(format!("{}{}", l, r))),
            _ => Err(type_mismatch(op, left, right)),
        },
        BinaryOp::And | BinaryOp::Or | BinaryOp::Xor | BinaryOp::Implies => {
            match (left, right) {
                (Value::Bool(l), Value::Bool(r)) => Ok(Value::Bool(match op {
                    BinaryOp::And => *l && *r,
                    BinaryOp::Or => *l || *r,
                    BinaryOp::Xor => l != r,
                    _ => !*l || *r,
                })),
                _ => Err(type_mismatch(op, left, right)),
            }
        }
    }
}

fn eval_arithmetic(op: BinaryOp, left: &Value, right: &Value) -> EvalResult<Value> {
    match (left, right) {
        (Value::Int(l), Value::Int(r)) => {
            let result = match op {
                BinaryOp::Add => l.checked_add(*r),
                BinaryOp::Sub => l.checked_sub(*r),
                BinaryOp::Mul => l.checked_mul(*r),
                _ => {
                    if *r == 0 {
                        return Err(EvalError::DivisionByZero);
                    }
                    l.checked_rem(*r)
                }
            };
            result
                .map(Value::Int)
                .ok_or_else(|| EvalError::type_error(format!("integer overflow in {}", op)))
        }
        (Value::String(l), Value::String(r)) if op == BinaryOp::Add => {
            Ok(Value::String(format!("{}{}", l, r)))
        }
        _ => {
            let (Some(l), Some(r)) = (left.as_real(), right.as_real()) else {
                return Err(type_mismatch(op, left, right));
            };
            Ok(Value::Real(match op {
                BinaryOp::Add => l + r,
                BinaryOp::Sub => l - r,
                BinaryOp::Mul => l * r,
                _ => {
                    if r == 0.0 {
                        return Err(EvalError::DivisionByZero);
                    }
                    l % r
                }
            }))
        }
    }
}

/// Equality with Integer/Real widening.
pub(crate) fn values_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Int(l), Value::Real(r)) | (Value::Real(r), Value::Int(l)) => (*l as f64) == *r,
        _ => left == right,
    }
}

fn compare(left: &Value, right: &Value) -> Option<std::cmp::Ordering> {
    match (left, right) {
        (Value::String(l), Value::String(r)) => Some(l.cmp(r)),
        _ => left.as_real()?.partial_cmp(&right.as_real()?),
    }
}

fn type_mismatch(op: BinaryOp, left: &Value, right: &Value) -> EvalError {
    EvalError::type_error(format!(
        "cannot apply {} to {} and {}",
        op,
        left.type_name(),
        right.type_name()
    ))
}
