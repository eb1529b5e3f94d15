//! Non-iterating collection operations.

use meld_ast::CollectionOp;
use meld_core::{Collection, CollectionKind, Value};

use crate::error::{EvalError, EvalResult};

/// View a value as a collection: null is an empty set, a scalar a singleton set.
pub(crate) fn as_collection(value: Value) -> Collection {
    match value {
        Value::Collection(c) => c,
        Value::Null => Collection::new(CollectionKind::Set),
        scalar => Collection::from_items(CollectionKind::Set, [scalar]),
    }
}

pub(crate) fn apply_collection_op(
    op: CollectionOp,
    source: Collection,
    args: Vec<Value>,
) -> EvalResult<Value> {
    let mut args = args.into_iter();
    let mut arg = || args.next().unwrap_or(Value::Null);

    Ok(match op {
        CollectionOp::Union => {
            let mut result = source;
            for item in arg().into_items() {
                result.push(item);
            }
            Value::Collection(result)
        }
        CollectionOp::Intersection => {
            let other = as_collection(arg());
            let kind = source.kind();
            Value::collection(
                kind,
                source.into_items().into_iter().filter(|v| other.contains(v)),
            )
        }
        CollectionOp::Including => {
            let mut result = source;
            let item = arg();
            if !item.is_null() {
                result.push(item);
            }
            Value::Collection(result)
        }
        CollectionOp::Excluding => {
            let mut result = source;
            result.remove_all(&arg());
            Value::Collection(result)
        }
        CollectionOp::Includes => Value::Bool(source.contains(&arg())),
        CollectionOp::Excludes => Value::Bool(!source.contains(&arg())),
        CollectionOp::IncludesAll => {
            Value::Bool(arg().into_items().iter().all(|v| source.contains(v)))
        }
        CollectionOp::ExcludesAll => {
            Value::Bool(!arg().into_items().iter().any(|v| source.contains(v)))
        }
        CollectionOp::AsSet => Value::Collection(source.convert(CollectionKind::Set)),
        CollectionOp::AsOrderedSet => Value::Collection(source.convert(CollectionKind::OrderedSet)),
        CollectionOp::AsSequence => Value::Collection(source.convert(CollectionKind::Sequence)),
        CollectionOp::AsBag => Value::Collection(source.convert(CollectionKind::Bag)),
        CollectionOp::Size => Value::Int(source.len() as i64),
        CollectionOp::IsEmpty => Value::Bool(source.is_empty()),
        CollectionOp::NotEmpty => Value::Bool(!source.is_empty()),
        CollectionOp::First => source.items().first().cloned().unwrap_or(Value::Null),
        CollectionOp::Last => source.items().last().cloned().unwrap_or(Value::Null),
        CollectionOp::At => {
            // 1-based
            let index = arg()
                .as_int()
                .ok_or_else(|| EvalError::type_error("at() expects an Integer index"))?;
            index
                .checked_sub(1)
                .and_then(|i| usize::try_from(i).ok())
                .and_then(|i| source.items().get(i).cloned())
                .unwrap_or(Value::Null)
        }
        CollectionOp::IndexOf => {
            let item = arg();
            source
                .items()
                .iter()
                .position(|v| *v == item)
                .map(|i| Value::Int(i as i64 + 1))
                .unwrap_or(Value::Null)
        }
        CollectionOp::Flatten => {
            let kind = source.kind();
            let mut result = Collection::new(kind);
            flatten_into(&mut result, source.into_items());
            Value::Collection(result)
        }
        CollectionOp::Sum => sum(&source)?,
    })
}

fn flatten_into(result: &mut Collection, items: Vec<Value>) {
    for item in items {
        match item {
            Value::Collection(inner) => flatten_into(result, inner.into_items()),
            other => {
                result.push(other);
            }
        }
    }
}

fn sum(source: &Collection) -> EvalResult<Value> {
    let mut int_total: i64 = 0;
    let mut real_total: f64 = 0.0;
    let mut is_real = false;
    for item in source.iter() {
        match item {
            Value::Int(i) => {
                int_total = int_total
                    .checked_add(*i)
                    .ok_or_else(|| EvalError::type_error("integer overflow in sum()"))?;
                real_total += *i as f64;
            }
            Value::Real(r) => {
                is_real = true;
                real_total += r;
            }
            other => {
                return Err(EvalError::type_error(format!(
                    "sum() over non-numeric {}",
                    other.type_name()
                )))
            }
        }
    }
    Ok(if is_real {
        Value::Real(real_total)
    } else {
        Value::Int(int_total)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ints(items: &[i64]) -> Vec<Value> {
        items.iter().map(|i| Value::Int(*i)).collect()
    }

    #[test]
    fn test_union_of_sets_drops_duplicates() {
        let source = Collection::from_items(CollectionKind::Set, ints(&[1, 2]));

        let result =
            apply_collection_op(CollectionOp::Union, source, vec![Value::set(ints(&[2, 3]))])
                .unwrap();

        assert_eq!(result, Value::set(ints(&[1, 2, 3])));
    }

    #[test]
    fn test_at_is_one_based() {
        let source = Collection::from_items(CollectionKind::Sequence, ints(&[10, 20, 30]));

        let second = apply_collection_op(CollectionOp::At, source.clone(), vec![Value::Int(2)]);
        let out_of_range = apply_collection_op(CollectionOp::At, source.clone(), vec![Value::Int(0)]);
        let far_below = apply_collection_op(CollectionOp::At, source, vec![Value::Int(i64::MIN)]);

        assert_eq!(second.unwrap(), Value::Int(20));
        assert_eq!(out_of_range.unwrap(), Value::Null);
        assert_eq!(far_below.unwrap(), Value::Null);
    }

    #[test]
    fn test_sum_widens_to_real() {
        let source = Collection::from_items(
            CollectionKind::Bag,
            vec![Value::Int(1), Value::Real(0.5), Value::Int(1)],
        );

        let result = apply_collection_op(CollectionOp::Sum, source, vec![]).unwrap();

        assert_eq!(result, Value::Real(2.5));
    }

    #[test]
    fn test_flatten_nested_sequences() {
        let source = Collection::from_items(
            CollectionKind::Sequence,
            vec![
                Value::sequence(ints(&[1, 2])),
                Value::Int(3),
                Value::sequence(vec![Value::sequence(ints(&[4]))]),
            ],
        );

        let result = apply_collection_op(CollectionOp::Flatten, source, vec![]).unwrap();

        assert_eq!(result, Value::sequence(ints(&[1, 2, 3, 4])));
    }

    #[test]
    fn test_null_is_empty_collection() {
        let result =
            apply_collection_op(CollectionOp::IsEmpty, as_collection(Value::Null), vec![])
                .unwrap();

        assert_eq!(result, Value::Bool(true));
    }
}
