//! Value types for Meld properties.
//!
//! Values are what attribute slots hold and what expressions compute.
//! Meld supports scalar types (Bool, Int, Real, String), instance
//! references, and typed collections whose kind carries the
//! set/bag/ordered-set/sequence semantics of the end they came from.

use crate::InstanceId;
use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};

/// The four collection kinds of the expression language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CollectionKind {
    /// Unordered, no duplicates.
    Set,
    /// Ordered, no duplicates.
    OrderedSet,
    /// Unordered, duplicates allowed.
    Bag,
    /// Ordered, duplicates allowed.
    Sequence,
}

impl CollectionKind {
    /// Pick the collection kind matching an end's ordered/unique flags.
    pub fn from_flags(ordered: bool, unique: bool) -> Self {
        match (ordered, unique) {
            (true, true) => CollectionKind::OrderedSet,
            (false, true) => CollectionKind::Set,
            (true, false) => CollectionKind::Sequence,
            (false, false) => CollectionKind::Bag,
        }
    }

    /// Returns true if this kind rejects duplicates.
    pub fn is_unique(&self) -> bool {
        matches!(self, CollectionKind::Set | CollectionKind::OrderedSet)
    }

    /// Returns true if this kind preserves element order.
    pub fn is_ordered(&self) -> bool {
        matches!(self, CollectionKind::OrderedSet | CollectionKind::Sequence)
    }

    /// The kind produced by `collect` over this kind.
    pub fn collected(&self) -> Self {
        if self.is_ordered() {
            CollectionKind::Sequence
        } else {
            CollectionKind::Bag
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            CollectionKind::Set => "Set",
            CollectionKind::OrderedSet => "OrderedSet",
            CollectionKind::Bag => "Bag",
            CollectionKind::Sequence => "Sequence",
        }
    }
}

/// A typed collection of values.
///
/// Items are always stored in a `Vec`; unordered kinds keep insertion order
/// so evaluation is deterministic, but compare order-insensitively.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Collection {
    kind: CollectionKind,
    items: Vec<Value>,
}

impl Collection {
    /// Create an empty collection of the given kind.
    pub fn new(kind: CollectionKind) -> Self {
        Self {
            kind,
            items: Vec::new(),
        }
    }

    /// Build a collection, dropping duplicates for unique kinds.
    pub fn from_items(kind: CollectionKind, items: impl IntoIterator<Item = Value>) -> Self {
        let mut collection = Self::new(kind);
        for item in items {
            collection.push(item);
        }
        collection
    }

    pub fn kind(&self) -> CollectionKind {
        self.kind
    }

    pub fn items(&self) -> &[Value] {
        &self.items
    }

    pub fn into_items(self) -> Vec<Value> {
        self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Value> {
        self.items.iter()
    }

    pub fn contains(&self, value: &Value) -> bool {
        self.items.contains(value)
    }

    /// Append a value. Returns false if a unique collection already held it.
    pub fn push(&mut self, value: Value) -> bool {
        if self.kind.is_unique() && self.items.contains(&value) {
            return false;
        }
        self.items.push(value);
        true
    }

    /// Insert a value at a position (clamped to the length).
    pub fn insert_at(&mut self, index: usize, value: Value) -> bool {
        if self.kind.is_unique() && self.items.contains(&value) {
            return false;
        }
        let index = index.min(self.items.len());
        self.items.insert(index, value);
        true
    }

    /// Remove every occurrence of a value.
    pub fn remove_all(&mut self, value: &Value) {
        self.items.retain(|item| item != value);
    }

    /// Convert to another kind, dropping duplicates when the target is unique.
    pub fn convert(self, kind: CollectionKind) -> Self {
        Self::from_items(kind, self.items)
    }

    /// Instance handles held by this collection, in order.
    pub fn instances(&self) -> impl Iterator<Item = InstanceId> + '_ {
        self.items.iter().filter_map(|v| v.as_instance())
    }
}

impl PartialEq for Collection {
    fn eq(&self, other: &Self) -> bool {
        if self.kind != other.kind || self.items.len() != other.items.len() {
            return false;
        }
        if self.kind.is_ordered() {
            return self.items == other.items;
        }
        // Multiset comparison for unordered kinds.
        let mut remaining: Vec<&Value> = other.items.iter().collect();
        for item in &self.items {
            match remaining.iter().position(|candidate| *candidate == item) {
                Some(index) => {
                    remaining.swap_remove(index);
                }
                None => return false,
            }
        }
        true
    }
}

impl Eq for Collection {}

impl Hash for Collection {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.kind.hash(state);
        self.items.len().hash(state);
        if self.kind.is_ordered() {
            self.items.hash(state);
        } else {
            // Order-independent combination so equal multisets hash equally.
            let mut acc: u64 = 0;
            for item in &self.items {
                let mut hasher = DefaultHasher::new();
                item.hash(&mut hasher);
                acc = acc.wrapping_add(hasher.finish());
            }
            acc.hash(state);
        }
    }
}

/// A value that can be stored in an attribute slot or computed by an expression.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub enum Value {
    /// Null/missing value.
    #[default]
    Null,
    /// Boolean value.
    Bool(bool),
    /// 64-bit signed integer.
    Int(i64),
    /// 64-bit floating point.
    Real(f64),
    /// UTF-8 string.
    String(String),
    /// Reference to an instance in the store.
    Instance(InstanceId),
    /// Typed collection of values.
    Collection(Collection),
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Real(a), Value::Real(b)) => a.to_bits() == b.to_bits(),
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Instance(a), Value::Instance(b)) => a == b,
            (Value::Collection(a), Value::Collection(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Null => {}
            Value::Bool(b) => b.hash(state),
            Value::Int(i) => i.hash(state),
            Value::Real(r) => r.to_bits().hash(state),
            Value::String(s) => s.hash(state),
            Value::Instance(id) => id.hash(state),
            Value::Collection(c) => c.hash(state),
        }
    }
}

impl Value {
    /// An empty collection of the given kind.
    pub fn empty(kind: CollectionKind) -> Self {
        Value::Collection(Collection::new(kind))
    }

    /// Build a collection value.
    pub fn collection(kind: CollectionKind, items: impl IntoIterator<Item = Value>) -> Self {
        Value::Collection(Collection::from_items(kind, items))
    }

    /// Build a Set value.
    pub fn set(items: impl IntoIterator<Item = Value>) -> Self {
        Self::collection(CollectionKind::Set, items)
    }

    /// Build an OrderedSet value.
    pub fn ordered_set(items: impl IntoIterator<Item = Value>) -> Self {
        Self::collection(CollectionKind::OrderedSet, items)
    }

    /// Build a Sequence value.
    pub fn sequence(items: impl IntoIterator<Item = Value>) -> Self {
        Self::collection(CollectionKind::Sequence, items)
    }

    /// Build a Bag value.
    pub fn bag(items: impl IntoIterator<Item = Value>) -> Self {
        Self::collection(CollectionKind::Bag, items)
    }

    /// Returns true if this is a null value.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns true if this is a collection value.
    pub fn is_collection(&self) -> bool {
        matches!(self, Value::Collection(_))
    }

    /// Get as boolean if this is a Bool value.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get as integer if this is an Int value.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Get as float; integers widen.
    pub fn as_real(&self) -> Option<f64> {
        match self {
            Value::Real(r) => Some(*r),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Get as string reference if this is a String value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get as instance handle if this is an Instance value.
    pub fn as_instance(&self) -> Option<InstanceId> {
        match self {
            Value::Instance(id) => Some(*id),
            _ => None,
        }
    }

    /// Get as collection if this is a Collection value.
    pub fn as_collection(&self) -> Option<&Collection> {
        match self {
            Value::Collection(c) => Some(c),
            _ => None,
        }
    }

    /// View any value as a list of items: null is empty, a scalar is a singleton.
    pub fn into_items(self) -> Vec<Value> {
        match self {
            Value::Null => Vec::new(),
            Value::Collection(c) => c.into_items(),
            other => vec![other],
        }
    }

    /// Instance handles in this value (scalar or collection).
    pub fn instances(&self) -> Vec<InstanceId> {
        match self {
            Value::Instance(id) => vec![*id],
            Value::Collection(c) => c.instances().collect(),
            _ => Vec::new(),
        }
    }

    /// Number of items this value contributes to a multiplicity count.
    pub fn cardinality(&self) -> usize {
        match self {
            Value::Null => 0,
            Value::Collection(c) => c.len(),
            _ => 1,
        }
    }

    /// Returns the type name of this value.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "Null",
            Value::Bool(_) => "Boolean",
            Value::Int(_) => "Integer",
            Value::Real(_) => "Real",
            Value::String(_) => "String",
            Value::Instance(_) => "Instance",
            Value::Collection(c) => c.kind().name(),
        }
    }

    /// Compare values for sorting. Null is treated as less than any other value.
    /// Values of different types return Equal (stable sort behavior).
    pub fn cmp_sortable(&self, other: &Value) -> std::cmp::Ordering {
        use std::cmp::Ordering;
        match (self, other) {
            (Value::Null, Value::Null) => Ordering::Equal,
            (Value::Null, _) => Ordering::Less,
            (_, Value::Null) => Ordering::Greater,
            (Value::Int(a), Value::Int(b)) => a.cmp(b),
            (Value::Real(a), Value::Real(b)) => a.partial_cmp(b).unwrap_or(Ordering::Equal),
            (Value::Int(a), Value::Real(b)) => {
                (*a as f64).partial_cmp(b).unwrap_or(Ordering::Equal)
            }
            (Value::Real(a), Value::Int(b)) => {
                a.partial_cmp(&(*b as f64)).unwrap_or(Ordering::Equal)
            }
            (Value::String(a), Value::String(b)) => a.cmp(b),
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            (Value::Instance(a), Value::Instance(b)) => a.cmp(b),
            _ => Ordering::Equal,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Real(r) => write!(f, "{}", r),
            Value::String(s) => write!(f, "\"{}\"", s),
            Value::Instance(id) => write!(f, "#{}", id),
            Value::Collection(c) => {
                write!(f, "{}{{", c.kind().name())?;
                for (i, item) in c.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "}}")
            }
        }
    }
}

// Convenient From implementations
impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i as i64)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Real(f)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<InstanceId> for Value {
    fn from(id: InstanceId) -> Self {
        Value::Instance(id)
    }
}

impl From<Collection> for Value {
    fn from(c: Collection) -> Self {
        Value::Collection(c)
    }
}

/// Type alias for attribute slot storage.
pub type Attributes = std::collections::HashMap<String, Value>;

/// Helper macro to create attribute maps.
#[macro_export]
macro_rules! attrs {
    () => {
        std::collections::HashMap::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {
        {
            let mut map = std::collections::HashMap::new();
            $(
                map.insert($key.to_string(), $crate::Value::from($value));
            )+
            map
        }
    };
}
