use std::cell::{Ref, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;

/// One node of the restricted value model carried inside a framed block.
///
/// Containers are shared handles rather than owned trees because the
/// producer assembles them from a live, possibly aliased, possibly cyclic
/// record graph. Identity (for cycle detection) is the container pointer.
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
    List(ValueList),
    Map(ValueMap),
}

/// Key supplied by producers ingesting duck-typed host records.
#[derive(Debug, Clone, PartialEq)]
pub enum MapKey {
    Int(i64),
    Text(String),
}

impl MapKey {
    fn into_string(self) -> String {
        match self {
            MapKey::Int(n) => n.to_string(),
            MapKey::Text(s) => s,
        }
    }
}

/// Ordered list container, shared and mutable.
#[derive(Debug, Clone, Default)]
pub struct ValueList(Rc<RefCell<Vec<Value>>>);

/// Key/value container, shared and mutable. Key order carries no meaning.
#[derive(Debug, Clone, Default)]
pub struct ValueMap(Rc<RefCell<BTreeMap<String, Value>>>);

impl Value {
    pub fn list() -> ValueList {
        ValueList::new()
    }

    pub fn map() -> ValueMap {
        ValueMap::new()
    }

    pub fn text(text: impl Into<String>) -> Value {
        Value::Text(text.into())
    }

    /// Build a container from raw `(key, value)` pairs the way the producer
    /// ingests untyped host tables: the result is a [`Value::List`] iff the
    /// key set is exactly the contiguous integers `1..=N` for some `N >= 1`
    /// (values in key order), otherwise a [`Value::Map`] with stringified
    /// keys. Duplicate keys keep the last value.
    pub fn from_entries(entries: Vec<(MapKey, Value)>) -> Value {
        if !entries.is_empty() {
            let mut indexed: BTreeMap<i64, Value> = BTreeMap::new();
            let mut all_int = true;
            for (key, value) in &entries {
                match key {
                    MapKey::Int(n) => {
                        indexed.insert(*n, value.clone());
                    }
                    MapKey::Text(_) => {
                        all_int = false;
                        break;
                    }
                }
            }
            let contiguous = all_int
                && indexed.len() == entries.len()
                && indexed
                    .keys()
                    .enumerate()
                    .all(|(i, key)| *key == i as i64 + 1);
            if contiguous {
                let list = ValueList::new();
                for value in indexed.into_values() {
                    list.push(value);
                }
                return Value::List(list);
            }
        }

        let map = ValueMap::new();
        for (key, value) in entries {
            map.insert(key.into_string(), value);
        }
        Value::Map(map)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Numeric value when it carries no fractional part.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Number(n) if n.fract() == 0.0 && n.is_finite() => Some(*n as i64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&ValueList> {
        match self {
            Value::List(list) => Some(list),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&ValueMap> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl ValueList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, value: Value) {
        self.0.borrow_mut().push(value);
    }

    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    pub fn get(&self, index: usize) -> Option<Value> {
        self.0.borrow().get(index).cloned()
    }

    pub fn items(&self) -> Ref<'_, Vec<Value>> {
        self.0.borrow()
    }

    pub fn to_vec(&self) -> Vec<Value> {
        self.0.borrow().clone()
    }

    /// Container identity used by the encoder's visited set.
    pub fn identity(&self) -> usize {
        Rc::as_ptr(&self.0) as usize
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl ValueMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, key: impl Into<String>, value: Value) {
        self.0.borrow_mut().insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.0.borrow().get(key).cloned()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.borrow().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    pub fn entries(&self) -> Ref<'_, BTreeMap<String, Value>> {
        self.0.borrow()
    }

    /// Container identity used by the encoder's visited set.
    pub fn identity(&self) -> usize {
        Rc::as_ptr(&self.0) as usize
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Number(value as f64)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<ValueList> for Value {
    fn from(value: ValueList) -> Self {
        Value::List(value)
    }
}

impl From<ValueMap> for Value {
    fn from(value: ValueMap) -> Self {
        Value::Map(value)
    }
}

// Structural equality; aliased containers short-circuit on pointer identity
// so the common compare paths stay cheap. Comparing two values that are both
// cyclic through distinct containers is the caller's misuse.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::List(a), Value::List(b)) => a.ptr_eq(b) || *a.items() == *b.items(),
            (Value::Map(a), Value::Map(b)) => a.ptr_eq(b) || *a.entries() == *b.entries(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contiguous_integer_keys_collapse_to_list() {
        let value = Value::from_entries(vec![
            (MapKey::Int(1), Value::from("a")),
            (MapKey::Int(2), Value::from("b")),
            (MapKey::Int(3), Value::from("c")),
        ]);
        let list = value.as_list().expect("expected a list");
        assert_eq!(list.len(), 3);
        assert_eq!(list.get(0).unwrap().as_str(), Some("a"));
        assert_eq!(list.get(2).unwrap().as_str(), Some("c"));
    }

    #[test]
    fn gap_in_integer_keys_stays_a_map() {
        let value = Value::from_entries(vec![
            (MapKey::Int(1), Value::from("a")),
            (MapKey::Int(3), Value::from("c")),
        ]);
        let map = value.as_map().expect("expected a map");
        assert_eq!(map.get("3").unwrap().as_str(), Some("c"));
    }

    #[test]
    fn zero_based_keys_stay_a_map() {
        let value = Value::from_entries(vec![
            (MapKey::Int(0), Value::from("a")),
            (MapKey::Int(1), Value::from("b")),
        ]);
        assert!(value.as_map().is_some());
    }

    #[test]
    fn mixed_keys_stay_a_map() {
        let value = Value::from_entries(vec![
            (MapKey::Int(1), Value::from("a")),
            (MapKey::Text("name".to_string()), Value::from("b")),
        ]);
        let map = value.as_map().expect("expected a map");
        assert_eq!(map.get("1").unwrap().as_str(), Some("a"));
        assert_eq!(map.get("name").unwrap().as_str(), Some("b"));
    }

    #[test]
    fn structural_equality_ignores_container_identity() {
        let a = Value::map();
        a.insert("turn", Value::from(3i64));
        let b = Value::map();
        b.insert("turn", Value::from(3i64));
        assert_eq!(Value::Map(a), Value::Map(b));
    }

    #[test]
    fn integral_number_reads_back_as_i64() {
        assert_eq!(Value::from(42i64).as_i64(), Some(42));
        assert_eq!(Value::from(42.5).as_i64(), None);
        assert_eq!(Value::from(42.5).as_f64(), Some(42.5));
    }
}
