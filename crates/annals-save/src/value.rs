use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A parsed save value.
///
/// One tagged union covers every shape the format produces: scalars (string,
/// integer, float, boolean), lists, and string-keyed maps. Duplicate keys in
/// the source are the only way a `List` appears under a map key — the parser
/// coalesces them in encounter order. Callers pattern-match or go through the
/// accessors below; nothing here assumes a shape without checking.
///
/// The parser never emits `Bool`: `yes`/`no` stay strings in the tree, and
/// [`Value::as_yes_no`] interprets them on demand. The variant exists so
/// callers that normalize trees programmatically have somewhere to put real
/// booleans.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// A string scalar: quoted content or a bare identifier.
    Str(String),
    /// An integer scalar.
    Int(i64),
    /// A float scalar.
    Float(f64),
    /// A boolean scalar (see type-level docs; not produced by the parser).
    Bool(bool),
    /// An ordered sequence of values.
    List(Vec<Value>),
    /// A block of `key = value` pairs. Keys are unique; duplicates in the
    /// source collapse into a `List` under the repeated key.
    Map(HashMap<String, Value>),
}

impl Value {
    /// Build a map value from key/value pairs.
    pub fn map<I, K, V>(entries: I) -> Value
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        Value::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Build a list value from elements.
    pub fn list<I, V>(items: I) -> Value
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Value::List(items.into_iter().map(Into::into).collect())
    }

    /// Look up a key in a map value. `None` for other shapes or missing keys.
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Map(entries) => entries.get(key),
            _ => None,
        }
    }

    /// Walk a chain of map keys. `None` as soon as any step is not a map or
    /// lacks the key.
    pub fn get_path(&self, path: &[&str]) -> Option<&Value> {
        let mut current = self;
        for key in path {
            current = current.get(key)?;
        }
        Some(current)
    }

    /// The string content of a string scalar.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Integer view of a scalar. Strings parse permissively; floats convert
    /// only when they carry no fractional part. Save data is loosely typed,
    /// so the boundary is where the slack gets absorbed.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            Value::Str(s) => s.parse().ok(),
            Value::Float(n) if n.fract() == 0.0 => Some(*n as i64),
            _ => None,
        }
    }

    /// Float view of a scalar. Integers widen; strings parse permissively.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(n) => Some(*n),
            Value::Int(n) => Some(*n as f64),
            Value::Str(s) => s.parse().ok(),
            _ => None,
        }
    }

    /// Boolean view: the identifiers `yes`/`no`, or a real `Bool`.
    pub fn as_yes_no(&self) -> Option<bool> {
        match self {
            Value::Str(s) if s == "yes" => Some(true),
            Value::Str(s) if s == "no" => Some(false),
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// The underlying map of a map value.
    pub fn as_map(&self) -> Option<&HashMap<String, Value>> {
        match self {
            Value::Map(entries) => Some(entries),
            _ => None,
        }
    }

    /// The underlying slice of a list value.
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Whether this value is a map.
    pub fn is_map(&self) -> bool {
        matches!(self, Value::Map(_))
    }

    /// Whether this value is a list.
    pub fn is_list(&self) -> bool {
        matches!(self, Value::List(_))
    }

    /// Iterate this value as a sequence. The format collapses one-element
    /// lists into bare values, so callers that expect "zero or more" must go
    /// through this: a list yields its elements, anything else yields itself
    /// once.
    pub fn iter_coerced(&self) -> OneOrMany<'_> {
        match self {
            Value::List(items) => OneOrMany::Many(items.iter()),
            other => OneOrMany::One(std::iter::once(other)),
        }
    }

    /// Iterate the entries of a map whose keys are numeric ids (the save's
    /// `country`, `planet`, `war`, ... tables), in ascending id order.
    /// Non-numeric keys and non-map values yield nothing.
    pub fn entries_by_id(&self) -> impl Iterator<Item = (i64, &Value)> {
        let mut entries: Vec<(i64, &Value)> = self
            .as_map()
            .into_iter()
            .flat_map(|entries| entries.iter())
            .filter_map(|(key, value)| key.parse::<i64>().ok().map(|id| (id, value)))
            .collect();
        entries.sort_unstable_by_key(|&(id, _)| id);
        entries.into_iter()
    }
}

/// Iterator over a value coerced to a sequence; see [`Value::iter_coerced`].
#[derive(Debug)]
pub enum OneOrMany<'a> {
    /// A non-list value, yielded exactly once.
    One(std::iter::Once<&'a Value>),
    /// A list's elements, in order.
    Many(std::slice::Iter<'a, Value>),
}

impl<'a> Iterator for OneOrMany<'a> {
    type Item = &'a Value;

    fn next(&mut self) -> Option<&'a Value> {
        match self {
            OneOrMany::One(inner) => inner.next(),
            OneOrMany::Many(inner) => inner.next(),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Value {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Value {
        Value::Str(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Value {
        Value::Int(n)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Value {
        Value::Float(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Value {
        Value::Bool(b)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Value {
        Value::List(items)
    }
}

impl From<HashMap<String, Value>> for Value {
    fn from(entries: HashMap<String, Value>) -> Value {
        Value::Map(entries)
    }
}
