//! Closed set of value kinds an application can expose.
//!
//! Every registered variable is one of six kinds. The kind decides how the value
//! is rendered into the HTML form and how a submitted field is parsed back.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use crate::error::{ControlError, Result};

/// Type tag governing how a registry value is rendered and parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Bool,
    Int,
    Float,
    Text,
    List,
    Dict,
}

impl Kind {
    pub const ALL: [Kind; 6] = [
        Kind::Bool,
        Kind::Int,
        Kind::Float,
        Kind::Text,
        Kind::List,
        Kind::Dict,
    ];

    /// Canonical names, in the same order as [`Kind::ALL`].
    pub const SUPPORTED: &'static [&'static str] = &["bool", "int", "float", "text", "list", "dict"];

    pub fn name(self) -> &'static str {
        match self {
            Kind::Bool => "bool",
            Kind::Int => "int",
            Kind::Float => "float",
            Kind::Text => "text",
            Kind::List => "list",
            Kind::Dict => "dict",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Kind {
    type Err = ControlError;

    /// Accepts the canonical names plus the common aliases `str`, `string`,
    /// `tuple` and `map`, case-insensitively.
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bool" | "boolean" => Ok(Kind::Bool),
            "int" | "integer" => Ok(Kind::Int),
            "float" => Ok(Kind::Float),
            "text" | "str" | "string" => Ok(Kind::Text),
            "list" | "tuple" => Ok(Kind::List),
            "dict" | "map" => Ok(Kind::Dict),
            _ => Err(ControlError::unsupported(s.trim())),
        }
    }
}

/// A registry value. Containers hold text: lists are one entry per line and
/// dicts map keys to values, both edited as plain lines in the browser.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    List(Vec<String>),
    Dict(BTreeMap<String, String>),
}

impl Value {
    pub fn kind(&self) -> Kind {
        match self {
            Value::Bool(_) => Kind::Bool,
            Value::Int(_) => Kind::Int,
            Value::Float(_) => Kind::Float,
            Value::Text(_) => Kind::Text,
            Value::List(_) => Kind::List,
            Value::Dict(_) => Kind::Dict,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Floats, and ints widened to float.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_dict(&self) -> Option<&BTreeMap<String, String>> {
        match self {
            Value::Dict(map) => Some(map),
            _ => None,
        }
    }

    /// Convert this value to `kind`.
    ///
    /// Conversions allowed besides the identity: bool to int, int to bool
    /// (non-zero is true), int to float, any scalar to text, and text to a
    /// list of its lines. Anything else is a [`ControlError::KindMismatch`].
    pub fn coerce(self, kind: Kind) -> Result<Value> {
        let found = self.kind();
        if found == kind {
            return Ok(self);
        }

        match (self, kind) {
            (Value::Bool(b), Kind::Int) => Ok(Value::Int(i64::from(b))),
            (Value::Int(i), Kind::Bool) => Ok(Value::Bool(i != 0)),
            (Value::Int(i), Kind::Float) => Ok(Value::Float(i as f64)),
            (scalar @ (Value::Bool(_) | Value::Int(_) | Value::Float(_)), Kind::Text) => {
                Ok(Value::Text(scalar.to_string()))
            },
            (Value::Text(text), Kind::List) => {
                Ok(Value::List(text.lines().map(str::to_string).collect()))
            },
            (_, expected) => Err(ControlError::KindMismatch { expected, found }),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::Text(text) => f.write_str(text),
            Value::List(items) => write!(f, "[{}]", items.join(", ")),
            Value::Dict(map) => {
                let pairs: Vec<String> = map.iter().map(|(k, v)| format!("{}: {}", k, v)).collect();
                write!(f, "{{{}}}", pairs.join(", "))
            },
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

macro_rules! impl_from_int {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(i: $ty) -> Self {
                    Value::Int(i64::from(i))
                }
            }
        )*
    };
}

impl_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<f32> for Value {
    fn from(x: f32) -> Self {
        Value::Float(f64::from(x))
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<String> for Value {
    fn from(text: String) -> Self {
        Value::Text(text)
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Value::Text(text.to_string())
    }
}

impl From<Vec<String>> for Value {
    fn from(items: Vec<String>) -> Self {
        Value::List(items)
    }
}

impl From<Vec<&str>> for Value {
    fn from(items: Vec<&str>) -> Self {
        Value::List(items.into_iter().map(str::to_string).collect())
    }
}

impl From<BTreeMap<String, String>> for Value {
    fn from(map: BTreeMap<String, String>) -> Self {
        Value::Dict(map)
    }
}

impl From<HashMap<String, String>> for Value {
    fn from(map: HashMap<String, String>) -> Self {
        Value::Dict(map.into_iter().collect())
    }
}

impl TryFrom<serde_json::Value> for Value {
    type Error = ControlError;

    /// Infer the kind from a JSON value's shape. `null` and nested containers
    /// have no kind of their own and are rejected.
    fn try_from(json: serde_json::Value) -> Result<Self> {
        use serde_json::Value as Json;

        match json {
            Json::Null => Err(ControlError::unsupported("null")),
            Json::Bool(b) => Ok(Value::Bool(b)),
            Json::Number(n) => match n.as_i64() {
                Some(i) => Ok(Value::Int(i)),
                None => n
                    .as_f64()
                    .map(Value::Float)
                    .ok_or_else(|| ControlError::unsupported(format!("number {}", n))),
            },
            Json::String(text) => Ok(Value::Text(text)),
            Json::Array(items) => items
                .into_iter()
                .map(|item| json_scalar_text(item, "list"))
                .collect::<Result<Vec<_>>>()
                .map(Value::List),
            Json::Object(map) => map
                .into_iter()
                .map(|(key, item)| json_scalar_text(item, "dict").map(|text| (key, text)))
                .collect::<Result<BTreeMap<_, _>>>()
                .map(Value::Dict),
        }
    }
}

fn json_scalar_text(item: serde_json::Value, container: &str) -> Result<String> {
    use serde_json::Value as Json;

    match item {
        Json::String(text) => Ok(text),
        Json::Bool(b) => Ok(b.to_string()),
        Json::Number(n) => Ok(n.to_string()),
        Json::Null => Err(ControlError::unsupported(format!("{} containing null", container))),
        Json::Array(_) => Err(ControlError::unsupported(format!(
            "{} containing a nested list",
            container
        ))),
        Json::Object(_) => Err(ControlError::unsupported(format!(
            "{} containing a nested dict",
            container
        ))),
    }
}

impl From<Value> for serde_json::Value {
    fn from(value: Value) -> Self {
        use serde_json::Value as Json;

        match value {
            Value::Bool(b) => Json::Bool(b),
            Value::Int(i) => Json::from(i),
            Value::Float(x) => serde_json::Number::from_f64(x)
                .map(Json::Number)
                .unwrap_or(Json::Null),
            Value::Text(text) => Json::String(text),
            Value::List(items) => Json::Array(items.into_iter().map(Json::String).collect()),
            Value::Dict(map) => Json::Object(
                map.into_iter()
                    .map(|(key, item)| (key, Json::String(item)))
                    .collect(),
            ),
        }
    }
}
