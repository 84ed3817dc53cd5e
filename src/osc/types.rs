//! Typed OSC arguments
//!
//! `TypedValue` is a closed tagged union: the variant *is* the tag, so a value
//! can never disagree with its tag. Loosely typed input (osc.js `{type, value}`
//! pairs, console text) goes through [`TypedValue::from_raw`] /
//! [`TypedValue::parse`], which reject values the tag cannot represent.

use super::OscError;
use serde_json::Value;
use std::fmt;

/// OSC type tag characters supported by this client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeTag {
    /// `s` - UTF-8 string
    String,
    /// `i` - 32-bit signed integer
    Int32,
    /// `f` - 32-bit IEEE float
    Float32,
    /// `h` - 64-bit signed integer
    Int64,
    /// `d` - 64-bit IEEE float
    Float64,
    /// `b` - binary blob
    Blob,
    /// `T` - boolean true (no payload)
    True,
    /// `F` - boolean false (no payload)
    False,
    /// `N` - nil (no payload)
    Nil,
}

impl TypeTag {
    /// Tag character as written in an OSC type tag string
    pub fn as_char(self) -> char {
        match self {
            TypeTag::String => 's',
            TypeTag::Int32 => 'i',
            TypeTag::Float32 => 'f',
            TypeTag::Int64 => 'h',
            TypeTag::Float64 => 'd',
            TypeTag::Blob => 'b',
            TypeTag::True => 'T',
            TypeTag::False => 'F',
            TypeTag::Nil => 'N',
        }
    }

    /// Look up a tag by its character
    pub fn from_char(c: char) -> Result<Self, OscError> {
        match c {
            's' => Ok(TypeTag::String),
            'i' => Ok(TypeTag::Int32),
            'f' => Ok(TypeTag::Float32),
            'h' => Ok(TypeTag::Int64),
            'd' => Ok(TypeTag::Float64),
            'b' => Ok(TypeTag::Blob),
            'T' => Ok(TypeTag::True),
            'F' => Ok(TypeTag::False),
            'N' => Ok(TypeTag::Nil),
            other => Err(OscError::type_mismatch(other, "unsupported type tag")),
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// One OSC argument
#[derive(Debug, Clone, PartialEq)]
pub enum TypedValue {
    String(String),
    Int32(i32),
    Float32(f32),
    Int64(i64),
    Float64(f64),
    Blob(Vec<u8>),
    Bool(bool),
    Nil,
}

impl TypedValue {
    /// Build a value from a tag and a loosely typed raw value
    ///
    /// Integer tags require an integral number that fits the width exactly.
    /// `f` accepts any finite number within `f32` range and stores the
    /// nearest `f32`.
    pub fn from_raw(tag: TypeTag, raw: &Value) -> Result<Self, OscError> {
        let c = tag.as_char();
        match tag {
            TypeTag::String => raw
                .as_str()
                .map(|s| TypedValue::String(s.to_string()))
                .ok_or_else(|| OscError::type_mismatch(c, format!("expected string, got {}", raw))),
            TypeTag::Int32 => {
                let n = integral(c, raw)?;
                i32::try_from(n)
                    .map(TypedValue::Int32)
                    .map_err(|_| OscError::type_mismatch(c, format!("{} out of int32 range", n)))
            },
            TypeTag::Int64 => integral(c, raw).map(TypedValue::Int64),
            TypeTag::Float32 => {
                let v = finite(c, raw)?;
                if v.abs() > f64::from(f32::MAX) {
                    return Err(OscError::type_mismatch(c, format!("{} out of float32 range", v)));
                }
                Ok(TypedValue::Float32(v as f32))
            },
            TypeTag::Float64 => finite(c, raw).map(TypedValue::Float64),
            TypeTag::Blob => {
                let items = raw
                    .as_array()
                    .ok_or_else(|| OscError::type_mismatch(c, format!("expected byte array, got {}", raw)))?;
                items
                    .iter()
                    .map(|item| {
                        item.as_u64()
                            .and_then(|b| u8::try_from(b).ok())
                            .ok_or_else(|| OscError::type_mismatch(c, format!("{} is not a byte", item)))
                    })
                    .collect::<Result<Vec<u8>, _>>()
                    .map(TypedValue::Blob)
            },
            TypeTag::True => match raw {
                Value::Bool(true) | Value::Null => Ok(TypedValue::Bool(true)),
                other => Err(OscError::type_mismatch(c, format!("expected true, got {}", other))),
            },
            TypeTag::False => match raw {
                Value::Bool(false) | Value::Null => Ok(TypedValue::Bool(false)),
                other => Err(OscError::type_mismatch(c, format!("expected false, got {}", other))),
            },
            TypeTag::Nil => match raw {
                Value::Null => Ok(TypedValue::Nil),
                other => Err(OscError::type_mismatch(c, format!("expected null, got {}", other))),
            },
        }
    }

    /// Parse the console form `tag:value` (`s:hello`, `i:42`, `f:1.5`,
    /// `b:0a0b`) or a bare payload-less tag (`T`, `F`, `N`)
    pub fn parse(text: &str) -> Result<Self, OscError> {
        let (tag_text, payload) = match text.split_once(':') {
            Some((tag, payload)) => (tag, Some(payload)),
            None => (text, None),
        };

        let mut chars = tag_text.chars();
        let tag = match (chars.next(), chars.next()) {
            (Some(c), None) => TypeTag::from_char(c)?,
            _ => {
                return Err(OscError::type_mismatch(
                    '?',
                    format!("'{}' is not of the form tag:value", text),
                ))
            },
        };

        let raw = match (tag, payload) {
            (TypeTag::True | TypeTag::False | TypeTag::Nil, None) => Value::Null,
            (TypeTag::True | TypeTag::False | TypeTag::Nil, Some(_)) => {
                return Err(OscError::type_mismatch(tag.as_char(), "tag takes no value"))
            },
            (_, None) => return Err(OscError::type_mismatch(tag.as_char(), "missing value")),
            (TypeTag::String, Some(s)) => Value::String(s.to_string()),
            (TypeTag::Blob, Some(hex)) => Value::Array(
                parse_hex(hex)
                    .ok_or_else(|| OscError::type_mismatch('b', format!("'{}' is not hex", hex)))?
                    .into_iter()
                    .map(Value::from)
                    .collect(),
            ),
            (_, Some(number)) => parse_number(number)
                .ok_or_else(|| OscError::type_mismatch(tag.as_char(), format!("'{}' is not a number", number)))?,
        };

        Self::from_raw(tag, &raw)
    }

    /// The tag this value is carried under
    pub fn tag(&self) -> TypeTag {
        match self {
            TypedValue::String(_) => TypeTag::String,
            TypedValue::Int32(_) => TypeTag::Int32,
            TypedValue::Float32(_) => TypeTag::Float32,
            TypedValue::Int64(_) => TypeTag::Int64,
            TypedValue::Float64(_) => TypeTag::Float64,
            TypedValue::Blob(_) => TypeTag::Blob,
            TypedValue::Bool(true) => TypeTag::True,
            TypedValue::Bool(false) => TypeTag::False,
            TypedValue::Nil => TypeTag::Nil,
        }
    }

    /// Raw JSON payload, the inverse of [`TypedValue::from_raw`]
    pub fn to_raw(&self) -> Value {
        match self {
            TypedValue::String(s) => Value::String(s.clone()),
            TypedValue::Int32(n) => Value::from(*n),
            TypedValue::Float32(v) => Value::from(f64::from(*v)),
            TypedValue::Int64(n) => Value::from(*n),
            TypedValue::Float64(v) => Value::from(*v),
            TypedValue::Blob(bytes) => Value::Array(bytes.iter().map(|b| Value::from(*b)).collect()),
            TypedValue::Bool(b) => Value::Bool(*b),
            TypedValue::Nil => Value::Null,
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        match self {
            TypedValue::Int32(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_f32(&self) -> Option<f32> {
        match self {
            TypedValue::Float32(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            TypedValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            TypedValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Stable text form: `s:"hello"`, `i:1234`, `f:567.89`, `b:3 bytes`, `T`, `N`
    pub fn describe(&self) -> String {
        match self {
            TypedValue::String(s) => format!("s:{}", Value::String(s.clone())),
            TypedValue::Int32(n) => format!("i:{}", n),
            TypedValue::Float32(v) => format!("f:{}", v),
            TypedValue::Int64(n) => format!("h:{}", n),
            TypedValue::Float64(v) => format!("d:{}", v),
            TypedValue::Blob(bytes) => format!("b:{} bytes", bytes.len()),
            TypedValue::Bool(true) => "T".to_string(),
            TypedValue::Bool(false) => "F".to_string(),
            TypedValue::Nil => "N".to_string(),
        }
    }
}

impl fmt::Display for TypedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

impl From<&str> for TypedValue {
    fn from(s: &str) -> Self {
        TypedValue::String(s.to_string())
    }
}

impl From<String> for TypedValue {
    fn from(s: String) -> Self {
        TypedValue::String(s)
    }
}

impl From<i32> for TypedValue {
    fn from(n: i32) -> Self {
        TypedValue::Int32(n)
    }
}

impl From<f32> for TypedValue {
    fn from(v: f32) -> Self {
        TypedValue::Float32(v)
    }
}

/// Integral payload as i64; integral floats (`1234.0`) are accepted
fn integral(tag: char, raw: &Value) -> Result<i64, OscError> {
    if let Some(n) = raw.as_i64() {
        return Ok(n);
    }
    if let Some(v) = raw.as_f64() {
        // i64::MAX is not representable as f64, so the upper bound is exclusive
        if v.fract() == 0.0 && v >= -(2f64.powi(63)) && v < 2f64.powi(63) {
            return Ok(v as i64);
        }
        return Err(OscError::type_mismatch(tag, format!("{} is not an exact integer", v)));
    }
    Err(OscError::type_mismatch(tag, format!("expected number, got {}", raw)))
}

fn finite(tag: char, raw: &Value) -> Result<f64, OscError> {
    match raw.as_f64() {
        Some(v) if v.is_finite() => Ok(v),
        _ => Err(OscError::type_mismatch(tag, format!("expected finite number, got {}", raw))),
    }
}

fn parse_number(text: &str) -> Option<Value> {
    if let Ok(n) = text.parse::<i64>() {
        return Some(Value::from(n));
    }
    text.parse::<f64>()
        .ok()
        .and_then(serde_json::Number::from_f64)
        .map(Value::Number)
}

fn parse_hex(text: &str) -> Option<Vec<u8>> {
    if text.len() % 2 != 0 || !text.is_ascii() {
        return None;
    }
    (0..text.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&text[i..i + 2], 16).ok())
        .collect()
}
