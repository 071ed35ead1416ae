//! Property values carried by configuration records.
//!
//! A value is either a single [`Scalar`] or an ordered sequence of scalars.
//! Equivalence between values is defined over their string coercion (see
//! [`Scalar::coerce`]), so the integer `4` and the string `"4"` compare equal.

use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A single property value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(String),
}

impl Scalar {
    /// String form used for all value comparisons.
    ///
    /// Floats with no fractional part keep one fractional digit (`4.0`), so
    /// they only match strings spelled the same way.
    pub fn coerce(&self) -> Cow<'_, str> {
        match self {
            Scalar::String(s) => Cow::Borrowed(s.as_str()),
            Scalar::Integer(i) => Cow::Owned(i.to_string()),
            Scalar::Boolean(b) => Cow::Borrowed(if *b { "true" } else { "false" }),
            Scalar::Float(f) => {
                if f.is_finite() && f.fract() == 0.0 {
                    Cow::Owned(format!("{f:.1}"))
                } else {
                    Cow::Owned(f.to_string())
                }
            }
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::String(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.coerce())
    }
}

/// A property value: one scalar or an ordered sequence of scalars.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Sequence(Vec<Scalar>),
    Scalar(Scalar),
}

impl PropertyValue {
    pub fn is_sequence(&self) -> bool {
        matches!(self, PropertyValue::Sequence(_))
    }

    /// The string value, if this is a string scalar.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::Scalar(s) => s.as_str(),
            PropertyValue::Sequence(_) => None,
        }
    }

    /// Interpret the value as a boolean flag.
    ///
    /// Booleans are taken as-is; any other scalar is `true` only when its
    /// string form is `"true"` (ignoring case). Sequences yield `default`.
    pub fn to_boolean(value: Option<&PropertyValue>, default: bool) -> bool {
        match value {
            None => default,
            Some(PropertyValue::Scalar(Scalar::Boolean(b))) => *b,
            Some(PropertyValue::Scalar(s)) => s.coerce().eq_ignore_ascii_case("true"),
            Some(PropertyValue::Sequence(_)) => default,
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Scalar(s) => write!(f, "{s}"),
            PropertyValue::Sequence(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
        }
    }
}

impl From<&str> for Scalar {
    fn from(v: &str) -> Self {
        Scalar::String(v.to_string())
    }
}

impl From<String> for Scalar {
    fn from(v: String) -> Self {
        Scalar::String(v)
    }
}

impl From<i64> for Scalar {
    fn from(v: i64) -> Self {
        Scalar::Integer(v)
    }
}

impl From<i32> for Scalar {
    fn from(v: i32) -> Self {
        Scalar::Integer(i64::from(v))
    }
}

impl From<f64> for Scalar {
    fn from(v: f64) -> Self {
        Scalar::Float(v)
    }
}

impl From<bool> for Scalar {
    fn from(v: bool) -> Self {
        Scalar::Boolean(v)
    }
}

macro_rules! property_value_from {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for PropertyValue {
                fn from(v: $ty) -> Self {
                    PropertyValue::Scalar(v.into())
                }
            }

            impl From<Vec<$ty>> for PropertyValue {
                fn from(v: Vec<$ty>) -> Self {
                    PropertyValue::Sequence(v.into_iter().map(Scalar::from).collect())
                }
            }
        )*
    };
}

property_value_from!(&str, String, i64, i32, f64, bool);

impl From<Scalar> for PropertyValue {
    fn from(v: Scalar) -> Self {
        PropertyValue::Scalar(v)
    }
}

impl From<Vec<Scalar>> for PropertyValue {
    fn from(v: Vec<Scalar>) -> Self {
        PropertyValue::Sequence(v)
    }
}
