//! Field kinds and the values cells carry.
//!
//! A [`Kind`] is the explicit discriminant the coercion table dispatches on.
//! A [`Value`] is the tagged union a cell holds after coercion and what
//! validators receive and return. [`FieldValue`] connects a Rust field type
//! to both: it names the kind and converts a final value back into the type.

use std::any::Any;
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use chrono::TimeDelta;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Declared width of a signed integer field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntWidth {
    I8,
    I16,
    I32,
    I64,
    Isize,
}

impl IntWidth {
    /// Clamp a full-width value into this width.
    pub fn saturate(self, v: i64) -> i64 {
        let (min, max) = match self {
            IntWidth::I8 => (i8::MIN as i64, i8::MAX as i64),
            IntWidth::I16 => (i16::MIN as i64, i16::MAX as i64),
            IntWidth::I32 => (i32::MIN as i64, i32::MAX as i64),
            IntWidth::I64 => (i64::MIN, i64::MAX),
            IntWidth::Isize => (isize::MIN as i64, isize::MAX as i64),
        };
        v.clamp(min, max)
    }
}

/// Declared width of an unsigned integer field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UintWidth {
    U8,
    U16,
    U32,
    U64,
    Usize,
}

impl UintWidth {
    /// Clamp a full-width value into this width.
    pub fn saturate(self, v: u64) -> u64 {
        let max = match self {
            UintWidth::U8 => u8::MAX as u64,
            UintWidth::U16 => u16::MAX as u64,
            UintWidth::U32 => u32::MAX as u64,
            UintWidth::U64 => u64::MAX,
            UintWidth::Usize => usize::MAX as u64,
        };
        v.min(max)
    }
}

/// Parse capability of a self-describing type.
///
/// Built with [`TextKind::of`] for any `FromStr + Default + Clone` type. The
/// parsed value travels inside [`Value::Custom`].
#[derive(Clone, Copy)]
pub struct TextKind {
    type_name: &'static str,
    parse: fn(&str) -> Result<Value, String>,
    zero: fn() -> Value,
    json: bool,
}

impl TextKind {
    pub fn of<V>() -> Self
    where
        V: FromStr + Default + Clone + Send + Sync + 'static,
        V::Err: fmt::Display,
    {
        TextKind {
            type_name: std::any::type_name::<V>(),
            parse: parse_text::<V>,
            zero: zero_text::<V>,
            json: false,
        }
    }

    /// Like [`of`](Self::of), for types that parse a JSON document. Such
    /// fields receive settings-file values as raw JSON, strings quoted.
    pub fn json<V>() -> Self
    where
        V: FromStr + Default + Clone + Send + Sync + 'static,
        V::Err: fmt::Display,
    {
        TextKind {
            json: true,
            ..Self::of::<V>()
        }
    }

    pub fn takes_json(&self) -> bool {
        self.json
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn parse(&self, raw: &str) -> Result<Value, String> {
        (self.parse)(raw)
    }

    pub fn zero(&self) -> Value {
        (self.zero)()
    }
}

impl fmt::Debug for TextKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TextKind").field(&self.type_name).finish()
    }
}

fn parse_text<V>(raw: &str) -> Result<Value, String>
where
    V: FromStr + Send + Sync + 'static,
    V::Err: fmt::Display,
{
    raw.parse::<V>()
        .map(|v| Value::Custom(Arc::new(v)))
        .map_err(|e| e.to_string())
}

fn zero_text<V: Default + Send + Sync + 'static>() -> Value {
    Value::Custom(Arc::new(V::default()))
}

/// Semantic kind of a field. Coercion is keyed by this, never by type names.
#[derive(Debug, Clone, Copy, Default)]
pub enum Kind {
    #[default]
    Str,
    Bool,
    Int(IntWidth),
    Uint(UintWidth),
    Float,
    Duration,
    /// Comma-separated list of strings.
    List,
    Text(TextKind),
}

impl Kind {
    /// Short human name, used in diagnostics and help output.
    pub fn name(&self) -> &'static str {
        match self {
            Kind::Str => "string",
            Kind::Bool => "bool",
            Kind::Int(_) => "int",
            Kind::Uint(_) => "uint",
            Kind::Float => "float",
            Kind::Duration => "duration",
            Kind::List => "list",
            Kind::Text(text) => text.type_name(),
        }
    }

    pub fn is_bool(&self) -> bool {
        matches!(self, Kind::Bool)
    }
}

/// A coerced or validated value.
#[derive(Debug, Clone)]
pub enum Value {
    Str(String),
    Bool(bool),
    Int(i64),
    Uint(u64),
    Float(f64),
    Duration(TimeDelta),
    List(Vec<String>),
    Custom(Arc<dyn Any + Send + Sync>),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Value::Uint(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_duration(&self) -> Option<TimeDelta> {
        match self {
            Value::Duration(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Borrow the payload of a [`Value::Custom`] as `T`.
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        match self {
            Value::Custom(any) => any.downcast_ref::<T>(),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Uint(a), Value::Uint(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Duration(a), Value::Duration(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Custom(a), Value::Custom(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) => write!(f, "{s}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(v) => write!(f, "{v}"),
            Value::Uint(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Duration(d) => {
                let sign = if *d < TimeDelta::zero() { "-" } else { "" };
                let abs = d.abs().to_std().unwrap_or_default();
                write!(f, "{sign}{}", humantime::format_duration(abs))
            }
            Value::List(items) => write!(f, "{}", items.join(",")),
            Value::Custom(_) => write!(f, "<custom>"),
        }
    }
}

/// A Rust type that can live in a configuration field.
///
/// Implemented for strings, booleans, every integer width, floats, durations,
/// `Vec<String>` and `PathBuf`. Self-describing types opt in through
/// [`text_value!`](crate::text_value) or by wrapping in [`Json`].
pub trait FieldValue: Sized + Send + Sync + 'static {
    fn kind() -> Kind;

    /// Convert a final value into the field type. `None` means the value has
    /// the wrong shape for this field.
    fn from_value(value: Value) -> Option<Self>;
}

impl FieldValue for String {
    fn kind() -> Kind {
        Kind::Str
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl FieldValue for PathBuf {
    fn kind() -> Kind {
        Kind::Str
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Str(s) => Some(PathBuf::from(s)),
            _ => None,
        }
    }
}

impl FieldValue for bool {
    fn kind() -> Kind {
        Kind::Bool
    }

    fn from_value(value: Value) -> Option<Self> {
        value.as_bool()
    }
}

macro_rules! signed_field_value {
    ($($ty:ty => $width:ident),* $(,)?) => {
        $(
            impl FieldValue for $ty {
                fn kind() -> Kind {
                    Kind::Int(IntWidth::$width)
                }

                fn from_value(value: Value) -> Option<Self> {
                    match value {
                        Value::Int(v) => Some(
                            <$ty>::try_from(v).unwrap_or(if v < 0 { <$ty>::MIN } else { <$ty>::MAX }),
                        ),
                        Value::Uint(v) => Some(<$ty>::try_from(v).unwrap_or(<$ty>::MAX)),
                        _ => None,
                    }
                }
            }
        )*
    };
}

macro_rules! unsigned_field_value {
    ($($ty:ty => $width:ident),* $(,)?) => {
        $(
            impl FieldValue for $ty {
                fn kind() -> Kind {
                    Kind::Uint(UintWidth::$width)
                }

                fn from_value(value: Value) -> Option<Self> {
                    match value {
                        Value::Uint(v) => Some(<$ty>::try_from(v).unwrap_or(<$ty>::MAX)),
                        Value::Int(v) => Some(<$ty>::try_from(v).unwrap_or(if v < 0 { 0 } else { <$ty>::MAX })),
                        _ => None,
                    }
                }
            }
        )*
    };
}

signed_field_value!(i8 => I8, i16 => I16, i32 => I32, i64 => I64, isize => Isize);
unsigned_field_value!(u8 => U8, u16 => U16, u32 => U32, u64 => U64, usize => Usize);

impl FieldValue for f64 {
    fn kind() -> Kind {
        Kind::Float
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Float(v) => Some(v),
            Value::Int(v) => Some(v as f64),
            Value::Uint(v) => Some(v as f64),
            _ => None,
        }
    }
}

impl FieldValue for f32 {
    fn kind() -> Kind {
        Kind::Float
    }

    fn from_value(value: Value) -> Option<Self> {
        f64::from_value(value).map(|v| v as f32)
    }
}

impl FieldValue for TimeDelta {
    fn kind() -> Kind {
        Kind::Duration
    }

    fn from_value(value: Value) -> Option<Self> {
        value.as_duration()
    }
}

/// Negative durations land as zero; use [`TimeDelta`] to keep the sign.
impl FieldValue for Duration {
    fn kind() -> Kind {
        Kind::Duration
    }

    fn from_value(value: Value) -> Option<Self> {
        let delta = value.as_duration()?;
        match delta.to_std() {
            Ok(d) => Some(d),
            Err(_) => {
                tracing::debug!(%delta, "negative duration clamped to zero");
                Some(Duration::ZERO)
            }
        }
    }
}

impl FieldValue for Vec<String> {
    fn kind() -> Kind {
        Kind::List
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::List(items) => Some(items),
            _ => None,
        }
    }
}

/// Take a clone of the payload of a [`Value::Custom`]. Backs [`text_value!`](crate::text_value).
pub fn text_from_value<V: Clone + 'static>(value: Value) -> Option<V> {
    value.downcast_ref::<V>().cloned()
}

/// Implement [`FieldValue`] for self-describing types.
///
/// The type must implement `FromStr` (with a displayable error), `Default`
/// and `Clone`. A failed parse leaves the field at `Default::default()`.
///
/// ```ignore
/// #[derive(Clone, Default)]
/// struct Endpoint { host: String, port: u16 }
/// impl std::str::FromStr for Endpoint { /* ... */ }
/// stagefig::text_value!(Endpoint);
/// ```
#[macro_export]
macro_rules! text_value {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl $crate::FieldValue for $ty {
                fn kind() -> $crate::Kind {
                    $crate::Kind::Text($crate::TextKind::of::<$ty>())
                }

                fn from_value(value: $crate::Value) -> ::core::option::Option<Self> {
                    $crate::text_from_value::<$ty>(value)
                }
            }
        )+
    };
}

/// A field whose text is a JSON document, decoded with `serde_json`.
///
/// Objects in the settings file reach this field as their raw JSON text, so
/// nested shapes round-trip without the engine knowing about them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Json<T>(pub T);

impl<T> Json<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> Deref for Json<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T> DerefMut for Json<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.0
    }
}

impl<T: DeserializeOwned> FromStr for Json<T> {
    type Err = serde_json::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        serde_json::from_str(s).map(Json)
    }
}

impl<T> FieldValue for Json<T>
where
    T: DeserializeOwned + Default + Clone + Send + Sync + 'static,
{
    fn kind() -> Kind {
        Kind::Text(TextKind::json::<Json<T>>())
    }

    fn from_value(value: Value) -> Option<Self> {
        text_from_value::<Json<T>>(value)
    }
}
