//! Named validators and the registry that dispatches to them.
//!
//! A field names its validator with `valid = "..."`. After all stages have
//! run, the registry is asked for that name with the cell's raw text and
//! coerced value. Entries are scanned in registration order and the first one
//! that returns `Some` produces the field's final value. A validator that
//! returns `None` declines and lets the next entry with the same name try.
//!
//! The built-ins always answer: they normalise or fall back to a zero value
//! rather than decline. Register a custom validator *before* the built-ins
//! (start from [`ValidatorRegistry::empty`]) to take precedence over a
//! built-in of the same name.

use std::fmt;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};

use regex::Regex;
use uuid::Uuid;

use crate::cell::Cell;
use crate::coerce;
use crate::value::{Kind, Value};

/// Validator for the reserved config-path field.
pub const DEFAULT_CONFIGURATION_FILE: &str = "default_configuration_file";

/// A named post-merge transform.
pub trait Validator: Send + Sync {
    fn name(&self) -> &str;

    /// Produce the final value from the raw text and the coerced value, or
    /// `None` to decline.
    fn validate(&self, raw: &str, value: &Value) -> Option<Value>;
}

/// A [`Validator`] backed by a closure. See [`validator`].
pub struct FnValidator<F> {
    name: String,
    run: F,
}

impl<F> Validator for FnValidator<F>
where
    F: Fn(&str, &Value) -> Option<Value> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn validate(&self, raw: &str, value: &Value) -> Option<Value> {
        (self.run)(raw, value)
    }
}

/// Wrap a closure as a named validator.
///
/// ```ignore
/// let max10 = stagefig::validator("max10", |_, v| match v.as_i64() {
///     Some(n) if n > 10 => Some(stagefig::Value::Int(10)),
///     _ => None,
/// });
/// ```
pub fn validator<F>(name: impl Into<String>, run: F) -> FnValidator<F>
where
    F: Fn(&str, &Value) -> Option<Value> + Send + Sync,
{
    FnValidator {
        name: name.into(),
        run,
    }
}

/// Ordered collection of validators, shared by reference with every
/// resolution.
#[derive(Clone)]
pub struct ValidatorRegistry {
    entries: Vec<Arc<dyn Validator>>,
}

impl ValidatorRegistry {
    /// A registry with nothing in it.
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// A registry holding only the built-in validators.
    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();
        registry.register_builtins();
        registry
    }

    pub fn register(&mut self, validator: impl Validator + 'static) -> &mut Self {
        self.register_shared(Arc::new(validator))
    }

    pub fn register_shared(&mut self, validator: Arc<dyn Validator>) -> &mut Self {
        tracing::trace!(name = validator.name(), "validator registered");
        self.entries.push(validator);
        self
    }

    /// Append the built-in validators after whatever is already registered.
    pub fn register_builtins(&mut self) -> &mut Self {
        for &(name, run) in BUILTINS {
            self.register(Builtin { name, run });
        }
        self
    }

    /// Registered names in scan order, duplicates included.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|v| v.name())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Run the first validator called `name` that accepts the value.
    pub fn validate(&self, name: &str, raw: &str, value: &Value) -> Option<Value> {
        self.entries
            .iter()
            .filter(|v| v.name() == name)
            .find_map(|v| v.validate(raw, value))
    }

    /// Final value of a cell: its validator's output, or the coerced value if
    /// the field has no validator or nothing answered.
    pub fn finalize(&self, cell: &Cell<'_>) -> Value {
        let Some(name) = cell.spec().validator() else {
            return cell.value().clone();
        };
        match self.validate(name, cell.raw(), cell.value()) {
            Some(value) => value,
            None => {
                tracing::debug!(field = cell.name(), validator = name, "no validator answered, keeping coerced value");
                cell.value().clone()
            }
        }
    }
}

impl Default for ValidatorRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl fmt::Debug for ValidatorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

struct Builtin {
    name: &'static str,
    run: fn(&str, &Value) -> Value,
}

impl Validator for Builtin {
    fn name(&self) -> &str {
        self.name
    }

    fn validate(&self, raw: &str, value: &Value) -> Option<Value> {
        Some((self.run)(raw, value))
    }
}

type BuiltinFn = fn(&str, &Value) -> Value;

const BUILTINS: &[(&str, BuiltinFn)] = &[
    (DEFAULT_CONFIGURATION_FILE, existing_file_value),
    ("config_file", existing_file_value),
    ("file", file_value),
    ("tmp_file", tmp_file_value),
    ("url", url_value),
    ("bool", bool_value),
    ("int", int_value),
    ("uint", uint_value),
    ("float", float_value),
    ("duration", duration_value),
    ("uuid", uuid_value),
];

fn text<'v>(raw: &'v str, value: &'v Value) -> &'v str {
    value.as_str().unwrap_or(raw)
}

fn existing_file_value(raw: &str, value: &Value) -> Value {
    Value::Str(existing_file(text(raw, value)))
}

fn file_value(raw: &str, value: &Value) -> Value {
    Value::Str(ensure_file(text(raw, value)))
}

fn tmp_file_value(raw: &str, value: &Value) -> Value {
    Value::Str(tmp_file(text(raw, value)))
}

fn url_value(raw: &str, value: &Value) -> Value {
    Value::Str(normalize_url(text(raw, value)))
}

fn bool_value(raw: &str, _: &Value) -> Value {
    Value::Bool(coerce::parse_bool(raw.trim()).unwrap_or(false))
}

fn int_value(raw: &str, _: &Value) -> Value {
    Value::Int(raw.trim().parse().unwrap_or(0))
}

fn uint_value(raw: &str, _: &Value) -> Value {
    Value::Uint(raw.trim().parse().unwrap_or(0))
}

fn float_value(raw: &str, _: &Value) -> Value {
    Value::Float(raw.trim().parse().unwrap_or(0.0))
}

fn duration_value(raw: &str, _: &Value) -> Value {
    coerce::parse_duration(raw.trim())
        .map(Value::Duration)
        .unwrap_or_else(|_| coerce::zero(&Kind::Duration))
}

fn uuid_value(raw: &str, _: &Value) -> Value {
    match Uuid::parse_str(raw.trim()) {
        Ok(id) => Value::Str(id.hyphenated().to_string()),
        Err(_) => {
            let id = Uuid::new_v4();
            tracing::debug!(raw, %id, "not a UUID, generated a fresh one");
            Value::Str(id.to_string())
        }
    }
}

/// `path` if it names an existing file, otherwise the empty string.
pub fn existing_file(path: &str) -> String {
    let path = path.trim();
    if !path.is_empty() && Path::new(path).is_file() {
        path.to_string()
    } else {
        String::new()
    }
}

/// Normalise `path` and make sure the file exists, creating it and its parent
/// directories if needed. Blank input gives the empty string.
pub fn ensure_file(path: &str) -> String {
    let path = path.trim();
    if path.is_empty() {
        return String::new();
    }

    let path: PathBuf = Path::new(path).components().collect();
    if !path.exists() {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty())
            && let Err(e) = fs::create_dir_all(parent)
        {
            tracing::debug!(path = %parent.display(), error = %e, "cannot create directory");
        }
        match OpenOptions::new().create(true).append(true).open(&path) {
            Ok(_) => tracing::debug!(path = %path.display(), "created empty file"),
            Err(e) => tracing::debug!(path = %path.display(), error = %e, "cannot create file"),
        }
    }
    path.to_string_lossy().into_owned()
}

/// Place the base name of `path` in the system temp directory and make sure
/// the file exists there.
pub fn tmp_file(path: &str) -> String {
    let Some(base) = path.trim().rsplit(['/', '\\']).find(|s| !s.is_empty()) else {
        return String::new();
    };
    ensure_file(&std::env::temp_dir().join(base).to_string_lossy())
}

static ADDRESS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^.*(://|^)[^/]+").unwrap());
static SCHEME: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^.*(://|^)").unwrap());
static HOST: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[^/:$]+").unwrap());
static DIGITS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d").unwrap());
static NON_DIGITS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\D").unwrap());
static DOTTED_QUAD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(25[0-5]|2[0-4]\d|1\d\d|[1-9]?\d)(\.(25[0-5]|2[0-4]\d|1\d\d|[1-9]?\d)){3}$").unwrap()
});

const DEFAULT_PORT: &str = "80";

/// Reduce a URL-ish string to `host:port`.
///
/// The scheme and any path are dropped and a missing port becomes `80`. A
/// host made only of digits and dots must be a valid IPv4 address. Anything
/// that leaves no usable host gives the empty string.
pub fn normalize_url(raw: &str) -> String {
    let Some(address) = ADDRESS.find(raw.trim()) else {
        return String::new();
    };
    let address = SCHEME.replace(address.as_str(), "");

    let Some(host) = HOST.find(&address).map(|m| m.as_str()) else {
        return String::new();
    };
    if DIGITS.replace_all(host, "").replace('.', "").is_empty() && !DOTTED_QUAD.is_match(host) {
        return String::new();
    }

    let port = address
        .split_once(':')
        .map(|(_, rest)| NON_DIGITS.replace_all(rest, "").into_owned())
        .filter(|p| !p.is_empty())
        .unwrap_or_else(|| DEFAULT_PORT.to_string());
    format!("{host}:{port}")
}
