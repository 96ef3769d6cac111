//! Field descriptors and the shape of a settings struct.
//!
//! A [`Shape`] is the explicit stand-in for reflection: it lists every field
//! of a settings struct with its [`FieldSpec`] and a typed setter. Shapes are
//! declared through [`Settings::describe`], either by hand with the builder
//! methods on [`FieldBuilder`] or by the [`settings!`](crate::settings) macro.

use crate::error::StagefigError;
use crate::value::{FieldValue, Kind, Value};

/// Static metadata for one configurable field.
///
/// Empty strings and empty lists mean "not bound to that source". An entirely
/// empty spec (see [`FieldSpec::is_empty`]) is what lookups return for a name
/// the shape doesn't have.
#[derive(Debug, Clone, Default)]
pub struct FieldSpec {
    name: String,
    default: String,
    flags: Vec<String>,
    env: String,
    json: String,
    help: String,
    valid: String,
    kind: Kind,
}

impl FieldSpec {
    pub fn new(name: &str, kind: Kind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            ..Self::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn default_value(&self) -> &str {
        &self.default
    }

    pub fn flags(&self) -> &[String] {
        &self.flags
    }

    pub fn env(&self) -> Option<&str> {
        non_empty(&self.env)
    }

    pub fn json(&self) -> Option<&str> {
        non_empty(&self.json)
    }

    pub fn help(&self) -> &str {
        &self.help
    }

    pub fn validator(&self) -> Option<&str> {
        non_empty(&self.valid)
    }

    pub fn kind(&self) -> &Kind {
        &self.kind
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_empty()
    }

    pub(crate) fn remove_flag(&mut self, flag: &str) {
        self.flags.retain(|f| f != flag);
    }
}

fn non_empty(s: &str) -> Option<&str> {
    if s.is_empty() { None } else { Some(s) }
}

/// Chainable setters for one field's metadata.
pub struct FieldBuilder<'a> {
    spec: &'a mut FieldSpec,
}

impl<'a> FieldBuilder<'a> {
    pub(crate) fn new(spec: &'a mut FieldSpec) -> Self {
        Self { spec }
    }

    /// Raw default, coerced like any other source value.
    pub fn default(self, value: impl Into<String>) -> Self {
        self.spec.default = value.into();
        self
    }

    /// Comma-separated flag aliases. Every alias writes the same cell.
    pub fn flag(self, aliases: impl AsRef<str>) -> Self {
        for alias in aliases.as_ref().split(',').map(str::trim) {
            if !alias.is_empty() && !self.spec.flags.iter().any(|f| f == alias) {
                self.spec.flags.push(alias.to_string());
            }
        }
        self
    }

    /// Environment variable name, upper-cased.
    pub fn env(self, name: impl AsRef<str>) -> Self {
        self.spec.env = name.as_ref().trim().to_uppercase();
        self
    }

    /// Top-level key in the JSON settings file.
    pub fn json(self, key: impl Into<String>) -> Self {
        self.spec.json = key.into();
        self
    }

    pub fn help(self, text: impl Into<String>) -> Self {
        self.spec.help = text.into();
        self
    }

    /// Same as [`help`](Self::help).
    pub fn text(self, text: impl Into<String>) -> Self {
        self.help(text)
    }

    /// Name of the validator that produces the final value.
    pub fn valid(self, name: impl Into<String>) -> Self {
        self.spec.valid = name.into();
        self
    }
}

type Assign<S> = Box<dyn Fn(&mut S, Value) -> bool + Send + Sync>;

struct FieldEntry<S> {
    spec: FieldSpec,
    assign: Assign<S>,
}

/// Every configurable field of `S`, in declaration order.
pub struct Shape<S> {
    fields: Vec<FieldEntry<S>>,
}

impl<S: Settings> Shape<S> {
    /// Build the shape of `S` from its [`Settings::describe`].
    pub fn of() -> Self {
        let mut shape = Shape { fields: Vec::new() };
        S::describe(&mut shape);
        shape
    }
}

impl<S: 'static> Shape<S> {
    /// Declare a field. `access` projects the struct onto the field storage.
    ///
    /// Declaring the same name twice replaces the earlier declaration.
    pub fn field<V, F>(&mut self, name: &str, access: F) -> FieldBuilder<'_>
    where
        V: FieldValue,
        F: for<'s> Fn(&'s mut S) -> &'s mut V + Send + Sync + 'static,
    {
        if let Some(pos) = self.fields.iter().position(|f| f.spec.name == name) {
            tracing::warn!(field = name, "field declared twice, keeping the later one");
            self.fields.remove(pos);
        }

        let field_name = name.to_string();
        let assign: Assign<S> = Box::new(move |target, value| match V::from_value(value) {
            Some(v) => {
                *access(target) = v;
                true
            }
            None => {
                tracing::debug!(field = %field_name, "value does not fit the field type");
                false
            }
        });

        self.fields.push(FieldEntry {
            spec: FieldSpec::new(name, V::kind()),
            assign,
        });
        let last = self.fields.len() - 1;
        FieldBuilder::new(&mut self.fields[last].spec)
    }

    /// Descriptor for `name`, or an empty spec if the shape has no such field.
    pub fn descriptor(&self, name: &str) -> FieldSpec {
        match self.fields.iter().find(|f| f.spec.name == name) {
            Some(entry) => entry.spec.clone(),
            None => {
                let e = StagefigError::UnknownField(name.to_string());
                tracing::debug!(error = %e, "returning an empty descriptor");
                FieldSpec::default()
            }
        }
    }

    pub fn specs(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter().map(|f| &f.spec)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Write `value` into the field called `name`. Returns `false` if the
    /// field is unknown or the value has the wrong shape.
    pub(crate) fn assign(&self, target: &mut S, name: &str, value: Value) -> bool {
        match self.fields.iter().find(|f| f.spec.name == name) {
            Some(entry) => (entry.assign)(target, value),
            None => false,
        }
    }
}

/// A struct that can be filled from flags, a settings file and the
/// environment.
///
/// `Default` provides the instance the engine writes into, so fields that are
/// never declared keep their `Default` value.
pub trait Settings: Default + Send + Sync + 'static {
    fn describe(shape: &mut Shape<Self>);
}

/// Define a settings struct and its [`Settings`] impl in one go.
///
/// Each field may carry one `#[setting(...)]` attribute whose keys are the
/// [`FieldBuilder`] methods: `default`, `flag`, `env`, `json`, `help`,
/// `text` and `valid`.
///
/// ```ignore
/// stagefig::settings! {
///     #[derive(Debug, Default)]
///     pub struct Server {
///         #[setting(default = "8080", flag = "p,port", env = "PORT", json = "port", help = "Listen port")]
///         pub port: u16,
///         #[setting(default = "5", flag = "timeout", valid = "duration")]
///         pub timeout: std::time::Duration,
///     }
/// }
/// ```
#[macro_export]
macro_rules! settings {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[doc = $doc:literal])*
                $(#[setting($($key:ident = $value:expr),* $(,)?)])?
                $fvis:vis $field:ident : $ty:ty
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis struct $name {
            $(
                $(#[doc = $doc])*
                $fvis $field: $ty,
            )*
        }

        impl $crate::Settings for $name {
            fn describe(shape: &mut $crate::Shape<Self>) {
                $(
                    shape
                        .field(stringify!($field), |s: &mut Self| &mut s.$field)
                        $($(.$key($value))*)?;
                )*
            }
        }
    };
}
