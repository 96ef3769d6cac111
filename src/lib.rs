//! Field-driven configuration for Rust applications. Describe a struct, pick
//! a stage order, and go.
//!
//! Stagefig fills a settings struct from up to three sources: command-line
//! flags, a flat JSON settings file, and environment variables. Each field
//! declares where it can come from and what it defaults to; the caller decides
//! which sources to consult and in what order.
//!
//! ```ignore
//! stagefig::settings! {
//!     #[derive(Debug, Default)]
//!     pub struct Server {
//!         #[setting(default = "8080", flag = "p,port", env = "PORT", json = "port", help = "Listen port")]
//!         pub port: u16,
//!         #[setting(default = "http://localhost", flag = "upstream", valid = "url")]
//!         pub upstream: String,
//!     }
//! }
//!
//! let server: Server = Stagefig::builder()
//!     .stages([Stage::File, Stage::Env, Stage::Flag])
//!     .load();
//! ```
//!
//! That call finds the settings file (`-config` / `CONFIG`, default
//! `config.ini`), applies its keys, then the environment, then the flags,
//! runs the `url` validator on `upstream`, and hands back a `Server`.
//!
//! # Fields
//!
//! Every field carries a [`FieldSpec`]:
//!
//! | Key | Meaning |
//! |-----|---------|
//! | `default` | raw text used before any stage runs |
//! | `flag` | comma-separated aliases; `-p`, `--p`, `-p=1` and `-p 1` all work |
//! | `env` | variable name, upper-cased |
//! | `json` | top-level key in the settings file |
//! | `help` / `text` | description shown in usage |
//! | `valid` | name of a validator that produces the final value |
//!
//! An empty key means "not bound to that source". Declare fields with the
//! [`settings!`] macro or by implementing [`Settings`] by hand with
//! [`Shape::field`]. Fields that are never declared keep their `Default`.
//!
//! # Stage order
//!
//! An [`Order`] lists stages in **priority-ascending** order: the last stage
//! to set a field wins.
//!
//! ```text
//! Declared default      #[setting(default = ...)]
//!        ↑ overridden by
//! First stage           e.g. Stage::File
//!        ↑ overridden by
//! ...
//!        ↑ overridden by
//! Last stage            e.g. Stage::Flag
//! ```
//!
//! Every stage is **sparse**: a stage only touches fields it has a value for.
//! An empty order resolves to defaults.
//!
//! # Finding the settings file
//!
//! The file stage needs a path before the merge starts. When the order
//! contains [`Stage::File`], a pre-pass resolves only the reserved config
//! field according to the [`Preload`] mode (environment then flag by
//! default). With [`Preload::None`] there is no pre-pass and the file stage
//! reads whatever path the config field holds when it is reached. A path that
//! does not name an existing file skips the file stage.
//!
//! The `config`, `h` and `help` flags and the `CONFIG` variable are reserved.
//! Aliases on your own fields that collide with them are dropped with a
//! warning.
//!
//! # Values and coercion
//!
//! Every source produces text. Each field's [`Kind`] decides how that text
//! becomes a [`Value`]: strings pass through, booleans accept
//! `1 t T TRUE true True` and their negatives, integers are parsed at 64 bits
//! and saturated to the field's width, durations accept `1h2m3s`, `300ms`, a
//! bare number of seconds and a leading sign. Text that does not parse leaves
//! the field at its zero value. Types with their own `FromStr` join in through
//! [`text_value!`], and [`Json<T>`] decodes a field's text with `serde_json`,
//! which is how nested objects in the settings file reach a field.
//!
//! # Validators
//!
//! After the last stage, fields that name a validator are passed through the
//! [`ValidatorRegistry`]. Built-ins cover `file`, `tmp_file`,
//! `default_configuration_file`, `url`, `bool`, `int`, `uint`, `float`,
//! `duration` and `uuid`. Register your own with [`validator`]. Entries are
//! tried in registration order; the first one that answers wins.
//!
//! # Resolve once or every time
//!
//! [`StagefigBuilder::load`] resolves a fresh value each call.
//! [`StagefigBuilder::load_once`] memoises per settings type in a
//! caller-owned [`ResolveCache`]; concurrent first calls resolve exactly once
//! and everybody gets the same `Arc`.
//!
//! # Errors
//!
//! Resolution never fails. Missing files, unset variables and unparseable
//! text are logged through `tracing` at debug level and leave the field as it
//! was. [`StagefigError`] only surfaces from the lower-level building blocks
//! such as [`load_settings`].
//!
//! # Clap adapter
//!
//! The `cli` module (behind the `clap` feature, on by default) builds a
//! `clap::Command` from a settings shape for strict parsing and rich help,
//! and turns the matches back into flags for the core.

pub mod error;
pub mod types;

mod bootstrap;
mod builder;
mod cache;
mod cell;
#[cfg(feature = "clap")]
pub mod cli;
mod coerce;
mod env;
mod file;
mod flags;
mod help;
mod resolve;
mod shape;
mod validate;
mod value;

#[cfg(test)]
mod fixtures;

pub use bootstrap::{CONFIG_ENV, CONFIG_FLAG, DEFAULT_CONFIG_PATH, resolve_config_path};
pub use builder::{Stagefig, StagefigBuilder};
pub use cache::ResolveCache;
pub use cell::{Cell, Cells};
pub use coerce::{coerce, parse_bool, parse_duration, zero};
pub use env::{EnvSource, ProcessEnv, apply_env};
pub use error::StagefigError;
pub use file::{FileReader, FsReader, apply_file, apply_json, load_settings};
pub use flags::apply_flags;
pub use help::{HelpHook, render as render_help};
pub use resolve::{ResolveInput, Sources, resolve};
pub use shape::{FieldBuilder, FieldSpec, Settings, Shape};
pub use types::{Order, Preload, Stage};
pub use validate::{
    FnValidator, Validator, ValidatorRegistry, ensure_file, existing_file, normalize_url, tmp_file,
    validator,
};
pub use value::{FieldValue, IntWidth, Json, Kind, TextKind, UintWidth, Value, text_from_value};
