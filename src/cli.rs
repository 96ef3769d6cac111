//! Clap adapter for stagefig.
//!
//! The core scanner is forgiving: unknown flags are skipped so
//! several settings structs can share one argument vector. Applications that
//! want clap's strict parsing, suggestions and coloured help can build a
//! [`clap::Command`] from a settings shape with [`command`], parse with it,
//! and hand the recognised flags back to the builder with [`matches_to_args`]:
//!
//! ```ignore
//! let matches = stagefig::cli::command::<Server>("server").get_matches();
//! let server = Stagefig::builder::<Server>()
//!     .stages([Stage::File, Stage::Env, Stage::Flag])
//!     .args(stagefig::cli::matches_to_args::<Server>(&matches))
//!     .load();
//! ```
//!
//! Only this module depends on clap. It is compiled with the `clap` feature
//! (on by default).

use std::fmt::Write;

use clap::parser::ValueSource;
use clap::{Arg, ArgAction, ArgMatches, Command};

use crate::resolve::field_specs;
use crate::shape::{FieldSpec, Settings, Shape};

/// A command with one argument per flag-bound field of `S`, plus `--config`
/// and `-h/--help`.
///
/// Single-character aliases become short flags, longer ones long flags.
/// Defaults and environment names are listed in each argument's help, but
/// clap itself never fills in a value, so unset flags stay unset.
pub fn command<S: Settings>(name: impl Into<String>) -> Command {
    let specs = field_specs(&Shape::<S>::of());
    let mut cmd = Command::new(name.into()).disable_help_flag(true);
    for spec in specs.iter().filter(|s| !s.flags().is_empty()) {
        cmd = cmd.arg(arg_for(spec));
    }
    cmd
}

fn arg_for(spec: &FieldSpec) -> Arg {
    let (shorts, longs): (Vec<&String>, Vec<&String>) =
        spec.flags().iter().partition(|f| f.chars().count() == 1);

    let mut arg = Arg::new(spec.name().to_string()).help(help_text(spec));
    let mut shorts = shorts.into_iter().filter_map(|s| s.chars().next());
    if let Some(short) = shorts.next() {
        arg = arg.short(short).short_aliases(shorts);
    }
    let mut longs = longs.into_iter().cloned();
    if let Some(long) = longs.next() {
        arg = arg.long(long).aliases(longs);
    }

    if spec.kind().is_bool() {
        arg.action(ArgAction::SetTrue)
    } else {
        arg.action(ArgAction::Set)
            .value_name(spec.kind().name().to_uppercase())
    }
}

fn help_text(spec: &FieldSpec) -> String {
    let mut text = spec.help().to_string();
    let mut extras = Vec::new();
    if !spec.default_value().is_empty() {
        extras.push(format!("default: {}", spec.default_value()));
    }
    if let Some(env) = spec.env() {
        extras.push(format!("env: {env}"));
    }
    if !extras.is_empty() {
        if !text.is_empty() {
            text.push(' ');
        }
        let _ = write!(text, "[{}]", extras.join(", "));
    }
    text
}

/// Flags that appeared on the command line, as `-name=value` tokens the core
/// flag stage understands.
pub fn matches_to_args<S: Settings>(matches: &ArgMatches) -> Vec<String> {
    let specs = field_specs(&Shape::<S>::of());
    let mut args = Vec::new();
    for spec in &specs {
        let Some(flag) = spec.flags().iter().max_by_key(|f| f.len()) else {
            continue;
        };
        if matches.value_source(spec.name()) != Some(ValueSource::CommandLine) {
            continue;
        }
        if spec.kind().is_bool() {
            if matches.get_flag(spec.name()) {
                args.push(format!("-{flag}"));
            }
        } else if let Some(value) = matches.get_one::<String>(spec.name()) {
            args.push(format!("-{flag}={value}"));
        }
    }
    args
}
