//! Command-line flag applier.
//!
//! Accepts `-name=value`, `-name value` and bare `-name` for booleans, with
//! one or two leading dashes. The scan is tolerant: unknown flags, positional
//! arguments and test-harness arguments are skipped, never fatal, because one
//! argument vector is usually shared by several independently resolved
//! settings structs. Scanning stops at `--`.

use crate::cell::Cells;
use crate::types::Stage;

/// Write every recognised flag in `args` into its cell, left to right.
///
/// `args` must not include the program name.
pub fn apply_flags(cells: &mut Cells<'_>, args: &[String]) {
    let mut i = 0;
    while i < args.len() {
        let arg = &args[i];
        i += 1;
        if arg == "--" {
            break;
        }

        let Some(body) = flag_body(arg) else {
            continue;
        };
        let (name, inline) = match body.split_once('=') {
            Some((name, value)) => (name, Some(value)),
            None => (body, None),
        };

        let Some(cell) = cells.by_flag_mut(name) else {
            tracing::trace!(flag = name, "unknown flag skipped");
            continue;
        };

        let value = match inline {
            Some(value) => value,
            None if cell.spec().kind().is_bool() => "true",
            None => match args.get(i) {
                Some(next) => {
                    i += 1;
                    next.as_str()
                }
                None => {
                    tracing::debug!(flag = name, "flag is missing its value");
                    continue;
                }
            },
        };
        cell.set_from(Stage::Flag, value);
    }
}

/// `-name...` or `--name...` without the dashes; `None` for anything else.
fn flag_body(arg: &str) -> Option<&str> {
    let body = arg.strip_prefix("--").or_else(|| arg.strip_prefix('-'))?;
    if body.is_empty() || body.starts_with('-') || body.starts_with('=') {
        return None;
    }
    Some(body)
}
