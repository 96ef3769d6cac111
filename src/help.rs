//! Plain-text usage rendered from field specs.
//!
//! Every field bound to at least one source gets an entry with its help text,
//! default and one sample line per stage in the merge order.

use std::fmt::Write;
use std::sync::Arc;

use serde_json::{Value as JsonValue, json};

use crate::coerce;
use crate::shape::FieldSpec;
use crate::types::{Order, Stage};
use crate::value::{Kind, Value};

/// Receives the rendered usage when the help switch is set.
pub type HelpHook = Arc<dyn Fn(&str) + Send + Sync>;

/// Render usage for `specs` under `order`.
pub fn render(specs: &[FieldSpec], order: &Order) -> String {
    let program = program_name();
    let mut out = String::new();
    let _ = writeln!(out, "Usage of {program}:");
    let _ = writeln!(out, "Order of priority for settings (low -> high): {order}");

    for spec in specs {
        if spec.flags().is_empty() && spec.env().is_none() && spec.json().is_none() {
            continue;
        }
        out.push('\n');
        render_field(&mut out, &program, spec, order);
    }
    out
}

fn render_field(out: &mut String, program: &str, spec: &FieldSpec, order: &Order) {
    let title = if spec.flags().is_empty() {
        spec.name().to_string()
    } else {
        spec.flags()
            .iter()
            .map(|f| format!("-{f}"))
            .collect::<Vec<_>>()
            .join(", ")
    };
    let _ = writeln!(out, "  {title} <{}>", spec.kind().name());
    if !spec.help().is_empty() {
        let _ = writeln!(out, "\t{}", spec.help());
    }
    if !spec.default_value().is_empty() {
        let _ = writeln!(out, "\tDefault: {}", spec.default_value());
    }

    let sample = sample_value(spec);
    for stage in order.stages() {
        match stage {
            Stage::Flag => {
                let Some(flag) = spec.flags().last() else {
                    continue;
                };
                match spec.kind() {
                    Kind::Bool => {
                        let _ = writeln!(out, "\tFlag (true):\t{program} -{flag}");
                        let _ = writeln!(out, "\tFlag (false):\t{program} -{flag}=false");
                    }
                    Kind::Duration => {
                        let _ = writeln!(out, "\tFlag:\t\t{program} -{flag}=1h2m3s");
                        let _ = writeln!(out, "\tFlag (seconds):\t{program} -{flag}=30");
                    }
                    _ => {
                        let _ = writeln!(out, "\tFlag:\t\t{program} -{flag}={sample}");
                    }
                }
            }
            Stage::Env => {
                if let Some(name) = spec.env() {
                    let _ = writeln!(out, "\tEnvironment:\t{name}={sample}");
                }
            }
            Stage::File => {
                if let Some(key) = spec.json() {
                    let doc = json!({ key: sample_json(spec) });
                    let _ = writeln!(out, "\tJSON file:\t{doc}");
                }
            }
        }
    }
}

fn sample_value(spec: &FieldSpec) -> String {
    if spec.default_value().is_empty() {
        format!("<{}>", spec.kind().name())
    } else {
        spec.default_value().to_string()
    }
}

/// Default as it would be spelled in the settings file.
fn sample_json(spec: &FieldSpec) -> JsonValue {
    let raw = spec.default_value();
    match coerce::coerce(spec.kind(), raw) {
        Ok(Value::Bool(b)) => json!(b),
        Ok(Value::Int(v)) => json!(v),
        Ok(Value::Uint(v)) => json!(v),
        Ok(Value::Float(v)) => json!(v),
        Ok(Value::Custom(_)) => serde_json::from_str(raw).unwrap_or_else(|_| json!(raw)),
        _ => json!(sample_value(spec)),
    }
}

fn program_name() -> String {
    std::env::current_exe()
        .ok()
        .and_then(|p| p.file_stem().map(|s| s.to_string_lossy().into_owned()))
        .unwrap_or_else(|| "app".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bootstrap;
    use crate::fixtures::test::server_specs;

    fn all_specs() -> Vec<FieldSpec> {
        let mut specs = bootstrap::reserved_specs();
        specs.extend(server_specs());
        specs
    }

    #[test]
    fn header_names_the_order() {
        let out = render(&all_specs(), &Order::new([Stage::File, Stage::Env, Stage::Flag]));
        assert!(out.contains(
            "Order of priority for settings (low -> high): [config file] -> [environment] -> [flags]"
        ));
    }

    #[test]
    fn field_entry_has_help_default_and_samples() {
        let out = render(&all_specs(), &Order::new([Stage::Flag, Stage::Env, Stage::File]));
        assert!(out.contains("  -p, -port <uint>"));
        assert!(out.contains("\tPort to listen on"));
        assert!(out.contains("\tDefault: 8080"));
        assert!(out.contains("-port=8080"));
        assert!(out.contains("\tEnvironment:\tSERVER_PORT=8080"));
        assert!(out.contains(r#"{"port":8080}"#));
    }

    #[test]
    fn bool_and_duration_samples() {
        let out = render(&all_specs(), &Order::new([Stage::Flag]));
        assert!(out.contains("-d=false"));
        assert!(out.contains("-timeout=1h2m3s"));
    }

    #[test]
    fn samples_follow_the_order() {
        let out = render(&all_specs(), &Order::new([Stage::Flag]));
        assert!(!out.contains("Environment:"));
        assert!(!out.contains("JSON file:"));
    }

    #[test]
    fn reserved_fields_are_listed() {
        let out = render(&all_specs(), &Order::new([Stage::Flag]));
        assert!(out.contains("  -config <string>"));
        assert!(out.contains("  -h, -help <bool>"));
    }
}
