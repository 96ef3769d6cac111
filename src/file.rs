//! The JSON settings file.
//!
//! The file is a single flat JSON object keyed by each field's `json` name.
//! Values are handed to cells as text: strings verbatim, numbers and booleans
//! in their JSON spelling (integral floats without a fraction), objects and
//! arrays as compact JSON. [`Json`] fields get the raw JSON of any value,
//! strings keep their quotes. `null` is skipped.
//!
//! A missing or malformed file is not an error for the caller; the file stage
//! is simply skipped and the reason logged.
//!
//! [`Json`]: crate::value::Json

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value as JsonValue};

use crate::cell::Cells;
use crate::error::StagefigError;
use crate::types::Stage;
use crate::value::Kind;

/// Reads a whole file as text.
pub trait FileReader: Send + Sync {
    fn read(&self, path: &Path) -> io::Result<String>;

    /// Whether `path` names a readable file.
    fn exists(&self, path: &Path) -> bool {
        self.read(path).is_ok()
    }
}

/// Reads from the filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsReader;

impl FileReader for FsReader {
    fn read(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }
}

/// In-memory files, keyed by path.
impl FileReader for HashMap<PathBuf, String> {
    fn read(&self, path: &Path) -> io::Result<String> {
        self.get(path)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no such file"))
    }

    fn exists(&self, path: &Path) -> bool {
        self.contains_key(path)
    }
}

/// Read and parse the settings file at `path`.
pub fn load_settings(
    reader: &dyn FileReader,
    path: &Path,
) -> Result<Map<String, JsonValue>, StagefigError> {
    let text = reader.read(path).map_err(|source| StagefigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| StagefigError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Write every bound key of `settings` into its cell.
pub fn apply_json(cells: &mut Cells<'_>, settings: &Map<String, JsonValue>) {
    for cell in cells.iter_mut() {
        let Some(key) = cell.spec().json() else {
            continue;
        };
        let Some(value) = settings.get(key) else {
            continue;
        };
        let text = match cell.spec().kind() {
            Kind::Text(text) if text.takes_json() => json_fragment(value),
            _ => json_text(value),
        };
        if let Some(text) = text {
            cell.set_from(Stage::File, &text);
        }
    }
}

/// Load `path` and apply it. Failures are logged and leave the cells as they
/// were.
pub fn apply_file(cells: &mut Cells<'_>, reader: &dyn FileReader, path: &Path) {
    match load_settings(reader, path) {
        Ok(settings) => {
            tracing::debug!(path = %path.display(), keys = settings.len(), "applying settings file");
            apply_json(cells, &settings);
        }
        Err(e) => tracing::debug!(error = %e, "settings file skipped"),
    }
}

fn json_text(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::Null => None,
        JsonValue::String(s) => Some(s.clone()),
        JsonValue::Number(n) => Some(match n.as_f64() {
            Some(f) if n.is_f64() => f.to_string(),
            _ => n.to_string(),
        }),
        other => Some(other.to_string()),
    }
}

fn json_fragment(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::Null => None,
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::test::{Pair, server_specs};
    use crate::shape::{FieldBuilder, FieldSpec};
    use crate::value::{FieldValue, Json, Value};

    fn settings(text: &str) -> Map<String, JsonValue> {
        serde_json::from_str(text).unwrap()
    }

    #[test]
    fn strings_numbers_and_bools_are_applied() {
        let specs = server_specs();
        let mut cells = Cells::build(&specs);
        apply_json(
            &mut cells,
            &settings(r#"{"host": "file.host", "port": 4000, "debug": true}"#),
        );
        assert_eq!(cells.get("host").unwrap().raw(), "file.host");
        assert_eq!(cells.get("port").unwrap().value(), &Value::Uint(4000));
        assert_eq!(cells.get("debug").unwrap().value(), &Value::Bool(true));
    }

    #[test]
    fn objects_reach_json_fields_as_text() {
        let specs = server_specs();
        let mut cells = Cells::build(&specs);
        apply_json(
            &mut cells,
            &settings(r#"{"pair": {"param1": "a", "param2": "b"}}"#),
        );
        let pair = cells.get("pair").unwrap();
        assert_eq!(pair.raw(), r#"{"param1":"a","param2":"b"}"#);
        let decoded = pair.value().downcast_ref::<Json<Pair>>().unwrap();
        assert_eq!(decoded.param1, "a");
        assert_eq!(decoded.param2, "b");
    }

    #[test]
    fn json_fields_get_strings_with_quotes() {
        let mut label = FieldSpec::new("label", Json::<String>::kind());
        FieldBuilder::new(&mut label).json("label");
        let mut name = FieldSpec::new("name", Kind::Str);
        FieldBuilder::new(&mut name).json("name");
        let specs = [label, name];

        let mut cells = Cells::build(&specs);
        apply_json(&mut cells, &settings(r#"{"label": "abc", "name": "abc"}"#));

        let label = cells.get("label").unwrap();
        assert_eq!(label.raw(), r#""abc""#);
        let decoded = label.value().downcast_ref::<Json<String>>().unwrap();
        assert_eq!(decoded.as_str(), "abc");
        assert_eq!(cells.get("name").unwrap().raw(), "abc");
    }

    #[test]
    fn integral_floats_reach_integer_fields() {
        let specs = server_specs();
        let mut cells = Cells::build(&specs);
        apply_json(&mut cells, &settings(r#"{"port": 5e3}"#));
        assert_eq!(cells.get("port").unwrap().raw(), "5000");
        assert_eq!(cells.get("port").unwrap().value(), &Value::Uint(5000));

        apply_json(&mut cells, &settings(r#"{"port": 6000.0}"#));
        assert_eq!(cells.get("port").unwrap().value(), &Value::Uint(6000));
        assert_eq!(json_text(&serde_json::json!(1.5)).as_deref(), Some("1.5"));
    }

    #[test]
    fn null_and_unknown_keys_are_skipped() {
        let specs = server_specs();
        let mut cells = Cells::build(&specs);
        apply_json(&mut cells, &settings(r#"{"host": null, "other": 1}"#));
        assert_eq!(cells.get("host").unwrap().raw(), "localhost");
    }

    #[test]
    fn in_memory_reader() {
        let files = HashMap::from([(PathBuf::from("app.json"), r#"{"port": 1}"#.to_string())]);
        let specs = server_specs();
        let mut cells = Cells::build(&specs);
        apply_file(&mut cells, &files, Path::new("app.json"));
        assert_eq!(cells.get("port").unwrap().value(), &Value::Uint(1));
    }

    #[test]
    fn missing_file_is_soft() {
        let specs = server_specs();
        let mut cells = Cells::build(&specs);
        apply_file(&mut cells, &FsReader, Path::new("/definitely/not/here.json"));
        assert_eq!(cells.get("port").unwrap().value(), &Value::Uint(8080));
        assert!(matches!(
            load_settings(&FsReader, Path::new("/definitely/not/here.json")),
            Err(StagefigError::Io { .. })
        ));
    }

    #[test]
    fn malformed_file_is_soft() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{ not json").unwrap();

        let specs = server_specs();
        let mut cells = Cells::build(&specs);
        apply_file(&mut cells, &FsReader, &path);
        assert_eq!(cells.get("host").unwrap().raw(), "localhost");
        assert!(matches!(
            load_settings(&FsReader, &path),
            Err(StagefigError::Json { .. })
        ));
    }

    #[test]
    fn top_level_must_be_an_object() {
        let files = HashMap::from([(PathBuf::from("a.json"), "[1, 2]".to_string())]);
        assert!(load_settings(&files, Path::new("a.json")).is_err());
    }
}
