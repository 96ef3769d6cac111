//! Reserved fields and the config-path pre-pass.
//!
//! Every resolution carries two fields the caller never declares: the path of
//! the JSON settings file and the help switch. The file path has to be known
//! before the file stage runs, so when the order contains the file stage a
//! small pre-pass resolves just that field from flags and/or the environment
//! (see [`Preload`]).
//!
//! Whether the path names a file is answered by the injected [`FileReader`],
//! so in-memory files count as present.

use std::path::{Path, PathBuf};

use crate::cell::{Cell, Cells};
use crate::env::{self, EnvSource};
use crate::file::FileReader;
use crate::flags;
use crate::shape::{FieldBuilder, FieldSpec};
use crate::types::{Order, Preload, Stage};
use crate::validate::DEFAULT_CONFIGURATION_FILE;
use crate::value::Kind;

pub const CONFIG_FIELD: &str = "_config";
pub const HELP_FIELD: &str = "_help";
pub const CONFIG_FLAG: &str = "config";
pub const CONFIG_ENV: &str = "CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "config.ini";
pub const HELP_FLAGS: [&str; 2] = ["h", "help"];

/// The config-path field.
pub fn config_spec() -> FieldSpec {
    let mut spec = FieldSpec::new(CONFIG_FIELD, Kind::Str);
    FieldBuilder::new(&mut spec)
        .default(DEFAULT_CONFIG_PATH)
        .flag(CONFIG_FLAG)
        .env(CONFIG_ENV)
        .help("Path to the JSON settings file")
        .valid(DEFAULT_CONFIGURATION_FILE);
    spec
}

/// The help switch.
pub fn help_spec() -> FieldSpec {
    let mut spec = FieldSpec::new(HELP_FIELD, Kind::Bool);
    FieldBuilder::new(&mut spec)
        .default("false")
        .flag(HELP_FLAGS.join(","))
        .help("Show usage and exit");
    spec
}

pub fn reserved_specs() -> Vec<FieldSpec> {
    vec![config_spec(), help_spec()]
}

pub fn is_reserved_field(name: &str) -> bool {
    name == CONFIG_FIELD || name == HELP_FIELD
}

pub fn is_reserved_flag(flag: &str) -> bool {
    flag == CONFIG_FLAG || HELP_FLAGS.contains(&flag)
}

/// Resolve the config path from `stages` only, ignoring every other field.
///
/// Returns `None` when no existing file is named.
pub fn resolve_config_path(
    stages: &[Stage],
    args: &[String],
    env: &dyn EnvSource,
    files: &dyn FileReader,
) -> Option<PathBuf> {
    let spec = config_spec();
    let mut cells = Cells::build([&spec]);
    for stage in stages {
        match stage {
            Stage::Flag => flags::apply_flags(&mut cells, args),
            Stage::Env => env::apply_env(&mut cells, env),
            Stage::File => {}
        }
    }
    let cell = cells.get(CONFIG_FIELD)?;
    config_path_of(cell, files)
}

/// The pre-pass for `order`.
///
/// `None` means no pre-pass runs: the order has no file stage, or the preload
/// mode is [`Preload::None`]. Otherwise the inner option is the path the file
/// stage will read.
pub fn preload(
    order: &Order,
    args: &[String],
    env: &dyn EnvSource,
    files: &dyn FileReader,
) -> Option<Option<PathBuf>> {
    if !order.contains(Stage::File) || order.preload() == Preload::None {
        return None;
    }
    let path = resolve_config_path(order.preload().stages(), args, env, files);
    tracing::debug!(preload = ?order.preload(), path = ?path, "config path preloaded");
    Some(path)
}

/// Path held by a config cell, if `files` has it.
///
/// An explicit path that is missing does not fall back to the default.
pub fn config_path_of(cell: &Cell<'_>, files: &dyn FileReader) -> Option<PathBuf> {
    let path = cell.value().as_str().unwrap_or(cell.raw()).trim();
    if path.is_empty() {
        return None;
    }
    if !files.exists(Path::new(path)) {
        if path != DEFAULT_CONFIG_PATH {
            tracing::debug!(path, "config file not found, skipping");
        }
        return None;
    }
    Some(PathBuf::from(path))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::file::FsReader;

    fn args(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn env_with(path: &str) -> HashMap<String, String> {
        HashMap::from([(CONFIG_ENV.to_string(), path.to_string())])
    }

    #[test]
    fn reserved_specs_shape() {
        let config = config_spec();
        assert_eq!(config.default_value(), DEFAULT_CONFIG_PATH);
        assert_eq!(config.flags(), &["config".to_string()]);
        assert_eq!(config.env(), Some("CONFIG"));
        assert_eq!(config.json(), None);
        assert_eq!(config.validator(), Some(DEFAULT_CONFIGURATION_FILE));

        let help = help_spec();
        assert!(help.kind().is_bool());
        assert_eq!(help.flags(), &["h".to_string(), "help".to_string()]);
    }

    #[test]
    fn reserved_names() {
        assert!(is_reserved_flag("config"));
        assert!(is_reserved_flag("h"));
        assert!(!is_reserved_flag("host"));
        assert!(is_reserved_field(CONFIG_FIELD));
        assert!(!is_reserved_field("config"));
    }

    #[test]
    fn flag_then_env_lets_env_win() {
        let dir = tempfile::tempdir().unwrap();
        let from_flag = dir.path().join("flag.json");
        let from_env = dir.path().join("env.json");
        std::fs::write(&from_flag, "{}").unwrap();
        std::fs::write(&from_env, "{}").unwrap();

        let argv = args(&["-config", &from_flag.to_string_lossy()]);
        let env = env_with(&from_env.to_string_lossy());

        let path = resolve_config_path(Preload::FlagThenEnv.stages(), &argv, &env, &FsReader);
        assert_eq!(path, Some(from_env.clone()));

        let path = resolve_config_path(Preload::EnvThenFlag.stages(), &argv, &env, &FsReader);
        assert_eq!(path, Some(from_flag.clone()));

        let path = resolve_config_path(Preload::EnvOnly.stages(), &argv, &env, &FsReader);
        assert_eq!(path, Some(from_env));

        let path = resolve_config_path(Preload::FlagOnly.stages(), &argv, &env, &FsReader);
        assert_eq!(path, Some(from_flag));
    }

    #[test]
    fn missing_file_resolves_to_none() {
        let env = env_with("/no/such/settings.json");
        let path = resolve_config_path(Preload::EnvOnly.stages(), &[], &env, &FsReader);
        assert_eq!(path, None);
    }

    #[test]
    fn other_flags_do_not_disturb_the_pre_pass() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("app.json");
        std::fs::write(&file, "{}").unwrap();

        let argv = args(&["-port", "80", "--config", &file.to_string_lossy(), "-debug"]);
        let path = resolve_config_path(&[Stage::Flag], &argv, &HashMap::new(), &FsReader);
        assert_eq!(path, Some(file));
    }

    #[test]
    fn preload_skipped_without_file_stage_or_preload() {
        let env = HashMap::new();
        let files = HashMap::<PathBuf, String>::new();
        let order = Order::new([Stage::Flag, Stage::Env]);
        assert_eq!(preload(&order, &[], &env, &files), None);

        let order = Order::new([Stage::File]).with_preload(Preload::None);
        assert_eq!(preload(&order, &[], &env, &files), None);

        let order = Order::new([Stage::File]);
        assert_eq!(preload(&order, &[], &env, &files), Some(None));
    }

    fn in_memory(paths: &[&str]) -> HashMap<PathBuf, String> {
        paths
            .iter()
            .map(|p| (PathBuf::from(p), "{}".to_string()))
            .collect()
    }

    #[test]
    fn default_path_is_used_when_present() {
        let files = in_memory(&[DEFAULT_CONFIG_PATH]);
        let env = HashMap::new();
        let path = resolve_config_path(Preload::EnvThenFlag.stages(), &[], &env, &files);
        assert_eq!(path, Some(PathBuf::from(DEFAULT_CONFIG_PATH)));

        let path = resolve_config_path(Preload::EnvThenFlag.stages(), &[], &env, &in_memory(&[]));
        assert_eq!(path, None);
    }

    #[test]
    fn missing_override_does_not_fall_back_to_default() {
        let files = in_memory(&[DEFAULT_CONFIG_PATH]);
        let env = env_with("missing.json");
        let path = resolve_config_path(Preload::EnvThenFlag.stages(), &[], &env, &files);
        assert_eq!(path, None);

        let argv = args(&["-config=missing.json"]);
        let path = resolve_config_path(&[Stage::Flag], &argv, &HashMap::new(), &files);
        assert_eq!(path, None);
    }

    #[test]
    fn reader_decides_existence() {
        let files = in_memory(&["/virtual/app.json"]);
        let argv = args(&["-config", "/virtual/app.json"]);
        let path = resolve_config_path(&[Stage::Flag], &argv, &HashMap::new(), &files);
        assert_eq!(path, Some(PathBuf::from("/virtual/app.json")));
    }
}
