//! Core resolution pipeline: merge all stages into a populated settings struct.
//!
//! Operates on injected [`Sources`], so the whole pipeline is testable with
//! synthetic argv, environment and files. Steps:
//!
//! 1. Pre-pass: resolve the config-file path if the order reads the file
//! 2. Build one cell per field, seeded with its default
//! 3. Apply each stage in order (later stages overwrite earlier ones)
//! 4. Hand rendered usage to the help hook if `-h`/`-help` was given
//! 5. Run each field's validator and write the final values into `S::default()`
//!
//! Nothing in here fails: every problem is logged and the affected field keeps
//! its previous value.

use std::collections::HashMap;
use std::ffi::OsString;
use std::path::PathBuf;
use std::sync::Arc;

use crate::bootstrap::{self, CONFIG_FIELD, HELP_FIELD};
use crate::cell::Cells;
use crate::env::{self, EnvSource, ProcessEnv};
use crate::error::StagefigError;
use crate::file::{self, FileReader, FsReader};
use crate::flags;
use crate::help::{self, HelpHook};
use crate::shape::{FieldSpec, Settings, Shape};
use crate::types::{Order, Stage};
use crate::validate::ValidatorRegistry;

/// Where values come from. Defaults to the running process.
#[derive(Clone)]
pub struct Sources {
    /// Command-line arguments without the program name.
    pub args: Vec<String>,
    pub env: Arc<dyn EnvSource>,
    pub files: Arc<dyn FileReader>,
}

impl Sources {
    /// Process arguments, process environment and the real filesystem.
    ///
    /// Arguments that are not valid UTF-8 are dropped.
    pub fn process() -> Self {
        Self {
            args: process_args(std::env::args_os().skip(1)),
            env: Arc::new(ProcessEnv),
            files: Arc::new(FsReader),
        }
    }

    /// No arguments and an empty environment; files still come from disk.
    pub fn isolated() -> Self {
        Self {
            args: Vec::new(),
            env: Arc::new(HashMap::<String, String>::new()),
            files: Arc::new(FsReader),
        }
    }

    pub fn with_args<I, A>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Replace the environment with the given pairs.
    pub fn with_env_vars<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let vars: HashMap<String, String> = vars
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self.env = Arc::new(vars);
        self
    }

    pub fn with_env(mut self, env: impl EnvSource + 'static) -> Self {
        self.env = Arc::new(env);
        self
    }

    pub fn with_files(mut self, files: impl FileReader + 'static) -> Self {
        self.files = Arc::new(files);
        self
    }
}

fn process_args(args: impl IntoIterator<Item = OsString>) -> Vec<String> {
    args.into_iter()
        .filter_map(|arg| match arg.into_string() {
            Ok(arg) => Some(arg),
            Err(arg) => {
                tracing::debug!(arg = %arg.to_string_lossy(), "argument is not UTF-8, skipped");
                None
            }
        })
        .collect()
}

impl Default for Sources {
    fn default() -> Self {
        Self::process()
    }
}

/// Everything one resolution needs.
pub struct ResolveInput<'r> {
    pub order: &'r Order,
    pub sources: &'r Sources,
    pub registry: &'r ValidatorRegistry,
    pub on_help: Option<&'r HelpHook>,
}

/// Resolve a fresh `S` from the input.
pub fn resolve<S: Settings>(input: ResolveInput<'_>) -> S {
    let ResolveInput {
        order,
        sources,
        registry,
        on_help,
    } = input;
    tracing::debug!(%order, settings = std::any::type_name::<S>(), "resolving settings");

    // 1: Pre-pass for the config path
    let preloaded = bootstrap::preload(
        order,
        &sources.args,
        sources.env.as_ref(),
        sources.files.as_ref(),
    );

    // 2: Cells for reserved and declared fields
    let shape = Shape::<S>::of();
    let specs = field_specs(&shape);
    let mut cells = Cells::build(&specs);

    // 3: Stages, lowest priority first
    for stage in order.stages() {
        match stage {
            Stage::Flag => flags::apply_flags(&mut cells, &sources.args),
            Stage::Env => env::apply_env(&mut cells, sources.env.as_ref()),
            Stage::File => {
                let path = match &preloaded {
                    Some(path) => path.clone(),
                    None => config_path(&cells, sources.files.as_ref()),
                };
                match path {
                    Some(path) => {
                        tracing::debug!(path = %path.display(), "reading settings file");
                        file::apply_file(&mut cells, sources.files.as_ref(), &path);
                    }
                    None => tracing::debug!("no settings file, file stage skipped"),
                }
            }
        }
    }

    // 4: Help
    let wants_help = cells
        .get(HELP_FIELD)
        .and_then(|c| c.value().as_bool())
        .unwrap_or(false);
    if wants_help {
        match on_help {
            Some(hook) => hook(&help::render(&specs, order)),
            None => tracing::debug!("help requested but no help hook is installed"),
        }
    }

    // 5: Validators and assignment
    let mut target = S::default();
    for cell in cells.iter() {
        if bootstrap::is_reserved_field(cell.name()) {
            continue;
        }
        let value = registry.finalize(cell);
        if shape.assign(&mut target, cell.name(), value) {
            continue;
        }
        if let Some(validator) = cell.spec().validator() {
            tracing::warn!(
                field = cell.name(),
                validator,
                "validator result does not fit the field, using the coerced value"
            );
            shape.assign(&mut target, cell.name(), cell.value().clone());
        }
    }
    target
}

fn config_path(cells: &Cells<'_>, files: &dyn FileReader) -> Option<PathBuf> {
    let cell = cells.get(CONFIG_FIELD)?;
    bootstrap::config_path_of(cell, files)
}

/// Reserved specs followed by the shape's own, minus any reserved aliases
/// the shape tried to claim.
pub(crate) fn field_specs<S: 'static>(shape: &Shape<S>) -> Vec<FieldSpec> {
    let mut specs = bootstrap::reserved_specs();
    for spec in shape.specs() {
        if bootstrap::is_reserved_field(spec.name()) {
            tracing::warn!(field = spec.name(), "field name is reserved, field ignored");
            continue;
        }
        let mut spec = spec.clone();
        let reserved: Vec<String> = spec
            .flags()
            .iter()
            .filter(|f| bootstrap::is_reserved_flag(f))
            .cloned()
            .collect();
        for flag in reserved {
            let e = StagefigError::ReservedFlag {
                field: spec.name().to_string(),
                flag: flag.clone(),
            };
            tracing::warn!(error = %e, "flag alias dropped");
            spec.remove_flag(&flag);
        }
        specs.push(spec);
    }
    specs
}
