use std::fmt;
use std::str::FromStr;

/// One source of configuration values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Command-line flags (`-name=value`, `-name value`, `-name`).
    Flag,
    /// The JSON settings file.
    File,
    /// Process environment variables.
    Env,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Flag => write!(f, "flags"),
            Stage::File => write!(f, "config file"),
            Stage::Env => write!(f, "environment"),
        }
    }
}

impl FromStr for Stage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "flag" | "flags" => Ok(Stage::Flag),
            "file" | "json" => Ok(Stage::File),
            "env" | "environment" => Ok(Stage::Env),
            other => Err(format!("unknown stage '{other}'")),
        }
    }
}

/// How the config-file path is discovered before the main merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Preload {
    /// Look at `CONFIG`, then let `-config` override it.
    #[default]
    EnvThenFlag,
    /// Look at `-config`, then let `CONFIG` override it.
    FlagThenEnv,
    /// Only `-config`.
    FlagOnly,
    /// Only `CONFIG`.
    EnvOnly,
    /// No pre-pass. The path is whatever the config field holds when the
    /// file stage is reached in the caller's own order.
    None,
}

impl Preload {
    /// Stages consulted by the pre-pass, lowest priority first.
    pub fn stages(self) -> &'static [Stage] {
        match self {
            Preload::EnvThenFlag => &[Stage::Env, Stage::Flag],
            Preload::FlagThenEnv => &[Stage::Flag, Stage::Env],
            Preload::FlagOnly => &[Stage::Flag],
            Preload::EnvOnly => &[Stage::Env],
            Preload::None => &[],
        }
    }
}

/// Caller-specified merge order plus the preload mode.
///
/// Stages are listed in **priority-ascending** order: the last entry wins.
/// An empty order leaves every field at its declared default.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Order {
    stages: Vec<Stage>,
    preload: Preload,
}

impl Order {
    pub fn new(stages: impl IntoIterator<Item = Stage>) -> Self {
        Self {
            stages: stages.into_iter().collect(),
            preload: Preload::default(),
        }
    }

    pub fn with_preload(mut self, preload: Preload) -> Self {
        self.preload = preload;
        self
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn preload(&self) -> Preload {
        self.preload
    }

    pub fn contains(&self, stage: Stage) -> bool {
        self.stages.contains(&stage)
    }
}

impl<const N: usize> From<[Stage; N]> for Order {
    fn from(stages: [Stage; N]) -> Self {
        Order::new(stages)
    }
}

impl From<Vec<Stage>> for Order {
    fn from(stages: Vec<Stage>) -> Self {
        Order::new(stages)
    }
}

/// Parses a comma-separated list such as `"file,env,flag"`.
impl FromStr for Order {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let stages = s
            .split(',')
            .filter(|part| !part.trim().is_empty())
            .map(Stage::from_str)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Order::new(stages))
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.stages.is_empty() {
            return write!(f, "[defaults]");
        }
        for (i, stage) in self.stages.iter().enumerate() {
            if i > 0 {
                write!(f, " -> ")?;
            }
            write!(f, "[{stage}]")?;
        }
        Ok(())
    }
}
