use std::collections::HashMap;

use crate::cell::Cells;
use crate::types::Stage;

/// Lookup of environment variables by exact name.
///
/// [`ProcessEnv`] reads the real process environment. A `HashMap` works as a
/// synthetic environment, so tests never need to mutate process state.
pub trait EnvSource: Send + Sync {
    fn var(&self, name: &str) -> Option<String>;
}

/// The process environment. Variables that are not valid Unicode are treated
/// as unset.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

impl EnvSource for HashMap<String, String> {
    fn var(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

/// Write every bound, set variable into its cell. A variable set to the empty
/// string counts as set.
pub fn apply_env(cells: &mut Cells<'_>, env: &dyn EnvSource) {
    for cell in cells.iter_mut() {
        let Some(name) = cell.spec().env() else {
            continue;
        };
        if let Some(value) = env.var(name) {
            cell.set_from(Stage::Env, &value);
        }
    }
}
