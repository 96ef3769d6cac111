use std::marker::PhantomData;
use std::sync::Arc;

use crate::cache::ResolveCache;
use crate::env::EnvSource;
use crate::help::HelpHook;
use crate::resolve::{self, ResolveInput, Sources};
use crate::shape::Settings;
use crate::types::{Order, Preload, Stage};
use crate::validate::{Validator, ValidatorRegistry};

/// Entry point for resolving a settings struct.
pub struct Stagefig;

impl Stagefig {
    pub fn builder<S: Settings>() -> StagefigBuilder<S> {
        StagefigBuilder::new()
    }

    /// Resolve `S` under `order` from the running process, every time.
    pub fn load<S: Settings>(order: impl Into<Order>) -> S {
        Self::builder::<S>().order(order).load()
    }

    /// Resolve `S` under `order` once per cache; later calls share the result.
    pub fn load_once<S: Settings>(cache: &ResolveCache, order: impl Into<Order>) -> Arc<S> {
        Self::builder::<S>().order(order).load_once(cache)
    }
}

/// Builder for one resolution of `S`.
///
/// Nothing is read until [`load`](Self::load) or
/// [`load_once`](Self::load_once). Without explicit [`sources`](Self::sources)
/// the process arguments, environment and filesystem are used.
pub struct StagefigBuilder<S> {
    order: Order,
    registry: Arc<ValidatorRegistry>,
    sources: Option<Sources>,
    on_help: Option<HelpHook>,
    _phantom: PhantomData<fn() -> S>,
}

impl<S: Settings> StagefigBuilder<S> {
    fn new() -> Self {
        Self {
            order: Order::default(),
            registry: Arc::new(ValidatorRegistry::with_builtins()),
            sources: None,
            on_help: None,
            _phantom: PhantomData,
        }
    }

    /// Stages in priority-ascending order: the last one wins. Keeps the
    /// current preload mode.
    pub fn stages(mut self, stages: impl IntoIterator<Item = Stage>) -> Self {
        let preload = self.order.preload();
        self.order = Order::new(stages).with_preload(preload);
        self
    }

    pub fn preload(mut self, preload: Preload) -> Self {
        self.order = self.order.with_preload(preload);
        self
    }

    /// Replace stages and preload mode together.
    pub fn order(mut self, order: impl Into<Order>) -> Self {
        self.order = order.into();
        self
    }

    /// Share an existing registry. Replaces any validators added so far.
    pub fn registry(mut self, registry: Arc<ValidatorRegistry>) -> Self {
        self.registry = registry;
        self
    }

    /// Append a validator to this builder's registry. It runs after any
    /// earlier entry with the same name, built-ins included.
    pub fn validator(mut self, validator: impl Validator + 'static) -> Self {
        Arc::make_mut(&mut self.registry).register(validator);
        self
    }

    pub fn sources(mut self, sources: Sources) -> Self {
        self.sources = Some(sources);
        self
    }

    /// Use these arguments instead of the process arguments.
    pub fn args<I, A>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<String>,
    {
        let sources = self.sources.take().unwrap_or_else(Sources::process);
        self.sources = Some(sources.with_args(args));
        self
    }

    /// Use these variables instead of the process environment.
    pub fn env_vars<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let sources = self.sources.take().unwrap_or_else(Sources::process);
        self.sources = Some(sources.with_env_vars(vars));
        self
    }

    pub fn env(mut self, env: impl EnvSource + 'static) -> Self {
        let sources = self.sources.take().unwrap_or_else(Sources::process);
        self.sources = Some(sources.with_env(env));
        self
    }

    /// Called with the rendered usage when `-h`/`-help` is set.
    pub fn on_help(mut self, hook: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.on_help = Some(Arc::new(hook));
        self
    }

    pub fn current_order(&self) -> &Order {
        &self.order
    }

    /// Resolve a fresh `S`.
    pub fn load(self) -> S {
        let sources = self.sources.unwrap_or_else(Sources::process);
        resolve::resolve(ResolveInput {
            order: &self.order,
            sources: &sources,
            registry: &self.registry,
            on_help: self.on_help.as_ref(),
        })
    }

    /// Resolve `S` at most once per `cache`.
    pub fn load_once(self, cache: &ResolveCache) -> Arc<S> {
        cache.get_or_init(move || self.load())
    }
}
