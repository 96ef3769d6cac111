use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;

use chrono::TimeDelta;
use serde::Deserialize;
use stagefig::{
    FsReader, Json, Order, Preload, ResolveCache, Sources, Stage, Stagefig, ValidatorRegistry, Value,
    resolve_config_path, validator,
};

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
struct Pair {
    param1: String,
    param2: String,
}

stagefig::settings! {
    #[derive(Debug, Default)]
    struct App {
        #[setting(default = "none", flag = "mode", env = "APP_MODE", json = "mode")]
        mode: String,
        #[setting(default = "11", flag = "count", env = "APP_COUNT", json = "count")]
        count: i64,
        #[setting(default = "0", flag = "wait", env = "APP_WAIT", json = "wait")]
        wait: TimeDelta,
        #[setting(flag = "pair", env = "APP_PAIR", json = "pair")]
        pair: Json<Pair>,
        #[setting(default = "http://def:81", flag = "upstream", env = "APP_UPSTREAM", json = "upstream", valid = "url")]
        upstream: String,
    }
}

fn write_settings(dir: &tempfile::TempDir, body: &str) -> PathBuf {
    let path = dir.path().join("settings.json");
    std::fs::write(&path, body).unwrap();
    path
}

#[test]
fn last_stage_in_the_order_wins() {
    let sources = Sources::isolated()
        .with_args(["-mode=B"])
        .with_env_vars([("APP_MODE", "A")]);

    let app: App = Stagefig::builder()
        .sources(sources.clone())
        .stages([Stage::Env, Stage::Flag])
        .load();
    assert_eq!(app.mode, "B");

    let app: App = Stagefig::builder()
        .sources(sources)
        .stages([Stage::Flag, Stage::Env])
        .load();
    assert_eq!(app.mode, "A");
}

#[test]
fn stage_without_a_value_falls_through() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_settings(&dir, r#"{"mode": "file"}"#);
    let sources = Sources::isolated().with_env_vars([("CONFIG", path.to_string_lossy())]);

    let app: App = Stagefig::builder()
        .sources(sources)
        .stages([Stage::File, Stage::Env, Stage::Flag])
        .load();
    assert_eq!(app.mode, "file");
    assert_eq!(app.count, 11);
}

#[test]
fn declared_default_is_coerced() {
    let app: App = Stagefig::builder().sources(Sources::isolated()).load();
    assert_eq!(app.count, 11);
    assert_eq!(app.mode, "none");
    assert_eq!(app.upstream, "def:81");
}

#[test]
fn durations_from_every_source() {
    let load = |raw: &str| -> TimeDelta {
        let app: App = Stagefig::builder()
            .sources(Sources::isolated().with_args([format!("-wait={raw}")]))
            .stages([Stage::Flag])
            .load();
        app.wait
    };
    assert_eq!(load("5"), TimeDelta::seconds(5));
    assert_eq!(
        load("1h2m3s"),
        TimeDelta::hours(1) + TimeDelta::minutes(2) + TimeDelta::seconds(3)
    );
    assert_eq!(load("-5"), TimeDelta::seconds(-5));
}

#[test]
fn bootstrap_path_matches_the_main_pass() {
    let dir = tempfile::tempdir().unwrap();
    let from_env = write_settings(&dir, r#"{"count": 5}"#);
    let from_flag = dir.path().join("flag.json");
    std::fs::write(&from_flag, r#"{"count": 7}"#).unwrap();

    let args = vec!["-config".to_string(), from_flag.to_string_lossy().into_owned()];
    let env = HashMap::from([("CONFIG".to_string(), from_env.to_string_lossy().into_owned())]);

    let preloaded = resolve_config_path(Preload::EnvThenFlag.stages(), &args, &env, &FsReader);
    assert_eq!(preloaded, Some(from_flag.clone()));

    let sources = Sources::isolated().with_args(args).with_env(env);
    let main_pass: App = Stagefig::builder()
        .sources(sources.clone())
        .order(Order::new([Stage::Env, Stage::Flag, Stage::File]).with_preload(Preload::None))
        .load();
    let with_preload: App = Stagefig::builder()
        .sources(sources)
        .order(Order::new([Stage::File]).with_preload(Preload::EnvThenFlag))
        .load();
    assert_eq!(main_pass.count, 7);
    assert_eq!(with_preload.count, 7);
}

#[test]
fn custom_validator_registered_first_beats_builtin() {
    let custom = validator("url", |_, _| Some(Value::Str("custom".into())));

    let mut first = ValidatorRegistry::empty();
    first.register(custom).register_builtins();
    let app: App = Stagefig::builder()
        .sources(Sources::isolated())
        .registry(Arc::new(first))
        .load();
    assert_eq!(app.upstream, "custom");

    let app: App = Stagefig::builder()
        .sources(Sources::isolated())
        .validator(validator("url", |_, _| Some(Value::Str("custom".into()))))
        .load();
    assert_eq!(app.upstream, "def:81");
}

#[test]
fn url_normalisation_through_resolution() {
    let load = |raw: &str| -> String {
        let app: App = Stagefig::builder()
            .sources(Sources::isolated().with_env_vars([("APP_UPSTREAM", raw)]))
            .stages([Stage::Env])
            .load();
        app.upstream
    };
    assert_eq!(load("http://host:8080/path"), "host:8080");
    assert_eq!(load("host"), "host:80");
    assert_eq!(load("256.1.1.1"), "");
}

#[test]
fn json_object_round_trip_and_empty_override() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_settings(&dir, r#"{"pair": {"param1": "x", "param2": "y"}}"#);
    let config = path.to_string_lossy().into_owned();

    let app: App = Stagefig::builder()
        .sources(Sources::isolated().with_env_vars([("CONFIG", config.clone())]))
        .stages([Stage::File])
        .load();
    assert_eq!(
        *app.pair,
        Pair {
            param1: "x".into(),
            param2: "y".into()
        }
    );

    let app: App = Stagefig::builder()
        .sources(Sources::isolated().with_env_vars([("CONFIG", config), ("APP_PAIR", String::new())]))
        .stages([Stage::File, Stage::Env])
        .load();
    assert_eq!(*app.pair, Pair::default());
}

#[test]
fn resolve_once_is_shared_across_threads() {
    static CACHE: ResolveCache = ResolveCache::new();

    let results: Vec<Arc<App>> = thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|i| {
                scope.spawn(move || {
                    Stagefig::builder::<App>()
                        .sources(Sources::isolated().with_args([format!("-count={i}")]))
                        .stages([Stage::Flag])
                        .load_once(&CACHE)
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    for app in &results {
        assert!(Arc::ptr_eq(app, &results[0]));
    }
    assert!(CACHE.contains::<App>());
}

#[test]
fn resolve_every_time_is_fresh() {
    let first: App = Stagefig::builder()
        .sources(Sources::isolated().with_args(["-count=1"]))
        .stages([Stage::Flag])
        .load();
    let second: App = Stagefig::builder()
        .sources(Sources::isolated().with_args(["-count=2"]))
        .stages([Stage::Flag])
        .load();
    assert_eq!(first.count, 1);
    assert_eq!(second.count, 2);
}
