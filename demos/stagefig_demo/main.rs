//! # stagefig demo application
//!
//! A sample CLI that resolves [`DemoSettings`] from flags, a JSON file and the
//! environment. It exists to demonstrate and manually verify stagefig.
//!
//! ## Running
//!
//! ```sh
//! cargo run --example stagefig_demo
//! cargo run --example stagefig_demo -- -port 9000 -v
//! ```
//!
//! ## Features demonstrated
//!
//! | Feature | How to exercise it |
//! |---------|--------------------|
//! | Declared defaults | `cargo run --example stagefig_demo` |
//! | Settings file | `echo '{"port": 7000}' > demo.json; CONFIG=demo.json cargo run --example stagefig_demo` |
//! | Env override | `DEMO_PORT=9999 cargo run --example stagefig_demo` |
//! | Flag override | `cargo run --example stagefig_demo -- -p 1234` |
//! | Stage order | `STAGEFIG_ORDER=flag,env cargo run --example stagefig_demo -- -p 1 ` with `DEMO_PORT=2` |
//! | Usage | `cargo run --example stagefig_demo -- -help` |
//! | Strict parsing (clap) | `cargo run --example stagefig_demo -- --strict --port 1` |
//! | Custom validator | `-name=" padded "` is trimmed by the `trim` validator registered below |
//! | Logging | `RUST_LOG=stagefig=debug cargo run --example stagefig_demo` |

mod config;

use stagefig::{Order, ResolveCache, Sources, Stage, Stagefig, Value, validator};
use tracing_subscriber::EnvFilter;

use config::DemoSettings;

static SETTINGS: ResolveCache = ResolveCache::new();

fn stage_order() -> Order {
    match std::env::var("STAGEFIG_ORDER") {
        Ok(text) => text.parse().unwrap_or_else(|e| {
            eprintln!("STAGEFIG_ORDER: {e}");
            std::process::exit(2);
        }),
        Err(_) => Order::new([Stage::File, Stage::Env, Stage::Flag]),
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let mut args = Sources::process().args;
    let strict = args.first().is_some_and(|a| a == "--strict");

    if strict {
        let argv = std::iter::once("stagefig-demo".to_string()).chain(args.drain(1..));
        let matches = stagefig::cli::command::<DemoSettings>("stagefig-demo").get_matches_from(argv);
        args = stagefig::cli::matches_to_args::<DemoSettings>(&matches);
    }

    let order = stage_order();
    let settings = Stagefig::builder::<DemoSettings>()
        .order(order.clone())
        .args(args)
        .validator(validator("trim", |raw, _| Some(Value::Str(raw.trim().to_string()))))
        .on_help(|usage| {
            print!("{usage}");
            std::process::exit(0);
        })
        .load_once(&SETTINGS);

    if settings.verbose {
        println!("order: {order}");
    }
    println!("name      {}", settings.name);
    println!("port      {}", settings.port);
    println!("upstream  {}", settings.upstream);
    println!("timeout   {:?}", settings.timeout);
    println!("tags      {}", settings.tags.join(", "));
    println!("log_file  {}", settings.log_file);
    println!(
        "limits    max_connections={} burst={}",
        settings.limits.max_connections, settings.limits.burst
    );
}
