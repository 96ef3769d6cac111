//! Settings struct for the stagefig demo application.
//!
//! | Field | Flag | Env var | JSON key | Validator |
//! |-------|------|---------|----------|-----------|
//! | `name` | `-n`, `-name` | `DEMO_NAME` | `name` | `trim` |
//! | `port` | `-p`, `-port` | `DEMO_PORT` | `port` | |
//! | `upstream` | `-upstream` | `DEMO_UPSTREAM` | `upstream` | `url` |
//! | `timeout` | `-timeout` | `DEMO_TIMEOUT` | `timeout` | |
//! | `tags` | `-tags` | `DEMO_TAGS` | `tags` | |
//! | `verbose` | `-v`, `-verbose` | `DEMO_VERBOSE` | `verbose` | |
//! | `log_file` | `-log-file` | | `log_file` | `tmp_file` |
//! | `limits` | | | `limits` | |

use std::time::Duration;

use serde::Deserialize;
use stagefig::Json;

/// Nested settings that only the JSON file can express.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Limits {
    pub max_connections: u32,
    pub burst: u32,
}

stagefig::settings! {
    #[derive(Debug, Default)]
    pub struct DemoSettings {
        /// Name shown in the banner.
        #[setting(default = "stagefig-demo", flag = "n,name", env = "DEMO_NAME", json = "name", help = "Name shown in the banner", valid = "trim")]
        pub name: String,

        #[setting(default = "8080", flag = "p,port", env = "DEMO_PORT", json = "port", help = "Port to listen on")]
        pub port: u16,

        #[setting(default = "http://localhost:9000", flag = "upstream", env = "DEMO_UPSTREAM", json = "upstream", help = "Upstream service", valid = "url")]
        pub upstream: String,

        #[setting(default = "30s", flag = "timeout", env = "DEMO_TIMEOUT", json = "timeout", help = "Request timeout")]
        pub timeout: Duration,

        #[setting(default = "web,api", flag = "tags", env = "DEMO_TAGS", json = "tags", help = "Comma-separated tags")]
        pub tags: Vec<String>,

        #[setting(flag = "v,verbose", env = "DEMO_VERBOSE", json = "verbose", help = "Print the stage order too")]
        pub verbose: bool,

        #[setting(default = "stagefig-demo.log", flag = "log-file", json = "log_file", help = "Log file, placed in the temp directory", valid = "tmp_file")]
        pub log_file: String,

        #[setting(default = r#"{"max_connections": 100, "burst": 10}"#, json = "limits", help = "Connection limits (JSON object)")]
        pub limits: Json<Limits>,
    }
}
