#[cfg(test)]
pub mod test {
    use std::time::Duration;

    use chrono::TimeDelta;
    use serde::Deserialize;

    use crate::shape::{FieldSpec, Settings, Shape};
    use crate::value::Json;

    #[derive(Debug, Clone, Default, PartialEq, Deserialize)]
    pub struct Pair {
        pub param1: String,
        pub param2: String,
    }

    #[derive(Debug, Default)]
    pub struct Server {
        pub host: String,
        pub port: u16,
        pub debug: bool,
        pub timeout: Duration,
        pub pair: Json<Pair>,
    }

    impl Settings for Server {
        fn describe(shape: &mut Shape<Self>) {
            shape
                .field("host", |s: &mut Self| &mut s.host)
                .default("localhost")
                .flag("host")
                .env("server_host")
                .json("host")
                .help("Address to bind");
            shape
                .field("port", |s: &mut Self| &mut s.port)
                .default("8080")
                .flag("p,port")
                .env("SERVER_PORT")
                .json("port")
                .help("Port to listen on");
            shape
                .field("debug", |s: &mut Self| &mut s.debug)
                .default("false")
                .flag("debug,d")
                .env("SERVER_DEBUG")
                .json("debug");
            shape
                .field("timeout", |s: &mut Self| &mut s.timeout)
                .default("30")
                .flag("timeout")
                .env("SERVER_TIMEOUT")
                .json("timeout")
                .help("Request timeout");
            shape
                .field("pair", |s: &mut Self| &mut s.pair)
                .flag("pair")
                .json("pair");
        }
    }

    /// Field specs of [`Server`], owned so tests can build cells from them.
    pub fn server_specs() -> Vec<FieldSpec> {
        Shape::<Server>::of().specs().cloned().collect()
    }

    crate::settings! {
        #[derive(Debug, Default)]
        pub struct Macro {
            /// Display name.
            #[setting(default = "anon", flag = "name", env = "APP_NAME", json = "name", help = "Display name")]
            pub name: String,
            #[setting(default = "3", flag = "r,retries", valid = "int")]
            pub retries: i64,
            #[setting(flag = "v,verbose", text = "Chatty output")]
            pub verbose: bool,
            pub untagged: String,
        }
    }

    /// One field per supported kind plus the custom validators
    /// `email`, `test` and `max10` that tests register themselves.
    #[derive(Debug, Default)]
    pub struct Probe {
        pub order: String,
        pub email: String,
        pub slice: Vec<String>,
        pub int: i64,
        pub small: i8,
        pub uint: u64,
        pub float: f64,
        pub flag: bool,
        pub wait: TimeDelta,
        pub pair: Json<Pair>,
        pub id: String,
    }

    impl Settings for Probe {
        fn describe(shape: &mut Shape<Self>) {
            shape
                .field("order", |s: &mut Self| &mut s.order)
                .default("http://def:81")
                .flag("to,test,order")
                .env("TEST_ORDER")
                .json("test-order")
                .help("Ordering probe")
                .valid("url");
            shape
                .field("email", |s: &mut Self| &mut s.email)
                .default("email")
                .flag("test-email")
                .env("TEST_EMAIL")
                .json("test-email")
                .valid("email");
            shape
                .field("slice", |s: &mut Self| &mut s.slice)
                .default("1,2,3")
                .flag("test-slice")
                .valid("test");
            shape
                .field("int", |s: &mut Self| &mut s.int)
                .default("11")
                .flag("test-int")
                .env("TEST_INT")
                .json("test-int")
                .valid("max10");
            shape
                .field("small", |s: &mut Self| &mut s.small)
                .default("300")
                .flag("test-small");
            shape
                .field("uint", |s: &mut Self| &mut s.uint)
                .default("111")
                .flag("test-uint")
                .json("test-uint");
            shape
                .field("float", |s: &mut Self| &mut s.float)
                .default("1")
                .flag("test-float")
                .json("test-float");
            shape
                .field("flag", |s: &mut Self| &mut s.flag)
                .default("true")
                .flag("test-bool")
                .env("TEST_BOOL")
                .json("test-bool");
            shape
                .field("wait", |s: &mut Self| &mut s.wait)
                .default("1s")
                .flag("test-wait")
                .env("TEST_WAIT")
                .json("test-wait");
            shape
                .field("pair", |s: &mut Self| &mut s.pair)
                .default(r#"{"param1":"default_001","param2":"default_002"}"#)
                .flag("test-pair")
                .env("TEST_PAIR")
                .json("test-pair");
            shape
                .field("id", |s: &mut Self| &mut s.id)
                .flag("test-id")
                .valid("uuid");
        }
    }

    #[test]
    fn server_shape_loads_defaults() {
        let shape = Shape::<Server>::of();
        assert_eq!(shape.len(), 5);
        assert_eq!(shape.descriptor("host").default_value(), "localhost");
        assert_eq!(shape.descriptor("timeout").default_value(), "30");
    }

    #[test]
    fn probe_shape_declares_every_field() {
        let shape = Shape::<Probe>::of();
        assert_eq!(shape.len(), 11);
        assert_eq!(shape.descriptor("order").validator(), Some("url"));
    }
}
