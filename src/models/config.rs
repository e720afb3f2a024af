use std::env;

const DEFAULT_UPSTREAM_URL: &str = "http://localhost:11434";
const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8000";

/// Runtime configuration, read once at startup and passed into the client
/// explicitly so tests can point the gateway at arbitrary upstreams.
#[derive(Clone, Debug)]
pub struct Config {
    pub upstream_url: String,
    pub listen_addr: String,
}

impl Config {
    pub fn from_env() -> Self {
        let upstream_url = env::var("OLLAMA_URL")
            .unwrap_or_else(|_| DEFAULT_UPSTREAM_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        let listen_addr =
            env::var("LISTEN_ADDR").unwrap_or_else(|_| DEFAULT_LISTEN_ADDR.to_string());
        Self {
            upstream_url,
            listen_addr,
        }
    }
}
