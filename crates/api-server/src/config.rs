//! Server configuration from the environment

use std::net::SocketAddr;
use std::path::PathBuf;

const DEFAULT_DATA_DIR: &str = ".todo-data";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8081";

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub data_dir: PathBuf,
    pub bind_addr: SocketAddr,
    pub cors_permissive: bool,
}

fn parse_flag(raw: Option<&str>, default: bool) -> bool {
    match raw.map(|r| r.trim().to_ascii_lowercase()) {
        Some(v) => match v.as_str() {
            "1" | "true" | "yes" | "on" => true,
            "0" | "false" | "no" | "off" => false,
            _ => default,
        },
        None => default,
    }
}

impl ServerConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let data_dir = lookup("TODO_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));

        let raw_addr = lookup("TODO_BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = raw_addr
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid TODO_BIND_ADDR `{}`: {}", raw_addr, e))?;

        let cors_permissive = parse_flag(lookup("TODO_CORS_PERMISSIVE").as_deref(), true);

        Ok(Self {
            data_dir,
            bind_addr,
            cors_permissive,
        })
    }

    pub fn tasks_path(&self) -> PathBuf {
        self.data_dir.join("todos.json")
    }
}
