use clap::{Parser, ValueEnum};
use std::fmt::{Display, Formatter};
use std::net::SocketAddr;
use std::time::Duration;

pub const LISTEN_ADDR_ENV: &str = "BURROW_LISTEN_ADDR";
pub const BASE_URL_ENV: &str = "BURROW_BASE_URL";
pub const STORAGE_BACKEND_ENV: &str = "BURROW_STORAGE_BACKEND";
pub const POSTGRES_DSN_ENV: &str = "BURROW_POSTGRES_DSN";
pub const POSTGRES_CONNECT_ATTEMPTS_ENV: &str = "BURROW_POSTGRES_CONNECT_ATTEMPTS";
pub const POSTGRES_MAX_CONNECTIONS_ENV: &str = "BURROW_POSTGRES_MAX_CONNECTIONS";
pub const MAX_ATTEMPTS_ENV: &str = "BURROW_MAX_ATTEMPTS";
pub const MAX_ROUNDS_ENV: &str = "BURROW_MAX_ROUNDS";
pub const OPERATION_TIMEOUT_MS_ENV: &str = "BURROW_OPERATION_TIMEOUT_MS";
pub const LOG_FORMAT_ENV: &str = "BURROW_LOG_FORMAT";

pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:3000";
pub const DEFAULT_BASE_URL: &str = "http://localhost:3000";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StorageBackendArg {
    #[value(name = "in-memory")]
    InMemory,
    #[value(name = "postgres")]
    Postgres,
}

impl Display for StorageBackendArg {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageBackendArg::InMemory => write!(f, "in-memory"),
            StorageBackendArg::Postgres => write!(f, "postgres"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormatArg {
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "burrow-gateway")]
pub struct CLI {
    #[arg(long, env = LISTEN_ADDR_ENV, default_value = DEFAULT_LISTEN_ADDR)]
    pub listen_addr: SocketAddr,

    /// Prefix for the short URLs handed back to clients.
    #[arg(long, env = BASE_URL_ENV, default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    #[arg(
        long,
        env = STORAGE_BACKEND_ENV,
        value_enum,
        default_value_t = StorageBackendArg::Postgres
    )]
    pub storage: StorageBackendArg,

    #[arg(long, env = POSTGRES_DSN_ENV, required_if_eq("storage", "postgres"))]
    pub postgres_dsn: Option<String>,

    #[arg(long, env = POSTGRES_CONNECT_ATTEMPTS_ENV, default_value_t = 5)]
    pub postgres_connect_attempts: u32,

    #[arg(long, env = POSTGRES_MAX_CONNECTIONS_ENV, default_value_t = 10)]
    pub postgres_max_connections: u32,

    /// Conflicting allocation rounds in a row, with no other writer making
    /// progress, before a request gives up.
    #[arg(long, env = MAX_ATTEMPTS_ENV, default_value_t = 5)]
    pub max_attempts: u32,

    #[arg(long, env = MAX_ROUNDS_ENV, default_value_t = 1024)]
    pub max_rounds: u32,

    #[arg(long, env = OPERATION_TIMEOUT_MS_ENV, default_value_t = 5_000)]
    pub operation_timeout_ms: u64,

    #[arg(long, env = LOG_FORMAT_ENV, value_enum, default_value_t = LogFormatArg::Text)]
    pub log_format: LogFormatArg,
}

impl CLI {
    pub fn operation_timeout(&self) -> Duration {
        Duration::from_millis(self.operation_timeout_ms)
    }
}
