//! Process configuration from CLI flags and environment variables.

use std::net::SocketAddr;

use clap::Parser;

use shopfloor_observability::LogFormat;

/// Shop-floor back office API.
#[derive(Parser, Debug, Clone)]
#[command(name = "shopfloor-api")]
#[command(about = "Materials, purchasing, goods receipt and sub-assembly tracking API")]
pub struct Args {
    /// SQLite database URL; the file is created if missing
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite://shopfloor.db")]
    pub database_url: String,

    /// Address to listen on
    #[arg(long, env = "LISTEN", default_value = "0.0.0.0:5000")]
    pub listen: SocketAddr,

    /// Maximum pooled database connections
    #[arg(long = "max-connections", env = "DB_MAX_CONNECTIONS", default_value_t = 5)]
    pub max_connections: u32,

    /// Log output format (json or pretty)
    #[arg(long, env = "LOG_FORMAT", default_value_t = LogFormat::Json)]
    pub log_format: LogFormat,
}
