use clap::Parser;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

/// Command line interface for the application
///
/// Every option can also be supplied through the environment or a `.env` file.
#[derive(Parser, Debug)]
#[command(name = "bookshelf", about = "REST backend for users and books")]
pub struct Cli {
    /// Path of the SQLite database file
    #[arg(long, env = "DATABASE_URL", default_value = "bookshelf.db")]
    pub database_url: String,

    /// Address the HTTP server binds to
    #[arg(long, env = "BIND_ADDRESS", default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    pub bind: IpAddr,

    /// Port the HTTP server listens on
    #[arg(short, long, env = "PORT", default_value_t = 5000)]
    pub port: u16,

    /// Sets the logging verbosity level for the application
    /// Possible values: "error", "warn", "info", "debug", "trace"
    /// Default: "info"
    #[arg(long, env = "LOG_LEVEL", default_value_t = String::from("info"))]
    pub logging_level: String,

    /// Also write logs to a daily rotating file under `logs/`
    #[arg(long)]
    pub log_file: bool,
}

impl Cli {
    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind, self.port)
    }
}
