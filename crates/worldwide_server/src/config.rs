//! Server configuration from flags, environment and `.env`.
//!
//! Every flag has an environment fallback so deployments can be configured
//! without a command line. `.env` is loaded by `main` before parsing.

use clap::Parser;
use std::net::{Ipv4Addr, SocketAddr};
use worldwide_core::db::DB_URI_ENV;
use worldwide_core::GatewayConfig;

pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_CORS_ORIGINS: [&str; 2] = ["http://localhost:5173", "http://localhost:3000"];

#[derive(Debug, Clone, Parser)]
#[command(name = "worldwide-server", version, about = "Worldwide city travel-log API")]
pub struct ServerConfig {
    /// TCP port to listen on.
    #[arg(long, env = "PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Document store connection string (`sqlite::memory:` or `sqlite://<path>`).
    #[arg(long, env = DB_URI_ENV)]
    pub db_uri: Option<String>,

    /// One of trace|debug|info|warn|error.
    #[arg(long, env = "WORLDWIDE_LOG_LEVEL", default_value = worldwide_core::default_log_level())]
    pub log_level: String,

    /// Absolute directory for rotating log files; stderr only when unset.
    #[arg(long, env = "WORLDWIDE_LOG_DIR")]
    pub log_dir: Option<String>,

    /// Browser origins allowed by CORS.
    #[arg(
        long = "cors-origin",
        env = "WORLDWIDE_CORS_ORIGINS",
        value_delimiter = ',',
        default_values_t = DEFAULT_CORS_ORIGINS.map(String::from)
    )]
    pub cors_origins: Vec<String>,
}

impl ServerConfig {
    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::from((Ipv4Addr::UNSPECIFIED, self.port))
    }

    pub fn gateway_config(&self) -> GatewayConfig {
        GatewayConfig {
            uri: self
                .db_uri
                .as_deref()
                .map(str::trim)
                .filter(|uri| !uri.is_empty())
                .map(str::to_string),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ServerConfig, DEFAULT_PORT};
    use clap::Parser;

    #[test]
    fn flags_override_defaults() {
        let config = ServerConfig::try_parse_from([
            "worldwide-server",
            "--port",
            "9100",
            "--db-uri",
            "sqlite::memory:",
            "--cors-origin",
            "https://a.example,https://b.example",
        ])
        .unwrap();

        assert_eq!(config.port, 9100);
        assert_eq!(config.listen_addr().port(), 9100);
        assert_eq!(config.gateway_config().uri.as_deref(), Some("sqlite::memory:"));
        assert_eq!(
            config.cors_origins,
            vec!["https://a.example".to_string(), "https://b.example".to_string()]
        );
        assert_ne!(config.port, DEFAULT_PORT);
    }

    #[test]
    fn blank_db_uri_counts_as_absent() {
        let config =
            ServerConfig::try_parse_from(["worldwide-server", "--db-uri", "  "]).unwrap();
        assert_eq!(config.gateway_config().uri, None);
    }
}
