use std::env;

use log::*;

const DEFAULT_UE_HOST: &str = "127.0.0.1";
const DEFAULT_UE_PORT: u16 = 8360;
const DEFAULT_MAX_CONNECTIONS: u32 = 25;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// The size of the sqlx connection pool backing the exchange database.
    pub database_max_connections: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_UE_HOST.to_string(),
            port: DEFAULT_UE_PORT,
            database_url: String::default(),
            database_max_connections: DEFAULT_MAX_CONNECTIONS,
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("UE_HOST").ok().unwrap_or_else(|| DEFAULT_UE_HOST.into());
        let port = env::var("UE_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!("🪛️ {s} is not a valid port for UE_PORT. {e} Using the default, {DEFAULT_UE_PORT}, instead.");
                    DEFAULT_UE_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_UE_PORT);
        let database_url = env::var("UE_DATABASE_URL").ok().unwrap_or_else(|| {
            warn!("🪛️ UE_DATABASE_URL is not set. Falling back to the engine's default database location.");
            trading_engine::db_url()
        });
        let database_max_connections = env::var("UE_DATABASE_MAX_CONNECTIONS")
            .ok()
            .and_then(|s| {
                s.parse::<u32>()
                    .map_err(|e| {
                        error!("🪛️ {s} is not a valid value for UE_DATABASE_MAX_CONNECTIONS. {e}");
                        e
                    })
                    .ok()
            })
            .unwrap_or(DEFAULT_MAX_CONNECTIONS);
        Self { host, port, database_url, database_max_connections }
    }
}
