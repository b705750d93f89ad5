use std::env;
use std::net::SocketAddr;

use thiserror::Error;

const DEFAULT_DATABASE_URL: &str = "sqlite://studyplan.db?mode=rwc";
const DEFAULT_BIND_ADDR: &str = "127.0.0.1:5000";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} is invalid: {value}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub max_connections: u32,
    /// Admin account created at startup when absent, from `ADMIN_EMAIL` and
    /// `ADMIN_NAME`.
    pub admin: Option<AdminAccount>,
}

#[derive(Clone, Debug)]
pub struct AdminAccount {
    pub name: String,
    pub email: String,
}

impl Config {
    /// Reads `.env` (if present) and then the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string());

        let bind_addr = parse_var("BIND_ADDR", DEFAULT_BIND_ADDR)?;

        let max_connections = match env::var("DB_MAX_CONNECTIONS") {
            Ok(raw) => match raw.parse::<u32>() {
                Ok(n) if n > 0 => n,
                _ => return Err(invalid("DB_MAX_CONNECTIONS", raw)),
            },
            Err(_) => DEFAULT_MAX_CONNECTIONS,
        };

        let admin = env::var("ADMIN_EMAIL")
            .ok()
            .map(|email| email.trim().to_lowercase())
            .filter(|email| !email.is_empty())
            .map(|email| AdminAccount {
                name: env::var("ADMIN_NAME").unwrap_or_else(|_| "Admin User".to_string()),
                email,
            });

        Ok(Self {
            database_url,
            bind_addr,
            max_connections,
            admin,
        })
    }
}

fn parse_var(name: &'static str, default: &str) -> Result<SocketAddr, ConfigError> {
    let raw = env::var(name).unwrap_or_else(|_| default.to_string());
    raw.parse().map_err(|_| invalid(name, raw))
}

fn invalid(name: &'static str, value: String) -> ConfigError {
    ConfigError::Invalid { name, value }
}
