// src/config.rs

use std::env;
use std::net::SocketAddr;

use dotenvy::dotenv;
use thiserror::Error;

/// Upper bound on candidates fetched for a section without a difficulty split.
pub const FLAT_POOL_CAP: usize = 500;

/// Upper bound on candidates fetched per difficulty bucket.
pub const DIFFICULTY_POOL_CAP: usize = 200;

/// Candidates are over-fetched by this factor so shuffling has a surplus to draw from.
pub const CANDIDATE_BUFFER_FACTOR: usize = 2;

/// Default page size for listing endpoints.
pub const DEFAULT_PAGE_LIMIT: i64 = 100;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

/// Bounds applied when fetching candidate pools.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerationLimits {
    pub flat_pool_cap: usize,
    pub difficulty_pool_cap: usize,
    pub buffer_factor: usize,
}

impl Default for GenerationLimits {
    fn default() -> Self {
        Self {
            flat_pool_cap: FLAT_POOL_CAP,
            difficulty_pool_cap: DIFFICULTY_POOL_CAP,
            buffer_factor: CANDIDATE_BUFFER_FACTOR,
        }
    }
}

impl GenerationLimits {
    /// `min(cap, requested × buffer_factor)`.
    pub fn candidate_limit(&self, requested: usize, cap: usize) -> usize {
        cap.min(requested.saturating_mul(self.buffer_factor))
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub rust_log: String,
    pub bind_addr: SocketAddr,
    pub db_max_connections: u32,
    pub limits: GenerationLimits,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv().ok();

        let database_url =
            env::var("DATABASE_URL").map_err(|_| ConfigError::Missing("DATABASE_URL"))?;

        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        let bind_addr = parse_or("BIND_ADDR", "0.0.0.0:3000")?;
        let db_max_connections = parse_or("DB_MAX_CONNECTIONS", "5")?;

        Ok(Self {
            database_url,
            rust_log,
            bind_addr,
            db_max_connections,
            limits: GenerationLimits::default(),
        })
    }
}

fn parse_or<T: std::str::FromStr>(name: &'static str, default: &str) -> Result<T, ConfigError> {
    let value = env::var(name).unwrap_or_else(|_| default.to_string());
    value
        .parse()
        .map_err(|_| ConfigError::Invalid { name, value })
}
