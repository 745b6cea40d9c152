use std::{env, net::SocketAddr};

use tracing::warn;

use crate::error::AppError;

const DEV_SECRET_KEY: &str = "change-me-trip-planner-development-secret";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub listen_addr: SocketAddr,
    pub secret_key: String,
    pub google_maps_api_key: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://trips.db".to_string());
        let listen_addr: SocketAddr = env::var("APP_LISTEN_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:3000".to_string())
            .parse()
            .map_err(|err| AppError::Config(format!("invalid APP_LISTEN_ADDR: {err}")))?;

        let secret_key = match env::var("SECRET_KEY") {
            Ok(key) if !key.trim().is_empty() => key,
            _ => {
                warn!("SECRET_KEY not set, flash cookies use the development key");
                DEV_SECRET_KEY.to_string()
            }
        };

        let google_maps_api_key = env::var("GOOGLE_MAPS_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty());

        Ok(Self {
            database_url,
            listen_addr,
            secret_key,
            google_maps_api_key,
        })
    }
}
