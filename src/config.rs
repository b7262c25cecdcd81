use std::net::IpAddr;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub host: IpAddr,
    pub port: u16,
    pub frontend_origin: String,
    pub max_body_size: usize,
    pub rate_limit_max: u32,
    pub rate_limit_window_secs: u64,
    pub log_level: String,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let database_url = env_required("DATABASE_URL")?;
        let jwt_secret = env_required("JWT_SECRET")?;

        let host: IpAddr = env_or("CLIENTDESK_HOST", "0.0.0.0")
            .parse()
            .map_err(|e| format!("Invalid CLIENTDESK_HOST: {e}"))?;

        let port: u16 = env_or("CLIENTDESK_PORT", "5000")
            .parse()
            .map_err(|e| format!("Invalid CLIENTDESK_PORT: {e}"))?;

        let frontend_origin = env_or("CLIENTDESK_FRONTEND_ORIGIN", "http://localhost:3000");

        let max_body_size: usize = env_or("CLIENTDESK_MAX_BODY_SIZE", "10485760")
            .parse()
            .map_err(|e| format!("Invalid CLIENTDESK_MAX_BODY_SIZE: {e}"))?;

        let rate_limit_max: u32 = env_or("CLIENTDESK_RATE_LIMIT_MAX", "100")
            .parse()
            .map_err(|e| format!("Invalid CLIENTDESK_RATE_LIMIT_MAX: {e}"))?;

        let rate_limit_window_secs: u64 = env_or("CLIENTDESK_RATE_LIMIT_WINDOW_SECS", "900")
            .parse()
            .map_err(|e| format!("Invalid CLIENTDESK_RATE_LIMIT_WINDOW_SECS: {e}"))?;

        let log_level = env_or("CLIENTDESK_LOG_LEVEL", "info");

        Ok(Config {
            database_url,
            jwt_secret,
            host,
            port,
            frontend_origin,
            max_body_size,
            rate_limit_max,
            rate_limit_window_secs,
            log_level,
        })
    }
}

fn env_required(key: &str) -> Result<String, String> {
    std::env::var(key).map_err(|_| format!("Missing required environment variable: {key}"))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
