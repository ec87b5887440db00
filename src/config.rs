use std::env;

pub struct Config {
    pub database_url: String,
    pub server_port: u16,
    pub server_host: String,
    /// Resend API key for outbound email. Optional so the server can start
    /// without it; registration will fail with a delivery error until set.
    pub resend_api_key: Option<String>,
    pub from_email: String,
    /// Seconds before an unverified registration is reclaimed.
    pub cleanup_delay_secs: u64,
    /// Fixed UTC offset (hours) used for due-date arithmetic. Defaults to -3
    /// (the deployment's local timezone).
    pub utc_offset_hours: i32,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            server_port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .expect("SERVER_PORT must be a number"),
            server_host: env::var("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            resend_api_key: env::var("RESEND_API_KEY").ok(),
            from_email: env::var("FROM_EMAIL")
                .unwrap_or_else(|_| "noreply@yourdomain.com".to_string()),
            cleanup_delay_secs: env::var("CLEANUP_DELAY_SECS")
                .unwrap_or_else(|_| "60".to_string())
                .parse()
                .expect("CLEANUP_DELAY_SECS must be a number"),
            utc_offset_hours: env::var("UTC_OFFSET_HOURS")
                .unwrap_or_else(|_| "-3".to_string())
                .parse()
                .expect("UTC_OFFSET_HOURS must be a number"),
        }
    }

    pub fn server_url(&self) -> String {
        format!("http://{}:{}", self.server_host, self.server_port)
    }

    /// Fixed offset used when computing recurring due dates.
    pub fn local_offset(&self) -> chrono::FixedOffset {
        chrono::FixedOffset::east_opt(self.utc_offset_hours * 3600)
            .expect("UTC_OFFSET_HOURS out of range")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_env() {
        // Set required environment variables
        env::set_var("DATABASE_URL", "postgres://test");

        let config = Config::from_env();

        assert_eq!(config.database_url, "postgres://test");
        assert_eq!(config.server_port, 8080);
        assert_eq!(config.server_host, "127.0.0.1");
        assert_eq!(config.cleanup_delay_secs, 60);
        assert_eq!(config.utc_offset_hours, -3);
        assert_eq!(config.local_offset().local_minus_utc(), -3 * 3600);

        // Test custom values
        env::set_var("SERVER_PORT", "3000");
        env::set_var("SERVER_HOST", "0.0.0.0");
        env::set_var("CLEANUP_DELAY_SECS", "120");

        let config = Config::from_env();

        assert_eq!(config.server_port, 3000);
        assert_eq!(config.server_host, "0.0.0.0");
        assert_eq!(config.cleanup_delay_secs, 120);
    }
}
