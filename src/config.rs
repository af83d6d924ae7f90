use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    /// Base URL embedded into tracking pixel links.
    pub api_base_url: String,
    /// Base URL embedded into unsubscribe links.
    pub app_base_url: String,
}

impl Config {
    pub fn from_env() -> Self {
        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://sendora.db".into());
        let port: u16 = env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(3030);
        let api_base_url =
            env::var("API_BASE_URL").unwrap_or_else(|_| format!("http://localhost:{}", port));
        let app_base_url = env::var("APP_BASE_URL").unwrap_or_else(|_| api_base_url.clone());

        Config {
            database_url,
            port,
            api_base_url,
            app_base_url,
        }
    }
}
