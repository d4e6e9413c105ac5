use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_APP_NAME: &str = "Shiftbook";
pub const DEFAULT_AUTH_COOKIE_NAME: &str = "shiftbook_session";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub addr: SocketAddr,
    pub app_name: String,
    pub auth: AuthConfig,
    pub login: LoginConfig,
    pub users_file: Option<PathBuf>,
    pub history_file: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub key: Option<String>,
    pub token_ttl: time::Duration,
    pub cookie_name: String,
    pub cookie_secure: bool,
}

#[derive(Debug, Clone)]
pub struct LoginConfig {
    /// Simulated round trip of the credential check.
    pub latency: Duration,
    pub timeout: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            app_name: DEFAULT_APP_NAME.to_string(),
            auth: AuthConfig::default(),
            login: LoginConfig::default(),
            users_file: None,
            history_file: None,
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            key: None,
            token_ttl: time::Duration::days(14),
            cookie_name: DEFAULT_AUTH_COOKIE_NAME.to_string(),
            cookie_secure: false,
        }
    }
}

impl Default for LoginConfig {
    fn default() -> Self {
        Self {
            latency: Duration::from_secs(1),
            timeout: Duration::from_secs(10),
        }
    }
}
