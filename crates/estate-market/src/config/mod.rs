use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }

    pub fn is_production(self) -> bool {
        matches!(self, Self::Production)
    }
}

const DEV_JWT_SECRET: &str = "estate-market-development-secret";
const DEV_PAYSTACK_SECRET: &str = "sk_test_development";
const DEFAULT_SITE_NAME: &str = "Real Estate Market Place";
const DEFAULT_FROM_EMAIL: &str = "Real Estate <noreply@example.com>";
const DEFAULT_CONTACT_EMAIL: &str = "contact@example.com";

/// Top-level configuration for the marketplace service.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub auth: AuthConfig,
    pub paystack: PaystackConfig,
    pub mail: MailConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(&var_or("APP_ENV", "development"));

        let host = var_or("APP_HOST", "127.0.0.1");
        let port = var_or("APP_PORT", "3000")
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = var_or("APP_LOG_LEVEL", "info");

        let jwt_secret = secret(environment, "APP_JWT_SECRET", DEV_JWT_SECRET)?;
        let token_ttl_hours = var_or("APP_TOKEN_TTL_HOURS", "24")
            .parse::<i64>()
            .ok()
            .filter(|hours| *hours > 0)
            .ok_or(ConfigError::InvalidNumber {
                key: "APP_TOKEN_TTL_HOURS",
            })?;

        let paystack_secret = secret(environment, "PAYSTACK_SECRET_KEY", DEV_PAYSTACK_SECRET)?;
        let timeout_secs = var_or("PAYSTACK_TIMEOUT", "15")
            .parse::<u64>()
            .map_err(|_| ConfigError::InvalidNumber {
                key: "PAYSTACK_TIMEOUT",
            })?;

        let site_name = var_or("SITE_NAME", DEFAULT_SITE_NAME);
        let site_url = var_or("SITE_URL", "http://localhost:3000");
        let subject_prefix =
            env::var("EMAIL_SUBJECT_PREFIX").unwrap_or_else(|_| format!("[{site_name}] "));
        let callback_url = env::var("PAYSTACK_CALLBACK_URL").unwrap_or_else(|_| {
            format!(
                "{}/api/v1/subscriptions/verify",
                site_url.trim_end_matches('/')
            )
        });

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            auth: AuthConfig {
                jwt_secret,
                token_ttl_hours,
            },
            paystack: PaystackConfig {
                secret_key: paystack_secret,
                base_url: var_or("PAYSTACK_BASE_URL", "https://api.paystack.co"),
                timeout: Duration::from_secs(timeout_secs),
                callback_url,
            },
            mail: MailConfig {
                site_name,
                site_url,
                from_address: var_or("DEFAULT_FROM_EMAIL", DEFAULT_FROM_EMAIL),
                contact_address: var_or("CONTACT_EMAIL", DEFAULT_CONTACT_EMAIL),
                subject_prefix,
            },
        })
    }
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn secret(
    environment: AppEnvironment,
    key: &'static str,
    development_default: &str,
) -> Result<String, ConfigError> {
    match env::var(key) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ if environment.is_production() => Err(ConfigError::MissingSecret { key }),
        _ => Ok(development_default.to_string()),
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Bearer token signing.
#[derive(Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"<redacted>")
            .field("token_ttl_hours", &self.token_ttl_hours)
            .finish()
    }
}

/// Paystack credentials and HTTP client settings.
#[derive(Clone)]
pub struct PaystackConfig {
    pub secret_key: String,
    pub base_url: String,
    pub timeout: Duration,
    pub callback_url: String,
}

impl fmt::Debug for PaystackConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PaystackConfig")
            .field("secret_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("callback_url", &self.callback_url)
            .finish()
    }
}

/// Outbound e-mail identity and site links embedded in messages.
#[derive(Debug, Clone)]
pub struct MailConfig {
    pub site_name: String,
    pub site_url: String,
    pub from_address: String,
    pub contact_address: String,
    pub subject_prefix: String,
}

impl MailConfig {
    pub fn subject(&self, subject: &str) -> String {
        format!("{}{}", self.subject_prefix, subject)
    }

    pub fn link(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.site_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            site_name: DEFAULT_SITE_NAME.to_string(),
            site_url: "http://localhost:3000".to_string(),
            from_address: DEFAULT_FROM_EMAIL.to_string(),
            contact_address: DEFAULT_CONTACT_EMAIL.to_string(),
            subject_prefix: format!("[{DEFAULT_SITE_NAME}] "),
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidNumber { key: &'static str },
    MissingSecret { key: &'static str },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidNumber { key } => {
                write!(f, "{key} must be a positive whole number")
            }
            ConfigError::MissingSecret { key } => {
                write!(f, "{key} must be set when APP_ENV=production")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidNumber { .. }
            | ConfigError::MissingSecret { .. } => None,
        }
    }
}
