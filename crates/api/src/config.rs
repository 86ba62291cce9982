use std::time::Duration;

use marketgate_core::phone::DEFAULT_COUNTRY_CODE;
use marketgate_gateways::paytr::DEFAULT_API_URL;
use marketgate_gateways::{PaytrConfig, SmsConfig};

use crate::auth::assertion::ProviderSecrets;
use crate::auth::jwt::JwtConfig;

/// Server configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development. In production,
/// override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS`.
    pub cors_origins: Vec<String>,
    /// Inbound request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Outbound gateway call timeout in seconds (default: `5`).
    pub upstream_timeout_secs: u64,
    /// `APP_ENV=production`.
    pub production: bool,
    /// Country calling code prepended to national phone numbers (default: `90`).
    pub default_country_code: String,
    pub jwt: JwtConfig,
    pub providers: ProviderSecrets,
    /// `None` when `SMS_API_URL` is unset; codes are then only logged.
    pub sms: Option<SmsConfig>,
    /// `None` when PayTR merchant credentials are unset.
    pub paytr: Option<PaytrConfig>,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                 | Default                 |
    /// |-------------------------|-------------------------|
    /// | `HOST`                  | `0.0.0.0`               |
    /// | `PORT`                  | `3000`                  |
    /// | `CORS_ORIGINS`          | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS`  | `30`                    |
    /// | `UPSTREAM_TIMEOUT_SECS` | `5`                     |
    /// | `APP_ENV`               | `development`           |
    /// | `DEFAULT_COUNTRY_CODE`  | `90`                    |
    /// | `SMS_API_URL`           | unset (log-only SMS)    |
    /// | `SMS_API_KEY`           | empty                   |
    /// | `SMS_SENDER`            | `MARKETGATE`            |
    /// | `PAYTR_MERCHANT_ID`     | unset (fake payments)   |
    /// | `PAYTR_MERCHANT_KEY`    | unset                   |
    /// | `PAYTR_MERCHANT_SALT`   | unset                   |
    /// | `PAYTR_TEST_MODE`       | `true`                  |
    /// | `PAYTR_OK_URL`          | `http://localhost:5173/payment/success` |
    /// | `PAYTR_FAIL_URL`        | `http://localhost:5173/payment/fail`    |
    /// | `PAYTR_API_URL`         | PayTR get-token endpoint |
    ///
    /// JWT and identity-provider variables are documented on
    /// [`JwtConfig::from_env`] and [`ProviderSecrets::from_env`].
    ///
    /// # Panics
    ///
    /// Panics if a numeric variable does not parse.
    pub fn from_env() -> Self {
        let host = env_or("HOST", "0.0.0.0");

        let port: u16 = env_or("PORT", "3000")
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = env_or("CORS_ORIGINS", "http://localhost:5173")
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = env_or("REQUEST_TIMEOUT_SECS", "30")
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let upstream_timeout_secs: u64 = env_or("UPSTREAM_TIMEOUT_SECS", "5")
            .parse()
            .expect("UPSTREAM_TIMEOUT_SECS must be a valid u64");

        let production = env_or("APP_ENV", "development").eq_ignore_ascii_case("production");

        let default_country_code = env_or("DEFAULT_COUNTRY_CODE", DEFAULT_COUNTRY_CODE)
            .trim_start_matches('+')
            .to_string();

        let upstream_timeout = Duration::from_secs(upstream_timeout_secs);

        let sms = std::env::var("SMS_API_URL")
            .ok()
            .filter(|s| !s.is_empty())
            .map(|api_url| SmsConfig {
                api_url,
                api_key: env_or("SMS_API_KEY", ""),
                sender: env_or("SMS_SENDER", "MARKETGATE"),
                timeout: upstream_timeout,
            });

        let paytr = match (
            std::env::var("PAYTR_MERCHANT_ID"),
            std::env::var("PAYTR_MERCHANT_KEY"),
            std::env::var("PAYTR_MERCHANT_SALT"),
        ) {
            (Ok(merchant_id), Ok(merchant_key), Ok(merchant_salt)) => Some(PaytrConfig {
                merchant_id,
                merchant_key,
                merchant_salt,
                test_mode: parse_flag(&env_or("PAYTR_TEST_MODE", "true")),
                ok_url: env_or("PAYTR_OK_URL", "http://localhost:5173/payment/success"),
                fail_url: env_or("PAYTR_FAIL_URL", "http://localhost:5173/payment/fail"),
                api_url: env_or("PAYTR_API_URL", DEFAULT_API_URL),
                timeout: upstream_timeout,
            }),
            _ => None,
        };

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            upstream_timeout_secs,
            production,
            default_country_code,
            jwt: JwtConfig::from_env(production),
            providers: ProviderSecrets::from_env(),
            sms,
            paytr,
        }
    }

    /// Upper bound on any single outbound gateway call.
    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_timeout_secs)
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.into())
}

/// `1`, `true`, `yes`, `on` (any case) are true; everything else is false.
fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
