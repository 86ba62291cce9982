//! Business operations shared by handlers and tests.
//!
//! - [`identity`] -- resolve a provider-confirmed identity to a local user.
//! - [`verification`] -- phone possession challenges.
//! - [`payments`] -- premium purchases and gateway callbacks.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use marketgate_core::error::CoreError;

pub mod identity;
pub mod payments;
pub mod verification;

/// Run an outbound gateway call under `limit`, folding both failure and
/// timeout into [`CoreError::UpstreamUnavailable`].
pub(crate) async fn call_upstream<T, E, F>(
    gateway: &'static str,
    limit: Duration,
    call: F,
) -> Result<T, CoreError>
where
    E: Display,
    F: Future<Output = Result<T, E>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(CoreError::UpstreamUnavailable(format!("{gateway}: {e}"))),
        Err(_) => Err(CoreError::UpstreamUnavailable(format!(
            "{gateway}: timed out after {}s",
            limit.as_secs()
        ))),
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! State builder for service unit tests.

    use std::sync::Arc;

    use marketgate_db::MemoryStore;
    use marketgate_gateways::fake::{FakePaymentGateway, RecordingSmsGateway};

    use crate::auth::assertion::ProviderSecrets;
    use crate::auth::jwt::JwtConfig;
    use crate::config::ServerConfig;
    use crate::state::AppState;

    pub const MERCHANT_KEY: &str = "test-merchant-key";
    pub const MERCHANT_SALT: &str = "test-merchant-salt";

    pub struct Harness {
        pub state: AppState,
        pub store: Arc<MemoryStore>,
        pub sms: Arc<RecordingSmsGateway>,
        pub payments: Arc<FakePaymentGateway>,
    }

    pub fn config() -> ServerConfig {
        ServerConfig {
            host: "127.0.0.1".into(),
            port: 0,
            cors_origins: vec![],
            request_timeout_secs: 30,
            upstream_timeout_secs: 2,
            production: false,
            default_country_code: "90".into(),
            jwt: JwtConfig {
                secret: "service-test-secret".into(),
                expiry_days: 30,
                using_fallback: false,
            },
            providers: ProviderSecrets {
                google: Some("google-secret".into()),
                clerk: Some("clerk-secret".into()),
            },
            sms: None,
            paytr: None,
        }
    }

    pub fn harness() -> Harness {
        let store = Arc::new(MemoryStore::new());
        let sms = Arc::new(RecordingSmsGateway::new());
        let payments = Arc::new(FakePaymentGateway::new(MERCHANT_KEY, MERCHANT_SALT));
        let state = AppState {
            store: store.clone(),
            config: Arc::new(config()),
            sms: sms.clone(),
            payments: payments.clone(),
        };
        Harness {
            state,
            store,
            sms,
            payments,
        }
    }
}
