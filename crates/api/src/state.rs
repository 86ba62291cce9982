use std::sync::Arc;

use marketgate_db::Store;
use marketgate_gateways::{PaymentGateway, SmsGateway};

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: every field is behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Users, phone challenges, and purchases.
    pub store: Arc<dyn Store>,
    pub config: Arc<ServerConfig>,
    /// Delivers one-time codes.
    pub sms: Arc<dyn SmsGateway>,
    /// Opens hosted payment sessions and verifies callbacks.
    pub payments: Arc<dyn PaymentGateway>,
}
