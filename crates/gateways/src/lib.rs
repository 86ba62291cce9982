//! Clients for the external collaborators: the SMS messaging gateway and the
//! hosted-payment-page gateway.
//!
//! Each collaborator sits behind a trait so the API can swap the HTTP client
//! for an in-process double (see [`fake`]) in tests and local development.

pub mod fake;
pub mod paytr;
pub mod sms;

pub use paytr::{PaymentGateway, PaymentGatewayError, PaymentSession, PaytrConfig, PaytrGateway};
pub use sms::{HttpSmsGateway, LogSmsGateway, SmsConfig, SmsError, SmsGateway, SmsReceipt};
