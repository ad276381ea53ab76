//! # cbo-integrations
//!
//! Thin adapters to the remote services the portal depends on. Every client implements one of
//! the provider traits from `cbo-core`, so services never see HTTP.
//!
//! | Module | Provider | Trait |
//! |---|---|---|
//! | [`mpesa`] | Safaricom Daraja STK push | `PaymentGateway` |
//! | [`pesapal`] | Pesapal v3 hosted checkout | `PaymentGateway` |
//! | [`sms`] | Twilio Verify | `SmsVerifier` |
//! | [`captcha`] | hCaptcha-compatible siteverify | `CaptchaVerifier` |
//! | [`email`] | Resend-compatible transactional email | `Mailer` |
//!
//! [`webhook_auth`] holds the constant-time checks used before any callback payload is trusted.

pub mod captcha;
pub mod email;
pub mod error;
mod http;
pub mod mpesa;
pub mod pesapal;
pub mod sms;
pub mod webhook_auth;

pub use captcha::CaptchaClient;
pub use email::ResendMailer;
pub use error::{IntegrationError, IntegrationResult};
pub use mpesa::{MpesaAck, MpesaClient, StkCallbackEnvelope};
pub use pesapal::{IpnAck, IpnNotification, PesapalClient};
pub use sms::TwilioVerifyClient;
pub use webhook_auth::{sign, tokens_match, verify_signature};
