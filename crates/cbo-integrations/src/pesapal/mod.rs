//! Pesapal API 3.0 (hosted checkout + IPN)

mod client;
mod ipn;

pub use client::{status_result, PesapalClient, TransactionStatusResponse};
pub use ipn::{IpnAck, IpnNotification};
