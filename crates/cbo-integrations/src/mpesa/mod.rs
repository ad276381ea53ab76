//! Safaricom Daraja (M-Pesa Express / STK push)

mod callback;
mod client;

pub use callback::{CallbackItem, CallbackMetadata, MpesaAck, StkCallback, StkCallbackBody, StkCallbackEnvelope};
pub use client::{stk_password, stk_timestamp, MpesaClient};
