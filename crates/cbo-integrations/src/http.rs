//! Shared reqwest plumbing

use std::time::Duration;

use reqwest::{Client, Response};
use serde::de::DeserializeOwned;

use crate::error::{IntegrationError, IntegrationResult};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Longest provider error body kept in an error message
const MAX_ERROR_BODY: usize = 512;

pub(crate) fn build_client() -> IntegrationResult<Client> {
    Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .user_agent(concat!("cbo-portal/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(IntegrationError::Client)
}

pub(crate) fn transport(provider: &'static str) -> impl FnOnce(reqwest::Error) -> IntegrationError {
    move |source| IntegrationError::Http { provider, source }
}

/// Decode a JSON body, turning non-2xx statuses into [`IntegrationError::Rejected`]
pub(crate) async fn read_json<T: DeserializeOwned>(
    provider: &'static str,
    response: Response,
) -> IntegrationResult<T> {
    let status = response.status();
    if !status.is_success() {
        let mut message = response.text().await.unwrap_or_default();
        truncate(&mut message);
        return Err(IntegrationError::Rejected {
            provider,
            status: status.as_u16(),
            message,
        });
    }
    response
        .json::<T>()
        .await
        .map_err(|e| IntegrationError::invalid(provider, e.to_string()))
}

fn truncate(message: &mut String) {
    if message.len() > MAX_ERROR_BODY {
        let mut cut = MAX_ERROR_BODY;
        while !message.is_char_boundary(cut) {
            cut -= 1;
        }
        message.truncate(cut);
    }
}
