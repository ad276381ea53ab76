//! CAPTCHA-gated account recovery
//!
//! The response never reveals whether an account exists for the submitted email.

use cbo_core::EmailMessage;
use tracing::{error, info, instrument, warn};
use url::Url;

use crate::dto::{RecoveryRequest, RecoveryResponse};

use super::context::ServiceContext;
use super::error::{ServiceError, ServiceResult};

/// Recovery service
pub struct RecoveryService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> RecoveryService<'a> {
    /// Create a new RecoveryService
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Verify the CAPTCHA, then email a recovery link if the address belongs to a member
    #[instrument(skip(self, request, remote_ip))]
    pub async fn request_recovery(
        &self,
        request: RecoveryRequest,
        remote_ip: Option<&str>,
    ) -> ServiceResult<RecoveryResponse> {
        let captcha = self.ctx.captcha()?;
        let mailer = self.ctx.mailer()?;

        let passed = captcha
            .verify(&request.captcha_token, remote_ip)
            .await
            .map_err(|e| ServiceError::external(e.to_string()))?;
        if !passed {
            warn!("Recovery request failed CAPTCHA");
            return Err(ServiceError::CaptchaFailed);
        }

        let email = request.email.trim().to_ascii_lowercase();
        let Some(profile) = self.ctx.profile_repo().find_by_email(&email).await? else {
            info!("Recovery requested for unknown email");
            return Ok(RecoveryResponse::accepted());
        };

        let token = self
            .ctx
            .jwt_service()
            .issue_recovery_token(profile.user_id, &profile.email)?;
        let link = recovery_link(&self.ctx.portal().base_url, &token)?;
        let minutes = self.ctx.jwt_service().recovery_token_expiry() / 60;

        let message = EmailMessage {
            to: profile.email.clone(),
            subject: "Reset your password".to_string(),
            html: format!(
                "<p>Hello {name},</p>\
                 <p>We received a request to reset your password. \
                 <a href=\"{link}\">Choose a new password</a>. \
                 The link expires in {minutes} minutes.</p>\
                 <p>If you did not ask for this, ignore this email.</p>",
                name = profile.display_name(),
            ),
            text: format!(
                "Hello {name},\n\nReset your password here: {link}\n\
                 The link expires in {minutes} minutes. If you did not ask for this, ignore this email.\n",
                name = profile.display_name(),
            ),
        };

        // Failures stay server-side so the response does not reveal that the account exists
        match mailer.send(&message).await {
            Ok(()) => info!(user_id = %profile.user_id, "Recovery email sent"),
            Err(e) => error!(user_id = %profile.user_id, error = %e, "Failed to send recovery email"),
        }

        Ok(RecoveryResponse::accepted())
    }
}

/// `{base_url}/reset-password?token=...`
pub(crate) fn recovery_link(base_url: &str, token: &str) -> ServiceResult<String> {
    portal_link(base_url, "reset-password", &[("token", token)])
}

/// Absolute portal URL for `path` with query parameters
pub(crate) fn portal_link(base_url: &str, path: &str, query: &[(&str, &str)]) -> ServiceResult<String> {
    let base = if base_url.ends_with('/') {
        Url::parse(base_url)
    } else {
        Url::parse(&format!("{base_url}/"))
    }
    .map_err(|e| ServiceError::internal(format!("Invalid portal base URL: {e}")))?;

    let mut url = base
        .join(path)
        .map_err(|e| ServiceError::internal(format!("Invalid portal path: {e}")))?;
    url.query_pairs_mut().extend_pairs(query);
    Ok(url.into())
}
