//! Member invitations

use cbo_core::{AuditAction, AuditLogEntry, DomainError, EmailMessage, MemberRole, Permissions};
use serde_json::json;
use tracing::{info, instrument};

use crate::dto::{InvitationRequest, InvitationResponse};

use super::context::ServiceContext;
use super::error::{ServiceError, ServiceResult};
use super::recovery::portal_link;
use super::session::SessionContext;

/// Invitation service
pub struct InvitationService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> InvitationService<'a> {
    /// Create a new InvitationService
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Email a signup link to a prospective member.
    ///
    /// The suggested role is informational; roles are only granted through
    /// [`super::role::RoleService::assign_role`] once the member has signed up.
    #[instrument(skip(self, session, request), fields(actor_id = %session.user_id()))]
    pub async fn invite(
        &self,
        session: &SessionContext,
        request: InvitationRequest,
    ) -> ServiceResult<InvitationResponse> {
        session.require(Permissions::MANAGE_MEMBERS)?;

        let role = match request.role.as_deref() {
            Some(raw) => Some(raw.parse::<MemberRole>().map_err(DomainError::from)?),
            None => None,
        };
        let email = request.email.trim().to_ascii_lowercase();
        let full_name = request.full_name.trim().to_string();
        let mailer = self.ctx.mailer()?;

        let link = portal_link(&self.ctx.portal().base_url, "signup", &[("email", email.as_str())])?;
        let role_line = role
            .map(|r| format!(" as {}", r.display_name()))
            .unwrap_or_default();

        let message = EmailMessage {
            to: email.clone(),
            subject: "You're invited to join the member portal".to_string(),
            html: format!(
                "<p>Hello {full_name},</p>\
                 <p>You have been invited to join the member portal{role_line}. \
                 <a href=\"{link}\">Create your account</a> to view your contributions and pay online.</p>"
            ),
            text: format!(
                "Hello {full_name},\n\nYou have been invited to join the member portal{role_line}.\n\
                 Create your account: {link}\n"
            ),
        };
        mailer
            .send(&message)
            .await
            .map_err(|e| ServiceError::external(e.to_string()))?;

        let audit = AuditLogEntry::new(
            self.ctx.generate_id(),
            AuditAction::MemberInvited,
            format!("Invited {full_name} to the portal"),
        )
        .actor(session.user_id())
        .target("email", &email)
        .metadata(json!({
            "full_name": full_name,
            "suggested_role": role.map(|r| r.as_str()),
        }));
        self.ctx.audit_repo().append(&audit).await?;

        info!(role = ?role, "Member invited");

        Ok(InvitationResponse {
            email,
            role: role.map(|r| r.as_str().to_string()),
            sent: true,
        })
    }
}
