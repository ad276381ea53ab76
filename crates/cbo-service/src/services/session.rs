//! Session context and status
//!
//! A [`SessionContext`] is built once per request from the bearer token and handed to every
//! service call. Nothing in this crate reads session state from anywhere else; signing out is
//! the client discarding its token.

use cbo_core::{
    guard, MemberRole, Permissions, RoleSet, SessionSignals, SessionStatus, Snowflake,
};
use tracing::{debug, instrument, warn};

use crate::dto::{GuardResponse, PermissionsResponse, SessionResponse};

use super::context::ServiceContext;
use super::error::{ServiceError, ServiceResult};
use super::permission::PermissionService;

/// The caller of one request
#[derive(Debug, Clone)]
pub struct SessionContext {
    user_id: Snowflake,
    email: Option<String>,
    email_verified: bool,
    roles: RoleSet,
    permissions: Permissions,
    status: SessionStatus,
}

impl SessionContext {
    pub fn new(
        user_id: Snowflake,
        email: Option<String>,
        email_verified: bool,
        roles: RoleSet,
        status: SessionStatus,
    ) -> Self {
        let permissions = roles.permissions();
        Self {
            user_id,
            email,
            email_verified,
            roles,
            permissions,
            status,
        }
    }

    #[inline]
    pub fn user_id(&self) -> Snowflake {
        self.user_id
    }

    /// Email from the session token
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    /// Whether the auth provider confirmed [`Self::email`]
    pub fn email_verified(&self) -> bool {
        self.email_verified
    }

    pub fn roles(&self) -> &RoleSet {
        &self.roles
    }

    pub fn permissions(&self) -> Permissions {
        self.permissions
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn has(&self, permission: Permissions) -> bool {
        self.permissions.contains(permission)
    }

    pub fn holds_role(&self, role: MemberRole) -> bool {
        self.roles.contains(role)
    }

    /// Fail with `MISSING_PERMISSIONS` unless every flag in `permission` is granted
    pub fn require(&self, permission: Permissions) -> ServiceResult<()> {
        if self.has(permission) {
            return Ok(());
        }
        let missing = (permission - self.permissions).keys().join(", ");
        warn!(user_id = %self.user_id, missing = %missing, "Permission denied");
        Err(ServiceError::permission_denied(missing))
    }

    /// Access to `member_id`'s own records, or anyone's with `permission`
    pub fn require_self_or(&self, member_id: Snowflake, permission: Permissions) -> ServiceResult<()> {
        if member_id == self.user_id {
            return Ok(());
        }
        self.require(permission)
    }

    pub fn to_response(&self) -> SessionResponse {
        SessionResponse {
            user_id: self.user_id.to_string(),
            status: self.status.as_str().to_string(),
            roles: self.roles.iter().map(|r| r.as_str().to_string()).collect(),
            permissions: self.permissions.keys(),
        }
    }

    pub fn to_permissions_response(&self) -> PermissionsResponse {
        PermissionsResponse {
            user_id: self.user_id.to_string(),
            roles: self.roles.iter().map(|r| r.as_str().to_string()).collect(),
            permissions: self.permissions.keys(),
        }
    }
}

/// Session service
pub struct SessionService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> SessionService<'a> {
    /// Create a new SessionService
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Build the session for an authenticated identity
    #[instrument(skip(self, email))]
    pub async fn load(
        &self,
        user_id: Snowflake,
        email: Option<String>,
        email_verified: bool,
    ) -> ServiceResult<SessionContext> {
        let roles = PermissionService::new(self.ctx).roles_for(user_id).await?;
        let signals = self.signals(user_id, email_verified).await?;
        let status = SessionStatus::evaluate(Some(signals));

        debug!(user_id = %user_id, status = status.as_str(), "Session loaded");

        Ok(SessionContext::new(
            user_id,
            email,
            email_verified,
            roles,
            status,
        ))
    }

    /// Signals for a signed-in identity, read from its profile
    #[instrument(skip(self))]
    pub async fn signals(
        &self,
        user_id: Snowflake,
        email_verified: bool,
    ) -> ServiceResult<SessionSignals> {
        let profile = self.ctx.profile_repo().find_by_user_id(user_id).await?;
        Ok(SessionSignals {
            has_session: true,
            email_confirmed: email_verified
                || profile.as_ref().is_some_and(|p| p.is_email_confirmed()),
            profile_complete: profile.as_ref().is_some_and(|p| p.is_complete()),
        })
    }

    /// Session status and permissions
    pub fn status(&self, session: &SessionContext) -> SessionResponse {
        session.to_response()
    }

    /// Where the portal should send this session for `path`
    pub fn guard(&self, session: &SessionContext, path: &str) -> GuardResponse {
        GuardResponse {
            path: path.to_string(),
            status: session.status().as_str().to_string(),
            decision: guard(session.status(), session.permissions(), path),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TestHarness;
    use cbo_core::GuardDecision;

    #[tokio::test]
    async fn test_new_identity_needs_email_verification() {
        let h = TestHarness::new();
        let session = SessionService::new(&h.ctx)
            .load(Snowflake::new(200), Some("new@example.org".into()), false)
            .await
            .unwrap();
        assert_eq!(session.status(), SessionStatus::NeedsEmailVerification);
    }

    #[tokio::test]
    async fn test_verified_email_without_profile_needs_profile() {
        let h = TestHarness::new();
        let session = SessionService::new(&h.ctx)
            .load(Snowflake::new(201), Some("new@example.org".into()), true)
            .await
            .unwrap();
        assert_eq!(session.status(), SessionStatus::NeedsProfile);
    }

    #[tokio::test]
    async fn test_complete_profile_is_ready() {
        let h = TestHarness::new();
        let user = Snowflake::new(202);
        h.seed_profile(user, "ready@example.org");
        h.seed_role(user, MemberRole::Treasurer);

        let session = SessionService::new(&h.ctx)
            .load(user, None, false)
            .await
            .unwrap();
        assert!(session.status().is_ready());
        assert!(session.has(Permissions::APPROVE_PAYMENTS));
        assert!(session.holds_role(MemberRole::Treasurer));
    }

    #[tokio::test]
    async fn test_guard_hides_privileged_routes() {
        let h = TestHarness::new();
        let session = h.session(Snowflake::new(203), &[MemberRole::Member]);
        let response = SessionService::new(&h.ctx).guard(&session, "/admin");
        assert_eq!(
            response.decision,
            GuardDecision::Redirect {
                to: "/dashboard".into()
            }
        );
    }

    #[test]
    fn test_require_names_missing_permission() {
        let session = SessionContext::new(
            Snowflake::new(1),
            None,
            true,
            RoleSet::new().with(MemberRole::Secretary),
            SessionStatus::Ready,
        );
        let err = session.require(Permissions::MANAGE_PAYMENTS).unwrap_err();
        assert_eq!(err.status_code(), 403);
        assert!(err.to_string().contains("manage_payments"));
        assert!(session.require_self_or(Snowflake::new(1), Permissions::MANAGE_PAYMENTS).is_ok());
    }
}
