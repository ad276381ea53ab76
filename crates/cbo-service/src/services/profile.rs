//! Profile service

use cbo_core::{AuditAction, AuditLogEntry, DomainError, PhoneNumber, Profile};
use chrono::Utc;
use serde_json::json;
use tracing::{info, instrument};

use crate::dto::{ProfileResponse, UpsertProfileRequest};

use super::context::ServiceContext;
use super::error::{ServiceError, ServiceResult};
use super::session::SessionContext;

/// Profile service
pub struct ProfileService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> ProfileService<'a> {
    /// Create a new ProfileService
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// The caller's profile
    #[instrument(skip(self, session))]
    pub async fn get_own_profile(&self, session: &SessionContext) -> ServiceResult<ProfileResponse> {
        let profile = self
            .ctx
            .profile_repo()
            .find_by_user_id(session.user_id())
            .await?
            .ok_or(DomainError::ProfileNotFound(session.user_id()))?;
        Ok(ProfileResponse::from(&profile))
    }

    /// Create or update the caller's profile.
    ///
    /// Omitted fields keep their stored value. A changed phone number loses its verification.
    #[instrument(skip(self, session, request), fields(user_id = %session.user_id()))]
    pub async fn upsert_own_profile(
        &self,
        session: &SessionContext,
        request: UpsertProfileRequest,
    ) -> ServiceResult<ProfileResponse> {
        let existing = self
            .ctx
            .profile_repo()
            .find_by_user_id(session.user_id())
            .await?;
        let created = existing.is_none();

        let requested_email = request
            .email
            .as_deref()
            .map(|e| e.trim().to_ascii_lowercase())
            .filter(|e| !e.is_empty());

        let mut profile = match existing {
            Some(profile) => profile,
            None => {
                let email = requested_email
                    .clone()
                    .or_else(|| session.email().map(str::to_ascii_lowercase))
                    .ok_or_else(|| ServiceError::validation("Email is required"))?;
                Profile::new(session.user_id(), email)
            }
        };

        let mut changed = Vec::new();
        if let Some(email) = requested_email {
            if email != profile.email {
                profile.email = email;
                profile.email_confirmed_at = None;
                changed.push("email");
            }
        }
        if let Some(full_name) = request.full_name {
            profile.full_name = Some(full_name.trim().to_string());
            changed.push("full_name");
        }
        if let Some(raw) = request.phone.as_deref() {
            let phone = PhoneNumber::normalize(raw, &self.ctx.portal().default_country_code)
                .map_err(DomainError::from)?;
            profile.set_phone(phone);
            changed.push("phone");
        }
        if let Some(id_number) = request.id_number {
            profile.id_number = Some(id_number.trim().to_string());
            changed.push("id_number");
        }

        let session_email_matches = session
            .email()
            .is_some_and(|e| e.eq_ignore_ascii_case(&profile.email));
        if profile.email_confirmed_at.is_none() && session.email_verified() && session_email_matches
        {
            profile.email_confirmed_at = Some(Utc::now());
        }
        profile.updated_at = Utc::now();

        self.ctx.profile_repo().upsert(&profile).await?;

        let audit = AuditLogEntry::new(
            self.ctx.generate_id(),
            AuditAction::ProfileUpdated,
            if created {
                "Created profile".to_string()
            } else {
                "Updated profile".to_string()
            },
        )
        .actor(session.user_id())
        .target("member", session.user_id())
        .metadata(json!({
            "created": created,
            "fields": changed,
            "complete": profile.is_complete(),
        }));
        self.ctx.audit_repo().append(&audit).await?;

        info!(created, complete = profile.is_complete(), "Profile saved");

        Ok(ProfileResponse::from(&profile))
    }
}
