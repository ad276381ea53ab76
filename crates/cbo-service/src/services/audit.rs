//! Audit log service

use cbo_core::{Permissions, Snowflake};
use tracing::instrument;

use crate::dto::{AuditLogQuery, AuditLogResponse, PaginatedResponse};

use super::context::ServiceContext;
use super::error::{ServiceError, ServiceResult};
use super::session::SessionContext;

/// Default page size
const DEFAULT_LIMIT: i64 = 50;
/// Maximum page size
const MAX_LIMIT: i64 = 100;

/// Audit log service
pub struct AuditService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> AuditService<'a> {
    /// Create a new AuditService
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Entries newest first, paged with a `before` cursor
    #[instrument(skip(self, session))]
    pub async fn list(
        &self,
        session: &SessionContext,
        query: AuditLogQuery,
    ) -> ServiceResult<PaginatedResponse<AuditLogResponse>> {
        session.require(Permissions::VIEW_AUDIT_LOG)?;

        let before = query
            .before
            .as_deref()
            .map(|s| {
                s.parse::<Snowflake>()
                    .map_err(|_| ServiceError::validation("Invalid before cursor"))
            })
            .transpose()?;
        let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);

        // One extra row tells us whether another page exists
        let mut entries = self.ctx.audit_repo().list(before, limit + 1).await?;
        let has_more = entries.len() as i64 > limit;
        entries.truncate(limit as usize);

        let next = if has_more {
            entries.last().map(|e| e.id.to_string())
        } else {
            None
        };
        let data = entries.into_iter().map(AuditLogResponse::from).collect();

        Ok(PaginatedResponse::new(data, next, has_more, limit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TestHarness;
    use cbo_core::{AuditAction, AuditLogEntry, MemberRole};

    fn seed(h: &TestHarness, count: usize) {
        for i in 0..count {
            let entry = AuditLogEntry::new(
                h.ctx.generate_id(),
                AuditAction::ProfileUpdated,
                format!("entry {i}"),
            );
            h.store.append_audit(entry);
        }
    }

    #[tokio::test]
    async fn test_pages_newest_first() {
        let h = TestHarness::new();
        seed(&h, 5);
        let admin = h.session(Snowflake::new(1), &[MemberRole::Admin]);
        let service = AuditService::new(&h.ctx);

        let first = service
            .list(&admin, AuditLogQuery { before: None, limit: Some(3) })
            .await
            .unwrap();
        assert_eq!(first.data.len(), 3);
        assert!(first.pagination.has_more);
        assert_eq!(first.data[0].description, "entry 4");

        let second = service
            .list(
                &admin,
                AuditLogQuery {
                    before: first.pagination.before.clone(),
                    limit: Some(3),
                },
            )
            .await
            .unwrap();
        assert_eq!(second.data.len(), 2);
        assert!(!second.pagination.has_more);
        assert_eq!(second.data[1].description, "entry 0");
    }

    #[tokio::test]
    async fn test_requires_audit_permission() {
        let h = TestHarness::new();
        let treasurer = h.session(Snowflake::new(2), &[MemberRole::Treasurer]);
        let err = AuditService::new(&h.ctx)
            .list(&treasurer, AuditLogQuery { before: None, limit: None })
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 403);
    }

    #[tokio::test]
    async fn test_rejects_bad_cursor() {
        let h = TestHarness::new();
        let chair = h.session(Snowflake::new(5), &[MemberRole::Chairperson]);
        let err = AuditService::new(&h.ctx)
            .list(
                &chair,
                AuditLogQuery {
                    before: Some("yesterday".into()),
                    limit: None,
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 400);
    }
}
