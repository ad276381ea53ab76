//! PostgreSQL implementation of RoleAssignmentRepository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::instrument;

use cbo_core::entities::{AuditLogEntry, RoleAssignment};
use cbo_core::error::DomainError;
use cbo_core::traits::{RepoResult, RoleAssignmentRepository};
use cbo_core::value_objects::{MemberRole, Snowflake};

use crate::models::RoleAssignmentModel;

use super::audit_log::insert_audit;
use super::error::{map_db_error, map_unique_violation};

/// PostgreSQL implementation of RoleAssignmentRepository
#[derive(Clone)]
pub struct PgRoleAssignmentRepository {
    pool: PgPool,
}

impl PgRoleAssignmentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RoleAssignmentRepository for PgRoleAssignmentRepository {
    #[instrument(skip(self))]
    async fn find_active_by_user(&self, user_id: Snowflake) -> RepoResult<Vec<RoleAssignment>> {
        let rows = sqlx::query_as::<_, RoleAssignmentModel>(
            r"
            SELECT id, user_id, role, assigned_by, assigned_at, superseded_at
            FROM role_assignments
            WHERE user_id = $1 AND superseded_at IS NULL
            ORDER BY assigned_at
            ",
        )
        .bind(user_id.into_inner())
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        rows.into_iter().map(RoleAssignment::try_from).collect()
    }

    #[instrument(skip(self))]
    async fn find_active(
        &self,
        user_id: Snowflake,
        role: MemberRole,
    ) -> RepoResult<Option<RoleAssignment>> {
        let row = sqlx::query_as::<_, RoleAssignmentModel>(
            r"
            SELECT id, user_id, role, assigned_by, assigned_at, superseded_at
            FROM role_assignments
            WHERE user_id = $1 AND role = $2 AND superseded_at IS NULL
            ",
        )
        .bind(user_id.into_inner())
        .bind(role.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        row.map(RoleAssignment::try_from).transpose()
    }

    #[instrument(skip(self, assignment, audit), fields(user_id = %assignment.user_id, role = %assignment.role))]
    async fn create(&self, assignment: &RoleAssignment, audit: &AuditLogEntry) -> RepoResult<()> {
        let mut tx = self.pool.begin().await.map_err(map_db_error)?;

        sqlx::query(
            r"
            INSERT INTO role_assignments (id, user_id, role, assigned_by, assigned_at, superseded_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ",
        )
        .bind(assignment.id.into_inner())
        .bind(assignment.user_id.into_inner())
        .bind(assignment.role.as_str())
        .bind(assignment.assigned_by.map(Snowflake::into_inner))
        .bind(assignment.assigned_at)
        .bind(assignment.superseded_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_unique_violation(e, || DomainError::RoleAlreadyAssigned(assignment.role)))?;

        insert_audit(&mut *tx, audit).await?;
        tx.commit().await.map_err(map_db_error)?;

        Ok(())
    }

    #[instrument(skip(self, audit))]
    async fn supersede(
        &self,
        assignment_id: Snowflake,
        at: DateTime<Utc>,
        audit: &AuditLogEntry,
    ) -> RepoResult<bool> {
        let mut tx = self.pool.begin().await.map_err(map_db_error)?;

        let result = sqlx::query(
            r"
            UPDATE role_assignments
            SET superseded_at = $2
            WHERE id = $1 AND superseded_at IS NULL
            ",
        )
        .bind(assignment_id.into_inner())
        .bind(at)
        .execute(&mut *tx)
        .await
        .map_err(map_db_error)?;

        if result.rows_affected() == 0 {
            tx.rollback().await.map_err(map_db_error)?;
            return Ok(false);
        }

        insert_audit(&mut *tx, audit).await?;
        tx.commit().await.map_err(map_db_error)?;

        Ok(true)
    }
}
