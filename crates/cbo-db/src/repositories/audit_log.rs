//! PostgreSQL implementation of AuditLogRepository

use async_trait::async_trait;
use sqlx::{PgExecutor, PgPool};
use tracing::instrument;

use cbo_core::entities::AuditLogEntry;
use cbo_core::traits::{AuditLogRepository, RepoResult};
use cbo_core::value_objects::Snowflake;

use crate::mappers::AuditLogInsert;
use crate::models::AuditLogModel;

use super::error::map_db_error;

/// Insert one audit entry on any executor, so other repositories can append
/// inside their own transaction
pub(crate) async fn insert_audit<'e, E>(executor: E, entry: &AuditLogEntry) -> RepoResult<()>
where
    E: PgExecutor<'e>,
{
    let row = AuditLogInsert::new(entry);
    sqlx::query(
        r"
        INSERT INTO audit_logs (id, action, description, actor_id, target_type, target_id, metadata, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        ",
    )
    .bind(row.id)
    .bind(row.action)
    .bind(row.description)
    .bind(row.actor_id)
    .bind(row.target_type)
    .bind(row.target_id)
    .bind(row.metadata)
    .bind(row.created_at)
    .execute(executor)
    .await
    .map_err(map_db_error)?;

    Ok(())
}

/// PostgreSQL implementation of AuditLogRepository
#[derive(Clone)]
pub struct PgAuditLogRepository {
    pool: PgPool,
}

impl PgAuditLogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditLogRepository for PgAuditLogRepository {
    #[instrument(skip(self, entry), fields(action = %entry.action))]
    async fn append(&self, entry: &AuditLogEntry) -> RepoResult<()> {
        insert_audit(&self.pool, entry).await
    }

    #[instrument(skip(self))]
    async fn list(&self, before: Option<Snowflake>, limit: i64) -> RepoResult<Vec<AuditLogEntry>> {
        let rows = sqlx::query_as::<_, AuditLogModel>(
            r"
            SELECT id, action, description, actor_id, target_type, target_id, metadata, created_at
            FROM audit_logs
            WHERE ($1::BIGINT IS NULL OR id < $1)
            ORDER BY id DESC
            LIMIT $2
            ",
        )
        .bind(before.map(Snowflake::into_inner))
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        rows.into_iter().map(AuditLogEntry::try_from).collect()
    }
}
