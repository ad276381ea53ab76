//! PostgreSQL implementation of ObligationRepository

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::PgPool;
use tracing::instrument;

use cbo_core::entities::{AuditLogEntry, ContributionObligation};
use cbo_core::traits::{ObligationRepository, ObligationTotals, RepoResult};
use cbo_core::value_objects::Snowflake;

use crate::mappers::ObligationInsert;
use crate::models::{ObligationModel, ObligationTotalsModel};

use super::audit_log::insert_audit;
use super::error::map_db_error;

/// PostgreSQL implementation of ObligationRepository
#[derive(Clone)]
pub struct PgObligationRepository {
    pool: PgPool,
}

impl PgObligationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ObligationRepository for PgObligationRepository {
    #[instrument(skip(self))]
    async fn find_by_id(&self, id: Snowflake) -> RepoResult<Option<ContributionObligation>> {
        let row = sqlx::query_as::<_, ObligationModel>(
            r"
            SELECT id, member_id, obligation_type, amount_cents, due_date, status, description,
                   event_ref, paid_at, payment_reference, created_by, created_at, updated_at
            FROM contribution_obligations
            WHERE id = $1
            ",
        )
        .bind(id.into_inner())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        row.map(ContributionObligation::try_from).transpose()
    }

    #[instrument(skip(self))]
    async fn find_by_member(
        &self,
        member_id: Snowflake,
    ) -> RepoResult<Vec<ContributionObligation>> {
        let rows = sqlx::query_as::<_, ObligationModel>(
            r"
            SELECT id, member_id, obligation_type, amount_cents, due_date, status, description,
                   event_ref, paid_at, payment_reference, created_by, created_at, updated_at
            FROM contribution_obligations
            WHERE member_id = $1
            ORDER BY due_date DESC, id DESC
            ",
        )
        .bind(member_id.into_inner())
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        rows.into_iter().map(ContributionObligation::try_from).collect()
    }

    #[instrument(skip(self, obligations, audit), fields(count = obligations.len()))]
    async fn create_many(
        &self,
        obligations: &[ContributionObligation],
        audit: &AuditLogEntry,
    ) -> RepoResult<()> {
        let mut tx = self.pool.begin().await.map_err(map_db_error)?;

        for obligation in obligations {
            let row = ObligationInsert::new(obligation);
            sqlx::query(
                r"
                INSERT INTO contribution_obligations
                    (id, member_id, obligation_type, amount_cents, due_date, status,
                     description, event_ref, created_by, created_at, updated_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
                ",
            )
            .bind(row.id)
            .bind(row.member_id)
            .bind(row.obligation_type)
            .bind(row.amount_cents)
            .bind(row.due_date)
            .bind(row.status)
            .bind(row.description)
            .bind(row.event_ref)
            .bind(row.created_by)
            .bind(obligation.created_at)
            .bind(obligation.updated_at)
            .execute(&mut *tx)
            .await
            .map_err(map_db_error)?;
        }

        insert_audit(&mut *tx, audit).await?;
        tx.commit().await.map_err(map_db_error)?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn mark_overdue_missed(
        &self,
        today: NaiveDate,
    ) -> RepoResult<Vec<(Snowflake, Snowflake)>> {
        let rows = sqlx::query_as::<_, (i64, i64)>(
            r"
            UPDATE contribution_obligations
            SET status = 'missed', updated_at = NOW()
            WHERE status = 'pending' AND due_date < $1
            RETURNING id, member_id
            ",
        )
        .bind(today)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(rows
            .into_iter()
            .map(|(id, member_id)| (Snowflake::new(id), Snowflake::new(member_id)))
            .collect())
    }

    #[instrument(skip(self))]
    async fn totals(&self, member_id: Option<Snowflake>) -> RepoResult<ObligationTotals> {
        // SUM over BIGINT yields NUMERIC, so every sum is cast back
        let row = sqlx::query_as::<_, ObligationTotalsModel>(
            r"
            SELECT
                COUNT(*) FILTER (WHERE status = 'pending') AS pending_count,
                COUNT(*) FILTER (WHERE status = 'paid') AS paid_count,
                COUNT(*) FILTER (WHERE status = 'missed') AS missed_count,
                COALESCE(SUM(amount_cents), 0)::BIGINT AS expected_cents,
                COALESCE(SUM(amount_cents) FILTER (WHERE status = 'paid'), 0)::BIGINT AS collected_cents,
                COALESCE(SUM(amount_cents) FILTER (WHERE status <> 'paid'), 0)::BIGINT AS outstanding_cents
            FROM contribution_obligations
            WHERE ($1::BIGINT IS NULL OR member_id = $1)
            ",
        )
        .bind(member_id.map(Snowflake::into_inner))
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(ObligationTotals::from(row))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repo_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<PgObligationRepository>();
    }
}
