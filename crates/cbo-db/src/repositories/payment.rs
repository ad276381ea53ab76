//! PostgreSQL implementation of PaymentRepository
//!
//! Status changes are guarded with `WHERE status = <expected>`, so a repeated or racing
//! callback observes zero affected rows instead of changing a transaction twice.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{instrument, warn};

use cbo_core::entities::{AuditLogEntry, PaymentTransaction, TransactionStatus};
use cbo_core::error::DomainError;
use cbo_core::traits::{
    PaymentRepository, RepoResult, Settlement, SettlementResult, TransactionChange,
};
use cbo_core::value_objects::{Money, Snowflake};

use crate::mappers::{flag_reason_to_json, TransactionInsert};
use crate::models::TransactionModel;

use super::audit_log::insert_audit;
use super::error::{map_db_error, map_unique_violation};

const TRANSACTION_COLUMNS: &str = "id, obligation_id, payer_id, channel, tracking_id, amount_cents, \
    reported_amount_cents, status, phone, receipt_number, proof_url, flag_reason, last_error, \
    decided_by, decision_notes, decided_at, created_at, updated_at";

/// PostgreSQL implementation of PaymentRepository
#[derive(Clone)]
pub struct PgPaymentRepository {
    pool: PgPool,
}

impl PgPaymentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PaymentRepository for PgPaymentRepository {
    #[instrument(skip(self, transaction, audit), fields(transaction_id = %transaction.id))]
    async fn create(
        &self,
        transaction: &PaymentTransaction,
        audit: Option<&AuditLogEntry>,
    ) -> RepoResult<()> {
        let row = TransactionInsert::new(transaction)?;
        let mut tx = self.pool.begin().await.map_err(map_db_error)?;

        sqlx::query(
            r"
            INSERT INTO payment_transactions
                (id, obligation_id, payer_id, channel, tracking_id, amount_cents,
                 reported_amount_cents, status, phone, receipt_number, proof_url, flag_reason,
                 created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            ",
        )
        .bind(row.id)
        .bind(row.obligation_id)
        .bind(row.payer_id)
        .bind(row.channel)
        .bind(row.tracking_id)
        .bind(row.amount_cents)
        .bind(row.reported_amount_cents)
        .bind(row.status)
        .bind(row.phone)
        .bind(row.receipt_number)
        .bind(row.proof_url)
        .bind(row.flag_reason)
        .bind(transaction.created_at)
        .bind(transaction.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            map_unique_violation(e, || {
                DomainError::DuplicateTrackingId(
                    transaction.tracking_id.clone().unwrap_or_default(),
                )
            })
        })?;

        if let Some(audit) = audit {
            insert_audit(&mut *tx, audit).await?;
        }
        tx.commit().await.map_err(map_db_error)?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, id: Snowflake) -> RepoResult<Option<PaymentTransaction>> {
        let sql = format!("SELECT {TRANSACTION_COLUMNS} FROM payment_transactions WHERE id = $1");
        let row = sqlx::query_as::<_, TransactionModel>(&sql)
            .bind(id.into_inner())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_error)?;

        row.map(PaymentTransaction::try_from).transpose()
    }

    #[instrument(skip(self))]
    async fn find_by_tracking_id(
        &self,
        tracking_id: &str,
    ) -> RepoResult<Option<PaymentTransaction>> {
        let sql = format!(
            "SELECT {TRANSACTION_COLUMNS} FROM payment_transactions WHERE tracking_id = $1"
        );
        let row = sqlx::query_as::<_, TransactionModel>(&sql)
            .bind(tracking_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_error)?;

        row.map(PaymentTransaction::try_from).transpose()
    }

    #[instrument(skip(self))]
    async fn find_by_obligation(
        &self,
        obligation_id: Snowflake,
    ) -> RepoResult<Vec<PaymentTransaction>> {
        let sql = format!(
            "SELECT {TRANSACTION_COLUMNS} FROM payment_transactions \
             WHERE obligation_id = $1 ORDER BY created_at DESC"
        );
        let rows = sqlx::query_as::<_, TransactionModel>(&sql)
            .bind(obligation_id.into_inner())
            .fetch_all(&self.pool)
            .await
            .map_err(map_db_error)?;

        rows.into_iter().map(PaymentTransaction::try_from).collect()
    }

    #[instrument(skip(self))]
    async fn find_awaiting_approval(&self, limit: i64) -> RepoResult<Vec<PaymentTransaction>> {
        let sql = format!(
            "SELECT {TRANSACTION_COLUMNS} FROM payment_transactions \
             WHERE status = 'awaiting_approval' ORDER BY created_at ASC LIMIT $1"
        );
        let rows = sqlx::query_as::<_, TransactionModel>(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(map_db_error)?;

        rows.into_iter().map(PaymentTransaction::try_from).collect()
    }

    #[instrument(skip(self))]
    async fn count_by_status(&self, status: TransactionStatus) -> RepoResult<i64> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM payment_transactions WHERE status = $1")
            .bind(status.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(map_db_error)
    }

    #[instrument(skip(self))]
    async fn record_tracking_id(&self, id: Snowflake, tracking_id: &str) -> RepoResult<()> {
        let result = sqlx::query(
            r"
            UPDATE payment_transactions
            SET tracking_id = $2, updated_at = NOW()
            WHERE id = $1 AND status = 'pending'
            ",
        )
        .bind(id.into_inner())
        .bind(tracking_id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            map_unique_violation(e, || DomainError::DuplicateTrackingId(tracking_id.to_string()))
        })?;

        if result.rows_affected() == 0 {
            return Err(DomainError::TransactionNotFound(id.to_string()));
        }

        Ok(())
    }

    #[instrument(skip(self, error))]
    async fn record_initiation_error(&self, id: Snowflake, error: &str) -> RepoResult<()> {
        sqlx::query(
            r"
            UPDATE payment_transactions
            SET last_error = $2, updated_at = NOW()
            WHERE id = $1
            ",
        )
        .bind(id.into_inner())
        .bind(error)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(())
    }

    #[instrument(
        skip(self, change, audit),
        fields(transaction_id = %change.transaction_id, from = %change.from, to = %change.to)
    )]
    async fn apply_change(
        &self,
        change: &TransactionChange,
        audit: &AuditLogEntry,
    ) -> RepoResult<bool> {
        let flag_reason = change.flag_reason.as_ref().map(flag_reason_to_json).transpose()?;
        let decided_at = change.decided_by.map(|_| change.at);
        let mut tx = self.pool.begin().await.map_err(map_db_error)?;

        let result = sqlx::query(
            r"
            UPDATE payment_transactions
            SET status = $3,
                flag_reason = COALESCE($4, flag_reason),
                reported_amount_cents = COALESCE($5, reported_amount_cents),
                receipt_number = COALESCE($6, receipt_number),
                decided_by = COALESCE($7, decided_by),
                decision_notes = COALESCE($8, decision_notes),
                decided_at = COALESCE($9, decided_at),
                updated_at = $10
            WHERE id = $1 AND status = $2
            ",
        )
        .bind(change.transaction_id.into_inner())
        .bind(change.from.as_str())
        .bind(change.to.as_str())
        .bind(flag_reason)
        .bind(change.reported_amount.map(Money::cents))
        .bind(change.receipt_number.as_deref())
        .bind(change.decided_by.map(Snowflake::into_inner))
        .bind(change.decision_notes.as_deref())
        .bind(decided_at)
        .bind(change.at)
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

    #[instrument(skip(self, settlement, audit), fields(transaction_id = %settlement.transaction_id))]
    async fn settle(
        &self,
        settlement: &Settlement,
        audit: &AuditLogEntry,
    ) -> RepoResult<SettlementResult> {
        let decided_at = settlement.decided_by.map(|_| settlement.at);
        let mut tx = self.pool.begin().await.map_err(map_db_error)?;

        let result = sqlx::query(
            r"
            UPDATE payment_transactions
            SET status = 'completed',
                receipt_number = COALESCE($3, receipt_number),
                reported_amount_cents = COALESCE($4, reported_amount_cents),
                decided_by = COALESCE($5, decided_by),
                decision_notes = COALESCE($6, decision_notes),
                decided_at = COALESCE($7, decided_at),
                updated_at = $8
            WHERE id = $1 AND status = $2
            ",
        )
        .bind(settlement.transaction_id.into_inner())
        .bind(settlement.from.as_str())
        .bind(settlement.receipt_number.as_deref())
        .bind(settlement.reported_amount.map(Money::cents))
        .bind(settlement.decided_by.map(Snowflake::into_inner))
        .bind(settlement.decision_notes.as_deref())
        .bind(decided_at)
        .bind(settlement.at)
        .execute(&mut *tx)
        .await
        .map_err(map_db_error)?;

        if result.rows_affected() == 0 {
            tx.rollback().await.map_err(map_db_error)?;
            return Ok(SettlementResult {
                applied: false,
                obligation_credited: false,
            });
        }

        let obligation_credited = match settlement.obligation_id {
            Some(obligation_id) => {
                // A missed obligation paid late is still credited
                let credited = sqlx::query(
                    r"
                    UPDATE contribution_obligations
                    SET status = 'paid', paid_at = $2, payment_reference = $3, updated_at = $2
                    WHERE id = $1 AND status IN ('pending', 'missed')
                    ",
                )
                .bind(obligation_id.into_inner())
                .bind(settlement.at)
                .bind(&settlement.reference)
                .execute(&mut *tx)
                .await
                .map_err(map_db_error)?;

                if credited.rows_affected() == 0 {
                    warn!(%obligation_id, "obligation already settled by another transaction");
                }
                credited.rows_affected() > 0
            }
            None => false,
        };

        insert_audit(&mut *tx, audit).await?;
        tx.commit().await.map_err(map_db_error)?;

        Ok(SettlementResult {
            applied: true,
            obligation_credited,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repo_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<PgPaymentRepository>();
    }

    #[test]
    fn test_column_list_matches_model() {
        assert_eq!(TRANSACTION_COLUMNS.split(',').count(), 18);
    }
}
