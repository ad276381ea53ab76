//! PostgreSQL implementation of ProfileRepository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::instrument;

use cbo_core::entities::Profile;
use cbo_core::error::DomainError;
use cbo_core::traits::{ProfileRepository, RepoResult};
use cbo_core::value_objects::{PhoneNumber, Snowflake};

use crate::models::ProfileModel;

use super::error::map_db_error;

const PROFILE_COLUMNS: &str = "user_id, full_name, email, phone, id_number, email_confirmed_at, \
                               phone_verified_at, created_at, updated_at";

/// PostgreSQL implementation of ProfileRepository
#[derive(Clone)]
pub struct PgProfileRepository {
    pool: PgPool,
}

impl PgProfileRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProfileRepository for PgProfileRepository {
    #[instrument(skip(self))]
    async fn find_by_user_id(&self, user_id: Snowflake) -> RepoResult<Option<Profile>> {
        let sql = format!("SELECT {PROFILE_COLUMNS} FROM profiles WHERE user_id = $1");
        let row = sqlx::query_as::<_, ProfileModel>(&sql)
            .bind(user_id.into_inner())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_error)?;

        row.map(Profile::try_from).transpose()
    }

    #[instrument(skip(self, email))]
    async fn find_by_email(&self, email: &str) -> RepoResult<Option<Profile>> {
        let sql = format!(
            "SELECT {PROFILE_COLUMNS} FROM profiles WHERE LOWER(email) = LOWER($1) \
             ORDER BY created_at LIMIT 1"
        );
        let row = sqlx::query_as::<_, ProfileModel>(&sql)
            .bind(email.trim())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_error)?;

        row.map(Profile::try_from).transpose()
    }

    #[instrument(skip(self, profile), fields(user_id = %profile.user_id))]
    async fn upsert(&self, profile: &Profile) -> RepoResult<()> {
        sqlx::query(
            r"
            INSERT INTO profiles (user_id, full_name, email, phone, id_number,
                                  email_confirmed_at, phone_verified_at, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (user_id) DO UPDATE
            SET full_name = EXCLUDED.full_name,
                email = EXCLUDED.email,
                phone = EXCLUDED.phone,
                id_number = EXCLUDED.id_number,
                email_confirmed_at = EXCLUDED.email_confirmed_at,
                phone_verified_at = EXCLUDED.phone_verified_at,
                updated_at = EXCLUDED.updated_at
            ",
        )
        .bind(profile.user_id.into_inner())
        .bind(&profile.full_name)
        .bind(&profile.email)
        .bind(profile.phone.as_ref().map(PhoneNumber::as_str))
        .bind(&profile.id_number)
        .bind(profile.email_confirmed_at)
        .bind(profile.phone_verified_at)
        .bind(profile.created_at)
        .bind(profile.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn mark_phone_verified(&self, user_id: Snowflake, at: DateTime<Utc>) -> RepoResult<()> {
        let result = sqlx::query(
            r"
            UPDATE profiles
            SET phone_verified_at = $2, updated_at = $2
            WHERE user_id = $1 AND phone IS NOT NULL
            ",
        )
        .bind(user_id.into_inner())
        .bind(at)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        if result.rows_affected() == 0 {
            return Err(DomainError::ProfileNotFound(user_id));
        }

        Ok(())
    }

    #[instrument(skip(self))]
    async fn list_member_ids(&self) -> RepoResult<Vec<Snowflake>> {
        let ids = sqlx::query_scalar::<_, i64>(
            r"
            SELECT user_id FROM profiles
            UNION
            SELECT user_id FROM role_assignments WHERE superseded_at IS NULL
            ORDER BY 1
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(ids.into_iter().map(Snowflake::new).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repo_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<PgProfileRepository>();
    }
}
