//! Profile database model

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database model for the profiles table
#[derive(Debug, Clone, FromRow)]
pub struct ProfileModel {
    pub user_id: i64,
    pub full_name: Option<String>,
    pub email: String,
    /// E.164
    pub phone: Option<String>,
    pub id_number: Option<String>,
    pub email_confirmed_at: Option<DateTime<Utc>>,
    pub phone_verified_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
