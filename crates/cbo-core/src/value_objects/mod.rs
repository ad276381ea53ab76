//! Value objects - small immutable types shared by every layer

mod money;
mod permissions;
mod phone;
mod role;
mod snowflake;

pub use money::Money;
pub use permissions::Permissions;
pub use phone::{InvalidPhoneNumber, PhoneNumber, DEFAULT_COUNTRY_CODE};
pub use role::{MemberRole, UnknownRole};
pub use snowflake::{Snowflake, SnowflakeGenerator, SnowflakeParseError};
