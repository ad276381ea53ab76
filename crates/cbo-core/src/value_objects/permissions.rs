//! Portal permission flags
//!
//! Each flag has a snake_case key (`manage_payments`) used on the wire and by route tables.

use bitflags::bitflags;
use serde::{ser::SerializeSeq, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

bitflags! {
    /// Actions and features a member may access
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Permissions: u32 {
        const VIEW_DASHBOARD         = 1 << 0;
        const VIEW_OWN_CONTRIBUTIONS = 1 << 1;
        const MAKE_PAYMENTS          = 1 << 2;
        const VIEW_ANNOUNCEMENTS     = 1 << 3;
        const VIEW_MEMBERS           = 1 << 4;
        const MANAGE_MEMBERS         = 1 << 5;
        const MANAGE_ROLES           = 1 << 6;
        const MANAGE_CONTRIBUTIONS   = 1 << 7;
        const MANAGE_PAYMENTS        = 1 << 8;
        /// Resolve manually verified payments (treasurer, admin)
        const APPROVE_PAYMENTS       = 1 << 9;
        const VIEW_FINANCIAL_REPORTS = 1 << 10;
        const MANAGE_ANNOUNCEMENTS   = 1 << 11;
        const MANAGE_WELFARE         = 1 << 12;
        const MANAGE_MEETINGS        = 1 << 13;
        const SEND_COMMUNICATIONS    = 1 << 14;
        const VIEW_AUDIT_LOG         = 1 << 15;
        const MANAGE_SETTINGS        = 1 << 16;
    }
}

impl Permissions {
    /// Everything that only reads
    pub const READ_ONLY: Self = Self::VIEW_DASHBOARD
        .union(Self::VIEW_OWN_CONTRIBUTIONS)
        .union(Self::VIEW_ANNOUNCEMENTS)
        .union(Self::VIEW_MEMBERS)
        .union(Self::VIEW_FINANCIAL_REPORTS)
        .union(Self::VIEW_AUDIT_LOG);

    /// Parse a single snake_case permission key
    pub fn from_key(key: &str) -> Option<Self> {
        let flag = Self::from_name(&key.trim().to_ascii_uppercase())?;
        (flag.bits().count_ones() == 1).then_some(flag)
    }

    /// Snake_case keys of every flag set, in declaration order
    pub fn keys(&self) -> Vec<String> {
        self.iter_names()
            .map(|(name, _)| name.to_ascii_lowercase())
            .collect()
    }

    /// Key of a single flag
    pub fn key(&self) -> Option<String> {
        if self.bits().count_ones() != 1 {
            return None;
        }
        self.keys().into_iter().next()
    }
}

impl Default for Permissions {
    fn default() -> Self {
        Permissions::empty()
    }
}

impl fmt::Display for Permissions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.keys().join(","))
    }
}

// Serialized as a list of keys: ["view_dashboard", "make_payments"]
impl Serialize for Permissions {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let keys = self.keys();
        let mut seq = serializer.serialize_seq(Some(keys.len()))?;
        for key in &keys {
            seq.serialize_element(key)?;
        }
        seq.end()
    }
}

impl<'de> Deserialize<'de> for Permissions {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let keys = Vec::<String>::deserialize(deserializer)?;
        keys.iter().try_fold(Permissions::empty(), |acc, key| {
            Permissions::from_key(key)
                .map(|flag| acc | flag)
                .ok_or_else(|| serde::de::Error::custom(format!("unknown permission: {key}")))
        })
    }
}
