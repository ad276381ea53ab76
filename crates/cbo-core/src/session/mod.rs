//! Session status and route guarding
//!
//! A session moves from `checking` to exactly one of `signed_out`,
//! `needs_email_verification`, `needs_profile` or `ready` once its signals are known.
//! Only `ready` renders protected content.

mod guard;

pub use guard::{guard, route_kind, GuardDecision, RouteKind, PORTAL_ROUTES};

use serde::{Deserialize, Serialize};

/// Facts read from the store for the current identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SessionSignals {
    pub has_session: bool,
    pub email_confirmed: bool,
    pub profile_complete: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Checking,
    SignedOut,
    NeedsEmailVerification,
    NeedsProfile,
    Ready,
}

impl SessionStatus {
    /// `None` means the signals have not been loaded yet
    pub fn evaluate(signals: Option<SessionSignals>) -> Self {
        match signals {
            None => Self::Checking,
            Some(s) if !s.has_session => Self::SignedOut,
            Some(s) if !s.email_confirmed => Self::NeedsEmailVerification,
            Some(s) if !s.profile_complete => Self::NeedsProfile,
            Some(_) => Self::Ready,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Checking => "checking",
            Self::SignedOut => "signed_out",
            Self::NeedsEmailVerification => "needs_email_verification",
            Self::NeedsProfile => "needs_profile",
            Self::Ready => "ready",
        }
    }

    #[inline]
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signals(has_session: bool, email_confirmed: bool, profile_complete: bool) -> SessionSignals {
        SessionSignals {
            has_session,
            email_confirmed,
            profile_complete,
        }
    }

    #[test]
    fn test_evaluate() {
        assert_eq!(SessionStatus::evaluate(None), SessionStatus::Checking);
        assert_eq!(
            SessionStatus::evaluate(Some(signals(false, true, true))),
            SessionStatus::SignedOut
        );
        assert_eq!(
            SessionStatus::evaluate(Some(signals(true, false, true))),
            SessionStatus::NeedsEmailVerification
        );
        assert_eq!(
            SessionStatus::evaluate(Some(signals(true, true, false))),
            SessionStatus::NeedsProfile
        );
        assert_eq!(
            SessionStatus::evaluate(Some(signals(true, true, true))),
            SessionStatus::Ready
        );
    }
}
