//! Entity to DTO mappers
//!
//! Implements `From` conversions from domain entities to response DTOs.

use cbo_core::{
    AuditLogEntry, ContributionObligation, PaymentTransaction, Profile, RoleAssignment,
};

use super::responses::{
    AuditLogResponse, ObligationResponse, ProfileResponse, RoleAssignmentResponse,
    TransactionResponse,
};

// ============================================================================
// Profile Mappers
// ============================================================================

impl From<&Profile> for ProfileResponse {
    fn from(profile: &Profile) -> Self {
        Self {
            user_id: profile.user_id.to_string(),
            full_name: profile.full_name.clone(),
            email: profile.email.clone(),
            phone: profile.phone.as_ref().map(|p| p.as_str().to_string()),
            id_number: profile.id_number.clone(),
            email_confirmed: profile.is_email_confirmed(),
            phone_verified: profile.is_phone_verified(),
            complete: profile.is_complete(),
            created_at: profile.created_at,
            updated_at: profile.updated_at,
        }
    }
}

// ============================================================================
// Role Mappers
// ============================================================================

impl From<&RoleAssignment> for RoleAssignmentResponse {
    fn from(assignment: &RoleAssignment) -> Self {
        Self {
            id: assignment.id.to_string(),
            user_id: assignment.user_id.to_string(),
            role: assignment.role.as_str().to_string(),
            role_name: assignment.role.display_name().to_string(),
            assigned_by: assignment.assigned_by.map(|id| id.to_string()),
            assigned_at: assignment.assigned_at,
            superseded_at: assignment.superseded_at,
        }
    }
}

// ============================================================================
// Obligation Mappers
// ============================================================================

impl From<&ContributionObligation> for ObligationResponse {
    fn from(obligation: &ContributionObligation) -> Self {
        Self {
            id: obligation.id.to_string(),
            member_id: obligation.member_id.to_string(),
            obligation_type: obligation.obligation_type.as_str().to_string(),
            amount: obligation.amount,
            due_date: obligation.due_date,
            status: obligation.status.as_str().to_string(),
            description: obligation.description.clone(),
            event_ref: obligation.event_ref.clone(),
            paid_at: obligation.paid_at,
            payment_reference: obligation.payment_reference.clone(),
            created_at: obligation.created_at,
        }
    }
}

impl From<ContributionObligation> for ObligationResponse {
    fn from(obligation: ContributionObligation) -> Self {
        Self::from(&obligation)
    }
}

// ============================================================================
// Transaction Mappers
// ============================================================================

impl From<&PaymentTransaction> for TransactionResponse {
    fn from(tx: &PaymentTransaction) -> Self {
        Self {
            id: tx.id.to_string(),
            obligation_id: tx.obligation_id.map(|id| id.to_string()),
            payer_id: tx.payer_id.map(|id| id.to_string()),
            channel: tx.channel.as_str().to_string(),
            tracking_id: tx.tracking_id.clone(),
            amount: tx.amount,
            reported_amount: tx.reported_amount,
            status: tx.status.as_str().to_string(),
            receipt_number: tx.receipt_number.clone(),
            proof_url: tx.proof_url.clone(),
            flag_reason: tx.flag_reason.clone(),
            flag_description: tx.flag_reason.as_ref().map(|r| r.describe()),
            last_error: tx.last_error.clone(),
            decided_by: tx.decided_by.map(|id| id.to_string()),
            decision_notes: tx.decision_notes.clone(),
            decided_at: tx.decided_at,
            created_at: tx.created_at,
            updated_at: tx.updated_at,
        }
    }
}

impl From<PaymentTransaction> for TransactionResponse {
    fn from(tx: PaymentTransaction) -> Self {
        Self::from(&tx)
    }
}

// ============================================================================
// Audit Mappers
// ============================================================================

impl From<AuditLogEntry> for AuditLogResponse {
    fn from(entry: AuditLogEntry) -> Self {
        Self {
            id: entry.id.to_string(),
            action: entry.action.as_str().to_string(),
            description: entry.description,
            actor_id: entry.actor_id.map(|id| id.to_string()),
            target_type: entry.target_type,
            target_id: entry.target_id,
            metadata: entry.metadata,
            created_at: entry.created_at,
        }
    }
}
