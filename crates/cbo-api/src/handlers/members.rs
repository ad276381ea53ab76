//! Member handlers
//!
//! Role assignments, per-member obligations and invitations.

use axum::{
    extract::{Path, State},
    Json,
};
use cbo_service::dto::{
    AssignRoleRequest, InvitationRequest, InvitationResponse, ObligationResponse,
    RoleAssignmentResponse,
};
use cbo_service::services::{InvitationService, ObligationService, RoleService};

use crate::extractors::{AuthSession, MemberPath, MemberRolePath, ValidatedJson};
use crate::response::{ApiResult, Created, NoContent};
use crate::state::AppState;

/// Active roles of a member
///
/// GET /members/{user_id}/roles
pub async fn list_roles(
    State(state): State<AppState>,
    session: AuthSession,
    Path(path): Path<MemberPath>,
) -> ApiResult<Json<Vec<RoleAssignmentResponse>>> {
    let user_id = path.user_id()?;
    let roles = RoleService::new(state.service_context())
        .list_roles(&session, user_id)
        .await?;
    Ok(Json(roles))
}

/// Assign a role
///
/// POST /members/{user_id}/roles
pub async fn assign_role(
    State(state): State<AppState>,
    session: AuthSession,
    Path(path): Path<MemberPath>,
    ValidatedJson(request): ValidatedJson<AssignRoleRequest>,
) -> ApiResult<Created<Json<RoleAssignmentResponse>>> {
    let user_id = path.user_id()?;
    let response = RoleService::new(state.service_context())
        .assign_role(&session, user_id, &request.role)
        .await?;
    Ok(Created(Json(response)))
}

/// Supersede a role
///
/// DELETE /members/{user_id}/roles/{role}
pub async fn supersede_role(
    State(state): State<AppState>,
    session: AuthSession,
    Path(path): Path<MemberRolePath>,
) -> ApiResult<NoContent> {
    let user_id = path.user_id()?;
    RoleService::new(state.service_context())
        .supersede_role(&session, user_id, path.role())
        .await?;
    Ok(NoContent)
}

/// GET /members/{user_id}/obligations
pub async fn list_obligations(
    State(state): State<AppState>,
    session: AuthSession,
    Path(path): Path<MemberPath>,
) -> ApiResult<Json<Vec<ObligationResponse>>> {
    let member_id = path.user_id()?;
    let obligations = ObligationService::new(state.service_context())
        .list_for_member(&session, member_id)
        .await?;
    Ok(Json(obligations))
}

/// Email a signup invitation
///
/// POST /members/invitations
pub async fn invite_member(
    State(state): State<AppState>,
    session: AuthSession,
    ValidatedJson(request): ValidatedJson<InvitationRequest>,
) -> ApiResult<Created<Json<InvitationResponse>>> {
    let response = InvitationService::new(state.service_context())
        .invite(&session, request)
        .await?;
    Ok(Created(Json(response)))
}
