//! API Integration Tests
//!
//! These tests require:
//! - Running PostgreSQL instance
//! - Running Redis instance
//! - Environment variables: DATABASE_URL, REDIS_URL, JWT_SECRET, API_PORT
//!
//! Payment providers are optional; these tests only use manually verified channels.
//!
//! Run with: cargo test -p integration-tests --test api_tests

use cbo_core::MemberRole;
use integration_tests::{
    assert_json, assert_status, check_test_env, fixtures::*, TestMember, TestServer,
};
use reqwest::StatusCode;

/// A member whose profile is complete, so their session is ready
async fn ready_member(server: &TestServer) -> TestMember {
    let member = server.new_member().expect("member");
    let response = server
        .put_auth("/api/v1/profile", &member.token, &UpsertProfileRequest::complete())
        .await
        .unwrap();
    assert_status(response, StatusCode::OK).await.unwrap();
    member
}

async fn member_with_role(server: &TestServer, role: MemberRole) -> TestMember {
    let member = ready_member(server).await;
    server.grant_role(member.user_id, role).await.unwrap();
    member
}

async fn create_obligation(
    server: &TestServer,
    treasurer: &TestMember,
    member: &TestMember,
    amount: f64,
) -> ObligationResponse {
    let request = CreateObligationRequest::regular(&member.user_id.to_string(), amount);
    let response = server
        .post_auth("/api/v1/obligations", &treasurer.token, &request)
        .await
        .unwrap();
    assert_json(response, StatusCode::CREATED).await.unwrap()
}

// ============================================================================
// Health Check Tests
// ============================================================================

#[tokio::test]
async fn test_health_check() {
    if !check_test_env().await {
        return;
    }

    let server = TestServer::start().await.expect("Failed to start server");
    let response = server.get("/health").await.expect("Request failed");
    assert_status(response, StatusCode::OK).await.unwrap();
}

#[tokio::test]
async fn test_health_ready() {
    if !check_test_env().await {
        return;
    }

    let server = TestServer::start().await.expect("Failed to start server");
    let response = server.get("/health/ready").await.expect("Request failed");
    assert_status(response, StatusCode::OK).await.unwrap();
}

// ============================================================================
// Session and Profile Tests
// ============================================================================

#[tokio::test]
async fn test_new_identity_needs_profile() {
    if !check_test_env().await {
        return;
    }

    let server = TestServer::start().await.expect("Failed to start server");
    let member = server.new_member().unwrap();

    let response = server.get_auth("/api/v1/session", &member.token).await.unwrap();
    let session: SessionResponse = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(session.user_id, member.user_id.to_string());
    assert_eq!(session.status, "needs_profile");

    let response = server
        .get_auth("/api/v1/session/guard?path=/dashboard", &member.token)
        .await
        .unwrap();
    let guard: GuardResponse = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(guard.decision["action"], "redirect");
    assert_eq!(guard.decision["to"], "/profile-setup");
}

#[tokio::test]
async fn test_profile_setup_makes_session_ready() {
    if !check_test_env().await {
        return;
    }

    let server = TestServer::start().await.expect("Failed to start server");
    let member = server.new_member().unwrap();

    let response = server
        .put_auth("/api/v1/profile", &member.token, &UpsertProfileRequest::complete())
        .await
        .unwrap();
    let profile: ProfileResponse = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(profile.email, member.email);
    assert_eq!(profile.phone.as_deref(), Some("+254712345678"));
    assert!(profile.complete);

    let response = server.get_auth("/api/v1/session", &member.token).await.unwrap();
    let session: SessionResponse = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(session.status, "ready");
}

#[tokio::test]
async fn test_session_requires_token() {
    if !check_test_env().await {
        return;
    }

    let server = TestServer::start().await.expect("Failed to start server");
    let response = server.get("/api/v1/session").await.unwrap();
    let error: ErrorResponse = assert_json(response, StatusCode::UNAUTHORIZED).await.unwrap();
    assert_eq!(error.error.code, "MISSING_AUTHORIZATION");
}

#[tokio::test]
async fn test_stealth_route_redirects_plain_member_to_dashboard() {
    if !check_test_env().await {
        return;
    }

    let server = TestServer::start().await.expect("Failed to start server");
    let member = member_with_role(&server, MemberRole::Member).await;

    let response = server
        .get_auth("/api/v1/session/guard?path=/admin", &member.token)
        .await
        .unwrap();
    let guard: GuardResponse = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(guard.status, "ready");
    assert_eq!(guard.decision["to"], "/dashboard");
}

// ============================================================================
// Role Tests
// ============================================================================

#[tokio::test]
async fn test_admin_assigns_and_supersedes_role() {
    if !check_test_env().await {
        return;
    }

    let server = TestServer::start().await.expect("Failed to start server");
    let admin = member_with_role(&server, MemberRole::Admin).await;
    let member = ready_member(&server).await;
    let roles_path = format!("/api/v1/members/{}/roles", member.user_id);

    let response = server
        .post_auth(
            &roles_path,
            &admin.token,
            &AssignRoleRequest {
                role: "treasurer".to_string(),
            },
        )
        .await
        .unwrap();
    let assignment: RoleAssignmentResponse =
        assert_json(response, StatusCode::CREATED).await.unwrap();
    assert_eq!(assignment.role, "treasurer");

    let response = server.get_auth("/api/v1/me/permissions", &member.token).await.unwrap();
    let granted: PermissionsResponse = assert_json(response, StatusCode::OK).await.unwrap();
    assert!(granted.roles.contains(&"treasurer".to_string()));
    assert!(granted.permissions.contains(&"approve_payments".to_string()));

    let response = server
        .delete_auth(&format!("{roles_path}/treasurer"), &admin.token)
        .await
        .unwrap();
    assert_status(response, StatusCode::NO_CONTENT).await.unwrap();

    let response = server.get_auth(&roles_path, &admin.token).await.unwrap();
    let active: Vec<RoleAssignmentResponse> = assert_json(response, StatusCode::OK).await.unwrap();
    assert!(active.iter().all(|a| a.role != "treasurer"));
}

#[tokio::test]
async fn test_member_cannot_assign_roles() {
    if !check_test_env().await {
        return;
    }

    let server = TestServer::start().await.expect("Failed to start server");
    let member = member_with_role(&server, MemberRole::Member).await;

    let response = server
        .post_auth(
            &format!("/api/v1/members/{}/roles", member.user_id),
            &member.token,
            &AssignRoleRequest {
                role: "admin".to_string(),
            },
        )
        .await
        .unwrap();
    let error: ErrorResponse = assert_json(response, StatusCode::FORBIDDEN).await.unwrap();
    assert_eq!(error.error.code, "MISSING_PERMISSIONS");
}

// ============================================================================
// Obligation and Payment Tests
// ============================================================================

#[tokio::test]
async fn test_manual_payment_approval_flow() {
    if !check_test_env().await {
        return;
    }

    let server = TestServer::start().await.expect("Failed to start server");
    let treasurer = member_with_role(&server, MemberRole::Treasurer).await;
    let member = member_with_role(&server, MemberRole::Member).await;
    let obligation = create_obligation(&server, &treasurer, &member, 1500.0).await;
    assert_eq!(obligation.status, "pending");

    let response = server
        .post_auth(
            &format!("/api/v1/obligations/{}/payments", obligation.id),
            &member.token,
            &InitiatePaymentRequest::cash(),
        )
        .await
        .unwrap();
    let started: InitiatePaymentResponse = assert_json(response, StatusCode::CREATED).await.unwrap();
    assert_eq!(started.transaction.status, "awaiting_approval");

    let response = server
        .get_auth("/api/v1/payments/pending-approval", &treasurer.token)
        .await
        .unwrap();
    let pending: Vec<TransactionResponse> = assert_json(response, StatusCode::OK).await.unwrap();
    assert!(pending.iter().any(|t| t.id == started.transaction.id));

    let response = server
        .post_auth(
            &format!("/api/v1/payments/{}/decision", started.transaction.id),
            &treasurer.token,
            &PaymentDecisionRequest::approve(),
        )
        .await
        .unwrap();
    let decided: TransactionResponse = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(decided.status, "completed");

    let response = server.get_auth("/api/v1/obligations/me", &member.token).await.unwrap();
    let mine: Vec<ObligationResponse> = assert_json(response, StatusCode::OK).await.unwrap();
    let paid = mine.iter().find(|o| o.id == obligation.id).expect("obligation");
    assert_eq!(paid.status, "paid");

    // A second decision on the same payment is a conflict
    let response = server
        .post_auth(
            &format!("/api/v1/payments/{}/decision", started.transaction.id),
            &treasurer.token,
            &PaymentDecisionRequest::reject("duplicate"),
        )
        .await
        .unwrap();
    assert_status(response, StatusCode::CONFLICT).await.unwrap();
}

#[tokio::test]
async fn test_rejected_payment_leaves_obligation_pending() {
    if !check_test_env().await {
        return;
    }

    let server = TestServer::start().await.expect("Failed to start server");
    let treasurer = member_with_role(&server, MemberRole::Treasurer).await;
    let member = member_with_role(&server, MemberRole::Member).await;
    let obligation = create_obligation(&server, &treasurer, &member, 200.0).await;

    let response = server
        .post_auth(
            &format!("/api/v1/obligations/{}/payments", obligation.id),
            &member.token,
            &InitiatePaymentRequest::cash(),
        )
        .await
        .unwrap();
    let started: InitiatePaymentResponse = assert_json(response, StatusCode::CREATED).await.unwrap();

    let response = server
        .post_auth(
            &format!("/api/v1/payments/{}/decision", started.transaction.id),
            &treasurer.token,
            &PaymentDecisionRequest::reject("Receipt not found in the cash book"),
        )
        .await
        .unwrap();
    let decided: TransactionResponse = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(decided.status, "rejected");

    let response = server
        .get_auth(
            &format!("/api/v1/members/{}/obligations", member.user_id),
            &treasurer.token,
        )
        .await
        .unwrap();
    let obligations: Vec<ObligationResponse> = assert_json(response, StatusCode::OK).await.unwrap();
    let still_open = obligations
        .iter()
        .find(|o| o.id == obligation.id)
        .expect("obligation");
    assert_eq!(still_open.status, "pending");
}

#[tokio::test]
async fn test_member_cannot_pay_someone_elses_obligation() {
    if !check_test_env().await {
        return;
    }

    let server = TestServer::start().await.expect("Failed to start server");
    let treasurer = member_with_role(&server, MemberRole::Treasurer).await;
    let owner = member_with_role(&server, MemberRole::Member).await;
    let other = member_with_role(&server, MemberRole::Member).await;
    let obligation = create_obligation(&server, &treasurer, &owner, 300.0).await;

    let response = server
        .post_auth(
            &format!("/api/v1/obligations/{}/payments", obligation.id),
            &other.token,
            &InitiatePaymentRequest::cash(),
        )
        .await
        .unwrap();
    assert_status(response, StatusCode::FORBIDDEN).await.unwrap();
}

#[tokio::test]
async fn test_member_dashboard_counts_paid_obligation() {
    if !check_test_env().await {
        return;
    }

    let server = TestServer::start().await.expect("Failed to start server");
    let treasurer = member_with_role(&server, MemberRole::Treasurer).await;
    let member = member_with_role(&server, MemberRole::Member).await;
    let obligation = create_obligation(&server, &treasurer, &member, 750.0).await;

    let response = server
        .post_auth(
            &format!("/api/v1/obligations/{}/payments", obligation.id),
            &member.token,
            &InitiatePaymentRequest::cash(),
        )
        .await
        .unwrap();
    let started: InitiatePaymentResponse = assert_json(response, StatusCode::CREATED).await.unwrap();
    let response = server
        .post_auth(
            &format!("/api/v1/payments/{}/decision", started.transaction.id),
            &treasurer.token,
            &PaymentDecisionRequest::approve(),
        )
        .await
        .unwrap();
    assert_status(response, StatusCode::OK).await.unwrap();

    let response = server.get_auth("/api/v1/dashboard/me", &member.token).await.unwrap();
    let summary: MemberSummary = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(summary.member_id, member.user_id.to_string());
    assert_eq!(summary.paid_count, 1);
    assert_eq!(summary.pending_count, 0);
}

// ============================================================================
// Audit Log Tests
// ============================================================================

#[tokio::test]
async fn test_audit_log_records_approval() {
    if !check_test_env().await {
        return;
    }

    let server = TestServer::start().await.expect("Failed to start server");
    let admin = member_with_role(&server, MemberRole::Admin).await;
    let treasurer = member_with_role(&server, MemberRole::Treasurer).await;
    let member = member_with_role(&server, MemberRole::Member).await;
    let obligation = create_obligation(&server, &treasurer, &member, 100.0).await;

    let response = server
        .post_auth(
            &format!("/api/v1/obligations/{}/payments", obligation.id),
            &member.token,
            &InitiatePaymentRequest::cash(),
        )
        .await
        .unwrap();
    let started: InitiatePaymentResponse = assert_json(response, StatusCode::CREATED).await.unwrap();
    let response = server
        .post_auth(
            &format!("/api/v1/payments/{}/decision", started.transaction.id),
            &treasurer.token,
            &PaymentDecisionRequest::approve(),
        )
        .await
        .unwrap();
    assert_status(response, StatusCode::OK).await.unwrap();

    let response = server
        .get_auth("/api/v1/audit-logs?limit=20", &admin.token)
        .await
        .unwrap();
    let page: PaginatedResponse<AuditLogResponse> =
        assert_json(response, StatusCode::OK).await.unwrap();
    assert!(page.pagination.limit <= 20);
    assert!(page.data.iter().any(|e| e.action == "PAYMENT_APPROVED"));
}

#[tokio::test]
async fn test_audit_log_requires_permission() {
    if !check_test_env().await {
        return;
    }

    let server = TestServer::start().await.expect("Failed to start server");
    let treasurer = member_with_role(&server, MemberRole::Treasurer).await;

    let response = server.get_auth("/api/v1/audit-logs", &treasurer.token).await.unwrap();
    assert_status(response, StatusCode::FORBIDDEN).await.unwrap();
}

// ============================================================================
// Webhook Tests
// ============================================================================

#[tokio::test]
async fn test_mpesa_webhook_always_acknowledges() {
    if !check_test_env().await {
        return;
    }

    let server = TestServer::start().await.expect("Failed to start server");
    let response = server
        .post(
            "/webhooks/mpesa/not-the-token",
            &serde_json::json!({"Body": {"stkCallback": {"CheckoutRequestID": "ws_CO_x", "ResultCode": 1032}}}),
        )
        .await
        .unwrap();
    let ack: serde_json::Value = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(ack["ResultCode"], 0);
}
