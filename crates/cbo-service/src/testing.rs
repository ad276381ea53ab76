//! In-memory repositories and provider fakes
//!
//! [`MemoryStore`] implements every repository trait over one mutex, with the same
//! conditional-update semantics as the PostgreSQL repositories. [`TestHarness`] wires it and
//! the fakes into a [`ServiceContext`].

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use cbo_common::auth::JwtService;
use cbo_common::PortalConfig;
use cbo_core::traits::{
    AuditLogRepository, CaptchaVerifier, ChargeRequest, ChargeStarted, EmailMessage, Mailer,
    ObligationRepository, ObligationTotals, PaymentGateway, PaymentRepository,
    ProfileRepository, RepoResult, RoleAssignmentRepository, Settlement, SettlementResult,
    SmsVerifier, StatsCache, TransactionChange,
};
use cbo_core::{
    AuditAction, AuditLogEntry, ContributionObligation, DomainError, GatewayResult, MemberRole,
    Money, ObligationStatus, ObligationType, PaymentChannel, PaymentTransaction, PhoneNumber,
    Profile, RoleAssignment, RoleSet, SessionStatus, Snowflake, SnowflakeGenerator,
    TransactionStatus,
};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use parking_lot::Mutex;

use crate::services::{ServiceContext, SessionContext};

/// Path token the M-Pesa fake expects on callbacks
pub const MPESA_CALLBACK_TOKEN: &str = "test-mpesa-callback-token";
/// The only code [`FakeSms`] approves
pub const FAKE_SMS_CODE: &str = "246810";
pub const JWT_SECRET: &str = "test-secret-key-for-jwt-signing-32b";

pub fn portal_config() -> PortalConfig {
    PortalConfig {
        base_url: "https://portal.example.org".to_string(),
        sweep_interval_secs: 0,
        default_country_code: "254".to_string(),
        stats_ttl_secs: 300,
    }
}

// ============================================================================
// Store
// ============================================================================

#[derive(Default)]
struct State {
    profiles: HashMap<Snowflake, Profile>,
    roles: Vec<RoleAssignment>,
    obligations: BTreeMap<Snowflake, ContributionObligation>,
    transactions: BTreeMap<Snowflake, PaymentTransaction>,
    audit: Vec<AuditLogEntry>,
}

/// Every repository, in memory
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_profile(&self, profile: Profile) {
        self.state.lock().profiles.insert(profile.user_id, profile);
    }

    pub fn insert_role(&self, assignment: RoleAssignment) {
        self.state.lock().roles.push(assignment);
    }

    pub fn insert_obligation(&self, obligation: ContributionObligation) {
        self.state.lock().obligations.insert(obligation.id, obligation);
    }

    pub fn append_audit(&self, entry: AuditLogEntry) {
        self.state.lock().audit.push(entry);
    }

    /// # Panics
    /// Panics if no profile exists for `user_id`
    pub fn profile(&self, user_id: Snowflake) -> Profile {
        self.state
            .lock()
            .profiles
            .get(&user_id)
            .cloned()
            .expect("profile should exist")
    }

    /// # Panics
    /// Panics if the obligation does not exist
    pub fn obligation(&self, id: Snowflake) -> ContributionObligation {
        self.state
            .lock()
            .obligations
            .get(&id)
            .cloned()
            .expect("obligation should exist")
    }

    /// # Panics
    /// Panics if the transaction does not exist
    pub fn transaction(&self, id: Snowflake) -> PaymentTransaction {
        self.state
            .lock()
            .transactions
            .get(&id)
            .cloned()
            .expect("transaction should exist")
    }

    pub fn transaction_by_tracking(&self, tracking_id: &str) -> Option<PaymentTransaction> {
        self.state
            .lock()
            .transactions
            .values()
            .find(|tx| tx.tracking_id.as_deref() == Some(tracking_id))
            .cloned()
    }

    pub fn transactions_for(&self, obligation_id: Snowflake) -> Vec<PaymentTransaction> {
        self.state
            .lock()
            .transactions
            .values()
            .filter(|tx| tx.obligation_id == Some(obligation_id))
            .cloned()
            .collect()
    }

    /// All role rows for a member, superseded ones included
    pub fn role_rows(&self, user_id: Snowflake) -> usize {
        self.state
            .lock()
            .roles
            .iter()
            .filter(|a| a.user_id == user_id)
            .count()
    }

    pub fn audit_entries(&self) -> Vec<AuditLogEntry> {
        self.state.lock().audit.clone()
    }

    pub fn count_audit(&self, action: AuditAction) -> usize {
        self.state
            .lock()
            .audit
            .iter()
            .filter(|e| e.action == action)
            .count()
    }
}

#[async_trait]
impl ProfileRepository for MemoryStore {
    async fn find_by_user_id(&self, user_id: Snowflake) -> RepoResult<Option<Profile>> {
        Ok(self.state.lock().profiles.get(&user_id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> RepoResult<Option<Profile>> {
        Ok(self
            .state
            .lock()
            .profiles
            .values()
            .filter(|p| p.email.eq_ignore_ascii_case(email))
            .min_by_key(|p| p.created_at)
            .cloned())
    }

    async fn upsert(&self, profile: &Profile) -> RepoResult<()> {
        self.insert_profile(profile.clone());
        Ok(())
    }

    async fn mark_phone_verified(&self, user_id: Snowflake, at: DateTime<Utc>) -> RepoResult<()> {
        let mut state = self.state.lock();
        match state.profiles.get_mut(&user_id) {
            Some(profile) if profile.phone.is_some() => {
                profile.phone_verified_at = Some(at);
                profile.updated_at = at;
                Ok(())
            }
            _ => Err(DomainError::ProfileNotFound(user_id)),
        }
    }

    async fn list_member_ids(&self) -> RepoResult<Vec<Snowflake>> {
        let state = self.state.lock();
        let mut ids: Vec<Snowflake> = state
            .profiles
            .keys()
            .copied()
            .chain(state.roles.iter().filter(|a| a.is_active()).map(|a| a.user_id))
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        ids.sort();
        Ok(ids)
    }
}

#[async_trait]
impl RoleAssignmentRepository for MemoryStore {
    async fn find_active_by_user(&self, user_id: Snowflake) -> RepoResult<Vec<RoleAssignment>> {
        Ok(self
            .state
            .lock()
            .roles
            .iter()
            .filter(|a| a.user_id == user_id && a.is_active())
            .cloned()
            .collect())
    }

    async fn find_active(
        &self,
        user_id: Snowflake,
        role: MemberRole,
    ) -> RepoResult<Option<RoleAssignment>> {
        Ok(self
            .state
            .lock()
            .roles
            .iter()
            .find(|a| a.user_id == user_id && a.role == role && a.is_active())
            .cloned())
    }

    async fn create(&self, assignment: &RoleAssignment, audit: &AuditLogEntry) -> RepoResult<()> {
        let mut state = self.state.lock();
        let exists = state
            .roles
            .iter()
            .any(|a| a.user_id == assignment.user_id && a.role == assignment.role && a.is_active());
        if exists {
            return Err(DomainError::RoleAlreadyAssigned(assignment.role));
        }
        state.roles.push(assignment.clone());
        state.audit.push(audit.clone());
        Ok(())
    }

    async fn supersede(
        &self,
        assignment_id: Snowflake,
        at: DateTime<Utc>,
        audit: &AuditLogEntry,
    ) -> RepoResult<bool> {
        let mut state = self.state.lock();
        let Some(assignment) = state
            .roles
            .iter_mut()
            .find(|a| a.id == assignment_id && a.is_active())
        else {
            return Ok(false);
        };
        assignment.superseded_at = Some(at);
        state.audit.push(audit.clone());
        Ok(true)
    }
}

#[async_trait]
impl ObligationRepository for MemoryStore {
    async fn find_by_id(&self, id: Snowflake) -> RepoResult<Option<ContributionObligation>> {
        Ok(self.state.lock().obligations.get(&id).cloned())
    }

    async fn find_by_member(&self, member_id: Snowflake) -> RepoResult<Vec<ContributionObligation>> {
        let mut obligations: Vec<_> = self
            .state
            .lock()
            .obligations
            .values()
            .filter(|o| o.member_id == member_id)
            .cloned()
            .collect();
        obligations.sort_by(|a, b| b.due_date.cmp(&a.due_date).then(b.id.cmp(&a.id)));
        Ok(obligations)
    }

    async fn create_many(
        &self,
        obligations: &[ContributionObligation],
        audit: &AuditLogEntry,
    ) -> RepoResult<()> {
        let mut state = self.state.lock();
        for obligation in obligations {
            state.obligations.insert(obligation.id, obligation.clone());
        }
        state.audit.push(audit.clone());
        Ok(())
    }

    async fn mark_overdue_missed(&self, today: NaiveDate) -> RepoResult<Vec<(Snowflake, Snowflake)>> {
        let mut state = self.state.lock();
        Ok(state
            .obligations
            .values_mut()
            .filter_map(|o| o.mark_missed(today).then_some((o.id, o.member_id)))
            .collect())
    }

    async fn totals(&self, member_id: Option<Snowflake>) -> RepoResult<ObligationTotals> {
        let state = self.state.lock();
        let mut totals = ObligationTotals::default();
        for o in state
            .obligations
            .values()
            .filter(|o| member_id.map_or(true, |m| o.member_id == m))
        {
            totals.expected = totals.expected + o.amount;
            match o.status {
                ObligationStatus::Pending => totals.pending_count += 1,
                ObligationStatus::Paid => totals.paid_count += 1,
                ObligationStatus::Missed => totals.missed_count += 1,
            }
            if o.status == ObligationStatus::Paid {
                totals.collected = totals.collected + o.amount;
            } else {
                totals.outstanding = totals.outstanding + o.amount;
            }
        }
        Ok(totals)
    }
}

#[async_trait]
impl PaymentRepository for MemoryStore {
    async fn create(
        &self,
        transaction: &PaymentTransaction,
        audit: Option<&AuditLogEntry>,
    ) -> RepoResult<()> {
        let mut state = self.state.lock();
        if let Some(tracking_id) = transaction.tracking_id.as_deref() {
            let taken = state
                .transactions
                .values()
                .any(|tx| tx.tracking_id.as_deref() == Some(tracking_id));
            if taken {
                return Err(DomainError::DuplicateTrackingId(tracking_id.to_string()));
            }
        }
        state.transactions.insert(transaction.id, transaction.clone());
        if let Some(audit) = audit {
            state.audit.push(audit.clone());
        }
        Ok(())
    }

    async fn find_by_id(&self, id: Snowflake) -> RepoResult<Option<PaymentTransaction>> {
        Ok(self.state.lock().transactions.get(&id).cloned())
    }

    async fn find_by_tracking_id(&self, tracking_id: &str) -> RepoResult<Option<PaymentTransaction>> {
        Ok(self.transaction_by_tracking(tracking_id))
    }

    async fn find_by_obligation(
        &self,
        obligation_id: Snowflake,
    ) -> RepoResult<Vec<PaymentTransaction>> {
        let mut transactions = self.transactions_for(obligation_id);
        transactions.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(transactions)
    }

    async fn find_awaiting_approval(&self, limit: i64) -> RepoResult<Vec<PaymentTransaction>> {
        let mut waiting: Vec<_> = self
            .state
            .lock()
            .transactions
            .values()
            .filter(|tx| tx.status == TransactionStatus::AwaitingApproval)
            .cloned()
            .collect();
        waiting.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        waiting.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(waiting)
    }

    async fn count_by_status(&self, status: TransactionStatus) -> RepoResult<i64> {
        let count = self
            .state
            .lock()
            .transactions
            .values()
            .filter(|tx| tx.status == status)
            .count();
        Ok(count as i64)
    }

    async fn record_tracking_id(&self, id: Snowflake, tracking_id: &str) -> RepoResult<()> {
        let mut state = self.state.lock();
        let taken = state
            .transactions
            .values()
            .any(|tx| tx.id != id && tx.tracking_id.as_deref() == Some(tracking_id));
        if taken {
            return Err(DomainError::DuplicateTrackingId(tracking_id.to_string()));
        }
        match state.transactions.get_mut(&id) {
            Some(tx) if tx.status == TransactionStatus::Pending => {
                tx.tracking_id = Some(tracking_id.to_string());
                tx.updated_at = Utc::now();
                Ok(())
            }
            _ => Err(DomainError::TransactionNotFound(id.to_string())),
        }
    }

    async fn record_initiation_error(&self, id: Snowflake, error: &str) -> RepoResult<()> {
        if let Some(tx) = self.state.lock().transactions.get_mut(&id) {
            tx.last_error = Some(error.to_string());
            tx.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn apply_change(
        &self,
        change: &TransactionChange,
        audit: &AuditLogEntry,
    ) -> RepoResult<bool> {
        let mut state = self.state.lock();
        let Some(tx) = state
            .transactions
            .get_mut(&change.transaction_id)
            .filter(|tx| tx.status == change.from)
        else {
            return Ok(false);
        };

        tx.status = change.to;
        if change.flag_reason.is_some() {
            tx.flag_reason = change.flag_reason.clone();
        }
        if change.reported_amount.is_some() {
            tx.reported_amount = change.reported_amount;
        }
        if change.receipt_number.is_some() {
            tx.receipt_number = change.receipt_number.clone();
        }
        if change.decided_by.is_some() {
            tx.decided_by = change.decided_by;
            tx.decided_at = Some(change.at);
        }
        if change.decision_notes.is_some() {
            tx.decision_notes = change.decision_notes.clone();
        }
        tx.updated_at = change.at;

        state.audit.push(audit.clone());
        Ok(true)
    }

    async fn settle(
        &self,
        settlement: &Settlement,
        audit: &AuditLogEntry,
    ) -> RepoResult<SettlementResult> {
        let mut state = self.state.lock();
        let Some(tx) = state
            .transactions
            .get_mut(&settlement.transaction_id)
            .filter(|tx| tx.status == settlement.from)
        else {
            return Ok(SettlementResult {
                applied: false,
                obligation_credited: false,
            });
        };

        tx.status = TransactionStatus::Completed;
        if settlement.receipt_number.is_some() {
            tx.receipt_number = settlement.receipt_number.clone();
        }
        if settlement.reported_amount.is_some() {
            tx.reported_amount = settlement.reported_amount;
        }
        if settlement.decided_by.is_some() {
            tx.decided_by = settlement.decided_by;
            tx.decided_at = Some(settlement.at);
        }
        if settlement.decision_notes.is_some() {
            tx.decision_notes = settlement.decision_notes.clone();
        }
        tx.updated_at = settlement.at;

        let obligation_credited = settlement
            .obligation_id
            .and_then(|id| state.obligations.get_mut(&id))
            .filter(|o| matches!(o.status, ObligationStatus::Pending | ObligationStatus::Missed))
            .map(|o| {
                o.status = ObligationStatus::Paid;
                o.paid_at = Some(settlement.at);
                o.payment_reference = Some(settlement.reference.clone());
                o.updated_at = settlement.at;
            })
            .is_some();

        state.audit.push(audit.clone());
        Ok(SettlementResult {
            applied: true,
            obligation_credited,
        })
    }
}

#[async_trait]
impl AuditLogRepository for MemoryStore {
    async fn append(&self, entry: &AuditLogEntry) -> RepoResult<()> {
        self.append_audit(entry.clone());
        Ok(())
    }

    async fn list(&self, before: Option<Snowflake>, limit: i64) -> RepoResult<Vec<AuditLogEntry>> {
        let mut entries: Vec<_> = self
            .state
            .lock()
            .audit
            .iter()
            .filter(|e| before.map_or(true, |b| e.id < b))
            .cloned()
            .collect();
        entries.sort_by(|a, b| b.id.cmp(&a.id));
        entries.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(entries)
    }
}

// ============================================================================
// Stats cache
// ============================================================================

#[derive(Default)]
pub struct MemoryStatsCache {
    entries: Mutex<HashMap<String, String>>,
    failing: Mutex<bool>,
}

impl MemoryStatsCache {
    pub fn contains(&self, key: &str) -> bool {
        self.entries.lock().contains_key(key)
    }

    /// Make every call fail, as an unreachable Redis would
    pub fn set_failing(&self, failing: bool) {
        *self.failing.lock() = failing;
    }

    fn check(&self) -> RepoResult<()> {
        if *self.failing.lock() {
            return Err(DomainError::CacheError("connection refused".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl StatsCache for MemoryStatsCache {
    async fn get(&self, key: &str) -> RepoResult<Option<String>> {
        self.check()?;
        Ok(self.entries.lock().get(key).cloned())
    }

    async fn put(&self, key: &str, value: &str, _ttl_secs: u64) -> RepoResult<()> {
        self.check()?;
        self.entries.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn invalidate(&self, keys: &[String]) -> RepoResult<()> {
        self.check()?;
        let mut entries = self.entries.lock();
        for key in keys {
            entries.remove(key);
        }
        Ok(())
    }
}

// ============================================================================
// Provider fakes
// ============================================================================

/// Payment gateway that accepts every charge unless told to fail
pub struct FakeGateway {
    channel: PaymentChannel,
    failing: Mutex<bool>,
    charges: Mutex<Vec<ChargeRequest>>,
    statuses: Mutex<HashMap<String, GatewayResult>>,
}

impl FakeGateway {
    pub fn new(channel: PaymentChannel) -> Self {
        Self {
            channel,
            failing: Mutex::new(false),
            charges: Mutex::new(Vec::new()),
            statuses: Mutex::new(HashMap::new()),
        }
    }

    pub fn set_failing(&self, failing: bool) {
        *self.failing.lock() = failing;
    }

    pub fn charges(&self) -> Vec<ChargeRequest> {
        self.charges.lock().clone()
    }

    /// Answer status queries for `result.tracking_id` with `result`
    pub fn set_status(&self, result: GatewayResult) {
        self.statuses.lock().insert(result.tracking_id.clone(), result);
    }
}

#[async_trait]
impl PaymentGateway for FakeGateway {
    fn channel(&self) -> PaymentChannel {
        self.channel
    }

    async fn start_charge(&self, request: &ChargeRequest) -> Result<ChargeStarted, DomainError> {
        if *self.failing.lock() {
            return Err(DomainError::ExternalService(format!(
                "{} rejected the request",
                self.channel
            )));
        }
        self.charges.lock().push(request.clone());

        Ok(match self.channel {
            PaymentChannel::Pesapal => ChargeStarted {
                tracking_id: format!("pp-{}", request.transaction_id),
                redirect_url: Some(format!(
                    "https://pay.pesapal.test/iframe?OrderTrackingId=pp-{}",
                    request.transaction_id
                )),
                message: None,
            },
            _ => ChargeStarted {
                tracking_id: format!("ws_CO_{}", request.transaction_id),
                redirect_url: None,
                message: Some("Success. Request accepted for processing".to_string()),
            },
        })
    }

    async fn query_status(&self, tracking_id: &str) -> Result<Option<GatewayResult>, DomainError> {
        Ok(self.statuses.lock().get(tracking_id).cloned())
    }
}

/// SMS verifier that approves [`FAKE_SMS_CODE`]
#[derive(Default)]
pub struct FakeSms {
    sent: Mutex<Vec<String>>,
    checks: AtomicUsize,
}

impl FakeSms {
    pub fn sent_to(&self) -> Vec<String> {
        self.sent.lock().clone()
    }

    pub fn checks(&self) -> usize {
        self.checks.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SmsVerifier for FakeSms {
    async fn send_code(&self, phone: &PhoneNumber) -> Result<String, DomainError> {
        self.sent.lock().push(phone.as_str().to_string());
        Ok("pending".to_string())
    }

    async fn check_code(&self, _phone: &PhoneNumber, code: &str) -> Result<bool, DomainError> {
        self.checks.fetch_add(1, Ordering::SeqCst);
        Ok(code == FAKE_SMS_CODE)
    }
}

pub struct FakeCaptcha {
    accept: Mutex<bool>,
    calls: AtomicUsize,
}

impl Default for FakeCaptcha {
    fn default() -> Self {
        Self {
            accept: Mutex::new(true),
            calls: AtomicUsize::new(0),
        }
    }
}

impl FakeCaptcha {
    pub fn set_accept(&self, accept: bool) {
        *self.accept.lock() = accept;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CaptchaVerifier for FakeCaptcha {
    async fn verify(&self, _token: &str, _remote_ip: Option<&str>) -> Result<bool, DomainError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(*self.accept.lock())
    }
}

#[derive(Default)]
pub struct FakeMailer {
    sent: Mutex<Vec<EmailMessage>>,
    failing: Mutex<bool>,
}

impl FakeMailer {
    pub fn sent(&self) -> Vec<EmailMessage> {
        self.sent.lock().clone()
    }

    pub fn set_failing(&self, failing: bool) {
        *self.failing.lock() = failing;
    }
}

#[async_trait]
impl Mailer for FakeMailer {
    async fn send(&self, message: &EmailMessage) -> Result<(), DomainError> {
        if *self.failing.lock() {
            return Err(DomainError::ExternalService("email provider unavailable".to_string()));
        }
        self.sent.lock().push(message.clone());
        Ok(())
    }
}

// ============================================================================
// Harness
// ============================================================================

/// A [`ServiceContext`] over [`MemoryStore`] with handles to every fake
pub struct TestHarness {
    pub ctx: ServiceContext,
    pub store: Arc<MemoryStore>,
    pub cache: Arc<MemoryStatsCache>,
    pub mpesa: Arc<FakeGateway>,
    pub pesapal: Arc<FakeGateway>,
    pub sms: Arc<FakeSms>,
    pub captcha: Arc<FakeCaptcha>,
    pub mailer: Arc<FakeMailer>,
}

impl TestHarness {
    /// Every provider configured
    pub fn new() -> Self {
        Self::build(true)
    }

    /// No payment, SMS, CAPTCHA or email provider configured
    pub fn without_providers() -> Self {
        Self::build(false)
    }

    fn build(with_providers: bool) -> Self {
        let store = Arc::new(MemoryStore::new());
        let cache = Arc::new(MemoryStatsCache::default());
        let mpesa = Arc::new(FakeGateway::new(PaymentChannel::MpesaStk));
        let pesapal = Arc::new(FakeGateway::new(PaymentChannel::Pesapal));
        let sms = Arc::new(FakeSms::default());
        let captcha = Arc::new(FakeCaptcha::default());
        let mailer = Arc::new(FakeMailer::default());

        let mut builder = ServiceContext::builder()
            .profile_repo(store.clone())
            .role_repo(store.clone())
            .obligation_repo(store.clone())
            .payment_repo(store.clone())
            .audit_repo(store.clone())
            .stats_cache(cache.clone())
            .jwt_service(Arc::new(JwtService::new(JWT_SECRET, 900, 1800)))
            .snowflake_generator(Arc::new(SnowflakeGenerator::new(1)))
            .portal(portal_config());
        if with_providers {
            builder = builder
                .mpesa(mpesa.clone(), MPESA_CALLBACK_TOKEN.to_string())
                .pesapal(pesapal.clone())
                .sms(sms.clone())
                .captcha(captcha.clone())
                .mailer(mailer.clone());
        }

        let ctx = match builder.build() {
            Ok(ctx) => ctx,
            Err(e) => panic!("test context should build: {e}"),
        };

        Self {
            ctx,
            store,
            cache,
            mpesa,
            pesapal,
            sms,
            captcha,
            mailer,
        }
    }

    /// A ready session holding `roles`; nothing is written to the store
    pub fn session(&self, user_id: Snowflake, roles: &[MemberRole]) -> SessionContext {
        SessionContext::new(
            user_id,
            Some(format!("member{user_id}@example.org")),
            true,
            roles.iter().copied().collect::<RoleSet>(),
            SessionStatus::Ready,
        )
    }

    /// A complete profile with a confirmed email
    pub fn seed_profile(&self, user_id: Snowflake, email: &str) -> Profile {
        let mut profile = Profile::new(user_id, email.to_string());
        profile.full_name = Some(format!("Member {user_id}"));
        profile.id_number = Some("12345678".to_string());
        if let Ok(phone) = PhoneNumber::parse("+254712345678") {
            profile.set_phone(phone);
        }
        profile.email_confirmed_at = Some(Utc::now());
        self.store.insert_profile(profile.clone());
        profile
    }

    pub fn seed_role(&self, user_id: Snowflake, role: MemberRole) -> RoleAssignment {
        let assignment = RoleAssignment::new(self.ctx.generate_id(), user_id, role, None);
        self.store.insert_role(assignment.clone());
        assignment
    }

    /// A pending regular obligation due in 30 days
    pub fn seed_obligation(&self, member_id: Snowflake, cents: i64) -> ContributionObligation {
        let due = (Utc::now() + Duration::days(30)).date_naive();
        self.seed_obligation_due(member_id, cents, due)
    }

    pub fn seed_obligation_due(
        &self,
        member_id: Snowflake,
        cents: i64,
        due_date: NaiveDate,
    ) -> ContributionObligation {
        let obligation = match ContributionObligation::new(
            self.ctx.generate_id(),
            member_id,
            ObligationType::Regular,
            Money::from_cents(cents),
            due_date,
            None,
        ) {
            Ok(obligation) => obligation,
            Err(e) => panic!("seeded obligation should be valid: {e}"),
        };
        self.store.insert_obligation(obligation.clone());
        obligation
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}
