//! Behavioral tests for the active-context manager, run against in-memory
//! fakes of the five platform services.
//!
//! Covers the contract the UI relies on: hierarchy invariants across every
//! transition, defensive no-ops on unknown ids, cascade clearing on
//! organization switches, stale-response discard under rapid switching,
//! the conservative permission fallback, and persistence across restarts.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Notify;

use scopectl::clients::{
    AuthorizationApi, CompaniesApi, CompanySummary, OrgSummary, OrganizationsApi, ProductSummary,
    ProductsApi, SessionProvider,
};
use scopectl::context::{
    ActiveContext, ActiveContextManager, ContextSnapshot, ContextStore, Level, MemoryContextStore,
    Permissions,
};
use scopectl::errors::ClientError;

// ── Fakes ─────────────────────────────────────────────────────────────

struct FakeSession {
    fail_switch: AtomicBool,
    switches: std::sync::Mutex<Vec<String>>,
    token_calls: AtomicUsize,
}

impl FakeSession {
    fn new() -> Self {
        Self {
            fail_switch: AtomicBool::new(false),
            switches: std::sync::Mutex::new(Vec::new()),
            token_calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl SessionProvider for FakeSession {
    async fn current_user(&self) -> Result<Option<String>, ClientError> {
        Ok(Some("user-1".to_string()))
    }

    async fn switch_active_organization(&self, organization_id: &str) -> Result<(), ClientError> {
        if self.fail_switch.load(Ordering::SeqCst) {
            return Err(ClientError::Status {
                service: "session",
                status: 502,
            });
        }
        self.switches
            .lock()
            .unwrap()
            .push(organization_id.to_string());
        Ok(())
    }

    async fn authorization_token(&self, _audience: &str) -> Result<String, ClientError> {
        self.token_calls.fetch_add(1, Ordering::SeqCst);
        Ok("tok".to_string())
    }
}

struct FakeOrgs {
    orgs: Vec<OrgSummary>,
}

#[async_trait]
impl OrganizationsApi for FakeOrgs {
    async fn list_organizations(&self) -> Result<Vec<OrgSummary>, ClientError> {
        Ok(self.orgs.clone())
    }
}

/// Companies directory whose responses for one organization can be held
/// back until the test releases them, to simulate slow networks.
struct FakeCompanies {
    by_org: HashMap<String, Vec<CompanySummary>>,
    gated_org: String,
    gate_enabled: AtomicBool,
    entered: Notify,
    release: Notify,
}

impl FakeCompanies {
    fn new(by_org: HashMap<String, Vec<CompanySummary>>, gated_org: &str) -> Self {
        Self {
            by_org,
            gated_org: gated_org.to_string(),
            gate_enabled: AtomicBool::new(false),
            entered: Notify::new(),
            release: Notify::new(),
        }
    }
}

#[async_trait]
impl CompaniesApi for FakeCompanies {
    async fn list_companies(
        &self,
        organization_id: &str,
    ) -> Result<Vec<CompanySummary>, ClientError> {
        if organization_id == self.gated_org && self.gate_enabled.load(Ordering::SeqCst) {
            self.entered.notify_one();
            self.release.notified().await;
        }
        Ok(self
            .by_org
            .get(organization_id)
            .cloned()
            .unwrap_or_default())
    }
}

struct FakeProducts {
    by_company: HashMap<String, Vec<ProductSummary>>,
}

#[async_trait]
impl ProductsApi for FakeProducts {
    async fn list_products(
        &self,
        _organization_id: &str,
        company_id: &str,
    ) -> Result<Vec<ProductSummary>, ClientError> {
        Ok(self.by_company.get(company_id).cloned().unwrap_or_default())
    }
}

/// Authorization service granting one mutation flag per level, so tests can
/// tell which context a permission set was resolved for. Fetches for the
/// gated level can be held back like [`FakeCompanies`].
struct FakeAuthz {
    fail: AtomicBool,
    gated_level: Option<Level>,
    gate_enabled: AtomicBool,
    entered: Notify,
    release: Notify,
}

impl FakeAuthz {
    fn new() -> Self {
        Self {
            fail: AtomicBool::new(false),
            gated_level: None,
            gate_enabled: AtomicBool::new(false),
            entered: Notify::new(),
            release: Notify::new(),
        }
    }

    fn gated_at(level: Level) -> Self {
        Self {
            gated_level: Some(level),
            ..Self::new()
        }
    }

    fn grant_for(level: Level) -> Permissions {
        let mut perms = Permissions {
            can_read: true,
            ..Permissions::default()
        };
        match level {
            Level::Organization => perms.can_manage_team = true,
            Level::Company => perms.can_publish = true,
            Level::Product => perms.can_update = true,
        }
        perms
    }
}

#[async_trait]
impl AuthorizationApi for FakeAuthz {
    async fn fetch_permissions(
        &self,
        _token: &str,
        context: &ActiveContext,
    ) -> Result<Permissions, ClientError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(ClientError::Status {
                service: "authorization",
                status: 500,
            });
        }
        if self.gated_level == Some(context.level) && self.gate_enabled.load(Ordering::SeqCst) {
            self.entered.notify_one();
            self.release.notified().await;
        }
        Ok(Self::grant_for(context.level))
    }
}

// ── Harness ───────────────────────────────────────────────────────────

struct Harness {
    manager: Arc<ActiveContextManager>,
    session: Arc<FakeSession>,
    companies: Arc<FakeCompanies>,
    authz: Arc<FakeAuthz>,
    store: Arc<MemoryContextStore>,
}

fn org(id: &str, name: &str) -> OrgSummary {
    OrgSummary {
        id: id.to_string(),
        name: name.to_string(),
        slug: None,
    }
}

fn company(id: &str, name: &str) -> CompanySummary {
    CompanySummary {
        id: id.to_string(),
        name: name.to_string(),
    }
}

fn product(id: &str, name: &str) -> ProductSummary {
    ProductSummary {
        id: id.to_string(),
        name: name.to_string(),
    }
}

fn harness_with(authz: FakeAuthz, store: Arc<MemoryContextStore>) -> Harness {
    let orgs = Arc::new(FakeOrgs {
        orgs: vec![org("org-a", "Acme"), org("org-b", "Globex")],
    });
    let companies = Arc::new(FakeCompanies::new(
        HashMap::from([
            (
                "org-a".to_string(),
                vec![company("co-a1", "Beverages"), company("co-a2", "Snacks")],
            ),
            ("org-b".to_string(), vec![company("co-b1", "Media")]),
        ]),
        "org-a",
    ));
    let products = Arc::new(FakeProducts {
        by_company: HashMap::from([
            (
                "co-a1".to_string(),
                vec![product("pr-1", "Fizz"), product("pr-2", "Still")],
            ),
            ("co-b1".to_string(), vec![product("pr-b", "Stream")]),
        ]),
    });
    let session = Arc::new(FakeSession::new());
    let authz = Arc::new(authz);
    let manager = Arc::new(ActiveContextManager::new(
        session.clone(),
        orgs,
        companies.clone(),
        products,
        authz.clone(),
        store.clone(),
    ));
    Harness {
        manager,
        session,
        companies,
        authz,
        store,
    }
}

fn harness() -> Harness {
    harness_with(FakeAuthz::new(), Arc::new(MemoryContextStore::new()))
}

fn assert_invariants(snap: &ContextSnapshot) {
    if let Some(ctx) = &snap.active_context {
        assert!(
            ctx.is_well_formed(),
            "context violates hierarchy invariants: {ctx:?}"
        );
    }
}

// ── Tests ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn invariants_hold_across_every_transition() {
    let h = harness();
    h.manager.initialize(Some("user-1")).await;

    assert_invariants(&h.manager.snapshot().await);

    h.manager.set_company_context("co-a1").await;
    assert_invariants(&h.manager.snapshot().await);

    h.manager.set_product_context("pr-1").await;
    assert_invariants(&h.manager.snapshot().await);

    h.manager.go_up_one_level().await;
    assert_invariants(&h.manager.snapshot().await);

    h.manager.set_company_context("co-a2").await;
    assert_invariants(&h.manager.snapshot().await);

    h.manager.set_organization_context("org-b").await;
    assert_invariants(&h.manager.snapshot().await);

    h.manager.go_up_one_level().await;
    assert_invariants(&h.manager.snapshot().await);

    let snap = h.manager.snapshot().await;
    let ctx = snap.active_context.unwrap();
    assert_eq!(ctx.level, Level::Organization);
    assert_eq!(ctx.organization_id, "org-b");
}

#[tokio::test]
async fn initialize_defaults_to_the_first_organization() {
    let h = harness();
    h.manager.initialize(Some("user-1")).await;

    let snap = h.manager.snapshot().await;
    assert!(!snap.is_loading);
    let ctx = snap.active_context.unwrap();
    assert_eq!(ctx.level, Level::Organization);
    assert_eq!(ctx.organization_id, "org-a");
    assert_eq!(ctx.organization_name, "Acme");
    // Companies cascade already ran for the default organization.
    assert_eq!(snap.companies.len(), 2);
    assert!(snap.products.is_empty());
    assert_eq!(
        snap.permissions,
        Some(FakeAuthz::grant_for(Level::Organization))
    );
}

#[tokio::test]
async fn unknown_company_id_is_a_silent_no_op() {
    let h = harness();
    h.manager.initialize(Some("user-1")).await;

    let before = h.manager.snapshot().await;
    h.manager.set_company_context("does-not-exist").await;
    let after = h.manager.snapshot().await;

    assert_eq!(before, after);
}

#[tokio::test]
async fn unknown_organization_id_never_reaches_the_session() {
    let h = harness();
    h.manager.initialize(Some("user-1")).await;

    h.manager.set_organization_context("org-z").await;

    assert!(h.session.switches.lock().unwrap().is_empty());
    let ctx = h.manager.snapshot().await.active_context.unwrap();
    assert_eq!(ctx.organization_id, "org-a");
}

#[tokio::test]
async fn failed_session_switch_leaves_local_state_untouched() {
    let h = harness();
    h.manager.initialize(Some("user-1")).await;
    h.manager.set_company_context("co-a1").await;

    let before = h.manager.snapshot().await;
    h.session.fail_switch.store(true, Ordering::SeqCst);
    h.manager.set_organization_context("org-b").await;
    let after = h.manager.snapshot().await;

    assert_eq!(before, after);
}

#[tokio::test]
async fn organization_switch_clears_children_and_repopulates_companies() {
    let h = harness();
    h.manager.initialize(Some("user-1")).await;
    h.manager.set_company_context("co-a1").await;
    h.manager.set_product_context("pr-1").await;

    let ctx = h.manager.snapshot().await.active_context.unwrap();
    assert_eq!(ctx.level, Level::Product);

    h.manager.set_organization_context("org-b").await;

    let snap = h.manager.snapshot().await;
    let ctx = snap.active_context.unwrap();
    assert_eq!(ctx.level, Level::Organization);
    assert_eq!(ctx.organization_id, "org-b");
    assert!(ctx.company_id.is_none());
    assert!(ctx.product_id.is_none());
    assert_eq!(snap.companies, vec![company("co-b1", "Media")]);
    assert!(snap.products.is_empty());
    assert_eq!(h.session.switches.lock().unwrap().as_slice(), ["org-b"]);
}

#[tokio::test]
async fn stale_companies_response_is_discarded() {
    let h = harness();
    h.manager.initialize(Some("user-1")).await;

    // Hold back org-a's next companies response, then re-select org-a.
    h.companies.gate_enabled.store(true, Ordering::SeqCst);
    let manager = h.manager.clone();
    let slow_switch = tokio::spawn(async move {
        manager.set_organization_context("org-a").await;
    });
    h.companies.entered.notified().await;

    // org-b wins the race: its switch completes while org-a's companies
    // request is still in flight.
    h.manager.set_organization_context("org-b").await;
    let snap = h.manager.snapshot().await;
    assert_eq!(snap.companies, vec![company("co-b1", "Media")]);

    // The late org-a response arrives now and must be ignored.
    h.companies.release.notify_one();
    slow_switch.await.unwrap();

    let snap = h.manager.snapshot().await;
    assert_eq!(snap.active_context.unwrap().organization_id, "org-b");
    assert_eq!(snap.companies, vec![company("co-b1", "Media")]);
}

#[tokio::test]
async fn stale_permissions_response_is_discarded() {
    let h = harness_with(
        FakeAuthz::gated_at(Level::Company),
        Arc::new(MemoryContextStore::new()),
    );
    h.manager.initialize(Some("user-1")).await;

    // Hold back the company-level permissions fetch mid-transition.
    h.authz.gate_enabled.store(true, Ordering::SeqCst);
    let manager = h.manager.clone();
    let slow_narrow = tokio::spawn(async move {
        manager.set_company_context("co-a1").await;
    });
    h.authz.entered.notified().await;

    // Narrow further while the company permissions are still in flight.
    h.manager.set_product_context("pr-1").await;
    assert_eq!(
        h.manager.snapshot().await.permissions,
        Some(FakeAuthz::grant_for(Level::Product))
    );

    h.authz.release.notify_one();
    slow_narrow.await.unwrap();

    // The late company-level permissions must not overwrite the product's.
    let snap = h.manager.snapshot().await;
    assert_eq!(snap.active_context.unwrap().level, Level::Product);
    assert_eq!(snap.permissions, Some(FakeAuthz::grant_for(Level::Product)));
}

#[tokio::test]
async fn permissions_fall_back_to_conservative_defaults_on_failure() {
    let h = harness();
    h.authz.fail.store(true, Ordering::SeqCst);
    h.manager.initialize(Some("user-1")).await;

    let snap = h.manager.snapshot().await;
    assert_eq!(snap.permissions, Some(Permissions::conservative_default()));
    assert!(h.manager.can_perform_action("canRead").await);
    assert!(h.manager.can_perform_action("canViewAnalytics").await);
    assert!(!h.manager.can_perform_action("canCreate").await);
    assert!(!h.manager.can_perform_action("canPublish").await);
}

#[tokio::test]
async fn persisted_context_survives_a_restart() {
    let store = Arc::new(MemoryContextStore::new());
    let first = harness_with(FakeAuthz::new(), store.clone());
    first.manager.initialize(Some("user-1")).await;
    first.manager.set_company_context("co-a1").await;
    first.manager.set_product_context("pr-1").await;
    let saved = first.manager.snapshot().await.active_context.unwrap();

    // Same store, fresh manager: simulates a new invocation.
    let second = harness_with(FakeAuthz::new(), store);
    second.manager.initialize(Some("user-1")).await;

    let snap = second.manager.snapshot().await;
    assert_eq!(snap.active_context, Some(saved));
    // The cascades reloaded the option lists for the restored scope.
    assert_eq!(snap.companies.len(), 2);
    assert_eq!(snap.products.len(), 2);
    assert_eq!(snap.permissions, Some(FakeAuthz::grant_for(Level::Product)));
}

#[tokio::test]
async fn go_up_at_organization_level_is_a_pure_no_op() {
    let h = harness();
    h.manager.initialize(Some("user-1")).await;

    let before = h.manager.snapshot().await;
    let token_calls_before = h.session.token_calls.load(Ordering::SeqCst);

    h.manager.go_up_one_level().await;

    let after = h.manager.snapshot().await;
    assert_eq!(before, after);
    assert_eq!(
        h.session.token_calls.load(Ordering::SeqCst),
        token_calls_before,
        "terminal go-up must not trigger any network call"
    );
}

#[tokio::test]
async fn go_up_from_product_keeps_the_company_scope() {
    let h = harness();
    h.manager.initialize(Some("user-1")).await;
    h.manager.set_company_context("co-a1").await;
    h.manager.set_product_context("pr-1").await;

    h.manager.go_up_one_level().await;

    let snap = h.manager.snapshot().await;
    let ctx = snap.active_context.unwrap();
    assert_eq!(ctx.level, Level::Company);
    assert_eq!(ctx.company_id.as_deref(), Some("co-a1"));
    assert!(ctx.product_id.is_none());
    // Products still depend on (org-a, co-a1), which did not change.
    assert_eq!(snap.products.len(), 2);
    assert_eq!(snap.permissions, Some(FakeAuthz::grant_for(Level::Company)));
}

#[tokio::test]
async fn watch_subscribers_observe_context_replacements() {
    let h = harness();
    let mut rx = h.manager.subscribe();
    h.manager.initialize(Some("user-1")).await;

    rx.changed().await.unwrap();
    let ctx = rx.borrow_and_update().clone().unwrap();
    assert_eq!(ctx.organization_id, "org-a");

    h.manager.set_company_context("co-a1").await;
    rx.changed().await.unwrap();
    let ctx = rx.borrow_and_update().clone().unwrap();
    assert_eq!(ctx.company_id.as_deref(), Some("co-a1"));
}

#[tokio::test]
async fn every_replacement_is_persisted() {
    let h = harness();
    h.manager.initialize(Some("user-1")).await;
    assert_eq!(
        h.store.load().unwrap().unwrap().organization_id,
        "org-a"
    );

    h.manager.set_company_context("co-a1").await;
    assert_eq!(
        h.store.load().unwrap().unwrap().company_id.as_deref(),
        Some("co-a1")
    );

    h.manager.go_up_one_level().await;
    assert!(h.store.load().unwrap().unwrap().company_id.is_none());
}
