//! The active-context manager: single source of truth for "what scope is
//! the user operating in".
//!
//! Responsibilities:
//! - hold the current [`ActiveContext`] plus the option lists behind the
//!   scope pickers and the permissions derived for the context
//! - run the cascading load protocol: organizations on initialize,
//!   companies when the organization changes, products when the
//!   (organization, company) pair changes, permissions on every context
//!   replacement
//! - persist every successful replacement to the [`ContextStore`]
//! - discard stale responses: every replacement bumps a generation
//!   counter, every in-flight load carries the generation it was issued
//!   for, and a load result is applied only while its generation is still
//!   current
//!
//! Failure policy (operations resolve, they do not reject):
//! - organizations fetch failure on initialize → logged, empty list
//! - unknown id passed to a transition → logged, silent no-op
//! - session organization-switch failure → logged, local state untouched
//! - permissions fetch failure → conservative read-only default, never a
//!   previous context's values

use std::str::FromStr;
use std::sync::Arc;

use tokio::sync::{RwLock, watch};
use tracing::{debug, error, warn};

use crate::clients::{
    AuthorizationApi, CompaniesApi, CompanySummary, OrgSummary, OrganizationsApi, ProductSummary,
    ProductsApi, SessionProvider,
};
use crate::context::store::ContextStore;
use crate::context::types::{Action, ActiveContext, Level, Permissions};

/// Audience requested on authorization tokens.
const AUTHZ_AUDIENCE: &str = "authorization";

/// Read-only view of the manager state handed to consumers.
#[derive(Debug, Clone, PartialEq)]
pub struct ContextSnapshot {
    pub active_context: Option<ActiveContext>,
    pub is_loading: bool,
    pub organizations: Vec<OrgSummary>,
    pub companies: Vec<CompanySummary>,
    pub products: Vec<ProductSummary>,
    pub permissions: Option<Permissions>,
}

struct ManagerState {
    active: Option<ActiveContext>,
    loading: bool,
    organizations: Vec<OrgSummary>,
    companies: Vec<CompanySummary>,
    products: Vec<ProductSummary>,
    permissions: Option<Permissions>,
    // Bumped on every context replacement; in-flight loads compare the
    // generation they were issued for against this before applying.
    generation: u64,
}

impl ManagerState {
    fn new() -> Self {
        Self {
            active: None,
            loading: true,
            organizations: Vec::new(),
            companies: Vec::new(),
            products: Vec::new(),
            permissions: None,
            generation: 0,
        }
    }
}

/// Holds the selected scope, cascades reloads of dependent option lists,
/// derives permissions, and exposes the level-transition operations.
///
/// All mutation goes through the operations on this type; consumers read
/// via [`snapshot`](ActiveContextManager::snapshot) or observe replacements
/// via [`subscribe`](ActiveContextManager::subscribe).
pub struct ActiveContextManager {
    session: Arc<dyn SessionProvider>,
    organizations_api: Arc<dyn OrganizationsApi>,
    companies_api: Arc<dyn CompaniesApi>,
    products_api: Arc<dyn ProductsApi>,
    authorization_api: Arc<dyn AuthorizationApi>,
    store: Arc<dyn ContextStore>,
    state: RwLock<ManagerState>,
    watch_tx: watch::Sender<Option<ActiveContext>>,
}

impl ActiveContextManager {
    pub fn new(
        session: Arc<dyn SessionProvider>,
        organizations_api: Arc<dyn OrganizationsApi>,
        companies_api: Arc<dyn CompaniesApi>,
        products_api: Arc<dyn ProductsApi>,
        authorization_api: Arc<dyn AuthorizationApi>,
        store: Arc<dyn ContextStore>,
    ) -> Self {
        let (watch_tx, _) = watch::channel(None);
        Self {
            session,
            organizations_api,
            companies_api,
            products_api,
            authorization_api,
            store,
            state: RwLock::new(ManagerState::new()),
            watch_tx,
        }
    }

    // ── Read side ─────────────────────────────────────────────────────

    /// Current state, cloned out so callers never hold the lock.
    pub async fn snapshot(&self) -> ContextSnapshot {
        let st = self.state.read().await;
        ContextSnapshot {
            active_context: st.active.clone(),
            is_loading: st.loading,
            organizations: st.organizations.clone(),
            companies: st.companies.clone(),
            products: st.products.clone(),
            permissions: st.permissions,
        }
    }

    /// Observe context replacements without polling.
    pub fn subscribe(&self) -> watch::Receiver<Option<ActiveContext>> {
        self.watch_tx.subscribe()
    }

    /// Whether the active context sits at exactly the given level.
    /// `false` when no context exists.
    pub async fn is_at_level(&self, level: Level) -> bool {
        let st = self.state.read().await;
        st.active.as_ref().is_some_and(|ctx| ctx.level == level)
    }

    /// Whether the named action is permitted in the current context.
    /// `false` while permissions are unloaded, and for unknown action names.
    pub async fn can_perform_action(&self, action: &str) -> bool {
        let st = self.state.read().await;
        let Some(permissions) = st.permissions else {
            return false;
        };
        match Action::from_str(action) {
            Ok(action) => permissions.allows(action),
            Err(_) => false,
        }
    }

    // ── Operations ────────────────────────────────────────────────────

    /// Bootstrap: restore any persisted context, load the user's
    /// organizations, and default to the first organization when nothing
    /// was restored. With no `user_id` (authentication not yet resolved)
    /// everything stays empty and loading just completes — "no context" is
    /// a valid state for consumers.
    pub async fn initialize(&self, user_id: Option<&str>) {
        let Some(user_id) = user_id else {
            let mut st = self.state.write().await;
            st.loading = false;
            return;
        };
        debug!(user_id, "initializing active context");

        let restored = match self.store.load() {
            Ok(Some(ctx)) if ctx.is_well_formed() => Some(ctx),
            Ok(Some(_)) => {
                warn!("persisted context violates scope invariants; ignoring");
                None
            }
            Ok(None) => None,
            Err(e) => {
                warn!(error = %e, "failed to restore persisted context; starting fresh");
                None
            }
        };

        let organizations = match self.organizations_api.list_organizations().await {
            Ok(list) => list,
            Err(e) => {
                error!(error = %e, "failed to load organizations");
                Vec::new()
            }
        };

        let (generation, active) = {
            let mut st = self.state.write().await;
            st.organizations = organizations;
            if st.active.is_none() {
                st.active = restored.or_else(|| {
                    st.organizations
                        .first()
                        .map(|org| ActiveContext::organization(&org.id, &org.name))
                });
            }
            st.loading = false;
            st.generation += 1;
            (st.generation, st.active.clone())
        };

        let Some(ctx) = active else {
            debug!("no organizations available; staying without a context");
            let _ = self.watch_tx.send(None);
            return;
        };
        self.persist(&ctx);
        let _ = self.watch_tx.send(Some(ctx.clone()));

        self.refresh_companies(generation, &ctx.organization_id)
            .await;
        if let Some(company_id) = ctx.company_id.clone() {
            self.refresh_products(generation, &ctx.organization_id, &company_id)
                .await;
        }
        self.refresh_permissions(generation, &ctx).await;
    }

    /// Switch to an organization from the current option list. The session
    /// claim is switched first; if that side effect fails, local state is
    /// left untouched.
    pub async fn set_organization_context(&self, organization_id: &str) {
        let org = {
            let st = self.state.read().await;
            st.organizations
                .iter()
                .find(|org| org.id == organization_id)
                .cloned()
        };
        let Some(org) = org else {
            warn!(organization_id, "ignoring switch to unknown organization");
            return;
        };

        if let Err(e) = self.session.switch_active_organization(&org.id).await {
            error!(
                error = %e,
                organization_id,
                "session organization switch failed; keeping current context"
            );
            return;
        }

        let next = ActiveContext::organization(&org.id, &org.name);
        let generation = {
            let mut st = self.state.write().await;
            st.generation += 1;
            st.active = Some(next.clone());
            st.companies.clear();
            st.products.clear();
            st.permissions = None;
            st.generation
        };
        self.persist(&next);
        let _ = self.watch_tx.send(Some(next.clone()));

        self.refresh_companies(generation, &next.organization_id)
            .await;
        self.refresh_permissions(generation, &next).await;
    }

    /// Narrow to a company from the current option list. No-ops without an
    /// active context or for an unknown id.
    pub async fn set_company_context(&self, company_id: &str) {
        let found = {
            let st = self.state.read().await;
            st.active.clone().map(|active| {
                (
                    active,
                    st.companies
                        .iter()
                        .find(|company| company.id == company_id)
                        .cloned(),
                )
            })
        };
        let Some((active, company)) = found else {
            warn!(company_id, "no active context; ignoring company switch");
            return;
        };
        let Some(company) = company else {
            warn!(company_id, "ignoring switch to unknown company");
            return;
        };

        let next = active.with_company(&company.id, &company.name);
        let generation = {
            let mut st = self.state.write().await;
            st.generation += 1;
            st.active = Some(next.clone());
            st.products.clear();
            st.permissions = None;
            st.generation
        };
        self.persist(&next);
        let _ = self.watch_tx.send(Some(next.clone()));

        self.refresh_products(generation, &next.organization_id, &company.id)
            .await;
        self.refresh_permissions(generation, &next).await;
    }

    /// Narrow to a product from the current option list. No-ops unless a
    /// company is selected, and for an unknown id.
    pub async fn set_product_context(&self, product_id: &str) {
        let found = {
            let st = self.state.read().await;
            st.active
                .clone()
                .filter(|active| active.company_id.is_some())
                .map(|active| {
                    (
                        active,
                        st.products
                            .iter()
                            .find(|product| product.id == product_id)
                            .cloned(),
                    )
                })
        };
        let Some((active, product)) = found else {
            warn!(product_id, "no company selected; ignoring product switch");
            return;
        };
        let Some(product) = product else {
            warn!(product_id, "ignoring switch to unknown product");
            return;
        };

        // with_product only fails without a company, which was checked above.
        let Some(next) = active.with_product(&product.id, &product.name) else {
            return;
        };
        let generation = {
            let mut st = self.state.write().await;
            st.generation += 1;
            st.active = Some(next.clone());
            st.permissions = None;
            st.generation
        };
        self.persist(&next);
        let _ = self.watch_tx.send(Some(next.clone()));

        self.refresh_permissions(generation, &next).await;
    }

    /// Widen the scope by one level. A local transition: product → company
    /// and company → organization; at organization level this is a no-op.
    /// Only the derived permissions are refetched.
    pub async fn go_up_one_level(&self) {
        let parent = {
            let st = self.state.read().await;
            st.active.as_ref().and_then(ActiveContext::parent)
        };
        let Some(next) = parent else {
            return;
        };

        let generation = {
            let mut st = self.state.write().await;
            st.generation += 1;
            st.active = Some(next.clone());
            if next.company_id.is_none() {
                st.products.clear();
            }
            st.permissions = None;
            st.generation
        };
        self.persist(&next);
        let _ = self.watch_tx.send(Some(next.clone()));

        self.refresh_permissions(generation, &next).await;
    }

    // ── Cascading loads ───────────────────────────────────────────────

    fn persist(&self, context: &ActiveContext) {
        // Best-effort cache to survive restarts, never a source of truth.
        if let Err(e) = self.store.save(context) {
            warn!(error = %e, "failed to persist active context");
        }
    }

    async fn refresh_companies(&self, generation: u64, organization_id: &str) {
        let result = self.companies_api.list_companies(organization_id).await;
        let mut st = self.state.write().await;
        if st.generation != generation {
            debug!(organization_id, "discarding stale companies response");
            return;
        }
        match result {
            Ok(list) => st.companies = list,
            Err(e) => {
                error!(error = %e, organization_id, "failed to load companies");
                st.companies.clear();
            }
        }
    }

    async fn refresh_products(&self, generation: u64, organization_id: &str, company_id: &str) {
        let result = self
            .products_api
            .list_products(organization_id, company_id)
            .await;
        let mut st = self.state.write().await;
        if st.generation != generation {
            debug!(organization_id, company_id, "discarding stale products response");
            return;
        }
        match result {
            Ok(list) => st.products = list,
            Err(e) => {
                error!(error = %e, organization_id, company_id, "failed to load products");
                st.products.clear();
            }
        }
    }

    async fn refresh_permissions(&self, generation: u64, context: &ActiveContext) {
        let loaded = match self.session.authorization_token(AUTHZ_AUDIENCE).await {
            Ok(token) => match self
                .authorization_api
                .fetch_permissions(&token, context)
                .await
            {
                Ok(permissions) => permissions,
                Err(e) => {
                    warn!(error = %e, "permissions fetch failed; applying conservative defaults");
                    Permissions::conservative_default()
                }
            },
            Err(e) => {
                warn!(error = %e, "authorization token unavailable; applying conservative defaults");
                Permissions::conservative_default()
            }
        };
        let mut st = self.state.write().await;
        if st.generation != generation {
            debug!("discarding stale permissions response");
            return;
        }
        st.permissions = Some(loaded);
    }
}
