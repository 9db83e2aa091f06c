//! Contracts for the platform microservices the context manager consumes.
//!
//! Each backend collaborator gets its own trait so tests can fake one
//! service at a time:
//!
//! - [`SessionProvider`] — identity, the active-organization session claim,
//!   and short-lived bearer tokens
//! - [`OrganizationsApi`] / [`CompaniesApi`] / [`ProductsApi`] — the
//!   directory services behind the scope pickers
//! - [`AuthorizationApi`] — per-context permission resolution
//!
//! The reqwest-backed implementations live in [`http`].

pub mod http;

use async_trait::async_trait;
use serde::Deserialize;

use crate::context::{ActiveContext, Permissions};
use crate::errors::ClientError;

/// An organization the user belongs to (picker entry).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OrgSummary {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
}

/// A company within an organization (picker entry).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CompanySummary {
    pub id: String,
    pub name: String,
}

/// A product within a company (picker entry).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProductSummary {
    pub id: String,
    pub name: String,
}

/// The session/identity service: who the user is, which organization their
/// session claim points at, and bearer tokens for the other services.
#[async_trait]
pub trait SessionProvider: Send + Sync {
    /// The signed-in user id, or `None` before authentication resolves.
    async fn current_user(&self) -> Result<Option<String>, ClientError>;

    /// Update the active-organization claim on the session. This is the
    /// authoritative side effect behind an organization switch; it must
    /// succeed before any local state changes.
    async fn switch_active_organization(&self, organization_id: &str) -> Result<(), ClientError>;

    /// A short-lived bearer token for the given audience.
    async fn authorization_token(&self, audience: &str) -> Result<String, ClientError>;
}

/// Directory of organizations the current user belongs to.
#[async_trait]
pub trait OrganizationsApi: Send + Sync {
    async fn list_organizations(&self) -> Result<Vec<OrgSummary>, ClientError>;
}

/// Directory of companies within one organization.
#[async_trait]
pub trait CompaniesApi: Send + Sync {
    async fn list_companies(&self, organization_id: &str)
    -> Result<Vec<CompanySummary>, ClientError>;
}

/// Directory of products within one company.
#[async_trait]
pub trait ProductsApi: Send + Sync {
    async fn list_products(
        &self,
        organization_id: &str,
        company_id: &str,
    ) -> Result<Vec<ProductSummary>, ClientError>;
}

/// Authorization service: capabilities of the user within a context.
#[async_trait]
pub trait AuthorizationApi: Send + Sync {
    async fn fetch_permissions(
        &self,
        token: &str,
        context: &ActiveContext,
    ) -> Result<Permissions, ClientError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn org_summary_tolerates_extra_fields() {
        let json = r#"{
            "id": "org-1",
            "name": "Acme",
            "slug": "acme",
            "plan": "enterprise",
            "member_count": 42
        }"#;
        let org: OrgSummary = serde_json::from_str(json).unwrap();
        assert_eq!(org.id, "org-1");
        assert_eq!(org.slug.as_deref(), Some("acme"));
    }

    #[test]
    fn company_and_product_summaries_need_only_id_and_name() {
        let company: CompanySummary =
            serde_json::from_str(r#"{"id": "co-1", "name": "Beverages"}"#).unwrap();
        assert_eq!(company.name, "Beverages");
        let product: ProductSummary =
            serde_json::from_str(r#"{"id": "pr-1", "name": "Fizz", "status": "live"}"#).unwrap();
        assert_eq!(product.id, "pr-1");
    }
}
