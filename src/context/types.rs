//! Core data model for the active scope.
//!
//! An [`ActiveContext`] names the scope the user is currently operating in:
//! an organization, optionally narrowed to a company, optionally narrowed
//! further to a product. Contexts are value objects with immutable-replace
//! semantics — narrowing or widening the scope always produces a fresh
//! context, never an in-place edit, so the hierarchy invariants hold at
//! every observable point:
//!
//! - a company is only ever set underneath an organization
//! - a product is only ever set underneath a company
//! - [`ActiveContext::level`] always names the deepest set id

use serde::{Deserialize, Serialize};

/// Granularity of the active context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    /// Whole-organization scope (the root level).
    Organization,
    /// A single company within the organization.
    Company,
    /// A single product within a company.
    Product,
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Level::Organization => write!(f, "organization"),
            Level::Company => write!(f, "company"),
            Level::Product => write!(f, "product"),
        }
    }
}

impl std::str::FromStr for Level {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "organization" | "org" => Ok(Level::Organization),
            "company" => Ok(Level::Company),
            "product" => Ok(Level::Product),
            _ => anyhow::bail!(
                "Invalid level '{}'. Valid values: organization, company, product",
                s
            ),
        }
    }
}

/// The currently selected scope, threaded through every scoped API call.
///
/// Construct with [`ActiveContext::organization`], then narrow with
/// [`with_company`](ActiveContext::with_company) /
/// [`with_product`](ActiveContext::with_product) and widen with
/// [`parent`](ActiveContext::parent). The constructors are the only way to
/// build one, which is what keeps the level/id invariants from ever
/// disagreeing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveContext {
    pub level: Level,
    pub organization_id: String,
    pub organization_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_name: Option<String>,
}

impl ActiveContext {
    /// Root-level context for a single organization.
    pub fn organization(id: &str, name: &str) -> Self {
        Self {
            level: Level::Organization,
            organization_id: id.to_string(),
            organization_name: name.to_string(),
            company_id: None,
            company_name: None,
            product_id: None,
            product_name: None,
        }
    }

    /// Narrow this context to a company, clearing any product selection.
    pub fn with_company(&self, id: &str, name: &str) -> Self {
        Self {
            level: Level::Company,
            organization_id: self.organization_id.clone(),
            organization_name: self.organization_name.clone(),
            company_id: Some(id.to_string()),
            company_name: Some(name.to_string()),
            product_id: None,
            product_name: None,
        }
    }

    /// Narrow this context to a product. Returns `None` when no company is
    /// selected — a product cannot hang directly off an organization.
    pub fn with_product(&self, id: &str, name: &str) -> Option<Self> {
        let company_id = self.company_id.clone()?;
        Some(Self {
            level: Level::Product,
            organization_id: self.organization_id.clone(),
            organization_name: self.organization_name.clone(),
            company_id: Some(company_id),
            company_name: self.company_name.clone(),
            product_id: Some(id.to_string()),
            product_name: Some(name.to_string()),
        })
    }

    /// Widen by one level: product → company, company → organization.
    /// Returns `None` at the root — organization is the terminal level.
    pub fn parent(&self) -> Option<Self> {
        match self.level {
            Level::Organization => None,
            Level::Company => Some(Self::organization(
                &self.organization_id,
                &self.organization_name,
            )),
            Level::Product => {
                let mut up = self.clone();
                up.level = Level::Company;
                up.product_id = None;
                up.product_name = None;
                Some(up)
            }
        }
    }

    /// Check the hierarchy invariants on a context that did not come through
    /// the constructors (e.g. restored from disk).
    pub fn is_well_formed(&self) -> bool {
        if self.organization_id.is_empty() {
            return false;
        }
        if self.product_id.is_some() && self.company_id.is_none() {
            return false;
        }
        let expected = if self.product_id.is_some() {
            Level::Product
        } else if self.company_id.is_some() {
            Level::Company
        } else {
            Level::Organization
        };
        self.level == expected
    }

    /// Human-readable breadcrumb, e.g. `Acme › Beverages › Fizz`.
    pub fn breadcrumb(&self) -> String {
        let mut parts = vec![self.organization_name.clone()];
        if let Some(name) = &self.company_name {
            parts.push(name.clone());
        }
        if let Some(name) = &self.product_name {
            parts.push(name.clone());
        }
        parts.join(" › ")
    }
}

/// A capability that can be checked against [`Permissions`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Action {
    CanRead,
    CanCreate,
    CanUpdate,
    CanDelete,
    CanPublish,
    CanManageTeam,
    CanViewAnalytics,
}

impl std::str::FromStr for Action {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "canRead" | "read" => Ok(Action::CanRead),
            "canCreate" | "create" => Ok(Action::CanCreate),
            "canUpdate" | "update" => Ok(Action::CanUpdate),
            "canDelete" | "delete" => Ok(Action::CanDelete),
            "canPublish" | "publish" => Ok(Action::CanPublish),
            "canManageTeam" | "manage-team" => Ok(Action::CanManageTeam),
            "canViewAnalytics" | "view-analytics" => Ok(Action::CanViewAnalytics),
            _ => anyhow::bail!("Unknown action '{}'", s),
        }
    }
}

/// Capabilities of the current user within the active context, as reported
/// by the authorization service. Wire format is camelCase to match the
/// service's JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Permissions {
    pub can_read: bool,
    pub can_create: bool,
    pub can_update: bool,
    pub can_delete: bool,
    pub can_publish: bool,
    pub can_manage_team: bool,
    pub can_view_analytics: bool,
}

impl Permissions {
    /// Fallback applied when the authorization service is unreachable:
    /// read-only, dashboards stay visible, every mutation denied.
    pub fn conservative_default() -> Self {
        Self {
            can_read: true,
            can_view_analytics: true,
            ..Self::default()
        }
    }

    /// Whether the named action is permitted.
    pub fn allows(&self, action: Action) -> bool {
        match action {
            Action::CanRead => self.can_read,
            Action::CanCreate => self.can_create,
            Action::CanUpdate => self.can_update,
            Action::CanDelete => self.can_delete,
            Action::CanPublish => self.can_publish,
            Action::CanManageTeam => self.can_manage_team,
            Action::CanViewAnalytics => self.can_view_analytics,
        }
    }
}
