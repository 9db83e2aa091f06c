//! reqwest-backed implementations of the microservice contracts.
//!
//! One [`PlatformClient`] implements all five traits; each service keeps
//! its own base URL so the gateway can be split per environment. Every
//! request carries the session bearer token and a fresh `x-request-id`
//! for correlation across services.

use async_trait::async_trait;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::clients::{
    AuthorizationApi, CompaniesApi, CompanySummary, OrgSummary, OrganizationsApi, ProductSummary,
    ProductsApi, SessionProvider,
};
use crate::config::Config;
use crate::context::{ActiveContext, Permissions};
use crate::errors::ClientError;

#[derive(Debug, Deserialize)]
struct SessionUser {
    user_id: String,
}

#[derive(Debug, Deserialize)]
struct IssuedToken {
    token: String,
}

/// HTTP client for the Pulseboard microservices.
pub struct PlatformClient {
    http: reqwest::Client,
    session_url: String,
    organizations_url: String,
    companies_url: String,
    products_url: String,
    authorization_url: String,
    session_token: Option<String>,
}

impl PlatformClient {
    pub fn new(config: &Config) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("scopectl/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ClientError::Request {
                service: "session",
                source: e,
            })?;
        Ok(Self {
            http,
            session_url: config.services.session_url.clone(),
            organizations_url: config.services.organizations_url.clone(),
            companies_url: config.services.companies_url.clone(),
            products_url: config.services.products_url.clone(),
            authorization_url: config.services.authorization_url.clone(),
            session_token: config.session.token.clone(),
        })
    }

    fn session_token(&self) -> Result<&str, ClientError> {
        self.session_token.as_deref().ok_or(ClientError::NoSession)
    }

    fn request(&self, builder: reqwest::RequestBuilder, bearer: &str) -> reqwest::RequestBuilder {
        builder
            .bearer_auth(bearer)
            .header("x-request-id", Uuid::new_v4().to_string())
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        service: &'static str,
        builder: reqwest::RequestBuilder,
    ) -> Result<T, ClientError> {
        let resp = builder
            .send()
            .await
            .map_err(|e| ClientError::Request { service, source: e })?;
        let status = resp.status();
        if !status.is_success() {
            return Err(ClientError::Status {
                service,
                status: status.as_u16(),
            });
        }
        resp.json::<T>()
            .await
            .map_err(|e| ClientError::Decode { service, source: e })
    }
}

#[async_trait]
impl SessionProvider for PlatformClient {
    async fn current_user(&self) -> Result<Option<String>, ClientError> {
        let Ok(token) = self.session_token() else {
            // No token yet means "not signed in", not an error.
            return Ok(None);
        };
        let builder = self.request(
            self.http.get(format!("{}/v1/session/me", self.session_url)),
            token,
        );
        let resp = builder.send().await.map_err(|e| ClientError::Request {
            service: "session",
            source: e,
        })?;
        if resp.status() == reqwest::StatusCode::UNAUTHORIZED {
            return Ok(None);
        }
        let status = resp.status();
        if !status.is_success() {
            return Err(ClientError::Status {
                service: "session",
                status: status.as_u16(),
            });
        }
        let user: SessionUser = resp.json().await.map_err(|e| ClientError::Decode {
            service: "session",
            source: e,
        })?;
        Ok(Some(user.user_id))
    }

    async fn switch_active_organization(&self, organization_id: &str) -> Result<(), ClientError> {
        let token = self.session_token()?;
        let builder = self.request(
            self.http
                .post(format!(
                    "{}/v1/session/active-organization",
                    self.session_url
                ))
                .json(&serde_json::json!({ "organization_id": organization_id })),
            token,
        );
        // Body content is irrelevant here; only the status matters.
        let resp = builder.send().await.map_err(|e| ClientError::Request {
            service: "session",
            source: e,
        })?;
        let status = resp.status();
        if !status.is_success() {
            return Err(ClientError::Status {
                service: "session",
                status: status.as_u16(),
            });
        }
        Ok(())
    }

    async fn authorization_token(&self, audience: &str) -> Result<String, ClientError> {
        let token = self.session_token()?;
        let builder = self.request(
            self.http
                .post(format!("{}/v1/session/token", self.session_url))
                .query(&[("audience", audience)]),
            token,
        );
        let issued: IssuedToken = self.send_json("session", builder).await?;
        Ok(issued.token)
    }
}

#[async_trait]
impl OrganizationsApi for PlatformClient {
    async fn list_organizations(&self) -> Result<Vec<OrgSummary>, ClientError> {
        let token = self.session_token()?;
        let builder = self.request(
            self.http
                .get(format!("{}/v1/organizations", self.organizations_url)),
            token,
        );
        self.send_json("organizations", builder).await
    }
}

#[async_trait]
impl CompaniesApi for PlatformClient {
    async fn list_companies(
        &self,
        organization_id: &str,
    ) -> Result<Vec<CompanySummary>, ClientError> {
        let token = self.session_token()?;
        let builder = self.request(
            self.http
                .get(format!("{}/v1/companies", self.companies_url))
                .query(&[("organization_id", organization_id)]),
            token,
        );
        self.send_json("companies", builder).await
    }
}

#[async_trait]
impl ProductsApi for PlatformClient {
    async fn list_products(
        &self,
        organization_id: &str,
        company_id: &str,
    ) -> Result<Vec<ProductSummary>, ClientError> {
        let token = self.session_token()?;
        let builder = self.request(
            self.http
                .get(format!("{}/v1/products", self.products_url))
                .query(&[
                    ("organization_id", organization_id),
                    ("company_id", company_id),
                ]),
            token,
        );
        self.send_json("products", builder).await
    }
}

#[async_trait]
impl AuthorizationApi for PlatformClient {
    async fn fetch_permissions(
        &self,
        token: &str,
        context: &ActiveContext,
    ) -> Result<Permissions, ClientError> {
        let mut query: Vec<(&str, String)> = vec![
            ("level", context.level.to_string()),
            ("organization_id", context.organization_id.clone()),
        ];
        if let Some(company_id) = &context.company_id {
            query.push(("company_id", company_id.clone()));
        }
        if let Some(product_id) = &context.product_id {
            query.push(("product_id", product_id.clone()));
        }
        let builder = self.request(
            self.http
                .get(format!("{}/v1/permissions", self.authorization_url))
                .query(&query),
            token,
        );
        self.send_json("authorization", builder).await
    }
}
