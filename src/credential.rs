use crate::{AzureCli, ProbeError, PUBLIC_ENDPOINT};
use anyhow::Context;
use async_trait::async_trait;
use azure_sdk_auth_aad::authorize_non_interactive;
use chrono::{DateTime, Utc};
use log::debug;
use oauth2::{AccessToken, ClientId, ClientSecret};
use std::sync::Arc;

const BEARER_SCHEME: &str = "Bearer";

/// A token and the `Authorization` scheme it is presented with.
///
/// The token is not validated; an empty token is carried as-is and only fails once the
/// management API rejects it.
#[derive(Debug, Clone)]
pub struct Credential {
    token: AccessToken,
    scheme: String,
    expires_on: Option<DateTime<Utc>>,
}

impl Credential {
    pub fn new(token: AccessToken, scheme: &str) -> Self {
        Self {
            token,
            scheme: scheme.to_owned(),
            expires_on: None,
        }
    }

    /// # Examples
    ///
    /// ```
    /// use function_secrets_probe::Credential;
    /// let credential = Credential::bearer("eyJ0eXAi");
    /// assert_eq!(credential.authorization_header(), "Bearer eyJ0eXAi");
    /// ```
    pub fn bearer(token: &str) -> Self {
        Credential::bearer_token(AccessToken::new(token.to_owned()))
    }

    pub fn bearer_token(token: AccessToken) -> Self {
        Credential::new(token, BEARER_SCHEME)
    }

    pub fn with_expiry(mut self, expires_on: DateTime<Utc>) -> Self {
        self.expires_on = Some(expires_on);
        self
    }

    pub fn token(&self) -> &AccessToken {
        &self.token
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn expires_on(&self) -> Option<DateTime<Utc>> {
        self.expires_on
    }

    pub fn authorization_header(&self) -> String {
        format!("{} {}", self.scheme, self.token.secret())
    }

    /// Display form of the token that only reveals its length.
    pub fn redacted(&self) -> String {
        format!("<redacted: {} chars>", self.token.secret().chars().count())
    }
}

/// Supplies the subscription and credential a probe runs with.
#[async_trait(?Send)]
pub trait TokenSource: Send + Sync {
    async fn subscription_id(&self) -> Result<String, ProbeError>;
    async fn credential(&self) -> Result<Credential, ProbeError>;
}

/// Tokens from the ambient `az login` session.
#[derive(Debug, Clone, Default)]
pub struct AzureCliTokenSource {
    cli: AzureCli,
    subscription_id: Option<String>,
    resource: Option<String>,
    credential: Option<Credential>,
}

impl AzureCliTokenSource {
    pub fn new(cli: AzureCli) -> Self {
        Self {
            cli,
            subscription_id: None,
            resource: None,
            credential: None,
        }
    }

    /// Uses `credential` instead of asking the CLI for a token.
    pub fn with_credential(mut self, credential: Credential) -> Self {
        self.credential = Some(credential);
        self
    }

    /// Uses `subscription_id` instead of the CLI's selected subscription.
    pub fn with_subscription_id(mut self, subscription_id: &str) -> Self {
        self.subscription_id = Some(subscription_id.to_owned());
        self
    }

    /// Requests the token for `resource` instead of the CLI default.
    pub fn with_resource(mut self, resource: &str) -> Self {
        self.resource = Some(resource.to_owned());
        self
    }
}

#[async_trait(?Send)]
impl TokenSource for AzureCliTokenSource {
    async fn subscription_id(&self) -> Result<String, ProbeError> {
        match &self.subscription_id {
            Some(id) => Ok(id.clone()),
            None => self.cli.subscription_id().await,
        }
    }

    async fn credential(&self) -> Result<Credential, ProbeError> {
        if let Some(credential) = &self.credential {
            return Ok(credential.clone());
        }
        debug!("Acquiring token from `{}`", self.cli.program());
        let token = self.cli.access_token(self.resource.as_deref()).await?;
        Ok(Credential::bearer(&token))
    }
}

/// Service principal (client credentials) tokens from Azure Active Directory.
#[derive(Debug, Clone)]
pub struct ClientSecretTokenSource {
    tenant_id: String,
    client_id: ClientId,
    client_secret: ClientSecret,
    subscription_id: String,
    resource: String,
}

impl ClientSecretTokenSource {
    pub fn new(
        tenant_id: &str,
        client_id: &str,
        client_secret: ClientSecret,
        subscription_id: &str,
    ) -> Self {
        Self {
            tenant_id: tenant_id.to_owned(),
            client_id: ClientId::new(client_id.to_owned()),
            client_secret,
            subscription_id: subscription_id.to_owned(),
            resource: format!("{}/", PUBLIC_ENDPOINT),
        }
    }

    /// Requests the token for `resource` instead of the public management endpoint.
    pub fn with_resource(mut self, resource: &str) -> Self {
        self.resource = resource.to_owned();
        self
    }

    pub fn resource(&self) -> &str {
        &self.resource
    }
}

#[async_trait(?Send)]
impl TokenSource for ClientSecretTokenSource {
    async fn subscription_id(&self) -> Result<String, ProbeError> {
        Ok(self.subscription_id.clone())
    }

    async fn credential(&self) -> Result<Credential, ProbeError> {
        debug!(
            "Acquiring token for client {} in tenant {} for {}",
            self.client_id.as_str(),
            self.tenant_id,
            self.resource
        );
        let token = authorize_non_interactive(
            Arc::new(reqwest::Client::new()),
            &self.client_id,
            &self.client_secret,
            &self.resource,
            &self.tenant_id,
        )
        .await
        .with_context(|| "Failed to authenticate to Azure Active Directory")
        .map_err(ProbeError::AuthorizationError)?;

        Ok(Credential::bearer_token(token.access_token().clone()).with_expiry(token.expires_on))
    }
}

/// A fixed subscription id and token.
#[derive(Debug, Clone)]
pub struct StaticTokenSource {
    subscription_id: String,
    credential: Credential,
}

impl StaticTokenSource {
    pub fn new(subscription_id: &str, credential: Credential) -> Self {
        Self {
            subscription_id: subscription_id.to_owned(),
            credential,
        }
    }
}

#[async_trait(?Send)]
impl TokenSource for StaticTokenSource {
    async fn subscription_id(&self) -> Result<String, ProbeError> {
        Ok(self.subscription_id.clone())
    }

    async fn credential(&self) -> Result<Credential, ProbeError> {
        Ok(self.credential.clone())
    }
}
