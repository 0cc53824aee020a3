use crate::{Credential, ProbeError};
use anyhow::anyhow;
use log::debug;
use reqwest::StatusCode;
use serde::Deserialize;

/// Management endpoint of the public Azure cloud.
pub const PUBLIC_ENDPOINT: &str = "https://management.azure.com";
const DEFAULT_API_VERSION: &str = "2016-08-01";

/// Client for App Service management operations on a single subscription.
///
/// # Examples
///
/// ```
/// use function_secrets_probe::{Credential, WebSiteManagementClient};
/// let client = WebSiteManagementClient::new("c1a6d79b-082b-4798-b362-a77e96de50db", Credential::bearer("token"));
/// assert_eq!(client.endpoint(), "https://management.azure.com");
/// ```
#[derive(Debug, Clone)]
pub struct WebSiteManagementClient {
    pub(crate) subscription_id: String,
    pub(crate) credential: Credential,
    pub(crate) endpoint: String,
    pub(crate) api_version: String,
}

#[derive(Deserialize, Debug)]
struct ArmErrorResponse {
    error: ArmErrorBody,
}

#[derive(Deserialize, Debug)]
struct ArmErrorBody {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

impl WebSiteManagementClient {
    /// Creates a new `WebSiteManagementClient` with a custom endpoint. Useful for non-public
    /// Azure clouds. For the default public environment, use `WebSiteManagementClient::new`.
    ///
    /// # Examples
    ///
    /// ```
    /// use function_secrets_probe::{Credential, WebSiteManagementClient};
    /// let client = WebSiteManagementClient::new_with_endpoint(
    ///     "c1a6d79b-082b-4798-b362-a77e96de50db",
    ///     Credential::bearer("token"),
    ///     "https://management.chinacloudapi.cn/",
    /// );
    /// assert_eq!(client.endpoint(), "https://management.chinacloudapi.cn");
    /// ```
    pub fn new_with_endpoint(subscription_id: &str, credential: Credential, endpoint: &str) -> Self {
        Self {
            subscription_id: subscription_id.to_owned(),
            credential,
            endpoint: endpoint.trim_end_matches('/').to_owned(),
            api_version: DEFAULT_API_VERSION.to_owned(),
        }
    }

    pub fn new(subscription_id: &str, credential: Credential) -> Self {
        WebSiteManagementClient::new_with_endpoint(subscription_id, credential, PUBLIC_ENDPOINT)
    }

    pub fn with_api_version(mut self, api_version: &str) -> Self {
        self.api_version = api_version.to_owned();
        self
    }

    pub fn subscription_id(&self) -> &str {
        &self.subscription_id
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn api_version(&self) -> &str {
        &self.api_version
    }

    pub(crate) async fn post_authed(&self, uri: String) -> Result<String, ProbeError> {
        debug!("POST {}", uri);
        let resp = reqwest::Client::new()
            .post(&uri)
            .header("Authorization", self.credential.authorization_header())
            .header("Content-Type", "application/json")
            .body("{}")
            .send()
            .await?;
        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            return Err(error_for_status(status, &body));
        }
        Ok(body)
    }
}

fn error_for_status(status: StatusCode, body: &str) -> ProbeError {
    let (code, message) = match serde_json::from_str::<ArmErrorResponse>(body) {
        Ok(envelope) => (envelope.error.code, envelope.error.message),
        Err(_) => (
            status.canonical_reason().unwrap_or("Unknown").to_owned(),
            body.to_owned(),
        ),
    };
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ProbeError::AuthorizationError(anyhow!(
            "management API returned {}: {}: {}",
            status.as_u16(),
            code,
            message
        )),
        _ => ProbeError::ApiError {
            status: status.as_u16(),
            code,
            message,
        },
    }
}
