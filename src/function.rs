use crate::{ProbeError, WebSiteManagementClient};
use getset::Getters;
use log::info;
use serde::Deserialize;
use url::Url;

/// Secrets of a single function, as reported by the management API.
///
/// Every field is optional: the service has been observed to leave `name` and `key`
/// unpopulated, and callers are expected to handle that.
#[derive(Debug, Clone, Default, PartialEq, Eq, Getters)]
#[getset(get = "pub")]
pub struct FunctionSecrets {
    id: Option<String>,
    name: Option<String>,
    kind: Option<String>,
    resource_type: Option<String>,
    key: Option<String>,
    trigger_url: Option<String>,
}

impl FunctionSecrets {
    pub fn new(name: Option<&str>, key: Option<&str>) -> Self {
        Self {
            name: name.map(str::to_owned),
            key: key.map(str::to_owned),
            ..Default::default()
        }
    }
}

#[derive(Deserialize, Debug)]
pub(crate) struct FunctionSecretsResponse {
    id: Option<String>,
    name: Option<String>,
    kind: Option<String>,
    #[serde(rename = "type")]
    resource_type: Option<String>,
    properties: Option<FunctionSecretsResponseProperties>,
}

#[derive(Deserialize, Debug)]
pub(crate) struct FunctionSecretsResponseProperties {
    key: Option<String>,
    trigger_url: Option<String>,
}

impl From<FunctionSecretsResponse> for FunctionSecrets {
    fn from(response: FunctionSecretsResponse) -> Self {
        let (key, trigger_url) = match response.properties {
            Some(p) => (p.key, p.trigger_url),
            None => (None, None),
        };
        FunctionSecrets {
            id: response.id,
            name: response.name,
            kind: response.kind,
            resource_type: response.resource_type,
            key,
            trigger_url,
        }
    }
}

impl WebSiteManagementClient {
    /// Lists the secrets of a function in a function app.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use function_secrets_probe::{Credential, WebSiteManagementClient};
    /// # async fn run() -> Result<(), function_secrets_probe::ProbeError> {
    /// let client = WebSiteManagementClient::new("c1a6d79b-082b-4798-b362-a77e96de50db", Credential::bearer("token"));
    /// let secrets = client.list_function_secrets("my-rg", "my-site", "my-function").await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn list_function_secrets(
        &self,
        resource_group: &str,
        site_name: &str,
        function_name: &str,
    ) -> Result<FunctionSecrets, ProbeError> {
        let uri = self.function_secrets_url(resource_group, site_name, function_name)?;
        let resp_body = self.post_authed(uri.to_string()).await?;
        let response = serde_json::from_str::<FunctionSecretsResponse>(&resp_body)?;
        info!("Listed secrets for function {}/{}", site_name, function_name);
        Ok(response.into())
    }

    /// Each name is pushed as one percent-encoded path segment.
    pub(crate) fn function_secrets_url(
        &self,
        resource_group: &str,
        site_name: &str,
        function_name: &str,
    ) -> Result<Url, ProbeError> {
        let mut uri = Url::parse(&self.endpoint)?;
        uri.path_segments_mut()
            .map_err(|_| ProbeError::ConfigError(format!("`{}` cannot be used as an endpoint", self.endpoint)))?
            .pop_if_empty()
            .extend(&[
                "subscriptions",
                self.subscription_id.as_str(),
                "resourceGroups",
                resource_group,
                "providers",
                "Microsoft.Web",
                "sites",
                site_name,
                "functions",
                function_name,
                "listsecrets",
            ]);
        uri.query_pairs_mut()
            .append_pair("api-version", &self.api_version);
        Ok(uri)
    }
}

#[cfg(test)]
mod tests {
    use crate::Credential;
    use super::*;

    fn parse(body: &str) -> FunctionSecrets {
        serde_json::from_str::<FunctionSecretsResponse>(body).unwrap().into()
    }

    #[test]
    fn documented_shape() {
        let secrets = parse(
            r#"{
                "id": "/subscriptions/s/resourceGroups/rg/providers/Microsoft.Web/sites/site/functions/fn",
                "name": "site/fn",
                "type": "Microsoft.Web/sites/functions",
                "properties": { "key": "abc==", "trigger_url": "https://site.azurewebsites.net/api/fn?code=abc==" }
            }"#,
        );
        assert_eq!(secrets.name().as_deref(), Some("site/fn"));
        assert_eq!(secrets.key().as_deref(), Some("abc=="));
        assert_eq!(secrets.resource_type().as_deref(), Some("Microsoft.Web/sites/functions"));
        assert!(secrets.trigger_url().is_some());
    }

    #[test]
    fn flat_shape_leaves_name_and_key_empty() {
        let secrets = parse(r#"{ "key": "abc==", "trigger_url": "https://site.azurewebsites.net/api/fn" }"#);
        assert_eq!(secrets.name(), &None);
        assert_eq!(secrets.key(), &None);
        assert_eq!(secrets.trigger_url(), &None);
    }

    #[test]
    fn secrets_url_layout() {
        let client = WebSiteManagementClient::new("abc-123", Credential::bearer("t"));
        let uri = client.function_secrets_url("funcRestSpecTest", "testfuncx8b7a", "testfunc").unwrap();
        assert_eq!(
            uri.as_str(),
            "https://management.azure.com/subscriptions/abc-123/resourceGroups/funcRestSpecTest/providers/Microsoft.Web/sites/testfuncx8b7a/functions/testfunc/listsecrets?api-version=2016-08-01"
        );
    }

    #[test]
    fn secrets_url_escapes_names() {
        let client = WebSiteManagementClient::new_with_endpoint("abc-123", Credential::bearer("t"), "http://127.0.0.1:1234/")
            .with_api_version("2022-03-01");
        let uri = client.function_secrets_url("rg", "site?x=1", "fn#frag/..").unwrap();
        assert_eq!(uri.query(), Some("api-version=2022-03-01"));
        assert_eq!(uri.fragment(), None);
        let segments: Vec<&str> = uri.path_segments().unwrap().collect();
        assert_eq!(segments[7], "site%3Fx=1");
        assert_eq!(segments[9], "fn%23frag%2F..");
        assert_eq!(segments.len(), 11);
    }

    #[test]
    fn unusable_endpoint_is_a_config_error() {
        let client = WebSiteManagementClient::new_with_endpoint("abc-123", Credential::bearer("t"), "mailto:ops@example.com");
        assert!(matches!(
            client.function_secrets_url("rg", "site", "fn"),
            Err(ProbeError::ConfigError(_))
        ));
    }

    #[test]
    fn empty_object() {
        assert_eq!(parse("{}"), FunctionSecrets::default());
    }
}
